//! Project management: configuration layers, file lists, file loading.

pub mod config;
pub mod file_list;
pub mod file_loader;
pub mod workspace_loader;

pub use config::{
    CliFlag, CliOverrides, ConfigLayer, ConfigStack, Grouping, MergedConfig, PROJECT_FILE,
    Strictness, discover_project_file, load_project_file, parse_inline_directives,
    parse_project_file,
};
pub use file_list::FileList;
pub use workspace_loader::WorkspaceLoader;
