use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use svauto::project::{
    CliFlag, CliOverrides, ConfigLayer, ConfigStack, Grouping, PROJECT_FILE, Strictness,
    discover_project_file,
};
use tempfile::TempDir;

const PROJECT: &str = r#"
[library]
directories = ["lib"]

[format]
indent = 2
grouping = "alphabetical"

[behavior]
strict = true
"#;

/// `<tmp>/repo/.git`, `<tmp>/repo/.svauto.toml` and `<tmp>/repo/rtl/top.sv`.
fn project_tree() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();
    fs::create_dir_all(repo.join("rtl")).unwrap();
    fs::write(repo.join(PROJECT_FILE), PROJECT).unwrap();
    let top = repo.join("rtl").join("top.sv");
    fs::write(&top, "module top; endmodule\n").unwrap();
    (dir, top)
}

#[test]
fn test_discovery_walks_up_to_project_file() {
    let (dir, top) = project_tree();
    assert_eq!(
        discover_project_file(&top),
        Some(dir.path().join("repo").join(PROJECT_FILE))
    );
}

#[test]
fn test_discovery_stops_at_repository_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(PROJECT_FILE), PROJECT).unwrap();
    let repo = dir.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();
    fs::create_dir_all(repo.join("rtl")).unwrap();

    assert_eq!(discover_project_file(&repo.join("rtl")), None);
}

#[test]
fn test_project_file_layer_applies() {
    let (dir, top) = project_tree();
    let mut stack = ConfigStack::new(ConfigLayer::default());
    let config = stack.for_file(&top, "module top; endmodule\n").unwrap();

    assert_eq!(config.indent, "  ");
    assert_eq!(config.grouping, Grouping::Alphabetical);
    assert_eq!(config.strictness, Strictness::Strict);
    assert_eq!(config.library_dirs, vec![dir.path().join("repo").join("lib")]);
}

#[test]
fn test_project_file_is_read_once_per_run() {
    let (dir, top) = project_tree();
    let mut stack = ConfigStack::new(ConfigLayer::default());
    stack.for_file(&top, "").unwrap();

    fs::write(dir.path().join("repo").join(PROJECT_FILE), "[format]\nindent = 6\n").unwrap();
    let config = stack.for_file(&top, "").unwrap();
    assert_eq!(config.indent, "  ");
    assert_eq!(config.strictness, Strictness::Strict);
}

#[test]
fn test_inline_directives_override_project_file() {
    let (_dir, top) = project_tree();
    let text = "module top; endmodule\n// Local Variables:\n// svauto-indent: 3\n// svauto-strict: nil\n// End:\n";
    let mut stack = ConfigStack::new(ConfigLayer::default());
    let config = stack.for_file(&top, text).unwrap();

    assert_eq!(config.indent, "   ");
    assert_eq!(config.strictness, Strictness::Lenient);
    assert_eq!(config.grouping, Grouping::Alphabetical);
}

#[test]
fn test_explicit_cli_flags_override_everything() {
    let (_dir, top) = project_tree();
    let text = "// Local Variables:\n// svauto-indent: 3\n// End:\n";

    let mut cli = CliOverrides::new();
    cli.indent = Some("\t".into());
    cli.grouping = Grouping::ByDirection;
    cli.mark_explicit(CliFlag::Indent);
    let mut stack = ConfigStack::new(cli.to_layer());
    let config = stack.for_file(&top, text).unwrap();

    assert_eq!(config.indent, "\t");
    // Not passed on the command line, so the project value stands.
    assert_eq!(config.grouping, Grouping::Alphabetical);
}

#[test]
fn test_library_lists_concatenate_across_layers() {
    let (dir, top) = project_tree();
    let text = "// Local Variables:\n// verilog-library-directories:(\"cells\")\n// End:\n";
    let cli = ConfigLayer {
        library_dirs: vec![PathBuf::from("/opt/ip")],
        ..ConfigLayer::default()
    };
    let mut stack = ConfigStack::new(cli);
    let config = stack.for_file(&top, text).unwrap();

    assert_eq!(
        config.library_dirs,
        vec![
            dir.path().join("repo").join("lib"),
            dir.path().join("repo").join("rtl").join("cells"),
            PathBuf::from("/opt/ip"),
        ]
    );
}

#[test]
fn test_malformed_project_file_is_an_error() {
    let (dir, top) = project_tree();
    fs::write(dir.path().join("repo").join(PROJECT_FILE), "[format\n").unwrap();
    let mut stack = ConfigStack::new(ConfigLayer::default());
    assert!(stack.for_file(&top, "").is_err());
}
