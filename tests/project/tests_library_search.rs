use std::fs;
use std::path::Path;

use svauto::auto::AutoExpander;
use svauto::hir::{Compilation, codes};
use svauto::ide::AutoHost;
use svauto::project::{ConfigLayer, ConfigStack, FileList, MergedConfig, WorkspaceLoader};

use crate::helpers::source_fixtures::{CONSUMER_MODULE, PRODUCER_MODULE, SUB_MODULE};

const TOP: &str = "module top;\n    sub u_sub (/*AUTOINST*/);\nendmodule\n";

fn isolated_host() -> AutoHost {
    AutoHost::with_config(ConfigStack::new(ConfigLayer::default()).with_project(ConfigLayer::default()))
}

#[test]
fn test_inline_library_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib").join("sub.sv"), SUB_MODULE).unwrap();
    let top_path = dir.path().join("top.sv");
    let text = format!(
        "{}// Local Variables:\n// verilog-library-directories:(\"lib\")\n// End:\n",
        TOP
    );

    let mut host = isolated_host();
    host.set_file_content(&top_path, &text);
    let edit = host.expand_autos(&top_path).expect("sub should be found in lib");
    assert!(edit.new_text.contains(".data_out(data_out)"));
    assert!(host.has_file(dir.path().join("lib").join("sub.sv")));
}

#[test]
fn test_library_extension_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sub.svh"), SUB_MODULE).unwrap();
    fs::write(dir.path().join("sub.sv"), "module sub (input logic only_sv); endmodule\n").unwrap();

    let config = MergedConfig {
        library_dirs: vec![dir.path().to_path_buf()],
        extensions: vec![".svh".into()],
        ..MergedConfig::default()
    };
    let mut compilation = Compilation::new(config.search_paths());
    compilation.add_source("top.sv", TOP);
    compilation.ensure_modules(["sub"]);

    let file = compilation.file(Path::new("top.sv")).unwrap();
    let result = AutoExpander::new(&compilation, &config).expand_file(file).unwrap();
    assert!(result.text.contains(".data_in(data_in)"), "{}", result.text);
    assert!(!result.text.contains("only_sv"));
}

#[test]
fn test_library_file_is_loaded_on_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cells = dir.path().join("cells.v");
    fs::write(&cells, format!("{}{}", PRODUCER_MODULE, CONSUMER_MODULE)).unwrap();

    let mut list = FileList::new();
    let cells_arg = cells.display().to_string();
    list.apply_flags(&["-v", cells_arg.as_str()], Path::new("")).unwrap();

    let mut layer = ConfigLayer::default();
    list.extend_layer(&mut layer);
    let config = MergedConfig::merge([&layer]);
    let mut compilation = Compilation::new(config.search_paths());
    compilation.ensure_modules(["producer", "consumer"]);
    assert!(compilation.module("producer").is_some());
    assert!(compilation.module("consumer").is_some());
    assert!(compilation.take_diagnostics().is_empty());
}

#[test]
fn test_missing_library_module_is_reported_once_per_site() {
    let mut host = isolated_host();
    host.set_file_content("top.sv", TOP);
    assert!(host.expand_autos("top.sv").is_none());
    let found: Vec<_> = host.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(found, vec![Some(codes::MODULE_NOT_FOUND)]);
}

#[test]
fn test_workspace_directory_loading() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sub.sv"), SUB_MODULE).unwrap();
    fs::write(dir.path().join("top.sv"), TOP).unwrap();
    fs::write(dir.path().join("notes.txt"), "not verilog").unwrap();

    let mut compilation = Compilation::default();
    WorkspaceLoader::new()
        .load_directory_into_compilation(dir.path(), &mut compilation)
        .unwrap();
    assert_eq!(compilation.files().count(), 2);

    let top = dir.path().join("top.sv");
    let names = compilation.instantiated_in(&top);
    compilation.ensure_modules(names.iter().map(|n| n.as_str()));
    let file = compilation.file(&top).unwrap();
    let config = MergedConfig::default();
    let result = AutoExpander::new(&compilation, &config).expand_file(file).unwrap();
    assert!(result.text.contains(".clk(clk)"));
}
