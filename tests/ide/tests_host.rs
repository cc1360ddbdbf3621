use pretty_assertions::assert_eq;
use svauto::ide::{AutoHost, unified_diff};
use svauto::project::{ConfigLayer, ConfigStack, Grouping};
use svauto::{Position, apply_replacements};

use crate::helpers::source_fixtures::{
    CONSUMER_MODULE, PIPELINE_TOP, PRODUCER_MODULE, SUB_MODULE,
};

fn host_with(cli: ConfigLayer) -> AutoHost {
    let mut host =
        AutoHost::with_config(ConfigStack::new(cli).with_project(ConfigLayer::default()));
    host.set_file_content("producer.sv", PRODUCER_MODULE);
    host.set_file_content("consumer.sv", CONSUMER_MODULE);
    host.set_file_content("sub.sv", SUB_MODULE);
    host
}

#[test]
fn test_edit_replacements_reproduce_new_text() {
    let mut host = host_with(ConfigLayer::default());
    host.set_file_content("top.sv", PIPELINE_TOP);
    let edit = host.expand_autos("top.sv").unwrap();

    assert_eq!(edit.range.start, Position::new(0, 0));
    assert_eq!(
        apply_replacements(PIPELINE_TOP, &edit.replacements).unwrap(),
        edit.new_text
    );
    assert_eq!(edit.stats.instances_expanded, 2);
}

#[test]
fn test_host_configuration_is_used() {
    let mut host = host_with(ConfigLayer {
        grouping: Some(Grouping::Alphabetical),
        ..ConfigLayer::default()
    });
    host.set_file_content("top.sv", "module top;\n    sub u (/*AUTOINST*/);\nendmodule\n");
    let edit = host.expand_autos("top.sv").unwrap();
    assert!(!edit.new_text.contains("// Outputs"));
    assert!(edit.new_text.contains(".clk(clk),\n        .data_in(data_in),\n        .data_out(data_out)\n"));
}

#[test]
fn test_syntax_errors_are_returned() {
    let mut host = host_with(ConfigLayer::default());
    let errors = host.set_file_content("broken.sv", "module broken (\n");
    assert!(!errors.is_empty());
}

#[test]
fn test_delete_then_expand_through_host() {
    let mut host = host_with(ConfigLayer::default());
    host.set_file_content("top.sv", PIPELINE_TOP);
    let expanded = host.expand_autos("top.sv").unwrap().new_text;

    host.set_file_content("top.sv", &expanded);
    let deleted = host.delete_autos("top.sv").unwrap();
    assert_eq!(deleted.new_text, PIPELINE_TOP);
    assert_eq!(deleted.stats.logic_blocks, 1);
    assert_eq!(deleted.stats.port_lists, 1);
}

#[test]
fn test_preview_diff() {
    let mut host = host_with(ConfigLayer::default());
    let top = "module top;\n    sub u (/*AUTOINST*/);\nendmodule\n";
    host.set_file_content("top.sv", top);
    let edit = host.expand_autos("top.sv").unwrap();

    let diff = unified_diff("top.sv", top, &edit.new_text);
    assert!(diff.starts_with("--- a/top.sv\n+++ b/top.sv\n"));
    assert!(diff.contains("\n-    sub u (/*AUTOINST*/);\n"));
    assert!(diff.contains("\n+        .data_out(data_out),\n"));
}
