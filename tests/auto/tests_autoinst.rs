use pretty_assertions::assert_eq;
use svauto::hir::codes;
use svauto::project::{Grouping, MergedConfig, Strictness};

use crate::helpers::expand_helpers::{expand, expand_with};
use crate::helpers::source_fixtures::{NON_ANSI_MODULE, SUB_MODULE};

const LIBRARY: &[(&str, &str)] = &[("sub.sv", SUB_MODULE)];

#[test]
fn test_basic_autoinst() {
    let top = "module top;\n    sub u_sub (/*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert_eq!(
        result.text,
        "module top;
    sub u_sub (/*AUTOINST*/
        // Outputs
        .data_out(data_out),
        // Inputs
        .clk(clk),
        .data_in(data_in)
    );
endmodule
"
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.stats.instances_expanded, 1);
}

#[test]
fn test_alphabetical_aligned() {
    let top = "module top;\n    sub u_sub (/*AUTOINST*/);\nendmodule\n";
    let config = MergedConfig {
        align: true,
        grouping: Grouping::Alphabetical,
        indent: "  ".into(),
        ..MergedConfig::default()
    };
    let result = expand_with(LIBRARY, top, &config);
    assert_eq!(
        result.text,
        "module top;
    sub u_sub (/*AUTOINST*/
      .clk     (clk),
      .data_in (data_in),
      .data_out(data_out)
    );
endmodule
"
    );
}

#[test]
fn test_manual_connection_is_preserved() {
    let top = "module top;\n    sub u_sub (.clk(sys_clk), /*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains("(.clk(sys_clk), /*AUTOINST*/\n"));
    assert!(!result.text.contains(".clk(clk)"));
    assert!(result.text.contains(".data_in(data_in)\n    );"));
}

#[test]
fn test_missing_comma_is_a_separate_insert() {
    let top = "module top;\n    sub u_sub (.clk(clk) /*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains("(.clk(clk), /*AUTOINST*/\n"));
    let commas = result
        .replacements
        .iter()
        .filter(|r| r.is_insert() && r.new_text == ",")
        .count();
    assert_eq!(commas, 1);
}

#[test]
fn test_comma_dropped_when_nothing_follows_marker() {
    let top = "module top;\n    sub u_sub (.clk(clk), .data_in(d), .data_out(q), /*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert_eq!(
        result.text,
        "module top;\n    sub u_sub (.clk(clk), .data_in(d), .data_out(q) /*AUTOINST*/);\nendmodule\n"
    );
    assert_eq!(expand(LIBRARY, &result.text).replacements.len(), 0);
}

#[test]
fn test_filtered_autoinst() {
    let top = "module top;\n    sub u_sub (/*AUTOINST(\"^data\")*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_out(data_out),"));
    assert!(result.text.contains(".data_in(data_in)\n"));
    assert!(!result.text.contains(".clk("));
}

#[test]
fn test_invalid_filter_connects_every_port() {
    let top = "module top;\n    sub u_sub (/*AUTOINST(\"(\")*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".clk(clk)"));
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::INVALID_PATTERN))
    );
}

#[test]
fn test_non_ansi_ports_follow_header_order() {
    let top = "module top;\n    legacy u_l (/*AUTOINST*/);\nendmodule\n";
    let config = MergedConfig {
        grouping: Grouping::Alphabetical,
        ..MergedConfig::default()
    };
    let result = expand_with(&[("legacy.v", NON_ANSI_MODULE)], top, &config);
    assert!(
        result
            .text
            .contains(".a(a),\n        .b(b),\n        .y(y)\n    );"),
        "{}",
        result.text
    );
}

#[test]
fn test_unknown_manual_port_warns() {
    let top = "module top;\n    sub u_sub (.bogus(x), /*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    let diag = result
        .diagnostics
        .iter()
        .find(|d| d.code == Some(codes::UNKNOWN_PORT_WARNING))
        .expect("unknown port should be reported");
    assert!(diag.message.contains("bogus"));
    assert!(!result.has_errors());
}

#[test]
fn test_unknown_manual_port_is_error_when_strict() {
    let top = "module top;\n    sub u_sub (.bogus(x), /*AUTOINST*/);\nendmodule\n";
    let config = MergedConfig {
        strictness: Strictness::Strict,
        ..MergedConfig::default()
    };
    let result = expand_with(LIBRARY, top, &config);
    assert!(result.has_errors());
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::UNKNOWN_PORT))
    );
}

#[test]
fn test_unresolved_module_leaves_site_untouched() {
    let top = "module top;\n    missing u_m (/*AUTOINST*/);\n    sub u_sub (/*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains("missing u_m (/*AUTOINST*/);"));
    assert!(result.text.contains(".data_out(data_out)"));
    assert_eq!(result.stats.instances_expanded, 1);
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::MODULE_NOT_FOUND))
    );
}

#[test]
fn test_positional_instance_is_skipped() {
    let top = "module top;\n    sub u_sub (clk, /*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert_eq!(result.text, top);
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::POSITIONAL_CONNECTIONS))
    );
}

#[test]
fn test_marker_outside_instance_is_orphaned() {
    let top = "module top;\n    /*AUTOINST*/\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert_eq!(result.text, top);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, Some(codes::ORPHAN_MARKER));
}
