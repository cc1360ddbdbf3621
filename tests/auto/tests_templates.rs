use pretty_assertions::assert_eq;
use rstest::rstest;
use svauto::hir::codes;

use crate::helpers::expand_helpers::expand;
use crate::helpers::source_fixtures::SUB_MODULE;

const LIBRARY: &[(&str, &str)] = &[("sub.sv", SUB_MODULE)];

#[test]
fn test_instance_capture_in_template() {
    let top = r#"/* sub AUTO_TEMPLATE "u_sub_(\d+)"
    data_in => fifo_%1_in
*/
module top;
    sub u_sub_3 (/*AUTOINST*/);
endmodule
"#;
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(fifo_3_in)"), "{}", result.text);
    assert!(result.text.contains(".data_out(data_out)"));
    assert!(result.text.contains(".clk(clk)"));
}

#[test]
fn test_unmatched_instance_pattern_still_applies_rules() {
    let top = r#"/* sub AUTO_TEMPLATE "u_sub_(\d+)"
    data_in => fifo_%1_in
*/
module top;
    sub u_main (/*AUTOINST*/);
endmodule
"#;
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(fifo_%1_in)"), "{}", result.text);
    assert!(result.text.contains(".data_out(data_out)"));
    let placeholders: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == Some(codes::UNRESOLVED_PLACEHOLDER))
        .collect();
    assert_eq!(placeholders.len(), 1);
    assert!(placeholders[0].message.contains("u_main"));
}

#[test]
fn test_closest_preceding_template_applies() {
    let top = "module top;
    sub u_none (/*AUTOINST*/);
/* sub AUTO_TEMPLATE data_in => first_in */
    sub u_a (/*AUTOINST*/);
/* sub AUTO_TEMPLATE data_in => second_in */
    sub u_b (/*AUTOINST*/);
endmodule
";
    let result = expand(LIBRARY, top);
    let connections: Vec<&str> = result
        .text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with(".data_in("))
        .collect();
    assert_eq!(
        connections,
        [".data_in(data_in)", ".data_in(first_in)", ".data_in(second_in)"]
    );
}

#[test]
fn test_first_matching_rule_wins() {
    let top = "/* sub AUTO_TEMPLATE
    data_.* => bus_$0
    data_in => never_used
*/
module top;
    sub u (/*AUTOINST*/);
endmodule
";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(bus_data_in)"), "{}", result.text);
    assert!(result.text.contains(".data_out(bus_data_out)"));
    assert!(!result.text.contains(".data_in(never_used)"));
}

#[test]
fn test_port_capture_and_builtins() {
    let top = "/* sub AUTO_TEMPLATE
    data_(.*) => {inst.name, ${1}, port.width}
*/
module top;
    sub u_x (/*AUTOINST*/);
endmodule
";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in({u_x, in, 8})"), "{}", result.text);
    assert!(result.text.contains(".data_out({u_x, out, 8})"));
}

#[test]
fn test_arithmetic_and_ternary() {
    let top = r#"/* sub AUTO_TEMPLATE "u_(\d+)"
    data_in  => lane[add(%1, 1)]
    data_out => mod(@, 2) ? odd_out : even_out
*/
module top;
    sub u_4 (/*AUTOINST*/);
endmodule
"#;
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(lane[5])"), "{}", result.text);
    assert!(result.text.contains(".data_out(even_out)"));
}

#[rstest]
#[case("'0", "1'b0")]
#[case("'1", "1'b1")]
#[case("'z", "1'bz")]
#[case("_", "")]
fn test_special_values(#[case] signal: &str, #[case] expected: &str) {
    let top = format!(
        "/* sub AUTO_TEMPLATE\n    data_in => {}\n*/\nmodule top;\n    sub u (/*AUTOINST*/);\nendmodule\n",
        signal
    );
    let result = expand(LIBRARY, &top);
    let needle = format!(".data_in({})\n", expected);
    assert!(result.text.contains(&needle), "{}", result.text);
}

#[test]
fn test_unresolved_placeholder_is_kept_and_reported() {
    let top = "/* sub AUTO_TEMPLATE
    data_in => sig_%2
*/
module top;
    sub u_a (/*AUTOINST*/);
endmodule
";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(sig_%2)"));
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.code == Some(codes::UNRESOLVED_PLACEHOLDER))
            .count(),
        1
    );
}

#[test]
fn test_empty_template_warns() {
    let top = "/* sub AUTO_TEMPLATE */\nmodule top;\n    sub u (/*AUTOINST*/);\nendmodule\n";
    let result = expand(LIBRARY, top);
    assert!(result.text.contains(".data_in(data_in)"));
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::EMPTY_TEMPLATE))
    );
}
