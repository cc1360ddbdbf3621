use pretty_assertions::assert_eq;
use svauto::hir::codes;

use crate::helpers::expand_helpers::expand;
use crate::helpers::source_fixtures::{
    CONSUMER_MODULE, PIPELINE_TOP, PRODUCER_MODULE, SUB_MODULE,
};

const PIPELINE: &[(&str, &str)] = &[
    ("producer.sv", PRODUCER_MODULE),
    ("consumer.sv", CONSUMER_MODULE),
];

#[test]
fn test_pipeline_expansion() {
    let result = expand(PIPELINE, PIPELINE_TOP);
    assert_eq!(
        result.text,
        "module top (
    /*AUTOPORTS*/
    // Outputs
    output logic done,
    // Inputs
    input logic clk,
    input logic rst_n
);
    /*AUTOLOGIC*/
    // Beginning of automatic logic
    logic [WIDTH-1:0] payload;
    logic valid;
    // End of automatics

    producer u_producer (/*AUTOINST*/
        // Outputs
        .payload(payload),
        .valid(valid),
        // Inputs
        .clk(clk),
        .rst_n(rst_n)
    );

    consumer u_consumer (/*AUTOINST*/
        // Outputs
        .done(done),
        // Inputs
        .clk(clk),
        .payload(payload),
        .valid(valid)
    );
endmodule
"
    );
    assert_eq!(result.stats.instances_expanded, 2);
    assert_eq!(result.stats.logic_blocks, 1);
    assert_eq!(result.stats.port_lists, 1);
}

#[test]
fn test_array_net_is_declared_with_unpacked_dimensions() {
    let library: &[(&str, &str)] = &[
        ("writer.sv", "module writer (output logic [1:0] mem [4]);\nendmodule\n"),
        ("reader.sv", "module reader (input logic [1:0] mem [4]);\nendmodule\n"),
    ];
    let top = "module top;
    /*AUTOLOGIC*/
    writer u_w (/*AUTOINST*/);
    reader u_r (/*AUTOINST*/);
endmodule
";
    let result = expand(library, top);
    assert!(
        result.text.contains("\n    logic [1:0] mem [4];\n"),
        "{}",
        result.text
    );
    assert!(result.text.contains(".mem(mem)"));
}

#[test]
fn test_declared_signals_are_not_redeclared() {
    let top = "module top (
    input logic clk,
    /*AUTOPORTS*/
);
    logic valid;
    /*AUTOLOGIC*/
    producer u_producer (/*AUTOINST*/);
    consumer u_consumer (/*AUTOINST*/);
endmodule
";
    let result = expand(PIPELINE, top);
    assert!(
        result.text.contains(
            "input logic clk,\n    /*AUTOPORTS*/\n    // Outputs\n    output logic done,\n    // Inputs\n    input logic rst_n\n);"
        ),
        "{}",
        result.text
    );
    assert!(result.text.contains("logic [WIDTH-1:0] payload;\n    // End of automatics"));
    assert!(!result.text.contains("logic valid;\n    // End"));
}

#[test]
fn test_missing_comma_before_autoports() {
    let top = "module top (
    input logic clk
    /*AUTOPORTS*/
);
    producer u_producer (/*AUTOINST*/);
endmodule
";
    let result = expand(PIPELINE, top);
    assert!(result.text.contains("input logic clk,\n    /*AUTOPORTS*/"), "{}", result.text);
    assert!(result.text.contains("output logic [WIDTH-1:0] payload,"));
}

#[test]
fn test_wire_and_reg_keywords() {
    let wire_top = "module top;\n    /*AUTOWIRE*/\n    producer u_p (/*AUTOINST*/);\n    consumer u_c (/*AUTOINST*/);\nendmodule\n";
    let result = expand(PIPELINE, wire_top);
    assert!(result.text.contains("// Beginning of automatic wires\n    wire [WIDTH-1:0] payload;\n    wire valid;\n"));

    let reg_top = wire_top.replace("AUTOWIRE", "AUTOREG");
    let result = expand(PIPELINE, &reg_top);
    assert!(result.text.contains("// Beginning of automatic regs\n    reg [WIDTH-1:0] payload;\n"));
}

#[test]
fn test_only_first_block_declares() {
    let top = "module top;\n    /*AUTOLOGIC*/\n    /*AUTOLOGIC*/\n    producer u_p (/*AUTOINST*/);\n    consumer u_c (/*AUTOINST*/);\nendmodule\n";
    let result = expand(PIPELINE, top);
    assert_eq!(result.text.matches("logic valid;").count(), 1);
    assert_eq!(result.stats.logic_blocks, 1);
}

#[test]
fn test_narrow_net_is_padded() {
    let top = "module top;
    logic [3:0] data_out;
    /*AUTOLOGIC*/
    sub u_sub (/*AUTOINST*/);
endmodule
";
    let result = expand(&[("sub.sv", SUB_MODULE)], top);
    assert!(result.text.contains(".data_out({unused_data_out_u_sub, data_out})"), "{}", result.text);
    assert!(result.text.contains("    logic [3:0] unused_data_out_u_sub;\n"));
}

#[test]
fn test_narrow_input_net_is_zero_extended() {
    let top = "module top;
    logic [3:0] data_in;
    sub u_sub (/*AUTOINST*/);
endmodule
";
    let result = expand(&[("sub.sv", SUB_MODULE)], top);
    assert!(result.text.contains(".data_in({'0, data_in})"), "{}", result.text);
}

#[test]
fn test_wide_net_is_sliced() {
    let top = "module top;
    logic [15:0] data_in;
    sub u_sub (/*AUTOINST*/);
endmodule
";
    let result = expand(&[("sub.sv", SUB_MODULE)], top);
    assert!(result.text.contains(".data_in(data_in[7:0])"), "{}", result.text);
}

#[test]
fn test_autologic_inside_instance_is_orphaned() {
    let top = "module top;\n    sub u_sub (/*AUTOLOGIC*/);\nendmodule\n";
    let result = expand(&[("sub.sv", SUB_MODULE)], top);
    assert_eq!(result.text, top);
    assert_eq!(result.diagnostics[0].code, Some(codes::ORPHAN_MARKER));
}
