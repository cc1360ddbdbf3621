//! Common SystemVerilog fixtures for tests.

/// Three ports: a clock, an 8-bit input and an 8-bit output.
pub const SUB_MODULE: &str = r#"module sub (
    input  logic       clk,
    input  logic [7:0] data_in,
    output logic [7:0] data_out
);
endmodule
"#;

/// Parameterised producer whose output width comes from a parameter.
pub const PRODUCER_MODULE: &str = r#"module producer #(
    parameter int WIDTH = 16
) (
    input  logic             clk,
    input  logic             rst_n,
    output logic [WIDTH-1:0] payload,
    output logic             valid
);
endmodule
"#;

/// Consumes what `producer` drives and reports `done`.
pub const CONSUMER_MODULE: &str = r#"module consumer (
    input  logic        clk,
    input  logic [15:0] payload,
    input  logic        valid,
    output logic        done
);
endmodule
"#;

/// A module wiring `producer` to `consumer` through every marker kind.
pub const PIPELINE_TOP: &str = r#"module top (
    /*AUTOPORTS*/
);
    /*AUTOLOGIC*/

    producer u_producer (/*AUTOINST*/);

    consumer u_consumer (/*AUTOINST*/);
endmodule
"#;

/// Non-ANSI module with body port declarations.
pub const NON_ANSI_MODULE: &str = r#"module legacy (a, b, y);
    input [3:0] a;
    input [3:0] b;
    output [4:0] y;
endmodule
"#;
