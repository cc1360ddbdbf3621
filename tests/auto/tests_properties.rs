use pretty_assertions::assert_eq;
use rstest::rstest;
use svauto::auto::{NetClass, SignalAggregator, validate_replacements};
use svauto::hir::PortInfo;
use svauto::parser::PortDirection;

use crate::helpers::expand_helpers::{delete, expand};
use crate::helpers::source_fixtures::{
    CONSUMER_MODULE, PIPELINE_TOP, PRODUCER_MODULE, SUB_MODULE,
};

const LIBRARY: &[(&str, &str)] = &[
    ("producer.sv", PRODUCER_MODULE),
    ("consumer.sv", CONSUMER_MODULE),
    ("sub.sv", SUB_MODULE),
];

const MIXED_TOP: &str = "module top (
    input logic rst_n
    /*AUTOPORTS*/
);
    /*AUTOWIRE*/
    producer u_producer (.clk(clk) /*AUTOINST*/);
    consumer u_consumer (/*AUTOINST*/);
    sub u_sub (.data_in(payload[7:0]), /*AUTOINST*/);
endmodule
";

#[rstest]
#[case::pipeline(PIPELINE_TOP)]
#[case::mixed(MIXED_TOP)]
fn test_expansion_is_idempotent(#[case] top: &str) {
    let first = expand(LIBRARY, top);
    assert!(first.is_changed());
    let second = expand(LIBRARY, &first.text);
    assert!(second.replacements.is_empty(), "{:?}", second.replacements);
    assert_eq!(second.text, first.text);
}

#[rstest]
#[case::pipeline(PIPELINE_TOP)]
#[case::mixed(MIXED_TOP)]
fn test_replacements_never_overlap(#[case] top: &str) {
    let result = expand(LIBRARY, top);
    assert!(validate_replacements(top, &result.replacements).is_ok());
}

#[test]
fn test_delete_then_expand_round_trip() {
    let expanded = expand(LIBRARY, PIPELINE_TOP);
    let deleted = delete(&expanded.text);
    assert_eq!(deleted.text, PIPELINE_TOP);
    assert_eq!(deleted.stats.instances_expanded, 2);

    let again = expand(LIBRARY, &deleted.text);
    assert_eq!(again.text, expanded.text);
}

#[test]
fn test_delete_drops_commas_added_by_expansion() {
    let top = MIXED_TOP.replace("payload[7:0]), /*AUTOINST*/", "payload[7:0]) /*AUTOINST*/");
    let expanded = expand(LIBRARY, &top);
    assert!(expanded.text.contains("input logic rst_n,\n    /*AUTOPORTS*/"), "{}", expanded.text);
    assert!(expanded.text.contains("(.clk(clk), /*AUTOINST*/"));
    assert!(expanded.text.contains("(.data_in(payload[7:0]), /*AUTOINST*/"));

    let deleted = delete(&expanded.text);
    assert_eq!(deleted.text, top);
    assert_eq!(expand(LIBRARY, &deleted.text).text, expanded.text);
}

#[test]
fn test_delete_is_idempotent() {
    let deleted = delete(PIPELINE_TOP);
    assert!(deleted.replacements.is_empty());
    assert_eq!(deleted.text, PIPELINE_TOP);
}

#[test]
fn test_every_net_has_one_class() {
    let mut aggregator = SignalAggregator::new();
    let ports = [
        PortInfo::new("a", PortDirection::Output, 4),
        PortInfo::new("b", PortDirection::Input, 4),
        PortInfo::new("c", PortDirection::Inout, 1),
    ];
    for (inst, net) in [("u0", "x"), ("u1", "y"), ("u2", "z")] {
        for port in &ports {
            aggregator.add_connection(inst, port, &format!("{}_{}", net, port.name));
        }
    }
    aggregator.add_connection("u3", &ports[1], "x_a");

    for net in aggregator.nets() {
        let memberships = [
            aggregator.external_inputs().any(|n| n.name == net.name),
            aggregator.external_outputs().any(|n| n.name == net.name),
            aggregator.internals().any(|n| n.name == net.name),
            aggregator.inouts().any(|n| n.name == net.name),
        ];
        assert_eq!(memberships.iter().filter(|m| **m).count(), 1, "{}", net.name);
    }
    assert_eq!(aggregator.get("x_a").map(|n| n.class()), Some(NetClass::Internal));
    assert_eq!(aggregator.get("y_a").map(|n| n.class()), Some(NetClass::ExternalOutput));
    assert_eq!(aggregator.get("z_b").map(|n| n.class()), Some(NetClass::ExternalInput));
}
