//! Width adaptation between a port and the net it connects to.

use smol_str::SmolStr;

use crate::base::text::is_identifier;
use crate::hir::{PortInfo, range_text};
use crate::parser::PortDirection;

/// A padding signal created for a wide output, declared by AUTOLOGIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedSignal {
    pub name: SmolStr,
    pub width: u32,
}

impl UnusedSignal {
    pub fn range(&self) -> String {
        range_text(self.width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adaptation {
    /// Widths agree, are unknown, or the signal came from a template rule.
    Unchanged,
    /// Port narrower than the net: `sig[0]` or `sig[w-1:0]`.
    Slice,
    /// Input wider than the net: `{'0, sig}`.
    ZeroExtend,
    /// Output wider than the net: `{unused_sig_inst, sig}`.
    Pad(UnusedSignal),
    /// Inout wider than the net; left as is.
    InoutMismatch { port_width: u32, net_width: u32 },
}

/// Connection text after adaptation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapted {
    pub text: String,
    pub adaptation: Adaptation,
}

/// Adapt `signal` to `port` given the width the net is known to have.
pub fn adapt(
    port: &PortInfo,
    signal: &str,
    net_width: Option<u32>,
    instance: &str,
    from_rule: bool,
) -> Adapted {
    let unchanged = || Adapted {
        text: signal.to_string(),
        adaptation: Adaptation::Unchanged,
    };

    if from_rule || !is_identifier(signal) {
        return unchanged();
    }
    let (Some(port_width), Some(net_width)) = (port.width, net_width) else {
        return unchanged();
    };

    if port_width < net_width {
        let text = if port_width == 1 {
            format!("{}[0]", signal)
        } else {
            format!("{}[{}:0]", signal, port_width - 1)
        };
        return Adapted {
            text,
            adaptation: Adaptation::Slice,
        };
    }

    if port_width > net_width {
        return match port.direction {
            PortDirection::Input => Adapted {
                text: format!("{{'0, {}}}", signal),
                adaptation: Adaptation::ZeroExtend,
            },
            PortDirection::Output => {
                let unused = UnusedSignal {
                    name: SmolStr::new(format!("unused_{}_{}", signal, instance)),
                    width: port_width - net_width,
                };
                Adapted {
                    text: format!("{{{}, {}}}", unused.name, signal),
                    adaptation: Adaptation::Pad(unused),
                }
            }
            PortDirection::Inout => Adapted {
                text: signal.to_string(),
                adaptation: Adaptation::InoutMismatch {
                    port_width,
                    net_width,
                },
            },
        };
    }

    unchanged()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PortDirection::Input, 1, Some(8), "sig[0]")]
    #[case(PortDirection::Output, 4, Some(8), "sig[3:0]")]
    #[case(PortDirection::Input, 8, Some(4), "{'0, sig}")]
    #[case(PortDirection::Output, 8, Some(4), "{unused_sig_u1, sig}")]
    #[case(PortDirection::Inout, 8, Some(4), "sig")]
    #[case(PortDirection::Input, 8, Some(8), "sig")]
    #[case(PortDirection::Input, 8, None, "sig")]
    fn test_adapt(
        #[case] direction: PortDirection,
        #[case] port_width: u32,
        #[case] net_width: Option<u32>,
        #[case] expected: &str,
    ) {
        let port = PortInfo::new("p", direction, port_width);
        assert_eq!(adapt(&port, "sig", net_width, "u1", false).text, expected);
    }

    #[test]
    fn test_pad_registers_unused_signal() {
        let port = PortInfo::new("q", PortDirection::Output, 8);
        let adapted = adapt(&port, "res", Some(4), "u_core", false);
        assert_eq!(
            adapted.adaptation,
            Adaptation::Pad(UnusedSignal {
                name: "unused_res_u_core".into(),
                width: 4
            })
        );
    }

    #[test]
    fn test_template_rule_signals_are_not_adapted() {
        let port = PortInfo::new("q", PortDirection::Output, 8);
        assert_eq!(adapt(&port, "res", Some(4), "u", true).text, "res");
    }

    #[test]
    fn test_expressions_are_not_adapted() {
        let port = PortInfo::new("q", PortDirection::Input, 8);
        assert_eq!(adapt(&port, "a[3:0]", Some(4), "u", false).text, "a[3:0]");
    }
}
