//! Per-module net aggregation.
//!
//! Every plain-identifier connection of every instance in a module folds into
//! one [`NetInfo`] per name. Classification is a pure function of the
//! accumulated flags.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::hir::PortInfo;
use crate::parser::PortDirection;

/// Driven/consumed split of a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetClass {
    /// Consumed but never driven by an instance (or only seen on inouts).
    ExternalInput,
    /// Driven but never consumed by an instance.
    ExternalOutput,
    /// Driven and consumed.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInfo {
    pub name: SmolStr,
    /// Widest connection seen; `None` is below every known width.
    pub width: Option<u32>,
    pub msb: Option<i64>,
    pub lsb: Option<i64>,
    pub data_type: Option<SmolStr>,
    /// Range text of the connection that set `width`.
    pub original_range: String,
    pub resolved_range: String,
    /// Unpacked dimensions of the first array port seen, e.g. `[4]`.
    pub unpacked: String,
    pub driven: bool,
    pub consumed: bool,
    pub inout: bool,
    pub instances: Vec<SmolStr>,
}

impl NetInfo {
    fn new(name: SmolStr) -> Self {
        Self {
            name,
            width: None,
            msb: None,
            lsb: None,
            data_type: None,
            original_range: String::new(),
            resolved_range: String::new(),
            unpacked: String::new(),
            driven: false,
            consumed: false,
            inout: false,
            instances: Vec::new(),
        }
    }

    pub fn class(&self) -> NetClass {
        match (self.driven, self.consumed) {
            (true, true) => NetClass::Internal,
            (true, false) => NetClass::ExternalOutput,
            (false, _) => NetClass::ExternalInput,
        }
    }

    pub fn is_array(&self) -> bool {
        !self.unpacked.is_empty()
    }

    pub fn declared_range(&self) -> &str {
        if self.original_range.is_empty() {
            &self.resolved_range
        } else {
            &self.original_range
        }
    }

    fn fold(&mut self, instance: &str, port: &PortInfo) {
        if port.width > self.width || (self.width.is_none() && self.original_range.is_empty()) {
            self.width = port.width.max(self.width);
            self.msb = port.msb;
            self.lsb = port.lsb;
            self.original_range = port.original_range.clone();
            self.resolved_range = port.resolved_range.clone();
        }
        if self.data_type.is_none() {
            self.data_type = port.data_type.clone();
        }
        if port.is_array && self.unpacked.is_empty() {
            self.unpacked = port.unpacked.clone();
        }
        match port.direction {
            PortDirection::Output => self.driven = true,
            PortDirection::Input => self.consumed = true,
            PortDirection::Inout => self.inout = true,
        }
        if !self.instances.iter().any(|i| i == instance) {
            self.instances.push(SmolStr::new(instance));
        }
    }
}

/// Net map for one module, built fresh per module.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    nets: BTreeMap<SmolStr, NetInfo>,
}

impl SignalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one connection into the net it names.
    pub fn add_connection(&mut self, instance: &str, port: &PortInfo, net: &str) {
        self.nets
            .entry(SmolStr::new(net))
            .or_insert_with_key(|name| NetInfo::new(name.clone()))
            .fold(instance, port);
    }

    pub fn get(&self, name: &str) -> Option<&NetInfo> {
        self.nets.get(name)
    }

    /// All nets in name order.
    pub fn nets(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets.values()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn external_inputs(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets()
            .filter(|n| n.class() == NetClass::ExternalInput && !n.inout)
    }

    pub fn external_outputs(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets()
            .filter(|n| n.class() == NetClass::ExternalOutput && !n.inout)
    }

    pub fn inouts(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets().filter(|n| n.inout)
    }

    pub fn internals(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets()
            .filter(|n| n.class() == NetClass::Internal && !n.inout)
    }
}
