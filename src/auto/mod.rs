//! AUTO expansion engine.
//!
//! ```text
//! collector  → marker sites, hand-written declarations
//! template   → AUTO_TEMPLATE blocks
//! matcher    → port name → signal expression
//! aggregator → per-module net usage and classification
//! width      → slicing, zero-extension, padding
//! render     → AUTOINST / AUTOLOGIC / AUTOPORTS text
//! replace    → byte-range edits against the original buffer
//! expand     → the entry point tying the stages together
//! ```

mod aggregator;
mod collector;
mod expand;
mod matcher;
mod render;
mod replace;
mod template;
mod width;

pub use aggregator::{NetClass, NetInfo, SignalAggregator};
pub use collector::{
    AutoInstSite, AutoLogicSite, AutoPortsSite, CollectedInfo, LogicFlavor, OrphanMarker,
    OrphanReason, collect,
};
pub use expand::{AutoExpander, ExpandResult, ExpandStats};
pub use matcher::{RegexCache, Resolved, SignalValue, TemplateMatcher};
pub use render::{
    Declaration, END_OF_AUTOMATICS, InstEntry, PortEntry, render_autoinst, render_autologic,
    render_autoports,
};
pub use replace::{Replacement, apply_replacements, validate_replacements};
pub use template::{AutoTemplate, TemplateRule, TemplateSet, parse_template};
pub use width::{Adaptation, Adapted, UnusedSignal, adapt};
