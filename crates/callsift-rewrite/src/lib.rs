//! callsift rewrite - rule-driven replacement of classified call sites
//!
//! Rules look at a classified call together with the type index and answer
//! with a [`CallTemplate`]. The engine splices the templates into the tree
//! as synthetic nodes; rendering the unit afterwards reproduces every
//! untouched byte of the input.

mod engine;
mod error;
mod format;
mod rule;

pub use engine::{apply, apply_all, Change, RewriteOutcome};
pub use error::{Result, RewriteError};
pub use format::{load_rules, parse_rules, FormatCallRule, FormatRuleConfig, FunctionPath};
pub use rule::{ArgTemplate, CallTemplate, CalleeTemplate, MatchContext, RewriteRule};
