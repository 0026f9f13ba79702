//! Parser Adapters
//!
//! Implementations of the InputParser port.
//!
//! - **RuleBasedParser** - regex extraction for common slot types
//! - **ScriptedParser** - scripted answers for tests and previews

mod rule_based;
mod scripted;

pub use rule_based::RuleBasedParser;
pub use scripted::{ParseCall, ScriptedParser};
