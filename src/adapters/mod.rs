//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `parser` - Input parsers (rule-based, scripted)
//! - `storage` - DDT repositories (JSON files, in-memory)
//! - `matcher` - Template matchers (keyword overlap)

pub mod matcher;
pub mod parser;
pub mod storage;

pub use matcher::KeywordTemplateMatcher;
pub use parser::{ParseCall, RuleBasedParser, ScriptedParser};
pub use storage::{InMemoryDdtRepository, JsonFileDdtRepository};
