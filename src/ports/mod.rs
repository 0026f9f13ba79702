//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `InputParser` - free-text extraction for the active slot
//! - `DdtRepository` - persistence of assembled DDT documents
//! - `TemplateMatcher` - picks a DDT for an opening utterance

mod ddt_repository;
mod input_parser;
mod template_matcher;

pub use ddt_repository::{DdtRepository, RepositoryError};
pub use input_parser::{InputParser, ParseResult, ParserError};
pub use template_matcher::{TemplateMatch, TemplateMatcher};
