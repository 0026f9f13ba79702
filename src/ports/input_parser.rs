//! Input Parser Port - Interface for the text-understanding collaborator.
//!
//! The parser is the only place where type-specific extraction lives. The
//! dialogue engine treats it as opaque: it sends the raw user text plus the
//! expected type of the active slot and receives a [`ParseResult`].
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct AlwaysYes;
//!
//! #[async_trait]
//! impl InputParser for AlwaysYes {
//!     async fn parse_input(&self, _text: &str, _expected_type: &str) -> Result<ParseResult, ParserError> {
//!         Ok(ParseResult::matched(VariableSet::new().with("value", true)))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::runtime::VariableSet;

/// Port for free-text extraction.
///
/// Implementations must be pure from the engine's point of view: no state
/// shared with the engine changes between calls.
#[async_trait]
pub trait InputParser: Send + Sync {
    /// Extracts variables of `expected_type` from `text`.
    async fn parse_input(&self, text: &str, expected_type: &str)
        -> Result<ParseResult, ParserError>;
}

/// What a parser extracted from one user turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub success: bool,
    #[serde(default)]
    pub variables: VariableSet,
    /// Sub-variables still needed; non-empty means partial extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_subdata: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseResult {
    /// Everything needed was extracted.
    pub fn matched(variables: VariableSet) -> Self {
        Self {
            success: true,
            variables,
            ..Default::default()
        }
    }

    /// Some parts were extracted, others are still missing.
    pub fn partial(variables: VariableSet, missing: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            success: false,
            variables,
            missing_subdata: missing.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Nothing usable was found.
    pub fn no_match(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// A failure is an unsuccessful parse that is not a partial extraction.
    pub fn is_failure(&self) -> bool {
        !self.success && self.missing_subdata.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        !self.missing_subdata.is_empty()
    }
}

/// Parser collaborator errors. The engine turns all of them into a no-match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    /// The expected type is not handled by this parser.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The collaborator could not be reached.
    #[error("parser unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with something unusable.
    #[error("invalid parser response: {0}")]
    InvalidResponse(String),
}
