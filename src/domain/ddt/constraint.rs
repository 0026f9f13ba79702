//! Canonical constraint attached to a slot.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ConstraintId;
use crate::domain::translation::TranslationKey;

/// A self-documenting regression case for a validation script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintTestCase {
    pub input: serde_json::Value,
    pub expected: bool,
}

impl ConstraintTestCase {
    pub fn new(input: impl Into<serde_json::Value>, expected: bool) -> Self {
        Self {
            input: input.into(),
            expected,
        }
    }
}

/// Validation rule of a slot, with prompts externalized as keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub id: ConstraintId,
    /// Declared built-in type, e.g. `pastDate`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub label: String,
    pub payoff: String,
    pub prompts: Vec<TranslationKey>,
    /// Pure predicate over one value; empty means "no check".
    pub validation_script: String,
    pub test_set: Vec<ConstraintTestCase>,
}
