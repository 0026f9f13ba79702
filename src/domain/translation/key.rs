//! Translation key grammar.
//!
//! Two key shapes are recognised:
//!
//! ```text
//! runtime.<ddtId>.<stepType>#<escalationIndex>.<actionInstanceId>.<parameterId>.text
//! runtime.<ddtId>.constraint#<constraintId>.prompt#<n>
//! ```
//!
//! Externally stored translations are addressed by these keys, so the shape is
//! part of the persisted contract.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ActionInstanceId, ConstraintId, DdtId};

static STEP_TEXT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^runtime\.([^.#\s]+)\.([A-Za-z][A-Za-z0-9_]*)#(\d+)\.([^.#\s]+)\.([^.#\s]+)\.text$")
        .expect("step text key pattern is valid")
});

static CONSTRAINT_PROMPT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^runtime\.([^.#\s]+)\.constraint#([^.#\s]+)\.prompt#(\d+)$")
        .expect("constraint prompt key pattern is valid")
});

/// Opaque reference into a [`TranslationTable`](super::TranslationTable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationKey(String);

impl TranslationKey {
    /// Key for the text of one action parameter inside a step escalation.
    pub fn step_text(
        ddt_id: &DdtId,
        step_type: &str,
        escalation_index: usize,
        action_instance_id: &ActionInstanceId,
        parameter_id: &str,
    ) -> Self {
        Self(format!(
            "runtime.{}.{}#{}.{}.{}.text",
            ddt_id, step_type, escalation_index, action_instance_id, parameter_id
        ))
    }

    /// Key for the `n`-th failure prompt of a constraint.
    pub fn constraint_prompt(ddt_id: &DdtId, constraint_id: &ConstraintId, n: usize) -> Self {
        Self(format!("runtime.{}.constraint#{}.prompt#{}", ddt_id, constraint_id, n))
    }

    /// Wraps a string that already has key shape. Returns `None` otherwise.
    pub fn parse(raw: &str) -> Option<Self> {
        ParsedKey::parse(raw).map(|_| Self(raw.to_string()))
    }

    /// Returns true if `raw` matches either key shape.
    pub fn is_key(raw: &str) -> bool {
        ParsedKey::parse(raw).is_some()
    }

    /// Decomposes the key into its segments.
    pub fn parts(&self) -> Option<ParsedKey> {
        ParsedKey::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Segments of a well-formed translation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedKey {
    StepText {
        ddt_id: String,
        step_type: String,
        escalation_index: usize,
        action_instance_id: String,
        parameter_id: String,
    },
    ConstraintPrompt {
        ddt_id: String,
        constraint_id: String,
        index: usize,
    },
}

impl ParsedKey {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(caps) = STEP_TEXT_KEY.captures(raw) {
            return Some(ParsedKey::StepText {
                ddt_id: caps[1].to_string(),
                step_type: caps[2].to_string(),
                escalation_index: caps[3].parse().ok()?,
                action_instance_id: caps[4].to_string(),
                parameter_id: caps[5].to_string(),
            });
        }
        let caps = CONSTRAINT_PROMPT_KEY.captures(raw)?;
        Some(ParsedKey::ConstraintPrompt {
            ddt_id: caps[1].to_string(),
            constraint_id: caps[2].to_string(),
            index: caps[3].parse().ok()?,
        })
    }

    pub fn ddt_id(&self) -> &str {
        match self {
            ParsedKey::StepText { ddt_id, .. } | ParsedKey::ConstraintPrompt { ddt_id, .. } => {
                ddt_id
            }
        }
    }
}
