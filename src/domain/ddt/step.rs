//! Dialogue moments (step types), step groups and the escalation ladder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::action::Action;
use crate::domain::foundation::{EscalationId, ValidationError};

/// A dialogue moment a node may define behavior for.
///
/// The set is open: any identifier that is not one of the canonical names
/// is carried as [`StepType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StepType {
    Start,
    NoMatch,
    NoInput,
    Confirmation,
    NotConfirmed,
    Success,
    Custom(String),
}

impl StepType {
    /// Canonical step types in authoring order.
    pub const CANONICAL: [StepType; 6] = [
        StepType::Start,
        StepType::NoMatch,
        StepType::NoInput,
        StepType::Confirmation,
        StepType::NotConfirmed,
        StepType::Success,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            StepType::Start => "start",
            StepType::NoMatch => "noMatch",
            StepType::NoInput => "noInput",
            StepType::Confirmation => "confirmation",
            StepType::NotConfirmed => "notConfirmed",
            StepType::Success => "success",
            StepType::Custom(name) => name,
        }
    }

    /// Returns true for the step types the runtime uses to retry a slot.
    pub fn is_escalation(&self) -> bool {
        matches!(self, StepType::NoMatch | StepType::NoInput)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StepType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = match s {
            "start" => StepType::Start,
            "noMatch" => StepType::NoMatch,
            "noInput" => StepType::NoInput,
            "confirmation" => StepType::Confirmation,
            "notConfirmed" => StepType::NotConfirmed,
            "success" => StepType::Success,
            other => {
                let mut chars = other.chars();
                let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
                let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid_head || !valid_tail || other == "constraint" {
                    return Err(ValidationError::invalid_format(
                        "step_type",
                        format!("'{}' is not a valid step name", other),
                    ));
                }
                StepType::Custom(other.to_string())
            }
        };
        Ok(step)
    }
}

impl TryFrom<String> for StepType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StepType> for String {
    fn from(step: StepType) -> Self {
        step.as_str().to_string()
    }
}

/// One retry tier: actions executed in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escalation {
    pub escalation_id: EscalationId,
    pub actions: Vec<Action>,
}

/// All escalations authored for one dialogue moment of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGroup {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub escalations: Vec<Escalation>,
}

impl StepGroup {
    /// Returns the ladder over this step's escalations, `None` when empty.
    pub fn ladder(&self) -> Option<EscalationLadder<'_>> {
        EscalationLadder::new(&self.escalations)
    }
}

/// Ordered escalation tiers with clamped lookup.
///
/// Tier `k` answers the `k`-th consecutive failure; past the end the last
/// tier is reused indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct EscalationLadder<'a> {
    tiers: &'a [Escalation],
}

impl<'a> EscalationLadder<'a> {
    /// Builds a ladder. Returns `None` for an empty tier list.
    pub fn new(tiers: &'a [Escalation]) -> Option<Self> {
        if tiers.is_empty() {
            None
        } else {
            Some(Self { tiers })
        }
    }

    /// Index of the tier used for the given attempt.
    pub fn tier_index(&self, attempt: usize) -> usize {
        attempt.min(self.tiers.len() - 1)
    }

    /// Tier used for the given attempt.
    pub fn resolve(&self, attempt: usize) -> &'a Escalation {
        &self.tiers[self.tier_index(attempt)]
    }

    /// Number of tiers; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }
}
