//! Which action kind a generated message becomes.

use std::collections::BTreeMap;

use crate::domain::ddt::{ActionKind, StepType};

/// Default mapping: entering a slot asks, every other moment says.
pub fn default_action_kind(step: &StepType) -> ActionKind {
    match step {
        StepType::Start => ActionKind::AskQuestion,
        StepType::NoMatch
        | StepType::NoInput
        | StepType::Confirmation
        | StepType::NotConfirmed
        | StepType::Success
        | StepType::Custom(_) => ActionKind::SayMessage,
    }
}

/// Total `StepType -> ActionKind` function with per-step overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPolicy {
    overrides: BTreeMap<StepType, ActionKind>,
}

impl ActionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, step: StepType, kind: ActionKind) -> Self {
        self.overrides.insert(step, kind);
        self
    }

    pub fn kind_for(&self, step: &StepType) -> ActionKind {
        self.overrides
            .get(step)
            .copied()
            .unwrap_or_else(|| default_action_kind(step))
    }
}
