//! Assembler configuration

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ValidationError;
use crate::domain::assembler::ActionPolicy;
use crate::domain::ddt::{ActionKind, StepType};

const BUILT_IN_STEPS: [StepType; 6] = [
    StepType::Start,
    StepType::NoMatch,
    StepType::NoInput,
    StepType::Confirmation,
    StepType::NotConfirmed,
    StepType::Success,
];

/// Assembler configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssemblerConfig {
    /// Step name -> action kind, overriding the default ask/say policy
    #[serde(default)]
    pub action_overrides: BTreeMap<String, String>,
}

// Environment sources lowercase keys, so built-in names match case-insensitively.
fn parse_step(name: &str) -> Result<StepType, ValidationError> {
    let name = name.trim();
    if let Some(step) = BUILT_IN_STEPS
        .iter()
        .find(|step| step.as_str().eq_ignore_ascii_case(name))
    {
        return Ok(step.clone());
    }
    name.parse()
        .map_err(|_| ValidationError::UnknownStepName(name.to_string()))
}

fn parse_kind(step: &str, kind: &str) -> Result<ActionKind, ValidationError> {
    [ActionKind::AskQuestion, ActionKind::SayMessage]
        .into_iter()
        .find(|k| k.as_str().eq_ignore_ascii_case(kind.trim()))
        .ok_or_else(|| ValidationError::UnknownActionKind {
            step: step.to_string(),
            kind: kind.to_string(),
        })
}

impl AssemblerConfig {
    /// Builds the action policy described by the overrides.
    pub fn action_policy(&self) -> Result<ActionPolicy, ValidationError> {
        self.action_overrides
            .iter()
            .try_fold(ActionPolicy::new(), |policy, (step, kind)| {
                Ok(policy.with_override(parse_step(step)?, parse_kind(step, kind)?))
            })
    }

    /// Validate assembler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.action_policy().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> AssemblerConfig {
        AssemblerConfig {
            action_overrides: pairs
                .iter()
                .map(|(s, k)| (s.to_string(), k.to_string()))
                .collect(),
        }
    }

    #[test]
    fn empty_overrides_give_default_policy() {
        assert_eq!(AssemblerConfig::default().action_policy().unwrap(), ActionPolicy::new());
    }

    #[test]
    fn overrides_apply_case_insensitively() {
        let policy = overrides(&[("nomatch", "askquestion"), ("confirmation", "askQuestion")])
            .action_policy()
            .unwrap();
        assert_eq!(policy.kind_for(&StepType::NoMatch), ActionKind::AskQuestion);
        assert_eq!(policy.kind_for(&StepType::Confirmation), ActionKind::AskQuestion);
        assert_eq!(policy.kind_for(&StepType::NoInput), ActionKind::SayMessage);
    }

    #[test]
    fn custom_steps_are_accepted() {
        let policy = overrides(&[("reprompt", "askQuestion")]).action_policy().unwrap();
        assert_eq!(
            policy.kind_for(&StepType::Custom("reprompt".into())),
            ActionKind::AskQuestion
        );
    }

    #[test]
    fn invalid_step_names_are_rejected() {
        assert_eq!(
            overrides(&[("no match", "askQuestion")]).validate(),
            Err(ValidationError::UnknownStepName("no match".into()))
        );
    }

    #[test]
    fn unknown_action_kinds_are_rejected() {
        assert!(matches!(
            overrides(&[("start", "shout")]).validate(),
            Err(ValidationError::UnknownActionKind { .. })
        ));
    }
}
