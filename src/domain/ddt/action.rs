//! Actions executed inside an escalation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ActionInstanceId;
use crate::domain::translation::TranslationKey;

/// Parameter id used for the single text parameter of message actions.
pub const TEXT_PARAMETER: &str = "text";

/// Kind of action the bot performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Ask the user a question and wait for an answer.
    AskQuestion,
    /// Say something without expecting an answer.
    SayMessage,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AskQuestion => "askQuestion",
            ActionKind::SayMessage => "sayMessage",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parameter of an action; the value is always a translation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    pub parameter_id: String,
    pub value: TranslationKey,
}

/// An action occurrence within an escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action_id: ActionKind,
    pub action_instance_id: ActionInstanceId,
    pub parameters: Vec<ActionParameter>,
}

impl Action {
    /// Returns the key of the `text` parameter, if present.
    pub fn text_key(&self) -> Option<&TranslationKey> {
        self.parameters
            .iter()
            .find(|p| p.parameter_id == TEXT_PARAMETER)
            .map(|p| &p.value)
    }
}
