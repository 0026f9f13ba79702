//! Per-session mutable state and dialogue history.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::variables::VariableSet;
use crate::domain::ddt::{ActionKind, StepType};
use crate::domain::foundation::{ConstraintId, DdtId, NodeId, Timestamp};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speaker {
    Bot,
    User,
    System,
}

/// What a history entry is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventKind {
    /// Raw user turn.
    UserInput,
    /// One action of a step escalation.
    Step {
        step_type: StepType,
        escalation_index: usize,
        action: ActionKind,
    },
    /// Request for a missing sub-value when its node has no `start` step.
    AskSubdata { variable: String },
    /// Failure prompt of a run-time constraint.
    ConstraintPrompt { constraint_id: ConstraintId },
    /// Host-level notice.
    Notice,
}

impl EventKind {
    /// Short name used in transcripts: the step name for step events.
    pub fn name(&self) -> &str {
        match self {
            EventKind::UserInput => "userInput",
            EventKind::Step { step_type, .. } => step_type.as_str(),
            EventKind::AskSubdata { .. } => "askSubdata",
            EventKind::ConstraintPrompt { .. } => "constraint",
            EventKind::Notice => "notice",
        }
    }
}

/// One entry of a session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueEvent {
    pub speaker: Speaker,
    pub node_id: NodeId,
    pub text: String,
    #[serde(flatten)]
    pub kind: EventKind,
    pub at: Timestamp,
}

impl DialogueEvent {
    pub fn bot(node_id: NodeId, text: impl Into<String>, kind: EventKind) -> Self {
        Self {
            speaker: Speaker::Bot,
            node_id,
            text: text.into(),
            kind,
            at: Timestamp::now(),
        }
    }

    pub fn user(node_id: NodeId, text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            node_id,
            text: text.into(),
            kind: EventKind::UserInput,
            at: Timestamp::now(),
        }
    }

    pub fn system(node_id: NodeId, text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            node_id,
            text: text.into(),
            kind: EventKind::Notice,
            at: Timestamp::now(),
        }
    }

    /// Step type of a step event.
    pub fn step_type(&self) -> Option<&StepType> {
        match &self.kind {
            EventKind::Step { step_type, .. } => Some(step_type),
            _ => None,
        }
    }
}

/// Progress on one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProgress {
    /// Failed turns since the node was entered.
    pub attempts: u32,
    /// Consecutive escalations per step type.
    #[serde(default)]
    pub streaks: BTreeMap<StepType, usize>,
    #[serde(default)]
    pub variables: VariableSet,
}

/// Everything a session owns. The DDT itself is shared and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub ddt_id: DdtId,
    pub current_node_id: NodeId,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeProgress>,
    #[serde(default)]
    pub history: Vec<DialogueEvent>,
}

impl SessionState {
    pub fn new(ddt_id: DdtId, current_node_id: NodeId) -> Self {
        Self {
            ddt_id,
            current_node_id,
            nodes: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn progress(&self, node: &NodeId) -> Option<&NodeProgress> {
        self.nodes.get(node)
    }

    pub fn progress_mut(&mut self, node: &NodeId) -> &mut NodeProgress {
        self.nodes.entry(node.clone()).or_default()
    }

    /// Attempts counted on a node, zero if never visited.
    pub fn attempts(&self, node: &NodeId) -> u32 {
        self.progress(node).map_or(0, |p| p.attempts)
    }

    /// Variables collected so far on a node.
    pub fn variables(&self, node: &NodeId) -> Option<&VariableSet> {
        self.progress(node).map(|p| &p.variables)
    }

    /// Text of every bot message in order.
    pub fn bot_messages(&self) -> impl Iterator<Item = &str> {
        self.history
            .iter()
            .filter(|e| e.speaker == Speaker::Bot)
            .map(|e| e.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_event_serializes_flat_with_kind_tag() {
        let event = DialogueEvent::bot(
            NodeId::new("dob"),
            "When were you born?",
            EventKind::Step {
                step_type: StepType::Start,
                escalation_index: 0,
                action: ActionKind::AskQuestion,
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], json!("step"));
        assert_eq!(value["stepType"], json!("start"));
        assert_eq!(value["speaker"], json!("bot"));
        assert_eq!(value["nodeId"], json!("dob"));
    }

    #[test]
    fn unvisited_node_has_zero_attempts() {
        let state = SessionState::new(DdtId::new("dob").unwrap(), NodeId::new("dob"));
        assert_eq!(state.attempts(&NodeId::new("dob")), 0);
        assert!(state.variables(&NodeId::new("dob")).is_none());
    }

    #[test]
    fn event_kind_names() {
        assert_eq!(EventKind::UserInput.name(), "userInput");
        assert_eq!(
            EventKind::AskSubdata {
                variable: "day".into()
            }
            .name(),
            "askSubdata"
        );
    }
}
