//! Dialogue runtime.
//!
//! Sessions over a [`ValidatedDdt`](crate::domain::ddt::ValidatedDdt):
//! escalation and saturation predicates, per-node progress, and the
//! [`DialogueEngine`] state machine that advances a session turn by turn.

mod engine;
mod escalation;
mod saturation;
mod session;
mod variables;

pub use engine::{
    DialogueEngine, EngineConfig, RuntimeError, Turn, TurnOutcome, DEFAULT_TERMINAL_NODE,
};
pub use escalation::{check_escalation, is_blank};
pub use saturation::{is_data_saturated, is_node_saturated, node_value, DATE_PARTS};
pub use session::{DialogueEvent, EventKind, NodeProgress, SessionState, Speaker};
pub use variables::{is_present, is_truthy, VariableSet};
