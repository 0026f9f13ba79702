//! DDT data model.
//!
//! Pure structure: nodes, constraints, step groups, escalations and actions.
//! Display text is never stored inline, only as translation keys.

mod action;
mod constraint;
mod document;
mod node;
mod step;
mod validator;

pub use action::{Action, ActionKind, ActionParameter, TEXT_PARAMETER};
pub use constraint::{Constraint, ConstraintTestCase};
pub use document::Ddt;
pub use node::{DataNode, NodeMeta};
pub use step::{Escalation, EscalationLadder, StepGroup, StepType};
pub use validator::{validate, StructuralError, StructuralViolation, ValidatedDdt};
