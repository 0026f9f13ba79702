//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types
//! that form the vocabulary of the DDT domain.

mod ids;
mod timestamp;
mod errors;

pub use ids::{
    ActionInstanceId, ConstraintId, DdtId, EscalationId, IdKind, IdSource, NodeId, RandomIds,
    SequentialIds,
};
pub use timestamp::Timestamp;
pub use errors::{DomainError, ErrorCode, ValidationError};
