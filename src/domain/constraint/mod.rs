//! Constraint engine.
//!
//! Normalizes raw constraints against a catalog of built-in types,
//! externalizes their prompts, and checks/evaluates validation scripts.

mod catalog;
mod normalizer;
mod predicate;

pub use catalog::{builtin, builtin_kinds, BuiltinConstraint};
pub use normalizer::{
    attach_prompts, is_satisfied, normalize, self_test, NormalizedConstraint, RawConstraint,
    TestOutcome,
};
pub use predicate::{check_script, EvalContext, Predicate, PredicateError};
