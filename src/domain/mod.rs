//! Domain layer containing the DDT model and the dialogue algorithms.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, id sources, timestamps, errors)
//! - `translation` - Translation keys and the key -> text table
//! - `ddt` - DDT data model and the structural validator
//! - `constraint` - Built-in constraints, normalization, validation scripts
//! - `assembler` - Raw descriptors to canonical DDT (and back)
//! - `runtime` - Session state and the slot-filling engine
//! - `simulator` - Transcript-keeping driver over the engine

pub mod assembler;
pub mod constraint;
pub mod ddt;
pub mod foundation;
pub mod runtime;
pub mod simulator;
pub mod translation;
