//! DDT assembler.
//!
//! Turns raw node descriptors and literal per-step messages into a canonical
//! [`Ddt`](crate::domain::ddt::Ddt), externalizing every text into the
//! translation table.

mod action_policy;
mod label;
mod pipeline;
mod raw;

pub use action_policy::{default_action_kind, ActionPolicy};
pub use label::{resolve_ddt_label, resolve_node_label, resolve_variable};
pub use pipeline::{disassemble, AssemblyError, DdtAssembler};
pub use raw::{AssemblyRequest, NodeMessages, RawNode};
