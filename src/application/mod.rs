//! Application layer - Use cases over the domain and ports.
//!
//! `DdtService` publishes DDTs (assemble, validate, persist) and opens
//! dialogue sessions that share one immutable DDT per version.

mod ddt_service;

pub use ddt_service::{DdtService, DialogueSession};
