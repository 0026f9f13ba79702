//! DDT Engine - Dialogue Data Templates
//!
//! Describes a composite piece of data a conversational agent must collect
//! (a date of birth, an address, ...), assembles it into a canonical
//! template with externalized texts, and drives slot-filling sessions over
//! it turn by turn.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
