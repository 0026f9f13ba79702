//! Storage Adapters
//!
//! Implementations of the DdtRepository port.
//!
//! ## Available Adapters
//!
//! - **JsonFileDdtRepository** - Stores DDTs as JSON files on disk
//! - **InMemoryDdtRepository** - Stores DDTs in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryDdtRepository, JsonFileDdtRepository};
//!
//! // Production: file-based storage
//! let repo = JsonFileDdtRepository::new("./ddts");
//!
//! // Testing: in-memory storage
//! let repo = InMemoryDdtRepository::new();
//! ```

mod in_memory_ddt_repository;
mod json_file_ddt_repository;

pub use in_memory_ddt_repository::InMemoryDdtRepository;
pub use json_file_ddt_repository::JsonFileDdtRepository;
