//! DDT Repository Port - Persistence for assembled DDT documents.
//!
//! Stores the canonical JSON document, translations included. Validation is
//! not the repository's concern; callers validate after loading.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ddt::Ddt;
use crate::domain::foundation::{DdtId, DomainError, ErrorCode};

/// Repository port for DDT documents.
#[async_trait]
pub trait DdtRepository: Send + Sync {
    /// Inserts or replaces a DDT.
    async fn save(&self, ddt: &Ddt) -> Result<(), RepositoryError>;

    /// Loads a DDT by id.
    async fn load(&self, id: &DdtId) -> Result<Option<Ddt>, RepositoryError>;

    /// Lists the ids of all stored DDTs, sorted.
    async fn list(&self) -> Result<Vec<DdtId>, RepositoryError>;

    /// Deletes a DDT. Returns false if it did not exist.
    async fn delete(&self, id: &DdtId) -> Result<bool, RepositoryError>;
}

/// Storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        DomainError::new(ErrorCode::StorageError, err.to_string())
    }
}
