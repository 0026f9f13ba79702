//! In-Memory DDT Repository Adapter
//!
//! Keeps DDT documents in memory.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::ddt::Ddt;
use crate::domain::foundation::DdtId;
use crate::ports::{DdtRepository, RepositoryError};

/// In-memory storage for DDT documents
#[derive(Debug, Clone, Default)]
pub struct InMemoryDdtRepository {
    ddts: Arc<RwLock<HashMap<DdtId, Ddt>>>,
}

impl InMemoryDdtRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored DDTs
    pub async fn count(&self) -> usize {
        self.ddts.read().await.len()
    }
}

#[async_trait]
impl DdtRepository for InMemoryDdtRepository {
    async fn save(&self, ddt: &Ddt) -> Result<(), RepositoryError> {
        self.ddts.write().await.insert(ddt.id.clone(), ddt.clone());
        Ok(())
    }

    async fn load(&self, id: &DdtId) -> Result<Option<Ddt>, RepositoryError> {
        Ok(self.ddts.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<DdtId>, RepositoryError> {
        let mut ids: Vec<DdtId> = self.ddts.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, id: &DdtId) -> Result<bool, RepositoryError> {
        Ok(self.ddts.write().await.remove(id).is_some())
    }
}
