//! File-based DDT Repository Adapter
//!
//! Stores each DDT as a pretty-printed JSON document named `<ddtId>.json`
//! under a base directory. The document is the persisted camelCase form,
//! translations included.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::ddt::Ddt;
use crate::domain::foundation::DdtId;
use crate::ports::{DdtRepository, RepositoryError};

const EXTENSION: &str = "json";

/// File-based storage for DDT documents
#[derive(Debug, Clone)]
pub struct JsonFileDdtRepository {
    base_path: PathBuf,
}

impl JsonFileDdtRepository {
    /// Create a repository rooted at `base_path`; the directory is created on first save.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, id: &DdtId) -> PathBuf {
        self.base_path.join(format!("{}.{}", id, EXTENSION))
    }
}

#[async_trait]
impl DdtRepository for JsonFileDdtRepository {
    async fn save(&self, ddt: &Ddt) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.base_path).await?;

        let json = serde_json::to_string_pretty(ddt)?;
        let path = self.file_path(&ddt.id);
        let staging = path.with_extension("json.tmp");

        // Write then rename so readers never see a half-written document
        fs::write(&staging, json).await?;
        fs::rename(&staging, &path).await?;

        tracing::debug!(ddt_id = %ddt.id, path = %path.display(), "DDT written");
        Ok(())
    }

    async fn load(&self, id: &DdtId) -> Result<Option<Ddt>, RepositoryError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn list(&self) -> Result<Vec<DdtId>, RepositoryError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match DdtId::new(stem) {
                Ok(id) => ids.push(id),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping file with invalid DDT id");
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, id: &DdtId) -> Result<bool, RepositoryError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assembler::{AssemblyRequest, DdtAssembler, NodeMessages, RawNode};
    use crate::domain::foundation::SequentialIds;
    use tempfile::TempDir;

    fn ddt(id: &str) -> Ddt {
        DdtAssembler::default()
            .assemble(
                AssemblyRequest::new(
                    RawNode::new("city", "text").with_label("City"),
                    NodeMessages::new().with_escalation("start", ["Which city?"]),
                )
                .with_ddt_id(id),
                &mut SequentialIds::new(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path().join("ddts"));

        repo.save(&ddt("city")).await.unwrap();
        let loaded = repo.load(&DdtId::new("city").unwrap()).await.unwrap();

        assert_eq!(loaded, Some(ddt("city")));
        assert!(dir.path().join("ddts/city.json").exists());
    }

    #[tokio::test]
    async fn document_uses_persisted_field_names() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path());
        repo.save(&ddt("city")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("city.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["mainData"]["variable"], "city");
        assert_eq!(value["mainData"]["steps"][0]["type"], "start");
        assert!(value["mainData"]["steps"][0]["escalations"][0]["actions"][0]["actionInstanceId"]
            .is_string());
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path());
        assert!(repo.load(&DdtId::new("nope").unwrap()).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path());
        repo.save(&ddt("b")).await.unwrap();
        repo.save(&ddt("a")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("bad.name.json"), "{}").unwrap();

        let ids = repo.list().await.unwrap();
        assert_eq!(ids, vec![DdtId::new("a").unwrap(), DdtId::new("b").unwrap()]);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path());
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let err = repo.load(&DdtId::new("broken").unwrap()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt(_)));
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileDdtRepository::new(dir.path());
        repo.save(&ddt("a")).await.unwrap();
        assert!(repo.delete(&DdtId::new("a").unwrap()).await.unwrap());
        assert!(!dir.path().join("a.json").exists());
    }
}
