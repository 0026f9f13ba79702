//! Flat key -> literal text map holding every user-facing string of a DDT.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::TranslationKey;

/// Errors raised when reading from or writing to a translation table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Translation key '{0}' is missing")]
    Missing(TranslationKey),

    #[error("Translation key '{0}' is already defined")]
    Duplicate(TranslationKey),
}

/// Literal texts addressed by [`TranslationKey`].
///
/// Readers must treat a missing key as an error, never as blank text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: BTreeMap<TranslationKey, String>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new entry. Fails if the key already exists.
    pub fn insert_new(
        &mut self,
        key: TranslationKey,
        text: impl Into<String>,
    ) -> Result<(), TranslationError> {
        if self.entries.contains_key(&key) {
            return Err(TranslationError::Duplicate(key));
        }
        self.entries.insert(key, text.into());
        Ok(())
    }

    /// Sets an entry, replacing any previous text.
    pub fn upsert(&mut self, key: TranslationKey, text: impl Into<String>) {
        self.entries.insert(key, text.into());
    }

    pub fn get(&self, key: &TranslationKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the text for `key` or [`TranslationError::Missing`].
    pub fn resolve(&self, key: &TranslationKey) -> Result<&str, TranslationError> {
        self.get(key)
            .ok_or_else(|| TranslationError::Missing(key.clone()))
    }

    pub fn contains(&self, key: &TranslationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TranslationKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Removes all keys belonging to the given DDT id.
    ///
    /// Used before re-assembly so stale keys of a previous assembly do not
    /// linger as orphans.
    pub fn without_ddt(&self, ddt_id: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| key.parts().map_or(true, |p| p.ddt_id() != ddt_id))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { entries }
    }
}
