//! The in-memory credential collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::{CredentialRecord, StoredEntry};

/// All of a user's credentials, keyed by entry title.
///
/// Exists in plaintext only in memory and only while the session is
/// unlocked; the session layer drops it on every lock transition.
/// Serialized as a flat JSON object of title → record, which is the
/// byte form the vault cipher seals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialCollection {
    entries: BTreeMap<String, CredentialRecord>,
}

impl CredentialCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry under `title`, returning the
    /// previous record if one existed.
    pub fn insert(
        &mut self,
        title: impl Into<String>,
        record: CredentialRecord,
    ) -> Option<CredentialRecord> {
        self.entries.insert(title.into(), record)
    }

    /// Look up an entry by title.
    pub fn get(&self, title: &str) -> Option<&CredentialRecord> {
        self.entries.get(title)
    }

    /// Remove an entry by title.
    pub fn remove(&mut self, title: &str) -> Option<CredentialRecord> {
        self.entries.remove(title)
    }

    /// Whether an entry with `title` exists.
    pub fn contains(&self, title: &str) -> bool {
        self.entries.contains_key(title)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(title, record)` pairs in title order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CredentialRecord)> {
        self.entries.iter()
    }

    /// Rebuild a collection from decoded stored entries, normalizing
    /// legacy values as they come in.
    pub(crate) fn from_stored(stored: BTreeMap<String, StoredEntry>) -> Self {
        let entries = stored
            .into_iter()
            .map(|(title, entry)| (title, entry.normalize()))
            .collect();
        Self { entries }
    }
}
