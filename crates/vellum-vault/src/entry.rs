//! Credential records and legacy-entry migration.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A single stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    /// The secret value itself (password, key, recovery phrase).
    pub value: String,

    /// When the value last changed.
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,

    /// Optional user-facing grouping label.
    #[zeroize(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Free-form auxiliary fields (username, URL, notes).
    #[zeroize(skip)]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl CredentialRecord {
    /// Build a record for `value`, stamped with the current time.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: Utc::now(),
            category: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style category assignment.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder-style auxiliary-field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Decoded shape of one entry inside the sealed payload.
///
/// Early vault versions stored each entry as its bare secret string;
/// current vaults store the full record. Unsealing accepts both and
/// upgrades legacy values once, at read time, via [`StoredEntry::normalize`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    /// Current structured form.
    Record(CredentialRecord),
    /// Legacy bare secret value with no metadata.
    Legacy(String),
}

impl StoredEntry {
    /// Collapse either form into a full record. Legacy values get a
    /// last-modified timestamp synthesized at the moment they are
    /// first read back.
    pub fn normalize(self) -> CredentialRecord {
        match self {
            StoredEntry::Record(record) => record,
            StoredEntry::Legacy(value) => CredentialRecord::new(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_structured_record() {
        let json = r#"{"value":"hunter2","updated_at":"2024-03-01T10:30:00Z","category":"email"}"#;
        let entry: StoredEntry = serde_json::from_str(json).unwrap();

        let record = entry.normalize();
        assert_eq!(record.value, "hunter2");
        assert_eq!(record.category.as_deref(), Some("email"));
        assert_eq!(
            record.updated_at,
            "2024-03-01T10:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_decodes_legacy_bare_string() {
        let before = Utc::now();
        let entry: StoredEntry = serde_json::from_str(r#""hunter2""#).unwrap();

        let record = entry.normalize();
        assert_eq!(record.value, "hunter2");
        assert!(record.category.is_none());
        assert!(record.fields.is_empty());
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_record_roundtrips_through_json() {
        let record = CredentialRecord::new("s3cret")
            .with_category("banking")
            .with_field("username", "alice@example.com");

        let json = serde_json::to_string(&record).unwrap();
        let back: CredentialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
