//! Store contract and implementations
//!
//! Records are JSON objects grouped in typed collections. A store assigns
//! the `id` of records added without one and echoes caller-supplied ids
//! (and any `externalId`) back unchanged.

mod file;
mod filter;
mod memory;
mod parsers;

pub use file::FileStore;
pub use filter::Filter;
pub use memory::MemoryStore;
pub use parsers::{parse_input_id, parse_output_id};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, StoreError};

/// A stored record.
pub type Record = serde_json::Map<String, Value>;

/// The record collections the orchestrator writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Sessions,
    Cues,
    Interactions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::Sessions, Self::Cues, Self::Interactions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Cues => "cues",
            Self::Interactions => "interactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed record storage with exact-match filtering.
#[async_trait]
pub trait Store: Send + Sync {
    /// Bring up the backend. Failing here is the one store error
    /// allowed to abort orchestrator startup.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        Ok(())
    }

    /// First record matching `filter`.
    async fn find_item(&self, collection: Collection, filter: &Filter) -> Result<Option<Record>>;

    /// Insert a record, assigning an `id` when it has none. A record with an
    /// existing `id` replaces the stored one.
    async fn add_item(&self, collection: Collection, record: Record) -> Result<Record>;

    async fn add_items(&self, collection: Collection, records: Vec<Record>) -> Result<Vec<Record>> {
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(self.add_item(collection, record).await?);
        }
        Ok(saved)
    }

    /// Shallow-merge `patch` into the record `id`. `None` when it does not exist.
    async fn update_item(
        &self,
        collection: Collection,
        id: &str,
        patch: Record,
    ) -> Result<Option<Record>>;

    async fn delete_item(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Delete every record matching `filter`, returning how many were removed.
    async fn delete_items(&self, collection: Collection, filter: &Filter) -> Result<usize>;

    /// Every record matching `filter`, in insertion order.
    async fn get_items(&self, collection: Collection, filter: &Filter) -> Result<Vec<Record>>;
}

/// Serialize a model value into a record.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::InvalidRecord(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize a record into a model value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// The `id` of a record, accepting numeric ids from foreign backends.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Ensure `record` carries an id, generating one when missing.
pub(crate) fn with_id(mut record: Record) -> (String, Record) {
    let id = record_id(&record).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    record.insert("id".to_string(), Value::String(id.clone()));
    (id, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_accepts_numbers() {
        let record = Record::from_iter([("id".to_string(), json!(42))]);
        assert_eq!(record_id(&record).as_deref(), Some("42"));
    }

    #[test]
    fn test_with_id_preserves_existing_id() {
        let record = Record::from_iter([("id".to_string(), json!("keep"))]);
        let (id, record) = with_id(record);
        assert_eq!(id, "keep");
        assert_eq!(record["id"], json!("keep"));
    }

    #[test]
    fn test_to_record_rejects_scalars() {
        assert!(matches!(to_record(&1), Err(StoreError::InvalidRecord(_))));
    }
}
