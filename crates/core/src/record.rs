//! Record types shared by both stores
//!
//! A [`Record`] is the unit of synchronization. The reconciler never looks
//! inside `embedding` or `metadata`; it only moves them between stores, so
//! both are kept as JSON values exactly as the primary returned them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One `(id, embedding, metadata, document)` tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within a collection; primary key in the backup store
    pub id: String,

    /// Embedding, transported as-is (normally an array of numbers)
    #[serde(default)]
    pub embedding: Option<serde_json::Value>,

    /// Arbitrary JSON metadata
    ///
    /// A JSON `null` is indistinguishable from an absent value once backed
    /// up: `Some(Value::Null)` is stored as `null` and restores as `None`.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,

    /// Raw document text
    #[serde(default)]
    pub document: Option<String>,
}

impl Record {
    /// Create a record with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            embedding: None,
            metadata: None,
            document: None,
        }
    }

    /// Attach a numeric embedding
    ///
    /// Non-finite components have no JSON form and become `null`.
    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = Some(serde_json::Value::from(embedding));
        self
    }

    /// Attach an embedding in whatever JSON shape the primary uses
    pub fn with_raw_embedding(mut self, embedding: serde_json::Value) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach document text
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }
}

/// A backup store row: the serialized form of a [`Record`]
///
/// `embedding` and `metadata` hold JSON text. `None` means the column is
/// SQL `NULL`; an absent value written by vaultsync is the text `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// Primary key
    pub id: String,
    /// Embedding as JSON text
    pub embedding: Option<String>,
    /// Metadata as JSON text
    pub metadata: Option<String>,
    /// Document text, stored verbatim
    pub document: Option<String>,
}

/// Columnar payload of a whole collection, as returned by `GetAll`
///
/// Columns are positionally aligned with `ids` but may be shorter; a
/// missing position means the field is absent for that record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// Record ids
    #[serde(default)]
    pub ids: Vec<String>,
    /// Embeddings, possibly shorter than `ids`
    #[serde(default, deserialize_with = "nullable_vec")]
    pub embeddings: Vec<Option<serde_json::Value>>,
    /// Metadata documents, possibly shorter than `ids`
    #[serde(default, deserialize_with = "nullable_vec")]
    pub metadatas: Vec<Option<serde_json::Value>>,
    /// Documents, possibly shorter than `ids`
    #[serde(default, deserialize_with = "nullable_vec")]
    pub documents: Vec<Option<String>>,
}

/// Chroma returns `null` instead of `[]` for columns it did not include.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CollectionSnapshot {
    /// Number of ids in the snapshot
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the snapshot has no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Build a snapshot from row-shaped records
    pub fn from_records(records: &[Record]) -> Self {
        let mut snapshot = CollectionSnapshot::default();
        for record in records {
            snapshot.ids.push(record.id.clone());
            snapshot.embeddings.push(record.embedding.clone());
            snapshot.metadatas.push(record.metadata.clone());
            snapshot.documents.push(record.document.clone());
        }
        snapshot
    }

    /// Materialize row-shaped records
    ///
    /// Each id is yielded at most once (first occurrence wins). Positions
    /// beyond the end of a shorter column are treated as absent.
    pub fn records(&self) -> Vec<Record> {
        let mut seen = HashSet::with_capacity(self.ids.len());
        let mut out = Vec::with_capacity(self.ids.len());
        for (i, id) in self.ids.iter().enumerate() {
            if !seen.insert(id.as_str()) {
                continue;
            }
            out.push(Record {
                id: id.clone(),
                embedding: self.embeddings.get(i).cloned().flatten(),
                metadata: self.metadatas.get(i).cloned().flatten(),
                document: self.documents.get(i).cloned().flatten(),
            });
        }
        out
    }
}
