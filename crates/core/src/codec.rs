//! Transport text form of records
//!
//! Embeddings and metadata are stored as JSON text. An absent value is
//! written as the literal `null`, and both `null` and a SQL `NULL` column
//! decode back to an absent value. Documents pass through unchanged.

use crate::error::{Error, Result};
use crate::record::{BackupEntry, Record};

/// Serialize a record into its backup row form
pub fn encode_record(record: &Record) -> Result<BackupEntry> {
    let embedding = serde_json::to_string(&record.embedding)
        .map_err(|e| Error::malformed(&record.id, format!("embedding: {}", e)))?;
    let metadata = serde_json::to_string(&record.metadata)
        .map_err(|e| Error::malformed(&record.id, format!("metadata: {}", e)))?;

    Ok(BackupEntry {
        id: record.id.clone(),
        embedding: Some(embedding),
        metadata: Some(metadata),
        document: record.document.clone(),
    })
}

/// Parse a backup row back into a record
///
/// Returns [`Error::Malformed`] carrying the row id when either payload
/// fails to parse.
pub fn decode_entry(entry: BackupEntry) -> Result<Record> {
    let embedding = parse_payload(&entry.id, "embedding", entry.embedding.as_deref())?;
    let metadata = parse_payload(&entry.id, "metadata", entry.metadata.as_deref())?;

    Ok(Record {
        id: entry.id,
        embedding,
        metadata,
        document: entry.document,
    })
}

/// SQL `NULL`, blank text and JSON `null` are all absent.
fn parse_payload(id: &str, field: &str, text: Option<&str>) -> Result<Option<serde_json::Value>> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str(text) {
        Ok(serde_json::Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(Error::malformed(id, format!("{}: {}", field, e))),
    }
}
