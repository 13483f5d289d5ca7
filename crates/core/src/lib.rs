//! Core types for vaultsync
//!
//! This crate defines the foundational types used throughout the system:
//! - Record: one (id, embedding, metadata, document) tuple
//! - BackupEntry: the serialized backup row
//! - CollectionSnapshot: positionally aligned collection payload
//! - Codec: record <-> backup row text form
//! - Error: error taxonomy with explicit kinds

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod record;

pub use codec::{decode_entry, encode_record};
pub use error::{Error, ErrorKind, Result};
pub use record::{BackupEntry, CollectionSnapshot, Record};
