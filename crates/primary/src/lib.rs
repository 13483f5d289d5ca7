//! Primary store clients for vaultsync
//!
//! The primary store is the live vector database serving production
//! traffic. The reconciler talks to it only through [`PrimaryStore`], so
//! the same export/restore logic drives either client:
//!
//! | Client | Transport |
//! |--------|-----------|
//! | [`HttpPrimaryStore`] | Chroma-style REST API over `ureq` |
//! | [`MemoryPrimaryStore`] | in-process collections, no network |

#![warn(missing_docs)]

mod endpoint;
mod http;
mod memory;

pub use endpoint::Endpoint;
pub use http::{HttpPrimaryStore, DEFAULT_TIMEOUT_MS};
pub use memory::MemoryPrimaryStore;

use vaultsync_core::{CollectionSnapshot, Record, Result};

/// Primary store abstraction
///
/// The trait is object-safe for use as `Arc<dyn PrimaryStore>`.
///
/// Missing collections are reported as
/// [`vaultsync_core::ErrorKind::NotFound`], network and API failures as
/// [`vaultsync_core::ErrorKind::Transient`].
pub trait PrimaryStore: Send + Sync {
    /// Human-readable location, used in log fields
    fn describe(&self) -> String;

    /// Fetch every record of `collection`, positionally aligned
    ///
    /// # Errors
    ///
    /// NotFound if the collection does not exist, Transient on I/O
    /// failure, Malformed if the payload cannot be decoded.
    fn get_all(&self, collection: &str) -> Result<CollectionSnapshot>;

    /// Lightweight check that `collection` exists and answers
    ///
    /// # Errors
    ///
    /// Any failure, including a missing collection.
    fn probe(&self, collection: &str) -> Result<()>;

    /// Delete `collection`
    ///
    /// Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Transient on I/O failure.
    fn delete_collection(&self, collection: &str) -> Result<bool>;

    /// Create an empty `collection`
    ///
    /// # Errors
    ///
    /// Transient on I/O failure.
    fn create_collection(&self, collection: &str) -> Result<()>;

    /// Write `records` into `collection` in a single call
    ///
    /// Returns the number of records accepted.
    ///
    /// # Errors
    ///
    /// WriteRejected if the store reports failure for the batch.
    fn bulk_add(&self, collection: &str, records: &[Record]) -> Result<usize>;
}
