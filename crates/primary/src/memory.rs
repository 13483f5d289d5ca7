//! In-process primary store
//!
//! Collections live in a map guarded by a `RwLock`. Besides serving as an
//! embedded primary, this client supports fault injection and counts the
//! calls the reconciler makes, so export/restore/health behavior can be
//! verified without a network.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use vaultsync_core::{CollectionSnapshot, Error, Record, Result};

use crate::PrimaryStore;

type Collection = BTreeMap<String, Record>;

/// Call counters, one per mutating or probing operation
#[derive(Debug, Default)]
struct Counters {
    probes: AtomicUsize,
    deletes: AtomicUsize,
    creates: AtomicUsize,
    bulk_adds: AtomicUsize,
}

/// Primary store held in process memory.
#[derive(Debug)]
pub struct MemoryPrimaryStore {
    collections: RwLock<HashMap<String, Collection>>,
    available: AtomicBool,
    fail_bulk_add: AtomicBool,
    counters: Counters,
}

impl Default for MemoryPrimaryStore {
    fn default() -> Self {
        MemoryPrimaryStore {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            fail_bulk_add: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }
}

impl MemoryPrimaryStore {
    /// Empty store, available
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one collection holding `records`
    pub fn with_collection(name: &str, records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        store.upsert(name, records);
        store
    }

    /// Insert or overwrite records, creating the collection if needed
    ///
    /// This is the upstream-producer path; it is not counted as a
    /// reconciler call.
    pub fn upsert(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        let mut guard = self.collections.write();
        let target = guard.entry(collection.to_string()).or_default();
        for record in records {
            target.insert(record.id.clone(), record);
        }
    }

    /// Drop a collection without counting it as a reconciler delete
    pub fn drop_collection(&self, collection: &str) {
        self.collections.write().remove(collection);
    }

    /// Records of `collection`, ordered by id
    pub fn records(&self, collection: &str) -> Option<Vec<Record>> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.values().cloned().collect())
    }

    /// Whether `collection` exists
    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.read().contains_key(collection)
    }

    /// Simulate an outage: every call fails Transient while unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make `bulk_add` reject its batch
    pub fn set_fail_bulk_add(&self, fail: bool) {
        self.fail_bulk_add.store(fail, Ordering::SeqCst);
    }

    /// Number of `probe` calls
    pub fn probe_calls(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    /// Number of `delete_collection` calls
    pub fn delete_calls(&self) -> usize {
        self.counters.deletes.load(Ordering::SeqCst)
    }

    /// Number of `create_collection` calls
    pub fn create_calls(&self) -> usize {
        self.counters.creates.load(Ordering::SeqCst)
    }

    /// Number of `bulk_add` calls
    pub fn bulk_add_calls(&self) -> usize {
        self.counters.bulk_adds.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::transient("primary store unavailable"))
        }
    }

    fn missing(collection: &str) -> Error {
        Error::not_found(format!("collection '{}'", collection))
    }
}

impl PrimaryStore for MemoryPrimaryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn get_all(&self, collection: &str) -> Result<CollectionSnapshot> {
        self.check_available()?;
        let guard = self.collections.read();
        let records: Vec<Record> = guard
            .get(collection)
            .ok_or_else(|| Self::missing(collection))?
            .values()
            .cloned()
            .collect();
        Ok(CollectionSnapshot::from_records(&records))
    }

    fn probe(&self, collection: &str) -> Result<()> {
        self.counters.probes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.has_collection(collection) {
            Ok(())
        } else {
            Err(Self::missing(collection))
        }
    }

    fn delete_collection(&self, collection: &str) -> Result<bool> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.collections.write().remove(collection).is_some())
    }

    fn create_collection(&self, collection: &str) -> Result<()> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    fn bulk_add(&self, collection: &str, records: &[Record]) -> Result<usize> {
        self.counters.bulk_adds.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.fail_bulk_add.load(Ordering::SeqCst) {
            return Err(Error::write_rejected(
                format!("collection '{}'", collection),
                "injected bulk add failure",
            ));
        }

        let mut guard = self.collections.write();
        let target = guard
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;
        for record in records {
            target.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }
}
