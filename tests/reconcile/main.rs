//! Reconciler Integration Tests
//!
//! End-to-end behavior of Export, Restore and HealthCheck against an
//! in-memory primary and a SQLite backup on disk:
//! - export: bootstrap, delta, idempotence, failure without writes
//! - restore: completeness, replacement, skipped rows, empty backup
//! - health: one restore per failed probe, none on success
//! - round_trip: export then restore preserves every field

#[path = "../common/mod.rs"]
mod common;

mod export;
mod health;
mod restore;
mod round_trip;
