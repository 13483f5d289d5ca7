//! HealthCheck: probe the primary, restore on failure
//!
//! Two states, no hysteresis. Every failed probe is Unhealthy and
//! triggers a restore right away, unless a restore cooldown is configured
//! and the previous triggered restore started less than one cooldown ago.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{error, info, warn};
use vaultsync_core::Error;
use vaultsync_primary::PrimaryStore;

use crate::report::RestoreReport;

const TARGET: &str = "vaultsync::health";

/// What happened to the restore an Unhealthy check triggered
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Restore ran to completion
    Completed(RestoreReport),
    /// Restore ran and failed
    Failed(Error),
    /// Restore skipped because of the cooldown
    Suppressed {
        /// Time until a triggered restore may run again
        retry_in: Duration,
    },
}

impl RestoreOutcome {
    /// Records written, if the restore completed
    pub fn written(&self) -> Option<usize> {
        match self {
            RestoreOutcome::Completed(report) => Some(report.written),
            _ => None,
        }
    }
}

/// Classification of one health check
#[derive(Debug)]
pub enum HealthStatus {
    /// Probe succeeded; nothing else was done
    Healthy,
    /// Probe failed; a restore was triggered
    Unhealthy {
        /// Why the probe failed
        cause: Error,
        /// The triggered restore's result
        restore: RestoreOutcome,
    },
}

impl HealthStatus {
    /// True for [`HealthStatus::Healthy`]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Rate limit for health-triggered restores.
#[derive(Debug, Default)]
pub(crate) struct RestoreGate {
    cooldown: Option<Duration>,
    last_started: Mutex<Option<Instant>>,
}

impl RestoreGate {
    pub(crate) fn new(cooldown: Option<Duration>) -> Self {
        RestoreGate {
            cooldown,
            last_started: Mutex::new(None),
        }
    }

    /// Claim the right to start a restore now.
    ///
    /// Returns the remaining wait if the cooldown has not elapsed.
    pub(crate) fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let Some(cooldown) = self.cooldown else {
            return Ok(());
        };
        let mut last = self.last_started.lock();
        if let Some(started) = *last {
            let elapsed = now.saturating_duration_since(started);
            if elapsed < cooldown {
                return Err(cooldown - elapsed);
            }
        }
        *last = Some(now);
        Ok(())
    }
}

/// Probe `collection` and run `restore` if the probe fails.
pub(crate) fn run_health_check<F>(
    primary: &dyn PrimaryStore,
    collection: &str,
    gate: &RestoreGate,
    restore: F,
) -> HealthStatus
where
    F: FnOnce() -> vaultsync_core::Result<RestoreReport>,
{
    info!(target: TARGET, collection, "Performing health check");

    let cause = match primary.probe(collection) {
        Ok(()) => {
            info!(target: TARGET, collection, "Collection is healthy");
            return HealthStatus::Healthy;
        }
        Err(e) => e,
    };

    error!(
        target: TARGET,
        collection,
        kind = cause.kind().name(),
        error = %cause,
        "Health check failed"
    );

    let outcome = match gate.try_acquire(Instant::now()) {
        Err(retry_in) => {
            warn!(
                target: TARGET,
                retry_in_secs = retry_in.as_secs(),
                "Restore cooldown active, not triggering restore"
            );
            RestoreOutcome::Suppressed { retry_in }
        }
        Ok(()) => {
            info!(target: TARGET, "Triggering restore from backup");
            match restore() {
                Ok(report) => RestoreOutcome::Completed(report),
                Err(e) => {
                    error!(target: TARGET, error = %e, "Triggered restore failed");
                    RestoreOutcome::Failed(e)
                }
            }
        }
    };

    HealthStatus::Unhealthy {
        cause,
        restore: outcome,
    }
}
