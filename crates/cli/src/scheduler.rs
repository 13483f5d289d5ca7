//! Periodic job loop for `vaultsync run`.
//!
//! Jobs run sequentially on the calling thread, so export and a
//! health-triggered restore never overlap inside one process. Each job
//! first fires one period after start, then one period after it last ran.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use vaultsync_reconcile::{HealthStatus, Reconciler};

/// Longest the loop sleeps before rechecking the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Reconciler::export
    Export,
    /// Reconciler::health_check
    HealthCheck,
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Export => "export",
            Job::HealthCheck => "health_check",
        }
    }
}

#[derive(Debug)]
struct Entry {
    job: Job,
    every: Duration,
    next_due: Instant,
}

/// Due-time bookkeeping, independent of the clock.
#[derive(Debug)]
pub struct Schedule {
    entries: Vec<Entry>,
}

impl Schedule {
    /// Export every `export_every`, health check every `health_every`,
    /// both counted from `start`.
    pub fn new(start: Instant, export_every: Duration, health_every: Duration) -> Self {
        Schedule {
            entries: vec![
                Entry {
                    job: Job::Export,
                    every: export_every,
                    next_due: start + export_every,
                },
                Entry {
                    job: Job::HealthCheck,
                    every: health_every,
                    next_due: start + health_every,
                },
            ],
        }
    }

    /// Jobs due at `now`, in registration order. Their next due time is
    /// pushed to `now + every`.
    pub fn take_due(&mut self, now: Instant) -> Vec<Job> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if now >= entry.next_due {
                due.push(entry.job);
                entry.next_due = now + entry.every;
            }
        }
        due
    }

    /// Earliest next due time
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.next_due).min()
    }
}

/// How long to sleep at `now`: until the next job is due, capped at
/// [`POLL_INTERVAL`].
pub fn sleep_for(schedule: &Schedule, now: Instant) -> Duration {
    schedule
        .next_due()
        .map_or(POLL_INTERVAL, |due| due.saturating_duration_since(now))
        .min(POLL_INTERVAL)
}

/// Run one job, logging its outcome. Never panics on job failure.
pub fn run_job(reconciler: &Reconciler, job: Job) {
    info!(target: "vaultsync::scheduler", job = job.name(), "Running scheduled job");
    match job {
        Job::Export => match reconciler.export() {
            Ok(report) => info!(
                target: "vaultsync::scheduler",
                job = job.name(),
                %report,
                "Scheduled export finished"
            ),
            Err(e) => error!(
                target: "vaultsync::scheduler",
                job = job.name(),
                error = %e,
                "Scheduled export failed"
            ),
        },
        Job::HealthCheck => {
            if let HealthStatus::Unhealthy { restore, .. } = reconciler.health_check() {
                warn!(
                    target: "vaultsync::scheduler",
                    job = job.name(),
                    restore = ?restore,
                    "Primary collection unhealthy"
                );
            }
        }
    }
}

/// Loop until `stop` is set, running jobs as they fall due.
pub fn run_loop(reconciler: &Reconciler, schedule: &mut Schedule, stop: &AtomicBool) {
    info!(target: "vaultsync::scheduler", "Scheduler started");
    while !stop.load(Ordering::SeqCst) {
        for job in schedule.take_due(Instant::now()) {
            run_job(reconciler, job);
        }
        std::thread::sleep(sleep_for(schedule, Instant::now()));
    }
    info!(target: "vaultsync::scheduler", "Scheduler stopped");
}
