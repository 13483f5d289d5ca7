//! Operation summaries returned to callers and logged

use std::fmt;

/// Result of one export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Records fetched from the primary collection
    pub fetched: usize,
    /// Fetched records whose id was already in the backup
    pub already_backed_up: usize,
    /// Rows upserted into the backup table
    pub upserted: usize,
    /// The backup table did not exist when the run started
    pub bootstrapped: bool,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} already_backed_up={} upserted={}",
            self.fetched, self.already_backed_up, self.upserted
        )?;
        if self.bootstrapped {
            write!(f, " (bootstrap)")?;
        }
        Ok(())
    }
}

/// Result of one restore run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Rows read from the backup table
    pub read: usize,
    /// Rows skipped because their payload did not parse
    pub skipped: usize,
    /// Records written into the restore collection
    pub written: usize,
    /// A collection with the target name existed and was deleted first
    pub replaced_existing: bool,
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} skipped={} written={}",
            self.read, self.skipped, self.written
        )?;
        if self.replaced_existing {
            write!(f, " (replaced existing collection)")?;
        }
        Ok(())
    }
}
