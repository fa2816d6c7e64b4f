use std::fmt;

use crate::human_size;

/// Counters of one run. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    processed: u64,
    saved: u64,
    failed: u64,
    repeated: u64,
    copied_bytes: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn saved(&self) -> u64 {
        self.saved
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn repeated(&self) -> u64 {
        self.repeated
    }

    pub fn copied_bytes(&self) -> u64 {
        self.copied_bytes
    }

    /// Entries that were neither saved, failed nor already present.
    pub fn other(&self) -> u64 {
        self.processed - self.settled()
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_saved(&mut self) {
        self.saved += 1;
        self.check_invariant();
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
        self.check_invariant();
    }

    pub fn record_repeated(&mut self) {
        self.repeated += 1;
        self.check_invariant();
    }

    /// Bytes count even when the transfer later fails.
    pub fn add_copied_bytes(&mut self, bytes: u64) {
        self.copied_bytes += bytes;
    }

    fn settled(&self) -> u64 {
        self.saved + self.failed + self.repeated
    }

    fn check_invariant(&self) {
        debug_assert!(
            self.settled() <= self.processed,
            "more outcomes than processed entries: {self:?}"
        );
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed Posts: {}", self.processed)?;
        writeln!(f, "Already Downloaded: {}", self.repeated)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Saved: {}", self.saved)?;
        writeln!(f, "Other: {}", self.other())?;
        write!(f, "Approx. Storage Used: {}", human_size(Some(self.copied_bytes)))
    }
}
