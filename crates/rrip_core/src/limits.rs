/// Resource limits of a run; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    pub max_files: Option<u64>,
    /// Total bytes the run may transfer.
    pub max_storage: Option<u64>,
    /// Largest single file accepted.
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDecision {
    Accept,
    /// Skip this file; the run goes on.
    Skip,
    /// This file would overflow the storage budget; end the run.
    StopRun,
}

impl Limits {
    /// Decide on a file before it is created, from its declared length and
    /// the bytes transferred so far.
    pub fn evaluate(&self, length: Option<u64>, copied: u64) -> SizeDecision {
        if let Some(max) = self.max_file_size {
            match length {
                Some(length) if length <= max => {}
                _ => return SizeDecision::Skip,
            }
        }
        if let Some(max) = self.max_storage {
            let Some(length) = length else {
                return SizeDecision::Skip;
            };
            if copied.saturating_add(length) > max {
                return SizeDecision::StopRun;
            }
        }
        SizeDecision::Accept
    }

    pub fn file_cap_reached(&self, saved: u64) -> bool {
        self.max_files == Some(saved)
    }
}
