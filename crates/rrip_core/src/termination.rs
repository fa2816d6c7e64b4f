use std::fmt;

/// Why a run ended. Every reason is a normal end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    PagesExhausted,
    FileCapReached,
    StorageCapWouldExceed,
    UserInterrupt,
}

impl TerminationReason {
    pub fn exit_code(self) -> u8 {
        0
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationReason::PagesExhausted => "no more entries",
            TerminationReason::FileCapReached => "file limit reached",
            TerminationReason::StorageCapWouldExceed => "storage limit would be exceeded",
            TerminationReason::UserInterrupt => "interrupted",
        })
    }
}
