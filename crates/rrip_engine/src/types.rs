use std::fmt;

use rrip_core::{Stats, TerminationReason};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A resolved entry is about to be downloaded under `filename`.
    EntryStarted { filename: String },
    Progress {
        filename: String,
        bytes: u64,
        total: Option<u64>,
    },
    EntryFinished {
        filename: String,
        outcome: EntryOutcome,
    },
    /// Emitted once per run, after teardown.
    RunFinished {
        reason: TerminationReason,
        stats: Stats,
    },
}

/// What happened to one resolved entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Saved { bytes: u64 },
    DryRun,
    AlreadySaved,
    Failed { stage: FailureStage, error: FetchError },
    UnexpectedContentType { content_type: String },
    TooLarge { length: Option<u64> },
    CrossesStorageLimit { length: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Request,
    Create,
    Transfer,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Request => "Request",
            FailureStage::Create => "Create",
            FailureStage::Transfer => "Transfer",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn io(err: std::io::Error) -> Self {
        Self::new(FailureKind::Io, err.to_string())
    }
}

/// Why a request produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooManyRedirects,
    /// A scraped page exceeded the page size bound.
    PageTooLarge { limit: u64 },
    /// A scraped link answered with something other than HTML.
    NotAPage { content_type: String },
    Network,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => f.write_str("invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "status {code}"),
            FailureKind::Timeout => f.write_str("timed out"),
            FailureKind::TooManyRedirects => f.write_str("too many redirects"),
            FailureKind::PageTooLarge { limit } => write!(f, "page over {limit} bytes"),
            FailureKind::NotAPage { content_type } => write!(f, "not a page ({content_type})"),
            FailureKind::Network => f.write_str("connection failed"),
            FailureKind::Io => f.write_str("io"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

/// Status and headers of a media link, from a metadata-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl ProbeInfo {
    /// A successful answer with an `image/*` or `video/*` type.
    pub fn is_media(&self) -> bool {
        (200..300).contains(&self.status)
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/") || ct.starts_with("video/"))
    }
}
