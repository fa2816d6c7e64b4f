//! rrip engine: the listing-to-disk pipeline and everything that touches the network or filesystem.
mod classify;
mod decode;
mod download;
mod fetch;
mod filename;
mod logs;
mod paginate;
mod persist;
mod progress;
mod run;
mod scrape;
mod termination;
mod types;

pub use classify::{Classification, Classifier, MAX_SCRAPE_HOPS};
pub use decode::{decode_page, page_encoding, unescape_html, DecodeError, EncodingSource};
pub use download::Downloader;
pub use fetch::{
    ByteStream, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher, DEFAULT_API_BASE,
    DEFAULT_USER_AGENT,
};
pub use filename::{derive_filename, sanitize_filename};
pub use logs::LinkLogs;
pub use paginate::{EntryHandler, Paginator};
pub use persist::{ensure_output_dir, PartialFile, PersistError};
pub use progress::{ProgressThrottle, MIN_PROGRESS_BYTES, MIN_PROGRESS_INTERVAL};
pub use run::{run, RunContext, RunError};
pub use scrape::find_og_media;
pub use termination::TerminationController;
pub use types::{
    EngineEvent, EntryOutcome, FailureKind, FailureStage, FetchError, FetchMetadata, FetchOutput,
    ProbeInfo,
};
