//! rrip core: run configuration, listing model and the pure decisions of the pipeline.
mod config;
mod entry;
mod filter;
mod limits;
mod listing;
mod resolve;
mod size;
mod stats;
mod template;
mod termination;

pub use config::{
    ConfigError, Filters, FilenamePolicy, PreviewMode, RunConfig, ScrapeMode, SortMode,
    TimeWindow, DEFAULT_PAGE_SIZE,
};
pub use entry::{
    decode_listing, fullname, short_id, ListingDecodeError, ListingEntry, PreviewImage,
    PreviewVariant,
};
pub use filter::{evaluate_filters, select_preview, DropReason, FilterField, PreviewChoice, Verdict};
pub use limits::{Limits, SizeDecision};
pub use listing::ListingRequest;
pub use resolve::{resolve_static, MediaLink, ResolvedTarget, MEDIA_EXTENSIONS};
pub use size::human_size;
pub use stats::Stats;
pub use template::{is_falsy, Template, TemplateError};
pub use termination::TerminationReason;
