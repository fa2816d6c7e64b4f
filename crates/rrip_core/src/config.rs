use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::{Limits, Template};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid sort: {0} (expected best|hot|new|rising|top-<hour|day|week|month|year|all>)")]
    InvalidSort(String),
    #[error("invalid og type: {0} (expected image, video or any)")]
    InvalidScrapeMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

/// Listing order. `Top` listings are ranked by score within a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Best,
    Hot,
    New,
    Rising,
    Top(TimeWindow),
}

impl SortMode {
    /// Name the listing API uses for this order; `best` has no path segment.
    pub fn api_name(self) -> Option<&'static str> {
        match self {
            SortMode::Best => None,
            SortMode::Hot => Some("hot"),
            SortMode::New => Some("new"),
            SortMode::Rising => Some("rising"),
            SortMode::Top(_) => Some("top"),
        }
    }

    pub fn time_window(self) -> Option<TimeWindow> {
        match self {
            SortMode::Top(window) => Some(window),
            _ => None,
        }
    }

    pub fn is_top(self) -> bool {
        matches!(self, SortMode::Top(_))
    }
}

impl FromStr for SortMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sort = match s {
            "" | "best" => SortMode::Best,
            "hot" => SortMode::Hot,
            "new" => SortMode::New,
            "rising" => SortMode::Rising,
            "top-hour" => SortMode::Top(TimeWindow::Hour),
            "top-day" => SortMode::Top(TimeWindow::Day),
            "top-week" => SortMode::Top(TimeWindow::Week),
            "top-month" => SortMode::Top(TimeWindow::Month),
            "top-year" => SortMode::Top(TimeWindow::Year),
            "top-all" => SortMode::Top(TimeWindow::All),
            other => return Err(ConfigError::InvalidSort(other.to_string())),
        };
        Ok(sort)
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.api_name(), self.time_window()) {
            (Some(name), Some(window)) => write!(f, "{name}-{}", window.as_str()),
            (Some(name), None) => f.write_str(name),
            (None, _) => f.write_str("best"),
        }
    }
}

/// Whether the listing's own preview images replace the posted link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    #[default]
    Off,
    /// Use a preview when one matches, else the posted link.
    Prefer,
    /// Use a preview or drop the entry.
    Only,
}

/// Which `og:` property to look for when a link is an HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeMode {
    #[default]
    Off,
    Image,
    Video,
    Any,
}

impl ScrapeMode {
    pub fn is_enabled(self) -> bool {
        self != ScrapeMode::Off
    }
}

impl FromStr for ScrapeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(ScrapeMode::Off),
            "image" => Ok(ScrapeMode::Image),
            "video" => Ok(ScrapeMode::Video),
            "any" => Ok(ScrapeMode::Any),
            other => Err(ConfigError::InvalidScrapeMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenamePolicy {
    /// Safe on every common filesystem, including Windows.
    #[default]
    Strict,
    /// Only path separators are removed.
    Minimal,
}

/// Per-entry selection rules, evaluated in field order.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub skip_template: Option<Template>,
    pub title_contains: Option<Regex>,
    pub flair_contains: Option<Regex>,
    pub link_contains: Option<Regex>,
    pub title_not_contains: Option<Regex>,
    pub flair_not_contains: Option<Regex>,
    pub link_not_contains: Option<Regex>,
    pub min_score: i64,
}

/// Immutable description of one run, read by every stage of the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Listing path such as `r/pics`; empty for the front page.
    pub path: String,
    /// Cursor to resume from, already carrying the `t3_` prefix.
    pub after: Option<String>,
    pub sort: SortMode,
    pub search: Option<String>,
    pub page_size: u32,
    pub filters: Filters,
    pub preview: PreviewMode,
    /// Preview width to pick; `None` picks the unscaled source.
    pub preview_width: Option<u32>,
    pub scrape: ScrapeMode,
    pub limits: Limits,
    pub dry_run: bool,
    pub filename_policy: FilenamePolicy,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            after: None,
            sort: SortMode::default(),
            search: None,
            page_size: DEFAULT_PAGE_SIZE,
            filters: Filters::default(),
            preview: PreviewMode::default(),
            preview_width: None,
            scrape: ScrapeMode::default(),
            limits: Limits::default(),
            dry_run: false,
            filename_policy: FilenamePolicy::default(),
            output_dir: PathBuf::from("."),
        }
    }
}
