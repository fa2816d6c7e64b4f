//! Command line of the `rrip` binary and its translation into a run.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use regex::Regex;
use rrip_core::{
    fullname, FilenamePolicy, Filters, Limits, PreviewMode, RunConfig, ScrapeMode, SortMode,
    Template, TemplateError, DEFAULT_PAGE_SIZE,
};
use rrip_engine::{FetchSettings, LinkLogs, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use thiserror::Error;

const DEFAULT_DATA_FORMAT: &str = "{{final_url}}";

#[derive(Debug, Parser)]
#[command(name = "rrip", version, about = "Download media posted to a Reddit listing")]
pub struct Cli {
    /// Listing to walk, e.g. `r/pics` or `user/someone/submitted`.
    pub path: String,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print links and names; nothing is fetched or written.
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Allow every character in filenames except `/` and `\`.
    #[arg(long)]
    pub allow_special_chars: bool,

    /// Print each post as JSON to stdout. Implies a quiet dry run.
    #[arg(long)]
    pub print_post_data: bool,

    /// Start after the post with this id.
    #[arg(long)]
    pub after: Option<String>,

    #[arg(long = "useragent", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,

    /// Connect timeout in seconds; none by default.
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Data usage limit in MB.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_storage: Option<u64>,

    /// Largest media file to download, in KB.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_size: Option<u64>,

    /// Number of files to download.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_files: Option<u64>,

    /// Target folder; derived from the listing path by default.
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Log media links to this file (`-` for stdout).
    #[arg(long)]
    pub data_output_file: Option<String>,

    /// Line template for the media link log.
    #[arg(long)]
    pub data_output_format: Option<String>,

    /// Log the posted link of every post that passed the filters.
    #[arg(long)]
    pub log_post_links: Option<String>,

    /// Skip posts for which this template renders "", "nil", "false" or "0".
    #[arg(long)]
    pub template_filter: Option<String>,

    /// Look for an og: media link when a link is an HTML page: image, video or any.
    #[arg(long)]
    pub og_type: Option<ScrapeMode>,

    /// best|hot|new|rising|top-<hour|day|week|month|year|all>
    #[arg(long, default_value = "best")]
    pub sort: SortMode,

    #[arg(long, default_value_t = 0)]
    pub min_score: i64,

    /// Posts requested per listing page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub entries_limit: u32,

    #[arg(long)]
    pub title_contains: Option<Regex>,
    #[arg(long)]
    pub flair_contains: Option<Regex>,
    #[arg(long)]
    pub link_contains: Option<Regex>,
    #[arg(long)]
    pub title_not_contains: Option<Regex>,
    #[arg(long)]
    pub flair_not_contains: Option<Regex>,
    #[arg(long)]
    pub link_not_contains: Option<Regex>,

    /// Search the listing for this term.
    #[arg(long)]
    pub search: Option<String>,

    /// Prefer the preview image when one exists.
    #[arg(long)]
    pub prefer_preview: bool,

    /// Download the preview image instead of the posted link.
    #[arg(long)]
    pub download_preview: bool,

    /// Width of the preview to pick, e.g. 640, 960, 1080.
    #[arg(long)]
    pub preview_res: Option<u32>,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Can't combine image-size based options with dry run")]
    SizeLimitsInDryRun,
    #[error("--download-preview or --prefer-preview should be used with --preview-res")]
    PreviewResWithoutMode,
    #[error("Use only one of --prefer-preview and --download-preview")]
    ConflictingPreviewModes,
    #[error("Can't log both post and media links to the same file")]
    SameLinkLog,
    #[error("invalid --{option} template: {source}")]
    Template {
        option: &'static str,
        source: TemplateError,
    },
    #[error("cannot create {path}: {source}")]
    Open { path: String, source: io::Error },
}

/// Everything the binary needs to start a run.
#[derive(Debug)]
pub struct Settings {
    pub run: RunConfig,
    pub fetch: FetchSettings,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    print_post_data: bool,
    post_links: Option<String>,
    media_links: Option<(String, Template)>,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings, CliError> {
        let dry_run = self.dry_run || self.print_post_data;
        if dry_run && (self.max_size.is_some() || self.max_storage.is_some()) {
            return Err(CliError::SizeLimitsInDryRun);
        }
        if self.prefer_preview && self.download_preview {
            return Err(CliError::ConflictingPreviewModes);
        }
        if self.preview_res.is_some() && !(self.prefer_preview || self.download_preview) {
            return Err(CliError::PreviewResWithoutMode);
        }
        if self.log_post_links.is_some() && self.log_post_links == self.data_output_file {
            return Err(CliError::SameLinkLog);
        }

        let skip_template = self
            .template_filter
            .as_deref()
            .map(|source| parse_template("template-filter", source))
            .transpose()?;
        let media_links = match self.data_output_file {
            Some(path) => {
                let format = self.data_output_format.as_deref().unwrap_or(DEFAULT_DATA_FORMAT);
                Some((path, parse_template("data-output-format", format)?))
            }
            None => None,
        };

        let path = self.path.trim_end_matches('/').to_string();
        let output_dir = self.folder.unwrap_or_else(|| default_folder(&path));
        let preview = match (self.download_preview, self.prefer_preview) {
            (true, _) => PreviewMode::Only,
            (_, true) => PreviewMode::Prefer,
            _ => PreviewMode::Off,
        };

        let run = RunConfig {
            path,
            after: self.after.as_deref().map(fullname),
            sort: self.sort,
            search: self.search,
            page_size: self.entries_limit,
            filters: Filters {
                skip_template,
                title_contains: self.title_contains,
                flair_contains: self.flair_contains,
                link_contains: self.link_contains,
                title_not_contains: self.title_not_contains,
                flair_not_contains: self.flair_not_contains,
                link_not_contains: self.link_not_contains,
                min_score: self.min_score,
            },
            preview,
            preview_width: self.preview_res,
            scrape: self.og_type.unwrap_or_default(),
            limits: Limits {
                max_files: self.max_files,
                max_storage: self.max_storage.map(|mb| mb.saturating_mul(1000 * 1000)),
                max_file_size: self.max_size.map(|kb| kb.saturating_mul(1000)),
            },
            dry_run,
            filename_policy: if self.allow_special_chars {
                FilenamePolicy::Minimal
            } else {
                FilenamePolicy::Strict
            },
            output_dir,
        };
        let fetch = FetchSettings {
            api_base: self.api_base,
            user_agent: self.user_agent,
            connect_timeout: self.connect_timeout.map(Duration::from_secs),
            ..FetchSettings::default()
        };

        Ok(Settings {
            run,
            fetch,
            verbose: self.verbose || (dry_run && !self.print_post_data),
            log_file: self.log_file,
            print_post_data: self.print_post_data,
            post_links: self.log_post_links,
            media_links,
        })
    }
}

impl Settings {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    /// Open the auxiliary outputs the command line asked for.
    pub fn link_logs(&self) -> Result<LinkLogs, CliError> {
        let mut logs = LinkLogs::new();
        if let Some(path) = &self.post_links {
            logs = logs.with_post_links(open_output(path)?);
        }
        if let Some((path, format)) = &self.media_links {
            logs = logs.with_media_links(open_output(path)?, format.clone());
        }
        if self.print_post_data {
            logs = logs.with_raw_posts(Box::new(io::stdout()));
        }
        Ok(logs)
    }
}

fn parse_template(option: &'static str, source: &str) -> Result<Template, CliError> {
    source
        .parse()
        .map_err(|source| CliError::Template { option, source })
}

/// `r/pics` saves into `pics`, `user/x/submitted` into `user.x.submitted`.
fn default_folder(path: &str) -> PathBuf {
    let dotted = path.replace('/', ".");
    let folder = dotted.strip_prefix("r.").unwrap_or(&dotted);
    if folder.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(folder)
    }
}

fn open_output(path: &str) -> Result<Box<dyn io::Write + Send>, CliError> {
    if path == "-" || path == "stdout" {
        return Ok(Box::new(io::stdout()));
    }
    File::create(path)
        .map(|file| Box::new(file) as Box<dyn io::Write + Send>)
        .map_err(|source| CliError::Open {
            path: path.to_string(),
            source,
        })
}
