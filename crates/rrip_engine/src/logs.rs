use std::io::Write;

use engine_logging::engine_warn;
use rrip_core::{ListingEntry, Template};

type Output = Box<dyn Write + Send>;

/// Append-only auxiliary outputs of a run: posted links, resolved media
/// links and raw post records.
#[derive(Default)]
pub struct LinkLogs {
    post_links: Option<Output>,
    media_links: Option<(Output, Template)>,
    raw_posts: Option<Output>,
}

impl LinkLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posted URL of every entry that passed the filters.
    pub fn with_post_links(mut self, out: Output) -> Self {
        self.post_links = Some(out);
        self
    }

    /// One `format` line per resolved entry.
    pub fn with_media_links(mut self, out: Output, format: Template) -> Self {
        self.media_links = Some((out, format));
        self
    }

    /// Pretty-printed JSON of every listed record.
    pub fn with_raw_posts(mut self, out: Output) -> Self {
        self.raw_posts = Some(out);
        self
    }

    pub fn record_post(&mut self, entry: &ListingEntry) {
        if let Some(out) = self.post_links.as_mut() {
            write_line(out, &entry.url);
        }
    }

    pub fn record_media(&mut self, entry: &ListingEntry, final_url: &str) {
        if let Some((out, format)) = self.media_links.as_mut() {
            let line = format.render(|field| entry.template_field(field, Some(final_url)));
            write_line(out, &line);
        }
    }

    pub fn record_raw(&mut self, entry: &ListingEntry) {
        if let Some(out) = self.raw_posts.as_mut() {
            match serde_json::to_string_pretty(&entry.raw) {
                Ok(json) => write_line(out, &json),
                Err(err) => engine_warn!("cannot serialize post {}: {err}", entry.name),
            }
        }
    }
}

fn write_line(out: &mut Output, line: &str) {
    if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        engine_warn!("cannot write link log: {err}");
    }
}
