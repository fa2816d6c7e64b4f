use engine_logging::engine_debug;
use rrip_core::{
    evaluate_filters, resolve_static, select_preview, DropReason, ListingEntry, MediaLink,
    PreviewChoice, ResolvedTarget, RunConfig, Verdict,
};
use url::Url;

use crate::{decode_page, derive_filename, find_og_media, unescape_html, Fetcher, LinkLogs};

/// Pages followed per entry while looking for embedded media.
pub const MAX_SCRAPE_HOPS: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Target(ResolvedTarget),
    Dropped(DropReason),
    /// Dropped, and no later entry of the listing can qualify.
    Exhausted(DropReason),
}

/// Decides whether a listing entry is media worth downloading, and from where.
pub struct Classifier<'a> {
    config: &'a RunConfig,
    fetcher: &'a dyn Fetcher,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a RunConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub async fn classify(&self, entry: &ListingEntry, logs: &mut LinkLogs) -> Classification {
        match evaluate_filters(entry, &self.config.filters, self.config.sort) {
            Verdict::Keep => {}
            Verdict::Drop(reason) => return self.dropped(entry, reason),
            Verdict::Stop(reason) => {
                engine_debug!("Skipped {:?}: {reason}, later entries rank lower", entry.title);
                return Classification::Exhausted(reason);
            }
        }
        logs.record_post(entry);

        let link = match select_preview(entry, self.config.preview, self.config.preview_width) {
            PreviewChoice::Original => entry.url.clone(),
            PreviewChoice::Preview(variant) => {
                engine_debug!(
                    "Original URL: {} -> preview {}x{}",
                    entry.url,
                    variant.width,
                    variant.height
                );
                unescape_html(&variant.url)
            }
            PreviewChoice::Missing => return self.dropped(entry, DropReason::NoPreview),
        };

        let Some(media) = self.resolve(&link, MAX_SCRAPE_HOPS).await else {
            return self.dropped(entry, DropReason::NotMedia);
        };
        engine_debug!("URL: {link} | Score: {}", entry.score);
        if media.url != link {
            engine_debug!("-> {}", media.url);
        }
        logs.record_media(entry, &media.url);

        let filename = derive_filename(
            &entry.title,
            entry.short_id(),
            media.extension,
            self.config.filename_policy,
        );
        Classification::Target(ResolvedTarget {
            url: media.url,
            extension: media.extension,
            filename,
        })
    }

    /// Resolve `link` to a direct media link, following at most `max_hops`
    /// pages through their `og:` metadata.
    pub async fn resolve(&self, link: &str, max_hops: u8) -> Option<MediaLink> {
        let mut link = link.to_string();
        let mut hops_left = max_hops;
        loop {
            if let Some(media) = resolve_static(&link) {
                return Some(media);
            }
            if !self.config.scrape.is_enabled() || hops_left == 0 {
                return None;
            }
            hops_left -= 1;
            link = self.scrape(&link).await?;
        }
    }

    async fn scrape(&self, link: &str) -> Option<String> {
        engine_debug!("REQUEST PAGE: {link}");
        let page = match self.fetcher.fetch_page(link).await {
            Ok(page) => page,
            Err(err) => {
                engine_debug!("no og: link from {link}: {err}");
                return None;
            }
        };
        let html = match decode_page(&page) {
            Ok(html) => html,
            Err(err) => {
                engine_debug!("cannot decode {link}: {err}");
                return None;
            }
        };
        let found = find_og_media(&html, self.config.scrape)?;
        // og: values may be relative to the page.
        Some(
            Url::parse(&page.metadata.final_url)
                .and_then(|base| base.join(&found))
                .map(String::from)
                .unwrap_or(found),
        )
    }

    fn dropped(&self, entry: &ListingEntry, reason: DropReason) -> Classification {
        engine_debug!("Skipped {:?} | {}: {reason}", entry.title, entry.url);
        Classification::Dropped(reason)
    }
}
