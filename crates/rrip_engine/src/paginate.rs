use std::ops::ControlFlow;

use engine_logging::engine_debug;
use rrip_core::{decode_listing, ListingEntry, ListingRequest, Stats, TerminationReason};

use crate::{Fetcher, RunError, TerminationController};

/// Receives listing entries in order, after they were counted as processed.
#[async_trait::async_trait]
pub trait EntryHandler: Send {
    async fn handle(
        &mut self,
        entry: ListingEntry,
        stats: &mut Stats,
    ) -> ControlFlow<TerminationReason>;
}

/// Walks listing pages, following the `after` cursor until a page adds no
/// entries or a handler ends the run.
pub struct Paginator<'a> {
    request: ListingRequest,
    fetcher: &'a dyn Fetcher,
    termination: &'a TerminationController,
    after: Option<String>,
}

impl<'a> Paginator<'a> {
    pub fn new(
        request: ListingRequest,
        fetcher: &'a dyn Fetcher,
        termination: &'a TerminationController,
        after: Option<String>,
    ) -> Self {
        Self {
            request,
            fetcher,
            termination,
            after,
        }
    }

    /// Cursor for the next page: the name of the last entry seen.
    pub fn cursor(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub async fn run(
        &mut self,
        handler: &mut dyn EntryHandler,
        stats: &mut Stats,
    ) -> Result<TerminationReason, RunError> {
        loop {
            let url = self.request.page_url(self.cursor());
            engine_debug!("REQUEST: {url}");
            let body = self.fetcher.get_listing(url.as_str()).await?;
            let entries = decode_listing(&body)?;
            engine_debug!("{} entries on page", entries.len());

            let before = stats.processed();
            for entry in entries {
                if let Some(reason) = self.termination.reason() {
                    return Ok(reason);
                }
                stats.record_processed();
                self.after = Some(entry.name.clone());
                if let ControlFlow::Break(reason) = handler.handle(entry, stats).await {
                    return Ok(reason);
                }
            }
            if stats.processed() == before {
                return Ok(TerminationReason::PagesExhausted);
            }
        }
    }
}
