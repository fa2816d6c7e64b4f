use std::ops::ControlFlow;

use rrip_core::{
    ListingDecodeError, ListingEntry, ListingRequest, RunConfig, Stats, TerminationReason,
};
use thiserror::Error;

use crate::{
    ensure_output_dir, Classification, Classifier, Downloader, EntryHandler, FetchError, Fetcher,
    LinkLogs, Paginator, PersistError, ProgressSink, TerminationController,
};

/// Errors that abort a run without a termination reason.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("listing request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("cannot decode listing: {0}")]
    Decode(#[from] ListingDecodeError),
    #[error("invalid listing url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Everything a run reads, shared by reference with every stage.
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub api_base: &'a str,
    pub fetcher: &'a dyn Fetcher,
    pub sink: &'a dyn ProgressSink,
    pub termination: &'a TerminationController,
}

/// Classifies each entry and downloads what qualifies.
struct Pipeline<'a> {
    classifier: Classifier<'a>,
    downloader: Downloader<'a>,
    logs: &'a mut LinkLogs,
}

#[async_trait::async_trait]
impl EntryHandler for Pipeline<'_> {
    async fn handle(
        &mut self,
        entry: ListingEntry,
        stats: &mut Stats,
    ) -> ControlFlow<TerminationReason> {
        self.logs.record_raw(&entry);
        match self.classifier.classify(&entry, self.logs).await {
            Classification::Target(target) => {
                match self.downloader.download(&target, stats).await {
                    ControlFlow::Continue(_) => ControlFlow::Continue(()),
                    ControlFlow::Break(reason) => ControlFlow::Break(reason),
                }
            }
            Classification::Dropped(_) => ControlFlow::Continue(()),
            Classification::Exhausted(_) => ControlFlow::Break(TerminationReason::PagesExhausted),
        }
    }
}

/// Run the pipeline until it ends or the termination token fires.
///
/// On an interrupt the pipeline future is dropped mid-flight, which removes
/// any partial file, and the statistics are reported afterwards. Returns the
/// reason that won; only listing failures are errors.
pub async fn run(
    ctx: &RunContext<'_>,
    logs: &mut LinkLogs,
    stats: &mut Stats,
) -> Result<TerminationReason, RunError> {
    if !ctx.config.dry_run {
        ensure_output_dir(&ctx.config.output_dir)?;
    }
    let request = ListingRequest::new(ctx.api_base, ctx.config)?;
    let mut paginator = Paginator::new(
        request,
        ctx.fetcher,
        ctx.termination,
        ctx.config.after.clone(),
    );
    let mut pipeline = Pipeline {
        classifier: Classifier::new(ctx.config, ctx.fetcher),
        downloader: Downloader::new(ctx.config, ctx.fetcher, ctx.sink, ctx.termination),
        logs,
    };

    let token = ctx.termination.token();
    let finished = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        result = paginator.run(&mut pipeline, stats) => Some(result?),
    };

    if let Some(reason) = finished {
        ctx.termination.terminate(reason);
    }
    let reason = ctx
        .termination
        .reason()
        .unwrap_or(TerminationReason::UserInterrupt);
    ctx.termination.report(stats, ctx.sink);
    Ok(reason)
}
