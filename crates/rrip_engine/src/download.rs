use std::ops::ControlFlow;

use engine_logging::{engine_debug, engine_warn};
use futures_util::StreamExt;
use rrip_core::{ResolvedTarget, RunConfig, SizeDecision, Stats, TerminationReason};

use crate::{
    EngineEvent, EntryOutcome, FailureKind, FailureStage, FetchError, Fetcher, PartialFile,
    ProgressSink, ProgressThrottle, TerminationController,
};

/// Fetches resolved targets into the output directory, one at a time.
pub struct Downloader<'a> {
    config: &'a RunConfig,
    fetcher: &'a dyn Fetcher,
    sink: &'a dyn ProgressSink,
    termination: &'a TerminationController,
}

impl<'a> Downloader<'a> {
    pub fn new(
        config: &'a RunConfig,
        fetcher: &'a dyn Fetcher,
        sink: &'a dyn ProgressSink,
        termination: &'a TerminationController,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            termination,
        }
    }

    /// Download one target and record its outcome in `stats`.
    ///
    /// Breaks with the reason the run must end: the file cap was reached, the
    /// storage budget would overflow, or the run was terminated elsewhere.
    pub async fn download(
        &self,
        target: &ResolvedTarget,
        stats: &mut Stats,
    ) -> ControlFlow<TerminationReason, EntryOutcome> {
        let filename = target.filename.as_str();
        self.sink.emit(EngineEvent::EntryStarted {
            filename: filename.to_string(),
        });

        if self.config.dry_run {
            stats.record_saved();
            self.finish(filename, EntryOutcome::DryRun);
            return self.check_file_cap(stats, EntryOutcome::DryRun);
        }

        let destination = self.config.output_dir.join(filename);
        if destination.exists() {
            stats.record_repeated();
            return self.settle(filename, EntryOutcome::AlreadySaved);
        }

        let probe = match self.fetcher.probe(&target.url).await {
            Ok(probe) => probe,
            Err(error) => {
                stats.record_failed();
                return self.settle(filename, failed(FailureStage::Request, error));
            }
        };
        if !probe.is_media() {
            engine_debug!("{} answered {} for {filename}", target.url, probe.status);
            let content_type = probe.content_type.unwrap_or_default();
            return self.settle(filename, EntryOutcome::UnexpectedContentType { content_type });
        }

        let length = probe.content_length;
        match self.config.limits.evaluate(length, stats.copied_bytes()) {
            SizeDecision::Accept => {}
            SizeDecision::Skip => return self.settle(filename, EntryOutcome::TooLarge { length }),
            SizeDecision::StopRun => {
                self.finish(
                    filename,
                    EntryOutcome::CrossesStorageLimit {
                        length: length.unwrap_or_default(),
                    },
                );
                return ControlFlow::Break(TerminationReason::StorageCapWouldExceed);
            }
        }

        // Last safe point before touching the filesystem.
        if let Some(reason) = self.termination.reason() {
            return ControlFlow::Break(reason);
        }

        let mut partial = match PartialFile::create(&destination) {
            Ok(partial) => partial,
            Err(err) => {
                stats.record_failed();
                let error = FetchError::new(FailureKind::Io, err.to_string());
                return self.settle(filename, failed(FailureStage::Create, error));
            }
        };

        let (copied, result) = self.transfer(target, &mut partial, length).await;
        stats.add_copied_bytes(copied);
        if let Err((stage, error)) = result {
            partial.discard();
            stats.record_failed();
            return self.settle(filename, failed(stage, error));
        }

        if let Err(err) = partial.commit().await {
            stats.record_failed();
            let error = FetchError::new(FailureKind::Io, err.to_string());
            return self.settle(filename, failed(FailureStage::Create, error));
        }

        stats.record_saved();
        let outcome = EntryOutcome::Saved { bytes: copied };
        self.finish(filename, outcome.clone());
        self.check_file_cap(stats, outcome)
    }

    /// Copy the body into `partial`; returns the bytes written either way.
    async fn transfer(
        &self,
        target: &ResolvedTarget,
        partial: &mut PartialFile,
        total: Option<u64>,
    ) -> (u64, Result<(), (FailureStage, FetchError)>) {
        let mut stream = match self.fetcher.open_stream(&target.url).await {
            Ok(stream) => stream,
            Err(error) => return (0, Err((FailureStage::Request, error))),
        };

        let mut copied = 0u64;
        let mut throttle = ProgressThrottle::default();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => return (copied, Err((FailureStage::Transfer, error))),
            };
            if let Err(err) = partial.write_all(&chunk).await {
                return (copied, Err((FailureStage::Transfer, FetchError::io(err))));
            }
            copied += chunk.len() as u64;
            if throttle.update(copied) {
                self.sink.emit(EngineEvent::Progress {
                    filename: target.filename.clone(),
                    bytes: copied,
                    total,
                });
            }
        }
        (copied, Ok(()))
    }

    fn check_file_cap(
        &self,
        stats: &Stats,
        outcome: EntryOutcome,
    ) -> ControlFlow<TerminationReason, EntryOutcome> {
        if self.config.limits.file_cap_reached(stats.saved()) {
            engine_debug!("file limit of {} reached", stats.saved());
            return ControlFlow::Break(TerminationReason::FileCapReached);
        }
        ControlFlow::Continue(outcome)
    }

    fn settle(
        &self,
        filename: &str,
        outcome: EntryOutcome,
    ) -> ControlFlow<TerminationReason, EntryOutcome> {
        self.finish(filename, outcome.clone());
        ControlFlow::Continue(outcome)
    }

    fn finish(&self, filename: &str, outcome: EntryOutcome) {
        if let EntryOutcome::Failed { stage, error } = &outcome {
            engine_warn!("{stage} error for {filename}: {error}");
        }
        self.sink.emit(EngineEvent::EntryFinished {
            filename: filename.to_string(),
            outcome,
        });
    }
}

fn failed(stage: FailureStage, error: FetchError) -> EntryOutcome {
    EntryOutcome::Failed { stage, error }
}
