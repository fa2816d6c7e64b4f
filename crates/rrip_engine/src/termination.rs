use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use engine_logging::engine_debug;
use rrip_core::{Stats, TerminationReason};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, ProgressSink};

/// Single authority over how a run ends.
///
/// The first [`terminate`](Self::terminate) call decides the reason and
/// cancels the run's token; every later call is a no-op. Clones share state,
/// so an interrupt listener and the pipeline can race on the same controller.
#[derive(Debug, Clone, Default)]
pub struct TerminationController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    reason: OnceLock<TerminationReason>,
    token: CancellationToken,
    reported: AtomicBool,
}

impl TerminationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this call decided the reason.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        let won = self.inner.reason.set(reason).is_ok();
        if won {
            engine_debug!("run terminating: {reason}");
            self.inner.token.cancel();
        }
        won
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.inner.reason.get().copied()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Wait until some party terminates the run.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Emit the final statistics; only the first call reports.
    pub fn report(&self, stats: &Stats, sink: &dyn ProgressSink) -> bool {
        let Some(reason) = self.reason() else {
            return false;
        };
        if self.inner.reported.swap(true, Ordering::SeqCst) {
            return false;
        }
        sink.emit(EngineEvent::RunFinished {
            reason,
            stats: *stats,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectSink(Mutex<Vec<EngineEvent>>);

    impl ProgressSink for CollectSink {
        fn emit(&self, event: EngineEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn first_reason_wins() {
        let controller = TerminationController::new();
        let other = controller.clone();
        assert!(!controller.is_terminated());

        assert!(other.terminate(TerminationReason::FileCapReached));
        assert!(!controller.terminate(TerminationReason::UserInterrupt));
        assert_eq!(controller.reason(), Some(TerminationReason::FileCapReached));
        assert!(controller.token().is_cancelled());
    }

    #[test]
    fn reports_once_and_only_after_termination() {
        let controller = TerminationController::new();
        let sink = CollectSink::default();
        let stats = Stats::new();

        assert!(!controller.report(&stats, &sink));
        controller.terminate(TerminationReason::UserInterrupt);
        assert!(controller.report(&stats, &sink));
        assert!(!controller.report(&stats, &sink));

        let events = sink.0.lock().unwrap();
        assert_eq!(
            *events,
            vec![EngineEvent::RunFinished {
                reason: TerminationReason::UserInterrupt,
                stats,
            }]
        );
    }

    #[tokio::test]
    async fn cancelled_resolves_after_terminate() {
        let controller = TerminationController::new();
        let waiter = controller.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        controller.terminate(TerminationReason::PagesExhausted);
        handle.await.unwrap();
    }
}
