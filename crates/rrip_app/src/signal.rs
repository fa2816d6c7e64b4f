use engine_logging::{engine_info, engine_warn};
use rrip_core::TerminationReason;
use rrip_engine::TerminationController;
use tokio::task::JoinHandle;

/// Turn the first Ctrl+C into a `UserInterrupt` termination.
///
/// The listener exits on its own once the run terminates for another reason.
pub fn spawn_interrupt_listener(termination: TerminationController) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    if termination.terminate(TerminationReason::UserInterrupt) {
                        engine_info!("Received Ctrl+C signal");
                    }
                }
                Err(err) => engine_warn!("Could not listen for Ctrl+C: {err}"),
            },
            _ = termination.cancelled() => {}
        }
    })
}
