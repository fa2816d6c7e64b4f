//! Terminal echo of the pipeline: one line per entry, live progress, and the
//! final summary.

use std::io::{self, Write};
use std::sync::Mutex;

use rrip_core::{human_size, Stats, TerminationReason};
use rrip_engine::{EngineEvent, EntryOutcome, FailureStage, ProgressSink};

const DEFAULT_COLUMNS: usize = 80;
/// Room kept right of the name column for the bracketed status.
const STATUS_COLUMNS: usize = 24;
const MIN_NAME_COLUMNS: usize = 16;

struct State<W> {
    out: W,
    /// Widest status printed for the current entry, so shorter ones overwrite it.
    status_width: usize,
}

pub struct TerminalReporter<W: Write + Send> {
    columns: usize,
    state: Mutex<State<W>>,
}

impl TerminalReporter<io::Stderr> {
    /// Reporter on stderr, sized from `COLUMNS`.
    pub fn stderr() -> Self {
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_COLUMNS);
        Self::new(io::stderr(), columns)
    }
}

impl<W: Write + Send> TerminalReporter<W> {
    pub fn new(out: W, columns: usize) -> Self {
        Self {
            columns,
            state: Mutex::new(State {
                out,
                status_width: 0,
            }),
        }
    }

    fn name_width(&self) -> usize {
        self.columns
            .saturating_sub(STATUS_COLUMNS)
            .max(MIN_NAME_COLUMNS)
    }

    fn dashed_line(&self) -> String {
        "-".repeat(self.columns)
    }

    fn render(&self, state: &mut State<W>, event: EngineEvent) -> io::Result<()> {
        let width = self.name_width();
        match event {
            EngineEvent::EntryStarted { filename } => {
                state.status_width = 0;
                write!(state.out, "\r{filename:<width$.width$}")?;
            }
            EngineEvent::Progress {
                filename,
                bytes,
                total,
            } => {
                let status = format!("    [{}/{}]", human_size(Some(bytes)), human_size(total));
                state.status_width = state.status_width.max(status.len());
                let pad = state.status_width;
                write!(state.out, "\r{filename:<width$.width$}{status:<pad$}")?;
            }
            EngineEvent::EntryFinished { filename, outcome } => {
                let status = outcome_status(&outcome);
                let pad = state.status_width;
                writeln!(state.out, "\r{filename:<width$.width$}{status:<pad$}")?;
                if matches!(outcome, EntryOutcome::CrossesStorageLimit { .. }) {
                    writeln!(state.out)?;
                }
            }
            EngineEvent::RunFinished { reason, stats } => {
                if reason == TerminationReason::UserInterrupt {
                    writeln!(state.out, "\nInterrupt received, Exiting...")?;
                }
                self.summary(&mut state.out, &stats)?;
            }
        }
        state.out.flush()
    }

    fn summary(&self, out: &mut W, stats: &Stats) -> io::Result<()> {
        let line = self.dashed_line();
        writeln!(out, "{line}")?;
        writeln!(out, "{stats}")?;
        writeln!(out, "{line}")
    }
}

fn outcome_status(outcome: &EntryOutcome) -> String {
    match outcome {
        EntryOutcome::Saved { bytes } => format!("    [Complete: {}]", human_size(Some(*bytes))),
        EntryOutcome::DryRun => "    [Dry Run]".to_string(),
        EntryOutcome::AlreadySaved => "    [Already Saved]".to_string(),
        EntryOutcome::Failed {
            stage: FailureStage::Create,
            error,
        } => format!("    [Can't create file: {error}]"),
        EntryOutcome::Failed { stage, error } => format!("    [{stage} Error: {error}]"),
        EntryOutcome::UnexpectedContentType { content_type } => {
            format!("    [Unexpected Content-Type: {content_type}]")
        }
        EntryOutcome::TooLarge { length } => format!("    [Too Large: {}]", human_size(*length)),
        EntryOutcome::CrossesStorageLimit { length } => {
            format!("    [{} | Crosses storage limit]", human_size(Some(*length)))
        }
    }
}

impl<W: Write + Send> ProgressSink for TerminalReporter<W> {
    fn emit(&self, event: EngineEvent) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        // The terminal going away must not end the run.
        let _ = self.render(&mut state, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrip_engine::{FailureKind, FetchError};

    fn rendered(columns: usize, events: Vec<EngineEvent>) -> String {
        let reporter = TerminalReporter::new(Vec::new(), columns);
        for event in events {
            reporter.emit(event);
        }
        let state = reporter.state.into_inner().unwrap();
        String::from_utf8(state.out).unwrap()
    }

    fn finished(outcome: EntryOutcome) -> EngineEvent {
        EngineEvent::EntryFinished {
            filename: "cat [abc].jpg".into(),
            outcome,
        }
    }

    #[test]
    fn name_column_is_padded_and_truncated() {
        let out = rendered(
            40,
            vec![EngineEvent::EntryStarted {
                filename: "a very long title that does not fit [abc].jpg".into(),
            }],
        );
        assert_eq!(out, "\ra very long titl");
    }

    #[test]
    fn outcome_is_echoed_after_the_name() {
        let out = rendered(44, vec![finished(EntryOutcome::Saved { bytes: 1_500_000 })]);
        assert_eq!(out, "\rcat [abc].jpg           [Complete: 1.5MB]\n");
    }

    #[test]
    fn failures_name_their_stage() {
        let error = FetchError {
            kind: FailureKind::HttpStatus(404),
            message: "Not Found".into(),
        };
        let out = rendered(
            80,
            vec![finished(EntryOutcome::Failed {
                stage: FailureStage::Request,
                error,
            })],
        );
        assert!(out.ends_with("[Request Error: status 404: Not Found]\n"));
    }

    #[test]
    fn shorter_status_overwrites_progress() {
        let out = rendered(
            40,
            vec![
                EngineEvent::Progress {
                    filename: "cat [abc].jpg".into(),
                    bytes: 20_000,
                    total: None,
                },
                finished(EntryOutcome::Saved { bytes: 20_000 }),
            ],
        );
        let progress = "    [20.0KB/Unknown length]";
        assert!(out.contains(progress));
        let last = out.rsplit('\r').next().unwrap();
        assert_eq!(last, format!("cat [abc].jpg   {:<27}\n", "    [Complete: 20.0KB]"));
        assert_eq!(progress.len(), 27);
    }

    #[test]
    fn summary_follows_interrupt_notice() {
        let mut stats = Stats::new();
        stats.record_processed();
        stats.record_repeated();
        let out = rendered(
            10,
            vec![EngineEvent::RunFinished {
                reason: TerminationReason::UserInterrupt,
                stats,
            }],
        );
        assert!(out.starts_with("\nInterrupt received, Exiting...\n----------\n"));
        assert!(out.contains("Already Downloaded: 1"));
        assert!(out.ends_with("----------\n"));
    }
}
