//! Logger initialization for the `rrip` binary.
//!
//! The terminal logger writes to stderr so stdout stays clean for
//! `--print-post-data` and link logs sent to `-`.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Initialize the terminal logger at `level`, plus a debug-level file logger
/// appending to `log_file` when one is given.
pub fn initialize(level: LevelFilter, log_file: Option<&Path>) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        terminal_config(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(file) = log_file.and_then(open_log_file) {
        loggers.push(WriteLogger::new(LevelFilter::Debug, file_config(), file));
    }

    let _ = CombinedLogger::init(loggers);
}

fn base_config() -> ConfigBuilder {
    let mut builder = ConfigBuilder::new();
    builder
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("rrip");
    builder
}

/// Terminal lines share the screen with progress output; no timestamps.
fn terminal_config() -> Config {
    base_config().set_time_level(LevelFilter::Off).build()
}

fn file_config() -> Config {
    base_config().set_time_format_rfc3339().build()
}

fn open_log_file(path: &Path) -> Option<File> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {}: {err}", path.display());
            None
        }
    }
}
