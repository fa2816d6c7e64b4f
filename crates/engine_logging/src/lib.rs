#![deny(missing_docs)]
//! Logging macros shared by the rrip crates.
//!
//! Library code logs through the `engine_*` macros, which forward to the
//! `log` facade; the binary decides where records go. Tests call
//! [`initialize_for_tests`] to see pipeline traces on failure.

/// Logs a trace-level message.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message: requests, responses and classification drops.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a stderr logger for tests.
///
/// No-ops if another logger has already been installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = ConfigBuilder::new().add_filter_allow_str("rrip").build();

    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Never);
}
