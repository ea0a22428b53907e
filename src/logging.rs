//! Tracing initialization.
//!
//! Diagnostics (per-file failures, moves, skipped directories) are emitted as
//! `tracing` events and written to stderr. The level is driven only by
//! [`LogLevel`]; `RUST_LOG` is not consulted.

use chrono::Local;
use std::fmt as stdfmt;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt as tsfmt, layer::SubscriberExt, registry};

/// Verbosity of the diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only, which still includes files that could not be organized.
    Quiet,
    /// Errors and warnings.
    #[default]
    Normal,
    /// Every move and every removed directory.
    Verbose,
    /// Skips, cleanup misses and name collisions.
    Debug,
    Trace,
}

impl LogLevel {
    /// Maps `-v` occurrences and `--quiet` to a level.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

/// Installs the global subscriber writing to stderr.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(level: LogLevel) -> Result<(), TryInitError> {
    let filter = EnvFilter::new(level.directive());

    let stderr_layer = tsfmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalHumanTime)
        .with_target(false)
        .compact();

    registry().with(filter).with(stderr_layer).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbose() {
        assert_eq!(LogLevel::from_flags(3, true), LogLevel::Quiet);
    }

    #[test]
    fn test_verbose_counts() {
        assert_eq!(LogLevel::from_flags(0, false), LogLevel::Normal);
        assert_eq!(LogLevel::from_flags(1, false), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(2, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_flags(7, false), LogLevel::Trace);
    }

    #[test]
    fn test_default_level_shows_warnings() {
        assert_eq!(LogLevel::default().directive(), "warn");
        assert_eq!(LogLevel::Quiet.directive(), "error");
    }
}
