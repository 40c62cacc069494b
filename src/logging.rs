//! Logging setup for the command-line tool
//!
//! The library itself only emits records through the `log` facade; binaries
//! decide where they go.

use env_logger::{Builder, Env, Target, WriteStyle};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};

/// Map a `-v` count to a level filter. Zero keeps warnings and errors only.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Build the logger configuration.
///
/// `RUST_LOG` takes precedence over `verbose`. With `log_file` set, records
/// are appended to that file instead of written to stderr.
pub fn builder(verbose: u8, log_file: Option<&Path>) -> Result<Builder> {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for_verbosity(verbose))
        .parse_env(Env::default())
        .format_timestamp_secs()
        .format_module_path(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    RijnboxError::with_kind_and_source(
                        ErrorCategory::User,
                        ErrorKind::Io,
                        format!("failed to open log file {}", path.display()),
                        e,
                    )
                })?;
            builder
                .write_style(WriteStyle::Never)
                .target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.write_style(WriteStyle::Auto).target(Target::Stderr);
        }
    }

    Ok(builder)
}

/// Install the global logger. Calling this twice is an error.
pub fn init(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    builder(verbose, log_file)?.try_init().map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to initialize logging",
            e,
        )
    })
}
