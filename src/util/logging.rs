// ASLSleuth - util/logging.rs
//
// Structured diagnostics with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets the filter to debug)
//   - Config file: [logging] level = "debug"
//
// Output: stderr only. stdout is reserved for rendered log messages so that
// `aslsleuth capture.log | grep ...` stays clean.

use std::io;
use tracing_subscriber::EnvFilter;

/// Initialise the diagnostics subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml (if present).
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "warn".
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    // try_init: integration tests may initialise more than once per process.
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init();

    if result.is_ok() {
        tracing::debug!(
            app = super::constants::APP_NAME,
            version = super::constants::APP_VERSION,
            "Logging initialised"
        );
    }
}

/// Shorten `raw` for inclusion in diagnostics.
///
/// Cuts on a char boundary at `DEBUG_MAX_LINE_PREVIEW` chars.
pub fn preview(raw: &str) -> &str {
    match raw
        .char_indices()
        .nth(super::constants::DEBUG_MAX_LINE_PREVIEW)
    {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
