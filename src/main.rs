// ASLSleuth - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Input reading (file, stdin, or follow mode)
// 4. Rendering to stdout or exporting to a file

use aslsleuth::app::export::{default_export_file_name, export_to_file, ExportFormat};
use aslsleuth::app::follow::follow;
use aslsleuth::app::pipeline::{decode, InputFormat, Pipeline};
use aslsleuth::core::codes::Level;
use aslsleuth::core::filter::FilterCriteria;
use aslsleuth::core::formatter::{FormatOptions, Formatter, Style};
use aslsleuth::platform::config::{self, AppConfig, PlatformPaths};
use aslsleuth::platform::fs;
use aslsleuth::util::{self, error::AslSleuthError, error::InputError};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// ASLSleuth - Apple System Log normaliser and formatter.
///
/// Reads BSD syslog lines, os_log lines, binary ASL records or syslog_relay
/// envelopes and renders them in a chosen style, optionally filtered.
#[derive(Parser, Debug)]
#[command(name = "aslsleuth", version, about)]
struct Cli {
    /// Capture file to read ("-" or omitted = standard input).
    input: Option<PathBuf>,

    /// Input dialect: auto, text, oslog, binary, relay.
    #[arg(short = 'i', long = "input", default_value = "auto")]
    input_format: InputFormat,

    /// Output style: standard, compact, verbose, idevicesyslog.
    #[arg(short = 's', long)]
    style: Option<Style>,

    /// Show the timestamp (overrides the style).
    #[arg(long, value_name = "BOOL")]
    show_timestamp: Option<bool>,

    /// Show the host (overrides the style).
    #[arg(long, value_name = "BOOL")]
    show_host: Option<bool>,

    /// Show the bracketed pid (overrides the style).
    #[arg(long, value_name = "BOOL")]
    show_pid: Option<bool>,

    /// Show the level indicator (overrides the style).
    #[arg(long, value_name = "BOOL")]
    show_level: Option<bool>,

    /// Colour the level indicator with ANSI escapes.
    #[arg(short = 'c', long = "color")]
    color: bool,

    /// Maximum message length in characters, ellipsis included (0 = unlimited).
    #[arg(short = 'm', long = "max-length", allow_negative_numbers = true)]
    max_length: Option<i64>,

    /// strftime pattern for timestamps.
    #[arg(short = 't', long = "time-format")]
    time_format: Option<String>,

    /// Least severe level to show (e.g. warning, err, 4).
    #[arg(short = 'l', long = "min-level")]
    min_level: Option<Level>,

    /// Only messages whose sender contains this text (case-insensitive).
    #[arg(long)]
    sender: Option<String>,

    /// Only messages whose body contains this text (case-insensitive).
    #[arg(short = 'g', long)]
    grep: Option<String>,

    /// Only Warning and more severe messages.
    #[arg(long)]
    important: bool,

    /// Stream the input, rendering records as they arrive.
    #[arg(short = 'f', long, conflicts_with = "export")]
    follow: bool,

    /// Export instead of printing: text, csv, json.
    #[arg(short = 'e', long)]
    export: Option<ExportFormat>,

    /// Export destination (default: syslog_YYYYMMDD_HHMMSS.<ext>).
    #[arg(short = 'o', long, requires = "export")]
    output: Option<PathBuf>,

    /// Configuration file (default: platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    /// Config-file formatter defaults with CLI overrides applied.
    fn format_options(&self, base: &FormatOptions) -> FormatOptions {
        FormatOptions {
            style: self.style.unwrap_or(base.style),
            show_timestamp: self.show_timestamp.or(base.show_timestamp),
            show_host: self.show_host.or(base.show_host),
            show_pid: self.show_pid.or(base.show_pid),
            show_level: self.show_level.or(base.show_level),
            colorize: if self.color { Some(true) } else { base.colorize },
            max_message_length: self.max_length.or(base.max_message_length),
            timestamp_format: self
                .time_format
                .clone()
                .or_else(|| base.timestamp_format.clone()),
        }
    }

    /// Config-file filter defaults with CLI overrides applied.
    fn filter_criteria(&self, base: &FilterCriteria) -> FilterCriteria {
        FilterCriteria {
            min_level: self.min_level.or(base.min_level),
            sender_substring: self
                .sender
                .clone()
                .or_else(|| base.sender_substring.clone()),
            message_substring: self.grep.clone().or_else(|| base.message_substring.clone()),
            important_only: self.important || base.important_only,
        }
    }

    fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }
}

fn main() {
    let cli = Cli::parse();

    let (app_config, warnings) = match load_app_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "ASLSleuth starting"
    );
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    if let Err(e) = run(&cli, &app_config) {
        if is_broken_pipe(&e) {
            // Downstream reader (head, a pager) went away.
            std::process::exit(0);
        }
        tracing::error!(error = %e, "ASLSleuth failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_app_config(cli: &Cli) -> Result<(AppConfig, Vec<String>), AslSleuthError> {
    match cli.config {
        Some(ref path) => Ok(config::load_config_file(path)?),
        None => Ok(config::load_config(&PlatformPaths::resolve().config_file())),
    }
}

fn run(cli: &Cli, app_config: &AppConfig) -> Result<(), AslSleuthError> {
    let formatter = Formatter::new(&cli.format_options(&app_config.format));
    let pipeline = Pipeline::new(formatter, cli.filter_criteria(&app_config.filter));

    if cli.follow {
        let cancel = install_cancel_handler();
        let stdout = io::stdout();
        let stats = match cli.input_path() {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| InputError::File {
                    path: path.to_path_buf(),
                    source,
                })?;
                follow(file, stdout.lock(), &pipeline, &cancel)?
            }
            None => follow(io::stdin().lock(), stdout.lock(), &pipeline, &cancel)?,
        };
        tracing::debug!(?stats, "Follow session ended");
        return Ok(());
    }

    let result = match cli.input_path() {
        Some(path) => {
            let buffer = fs::read_input_file(path).map_err(|source| InputError::File {
                path: path.to_path_buf(),
                source,
            })?;
            decode(&buffer, cli.input_format)
        }
        None => {
            let bytes = fs::read_stdin().map_err(|source| InputError::Stdin { source })?;
            decode(&bytes, cli.input_format)
        }
    };

    tracing::info!(
        messages = result.messages.len(),
        processed = result.lines_processed,
        skipped = result.lines_skipped,
        "Input decoded"
    );

    match cli.export {
        Some(format) => {
            let path = cli.output.clone().unwrap_or_else(|| {
                PathBuf::from(default_export_file_name(
                    format,
                    chrono::Local::now().naive_local(),
                ))
            });
            let selected = pipeline.select(&result.messages);
            let count = export_to_file(&selected, format, pipeline.formatter(), &path)?;
            eprintln!("Exported {count} messages to {}", path.display());
        }
        None => {
            let rendered = pipeline.render(&result.messages);
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|source| InputError::Stdout { source })?;
        }
    }

    Ok(())
}

/// Ctrl-C sets the returned flag so follow mode ends at the next chunk
/// boundary with its output flushed. A second Ctrl-C exits at once.
fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        tracing::info!("Interrupt received; stopping follow");
    }) {
        tracing::warn!(error = %e, "Cannot install Ctrl-C handler");
    }
    cancel
}

fn is_broken_pipe(e: &AslSleuthError) -> bool {
    matches!(
        e,
        AslSleuthError::Input(InputError::Stdout { source })
            if source.kind() == io::ErrorKind::BrokenPipe
    )
}
