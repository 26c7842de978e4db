// ASLSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. All errors preserve the causal chain
// for diagnostic logging.
//
// The core never surfaces errors to callers (malformed input yields "no
// message"); `DecodeError` exists so decoders can use `?` internally and log
// the precise rejection reason before discarding it.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ASLSleuth operations outside the core.
#[derive(Debug)]
pub enum AslSleuthError {
    /// Reading input failed.
    Input(InputError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for AslSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "Input error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for AslSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode errors (core-internal)
// ---------------------------------------------------------------------------

/// Why a binary record or relay frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a declared field or length was satisfied.
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The header nanosecond field is not below one second.
    InvalidNanoseconds { value: u32 },

    /// The header seconds field is outside chrono's representable range.
    TimestampOutOfRange { seconds: i64 },

    /// A key/value key is not valid UTF-8.
    InvalidKey { offset: usize },

    /// A relay frame carried no payload.
    EmptyFrame { offset: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated at offset {offset}: need {needed} bytes, {available} available"
            ),
            Self::InvalidNanoseconds { value } => {
                write!(f, "nanosecond field {value} is not below 1_000_000_000")
            }
            Self::TimestampOutOfRange { seconds } => {
                write!(f, "timestamp {seconds}s is out of range")
            }
            Self::InvalidKey { offset } => {
                write!(f, "attribute key at offset {offset} is not valid UTF-8")
            }
            Self::EmptyFrame { offset } => write!(f, "empty relay frame at offset {offset}"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors related to reading capture files or the input stream.
#[derive(Debug)]
pub enum InputError {
    /// I/O error reading an input file.
    File { path: PathBuf, source: io::Error },

    /// I/O error reading standard input.
    Stdin { source: io::Error },

    /// Writing rendered output to stdout failed.
    Stdout { source: io::Error },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
            Self::Stdin { source } => write!(f, "Cannot read standard input: {source}"),
            Self::Stdout { source } => write!(f, "Cannot write standard output: {source}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File { source, .. } => Some(source),
            Self::Stdin { source } => Some(source),
            Self::Stdout { source } => Some(source),
        }
    }
}

impl From<InputError> for AslSleuthError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for AslSleuthError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for AslSleuthError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ASLSleuth results.
pub type Result<T> = std::result::Result<T, AslSleuthError>;
