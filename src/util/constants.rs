// ASLSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ASLSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ASLSleuth";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Message model
// =============================================================================

/// Sentinel stored in `pid`, `uid` and `gid` when the source dialect does not
/// carry the identifier. Zero is a valid id (root / kernel_task), so it cannot
/// double as "absent".
pub const ID_UNSET: i64 = -1;

/// Placeholder rendered when a message has no host.
pub const MISSING_FIELD_PLACEHOLDER: &str = "-";

/// Sender name rendered when neither sender nor subsystem is known.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Extended-attribute key holding the `(library)` suffix of an iOS relay
/// sender token, e.g. `backboardd(CoreBrightness)[67]`.
pub const LIBRARY_ATTRIBUTE: &str = "library";

// =============================================================================
// Parsing limits
// =============================================================================

/// Size in bytes of the fixed binary ASL record header.
pub const BINARY_HEADER_LEN: usize = 32;

/// Maximum number of leading `<Tag>` tokens inspected in a BSD message body
/// (one level tag and one facility tag).
pub const MAX_EMBEDDED_TAGS: usize = 2;

/// Relay frame tag: payload is a single text line.
pub const RELAY_TAG_TEXT: u8 = 0x01;

/// Relay frame tag: payload is one binary ASL record.
pub const RELAY_TAG_BINARY: u8 = 0x02;

/// Size in bytes of a relay frame header (tag + big-endian u32 length).
pub const RELAY_FRAME_HEADER_LEN: usize = 5;

/// Maximum length of raw input included in debug/trace output.
/// Prevents accidental exposure of long message bodies in diagnostics.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Formatting
// =============================================================================

/// Marker appended to truncated message bodies. Counted inside the
/// configured maximum length.
pub const ELLIPSIS: &str = "...";

/// Baseline message length cap for the compact style.
pub const COMPACT_MAX_MESSAGE_LENGTH: usize = 120;

/// Timestamp format for the standard style.
pub const STANDARD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format for the compact style.
pub const COMPACT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Timestamp format for the verbose style.
pub const VERBOSE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Timestamp format matching idevicesyslog output.
pub const IDEVICESYSLOG_TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S";

/// Number of messages above which the pipeline renders in parallel.
/// Below this, rayon's scheduling overhead outweighs the gain.
pub const PARALLEL_RENDER_THRESHOLD: usize = 2_048;

// =============================================================================
// Streaming input
// =============================================================================

/// Read chunk size in bytes for follow mode.
pub const FOLLOW_CHUNK_SIZE: usize = 16 * 1024; // 16 KiB

/// Maximum accumulated size of the in-progress record buffer in follow mode.
///
/// Guards against OOM when the stream produces no record separators (binary
/// garbage, a stuck device). The fragment is discarded with a warning.
pub const MAX_PARTIAL_LINE_BYTES: usize = 2 * 1024 * 1024; // 2 MiB

/// File size threshold in bytes above which input files are memory-mapped.
pub const LARGE_FILE_THRESHOLD: u64 = 64 * 1024 * 1024; // 64 MiB

// =============================================================================
// Logging
// =============================================================================

/// Default log level. Diagnostics go to stderr; stdout carries log output, so
/// the default stays quiet.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// =============================================================================
// Export
// =============================================================================

/// Prefix of generated export file names (`syslog_YYYYMMDD_HHMMSS.txt`).
pub const EXPORT_FILE_PREFIX: &str = "syslog";

/// chrono format for the timestamp part of generated export file names.
pub const EXPORT_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
