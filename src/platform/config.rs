// ASLSleuth - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::codes::try_name_to_level;
use crate::core::filter::FilterCriteria;
use crate::core::formatter::{is_valid_strftime, FormatOptions, Style};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ASLSleuth configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/aslsleuth/).
    pub config_dir: PathBuf,

    /// Data directory, default home of export files.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads in
/// an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[format]` section.
    pub format: FormatSection,
    /// `[filter]` section.
    pub filter: FilterSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[format]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FormatSection {
    /// "standard", "compact", "verbose" or "idevicesyslog".
    pub style: Option<String>,
    pub show_timestamp: Option<bool>,
    pub show_host: Option<bool>,
    pub show_pid: Option<bool>,
    pub show_level: Option<bool>,
    pub colorize: Option<bool>,
    /// Characters, ellipsis included. 0 = unlimited.
    pub max_message_length: Option<i64>,
    /// strftime pattern.
    pub timestamp_format: Option<String>,
}

/// `[filter]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Least severe level shown, by name.
    pub min_level: Option<String>,
    /// Case-insensitive sender substring.
    pub sender: Option<String>,
    /// Case-insensitive message substring.
    pub message: Option<String>,
    /// Only Warning and above.
    pub important_only: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Formatter defaults; CLI flags override individual fields.
    pub format: FormatOptions,
    /// Filter defaults; CLI flags override individual fields.
    pub filter: FilterCriteria,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

/// Load and validate `config.toml` from the default location.
///
/// Never fails: a missing file yields defaults with no warnings (first run),
/// an unreadable or unparseable file yields defaults plus a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate a config file the user named explicitly.
///
/// Read and TOML errors are returned; value-level problems are reported as
/// warnings alongside the validated config.
pub fn load_config_file(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Validate each field, accumulating every warning rather than stopping at
/// the first.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Format: style --
    if let Some(ref style) = raw.format.style {
        match style.parse::<Style>() {
            Ok(parsed) => config.format.style = parsed,
            Err(_) => warnings.push(format!(
                "[format] style = \"{style}\" is not recognised. \
                 Valid values: standard, compact, verbose, idevicesyslog. Using default (standard).",
            )),
        }
    }

    config.format.show_timestamp = raw.format.show_timestamp;
    config.format.show_host = raw.format.show_host;
    config.format.show_pid = raw.format.show_pid;
    config.format.show_level = raw.format.show_level;
    config.format.colorize = raw.format.colorize;

    // -- Format: max_message_length --
    if let Some(len) = raw.format.max_message_length {
        if len >= 0 {
            config.format.max_message_length = Some(len);
        } else {
            warnings.push(format!(
                "[format] max_message_length = {len} is negative. Using unlimited (0).",
            ));
            config.format.max_message_length = Some(0);
        }
    }

    // -- Format: timestamp_format --
    if let Some(ref fmt) = raw.format.timestamp_format {
        if is_valid_strftime(fmt) {
            config.format.timestamp_format = Some(fmt.clone());
        } else {
            warnings.push(format!(
                "[format] timestamp_format = \"{fmt}\" contains an invalid strftime item. \
                 Using the style default.",
            ));
        }
    }

    // -- Filter: min_level --
    if let Some(ref level) = raw.filter.min_level {
        match try_name_to_level(level) {
            Some(parsed) => config.filter.min_level = Some(parsed),
            None => warnings.push(format!(
                "[filter] min_level = \"{level}\" is not a level name. \
                 Valid values: emergency, alert, critical, error, warning, notice, info, debug. \
                 No level filter applied.",
            )),
        }
    }

    config.filter.sender_substring = raw.filter.sender.filter(|s| !s.is_empty());
    config.filter.message_substring = raw.filter.message.filter(|s| !s.is_empty());
    config.filter.important_only = raw.filter.important_only.unwrap_or(false);

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codes::Level;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join(constants::CONFIG_FILE_NAME));
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_sections() {
        let file = write_config(
            r#"
[format]
style = "compact"
show_pid = true
colorize = true
max_message_length = 80
timestamp_format = "%H:%M"

[filter]
min_level = "warning"
sender = "netd"
important_only = true

[logging]
level = "DEBUG"
"#,
        );
        let (config, warnings) = load_config(file.path());
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.format.style, Style::Compact);
        assert_eq!(config.format.show_pid, Some(true));
        assert_eq!(config.format.show_host, None);
        assert_eq!(config.format.colorize, Some(true));
        assert_eq!(config.format.max_message_length, Some(80));
        assert_eq!(config.format.timestamp_format.as_deref(), Some("%H:%M"));
        assert_eq!(config.filter.min_level, Some(Level::Warning));
        assert_eq!(config.filter.sender_substring.as_deref(), Some("netd"));
        assert!(config.filter.important_only);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_warn_and_default() {
        let file = write_config(
            r#"
[format]
style = "fancy"
max_message_length = -4
timestamp_format = "%Q"

[filter]
min_level = "loud"

[logging]
level = "chatty"
"#,
        );
        let (config, warnings) = load_config(file.path());
        assert_eq!(warnings.len(), 5, "{warnings:?}");
        assert_eq!(config.format.style, Style::Standard);
        assert_eq!(config.format.max_message_length, Some(0));
        assert_eq!(config.format.timestamp_format, None);
        assert_eq!(config.filter.min_level, None);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let file = write_config("[format]\nstyle = \"verbose\"\nfuture_option = 1\n[network]\nx = 2\n");
        let (config, warnings) = load_config(file.path());
        assert!(warnings.is_empty());
        assert_eq!(config.format.style, Style::Verbose);
    }

    #[test]
    fn test_unparseable_file() {
        let file = write_config("[format\nstyle = ");
        let (config, warnings) = load_config(file.path());
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);

        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config_file(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
