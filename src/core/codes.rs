// ASLSleuth - core/codes.rs
//
// Severity level and facility code tables.
// Pure, read-only lookups shared by the parser, filter, and formatter.
// The name -> code maps are built once per process and never mutated.

use owo_colors::Style;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

// =============================================================================
// Level
// =============================================================================

/// ASL severity level. Lower numeric value = more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    #[default]
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Level {
    /// All levels, most severe first.
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// Numeric ASL code (0-7).
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Convert a numeric code, clamping out-of-range values to the nearest
    /// bound (negative -> Emergency, above 7 -> Debug).
    pub fn from_code(code: i64) -> Self {
        let idx = code.clamp(0, 7) as usize;
        Self::ALL[idx]
    }

    /// Canonical long name ("Emergency" .. "Debug").
    pub fn name(self) -> &'static str {
        match self {
            Level::Emergency => "Emergency",
            Level::Alert => "Alert",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Notice => "Notice",
            Level::Info => "Info",
            Level::Debug => "Debug",
        }
    }

    /// Short code for compact display.
    pub fn short_name(self) -> &'static str {
        match self {
            Level::Emergency => "EMRG",
            Level::Alert => "ALRT",
            Level::Critical => "CRIT",
            Level::Error => "ERR",
            Level::Warning => "WARN",
            Level::Notice => "NOTE",
            Level::Info => "INFO",
            Level::Debug => "DBG",
        }
    }

    /// Terminal style used when colourised output is enabled.
    pub fn ansi_style(self) -> Style {
        match self {
            Level::Emergency => Style::new().white().on_red().bold(),
            Level::Alert => Style::new().red().bold(),
            Level::Critical => Style::new().magenta().bold(),
            Level::Error => Style::new().red(),
            Level::Warning => Style::new().yellow(),
            Level::Notice => Style::new().cyan(),
            Level::Info => Style::new().green(),
            Level::Debug => Style::new().bright_black(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        try_name_to_level(s).ok_or_else(|| format!("unknown level '{s}'"))
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn level_names() -> &'static HashMap<String, Level> {
    static NAMES: OnceLock<HashMap<String, Level>> = OnceLock::new();
    NAMES.get_or_init(|| {
        let mut map = HashMap::new();
        for level in Level::ALL {
            map.insert(level.name().to_ascii_lowercase(), level);
            map.insert(level.short_name().to_ascii_lowercase(), level);
        }
        // syslog(3) spellings
        for (alias, level) in [
            ("emerg", Level::Emergency),
            ("panic", Level::Emergency),
            ("crit", Level::Critical),
            ("err", Level::Error),
            ("warn", Level::Warning),
        ] {
            map.insert(alias.to_string(), level);
        }
        map
    })
}

/// Level -> canonical long name.
pub fn level_to_name(level: Level) -> &'static str {
    level.name()
}

/// Level -> 3-4 letter abbreviation.
pub fn level_to_short_name(level: Level) -> &'static str {
    level.short_name()
}

/// Case-insensitive name -> level, `None` when the token is not a level name.
///
/// Accepts long names, short names, syslog aliases, and decimal codes
/// (clamped into range).
pub fn try_name_to_level(name: &str) -> Option<Level> {
    let trimmed = name.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Some(Level::from_code(code));
    }
    level_names()
        .get(trimmed.to_ascii_lowercase().as_str())
        .copied()
}

/// Case-insensitive name -> level. Unrecognised names map to `Level::Notice`
/// so that severity classification never blocks a record.
pub fn name_to_level(name: &str) -> Level {
    try_name_to_level(name).unwrap_or(Level::Notice)
}

// =============================================================================
// Facility
// =============================================================================

/// ASL facility. Codes outside the defined set are preserved in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facility {
    Kernel,
    #[default]
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Clock,
    AuthPriv,
    Ftp,
    Ntp,
    Secure,
    Console,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
    Unknown(i32),
}

impl Facility {
    /// Every defined facility, in code order.
    pub const DEFINED: [Facility; 23] = [
        Facility::Kernel,
        Facility::User,
        Facility::Mail,
        Facility::Daemon,
        Facility::Auth,
        Facility::Syslog,
        Facility::Lpr,
        Facility::News,
        Facility::Uucp,
        Facility::Clock,
        Facility::AuthPriv,
        Facility::Ftp,
        Facility::Ntp,
        Facility::Secure,
        Facility::Console,
        Facility::Local0,
        Facility::Local1,
        Facility::Local2,
        Facility::Local3,
        Facility::Local4,
        Facility::Local5,
        Facility::Local6,
        Facility::Local7,
    ];

    /// Numeric facility code.
    pub fn code(self) -> i32 {
        match self {
            Facility::Kernel => 0,
            Facility::User => 1,
            Facility::Mail => 2,
            Facility::Daemon => 3,
            Facility::Auth => 4,
            Facility::Syslog => 5,
            Facility::Lpr => 6,
            Facility::News => 7,
            Facility::Uucp => 8,
            Facility::Clock => 9,
            Facility::AuthPriv => 10,
            Facility::Ftp => 11,
            Facility::Ntp => 12,
            Facility::Secure => 13,
            Facility::Console => 14,
            // 15 is unassigned in ASL.
            Facility::Local0 => 16,
            Facility::Local1 => 17,
            Facility::Local2 => 18,
            Facility::Local3 => 19,
            Facility::Local4 => 20,
            Facility::Local5 => 21,
            Facility::Local6 => 22,
            Facility::Local7 => 23,
            Facility::Unknown(code) => code,
        }
    }

    /// Convert a numeric code; undefined codes are kept verbatim.
    pub fn from_code(code: i32) -> Self {
        Self::DEFINED
            .iter()
            .copied()
            .find(|f| f.code() == code)
            .unwrap_or(Facility::Unknown(code))
    }

    /// Canonical name, `"unknown"` for undefined codes.
    pub fn name(self) -> &'static str {
        match self {
            Facility::Kernel => "kernel",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Clock => "clock",
            Facility::AuthPriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Ntp => "ntp",
            Facility::Secure => "secure",
            Facility::Console => "console",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
            Facility::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Known facilities serialise as their name; unknown ones as their decimal
/// code so the value survives an export/import cycle.
impl Serialize for Facility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Facility::Unknown(code) => serializer.serialize_str(&code.to_string()),
            known => serializer.serialize_str(known.name()),
        }
    }
}

fn facility_names() -> &'static HashMap<String, Facility> {
    static NAMES: OnceLock<HashMap<String, Facility>> = OnceLock::new();
    NAMES.get_or_init(|| {
        let mut map: HashMap<String, Facility> = Facility::DEFINED
            .iter()
            .map(|f| (f.name().to_string(), *f))
            .collect();
        map.insert("kern".to_string(), Facility::Kernel);
        map.insert("cron".to_string(), Facility::Clock);
        map.insert("security".to_string(), Facility::Secure);
        map
    })
}

/// Facility -> canonical name.
pub fn facility_to_name(facility: Facility) -> &'static str {
    facility.name()
}

/// Case-insensitive name -> facility, `None` for unrecognised names.
///
/// Decimal codes are accepted and kept verbatim when undefined.
pub fn try_name_to_facility(name: &str) -> Option<Facility> {
    let trimmed = name.trim();
    if let Ok(code) = trimmed.parse::<i32>() {
        return Some(Facility::from_code(code));
    }
    facility_names()
        .get(trimmed.to_ascii_lowercase().as_str())
        .copied()
}

/// Case-insensitive name -> facility. Unrecognised names map to
/// `Facility::User`.
pub fn name_to_facility(name: &str) -> Facility {
    try_name_to_facility(name).unwrap_or(Facility::User)
}
