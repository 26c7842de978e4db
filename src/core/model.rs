// ASLSleuth - core/model.rs
//
// Canonical log message model. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// Every parsing dialect produces a `Message`; filtering, formatting and
// export consume it.

use crate::core::codes::{name_to_facility, name_to_level, Facility, Level};
use crate::util::constants::{ID_UNSET, UNKNOWN_SENDER};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// First-class fields
// =============================================================================

/// The first-class fields of a `Message`, addressable by key.
///
/// Keys are the names accepted by `Message::set_value`, `Message::value`,
/// `Message::from_fields`, and binary record key/value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Host,
    Sender,
    Pid,
    Uid,
    Gid,
    Level,
    Facility,
    Message,
    Category,
    Subsystem,
    MessageType,
    ThreadId,
    Activity,
    ProcessImagePath,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Timestamp,
        Field::Host,
        Field::Sender,
        Field::Pid,
        Field::Uid,
        Field::Gid,
        Field::Level,
        Field::Facility,
        Field::Message,
        Field::Category,
        Field::Subsystem,
        Field::MessageType,
        Field::ThreadId,
        Field::Activity,
        Field::ProcessImagePath,
    ];

    /// Canonical key for this field.
    pub fn key(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Host => "host",
            Field::Sender => "sender",
            Field::Pid => "pid",
            Field::Uid => "uid",
            Field::Gid => "gid",
            Field::Level => "level",
            Field::Facility => "facility",
            Field::Message => "message",
            Field::Category => "category",
            Field::Subsystem => "subsystem",
            Field::MessageType => "messageType",
            Field::ThreadId => "threadID",
            Field::Activity => "activity",
            Field::ProcessImagePath => "processImagePath",
        }
    }

    /// Exact (case-sensitive) key lookup.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Key lookup for binary ASL records, which also use the standard ASL
    /// key spellings (`Time`, `Sender`, `PID`, ...).
    pub fn from_asl_key(key: &str) -> Option<Self> {
        Self::from_key(key).or(match key {
            "Time" => Some(Field::Timestamp),
            "Host" => Some(Field::Host),
            "Sender" => Some(Field::Sender),
            "PID" => Some(Field::Pid),
            "UID" => Some(Field::Uid),
            "GID" => Some(Field::Gid),
            "Level" => Some(Field::Level),
            "Facility" => Some(Field::Facility),
            "Message" => Some(Field::Message),
            _ => None,
        })
    }
}

// =============================================================================
// Message
// =============================================================================

/// Free-form key/value pairs beyond the first-class fields.
///
/// A sorted map keeps every rendering of the attributes deterministic.
pub type ExtendedAttributes = BTreeMap<String, String>;

/// A single log record, normalised across all input dialects.
///
/// `pid`, `uid` and `gid` hold `ID_UNSET` (-1) when the dialect does not
/// carry them. `level` is a `Level`, so it is always in range.
///
/// The only mutable surface after construction is the key/value setter,
/// which takes `&mut self`: a message shared across threads must be wrapped
/// in a lock by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Record time. See the parser for the per-dialect source.
    pub timestamp: DateTime<Utc>,

    /// Device or host name.
    pub host: Option<String>,

    /// Originating process name.
    pub sender: Option<String>,

    pub pid: i64,
    pub uid: i64,
    pub gid: i64,

    pub level: Level,
    pub facility: Facility,

    /// Message body. Always present, possibly empty.
    pub message: String,

    pub category: Option<String>,
    pub subsystem: Option<String>,
    pub message_type: Option<String>,
    #[serde(rename = "threadID")]
    pub thread_id: Option<u64>,
    pub activity: Option<String>,
    pub process_image_path: Option<String>,

    /// Never contains a first-class field key: `set_value` routes those into
    /// the field itself.
    extended_attributes: ExtendedAttributes,
}

impl Message {
    /// Minimal message: ids unset, level Notice, facility User.
    pub fn new(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            host: None,
            sender: None,
            pid: ID_UNSET,
            uid: ID_UNSET,
            gid: ID_UNSET,
            level: Level::Notice,
            facility: Facility::User,
            message: message.into(),
            category: None,
            subsystem: None,
            message_type: None,
            thread_id: None,
            activity: None,
            process_image_path: None,
            extended_attributes: ExtendedAttributes::new(),
        }
    }

    /// Build a message from a named field -> value mapping.
    ///
    /// Recognised keys are exactly the first-class field keys (see
    /// `Field::key`); anything else becomes an extended attribute. A missing
    /// or unparseable `timestamp` falls back to the construction time; a
    /// missing `message` is the empty string.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut msg = Self::new(Utc::now(), String::new());
        for (key, value) in fields {
            msg.set_value(key.as_ref(), value.as_ref());
        }
        msg
    }

    /// Set a value by key. First-class keys update the field, everything
    /// else is stored as an extended attribute (last write wins).
    pub fn set_value(&mut self, key: &str, value: &str) {
        match Field::from_key(key) {
            Some(field) => self.set_field(field, value),
            None => self.set_attribute(key, value),
        }
    }

    /// Assign a first-class field from its textual form.
    ///
    /// Unparseable numeric or timestamp values leave the field unchanged.
    /// Level and facility names fall back to the code-table defaults.
    pub fn set_field(&mut self, field: Field, value: &str) {
        match field {
            Field::Timestamp => {
                if let Some(ts) = parse_timestamp_value(value) {
                    self.timestamp = ts;
                }
            }
            Field::Host => self.host = Some(value.to_string()),
            Field::Sender => self.sender = Some(value.to_string()),
            Field::Pid => set_id(&mut self.pid, value),
            Field::Uid => set_id(&mut self.uid, value),
            Field::Gid => set_id(&mut self.gid, value),
            Field::Level => self.level = name_to_level(value),
            Field::Facility => self.facility = name_to_facility(value),
            Field::Message => self.message = value.to_string(),
            Field::Category => self.category = Some(value.to_string()),
            Field::Subsystem => self.subsystem = Some(value.to_string()),
            Field::MessageType => self.message_type = Some(value.to_string()),
            Field::ThreadId => {
                if let Some(id) = parse_thread_id(value) {
                    self.thread_id = Some(id);
                }
            }
            Field::Activity => self.activity = Some(value.to_string()),
            Field::ProcessImagePath => self.process_image_path = Some(value.to_string()),
        }
    }

    fn set_attribute(&mut self, key: &str, value: &str) {
        self.extended_attributes
            .insert(key.to_string(), value.to_string());
    }

    /// Read a value by key: first-class fields take precedence over an
    /// extended attribute of the same name.
    pub fn value(&self, key: &str) -> Option<String> {
        match Field::from_key(key) {
            Some(field) => self.field_value(field),
            None => self.extended_attributes.get(key).cloned(),
        }
    }

    /// Textual form of a first-class field, `None` when unset.
    pub fn field_value(&self, field: Field) -> Option<String> {
        match field {
            Field::Timestamp => Some(
                self.timestamp
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            Field::Host => self.host.clone(),
            Field::Sender => self.sender.clone(),
            Field::Pid => id_value(self.pid),
            Field::Uid => id_value(self.uid),
            Field::Gid => id_value(self.gid),
            Field::Level => Some(self.level.name().to_string()),
            Field::Facility => Some(match self.facility {
                Facility::Unknown(code) => code.to_string(),
                known => known.name().to_string(),
            }),
            Field::Message => Some(self.message.clone()),
            Field::Category => self.category.clone(),
            Field::Subsystem => self.subsystem.clone(),
            Field::MessageType => self.message_type.clone(),
            Field::ThreadId => self.thread_id.map(|id| id.to_string()),
            Field::Activity => self.activity.clone(),
            Field::ProcessImagePath => self.process_image_path.clone(),
        }
    }

    /// Read-only view of the extended attributes.
    pub fn extended_attributes(&self) -> &ExtendedAttributes {
        &self.extended_attributes
    }

    /// Name used when rendering the originator: sender, else subsystem.
    pub fn display_sender(&self) -> &str {
        self.sender
            .as_deref()
            .or(self.subsystem.as_deref())
            .unwrap_or(UNKNOWN_SENDER)
    }

    /// Whether the process id is known.
    pub fn has_pid(&self) -> bool {
        self.pid != ID_UNSET
    }
}

fn set_id(slot: &mut i64, value: &str) {
    if let Ok(id) = value.trim().parse::<i64>() {
        *slot = id;
    }
}

fn id_value(id: i64) -> Option<String> {
    (id != ID_UNSET).then(|| id.to_string())
}

/// Decimal or `0x`-prefixed hexadecimal thread id.
fn parse_thread_id(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}

/// Parse a timestamp given as epoch seconds (optionally fractional, as ASL
/// stores `Time`) or RFC 3339.
pub fn parse_timestamp_value(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let (secs_part, frac_part) = match trimmed.split_once('.') {
        Some((s, f)) => (s, f),
        None => (trimmed, ""),
    };
    let secs: i64 = secs_part.parse().ok()?;
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Right-pad / cut the fraction to nanosecond precision.
    let nanos: u32 = if frac_part.is_empty() {
        0
    } else {
        let mut digits: String = frac_part.chars().take(9).collect();
        while digits.len() < 9 {
            digits.push('0');
        }
        digits.parse().ok()?
    };
    // `-1.5` is 1.5 s before the epoch; the fraction counts away from zero.
    if secs_part.starts_with('-') && nanos > 0 {
        return DateTime::from_timestamp(secs.checked_sub(1)?, 1_000_000_000 - nanos);
    }
    DateTime::from_timestamp(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap()
    }

    #[test]
    fn test_new_uses_sentinels_and_defaults() {
        let msg = Message::new(fixed_time(), "hello");
        assert_eq!(msg.pid, ID_UNSET);
        assert_eq!(msg.uid, ID_UNSET);
        assert_eq!(msg.gid, ID_UNSET);
        assert_eq!(msg.level, Level::Notice);
        assert_eq!(msg.facility, Facility::User);
        assert_eq!(msg.message, "hello");
        assert!(msg.extended_attributes().is_empty());
    }

    #[test]
    fn test_from_fields_routes_known_and_unknown_keys() {
        let msg = Message::from_fields([
            ("timestamp", "1705329022"),
            ("sender", "netd"),
            ("pid", "42"),
            ("uid", "0"),
            ("level", "Error"),
            ("facility", "daemon"),
            ("message", "link down"),
            ("threadID", "0x1f"),
            ("Interface", "en0"),
        ]);
        assert_eq!(msg.timestamp, fixed_time());
        assert_eq!(msg.sender.as_deref(), Some("netd"));
        assert_eq!(msg.pid, 42);
        assert_eq!(msg.uid, 0, "0 is a valid uid, not absent");
        assert_eq!(msg.gid, ID_UNSET);
        assert_eq!(msg.level, Level::Error);
        assert_eq!(msg.facility, Facility::Daemon);
        assert_eq!(msg.message, "link down");
        assert_eq!(msg.thread_id, Some(0x1f));
        assert_eq!(
            msg.extended_attributes().get("Interface").map(String::as_str),
            Some("en0")
        );
    }

    #[test]
    fn test_from_fields_without_message_is_empty_string() {
        let msg = Message::from_fields([("sender", "x")]);
        assert_eq!(msg.message, "");
    }

    #[test]
    fn test_first_class_keys_never_land_in_attributes() {
        let mut msg = Message::new(fixed_time(), "a");
        msg.set_value("sender", "launchd");
        msg.set_value("message", "b");
        for field in Field::ALL {
            assert!(
                !msg.extended_attributes().contains_key(field.key()),
                "{} leaked into attributes",
                field.key()
            );
        }
        assert_eq!(msg.value("sender").as_deref(), Some("launchd"));
        assert_eq!(msg.value("message").as_deref(), Some("b"));
    }

    #[test]
    fn test_attributes_last_write_wins() {
        let mut msg = Message::new(fixed_time(), "");
        msg.set_value("Color", "red");
        msg.set_value("Color", "blue");
        assert_eq!(msg.value("Color").as_deref(), Some("blue"));
        assert_eq!(msg.extended_attributes().len(), 1);
    }

    #[test]
    fn test_unparseable_values_keep_previous_field() {
        let mut msg = Message::new(fixed_time(), "");
        msg.set_value("pid", "abc");
        msg.set_value("timestamp", "yesterday");
        assert_eq!(msg.pid, ID_UNSET);
        assert_eq!(msg.timestamp, fixed_time());
    }

    #[test]
    fn test_level_value_is_clamped_and_defaulted() {
        let mut msg = Message::new(fixed_time(), "");
        msg.set_value("level", "99");
        assert_eq!(msg.level, Level::Debug);
        msg.set_value("level", "-3");
        assert_eq!(msg.level, Level::Emergency);
        msg.set_value("level", "chatty");
        assert_eq!(msg.level, Level::Notice);
    }

    #[test]
    fn test_value_of_unset_id_is_none() {
        let msg = Message::new(fixed_time(), "");
        assert_eq!(msg.value("pid"), None);
        assert_eq!(msg.value("missing"), None);
    }

    #[test]
    fn test_display_sender_falls_back_to_subsystem() {
        let mut msg = Message::new(fixed_time(), "");
        assert_eq!(msg.display_sender(), UNKNOWN_SENDER);
        msg.subsystem = Some("com.apple.network".to_string());
        assert_eq!(msg.display_sender(), "com.apple.network");
        msg.sender = Some("nsurlsessiond".to_string());
        assert_eq!(msg.display_sender(), "nsurlsessiond");
    }

    #[test]
    fn test_parse_timestamp_value_fractional_and_rfc3339() {
        let ts = parse_timestamp_value("1705329022.5").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 500);
        let ts = parse_timestamp_value("2024-01-15T14:30:22Z").unwrap();
        assert_eq!(ts, fixed_time());
        assert!(parse_timestamp_value("12.x").is_none());
    }

    #[test]
    fn test_parse_timestamp_value_negative_fraction() {
        let ts = parse_timestamp_value("-1.5").unwrap();
        assert_eq!(ts.timestamp_millis(), -1500);
        let ts = parse_timestamp_value("-0.25").unwrap();
        assert_eq!(ts.timestamp_millis(), -250);
        let ts = parse_timestamp_value("-2").unwrap();
        assert_eq!(ts.timestamp_millis(), -2000);
    }

    #[test]
    fn test_asl_key_spellings() {
        assert_eq!(Field::from_asl_key("PID"), Some(Field::Pid));
        assert_eq!(Field::from_asl_key("pid"), Some(Field::Pid));
        assert_eq!(Field::from_key("PID"), None);
    }
}
