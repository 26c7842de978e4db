// ASLSleuth - core/parser/oslog.rs
//
// Unified logging (os_log) single-line grammar:
//
//   2024-01-15 14:30:22.123456-0800 com.apple.network connection Error: reset by peer
//
// Field order is timestamp, subsystem, category, type token. The type token
// maps onto the level table; lines without it never match, which lets the
// caller fall through to the BSD grammar.

use crate::core::codes::Level;
use crate::core::model::Message;
use crate::util::logging::preview;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn os_log_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<ts>\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?)(?P<tz>Z|[+-]\d{2}:?\d{2})?\s+(?P<subsystem>\S+)\s+(?P<category>\S+)\s+(?P<kind>[A-Za-z]+): (?P<body>.*)$",
        )
        .expect("os_log_line_regex: invalid regex")
    })
}

/// Map an os_log type token (case-insensitive) to its level and canonical
/// spelling.
pub fn os_log_type_level(token: &str) -> Option<(Level, &'static str)> {
    match token.to_ascii_lowercase().as_str() {
        "default" => Some((Level::Notice, "Default")),
        "info" => Some((Level::Info, "Info")),
        "debug" => Some((Level::Debug, "Debug")),
        "error" => Some((Level::Error, "Error")),
        "fault" => Some((Level::Critical, "Fault")),
        _ => None,
    }
}

/// Parse one os_log text line.
///
/// The process fields are not part of this grammar: pid/uid/gid stay unset
/// and `sender` is `None` (formatters fall back to the subsystem).
pub fn parse_os_log_line(line: &str) -> Option<Message> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(caps) = os_log_line_regex().captures(line) else {
        tracing::trace!(line = preview(line), "Not an os_log line");
        return None;
    };

    let Some((level, kind)) = os_log_type_level(&caps["kind"]) else {
        tracing::trace!(line = preview(line), "Unknown os_log type token");
        return None;
    };
    let timestamp = parse_os_log_timestamp(&caps["ts"], caps.name("tz").map(|m| m.as_str()))?;

    let mut msg = Message::new(timestamp, caps["body"].to_string());
    msg.subsystem = Some(caps["subsystem"].to_string());
    msg.category = Some(caps["category"].to_string());
    msg.message_type = Some(kind.to_string());
    msg.level = level;
    Some(msg)
}

/// Parse the timestamp, applying an explicit UTC offset when present.
/// Without an offset the wall-clock value is stored as-is.
fn parse_os_log_timestamp(raw: &str, tz: Option<&str>) -> Option<DateTime<Utc>> {
    let normalised = raw.replace('T', " ");
    let naive = if normalised.contains('.') {
        NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S%.f").ok()?
    } else {
        NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S").ok()?
    };

    match tz {
        None | Some("Z") => Some(naive.and_utc()),
        Some(offset) => {
            let offset = parse_offset(offset)?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

/// `+HHMM`, `+HH:MM`, `-HHMM`, `-HH:MM`.
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = match raw.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = raw[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
