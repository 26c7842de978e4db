// ASLSleuth - core/parser/text.rs
//
// BSD-style single-line syslog grammar, as emitted by syslogd and by the
// device syslog_relay service:
//
//   Jan  1 00:00:01 myhost myproc[123]: hello world
//   Oct 18 12:00:01 iPhone backboardd(CoreBrightness)[67] <Notice>: brightness 0.4
//
// The timestamp carries no year; the current UTC year is injected at parse
// time (Feb 29 falls back to the latest leap year) and the wall-clock value
// is stored without timezone conversion.

use crate::core::codes::{name_to_level, try_name_to_facility, try_name_to_level};
use crate::core::model::Message;
use crate::util::constants::{LIBRARY_ATTRIBUTE, MAX_EMBEDDED_TAGS};
use crate::util::logging::preview;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Gregorian leap years are never more than eight years apart.
const MAX_YEAR_LOOKBACK: i32 = 8;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn bsd_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<month>[A-Z][a-z]{2})\s+(?P<day>\d{1,2})\s(?P<time>\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?)\s+(?P<host>\S+)\s+(?P<sender>[^\s\[\]]+)\[(?P<pid>\d+)\](?:\s+<(?P<level>[A-Za-z]+)>)?: (?P<body>.*)$",
        )
        .expect("bsd_line_regex: invalid regex")
    })
}

/// Parse one BSD-style syslog line.
///
/// Returns `None` when the bracketed pid or the `": "` separator is missing,
/// or when the timestamp cannot be parsed.
pub fn parse_text_line(line: &str) -> Option<Message> {
    parse_text_line_with_year(line, Utc::now().year())
}

/// Parse one BSD-style syslog line, placing its year-less timestamp in `year`.
pub fn parse_text_line_with_year(line: &str, year: i32) -> Option<Message> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(caps) = bsd_line_regex().captures(line) else {
        tracing::trace!(line = preview(line), "Not a BSD syslog line");
        return None;
    };

    let Some(timestamp) = build_timestamp(year, &caps["month"], &caps["day"], &caps["time"])
    else {
        tracing::trace!(line = preview(line), "BSD timestamp out of range");
        return None;
    };
    let pid: i64 = caps["pid"].parse().ok()?;

    let mut msg = Message::new(timestamp, String::new());
    msg.host = Some(caps["host"].to_string());
    msg.pid = pid;

    let (sender, library) = split_library(&caps["sender"]);
    msg.sender = Some(sender.to_string());
    if let Some(library) = library {
        msg.set_value(LIBRARY_ATTRIBUTE, library);
    }

    if let Some(level) = caps.name("level") {
        msg.level = name_to_level(level.as_str());
    }

    let body = extract_embedded_tags(&caps["body"], &mut msg);
    msg.message = body.to_string();
    Some(msg)
}

/// Build a UTC timestamp from the year-less BSD parts.
fn build_timestamp(year: i32, month: &str, day: &str, time: &str) -> Option<DateTime<Utc>> {
    let month_idx = MONTHS.iter().position(|m| *m == month)?;
    let day: u32 = day.parse().ok()?;
    // Feb 29 in a non-leap year belongs to the most recent leap year.
    let date = (0..=MAX_YEAR_LOOKBACK)
        .find_map(|back| NaiveDate::from_ymd_opt(year - back, month_idx as u32 + 1, day))?;
    let time = if time.contains('.') {
        NaiveTime::parse_from_str(time, "%H:%M:%S%.f").ok()?
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?
    };
    Some(date.and_time(time).and_utc())
}

/// Split an iOS relay sender token `process(library)` into its parts.
fn split_library(sender: &str) -> (&str, Option<&str>) {
    if let Some(without_close) = sender.strip_suffix(')') {
        if let Some((process, library)) = without_close.split_once('(') {
            if !process.is_empty() && !library.is_empty() {
                return (process, Some(library));
            }
        }
    }
    (sender, None)
}

/// Consume leading `<Tag>` / `[Tag]` tokens naming a level or a facility.
///
/// At most one level tag and one facility tag are taken. The first token
/// that is not a recognised name ends extraction and stays in the body.
fn extract_embedded_tags<'a>(body: &'a str, msg: &mut Message) -> &'a str {
    let mut rest = body;
    let mut found_level = false;
    let mut found_facility = false;

    for _ in 0..MAX_EMBEDDED_TAGS {
        let candidate = rest.trim_start();
        let close = match candidate.chars().next() {
            Some('<') => '>',
            Some('[') => ']',
            _ => break,
        };
        let Some(end) = candidate.find(close) else {
            break;
        };
        let token = &candidate[1..end];
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            break;
        }
        // Bracketed numbers are pids or counters, not severity codes.
        if token.chars().all(|c| c.is_ascii_digit()) {
            break;
        }

        if !found_level {
            if let Some(level) = try_name_to_level(token) {
                msg.level = level;
                found_level = true;
                rest = strip_tag_separator(&candidate[end + 1..]);
                continue;
            }
        }
        if !found_facility {
            if let Some(facility) = try_name_to_facility(token) {
                msg.facility = facility;
                found_facility = true;
                rest = strip_tag_separator(&candidate[end + 1..]);
                continue;
            }
        }
        break;
    }

    if found_level || found_facility {
        rest.trim_start()
    } else {
        body
    }
}

fn strip_tag_separator(after_tag: &str) -> &str {
    after_tag.strip_prefix(':').unwrap_or(after_tag)
}
