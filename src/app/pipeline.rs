// ASLSleuth - app/pipeline.rs
//
// Decode -> filter -> render for one complete input buffer.
//
// Decoding picks the dialect (explicit or auto-detected), filtering returns
// indices into the decoded batch, and rendering fans out across rayon
// workers once the batch is large enough. Output order always matches input
// order.

use crate::core::filter::{apply_filters, FilterCriteria};
use crate::core::formatter::Formatter;
use crate::core::model::Message;
use crate::core::parser::{self, ParseResult};
use crate::util::constants::{PARALLEL_RENDER_THRESHOLD, RELAY_TAG_BINARY, RELAY_TAG_TEXT};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Input format
// =============================================================================

/// Dialect of an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Decide from the buffer contents.
    #[default]
    Auto,
    /// Newline-separated BSD and/or os_log lines.
    Text,
    /// Newline-separated os_log lines only.
    OsLog,
    /// One binary ASL record.
    Binary,
    /// syslog_relay envelope (framed or raw NUL-separated).
    Relay,
}

impl InputFormat {
    pub fn name(self) -> &'static str {
        match self {
            InputFormat::Auto => "auto",
            InputFormat::Text => "text",
            InputFormat::OsLog => "oslog",
            InputFormat::Binary => "binary",
            InputFormat::Relay => "relay",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "text" | "bsd" => Ok(InputFormat::Text),
            "oslog" | "os_log" => Ok(InputFormat::OsLog),
            "binary" | "asl" => Ok(InputFormat::Binary),
            "relay" => Ok(InputFormat::Relay),
            other => Err(format!(
                "unknown input format '{other}' (expected auto, text, oslog, binary or relay)"
            )),
        }
    }
}

/// Guess the dialect of a buffer: a leading relay frame tag or any NUL byte
/// means a relay envelope, anything else is text lines.
pub fn detect_format(data: &[u8]) -> InputFormat {
    match data.first() {
        Some(&RELAY_TAG_TEXT) | Some(&RELAY_TAG_BINARY) => InputFormat::Relay,
        _ if data.contains(&0) => InputFormat::Relay,
        _ => InputFormat::Text,
    }
}

/// Decode a complete buffer in the given dialect.
///
/// `lines_processed` / `lines_skipped` count text lines for the line
/// dialects and inner records for the binary ones.
pub fn decode(data: &[u8], format: InputFormat) -> ParseResult {
    let resolved = match format {
        InputFormat::Auto => {
            let detected = detect_format(data);
            tracing::debug!(format = %detected, bytes = data.len(), "Input format detected");
            detected
        }
        explicit => explicit,
    };

    match resolved {
        InputFormat::Auto | InputFormat::Text => {
            parser::parse_text_lines_with_stats(&String::from_utf8_lossy(data))
        }
        InputFormat::OsLog => decode_os_log(&String::from_utf8_lossy(data)),
        InputFormat::Binary => {
            let messages: Vec<Message> = parser::parse_binary_data(data).into_iter().collect();
            ParseResult {
                lines_processed: 1,
                lines_skipped: u64::from(messages.is_empty()),
                messages,
            }
        }
        InputFormat::Relay => {
            let messages = parser::parse_syslog_relay_frames(data);
            ParseResult {
                lines_processed: messages.len() as u64,
                lines_skipped: 0,
                messages,
            }
        }
    }
}

fn decode_os_log(text: &str) -> ParseResult {
    let mut result = ParseResult::default();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        result.lines_processed += 1;
        match parser::parse_os_log_line(line) {
            Some(msg) => result.messages.push(msg),
            None => result.lines_skipped += 1,
        }
    }
    result
}

// =============================================================================
// Pipeline
// =============================================================================

/// Filter + formatter pair applied to decoded batches.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    formatter: Formatter,
    criteria: FilterCriteria,
}

impl Pipeline {
    pub fn new(formatter: Formatter, criteria: FilterCriteria) -> Self {
        Self {
            formatter,
            criteria,
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Messages passing the filter, in input order.
    pub fn select<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        apply_filters(messages, &self.criteria)
            .into_iter()
            .map(|idx| &messages[idx])
            .collect()
    }

    /// Render one message if it passes the filter.
    pub fn render_one(&self, msg: &Message) -> Option<String> {
        msg.matches_filter(&self.criteria)
            .then(|| self.formatter.format_message(msg))
    }

    /// Filter and render a batch, each message newline-terminated.
    ///
    /// Batches above `PARALLEL_RENDER_THRESHOLD` are rendered on the rayon
    /// pool; `collect` on an indexed parallel iterator keeps input order.
    pub fn render(&self, messages: &[Message]) -> String {
        let selected = self.select(messages);
        tracing::debug!(
            total = messages.len(),
            shown = selected.len(),
            "Rendering batch"
        );

        let rendered: Vec<String> = if selected.len() > PARALLEL_RENDER_THRESHOLD {
            selected
                .par_iter()
                .map(|msg| self.formatter.format_message(msg))
                .collect()
        } else {
            selected
                .iter()
                .map(|msg| self.formatter.format_message(msg))
                .collect()
        };

        let mut out = String::with_capacity(rendered.iter().map(|s| s.len() + 1).sum());
        for line in rendered {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
