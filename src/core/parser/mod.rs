// ASLSleuth - core/parser/mod.rs
//
// Dialect parsers turning raw text or bytes into canonical messages.
// Core layer: accepts in-memory buffers only, never touches I/O.
//
// Every entry point returns `Option<Message>`. Malformed input yields `None`
// and the rejection reason is logged at trace/debug level.

pub mod binary;
pub mod oslog;
pub mod relay;
pub mod text;

pub use binary::{decode_binary_record, parse_binary_data};
pub use oslog::parse_os_log_line;
pub use relay::{parse_syslog_relay_data, parse_syslog_relay_frames, RelayRecords};
pub use text::{parse_text_line, parse_text_line_with_year};

use crate::core::model::Message;

/// Result of parsing a multi-line text buffer.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Successfully parsed messages, in line order.
    pub messages: Vec<Message>,
    /// Non-blank lines examined.
    pub lines_processed: u64,
    /// Non-blank lines no grammar accepted.
    pub lines_skipped: u64,
}

/// Parse one text line with whichever grammar accepts it. os_log is tried
/// first, then BSD.
pub fn parse_line(line: &str) -> Option<Message> {
    parse_os_log_line(line).or_else(|| parse_text_line(line))
}

/// Parse a multi-line text buffer, returning successes in line order.
pub fn parse_text_lines(text: &str) -> Vec<Message> {
    parse_text_lines_with_stats(text).messages
}

/// Parse a multi-line text buffer and report how many lines were skipped.
///
/// Lines are split on `\n` (a trailing `\r` is dropped). Blank lines are
/// ignored entirely and are not counted.
pub fn parse_text_lines_with_stats(text: &str) -> ParseResult {
    let mut result = ParseResult::default();

    for (line_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        result.lines_processed += 1;

        match parse_line(line) {
            Some(msg) => result.messages.push(msg),
            None => {
                result.lines_skipped += 1;
                tracing::trace!(
                    line_number = line_idx + 1,
                    line = crate::util::logging::preview(line),
                    "Skipping unparseable line"
                );
            }
        }
    }

    tracing::debug!(
        parsed = result.messages.len(),
        skipped = result.lines_skipped,
        "Text buffer parsed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codes::Level;

    #[test]
    fn test_malformed_line_is_skipped() {
        let text = "Jan  1 00:00:01 myhost myproc[123]: first\n\
                    this line is not syslog\n\
                    Jan  1 00:00:03 myhost myproc[123]: third\n";
        let messages = parse_text_lines(text);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "first");
        assert_eq!(messages[1].message, "third");
    }

    #[test]
    fn test_stats_count_non_blank_lines() {
        let text = "\nJan  1 00:00:01 h p[1]: a\r\n\r\n   \ngarbage\n";
        let result = parse_text_lines_with_stats(text);
        assert_eq!(result.lines_processed, 2);
        assert_eq!(result.lines_skipped, 1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].message, "a");
    }

    #[test]
    fn test_mixed_dialects_in_line_order() {
        let text = "2024-01-15 14:30:22.100 com.apple.wifi scan Error: no networks\n\
                    Jan 15 14:30:23 iPhone locationd[80] <Warning>: weak signal\n";
        let messages = parse_text_lines(text);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].subsystem.as_deref(), Some("com.apple.wifi"));
        assert_eq!(messages[0].level, Level::Error);
        assert_eq!(messages[1].sender.as_deref(), Some("locationd"));
        assert_eq!(messages[1].level, Level::Warning);
    }

    #[test]
    fn test_parse_line_prefers_os_log() {
        let msg = parse_line("2024-01-15 14:30:22 com.apple.x cat Info: hi").unwrap();
        assert_eq!(msg.message_type.as_deref(), Some("Info"));
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_empty_buffer() {
        let result = parse_text_lines_with_stats("");
        assert!(result.messages.is_empty());
        assert_eq!(result.lines_processed, 0);
    }
}
