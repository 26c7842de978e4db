// ASLSleuth - core/formatter.rs
//
// Style-driven message rendering.
//
// A named style establishes baseline toggles and a line layout; explicitly
// set toggles override the baseline. Rendering is a pure function of
// (Message, Formatter): identical inputs always yield identical strings.

use crate::core::codes::Level;
use crate::core::model::{Field, Message};
use crate::util::constants::{
    COMPACT_MAX_MESSAGE_LENGTH, COMPACT_TIMESTAMP_FORMAT, ELLIPSIS,
    IDEVICESYSLOG_TIMESTAMP_FORMAT, MISSING_FIELD_PLACEHOLDER, STANDARD_TIMESTAMP_FORMAT,
    VERBOSE_TIMESTAMP_FORMAT,
};
use chrono::format::{Item, StrftimeItems};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::str::FromStr;

// =============================================================================
// Style
// =============================================================================

/// Named presentation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// `ts host sender[pid] <Level>: message`
    #[default]
    #[serde(alias = "default")]
    Standard,
    /// `sender SHORT: message`, truncated.
    Compact,
    /// Multi-line block listing every available field.
    #[serde(alias = "detailed")]
    Verbose,
    /// Device syslog bridge layout: `ts host sender[pid]: message`.
    Idevicesyslog,
}

impl Style {
    pub const ALL: [Style; 4] = [
        Style::Standard,
        Style::Compact,
        Style::Verbose,
        Style::Idevicesyslog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Style::Standard => "standard",
            Style::Compact => "compact",
            Style::Verbose => "verbose",
            Style::Idevicesyslog => "idevicesyslog",
        }
    }

    /// Baseline toggles for this style.
    fn baseline(self) -> Baseline {
        match self {
            Style::Standard => Baseline {
                show_timestamp: true,
                show_host: true,
                show_pid: true,
                show_level: true,
                max_message_length: 0,
                timestamp_format: STANDARD_TIMESTAMP_FORMAT,
            },
            Style::Compact => Baseline {
                show_timestamp: false,
                show_host: false,
                show_pid: false,
                show_level: true,
                max_message_length: COMPACT_MAX_MESSAGE_LENGTH,
                timestamp_format: COMPACT_TIMESTAMP_FORMAT,
            },
            Style::Verbose => Baseline {
                show_timestamp: true,
                show_host: true,
                show_pid: true,
                show_level: true,
                max_message_length: 0,
                timestamp_format: VERBOSE_TIMESTAMP_FORMAT,
            },
            Style::Idevicesyslog => Baseline {
                show_timestamp: true,
                show_host: true,
                show_pid: true,
                show_level: false,
                max_message_length: 0,
                timestamp_format: IDEVICESYSLOG_TIMESTAMP_FORMAT,
            },
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Style::Standard),
            "compact" => Ok(Style::Compact),
            "verbose" | "detailed" => Ok(Style::Verbose),
            "idevicesyslog" => Ok(Style::Idevicesyslog),
            other => Err(format!(
                "unknown style '{other}' (expected standard, compact, verbose or idevicesyslog)"
            )),
        }
    }
}

struct Baseline {
    show_timestamp: bool,
    show_host: bool,
    show_pid: bool,
    show_level: bool,
    max_message_length: usize,
    timestamp_format: &'static str,
}

// =============================================================================
// Options
// =============================================================================

/// Formatter configuration: a style plus optional explicit overrides.
///
/// `None` means "use the style's baseline".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub style: Style,
    pub show_timestamp: Option<bool>,
    pub show_host: Option<bool>,
    pub show_pid: Option<bool>,
    pub show_level: Option<bool>,
    pub colorize: Option<bool>,
    /// Maximum rendered message length in characters, ellipsis included.
    /// 0 or negative = unlimited.
    pub max_message_length: Option<i64>,
    /// strftime-style pattern for the timestamp.
    pub timestamp_format: Option<String>,
}

impl FormatOptions {
    pub fn with_style(style: Style) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }
}

// =============================================================================
// Formatter
// =============================================================================

/// Resolved formatter: every toggle has a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    style: Style,
    show_timestamp: bool,
    show_host: bool,
    show_pid: bool,
    show_level: bool,
    colorize: bool,
    max_message_length: usize,
    timestamp_format: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(&FormatOptions::default())
    }
}

impl Formatter {
    /// Resolve options against the style baseline.
    ///
    /// A negative maximum length is treated as unlimited. A timestamp format
    /// containing an invalid strftime item is replaced by the style default.
    pub fn new(options: &FormatOptions) -> Self {
        let base = options.style.baseline();

        let max_message_length = match options.max_message_length {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            Some(_) => 0,
            None => base.max_message_length,
        };

        let timestamp_format = match options.timestamp_format.as_deref() {
            Some(fmt) if is_valid_strftime(fmt) => fmt.to_string(),
            Some(fmt) => {
                tracing::warn!(
                    format = fmt,
                    fallback = base.timestamp_format,
                    "Invalid timestamp format, using style default"
                );
                base.timestamp_format.to_string()
            }
            None => base.timestamp_format.to_string(),
        };

        Self {
            style: options.style,
            show_timestamp: options.show_timestamp.unwrap_or(base.show_timestamp),
            show_host: options.show_host.unwrap_or(base.show_host),
            show_pid: options.show_pid.unwrap_or(base.show_pid),
            show_level: options.show_level.unwrap_or(base.show_level),
            colorize: options.colorize.unwrap_or(false),
            max_message_length,
            timestamp_format,
        }
    }

    pub fn with_style(style: Style) -> Self {
        Self::new(&FormatOptions::with_style(style))
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// Render one message. No trailing newline.
    pub fn format_message(&self, msg: &Message) -> String {
        match self.style {
            Style::Standard => self.render_standard(msg),
            Style::Compact => self.render_compact(msg),
            Style::Verbose => self.render_verbose(msg),
            Style::Idevicesyslog => self.render_idevicesyslog(msg),
        }
    }

    /// Render a batch: each message newline-terminated, input order kept.
    pub fn format_messages(&self, messages: &[Message]) -> String {
        let mut out = String::new();
        for msg in messages {
            out.push_str(&self.format_message(msg));
            out.push('\n');
        }
        out
    }

    fn render_standard(&self, msg: &Message) -> String {
        self.render_line(msg, |level| format!("<{}>", level.name()))
    }

    fn render_idevicesyslog(&self, msg: &Message) -> String {
        self.render_line(msg, |level| format!("<{}>", level.name()))
    }

    fn render_compact(&self, msg: &Message) -> String {
        self.render_line(msg, |level| level.short_name().to_string())
    }

    /// Shared single-line layout:
    /// `[ts ][host ]sender[[pid]][ LEVEL]: message`
    fn render_line(&self, msg: &Message, level_token: impl Fn(Level) -> String) -> String {
        let mut line = String::new();

        if self.show_timestamp {
            line.push_str(&self.render_timestamp(msg));
            line.push(' ');
        }
        if self.show_host {
            line.push_str(&neutralize_controls(
                msg.host.as_deref().unwrap_or(MISSING_FIELD_PLACEHOLDER),
            ));
            line.push(' ');
        }

        line.push_str(&neutralize_controls(msg.display_sender()));
        if self.show_pid && msg.has_pid() {
            let _ = write!(line, "[{}]", msg.pid);
        }

        if self.show_level {
            line.push(' ');
            line.push_str(&self.paint_level(msg.level, level_token(msg.level)));
        }

        line.push_str(": ");
        line.push_str(&neutralize_controls(&truncate_message(
            &msg.message,
            self.max_message_length,
        )));
        line
    }

    fn render_verbose(&self, msg: &Message) -> String {
        let mut block = String::new();

        if self.show_timestamp {
            push_field(&mut block, "Timestamp", &self.render_timestamp(msg));
        }
        if self.show_host {
            if let Some(ref host) = msg.host {
                push_field(&mut block, "Host", host);
            }
        }
        push_field(&mut block, "Sender", msg.display_sender());
        if self.show_pid && msg.has_pid() {
            push_field(&mut block, "PID", &msg.pid.to_string());
        }
        if let Some(uid) = msg.field_value(Field::Uid) {
            push_field(&mut block, "UID", &uid);
        }
        if let Some(gid) = msg.field_value(Field::Gid) {
            push_field(&mut block, "GID", &gid);
        }
        if self.show_level {
            // Written directly: the painted token carries its own escapes.
            let token = self.paint_level(msg.level, format!("<{}>", msg.level.name()));
            let _ = writeln!(block, "Level: {token} ({})", msg.level.code());
        }
        push_field(
            &mut block,
            "Facility",
            &format!("{} ({})", msg.facility.name(), msg.facility.code()),
        );
        for (label, value) in [
            ("Subsystem", &msg.subsystem),
            ("Category", &msg.category),
            ("Type", &msg.message_type),
        ] {
            if let Some(value) = value {
                push_field(&mut block, label, value);
            }
        }
        if let Some(thread) = msg.thread_id {
            push_field(&mut block, "Thread", &format!("{thread:#x}"));
        }
        for (label, value) in [
            ("Activity", &msg.activity),
            ("Image", &msg.process_image_path),
        ] {
            if let Some(value) = value {
                push_field(&mut block, label, value);
            }
        }
        push_field(
            &mut block,
            "Message",
            &truncate_message(&msg.message, self.max_message_length),
        );

        let attributes = msg.extended_attributes();
        if !attributes.is_empty() {
            block.push_str("Attributes:\n");
            for (key, value) in attributes {
                let _ = writeln!(
                    block,
                    "  {}: {}",
                    neutralize_controls(key),
                    neutralize_controls(value)
                );
            }
        }

        // The batch renderer adds the terminator.
        block.truncate(block.trim_end_matches('\n').len());
        block
    }

    fn render_timestamp(&self, msg: &Message) -> String {
        let rendered = msg.timestamp.format(&self.timestamp_format).to_string();
        neutralize_controls(&rendered).into_owned()
    }

    fn paint_level(&self, level: Level, token: String) -> String {
        if self.colorize {
            token.style(level.ansi_style()).to_string()
        } else {
            token
        }
    }
}

/// True when every item of a strftime pattern is recognised.
pub fn is_valid_strftime(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// `Label: value` line of a verbose block.
fn push_field(block: &mut String, label: &str, value: &str) {
    let _ = writeln!(block, "{label}: {}", neutralize_controls(value));
}

/// Replace C0 control characters (tab excepted), DEL and the C1 CSI with
/// U+FFFD. Record text reaches the terminal only through this.
pub fn neutralize_controls(text: &str) -> Cow<'_, str> {
    let is_control = |c: char| (c.is_ascii_control() && c != '\t') || c == '\u{9b}';
    if !text.chars().any(is_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| if is_control(c) { char::REPLACEMENT_CHARACTER } else { c })
            .collect(),
    )
}

/// Cut a message to `max` characters, ellipsis included. `max == 0` means
/// unlimited. When `max` cannot fit the ellipsis the text is cut bare.
pub fn truncate_message(message: &str, max: usize) -> Cow<'_, str> {
    if max == 0 || message.chars().count() <= max {
        return Cow::Borrowed(message);
    }
    let marker_len = ELLIPSIS.chars().count();
    if max <= marker_len {
        return Cow::Owned(message.chars().take(max).collect());
    }
    let mut cut: String = message.chars().take(max - marker_len).collect();
    cut.push_str(ELLIPSIS);
    Cow::Owned(cut)
}
