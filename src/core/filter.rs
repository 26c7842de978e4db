// ASLSleuth - core/filter.rs
//
// Message filter predicate.
// All active criteria are AND-combined; omitted criteria do not constrain.
// Core layer: pure logic, no I/O.

use crate::core::codes::Level;
use crate::core::model::Message;
use serde::Deserialize;

/// Filter criteria. All fields are AND-combined when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Least severe level to include (numerically `level <= min_level`).
    pub min_level: Option<Level>,

    /// Case-insensitive substring of the sender. Empty = no filter.
    pub sender_substring: Option<String>,

    /// Case-insensitive substring of the message body. Empty = no filter.
    pub message_substring: Option<String>,

    /// Only messages at Warning or more severe.
    pub important_only: bool,
}

impl FilterCriteria {
    /// Returns true if no criteria constrain anything.
    pub fn is_empty(&self) -> bool {
        self.min_level.is_none()
            && non_empty(&self.sender_substring).is_none()
            && non_empty(&self.message_substring).is_none()
            && !self.important_only
    }

    /// Quick filter for messages worth surfacing (Warning and above).
    pub fn important() -> Self {
        Self {
            important_only: true,
            ..Default::default()
        }
    }

    /// Lower-case the substring criteria once so a batch does not repeat it.
    fn prepared(&self) -> PreparedCriteria {
        PreparedCriteria {
            min_level: self.min_level,
            sender: non_empty(&self.sender_substring).map(str::to_lowercase),
            message: non_empty(&self.message_substring).map(str::to_lowercase),
            important_only: self.important_only,
        }
    }
}

struct PreparedCriteria {
    min_level: Option<Level>,
    sender: Option<String>,
    message: Option<String>,
    important_only: bool,
}

impl PreparedCriteria {
    fn matches(&self, msg: &Message) -> bool {
        if let Some(min) = self.min_level {
            if msg.level > min {
                return false;
            }
        }

        if self.important_only && !msg.is_important() {
            return false;
        }

        if let Some(ref needle) = self.sender {
            match msg.sender.as_deref() {
                Some(sender) if sender.to_lowercase().contains(needle.as_str()) => {}
                _ => return false,
            }
        }

        if let Some(ref needle) = self.message {
            if !msg.message.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Message {
    /// True for Emergency through Warning.
    pub fn is_important(&self) -> bool {
        self.level <= Level::Warning
    }

    /// Check this message against every active criterion.
    pub fn matches_filter(&self, criteria: &FilterCriteria) -> bool {
        criteria.prepared().matches(self)
    }
}

/// Apply criteria to a slice of messages, returning indices of matches.
///
/// Returns indices into the original slice so callers can render or export
/// the filtered view without copying messages.
pub fn apply_filters(messages: &[Message], criteria: &FilterCriteria) -> Vec<usize> {
    if criteria.is_empty() {
        return (0..messages.len()).collect();
    }

    let prepared = criteria.prepared();
    messages
        .iter()
        .enumerate()
        .filter(|(_, msg)| prepared.matches(msg))
        .map(|(idx, _)| idx)
        .collect()
}
