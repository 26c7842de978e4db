// ASLSleuth - core/parser/relay.rs
//
// syslog_relay envelope demultiplexing.
//
// Framed form: concatenated frames of
//
//   u8 tag | u32 big-endian payload length | payload
//
// with tag 0x01 = one text line (os_log or BSD grammar, trailing NUL/CR/LF
// ignored) and tag 0x02 = one binary ASL record. Unknown tags are skipped by
// length; a frame whose declared length runs past the buffer ends
// demultiplexing.
//
// Raw form: when the buffer does not start with a known tag it is the plain
// text stream the device relay service emits, with records separated by NUL
// or newline.

use crate::core::model::Message;
use crate::core::parser::{binary, parse_line};
use crate::util::constants::{RELAY_FRAME_HEADER_LEN, RELAY_TAG_BINARY, RELAY_TAG_TEXT};
use crate::util::error::DecodeError;
use crate::util::logging::preview;

/// How the envelope carries its inner records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEncoding {
    Framed,
    RawText,
}

impl RelayEncoding {
    /// Decide the encoding from the leading discriminator byte.
    pub fn detect(data: &[u8]) -> Self {
        match data.first() {
            Some(&RELAY_TAG_TEXT) | Some(&RELAY_TAG_BINARY) => RelayEncoding::Framed,
            _ => RelayEncoding::RawText,
        }
    }
}

/// Lazy, single-pass iterator over the decodable inner records of a relay
/// envelope, in envelope order. Undecodable inner records are skipped.
pub struct RelayRecords<'a> {
    data: &'a [u8],
    pos: usize,
    encoding: RelayEncoding,
}

impl<'a> RelayRecords<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            encoding: RelayEncoding::detect(data),
        }
    }

    /// Next frame as `(tag, payload)`, or `None` at the end / on truncation.
    fn next_frame(&mut self) -> Option<(u8, &'a [u8])> {
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            return None;
        }
        if remaining.len() < RELAY_FRAME_HEADER_LEN {
            self.stop(DecodeError::Truncated {
                offset: self.pos,
                needed: RELAY_FRAME_HEADER_LEN,
                available: remaining.len(),
            });
            return None;
        }

        let tag = remaining[0];
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&remaining[1..RELAY_FRAME_HEADER_LEN]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        let body = &remaining[RELAY_FRAME_HEADER_LEN..];
        if len > body.len() {
            self.stop(DecodeError::Truncated {
                offset: self.pos + RELAY_FRAME_HEADER_LEN,
                needed: len,
                available: body.len(),
            });
            return None;
        }

        self.pos += RELAY_FRAME_HEADER_LEN + len;
        Some((tag, &body[..len]))
    }

    fn stop(&mut self, reason: DecodeError) {
        tracing::debug!(error = %reason, "Relay envelope ends with a truncated frame");
        self.pos = self.data.len();
    }

    fn next_framed(&mut self) -> Option<Message> {
        loop {
            let frame_offset = self.pos;
            let (tag, payload) = self.next_frame()?;
            if payload.is_empty() {
                tracing::trace!(
                    error = %DecodeError::EmptyFrame { offset: frame_offset },
                    "Skipping relay frame"
                );
                continue;
            }
            let decoded = match tag {
                RELAY_TAG_TEXT => parse_text_payload(payload),
                RELAY_TAG_BINARY => binary::parse_binary_data(payload),
                other => {
                    tracing::debug!(tag = other, offset = frame_offset, "Unknown relay frame tag");
                    None
                }
            };
            if decoded.is_some() {
                return decoded;
            }
        }
    }

    fn next_raw(&mut self) -> Option<Message> {
        while self.pos < self.data.len() {
            let remaining = &self.data[self.pos..];
            let end = remaining
                .iter()
                .position(|b| *b == b'\0' || *b == b'\n')
                .unwrap_or(remaining.len());
            let record = &remaining[..end];
            // Skip the separator too (absent at the very end).
            self.pos += (end + 1).min(remaining.len());

            if let Some(msg) = parse_text_payload(record) {
                return Some(msg);
            }
        }
        None
    }
}

impl Iterator for RelayRecords<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        match self.encoding {
            RelayEncoding::Framed => self.next_framed(),
            RelayEncoding::RawText => self.next_raw(),
        }
    }
}

fn parse_text_payload(payload: &[u8]) -> Option<Message> {
    let text = String::from_utf8_lossy(payload);
    let line = text.trim_end_matches(['\0', '\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let parsed = parse_line(line);
    if parsed.is_none() {
        tracing::trace!(line = preview(line), "Undecodable relay text record");
    }
    parsed
}

/// Parse a relay envelope, returning its first decodable inner record.
pub fn parse_syslog_relay_data(data: &[u8]) -> Option<Message> {
    RelayRecords::new(data).next()
}

/// Parse a relay envelope, returning every decodable inner record in
/// envelope order.
pub fn parse_syslog_relay_frames(data: &[u8]) -> Vec<Message> {
    RelayRecords::new(data).collect()
}
