// ASLSleuth - core/parser/binary.rs
//
// Binary ASL record decoding.
//
// Layout (all integers big-endian):
//
//   offset  size  field
//   0       8     i64 seconds since the Unix epoch
//   8       4     u32 nanoseconds (< 1_000_000_000)
//   12      4     i32 level (clamped into 0..=7)
//   16      4     i32 facility
//   20      4     i32 pid   (-1 = unset)
//   24      4     i32 uid   (-1 = unset)
//   28      4     i32 gid   (-1 = unset)
//   32      ...   (u16 key_len, key, u32 value_len, value)*
//
// The key/value sequence must consume the buffer exactly. Any declared length
// reaching past the end rejects the whole record; no partial message is ever
// produced.

use crate::core::codes::{Facility, Level};
use crate::core::model::{Field, Message};
use crate::util::constants::BINARY_HEADER_LEN;
use crate::util::error::DecodeError;
use chrono::DateTime;

/// Bounds-checked big-endian reader over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.array()?))
    }
}

/// Decode a binary ASL record, reporting why it was rejected.
pub fn decode_binary_record(data: &[u8]) -> Result<Message, DecodeError> {
    if data.len() < BINARY_HEADER_LEN {
        return Err(DecodeError::Truncated {
            offset: 0,
            needed: BINARY_HEADER_LEN,
            available: data.len(),
        });
    }

    let mut reader = Reader::new(data);
    let seconds = reader.i64()?;
    let nanos = reader.u32()?;
    if nanos >= 1_000_000_000 {
        return Err(DecodeError::InvalidNanoseconds { value: nanos });
    }
    let timestamp = DateTime::from_timestamp(seconds, nanos)
        .ok_or(DecodeError::TimestampOutOfRange { seconds })?;

    let mut msg = Message::new(timestamp, String::new());
    msg.level = Level::from_code(i64::from(reader.i32()?));
    msg.facility = Facility::from_code(reader.i32()?);
    msg.pid = i64::from(reader.i32()?);
    msg.uid = i64::from(reader.i32()?);
    msg.gid = i64::from(reader.i32()?);

    while !reader.is_empty() {
        let key_offset = reader.pos;
        let key_len = usize::from(reader.u16()?);
        let key_bytes = reader.take(key_len)?;
        let value_len = reader.u32()? as usize;
        let value_bytes = reader.take(value_len)?;

        let key = std::str::from_utf8(key_bytes)
            .map_err(|_| DecodeError::InvalidKey { offset: key_offset })?;
        if key.is_empty() {
            continue;
        }
        let value = String::from_utf8_lossy(value_bytes);

        // Pairs are applied after the header, so a `level`/`pid` key
        // overrides the header value.
        match Field::from_asl_key(key) {
            Some(field) => msg.set_field(field, &value),
            None => msg.set_value(key, &value),
        }
    }

    Ok(msg)
}

/// Parse a binary ASL record. Short or truncated buffers yield `None`.
pub fn parse_binary_data(data: &[u8]) -> Option<Message> {
    match decode_binary_record(data) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!(error = %e, len = data.len(), "Rejected binary ASL record");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::util::constants::ID_UNSET;

    /// Test-side encoder for the record layout above.
    pub(crate) struct RecordBuilder {
        buf: Vec<u8>,
    }

    impl RecordBuilder {
        pub(crate) fn new(seconds: i64, level: i32, facility: i32, pid: i32) -> Self {
            let mut buf = Vec::new();
            buf.extend_from_slice(&seconds.to_be_bytes());
            buf.extend_from_slice(&0u32.to_be_bytes());
            buf.extend_from_slice(&level.to_be_bytes());
            buf.extend_from_slice(&facility.to_be_bytes());
            buf.extend_from_slice(&pid.to_be_bytes());
            buf.extend_from_slice(&501i32.to_be_bytes());
            buf.extend_from_slice(&(-1i32).to_be_bytes());
            Self { buf }
        }

        pub(crate) fn pair(mut self, key: &str, value: &str) -> Self {
            self.buf
                .extend_from_slice(&(key.len() as u16).to_be_bytes());
            self.buf.extend_from_slice(key.as_bytes());
            self.buf
                .extend_from_slice(&(value.len() as u32).to_be_bytes());
            self.buf.extend_from_slice(value.as_bytes());
            self
        }

        pub(crate) fn build(self) -> Vec<u8> {
            self.buf
        }
    }

    #[test]
    fn test_header_and_pairs() {
        let data = RecordBuilder::new(1_705_329_022, 3, 3, 88)
            .pair("Sender", "configd")
            .pair("Host", "iPad")
            .pair("message", "network changed")
            .pair("subsystem", "com.apple.SystemConfiguration")
            .pair("Interface", "en0")
            .build();
        let msg = parse_binary_data(&data).expect("valid record");

        assert_eq!(msg.timestamp.timestamp(), 1_705_329_022);
        assert_eq!(msg.level, Level::Error);
        assert_eq!(msg.facility, Facility::Daemon);
        assert_eq!(msg.pid, 88);
        assert_eq!(msg.uid, 501);
        assert_eq!(msg.gid, ID_UNSET);
        assert_eq!(msg.sender.as_deref(), Some("configd"));
        assert_eq!(msg.host.as_deref(), Some("iPad"));
        assert_eq!(msg.message, "network changed");
        assert_eq!(
            msg.subsystem.as_deref(),
            Some("com.apple.SystemConfiguration")
        );
        assert_eq!(msg.value("Interface").as_deref(), Some("en0"));
        assert_eq!(msg.extended_attributes().len(), 1);
    }

    #[test]
    fn test_header_only_record_has_empty_message() {
        let data = RecordBuilder::new(0, 6, 1, 1).build();
        let msg = parse_binary_data(&data).unwrap();
        assert_eq!(msg.message, "");
        assert_eq!(msg.level, Level::Info);
    }

    #[test]
    fn test_out_of_range_level_clamped() {
        let high = RecordBuilder::new(0, 42, 1, 1).build();
        assert_eq!(parse_binary_data(&high).unwrap().level, Level::Debug);
        let low = RecordBuilder::new(0, -7, 1, 1).build();
        assert_eq!(parse_binary_data(&low).unwrap().level, Level::Emergency);
    }

    #[test]
    fn test_unknown_facility_preserved() {
        let data = RecordBuilder::new(0, 5, 99, 1).build();
        assert_eq!(parse_binary_data(&data).unwrap().facility, Facility::Unknown(99));
    }

    #[test]
    fn test_every_truncation_point_rejected() {
        let data = RecordBuilder::new(1_700_000_000, 4, 1, 12)
            .pair("Sender", "sh")
            .pair("Message", "hi")
            .build();
        // Prefixes ending exactly after the header or after a whole pair are
        // complete records in their own right.
        let pair_one_end = BINARY_HEADER_LEN + 2 + "Sender".len() + 4 + "sh".len();
        let boundaries = [BINARY_HEADER_LEN, pair_one_end, data.len()];
        for cut in 0..=data.len() {
            let parsed = parse_binary_data(&data[..cut]);
            if boundaries.contains(&cut) {
                assert!(parsed.is_some(), "prefix of {cut} bytes is a whole record");
            } else {
                assert!(parsed.is_none(), "prefix of {cut} bytes should be rejected");
            }
        }
    }

    #[test]
    fn test_declared_length_past_end_reports_truncation() {
        let mut data = RecordBuilder::new(0, 5, 1, 1).build();
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(b"key");
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(b"short");
        assert!(matches!(
            decode_binary_record(&data),
            Err(DecodeError::Truncated { needed: 100, available: 5, .. })
        ));
    }

    #[test]
    fn test_invalid_nanoseconds_rejected() {
        let mut data = RecordBuilder::new(0, 5, 1, 1).build();
        data[8..12].copy_from_slice(&1_000_000_000u32.to_be_bytes());
        assert_eq!(
            decode_binary_record(&data),
            Err(DecodeError::InvalidNanoseconds {
                value: 1_000_000_000
            })
        );
    }

    #[test]
    fn test_key_overrides_header() {
        let data = RecordBuilder::new(0, 5, 1, 1)
            .pair("Level", "1")
            .pair("PID", "77")
            .build();
        let msg = parse_binary_data(&data).unwrap();
        assert_eq!(msg.level, Level::Alert);
        assert_eq!(msg.pid, 77);
    }

    #[test]
    fn test_empty_key_skipped() {
        let data = RecordBuilder::new(0, 5, 1, 1).pair("", "orphan").build();
        let msg = parse_binary_data(&data).unwrap();
        assert!(msg.extended_attributes().is_empty());
    }
}
