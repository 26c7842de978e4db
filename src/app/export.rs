// ASLSleuth - app/export.rs
//
// Text, CSV and JSON export of filtered messages.
// Writers accept any `Write`; `export_to_file` adds the file handling.

use crate::core::formatter::Formatter;
use crate::core::model::{Field, Message};
use crate::util::constants::{EXPORT_FILE_PREFIX, EXPORT_FILE_TIMESTAMP_FORMAT};
use crate::util::error::ExportError;
use chrono::NaiveDateTime;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Formatter output, one rendered message per line (or block).
    Text,
    /// One row per message, one column per first-class field.
    Csv,
    /// Pretty-printed array of message objects.
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "unknown export format '{other}' (expected text, csv or json)"
            )),
        }
    }
}

/// `syslog_YYYYMMDD_HHMMSS.<ext>` for the given local time.
pub fn default_export_file_name(format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}_{}.{}",
        at.format(EXPORT_FILE_TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Export rendered text.
pub fn export_text<W: Write>(
    messages: &[&Message],
    formatter: &Formatter,
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let io_err = |source| ExportError::Io {
        path: export_path.to_path_buf(),
        source,
    };
    for msg in messages {
        writeln!(writer, "{}", formatter.format_message(msg)).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(messages.len())
}

/// Export to CSV.
///
/// Columns are the first-class field keys in canonical order followed by
/// `attributes` (`key=value` pairs joined with `; `). Unset fields are empty.
pub fn export_csv<W: Write>(
    messages: &[&Message],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: export_path.to_path_buf(),
        source,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = Field::ALL.iter().map(|f| f.key()).collect();
    header.push("attributes");
    csv_writer.write_record(&header).map_err(csv_err)?;

    for msg in messages {
        let mut row: Vec<String> = Field::ALL
            .iter()
            .map(|f| msg.field_value(*f).unwrap_or_default())
            .collect();
        row.push(
            msg.extended_attributes()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        );
        csv_writer.write_record(&row).map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|source| ExportError::Io {
        path: export_path.to_path_buf(),
        source,
    })?;

    Ok(messages.len())
}

/// Export to JSON (array of objects).
pub fn export_json<W: Write>(
    messages: &[&Message],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(&mut writer, messages).map_err(|source| ExportError::Json {
        path: export_path.to_path_buf(),
        source,
    })?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|source| ExportError::Io {
            path: export_path.to_path_buf(),
            source,
        })?;
    Ok(messages.len())
}

/// Create `path` and export into it. Returns the number of messages written.
pub fn export_to_file(
    messages: &[&Message],
    format: ExportFormat,
    formatter: &Formatter,
    path: &Path,
) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    let writer = BufWriter::new(file);

    let count = match format {
        ExportFormat::Text => export_text(messages, formatter, writer, path)?,
        ExportFormat::Csv => export_csv(messages, writer, path)?,
        ExportFormat::Json => export_json(messages, writer, path)?,
    };

    tracing::info!(
        path = %path.display(),
        format = %format,
        count,
        "Export complete"
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codes::Level;
    use crate::core::formatter::Style;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_message(sender: &str, message: &str) -> Message {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap();
        let mut msg = Message::new(ts, message);
        msg.sender = Some(sender.to_string());
        msg.pid = 7;
        msg.level = Level::Error;
        msg
    }

    #[test]
    fn test_default_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 1)
            .unwrap();
        assert_eq!(
            default_export_file_name(ExportFormat::Csv, at),
            "syslog_20240309_080501.csv"
        );
        assert_eq!(
            default_export_file_name(ExportFormat::Text, at),
            "syslog_20240309_080501.txt"
        );
    }

    #[test]
    fn test_text_export() {
        let a = make_message("netd", "one");
        let b = make_message("configd", "two");
        let mut buf = Vec::new();
        let formatter = Formatter::with_style(Style::Compact);
        let count = export_text(&[&a, &b], &formatter, &mut buf, Path::new("out.txt")).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "netd ERR: one\nconfigd ERR: two\n"
        );
    }

    #[test]
    fn test_csv_export() {
        let mut a = make_message("netd", "link, down");
        a.set_value("Interface", "en0");
        let b = make_message("configd", "two");
        let mut buf = Vec::new();
        let count = export_csv(&[&a, &b], &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert!(lines
            .next()
            .unwrap()
            .starts_with("timestamp,host,sender,pid,uid,gid,level,facility,message"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-15T14:30:22Z,,netd,7,,,Error,user,\"link, down\""));
        assert!(first.ends_with("Interface=en0"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_json_export() {
        let a = make_message("netd", "Test message");
        let mut buf = Vec::new();
        let count = export_json(&[&a], &mut buf, Path::new("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["sender"], "netd");
        assert_eq!(value[0]["message"], "Test message");
        assert_eq!(value[0]["level"], "Error");
        assert_eq!(value[0]["facility"], "user");
        assert_eq!(value[0]["pid"], 7);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        let a = make_message("netd", "x");
        let count = export_to_file(&[&a], ExportFormat::Json, &Formatter::default(), &path).unwrap();
        assert_eq!(count, 1);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"netd\""));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.txt");
        let err = export_to_file(&[], ExportFormat::Text, &Formatter::default(), &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Text));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
