// ASLSleuth - tests/e2e_pipeline.rs
//
// End-to-end tests for the decode -> filter -> render pipeline.
//
// These tests read real capture fixtures from disk (BSD device syslog,
// os_log text, and a framed syslog_relay capture containing a binary ASL
// record) and drive them through the public library surface and the
// `aslsleuth` binary. No mocks.

use aslsleuth::app::export::{export_csv, export_json};
use aslsleuth::app::pipeline::{decode, detect_format, InputFormat, Pipeline};
use aslsleuth::core::codes::{Facility, Level};
use aslsleuth::core::filter::FilterCriteria;
use aslsleuth::core::formatter::{FormatOptions, Formatter, Style};
use aslsleuth::core::parser::{parse_syslog_relay_data, parse_text_lines};
use aslsleuth::platform::fs::read_input_file;
use aslsleuth::util::constants::ID_UNSET;
use std::path::{Path, PathBuf};
use std::process::Command;

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Vec<u8> {
    read_input_file(&fixture(name))
        .unwrap_or_else(|e| panic!("cannot read fixture {name}: {e}"))
        .to_vec()
}

/// Formatter with a year-free timestamp: BSD lines carry no year, so the
/// parsed year is whatever year the test runs in.
fn yearless(style: Style) -> Formatter {
    Formatter::new(&FormatOptions {
        style,
        timestamp_format: Some("%m-%d %H:%M:%S".to_string()),
        ..Default::default()
    })
}

// =============================================================================
// BSD device syslog
// =============================================================================

#[test]
fn e2e_device_syslog_parses_all_valid_lines() {
    let data = read_fixture("device_syslog.log");
    assert_eq!(detect_format(&data), InputFormat::Text);

    let result = decode(&data, InputFormat::Auto);
    assert_eq!(result.messages.len(), 5);
    assert_eq!(result.lines_processed, 6);
    assert_eq!(result.lines_skipped, 1);

    let kernel = &result.messages[0];
    assert_eq!(kernel.sender.as_deref(), Some("kernel"));
    assert_eq!(kernel.pid, 0);
    assert_eq!(kernel.level, Level::Notice);
    assert_eq!(kernel.uid, ID_UNSET);

    let springboard = &result.messages[1];
    assert_eq!(springboard.sender.as_deref(), Some("SpringBoard"));
    assert_eq!(springboard.value("library").as_deref(), Some("FrontBoard"));
    assert_eq!(springboard.message, "[conn42] scene update rejected");

    let wifid = &result.messages[3];
    assert_eq!(wifid.level, Level::Debug);
    assert_eq!(wifid.facility, Facility::Daemon);
    assert_eq!(wifid.message, "scan complete, 12 networks");
}

#[test]
fn e2e_device_syslog_standard_render() {
    let data = read_fixture("device_syslog.log");
    let messages = decode(&data, InputFormat::Text).messages;
    let pipeline = Pipeline::new(yearless(Style::Standard), FilterCriteria::important());

    assert_eq!(
        pipeline.render(&messages),
        "10-18 09:14:03 Johns-iPhone SpringBoard[58] <Error>: [conn42] scene update rejected\n\
         10-18 09:14:03 Johns-iPhone locationd[80] <Warning>: weak GPS signal\n\
         10-08 09:14:05 Johns-iPhone CommCenter[91] <Critical>: baseband reset\n"
    );
}

#[test]
fn e2e_idevicesyslog_style_matches_bridge_output() {
    let text = String::from_utf8(read_fixture("device_syslog.log")).unwrap();
    let messages = parse_text_lines(&text);
    let formatter = Formatter::with_style(Style::Idevicesyslog);
    let rendered = formatter.format_messages(&messages);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[2], "Oct 18 09:14:03 Johns-iPhone locationd[80]: weak GPS signal");
    assert_eq!(lines[4], "Oct  8 09:14:05 Johns-iPhone CommCenter[91]: baseband reset");
}

// =============================================================================
// os_log text
// =============================================================================

#[test]
fn e2e_os_log_sample() {
    let data = read_fixture("oslog_sample.log");
    let result = decode(&data, InputFormat::OsLog);
    assert_eq!(result.messages.len(), 4);
    assert_eq!(result.lines_skipped, 1);

    let levels: Vec<Level> = result.messages.iter().map(|m| m.level).collect();
    assert_eq!(
        levels,
        vec![Level::Error, Level::Notice, Level::Debug, Level::Critical]
    );

    let formatter = Formatter::with_style(Style::Verbose);
    let block = formatter.format_message(&result.messages[0]);
    assert_eq!(
        block,
        "Timestamp: 2024-10-18 16:14:02.123456\n\
         Sender: com.apple.network\n\
         Level: <Error> (3)\n\
         Facility: user (1)\n\
         Subsystem: com.apple.network\n\
         Category: connection\n\
         Type: Error\n\
         Message: nw_connection reset by peer"
    );
}

// =============================================================================
// syslog_relay capture
// =============================================================================

#[test]
fn e2e_relay_capture_decodes_in_envelope_order() {
    let data = read_fixture("relay_capture.bin");
    assert_eq!(detect_format(&data), InputFormat::Relay);

    let messages = decode(&data, InputFormat::Auto).messages;
    assert_eq!(messages.len(), 3);

    assert_eq!(messages[0].sender.as_deref(), Some("backboardd"));
    assert_eq!(messages[0].message, "display on");

    let configd = &messages[1];
    assert_eq!(configd.sender.as_deref(), Some("configd"));
    assert_eq!(configd.host.as_deref(), Some("Johns-iPad"));
    assert_eq!(configd.level, Level::Error);
    assert_eq!(configd.facility, Facility::Daemon);
    assert_eq!((configd.pid, configd.uid, configd.gid), (88, 0, 0));
    assert_eq!(configd.value("Interface").as_deref(), Some("en0"));
    assert_eq!(
        configd.timestamp.to_rfc3339(),
        "2024-10-18T09:14:02.500+00:00"
    );

    assert_eq!(messages[2].subsystem.as_deref(), Some("com.apple.xpc"));
    assert_eq!(messages[2].level, Level::Info);

    let first = parse_syslog_relay_data(&data).expect("first frame decodes");
    assert_eq!(first.sender.as_deref(), Some("backboardd"));
}

#[test]
fn e2e_relay_capture_exports() {
    let data = read_fixture("relay_capture.bin");
    let messages = decode(&data, InputFormat::Relay).messages;
    let pipeline = Pipeline::new(
        Formatter::default(),
        FilterCriteria {
            sender_substring: Some("CONFIG".to_string()),
            ..Default::default()
        },
    );
    let selected = pipeline.select(&messages);
    assert_eq!(selected.len(), 1);

    let mut csv_buf = Vec::new();
    export_csv(&selected, &mut csv_buf, Path::new("out.csv")).unwrap();
    let csv_text = String::from_utf8(csv_buf).unwrap();
    assert_eq!(csv_text.lines().count(), 2);
    assert!(csv_text.contains("network reachability changed"));

    let mut json_buf = Vec::new();
    export_json(&selected, &mut json_buf, Path::new("out.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json_buf).unwrap();
    assert_eq!(value[0]["extendedAttributes"]["Interface"], "en0");
    assert_eq!(
        value[0]["subsystem"],
        "com.apple.SystemConfiguration"
    );
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn e2e_cli_renders_fixture() {
    let output = Command::new(env!("CARGO_BIN_EXE_aslsleuth"))
        .arg(fixture("oslog_sample.log"))
        .args(["--style", "compact", "--important"])
        .arg("--config")
        .arg(fixture("empty_config.toml"))
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "com.apple.network ERR: nw_connection reset by peer\n\
         com.apple.kernel CRIT: watchdog timeout\n"
    );
}

#[test]
fn e2e_cli_missing_input_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_aslsleuth"))
        .arg(fixture("does_not_exist.log"))
        .arg("--config")
        .arg(fixture("empty_config.toml"))
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.log"));
}
