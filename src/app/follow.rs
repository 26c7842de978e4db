// ASLSleuth - app/follow.rs
//
// Follow mode: streams a byte source (normally stdin fed by a device relay
// bridge) and renders each record as soon as it is complete.
//
// Reassembly: chunks are appended to a partial-record buffer; every '\n' or
// '\0' terminates a record. Bytes after the final terminator are an
// in-progress record and are carried to the next chunk. The buffer is
// bounded by MAX_PARTIAL_LINE_BYTES: a record that grows past it without a
// terminator is dropped whole (up to its terminator) with a warning and
// reading continues.

use crate::app::pipeline::Pipeline;
use crate::core::parser::parse_line;
use crate::util::constants::{FOLLOW_CHUNK_SIZE, MAX_PARTIAL_LINE_BYTES};
use crate::util::error::InputError;
use crate::util::logging::preview;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// Record reassembly
// =============================================================================

/// Splits a chunked byte stream into complete text records.
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// Bytes after the most recent terminator.
    partial: Vec<u8>,
    /// Fragments dropped for exceeding the partial-buffer bound.
    dropped: u64,
    /// Skipping the tail of an oversized record until its terminator.
    discarding: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every record it completes, in stream order.
    ///
    /// Records are decoded as lossy UTF-8 with a trailing '\r' removed.
    /// Blank records are not returned.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut records = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n' || *b == b'\0') {
            if self.discarding {
                self.discarding = false;
            } else {
                self.partial.extend_from_slice(&rest[..pos]);
                if let Some(record) = take_record(&mut self.partial) {
                    records.push(record);
                }
            }
            rest = &rest[pos + 1..];
        }

        if self.discarding {
            return records;
        }
        self.partial.extend_from_slice(rest);
        if self.partial.len() > MAX_PARTIAL_LINE_BYTES {
            tracing::warn!(
                bytes = self.partial.len(),
                limit = MAX_PARTIAL_LINE_BYTES,
                "Follow: record exceeds size limit without a terminator; discarding fragment"
            );
            self.partial.clear();
            self.dropped += 1;
            self.discarding = true;
        }

        records
    }

    /// Flush the unterminated remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        take_record(&mut self.partial)
    }

    /// Bytes currently held for an in-progress record.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Fragments dropped so far for exceeding the size bound.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

fn take_record(buf: &mut Vec<u8>) -> Option<String> {
    let text = String::from_utf8_lossy(buf).trim_end_matches('\r').to_string();
    buf.clear();
    (!text.trim().is_empty()).then_some(text)
}

// =============================================================================
// Follow loop
// =============================================================================

/// Counters reported when a follow session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowStats {
    /// Complete records read from the stream.
    pub records: u64,
    /// Records no grammar accepted.
    pub skipped: u64,
    /// Records that passed the filter and were written.
    pub written: u64,
}

/// Read `reader` until end of stream (or until `cancel` is set), rendering
/// each complete record through `pipeline` into `out`.
///
/// Output is flushed after every chunk so a downstream pager or `grep` sees
/// records as they arrive.
pub fn follow<R: Read, W: Write>(
    mut reader: R,
    mut out: W,
    pipeline: &Pipeline,
    cancel: &AtomicBool,
) -> Result<FollowStats, InputError> {
    let mut assembler = LineAssembler::new();
    let mut stats = FollowStats::default();
    let mut chunk = vec![0u8; FOLLOW_CHUNK_SIZE];

    tracing::info!("Follow started");

    loop {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!("Follow cancelled");
            break;
        }

        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(InputError::Stdin { source }),
        };

        for record in assembler.push(&chunk[..n]) {
            emit(&record, &mut out, pipeline, &mut stats)?;
        }
        out.flush().map_err(|source| InputError::Stdout { source })?;
    }

    if let Some(record) = assembler.finish() {
        emit(&record, &mut out, pipeline, &mut stats)?;
        out.flush().map_err(|source| InputError::Stdout { source })?;
    }

    tracing::info!(
        records = stats.records,
        skipped = stats.skipped,
        written = stats.written,
        dropped = assembler.dropped(),
        "Follow finished"
    );
    Ok(stats)
}

fn emit<W: Write>(
    record: &str,
    out: &mut W,
    pipeline: &Pipeline,
    stats: &mut FollowStats,
) -> Result<(), InputError> {
    stats.records += 1;
    let Some(msg) = parse_line(record) else {
        stats.skipped += 1;
        tracing::debug!(line = preview(record), "Follow: unparseable record");
        return Ok(());
    };
    if let Some(rendered) = pipeline.render_one(&msg) {
        writeln!(out, "{rendered}").map_err(|source| InputError::Stdout { source })?;
        stats.written += 1;
    }
    Ok(())
}
