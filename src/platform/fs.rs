// ASLSleuth - platform/fs.rs
//
// Capture file and standard-input reading. Delivers complete byte buffers to
// the decoding pipeline; nothing here interprets the bytes.

use crate::util::constants::LARGE_FILE_THRESHOLD;
use memmap2::Mmap;
use std::io::{self, Read};
use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Bytes of one input source, either owned or memory-mapped.
pub enum InputBuffer {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for InputBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            InputBuffer::Owned(bytes) => bytes,
            InputBuffer::Mapped(map) => map,
        }
    }
}

impl std::fmt::Debug for InputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            InputBuffer::Owned(_) => "Owned",
            InputBuffer::Mapped(_) => "Mapped",
        };
        f.debug_struct("InputBuffer")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

/// Read a capture file.
///
/// Files above `LARGE_FILE_THRESHOLD` are memory-mapped; smaller files are
/// read into memory, retrying transient I/O errors with capped backoff.
pub fn read_input_file(path: &Path) -> io::Result<InputBuffer> {
    let size = std::fs::metadata(path)?.len();
    if size >= LARGE_FILE_THRESHOLD {
        tracing::debug!(file = %path.display(), size, "Memory-mapping large capture file");
        map_file(path).map(InputBuffer::Mapped)
    } else {
        read_small_file_with_retry(path).map(InputBuffer::Owned)
    }
}

/// Read all of standard input.
pub fn read_stdin() -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    io::stdin().lock().read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn map_file(path: &Path) -> io::Result<Mmap> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the map is read-only and never mutated. External modification
    // of the file during the map's lifetime is an accepted risk for a tool
    // reading already-written captures.
    unsafe { Mmap::map(&file) }
}

fn read_small_file_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
