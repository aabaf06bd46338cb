use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::types::TranscriptEvent;
use crate::Result;

// ─── TranscriptReader ─────────────────────────────────────────────────────

/// Lazy, single-pass iterator over the events of a transcript snapshot.
///
/// Lines are read one at a time and parsed independently. A line that is
/// not valid UTF-8 or not a recognised record becomes
/// [`TranscriptEvent::Unparsed`]; reading always continues with the next
/// line. An I/O error mid-file ends the sequence early.
pub struct TranscriptReader<R = BufReader<File>> {
    source: Option<R>,
    pending: VecDeque<TranscriptEvent>,
    buf: Vec<u8>,
    line_no: usize,
}

impl TranscriptReader<BufReader<File>> {
    /// Open the transcript at `path`.
    ///
    /// Use [`read`] instead when a missing file should yield an empty
    /// sequence.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    /// A reader that yields nothing.
    pub fn empty() -> Self {
        TranscriptReader {
            source: None,
            pending: VecDeque::new(),
            buf: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> TranscriptReader<R> {
    pub fn from_reader(reader: R) -> Self {
        TranscriptReader {
            source: Some(reader),
            pending: VecDeque::new(),
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Read the next raw line. `None` on EOF or I/O error.
    fn next_line(&mut self) -> Option<String> {
        let source = self.source.as_mut()?;
        self.buf.clear();
        match source.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.source = None;
                None
            }
            Ok(_) => {
                self.line_no += 1;
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            }
            Err(e) => {
                tracing::warn!(line = self.line_no + 1, "transcript read stopped early: {e}");
                self.source = None;
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for TranscriptReader<R> {
    type Item = TranscriptEvent;

    fn next(&mut self) -> Option<TranscriptEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let line = self.next_line()?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.pending.extend(TranscriptEvent::from_line(trimmed));
        }
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Read the transcript at `path` as a sequence of events.
///
/// Transcripts are best-effort artifacts: a file that does not exist or
/// cannot be opened yields an empty sequence instead of an error.
pub fn read(path: &Path) -> TranscriptReader {
    match TranscriptReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!(path = %path.display(), "transcript unavailable: {e}");
            TranscriptReader::empty()
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
