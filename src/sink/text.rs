//! Plain line-delimited output.

use super::{Sink, SinkTarget, LINE_BUFFER_SIZE};
use crate::error::{GenError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};

const NAME: &str = "text";

/// Writes one candidate per line.
pub struct TextSink<W: SinkTarget = File> {
    writer: Option<BufWriter<W>>,
    /// Scratch for the entry being written.
    line: Vec<u8>,
}

impl<W: SinkTarget> TextSink<W> {
    pub fn new(target: W) -> Self {
        Self::with_capacity(LINE_BUFFER_SIZE, target)
    }

    pub fn with_capacity(capacity: usize, target: W) -> Self {
        Self {
            writer: Some(BufWriter::with_capacity(capacity, target)),
            line: Vec::with_capacity(64),
        }
    }
}

impl<W: SinkTarget> Sink for TextSink<W> {
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn write(&mut self, candidate: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| closed(NAME))?;
        self.line.clear();
        self.line.extend_from_slice(candidate.as_bytes());
        self.line.push(b'\n');
        writer
            .write_all(&self.line)
            .map_err(|source| GenError::SinkWrite { sink: NAME, source })
    }

    fn finalize(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => close(NAME, writer),
            None => Ok(()),
        }
    }
}

/// Error for writes after finalize.
pub(super) fn closed(sink: &'static str) -> GenError {
    GenError::SinkWrite {
        sink,
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink already finalized"),
    }
}

/// Flush the buffer and force the target to stable storage.
pub(super) fn close<W: SinkTarget>(sink: &'static str, writer: BufWriter<W>) -> Result<()> {
    let mut target = writer
        .into_inner()
        .map_err(|e| GenError::SinkFinalize {
            sink,
            source: e.into_error(),
        })?;
    target
        .sync()
        .map_err(|source| GenError::SinkFinalize { sink, source })
}
