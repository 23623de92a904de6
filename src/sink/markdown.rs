//! Markdown list output.

use super::text::{close, closed};
use super::{Sink, SinkTarget, LINE_BUFFER_SIZE};
use crate::error::{GenError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

const NAME: &str = "markdown";

/// Header written once, before the first entry.
pub const HEADER: &str = "# OmniGen Output\n\n";

/// Writes a fixed header, then one `- candidate` item per line.
pub struct MarkdownSink<W: SinkTarget = File> {
    writer: Option<BufWriter<W>>,
    /// Scratch holding the complete list item being written.
    entry: Vec<u8>,
}

impl<W: SinkTarget> MarkdownSink<W> {
    /// Wrap `target` and write the header.
    pub fn new(target: W) -> io::Result<Self> {
        Self::with_capacity(LINE_BUFFER_SIZE, target)
    }

    pub fn with_capacity(capacity: usize, target: W) -> io::Result<Self> {
        let mut writer = BufWriter::with_capacity(capacity, target);
        writer.write_all(HEADER.as_bytes())?;
        Ok(Self {
            writer: Some(writer),
            entry: Vec::with_capacity(64),
        })
    }
}

impl<W: SinkTarget> Sink for MarkdownSink<W> {
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn write(&mut self, candidate: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| closed(NAME))?;
        self.entry.clear();
        self.entry.extend_from_slice(b"- ");
        self.entry.extend_from_slice(candidate.as_bytes());
        self.entry.push(b'\n');
        writer
            .write_all(&self.entry)
            .map_err(|source| GenError::SinkWrite { sink: NAME, source })
    }

    fn finalize(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => close(NAME, writer),
            None => Ok(()),
        }
    }
}
