//! Paginated PDF output.
//!
//! The document is streamed: each page is buffered only until it is full,
//! then its content stream and page object are written out and the buffer
//! is reused. Only object offsets and page ids stay in memory. The page
//! tree, font, catalog and cross-reference table are written at finalize.
//!
//! A full page is committed when the next line arrives (or at finalize),
//! as one contiguous write. If that write fails, the page stays buffered
//! unchanged and the commit is retried on the next line.
//!
//! Text uses the standard Courier font, so nothing needs embedding.

use super::text::closed;
use super::{Sink, SinkTarget};
use crate::error::{GenError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

const NAME: &str = "pdf";

/// Buffer size for the document writer.
const BUFFER_SIZE: usize = 256 * 1024;

const CATALOG_ID: u32 = 1;
const PAGES_ID: u32 = 2;
const FONT_ID: u32 = 3;
const FIRST_FREE_ID: u32 = 4;

/// Largest offset a cross-reference entry can hold (10 decimal digits).
pub const MAX_XREF_OFFSET: u64 = 9_999_999_999;

/// Upper bound on a committed page's bytes beyond its text.
const PAGE_OVERHEAD: u64 = 512;
/// Upper bound on the font, page tree and catalog, before the kids list.
const TAIL_RESERVE: u64 = 256;
/// Upper bound on one `N 0 R` entry in the kids list.
const TAIL_PER_PAGE: u64 = 16;

const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Page geometry and text settings, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub font_size: f64,
    pub leading: f64,
}

impl Default for PdfLayout {
    /// US Letter, 40pt margin, Courier 10 on 12.
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 40.0,
            font_size: 10.0,
            leading: 12.0,
        }
    }
}

impl PdfLayout {
    /// Baseline of the first line on a page.
    #[inline]
    pub fn top(&self) -> f64 {
        self.page_height - self.margin
    }
}

/// Streams candidates into a multi-page PDF, one per line.
pub struct PdfSink<W: SinkTarget = File> {
    out: Option<BufWriter<W>>,
    /// Bytes handed to `out` so far, which is the offset of the next object.
    written: u64,
    /// No object may start past this offset.
    offset_limit: u64,
    layout: PdfLayout,
    /// Content stream of the page being filled, without the closing `ET`.
    page: Vec<u8>,
    page_open: bool,
    /// Baseline of the next line on the current page.
    cursor_y: f64,
    /// Bytes of the next contiguous write.
    chunk: Vec<u8>,
    /// Offsets of objects from `FIRST_FREE_ID` on, indexed by id - FIRST_FREE_ID.
    offsets: Vec<u64>,
    page_ids: Vec<u32>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: SinkTarget> PdfSink<W> {
    /// Wrap `target` and write the document header.
    pub fn new(target: W, layout: PdfLayout) -> io::Result<Self> {
        Self::with_capacity(BUFFER_SIZE, target, layout)
    }

    pub fn with_capacity(capacity: usize, target: W, layout: PdfLayout) -> io::Result<Self> {
        let mut out = BufWriter::with_capacity(capacity, target);
        out.write_all(HEADER)?;
        Ok(Self {
            out: Some(out),
            written: HEADER.len() as u64,
            offset_limit: MAX_XREF_OFFSET,
            layout,
            page: Vec::with_capacity(8 * 1024),
            page_open: false,
            cursor_y: layout.top(),
            chunk: Vec::with_capacity(16 * 1024),
            offsets: Vec::new(),
            page_ids: Vec::new(),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        })
    }

    /// Pages written out so far.
    pub fn committed_pages(&self) -> usize {
        self.page_ids.len()
    }

    /// Start a fresh page buffer with font and position reset.
    fn begin_page(&mut self) {
        self.page.clear();
        self.cursor_y = self.layout.top();
        self.page.extend_from_slice(b"BT\n/F1 ");
        self.page
            .extend_from_slice(self.ryu_buf.format(self.layout.font_size).as_bytes());
        self.page.extend_from_slice(b" Tf\n");
        self.page
            .extend_from_slice(self.ryu_buf.format(self.layout.leading).as_bytes());
        self.page.extend_from_slice(b" TL\n");
        self.page
            .extend_from_slice(self.ryu_buf.format(self.layout.margin).as_bytes());
        self.page.push(b' ');
        self.page
            .extend_from_slice(self.ryu_buf.format(self.cursor_y).as_bytes());
        self.page.extend_from_slice(b" Td\n");
        self.page_open = true;
    }

    fn push_line(&mut self, line: &str) {
        self.page.push(b'(');
        escape_into(&mut self.page, line);
        self.page.extend_from_slice(b") Tj T*\n");
        self.cursor_y -= self.layout.leading;
    }

    #[inline]
    fn page_full(&self) -> bool {
        self.page_open && self.cursor_y < self.layout.margin
    }

    /// Id of the object `ahead` places after the next free one.
    fn next_id(&self, ahead: usize) -> io::Result<u32> {
        self.offsets
            .len()
            .checked_add(ahead)
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|n| FIRST_FREE_ID.checked_add(n))
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "PDF object ids exhausted"))
    }

    /// Offset the catalog would start at if the open page were committed
    /// now, rounded up.
    fn projected_end(&self) -> u64 {
        let pages = self.page_ids.len() as u64 + 1;
        self.written
            + self.page.len() as u64
            + PAGE_OVERHEAD
            + TAIL_RESERVE
            + TAIL_PER_PAGE * pages
    }

    /// Write the buffered page as a content stream plus page object.
    ///
    /// Nothing changes unless the whole page reaches the writer.
    fn commit_page(&mut self) -> io::Result<()> {
        let content_id = self.next_id(0)?;
        let page_id = self.next_id(1)?;

        self.chunk.clear();
        write!(
            self.chunk,
            "{} 0 obj\n<< /Length {} >>\nstream\n",
            content_id,
            self.page.len() + 3
        )?;
        self.chunk.extend_from_slice(&self.page);
        self.chunk.extend_from_slice(b"ET\n\nendstream\nendobj\n");

        let content_off = self.written;
        let page_off = self.written + self.chunk.len() as u64;
        check_offset(page_off, self.offset_limit)?;
        write!(
            self.chunk,
            "{} 0 obj\n<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} ",
            page_id,
            PAGES_ID,
            self.ryu_buf.format(self.layout.page_width)
        )?;
        write!(
            self.chunk,
            "{}] /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            self.ryu_buf.format(self.layout.page_height),
            FONT_ID,
            content_id
        )?;

        let out = self.out.as_mut().ok_or_else(document_closed)?;
        out.write_all(&self.chunk)?;

        self.written += self.chunk.len() as u64;
        self.offsets.push(content_off);
        self.offsets.push(page_off);
        self.page_ids.push(page_id);
        self.page.clear();
        self.page_open = false;
        Ok(())
    }

    /// Write the shared objects, xref table and trailer.
    fn finish_document(&mut self) -> io::Result<()> {
        if self.page_open || self.page_ids.is_empty() {
            if !self.page_open {
                self.begin_page();
            }
            self.commit_page()?;
        }

        self.chunk.clear();
        let font_off = self.written;
        write!(
            self.chunk,
            "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>\nendobj\n",
            FONT_ID
        )?;

        let pages_off = self.written + self.chunk.len() as u64;
        write!(self.chunk, "{} 0 obj\n<< /Type /Pages /Kids [", PAGES_ID)?;
        for (i, id) in self.page_ids.iter().enumerate() {
            if i > 0 {
                self.chunk.push(b' ');
            }
            self.chunk
                .extend_from_slice(self.itoa_buf.format(*id).as_bytes());
            self.chunk.extend_from_slice(b" 0 R");
        }
        write!(self.chunk, "] /Count {} >>\nendobj\n", self.page_ids.len())?;

        let catalog_off = self.written + self.chunk.len() as u64;
        check_offset(catalog_off, self.offset_limit)?;
        write!(
            self.chunk,
            "{} 0 obj\n<< /Type /Catalog /Pages {} 0 R >>\nendobj\n",
            CATALOG_ID, PAGES_ID
        )?;

        let xref_off = self.written + self.chunk.len() as u64;
        let size = FIRST_FREE_ID as usize + self.offsets.len();
        write!(self.chunk, "xref\n0 {}\n0000000000 65535 f\r\n", size)?;
        for off in [catalog_off, pages_off, font_off]
            .iter()
            .chain(self.offsets.iter())
        {
            check_offset(*off, MAX_XREF_OFFSET)?;
            write!(self.chunk, "{:010} 00000 n\r\n", off)?;
        }
        write!(
            self.chunk,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, CATALOG_ID, xref_off
        )?;

        let out = self.out.as_mut().ok_or_else(document_closed)?;
        out.write_all(&self.chunk)?;
        self.written += self.chunk.len() as u64;

        let Some(out) = self.out.take() else {
            return Ok(());
        };
        let mut target = out.into_inner().map_err(|e| e.into_error())?;
        target.sync()
    }
}

impl<W: SinkTarget> Sink for PdfSink<W> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write(&mut self, candidate: &str) -> Result<()> {
        if self.out.is_none() {
            return Err(closed(NAME));
        }
        if self.page_full() {
            self.commit_page()
                .map_err(|source| GenError::SinkWrite { sink: NAME, source })?;
        }
        let fresh = !self.page_open;
        if fresh {
            self.begin_page();
        }
        let mark = self.page.len();
        self.push_line(candidate);

        let end = self.projected_end();
        if end > self.offset_limit {
            if fresh {
                self.page.clear();
                self.page_open = false;
            } else {
                self.page.truncate(mark);
                self.cursor_y += self.layout.leading;
            }
            return Err(GenError::SinkWrite {
                sink: NAME,
                source: offset_overflow(end),
            });
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.out.is_none() {
            return Ok(());
        }
        self.finish_document()
            .map_err(|source| GenError::SinkFinalize { sink: NAME, source })
    }
}

fn document_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "document closed")
}

fn offset_overflow(offset: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!(
            "offset {} does not fit a 10-digit cross-reference entry",
            offset
        ),
    )
}

/// Refuse an object start that the xref table could not record.
fn check_offset(offset: u64, limit: u64) -> io::Result<()> {
    if offset > limit {
        return Err(offset_overflow(offset));
    }
    Ok(())
}

/// Append `s` as the body of a PDF literal string.
///
/// Delimiters and backslash are escaped, Latin-1 characters outside printable
/// ASCII become octal escapes, anything wider becomes `?`.
fn escape_into(buf: &mut Vec<u8>, s: &str) {
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                buf.push(b'\\');
                buf.push(c as u8);
            }
            ' '..='~' => buf.push(c as u8),
            _ if (c as u32) <= 0xFF => {
                let b = c as u32;
                buf.push(b'\\');
                buf.push(b'0' + ((b >> 6) & 0o7) as u8);
                buf.push(b'0' + ((b >> 3) & 0o7) as u8);
                buf.push(b'0' + (b & 0o7) as u8);
            }
            _ => buf.push(b'?'),
        }
    }
}
