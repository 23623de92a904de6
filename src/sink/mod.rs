//! Output sinks for generated candidates.
//!
//! Every sink accepts one candidate at a time and appends it to its own
//! artifact. The driver holds them in a [`SinkSet`], which fixes the write
//! and finalize order and guarantees each sink is finalized exactly once.

pub mod markdown;
pub mod pdf;
pub mod text;

pub use markdown::MarkdownSink;
pub use pdf::{PdfLayout, PdfSink};
pub use text::TextSink;

use crate::error::{GenError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Buffer size for the line-oriented sinks.
pub(crate) const LINE_BUFFER_SIZE: usize = 64 * 1024;

/// Byte destination behind a sink.
///
/// Sinks hand the target one complete entry per `write_all`, so a failed
/// write never leaves half an entry in the buffer.
pub trait SinkTarget: Write {
    /// Force everything written so far to stable storage.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkTarget for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// A durable output target.
pub trait Sink {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Append one candidate to the artifact.
    fn write(&mut self, candidate: &str) -> Result<()>;

    /// Flush and close the artifact, leaving it readable. Called once.
    fn finalize(&mut self) -> Result<()>;
}

/// Built-in output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// One candidate per line.
    Text,
    /// Markdown header followed by one list item per candidate.
    Markdown,
    /// Paginated PDF, one candidate per line.
    Pdf,
}

impl SinkKind {
    /// Default set, in the fixed open/write/finalize order.
    pub const ALL: [SinkKind; 3] = [SinkKind::Text, SinkKind::Markdown, SinkKind::Pdf];

    /// Artifact name relative to the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SinkKind::Text => "output.txt",
            SinkKind::Markdown => "output.md",
            SinkKind::Pdf => "output.pdf",
        }
    }

    /// Create the artifact under `dir` and return its sink.
    pub fn open(&self, dir: &Path) -> Result<Box<dyn Sink>> {
        let path = dir.join(self.file_name());
        let open_err = |source: io::Error| GenError::SinkOpen {
            sink: self.name(),
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(open_err)?;
        let sink: Box<dyn Sink> = match self {
            SinkKind::Text => Box::new(TextSink::new(file)),
            SinkKind::Markdown => Box::new(MarkdownSink::new(file).map_err(open_err)?),
            SinkKind::Pdf => Box::new(PdfSink::new(file, PdfLayout::default()).map_err(open_err)?),
        };
        Ok(sink)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SinkKind::Text => "text",
            SinkKind::Markdown => "markdown",
            SinkKind::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SinkKind::Text => "txt",
            SinkKind::Markdown => "md",
            SinkKind::Pdf => "pdf",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(SinkKind::Text),
            "md" | "markdown" => Ok(SinkKind::Markdown),
            "pdf" => Ok(SinkKind::Pdf),
            _ => Err(format!(
                "unknown output format '{}' (expected txt, md or pdf)",
                s
            )),
        }
    }
}

/// Ordered collection of open sinks.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn Sink>>,
    finalized: bool,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open one sink per kind under `dir`, in order.
    ///
    /// If any sink fails to open, the ones already opened are finalized
    /// before the error is returned.
    pub fn open(dir: &Path, kinds: &[SinkKind]) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| GenError::SinkOpen {
            sink: "output",
            path: dir.to_path_buf(),
            source,
        })?;
        let mut set = SinkSet::new();
        for kind in kinds {
            match kind.open(dir) {
                Ok(sink) => {
                    tracing::debug!(sink = kind.name(), file = kind.file_name(), "opened sink");
                    set.push(sink);
                }
                Err(e) => {
                    for err in set.finalize() {
                        tracing::error!("{}", err);
                    }
                    return Err(e);
                }
            }
        }
        Ok(set)
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Write one candidate to every sink in order.
    ///
    /// A failing sink does not stop the others; every failure is returned.
    pub fn write_all(&mut self, candidate: &str) -> Vec<GenError> {
        let mut errors = Vec::new();
        for sink in &mut self.sinks {
            if let Err(e) = sink.write(candidate) {
                errors.push(e);
            }
        }
        errors
    }

    /// Finalize every sink once, in open order. Later calls do nothing.
    pub fn finalize(&mut self) -> Vec<GenError> {
        if self.finalized {
            return Vec::new();
        }
        self.finalized = true;
        let mut errors = Vec::new();
        for sink in &mut self.sinks {
            match sink.finalize() {
                Ok(()) => tracing::debug!(sink = sink.name(), "finalized sink"),
                Err(e) => errors.push(e),
            }
        }
        errors
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        if !self.finalized {
            for err in self.finalize() {
                tracing::error!("{}", err);
            }
        }
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.names())
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory target whose next write fails once after [`arm`].
    ///
    /// Clones share the same bytes, so a test can keep one to inspect what
    /// the sink actually delivered.
    ///
    /// [`arm`]: FlakyTarget::arm
    #[derive(Debug, Clone, Default)]
    pub struct FlakyTarget {
        data: Arc<Mutex<Vec<u8>>>,
        fail_next: Arc<AtomicBool>,
    }

    impl FlakyTarget {
        pub fn arm(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        pub fn contents(&self) -> Vec<u8> {
            self.data.lock().unwrap().clone()
        }
    }

    impl Write for FlakyTarget {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected failure"));
            }
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SinkTarget for FlakyTarget {}

    /// Shared record of what a [`RecordingSink`] saw.
    #[derive(Debug, Default)]
    pub struct Recording {
        pub lines: Vec<String>,
        pub finalized: usize,
        /// Global order of events across sinks sharing one log.
        pub events: Vec<String>,
    }

    /// In-memory sink that can be told to fail on specific candidates.
    pub struct RecordingSink {
        pub name: &'static str,
        pub log: Arc<Mutex<Recording>>,
        pub fail_on: Vec<String>,
        pub fail_finalize: bool,
    }

    impl RecordingSink {
        pub fn new(name: &'static str) -> (Self, Arc<Mutex<Recording>>) {
            let log = Arc::new(Mutex::new(Recording::default()));
            (
                Self {
                    name,
                    log: Arc::clone(&log),
                    fail_on: Vec::new(),
                    fail_finalize: false,
                },
                log,
            )
        }
    }

    impl Sink for RecordingSink {
        fn name(&self) -> &'static str {
            self.name
        }

        fn write(&mut self, candidate: &str) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            log.events.push(format!("{}:write:{}", self.name, candidate));
            if self.fail_on.iter().any(|c| c == candidate) {
                return Err(GenError::SinkWrite {
                    sink: self.name,
                    source: io::Error::new(io::ErrorKind::Other, "injected failure"),
                });
            }
            log.lines.push(candidate.to_string());
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            log.finalized += 1;
            log.events.push(format!("{}:finalize", self.name));
            if self.fail_finalize {
                return Err(GenError::SinkFinalize {
                    sink: self.name,
                    source: io::Error::new(io::ErrorKind::Other, "injected failure"),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_kind_parsing_and_names() {
        assert_eq!("txt".parse::<SinkKind>().unwrap(), SinkKind::Text);
        assert_eq!("Markdown".parse::<SinkKind>().unwrap(), SinkKind::Markdown);
        assert_eq!("pdf".parse::<SinkKind>().unwrap(), SinkKind::Pdf);
        assert!("docx".parse::<SinkKind>().is_err());
        assert_eq!(SinkKind::Markdown.file_name(), "output.md");
        assert_eq!(SinkKind::Pdf.to_string(), "pdf");
    }

    #[test]
    fn test_failure_does_not_skip_later_sinks() {
        let (mut a, a_log) = RecordingSink::new("a");
        a.fail_on = vec!["x".to_string()];
        let (b, b_log) = RecordingSink::new("b");

        let mut set = SinkSet::new();
        set.push(Box::new(a));
        set.push(Box::new(b));

        let errors = set.write_all("x");
        assert_eq!(errors.len(), 1);
        assert!(set.write_all("y").is_empty());

        assert_eq!(a_log.lock().unwrap().lines, vec!["y"]);
        assert_eq!(b_log.lock().unwrap().lines, vec!["x", "y"]);
    }

    #[test]
    fn test_finalize_once_in_order() {
        let (a, log) = RecordingSink::new("a");
        let b = RecordingSink {
            name: "b",
            log: std::sync::Arc::clone(&log),
            fail_on: Vec::new(),
            fail_finalize: true,
        };
        let mut set = SinkSet::new();
        set.push(Box::new(a));
        set.push(Box::new(b));

        let errors = set.finalize();
        assert_eq!(errors.len(), 1);
        assert!(set.finalize().is_empty());
        drop(set);

        let log = log.lock().unwrap();
        assert_eq!(log.finalized, 2);
        assert_eq!(log.events, vec!["a:finalize", "b:finalize"]);
    }

    #[test]
    fn test_drop_finalizes_unfinished_set() {
        let (a, log) = RecordingSink::new("a");
        {
            let mut set = SinkSet::new();
            set.push(Box::new(a));
            set.write_all("q");
        }
        assert_eq!(log.lock().unwrap().finalized, 1);
    }

    #[test]
    fn test_open_creates_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = SinkSet::open(dir.path(), &SinkKind::ALL).unwrap();
        assert_eq!(set.names(), vec!["text", "markdown", "pdf"]);
        assert!(set.write_all("ab").is_empty());
        assert!(set.finalize().is_empty());

        for kind in SinkKind::ALL {
            assert!(dir.path().join(kind.file_name()).exists());
        }
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let mut set = SinkSet::open(&nested, &[SinkKind::Text]).unwrap();
        assert!(set.finalize().is_empty());
        assert!(nested.join("output.txt").exists());
    }

    #[test]
    fn test_open_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let target = blocker.join("out");
        match SinkSet::open(&target, &[SinkKind::Text]) {
            Err(GenError::SinkOpen { path, .. }) => assert_eq!(path, target),
            other => panic!("expected SinkOpen, got {:?}", other),
        }
    }
}
