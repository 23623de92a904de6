//! Run driver: the generation loop.
//!
//! The driver pulls candidates from the [`Enumerator`], fans each one out to
//! every sink, reports progress, re-checks free space at a fixed cadence and
//! polls the [`CancellationFlag`] between candidates. Whatever ends the run,
//! every sink that was opened is finalized exactly once, in open order.
//!
//! ```text
//! Idle --preflight ok, sinks open--> Running --exhausted--> Completed
//!   |                                   |----flag set----> Cancelled
//!   +--preflight/open error--> Failed <-+--fatal error
//! ```

use crate::cancel::CancellationFlag;
use crate::config::{total_candidates, RunConfig, WriteErrorPolicy};
use crate::enumerate::Enumerator;
use crate::error::{GenError, Result};
use crate::guard::ResourceGuard;
use crate::sink::SinkSet;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Cancelled | RunPhase::Failed
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Completed => "completed",
            RunPhase::Cancelled => "cancelled",
            RunPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Counters owned and mutated only by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Candidates emitted so far.
    pub count: u64,
    pub cancelled: bool,
    /// Length of the most recently emitted candidate.
    pub current_length: usize,
}

/// Receiver of progress counts and status lines.
pub trait ProgressReporter {
    /// Called every `progress_interval` candidates with the running count.
    fn progress(&mut self, count: u64);

    /// Human-readable status line ("Finishing up...", "Done.").
    fn status(&mut self, _line: &str) {}
}

/// Writes bare counts and status lines to stdout, flushing each one so a
/// monitor reading the pipe sees them immediately.
#[derive(Default)]
pub struct StdoutProgress {
    itoa_buf: itoa::Buffer,
}

impl StdoutProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(line: &[u8]) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle
            .write_all(line)
            .and_then(|()| handle.write_all(b"\n"))
            .and_then(|()| handle.flush())
        {
            tracing::warn!("progress output failed: {}", e);
        }
    }
}

impl ProgressReporter for StdoutProgress {
    fn progress(&mut self, count: u64) {
        Self::emit(self.itoa_buf.format(count).as_bytes());
    }

    fn status(&mut self, line: &str) {
        Self::emit(line.as_bytes());
    }
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    pub phase: RunPhase,
    pub state: RunState,
    /// Individual sink write failures seen during the run.
    pub sink_failures: u64,
    /// Size of the full enumeration, if representable.
    pub total: Option<u128>,
    pub elapsed: Duration,
    /// The error that failed the run.
    pub error: Option<GenError>,
}

impl RunReport {
    /// Process exit status: zero for a clean completion or cancellation.
    pub fn exit_code(&self) -> i32 {
        match (&self.error, self.phase) {
            (Some(e), _) => e.exit_code(),
            (None, RunPhase::Failed) => 3,
            (None, _) if self.sink_failures > 0 => 3,
            (None, _) => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} candidates", self.phase, self.state.count)?;
        if let Some(total) = self.total {
            write!(f, " of {}", total)?;
        }
        write!(f, " ({:.1}s)", self.elapsed.as_secs_f64())?;
        if self.sink_failures > 0 {
            write!(f, ", {} sink write failures", self.sink_failures)?;
        }
        Ok(())
    }
}

/// Drives one generation run.
pub struct RunDriver {
    config: RunConfig,
    guard: ResourceGuard,
    cancel: CancellationFlag,
    phase: RunPhase,
    state: RunState,
    sink_failures: u64,
}

impl RunDriver {
    pub fn new(config: RunConfig, guard: ResourceGuard, cancel: CancellationFlag) -> Self {
        Self {
            config,
            guard,
            cancel,
            phase: RunPhase::Idle,
            state: RunState::default(),
            sink_failures: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run with the file sinks named in the configuration.
    pub fn run(&mut self, progress: &mut dyn ProgressReporter) -> RunReport {
        let dir = self.config.output_dir.clone();
        let kinds = self.config.sinks.clone();
        self.run_with_sinks(progress, move || SinkSet::open(&dir, &kinds))
    }

    /// Run with sinks produced by `open`, which is only called once the
    /// configuration and the pre-flight disk check have passed.
    ///
    /// Every call starts from a fresh count; nothing carries over from an
    /// earlier run on the same driver except the cancellation flag.
    pub fn run_with_sinks<F>(&mut self, progress: &mut dyn ProgressReporter, open: F) -> RunReport
    where
        F: FnOnce() -> Result<SinkSet>,
    {
        let start = Instant::now();
        self.phase = RunPhase::Idle;
        self.state = RunState::default();
        self.sink_failures = 0;
        let total = total_candidates(self.config.charset.len(), self.config.lengths);

        if let Err(e) = self.preflight() {
            self.phase = RunPhase::Failed;
            return self.report(start, total, Some(e));
        }

        let mut sinks = match open() {
            Ok(sinks) => sinks,
            Err(e) => {
                self.phase = RunPhase::Failed;
                return self.report(start, total, Some(e));
            }
        };

        self.phase = RunPhase::Running;
        tracing::info!(
            sinks = ?sinks.names(),
            total = ?total,
            "generation started"
        );

        let mut fatal = self.generate(&mut sinks, progress);

        progress.status("Finishing up...");
        let finalize_errors = sinks.finalize();
        for e in &finalize_errors {
            tracing::error!("{}", e);
        }
        if let Some(first) = finalize_errors.into_iter().next() {
            self.phase = RunPhase::Failed;
            fatal.get_or_insert(first);
        }
        progress.status("Done.");

        tracing::info!(
            phase = %self.phase,
            count = self.state.count,
            "generation finished"
        );
        self.report(start, total, fatal)
    }

    /// Idle-phase checks. Nothing is created on disk if these fail.
    fn preflight(&mut self) -> Result<()> {
        self.config.validate()?;
        self.guard.check(self.config.preflight_min_mb)
    }

    /// The Running phase. Returns the fatal error, if one ended the run.
    fn generate(
        &mut self,
        sinks: &mut SinkSet,
        progress: &mut dyn ProgressReporter,
    ) -> Option<GenError> {
        let enumerator = Enumerator::new(&self.config.charset, self.config.lengths);
        let mut candidates = enumerator.produce();
        let mut last_length = None;

        loop {
            // Only safe point for cancellation: between whole candidates.
            if self.cancel.is_cancelled() {
                tracing::info!(count = self.state.count, "cancellation observed");
                self.state.cancelled = true;
                self.phase = RunPhase::Cancelled;
                return None;
            }

            let Some(candidate) = candidates.next_candidate() else {
                self.phase = RunPhase::Completed;
                return None;
            };

            let errors = sinks.write_all(candidate);
            self.state.count += 1;
            self.state.current_length = candidates.current_length();

            if last_length != Some(self.state.current_length) {
                tracing::debug!(length = self.state.current_length, "enumerating length");
                last_length = Some(self.state.current_length);
            }

            if !errors.is_empty() {
                self.sink_failures += errors.len() as u64;
                for e in &errors {
                    tracing::error!(count = self.state.count, "{}", e);
                }
                if self.config.on_write_error == WriteErrorPolicy::Abort {
                    self.phase = RunPhase::Failed;
                    return errors.into_iter().next();
                }
            }

            if self.state.count % self.config.progress_interval == 0 {
                progress.progress(self.state.count);
            }

            if self.state.count % self.config.guard_interval == 0 {
                if let Err(e) = self.guard.check(self.config.periodic_min_mb) {
                    tracing::error!(count = self.state.count, "{}", e);
                    self.phase = RunPhase::Failed;
                    return Some(e);
                }
            }
        }
    }

    fn report(&self, start: Instant, total: Option<u128>, error: Option<GenError>) -> RunReport {
        RunReport {
            phase: self.phase,
            state: self.state,
            sink_failures: self.sink_failures,
            total,
            elapsed: start.elapsed(),
            error,
        }
    }
}
