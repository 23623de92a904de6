//! Run configuration for OmniGen.
//!
//! Everything a run needs is collected into a [`RunConfig`] that is validated
//! once, before any output is opened, and then owned by the driver. Nothing
//! here is global: two runs with different settings can coexist in one
//! process (the test suite relies on this).

use crate::error::{GenError, Result};
use crate::sink::SinkKind;
use std::path::PathBuf;

/// Free space required before any output is opened.
pub const DEFAULT_PREFLIGHT_MIN_MB: u64 = 500;

/// Free space required at every periodic re-check.
pub const DEFAULT_PERIODIC_MIN_MB: u64 = 100;

/// Progress is reported every this many candidates.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Free space is re-checked every this many candidates.
pub const DEFAULT_GUARD_INTERVAL: u64 = 100_000;

/// Ordered alphabet used to build candidates.
///
/// Order is significant: it defines the digit order of the enumeration.
/// Repeated characters are kept and behave as distinct digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Build a charset from a string, rejecting the empty string.
    ///
    /// # Example
    ///
    /// ```
    /// use omnigen::config::Charset;
    ///
    /// let cs = Charset::new("01").unwrap();
    /// assert_eq!(cs.len(), 2);
    /// assert!(Charset::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(GenError::InvalidConfiguration(
                "charset must contain at least one character".to_string(),
            ));
        }
        Ok(Self {
            chars: s.chars().collect(),
        })
    }

    /// Build a charset without validation. An empty charset is allowed here
    /// and yields no candidates of length one or more.
    pub fn from_chars(chars: Vec<char>) -> Self {
        Self { chars }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Longest UTF-8 encoding among the characters, used to size buffers.
    pub fn max_char_len(&self) -> usize {
        self.chars.iter().map(|c| c.len_utf8()).max().unwrap_or(0)
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in &self.chars {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Inclusive range of candidate lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(GenError::InvalidConfiguration(format!(
                "minimum length {} exceeds maximum length {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> usize {
        self.min
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }
}

/// What the driver does when a sink fails to store a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteErrorPolicy {
    /// Report the failure and keep generating.
    #[default]
    Continue,
    /// Finish the current candidate on every sink, then fail the run.
    Abort,
}

/// Complete configuration of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub charset: Charset,
    pub lengths: LengthRange,
    pub output_dir: PathBuf,
    /// Sinks to open, in write and finalize order.
    pub sinks: Vec<SinkKind>,
    pub preflight_min_mb: u64,
    pub periodic_min_mb: u64,
    pub progress_interval: u64,
    pub guard_interval: u64,
    pub on_write_error: WriteErrorPolicy,
}

impl RunConfig {
    /// Configuration with the default outputs, thresholds and cadences.
    pub fn new(charset: Charset, lengths: LengthRange) -> Self {
        Self {
            charset,
            lengths,
            output_dir: PathBuf::from("."),
            sinks: SinkKind::ALL.to_vec(),
            preflight_min_mb: DEFAULT_PREFLIGHT_MIN_MB,
            periodic_min_mb: DEFAULT_PERIODIC_MIN_MB,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            guard_interval: DEFAULT_GUARD_INTERVAL,
            on_write_error: WriteErrorPolicy::Continue,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_sinks(mut self, sinks: Vec<SinkKind>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn with_thresholds(mut self, preflight_min_mb: u64, periodic_min_mb: u64) -> Self {
        self.preflight_min_mb = preflight_min_mb;
        self.periodic_min_mb = periodic_min_mb;
        self
    }

    pub fn with_intervals(mut self, progress_interval: u64, guard_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self.guard_interval = guard_interval;
        self
    }

    pub fn with_write_error_policy(mut self, policy: WriteErrorPolicy) -> Self {
        self.on_write_error = policy;
        self
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.charset.is_empty() {
            return Err(GenError::InvalidConfiguration(
                "charset must contain at least one character".to_string(),
            ));
        }
        if self.lengths.min() > self.lengths.max() {
            return Err(GenError::InvalidConfiguration(format!(
                "minimum length {} exceeds maximum length {}",
                self.lengths.min(),
                self.lengths.max()
            )));
        }
        if self.progress_interval == 0 {
            return Err(GenError::InvalidConfiguration(
                "progress interval must be at least 1".to_string(),
            ));
        }
        if self.guard_interval == 0 {
            return Err(GenError::InvalidConfiguration(
                "disk check interval must be at least 1".to_string(),
            ));
        }
        if self.sinks.is_empty() {
            return Err(GenError::InvalidConfiguration(
                "at least one output format is required".to_string(),
            ));
        }
        for (i, kind) in self.sinks.iter().enumerate() {
            if self.sinks[..i].contains(kind) {
                return Err(GenError::InvalidConfiguration(format!(
                    "output format '{}' requested more than once",
                    kind
                )));
            }
        }
        if self.periodic_min_mb > self.preflight_min_mb {
            return Err(GenError::InvalidConfiguration(format!(
                "periodic free-space threshold ({}MB) exceeds start threshold ({}MB)",
                self.periodic_min_mb, self.preflight_min_mb
            )));
        }
        Ok(())
    }
}

/// Number of candidates an uninterrupted run emits: the sum of
/// `charset_len^L` over every length in the range.
///
/// Returns `None` when the total does not fit in a `u128`.
///
/// # Example
///
/// ```
/// use omnigen::config::{total_candidates, LengthRange};
///
/// let range = LengthRange::new(1, 3).unwrap();
/// assert_eq!(total_candidates(2, range), Some(2 + 4 + 8));
/// ```
pub fn total_candidates(charset_len: usize, lengths: LengthRange) -> Option<u128> {
    let base = charset_len as u128;
    let mut total: u128 = 0;
    for len in lengths.min()..=lengths.max() {
        let exp = u32::try_from(len).ok()?;
        total = total.checked_add(base.checked_pow(exp)?)?;
    }
    Some(total)
}
