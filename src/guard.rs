//! Free-space guard for the output volume.
//!
//! A run can emit far more bytes than any disk holds, so the driver checks
//! free space once before opening outputs and again at a fixed cadence while
//! writing. Falling below the threshold is fatal; there is no retry.

use crate::error::{GenError, Result};
use std::io;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of free-space readings.
pub trait SpaceProbe: Send {
    /// Bytes available to the current user on the volume holding `path`.
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// Reads free space from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSpaceProbe;

impl SpaceProbe for FsSpaceProbe {
    /// Reads the nearest existing ancestor when `path` has not been created yet.
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        let existing = path
            .ancestors()
            .find(|p| p.exists())
            .unwrap_or_else(|| Path::new("."));
        fs4::available_space(existing)
    }
}

/// Reports a constant amount of free space.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpaceProbe {
    pub bytes: u64,
}

impl FixedSpaceProbe {
    pub fn from_mb(mb: u64) -> Self {
        Self {
            bytes: mb * 1024 * 1024,
        }
    }
}

impl SpaceProbe for FixedSpaceProbe {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.bytes)
    }
}

/// Checks free space on the run's working volume against a threshold.
pub struct ResourceGuard {
    path: PathBuf,
    probe: Box<dyn SpaceProbe>,
}

impl ResourceGuard {
    /// Guard backed by the real filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_probe(path, FsSpaceProbe)
    }

    pub fn with_probe(path: impl Into<PathBuf>, probe: impl SpaceProbe + 'static) -> Self {
        Self {
            path: path.into(),
            probe: Box::new(probe),
        }
    }

    /// Free space in megabytes.
    pub fn available_mb(&self) -> Result<f64> {
        let bytes = self
            .probe
            .available_bytes(&self.path)
            .map_err(GenError::SpaceProbe)?;
        Ok(bytes as f64 / BYTES_PER_MB)
    }

    /// Fail with [`GenError::ResourceExhausted`] if less than
    /// `min_required_mb` is free.
    pub fn check(&self, min_required_mb: u64) -> Result<()> {
        let available_mb = self.available_mb()?;
        tracing::debug!(
            path = %self.path.display(),
            available_mb,
            min_required_mb,
            "disk space check"
        );
        if available_mb < min_required_mb as f64 {
            return Err(GenError::ResourceExhausted {
                available_mb,
                required_mb: min_required_mb,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenProbe;

    impl SpaceProbe for BrokenProbe {
        fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such volume"))
        }
    }

    #[test]
    fn test_enough_space_passes() {
        let guard = ResourceGuard::with_probe(".", FixedSpaceProbe::from_mb(600));
        assert!(guard.check(500).is_ok());
        assert!(guard.check(600).is_ok());
    }

    #[test]
    fn test_low_space_is_fatal() {
        let guard = ResourceGuard::with_probe(".", FixedSpaceProbe::from_mb(99));
        match guard.check(100) {
            Err(GenError::ResourceExhausted {
                available_mb,
                required_mb,
            }) => {
                assert_eq!(required_mb, 100);
                assert!((available_mb - 99.0).abs() < f64::EPSILON);
            }
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_probe_failure_surfaces() {
        let guard = ResourceGuard::with_probe(".", BrokenProbe);
        let err = guard.check(1).unwrap_err();
        assert!(matches!(err, GenError::SpaceProbe(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_real_filesystem_reading() {
        let dir = tempfile::tempdir().unwrap();
        let guard = ResourceGuard::new(dir.path());
        assert!(guard.check(0).is_ok());
        assert!(guard.available_mb().unwrap() > 0.0);
    }

    #[test]
    fn test_missing_directory_reads_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let guard = ResourceGuard::new(dir.path().join("not/yet/created"));
        assert!(guard.check(0).is_ok());
    }
}
