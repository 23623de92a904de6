//! OmniGen: exhaustive fixed-length string enumeration.
//!
//! Every string of each length in an inclusive range is generated over an
//! ordered charset and streamed, one candidate at a time, to several output
//! sinks at once (plain text, markdown and PDF).
//!
//! # Features
//!
//! - **Lazy enumeration**: O(L) memory regardless of how many candidates exist
//! - **Multi-sink fan-out**: each candidate reaches every sink before the next
//! - **Safe shutdown**: cancellation is observed between candidates and every
//!   sink is finalized on every exit path
//! - **Disk guard**: free space is checked before and periodically during a run
//!
//! # Example
//!
//! ```rust,no_run
//! use omnigen::prelude::*;
//!
//! let config = RunConfig::new(
//!     Charset::new("01").unwrap(),
//!     LengthRange::new(1, 8).unwrap(),
//! )
//! .with_output_dir("out");
//!
//! let guard = ResourceGuard::new("out");
//! let mut driver = RunDriver::new(config, guard, CancellationFlag::new());
//! let report = driver.run(&mut StdoutProgress::new());
//! assert!(report.is_success());
//! ```

pub mod cancel;
pub mod config;
pub mod driver;
pub mod enumerate;
pub mod error;
pub mod guard;
pub mod logging;
pub mod signal;
pub mod sink;

pub use cancel::CancellationFlag;
pub use config::{Charset, LengthRange, RunConfig, WriteErrorPolicy};
pub use driver::{ProgressReporter, RunDriver, RunPhase, RunReport, RunState, StdoutProgress};
pub use enumerate::{Candidates, Enumerator};
pub use error::{GenError, Result};
pub use guard::ResourceGuard;
pub use sink::{Sink, SinkKind, SinkSet, SinkTarget};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cancel::CancellationFlag;
    pub use crate::config::{Charset, LengthRange, RunConfig, WriteErrorPolicy};
    pub use crate::driver::{ProgressReporter, RunDriver, RunPhase, RunReport, StdoutProgress};
    pub use crate::enumerate::Enumerator;
    pub use crate::guard::ResourceGuard;
    pub use crate::sink::{Sink, SinkKind, SinkSet};
}
