// src/lib.rs
//! Low-overhead in-process event recording
//!
//! Callers mark instantaneous events, open and close named intervals, and
//! attach annotations, from any thread, at nanosecond-scale cost per call; a
//! background thread periodically renders the buffered records into a
//! textual trace without ever blocking producers.
//!
//! # Architecture
//!
//! - **clock**: cycle counter access and wall-clock calibration
//! - **recording**: lock-free record buffer, producer API, drain thread
//! - **sink**: the byte sink rendered trace lines are appended to
//! - **utils**: errors and common helpers
//!
//! # Quick start
//!
//! ```no_run
//! use cycletrace::{ThreadId, TraceConfig, TraceRecorder};
//!
//! # fn main() -> cycletrace::Result<()> {
//! let sink = std::fs::File::create("trace.log").expect("create trace file");
//! let recorder = TraceRecorder::initialize(Box::new(sink), TraceConfig::default())?;
//!
//! let thread = ThreadId::current();
//! let id = recorder.start_interval(thread, "load config");
//! // ... work ...
//! recorder.stop_interval(thread, id, "load config");
//! recorder.annotate_interval(thread, id, "3 files");
//!
//! recorder.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Delivery model
//!
//! Event loss is a deliberate trade-off: if producers outrun the drain
//! across a full buffer, the oldest undrained records are overwritten and
//! counted, never back-pressured. Bounded memory and a non-blocking
//! producer path win over completeness.

pub mod clock;
pub mod recording;
pub mod sink;
pub mod utils;

// Re-export commonly used types
pub use clock::{calibrate, read_cycle_counter, Calibration};
pub use recording::{
    DrainReport, IntervalId, RecordBuffer, RecordPayload, RecorderStats, ThreadId, TraceConfig,
    TraceRecord, TraceRecorder,
};
pub use sink::{SharedSink, TraceSink};
pub use utils::errors::{Result, TraceError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
