// src/recording/mod.rs
//! Event capture and draining
//!
//! This module is the core of the recorder:
//!
//! - **Record**: the buffered event data model
//! - **Buffer**: lock-free circular buffer with CAS slot allocation
//! - **Recorder**: producer-facing event API and lifecycle
//! - **Drain**: background thread that renders buffered records
//! - **Render**: per-record text line layout
//!
//! # Architecture
//!
//! ```text
//! point_event() / start_interval() → lock-free ring buffer
//!            (~ns, never blocks)            ↓
//!                                     drain thread (periodic)
//!                                           ↓
//!                                 rendered text lines → sink
//! ```
//!
//! Producers and the drain never contend on a lock; if producers outrun the
//! drain across a full buffer, the oldest undrained records are overwritten
//! and counted, never back-pressured.

pub mod buffer;
pub(crate) mod drain;
pub mod record;
pub mod recorder;
pub mod render;

// Re-export commonly used types
pub use buffer::{DrainReport, RecordBuffer};
pub use record::{IntervalId, RecordPayload, ThreadId, TraceRecord};
pub use recorder::{RecorderStats, TraceConfig, TraceRecorder};
pub use render::render_record;
