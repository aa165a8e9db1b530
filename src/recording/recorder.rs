// src/recording/recorder.rs
//! Recorder context and producer-facing event API
//!
//! `TraceRecorder` owns every piece of state the design shares process-wide
//! (buffer, cursors, active flag, epoch, calibration), so the recorder is
//! testable in isolation and can be instantiated more than once per process.
//! `initialize` and `shutdown` are the only lifecycle entry points.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::clock::{calibrate, read_cycle_counter, Calibration};
use crate::recording::buffer::RecordBuffer;
use crate::recording::drain::DrainHandle;
use crate::recording::record::{IntervalId, RecordPayload, ThreadId, TraceRecord};
use crate::sink::TraceSink;
use crate::utils::errors::Result;

/// Recorder configuration
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Buffer capacity in records
    pub capacity: usize,

    /// How often the drain thread renders buffered records into the sink
    pub drain_interval: Duration,

    /// How long startup calibration samples the cycle counter
    pub calibration_period: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            drain_interval: Duration::from_secs(1),
            calibration_period: Duration::from_secs(1),
        }
    }
}

/// State shared between producer threads and the drain thread.
pub(crate) struct SharedState {
    pub(crate) buffer: RecordBuffer,
    pub(crate) epoch: u64,
    active: AtomicBool,
    next_interval_id: AtomicU32,
    calibration: Calibration,

    // Cumulative drain counters
    pub(crate) rendered: AtomicU64,
    pub(crate) lost: AtomicU64,
    pub(crate) skipped: AtomicU64,
}

impl SharedState {
    fn new(buffer: RecordBuffer, epoch: u64, calibration: Calibration) -> Self {
        Self {
            buffer,
            epoch,
            active: AtomicBool::new(true),
            next_interval_id: AtomicU32::new(0),
            calibration,
            rendered: AtomicU64::new(0),
            lost: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(capacity: usize) -> Self {
        Self::new(
            RecordBuffer::new(capacity),
            0,
            Calibration {
                ticks_per_second: 1e9,
            },
        )
    }
}

/// Cumulative recorder statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderStats {
    /// Records published into the buffer
    pub published: u64,

    /// Records rendered to the sink
    pub rendered: u64,

    /// Records overwritten before the drain reached them
    pub lost: u64,

    /// Slots the drain skipped mid-write
    pub skipped: u64,
}

/// In-process event recorder.
///
/// Producers call the event API from any thread through a shared reference;
/// none of the operations block, and while recording is inactive each one is
/// a single flag load.
pub struct TraceRecorder {
    shared: Arc<SharedState>,
    drain: Option<DrainHandle>,
}

impl TraceRecorder {
    /// Calibrate the cycle counter, open the epoch, start the drain thread,
    /// and activate recording.
    ///
    /// Blocks for `config.calibration_period` while calibrating; run once at
    /// startup, not on a hot path. The Calibration and Epoch records are the
    /// first two entries of the trace.
    pub fn initialize(sink: Box<dyn TraceSink>, config: TraceConfig) -> Result<Self> {
        let calibration = calibrate(config.calibration_period);

        let buffer = RecordBuffer::new(config.capacity);
        let boot_thread = ThreadId::current();
        buffer.publish(TraceRecord {
            thread: boot_thread,
            payload: RecordPayload::Calibration {
                ticks_per_second: calibration.ticks_per_second,
            },
        });

        let epoch = read_cycle_counter();
        buffer.publish(TraceRecord {
            thread: boot_thread,
            payload: RecordPayload::Epoch { ticks: epoch },
        });

        let shared = Arc::new(SharedState::new(buffer, epoch, calibration));
        let drain = DrainHandle::spawn(Arc::clone(&shared), sink, config.drain_interval)?;

        info!(
            "recorder initialized: capacity {}, drain every {:?}, {:.0} ticks/s",
            config.capacity, config.drain_interval, calibration.ticks_per_second
        );

        Ok(Self {
            shared,
            drain: Some(drain),
        })
    }

    /// Record an instantaneous event.
    pub fn point_event(&self, thread: ThreadId, label: &'static str) {
        if !self.shared.active.load(Ordering::Relaxed) {
            return;
        }
        self.shared.buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::TimeStamp {
                ticks: read_cycle_counter(),
                label,
            },
        });
    }

    /// Open a named interval and return its identifier.
    ///
    /// Identifiers come from a process-wide counter: strictly increasing,
    /// never reused. Returns [`IntervalId::INACTIVE`] while recording is
    /// disabled.
    pub fn start_interval(&self, thread: ThreadId, label: &'static str) -> IntervalId {
        if !self.shared.active.load(Ordering::Relaxed) {
            return IntervalId::INACTIVE;
        }
        let id = IntervalId(self.shared.next_interval_id.fetch_add(1, Ordering::SeqCst));
        self.shared.buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalStart {
                ticks: read_cycle_counter(),
                id,
                label,
            },
        });
        id
    }

    /// Close an interval previously opened with
    /// [`start_interval`](TraceRecorder::start_interval).
    ///
    /// The identifier is not checked against open intervals; pairing starts
    /// and stops correctly is the caller's contract.
    pub fn stop_interval(&self, thread: ThreadId, id: IntervalId, label: &'static str) {
        if !self.shared.active.load(Ordering::Relaxed) {
            return;
        }
        self.shared.buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalEnd {
                ticks: read_cycle_counter(),
                id,
                label,
            },
        });
    }

    /// Attach a note to an interval. Annotations carry no timestamp of
    /// their own.
    pub fn annotate_interval(&self, thread: ThreadId, id: IntervalId, label: &'static str) {
        if !self.shared.active.load(Ordering::Relaxed) {
            return;
        }
        self.shared.buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalAnnotation { id, label },
        });
    }

    /// Gate the event API at runtime.
    pub fn set_active(&self, active: bool) {
        self.shared.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// The calibration measured at startup.
    pub fn calibration(&self) -> Calibration {
        self.shared.calibration
    }

    /// Cumulative counters.
    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            published: self.shared.buffer.written(),
            rendered: self.shared.rendered.load(Ordering::Relaxed),
            lost: self.shared.lost.load(Ordering::Relaxed),
            skipped: self.shared.skipped.load(Ordering::Relaxed),
        }
    }

    /// Stop recording, run a final drain pass, join the drain thread, and
    /// close the sink.
    ///
    /// Records published after the final pass are not rendered. Surfaces any
    /// sink write failure the drain thread encountered. Dropping the
    /// recorder without calling this stops and joins the drain thread too,
    /// but swallows the error.
    pub fn shutdown(mut self) -> Result<()> {
        self.shared.active.store(false, Ordering::Relaxed);
        info!("recorder shutting down");
        match self.drain.take() {
            Some(drain) => drain.join(),
            None => Ok(()),
        }
    }
}
