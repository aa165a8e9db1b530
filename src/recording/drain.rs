// src/recording/drain.rs
//! Background drain thread
//!
//! A single thread wakes on a fixed interval, renders every record between
//! the drain cursor and a snapshot of the write cursor into the sink, and
//! goes back to sleep. Stopping is cooperative: `shutdown` sends on the stop
//! channel, the thread runs one final pass, flushes, and exits. Records
//! published after that final pass are not rendered.
//!
//! A sink write failure terminates the loop and is carried back to
//! `shutdown`; it is propagated, never retried.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::{debug, error, warn};

use crate::recording::recorder::SharedState;
use crate::recording::render::render_record;
use crate::sink::TraceSink;
use crate::utils::errors::{Result, TraceError};

/// Handle to the running drain thread.
pub(crate) struct DrainHandle {
    stop: Sender<()>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl DrainHandle {
    /// Spawn the drain thread over `shared`, writing into `sink` every
    /// `interval`.
    pub(crate) fn spawn(
        shared: Arc<SharedState>,
        mut sink: Box<dyn TraceSink>,
        interval: Duration,
    ) -> Result<Self> {
        let (stop, stop_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("cycletrace-drain".into())
            .spawn(move || {
                debug!("drain thread started, interval {:?}", interval);
                loop {
                    let stopping = match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => false,
                        // Stop signal, or the recorder dropped the sender.
                        _ => true,
                    };

                    drain_pass(&shared, sink.as_mut())?;

                    if stopping {
                        debug!("drain thread exiting after final pass");
                        return Ok(());
                    }
                }
            })
            .map_err(|e| TraceError::DrainFailed(format!("spawn failed: {e}")))?;

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Signal the thread, wait for its final pass, and surface any sink
    /// error it hit.
    pub(crate) fn join(mut self) -> Result<()> {
        // Fails only if the thread already exited; join still reaps it.
        let _ = self.stop.send(());

        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        match thread.join() {
            Ok(result) => result,
            Err(_) => Err(TraceError::DrainFailed("drain thread panicked".into())),
        }
    }
}

impl Drop for DrainHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.stop.send(());
            let _ = thread.join();
        }
    }
}

/// One drain cycle: render the undrained region into the sink and flush.
fn drain_pass(shared: &SharedState, sink: &mut dyn TraceSink) -> Result<()> {
    let mut rendered = Vec::new();
    let report = shared.buffer.drain(|record| {
        // Rendering into a Vec cannot fail.
        let _ = render_record(&mut rendered, &record, shared.epoch);
    });

    shared.rendered.fetch_add(report.rendered, Ordering::Relaxed);
    shared.lost.fetch_add(report.lost, Ordering::Relaxed);
    shared.skipped.fetch_add(report.skipped, Ordering::Relaxed);

    if report.lost > 0 {
        warn!(
            "{} records overwritten before they could be drained",
            report.lost
        );
    }
    if report.rendered > 0 {
        debug!(
            "drained {} records ({} bytes)",
            report.rendered,
            rendered.len()
        );
    }

    sink.write_all(&rendered)
        .and_then(|_| sink.flush())
        .map_err(|e| {
            error!("sink write failed: {e}");
            TraceError::SinkFailed(e.to_string())
        })
}
