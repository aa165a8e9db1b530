// src/recording/record.rs
//! Trace record data model
//!
//! Records are small `Copy` values with `&'static str` labels, so the hot
//! path never allocates and a buffered record stays valid however late the
//! drain gets to it.

use std::fmt;

/// Producer thread identifier.
///
/// Supplied by the caller on every operation; `ThreadId::current` reads the
/// OS identifier for callers that do not carry their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u64);

impl ThreadId {
    /// Identifier of the calling OS thread.
    pub fn current() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self(unsafe { libc::gettid() } as u64)
        }

        #[cfg(all(unix, not(target_os = "linux")))]
        {
            Self(unsafe { libc::pthread_self() } as u64)
        }

        #[cfg(not(unix))]
        {
            use std::hash::{Hash, Hasher};
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::thread::current().id().hash(&mut hasher);
            Self(hasher.finish())
        }
    }
}

/// Identifier tying an interval's start, stop, and annotations together.
///
/// Drawn from a process-wide counter: strictly increasing, never reused, and
/// never validated against open intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub u32);

impl IntervalId {
    /// Sentinel returned by `start_interval` while recording is inactive.
    pub const INACTIVE: IntervalId = IntervalId(u32::MAX);
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Payload of a single trace record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordPayload {
    /// Measured counter frequency, written once at startup
    Calibration { ticks_per_second: f64 },

    /// Baseline counter value all later timestamps are reported against
    Epoch { ticks: u64 },

    /// Instantaneous point event
    TimeStamp { ticks: u64, label: &'static str },

    /// Opening edge of a named interval
    IntervalStart {
        ticks: u64,
        id: IntervalId,
        label: &'static str,
    },

    /// Closing edge of a named interval
    IntervalEnd {
        ticks: u64,
        id: IntervalId,
        label: &'static str,
    },

    /// Free-form note attached to an interval; not independently timestamped
    IntervalAnnotation { id: IntervalId, label: &'static str },
}

/// One buffered trace event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRecord {
    pub thread: ThreadId,
    pub payload: RecordPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_thread_id_is_stable_within_a_thread() {
        assert_eq!(ThreadId::current(), ThreadId::current());
    }

    #[test]
    fn current_thread_ids_differ_across_threads() {
        let here = ThreadId::current();
        let there = std::thread::spawn(ThreadId::current).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn interval_id_displays_as_the_raw_integer() {
        assert_eq!(IntervalId(42).to_string(), "42");
    }
}
