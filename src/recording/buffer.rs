// src/recording/buffer.rs
//! Lock-free circular record buffer
//!
//! Producers reserve slots through an optimistic CAS loop on a single shared
//! cursor; a lone consumer periodically drains the region between the two
//! cursors. Cursors are monotonic tickets and ticket `t` lives in slot
//! `t % capacity`, so the undrained region wraps the physical array at most
//! once and overwrite loss is a plain cursor-distance check.
//!
//! # Publication protocol
//!
//! Reserving a slot does not make its payload visible. The producer writes
//! the record and then release-stores the slot's sequence word as
//! `ticket + 1`; the drain acquire-loads the sequence before copying the
//! payload out and re-checks it afterwards. A slot that is mid-write, or that
//! a lapping producer reused during the copy, is skipped instead of rendered
//! torn. Skipped and overwritten records are counted, never errors: the
//! buffer trades completeness for bounded memory and a producer path that
//! never blocks.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

use crate::recording::record::TraceRecord;

/// One slot of the circular buffer.
///
/// `seq` holds `ticket + 1` once the record for `ticket` is fully written;
/// zero means never written.
struct Slot {
    seq: AtomicU64,
    record: UnsafeCell<MaybeUninit<TraceRecord>>,
}

/// Fixed-capacity lock-free event buffer.
///
/// Allocated once, never resized. Any number of producers may publish
/// concurrently; exactly one consumer may drain.
pub struct RecordBuffer {
    slots: Box<[Slot]>,

    /// Next ticket to grant to a producer.
    write_cursor: CachePadded<AtomicU64>,

    /// Next ticket the consumer will visit. Mutated only by the drain.
    drain_cursor: CachePadded<AtomicU64>,
}

// Payload writes are exclusive to the producer holding the ticket until the
// buffer laps that slot; reads are guarded by the sequence double-check in
// `read_slot`.
unsafe impl Send for RecordBuffer {}
unsafe impl Sync for RecordBuffer {}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records handed to the visitor
    pub rendered: u64,

    /// Records overwritten before the drain reached them
    pub lost: u64,

    /// Slots skipped because their producer had not yet published, or
    /// republished mid-copy
    pub skipped: u64,
}

impl RecordBuffer {
    /// Create a buffer with room for `capacity` records.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");

        let slots = (0..capacity)
            .map(|_| Slot {
                seq: AtomicU64::new(0),
                record: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            slots,
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            drain_cursor: CachePadded::new(AtomicU64::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Tickets granted so far.
    pub fn written(&self) -> u64 {
        self.write_cursor.load(Ordering::Acquire)
    }

    /// Reserve the next ticket.
    ///
    /// Optimistic retry loop: read the cursor, try to swing it one forward,
    /// re-read on a lost race. Never blocks and never fails; lock-free, not
    /// wait-free. The winner owns slot `ticket % capacity` for writing until
    /// the buffer laps it.
    fn allocate(&self) -> u64 {
        let mut ticket = self.write_cursor.load(Ordering::Relaxed);
        loop {
            match self.write_cursor.compare_exchange_weak(
                ticket,
                ticket + 1,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return ticket,
                Err(current) => ticket = current,
            }
        }
    }

    /// Write `record` into the next slot and publish it to the drain.
    /// Returns the granted ticket.
    pub fn publish(&self, record: TraceRecord) -> u64 {
        let ticket = self.allocate();
        let slot = &self.slots[(ticket % self.slots.len() as u64) as usize];

        // Raw-pointer write: the slot is exclusively ours until the buffer
        // laps it, and a producer that laps during a concurrent drain copy
        // is caught by the sequence re-check on the read side.
        unsafe { slot.record.get().write(MaybeUninit::new(record)) };
        slot.seq.store(ticket + 1, Ordering::Release);

        ticket
    }

    /// Visit every undrained record in write order and advance the drain
    /// cursor past them.
    ///
    /// Single consumer only: concurrent drains would visit overlapping
    /// regions. The region is clamped to the newest `capacity` tickets;
    /// anything older was already overwritten and is reported as lost.
    pub fn drain(&self, mut visit: impl FnMut(TraceRecord)) -> DrainReport {
        let end = self.write_cursor.load(Ordering::Acquire);
        let mut start = self.drain_cursor.load(Ordering::Relaxed);
        let capacity = self.slots.len() as u64;

        let mut report = DrainReport::default();
        if end - start > capacity {
            report.lost = end - start - capacity;
            start = end - capacity;
        }

        for ticket in start..end {
            match self.read_slot(ticket) {
                Some(record) => {
                    report.rendered += 1;
                    visit(record);
                }
                None => report.skipped += 1,
            }
        }

        self.drain_cursor.store(end, Ordering::Release);
        report
    }

    /// Copy the record for `ticket` out of its slot, or `None` if the slot
    /// no longer (or not yet) holds that ticket's fully-written record.
    fn read_slot(&self, ticket: u64) -> Option<TraceRecord> {
        let slot = &self.slots[(ticket % self.slots.len() as u64) as usize];

        if slot.seq.load(Ordering::Acquire) != ticket + 1 {
            return None;
        }

        // The copy may race a lapping producer. It lands in a MaybeUninit,
        // which is only promoted to a value after the sequence re-check
        // proves no overwrite happened in between.
        let copy = unsafe { std::ptr::read(slot.record.get()) };

        if slot.seq.load(Ordering::Acquire) != ticket + 1 {
            return None;
        }

        Some(unsafe { copy.assume_init() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::record::{RecordPayload, ThreadId};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn stamp(label: &'static str, ticks: u64) -> TraceRecord {
        TraceRecord {
            thread: ThreadId(1),
            payload: RecordPayload::TimeStamp { ticks, label },
        }
    }

    fn drained_ticks(buffer: &RecordBuffer) -> (Vec<u64>, DrainReport) {
        let mut ticks = Vec::new();
        let report = buffer.drain(|record| {
            if let RecordPayload::TimeStamp { ticks: t, .. } = record.payload {
                ticks.push(t);
            }
        });
        (ticks, report)
    }

    #[test]
    fn grants_are_unique_across_threads() {
        // Large enough that no slot is reused during the test.
        let buffer = Arc::new(RecordBuffer::new(1 << 16));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    (0..1000)
                        .map(|i| buffer.publish(stamp("t", i)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for ticket in handle.join().unwrap() {
                assert!(seen.insert(ticket), "ticket {ticket} granted twice");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn empty_drain_is_a_no_op() {
        let buffer = RecordBuffer::new(4);
        let (ticks, report) = drained_ticks(&buffer);
        assert!(ticks.is_empty());
        assert_eq!(report, DrainReport::default());
    }

    #[test]
    fn wrapped_region_drains_in_write_order() {
        let buffer = RecordBuffer::new(4);

        // Advance past the first two slots so the next region wraps the
        // physical array.
        buffer.publish(stamp("x", 0));
        buffer.publish(stamp("x", 1));
        buffer.drain(|_| {});

        for ticks in 2..5 {
            buffer.publish(stamp("x", ticks));
        }

        let (ticks, report) = drained_ticks(&buffer);
        assert_eq!(ticks, vec![2, 3, 4]);
        assert_eq!(report.rendered, 3);
        assert_eq!(report.lost, 0);
    }

    #[test]
    fn lap_loses_only_the_oldest() {
        let buffer = RecordBuffer::new(4);
        for ticks in 0..5 {
            buffer.publish(stamp("x", ticks));
        }

        let (ticks, report) = drained_ticks(&buffer);
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        assert_eq!(report.rendered, 4);
        assert_eq!(report.lost, 1);
    }

    #[test]
    fn interval_scenario_overwrites_the_first_start() {
        // Five writes into a four-slot buffer: the first write (A's start)
        // is overwritten by the fifth and is unrecoverable.
        let a = crate::recording::record::IntervalId(0);
        let b = crate::recording::record::IntervalId(1);
        let thread = ThreadId(1);

        let buffer = RecordBuffer::new(4);
        buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalStart { ticks: 10, id: a, label: "A" },
        });
        buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalStart { ticks: 20, id: b, label: "B" },
        });
        buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalEnd { ticks: 30, id: b, label: "B" },
        });
        buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalEnd { ticks: 40, id: a, label: "A" },
        });
        buffer.publish(TraceRecord {
            thread,
            payload: RecordPayload::IntervalAnnotation { id: a, label: "note" },
        });

        let mut drained = Vec::new();
        let report = buffer.drain(|record| drained.push(record.payload));

        assert_eq!(report.rendered, 4);
        assert_eq!(report.lost, 1);
        assert_eq!(
            drained,
            vec![
                RecordPayload::IntervalStart { ticks: 20, id: b, label: "B" },
                RecordPayload::IntervalEnd { ticks: 30, id: b, label: "B" },
                RecordPayload::IntervalEnd { ticks: 40, id: a, label: "A" },
                RecordPayload::IntervalAnnotation { id: a, label: "note" },
            ]
        );
    }

    #[test]
    fn successive_drains_never_repeat_or_skip() {
        let buffer = RecordBuffer::new(4);
        let mut rendered = Vec::new();

        for ticks in 0..3 {
            buffer.publish(stamp("x", ticks));
        }
        buffer.drain(|record| {
            if let RecordPayload::TimeStamp { ticks, .. } = record.payload {
                rendered.push(ticks);
            }
        });

        for ticks in 3..6 {
            buffer.publish(stamp("x", ticks));
        }
        buffer.drain(|record| {
            if let RecordPayload::TimeStamp { ticks, .. } = record.payload {
                rendered.push(ticks);
            }
        });

        assert_eq!(rendered, vec![0, 1, 2, 3, 4, 5]);
    }

    proptest! {
        // Over any schedule of publish batches and drain passes, rendered
        // records map injectively back to write order, and every write is
        // accounted for as rendered or lost.
        #[test]
        fn drain_protocol_accounts_for_every_write(
            capacity in 1usize..16,
            batches in proptest::collection::vec(0u64..24, 0..12),
        ) {
            let buffer = RecordBuffer::new(capacity);
            let mut next = 0u64;
            let mut rendered = Vec::new();
            let mut lost = 0u64;

            for batch in batches {
                for _ in 0..batch {
                    buffer.publish(stamp("p", next));
                    next += 1;
                }
                let report = buffer.drain(|record| {
                    if let RecordPayload::TimeStamp { ticks, .. } = record.payload {
                        rendered.push(ticks);
                    }
                });
                lost += report.lost;
                prop_assert_eq!(report.skipped, 0);
            }

            prop_assert!(rendered.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(rendered.len() as u64 + lost, next);
        }
    }
}
