// src/recording/render.rs
//! Text rendering of trace records
//!
//! One line per record. Field order is stable for downstream tooling:
//! thread id, relative cycle count where applicable, kind marker, label,
//! interval id. Timestamps are rendered relative to the epoch latched at
//! startup; Calibration and Epoch records carry absolute values.

use std::io::{self, Write};

use crate::recording::record::{RecordPayload, TraceRecord};

/// Render `record` as one text line into `out`.
pub fn render_record(
    out: &mut impl Write,
    record: &TraceRecord,
    epoch: u64,
) -> io::Result<()> {
    write!(out, "{:>10x} ", record.thread.0)?;

    match record.payload {
        RecordPayload::Calibration { ticks_per_second } => {
            writeln!(out, "Calibration: {ticks_per_second:.6} ticks per second")
        }
        RecordPayload::Epoch { ticks } => {
            writeln!(out, "Epoch counter: {ticks}")
        }
        RecordPayload::TimeStamp { ticks, label } => {
            writeln!(
                out,
                "{:>15} -|- Time stamp:     \"{label}\"",
                ticks.wrapping_sub(epoch)
            )
        }
        RecordPayload::IntervalStart { ticks, id, label } => {
            writeln!(
                out,
                "{:>15} (-  Interval start: \"{label}\" ({id})",
                ticks.wrapping_sub(epoch)
            )
        }
        RecordPayload::IntervalEnd { ticks, id, label } => {
            writeln!(
                out,
                "{:>15}  -) Interval stop:  \"{label}\" ({id})",
                ticks.wrapping_sub(epoch)
            )
        }
        RecordPayload::IntervalAnnotation { id, label } => {
            writeln!(out, "{:>15} ??? Annotation:     \"{label}\" ({id})", "")
        }
    }
}
