// src/sink.rs
//! Destination sink for rendered trace lines
//!
//! The recorder only needs an appendable byte sink; anything `Write + Send`
//! qualifies (file, socket, pipe). The drain thread takes ownership of the
//! sink at `initialize` and drops it after the final flush, so closing is
//! dropping.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// An appendable byte sink for rendered trace lines.
///
/// Blanket-implemented for every `Write + Send` type.
pub trait TraceSink: Write + Send {}

impl<T: Write + Send> TraceSink for T {}

/// Clonable in-memory sink, mainly for tests and short-lived captures.
///
/// Clones share the same backing buffer, so the owning process can keep one
/// handle while the drain thread writes through another.
#[derive(Clone, Default)]
pub struct SharedSink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Everything written so far, as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
