//! Counting admission gate for filesystem work.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

/// Caps the number of concurrently admitted tasks at a fixed capacity.
///
/// Built on a bounded channel: admitting a task sends a token, which blocks
/// while `capacity` tokens are already in the channel; releasing receives
/// one back. One gate is shared by every level of a scan.
#[derive(Debug)]
pub struct AdmissionGate {
    tokens_tx: Sender<()>,
    tokens_rx: Receiver<()>,
    peak: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` tasks at once.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tokens_tx, tokens_rx) = bounded(capacity);
        Self {
            tokens_tx,
            tokens_rx,
            peak: AtomicUsize::new(0),
        }
    }

    /// Block until a permit is available.
    ///
    /// The permit is returned to the gate when the guard is dropped,
    /// including during unwinding.
    pub fn acquire(&self) -> Permit<'_> {
        // The gate owns both channel ends, so the send cannot disconnect.
        let _ = self.tokens_tx.send(());
        self.peak.fetch_max(self.tokens_tx.len(), Ordering::Relaxed);
        Permit { gate: self }
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.tokens_tx.len()
    }

    /// Highest number of permits observed held at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// A held admission permit.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.gate.tokens_rx.try_recv();
    }
}
