//! Lock-free counters updated from the audio thread.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct EngineDiagnostics {
    pub blocks_processed: AtomicUsize,
    pub blocks_skipped: AtomicUsize,
    pub samples_ingested: AtomicUsize,
    pub chunks_fed: AtomicUsize,
    pub references_rejected: AtomicUsize,
    pub muted_blocks: AtomicUsize,
}

impl EngineDiagnostics {
    pub fn reset(&self) {
        self.blocks_processed.store(0, Ordering::Relaxed);
        self.blocks_skipped.store(0, Ordering::Relaxed);
        self.samples_ingested.store(0, Ordering::Relaxed);
        self.chunks_fed.store(0, Ordering::Relaxed);
        self.references_rejected.store(0, Ordering::Relaxed);
        self.muted_blocks.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            blocks_processed: self.blocks_processed.load(Ordering::Relaxed),
            blocks_skipped: self.blocks_skipped.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            chunks_fed: self.chunks_fed.load(Ordering::Relaxed),
            references_rejected: self.references_rejected.load(Ordering::Relaxed),
            muted_blocks: self.muted_blocks.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicUsize, by: usize) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub blocks_processed: usize,
    pub blocks_skipped: usize,
    pub samples_ingested: usize,
    pub chunks_fed: usize,
    pub references_rejected: usize,
    pub muted_blocks: usize,
}
