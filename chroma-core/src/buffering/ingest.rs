//! Fixed-capacity staging buffer between the host block and the estimator.
//!
//! ## Algorithm
//!
//! ```text
//! host block (N samples, any N)
//!   ├─ copy min(remaining, capacity) → scratch
//!   ├─ estimator.add(&scratch[..len])
//!   └─ repeat until N consumed
//! ```
//!
//! The scratch storage is allocated exactly once, fallibly, at construction.
//! `feed` never allocates, so it is safe on the real-time path.

use crate::error::{ChromaError, Result};
use crate::tracker::PitchEstimator;

/// Default staging capacity in samples.
pub const DEFAULT_INGEST_CAPACITY: usize = 8192;

/// Bounded scratch buffer plus the chunking loop that drains a host block
/// through it.
#[derive(Debug)]
pub struct IngestBuffer {
    scratch: Box<[f32]>,
}

impl IngestBuffer {
    /// Allocate a staging buffer holding `capacity` samples.
    ///
    /// # Errors
    /// - `ChromaError::InvalidCapacity` when `capacity == 0`.
    /// - `ChromaError::Allocation` when the allocator refuses the request.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ChromaError::InvalidCapacity(capacity));
        }

        let mut storage: Vec<f32> = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| ChromaError::Allocation(capacity))?;
        storage.resize(capacity, 0.0);

        Ok(Self {
            scratch: storage.into_boxed_slice(),
        })
    }

    /// Fixed number of samples staged per chunk.
    pub fn capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Deliver every sample of `samples` to `estimator`, in order, as chunks
    /// of at most `capacity()` samples. Only the last chunk may be short.
    ///
    /// Returns the number of chunks fed. An empty block is a no-op.
    pub fn feed<E>(&mut self, samples: &[f32], estimator: &mut E) -> usize
    where
        E: PitchEstimator + ?Sized,
    {
        let mut chunks = 0;
        for block in samples.chunks(self.scratch.len()) {
            let staged = &mut self.scratch[..block.len()];
            staged.copy_from_slice(block);
            estimator.add(staged);
            chunks += 1;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tracker::ExecutionContext;

    /// Records every chunk it receives.
    #[derive(Default)]
    struct Recorder {
        chunks: Vec<Vec<f32>>,
    }

    impl PitchEstimator for Recorder {
        fn init(&mut self, _sample_rate: f64, _context: &ExecutionContext) -> Result<()> {
            Ok(())
        }
        fn reset(&mut self) {}
        fn add(&mut self, chunk: &[f32]) {
            self.chunks.push(chunk.to_vec());
        }
        fn estimated_freq(&self) -> f32 {
            0.0
        }
        fn stop_thread(&mut self) {}
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = IngestBuffer::with_capacity(0).unwrap_err();
        assert!(matches!(err, ChromaError::InvalidCapacity(0)));
    }

    #[test]
    fn empty_block_is_a_no_op() {
        let mut ingest = IngestBuffer::with_capacity(8).unwrap();
        let mut rec = Recorder::default();
        assert_eq!(ingest.feed(&[], &mut rec), 0);
        assert!(rec.chunks.is_empty());
    }

    #[test]
    fn block_smaller_than_capacity_is_one_chunk() {
        let mut ingest = IngestBuffer::with_capacity(8).unwrap();
        let mut rec = Recorder::default();
        let block = ramp(5);
        assert_eq!(ingest.feed(&block, &mut rec), 1);
        assert_eq!(rec.chunks, vec![block]);
    }

    #[test]
    fn exact_multiple_has_no_short_chunk() {
        let mut ingest = IngestBuffer::with_capacity(4).unwrap();
        let mut rec = Recorder::default();
        ingest.feed(&ramp(12), &mut rec);
        let sizes: Vec<usize> = rec.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 4]);
    }

    #[test]
    fn short_tail_does_not_leak_stale_scratch() {
        let mut ingest = IngestBuffer::with_capacity(4).unwrap();
        let mut rec = Recorder::default();

        // Fill the scratch with a recognisable pattern first.
        ingest.feed(&[9.0; 4], &mut rec);
        rec.chunks.clear();

        ingest.feed(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &mut rec);
        assert_eq!(rec.chunks, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn oversized_block_is_delivered_in_order() {
        let mut ingest = IngestBuffer::with_capacity(DEFAULT_INGEST_CAPACITY).unwrap();
        let mut rec = Recorder::default();
        let block = ramp(DEFAULT_INGEST_CAPACITY * 2 + 17);

        assert_eq!(ingest.feed(&block, &mut rec), 3);
        let joined: Vec<f32> = rec.chunks.concat();
        assert_eq!(joined, block);
        assert_eq!(rec.chunks[2].len(), 17);
    }
}
