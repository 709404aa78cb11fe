//! Lock-free SPSC ring buffers.
//!
//! Uses `ringbuf::HeapRb` which provides a wait-free `push_slice` / `try_push`
//! safe to call from the real-time audio callback. The ring is allocated once,
//! on the non-RT side, and never grows.
//!
//! - Sample ring: tracker `add()` (RT) → tracker worker thread.
//! - Readout ring: live input callback (RT) → whoever polls the tuner.

pub mod ingest;

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Observer, Producer};

use crate::ipc::events::TunerReadout;

/// Producer half of the sample ring — held by the real-time side.
pub type SampleProducer = ringbuf::HeapProd<f32>;

/// Consumer half of the sample ring — held by the tracker worker.
pub type SampleConsumer = ringbuf::HeapCons<f32>;

/// Producer half of the readout ring — held by the live input callback.
pub type ReadoutProducer = ringbuf::HeapProd<TunerReadout>;

/// Consumer half of the readout ring.
pub type ReadoutConsumer = ringbuf::HeapCons<TunerReadout>;

/// Default sample ring capacity: 2^16 = 65 536 samples ≈ 1.4 s at 48 kHz.
pub const SAMPLE_RING_CAPACITY: usize = 1 << 16;

/// Readouts buffered for a slow poller before new ones are dropped.
pub const READOUT_RING_CAPACITY: usize = 256;

/// Create a matched producer/consumer pair for mono f32 samples.
pub fn create_sample_ring(capacity: usize) -> (SampleProducer, SampleConsumer) {
    HeapRb::<f32>::new(capacity.max(1)).split()
}

/// Create a matched producer/consumer pair for tuner readouts.
pub fn create_readout_ring(capacity: usize) -> (ReadoutProducer, ReadoutConsumer) {
    HeapRb::<TunerReadout>::new(capacity.max(1)).split()
}
