//! Pitch estimation engine abstraction.
//!
//! The `PitchEstimator` trait decouples the real-time bridge from any
//! specific detection backend (the threaded FFT tracker, a fixed stub, a
//! recording mock in tests, ...).
//!
//! ## Real-time obligations
//!
//! `add` and `estimated_freq` are called from the audio callback. They must
//! not allocate, must not take a lock that a background thread can hold for
//! an unbounded time, and must return promptly. `init`, `reset` and
//! `stop_thread` are only called from the non-RT context.

pub mod detector;
pub mod snapshot;
pub mod stub;
pub mod threaded;

pub use detector::{AutocorrelationDetector, DetectorConfig};
pub use snapshot::{FrequencySnapshot, GenerationalEstimate};
pub use stub::FixedTracker;
pub use threaded::ThreadedTracker;

use std::thread::{self, ThreadId};

use crate::error::Result;

/// Contract for pitch estimation backends.
pub trait PitchEstimator: Send + 'static {
    /// Configure for a fixed sample rate and bind to an execution context.
    ///
    /// Backends that own a background thread start it here. Calling `init`
    /// again must replace (not leak) any previously started thread.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be configured or its thread
    /// cannot be spawned. The caller still calls `stop_thread` afterwards.
    fn init(&mut self, sample_rate: f64, context: &ExecutionContext) -> Result<()>;

    /// Clear all detection state. Called on activation, not per block.
    fn reset(&mut self);

    /// Ingest a bounded chunk of samples. RT-safe.
    fn add(&mut self, chunk: &[f32]);

    /// Most recent frequency estimate in Hz; `<= 0.0` means no pitch. RT-safe.
    fn estimated_freq(&self) -> f32;

    /// Terminate and join any background execution. Idempotent.
    fn stop_thread(&mut self);
}

/// Identity of the thread that constructed the engine.
///
/// In plugin hosts the constructing thread is usually *not* the thread that
/// later calls `process`, so backends only use this to name and log their
/// own worker; they must not treat it as the real-time thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub thread_id: ThreadId,
    pub name: Option<String>,
}

impl ExecutionContext {
    /// Capture the calling thread.
    pub fn current() -> Self {
        let current = thread::current();
        Self {
            thread_id: current.id(),
            name: current.name().map(str::to_owned),
        }
    }

    /// Name for a worker thread spawned on behalf of this context.
    pub fn worker_name(&self, role: &str) -> String {
        match self.name.as_deref() {
            Some(owner) if !owner.is_empty() => format!("{owner}-{role}"),
            _ => format!("chroma-{role}"),
        }
    }
}
