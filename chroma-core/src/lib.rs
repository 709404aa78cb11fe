//! # chroma-core
//!
//! Real-time pitch tracking engine for a chromatic tuner.
//!
//! ## Architecture
//!
//! ```text
//! host block ─► MuteGate ─► output block (copy or silence)
//!     │
//!     └─► IngestBuffer (fixed, chunked) ─► PitchEstimator::add ─► SPSC ring
//!                                                                  │
//!                                                   tracker thread (FFT / NSDF)
//!                                                                  │
//! TunerReadout ◄── PitchMapping ◄── estimated_freq() ◄── FrequencySnapshot
//! ```
//!
//! The audio-thread path is allocation-free and lock-free. All heap work
//! happens at construction or on the tracker thread.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ipc;
pub mod pitch;
pub mod tracker;

// Convenience re-exports for downstream crates
pub use config::TunerConfig;
pub use engine::{EngineState, ProcessBlock, TunerEngine};
pub use error::{ChromaError, Result};
pub use gate::GateMode;
pub use ipc::events::TunerReadout;
pub use pitch::{map_frequency, PitchMapping, ReferenceTuning, TuningIndicator};
pub use tracker::{ExecutionContext, PitchEstimator, ThreadedTracker};

#[cfg(feature = "audio-cpal")]
pub use audio::LiveTuner;
