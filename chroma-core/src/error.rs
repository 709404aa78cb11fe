use thiserror::Error;

use crate::engine::EngineState;

/// All errors produced by chroma-core.
///
/// Only the non-real-time side (construction, activation, configuration,
/// device handling) ever returns these. The per-block processing path
/// reports skipped calls through `Option` instead.
#[derive(Debug, Error)]
pub enum ChromaError {
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    #[error("invalid ingest capacity: {0} samples")]
    InvalidCapacity(usize),

    #[error("failed to allocate ingest buffer of {0} samples")]
    Allocation(usize),

    #[error("pitch estimator error: {0}")]
    Estimator(String),

    #[error("failed to spawn tracker thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("engine is not in a usable state ({0:?})")]
    InvalidState(EngineState),

    #[error("engine has been torn down")]
    TornDown,

    #[error("invalid config: {0}")]
    Config(String),

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ChromaError>;
