//! `TunerEngine` — lifecycle owner of the ingest buffer and the estimator.
//!
//! ## Lifecycle
//!
//! ```text
//! TunerEngine::new()      Uninitialized → Ready   (buffer allocated, estimator init)
//!     └─► activate()      Ready | Active → Active (detection state reset)
//!         └─► process()   Active only; anything else is skipped
//! teardown() / Drop       any → Stopped           (estimator stopped + joined, then freed)
//! ```
//!
//! Construction either returns a `Ready` engine or an error; a partially
//! built engine is torn down before the error is returned. `teardown()` is
//! idempotent and also runs from `Drop`.
//!
//! ## Threading
//!
//! Construction, activation and teardown run on the non-RT side. `process`
//! and `process_in_place` run on the audio thread: no allocation, no locks,
//! only relaxed atomics for diagnostics.

pub mod diagnostics;
pub mod process;

pub use diagnostics::{DiagnosticsSnapshot, EngineDiagnostics};
pub use process::ProcessBlock;

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    buffering::ingest::IngestBuffer,
    config::TunerConfig,
    error::{ChromaError, Result},
    pitch::ReferenceTuning,
    tracker::{ExecutionContext, PitchEstimator, ThreadedTracker},
};

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    Active,
    Stopped,
}

/// Real-time bridge between a host audio callback and a pitch estimator.
pub struct TunerEngine {
    state: EngineState,
    sample_rate: f64,
    in_tune_cents: f32,
    reference: ReferenceTuning,
    ingest: Option<IngestBuffer>,
    estimator: Option<Box<dyn PitchEstimator>>,
    context: ExecutionContext,
    diagnostics: Arc<EngineDiagnostics>,
}

impl TunerEngine {
    /// Build an engine backed by the default `ThreadedTracker`.
    pub fn new(sample_rate: f64, config: &TunerConfig) -> Result<Self> {
        let tracker = ThreadedTracker::new(config.detector.clone());
        Self::with_estimator(sample_rate, config, Box::new(tracker))
    }

    /// Build an engine around any estimator, bound to the calling thread.
    pub fn with_estimator(
        sample_rate: f64,
        config: &TunerConfig,
        estimator: Box<dyn PitchEstimator>,
    ) -> Result<Self> {
        Self::with_context(sample_rate, config, estimator, ExecutionContext::current())
    }

    /// Build an engine with an explicit execution context for the estimator.
    ///
    /// # Errors
    /// - `ChromaError::InvalidSampleRate` for a non-positive or non-finite rate.
    /// - `ChromaError::InvalidCapacity` / `ChromaError::Allocation` if the
    ///   ingest buffer cannot be created.
    /// - Whatever the estimator's `init` returns.
    pub fn with_context(
        sample_rate: f64,
        config: &TunerConfig,
        estimator: Box<dyn PitchEstimator>,
        context: ExecutionContext,
    ) -> Result<Self> {
        let mut engine = Self {
            state: EngineState::Uninitialized,
            sample_rate,
            in_tune_cents: config.in_tune_cents,
            reference: ReferenceTuning::new(config.default_reference_hz),
            ingest: None,
            estimator: Some(estimator),
            context,
            diagnostics: Arc::new(EngineDiagnostics::default()),
        };

        if let Err(e) = engine.construct(config.ingest_capacity) {
            warn!("tuner engine construction failed: {e}");
            engine.teardown();
            return Err(e);
        }
        Ok(engine)
    }

    fn construct(&mut self, ingest_capacity: usize) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ChromaError::InvalidSampleRate(self.sample_rate));
        }

        self.ingest = Some(IngestBuffer::with_capacity(ingest_capacity)?);

        let estimator = self.estimator.as_mut().ok_or(ChromaError::TornDown)?;
        estimator.init(self.sample_rate, &self.context)?;

        self.state = EngineState::Ready;
        info!(
            sample_rate = self.sample_rate,
            ingest_capacity,
            reference_hz = self.reference.hz(),
            "tuner engine ready"
        );
        Ok(())
    }

    /// Reset detection state and start accepting blocks. Idempotent.
    ///
    /// # Errors
    /// `ChromaError::InvalidState` unless the engine is `Ready` or `Active`.
    pub fn activate(&mut self) -> Result<()> {
        match self.state {
            EngineState::Ready | EngineState::Active => {}
            other => return Err(ChromaError::InvalidState(other)),
        }
        let estimator = self.estimator.as_mut().ok_or(ChromaError::TornDown)?;
        estimator.reset();
        self.diagnostics.reset();

        if self.state != EngineState::Active {
            info!("tuner engine active");
        }
        self.state = EngineState::Active;
        Ok(())
    }

    /// Stop and join the estimator, then release it and the ingest buffer.
    ///
    /// Safe to call any number of times, in any state.
    pub fn teardown(&mut self) {
        let had_resources = self.estimator.is_some() || self.ingest.is_some();

        if let Some(mut estimator) = self.estimator.take() {
            estimator.stop_thread();
        }
        self.ingest = None;

        let previous = std::mem::replace(&mut self.state, EngineState::Stopped);
        if had_resources {
            info!(?previous, "tuner engine torn down");
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Reference (A4) currently in effect.
    pub fn reference_hz(&self) -> f32 {
        self.reference.hz()
    }

    /// Staging capacity, or `None` once torn down.
    pub fn ingest_capacity(&self) -> Option<usize> {
        self.ingest.as_ref().map(IngestBuffer::capacity)
    }

    /// Execution context the estimator was bound to.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Shared counters; readable from any thread while the engine runs.
    pub fn diagnostics(&self) -> Arc<EngineDiagnostics> {
        Arc::clone(&self.diagnostics)
    }
}

impl Drop for TunerEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for TunerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunerEngine")
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("reference_hz", &self.reference.hz())
            .field("ingest_capacity", &self.ingest_capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::FixedTracker;

    fn engine_with(hz: f32) -> (TunerEngine, crate::tracker::stub::FixedTrackerProbe) {
        let tracker = FixedTracker::new(hz);
        let probe = tracker.probe();
        let engine =
            TunerEngine::with_estimator(48_000.0, &TunerConfig::default(), Box::new(tracker))
                .unwrap();
        (engine, probe)
    }

    #[test]
    fn construction_yields_ready() {
        let (engine, _) = engine_with(0.0);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.ingest_capacity(), Some(8192));
        assert_eq!(engine.reference_hz(), 440.0);
    }

    #[test]
    fn activate_is_idempotent_and_resets() {
        let (mut engine, probe) = engine_with(0.0);
        engine.activate().unwrap();
        engine.activate().unwrap();
        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(probe.resets(), 2);
    }

    #[test]
    fn teardown_twice_stops_once() {
        let (mut engine, probe) = engine_with(0.0);
        engine.activate().unwrap();
        engine.teardown();
        engine.teardown();
        drop(engine);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn activate_after_teardown_fails() {
        let (mut engine, _) = engine_with(0.0);
        engine.teardown();
        let err = engine.activate().unwrap_err();
        assert!(matches!(err, ChromaError::InvalidState(EngineState::Stopped)));
        assert_eq!(engine.ingest_capacity(), None);
    }

    #[test]
    fn invalid_sample_rate_still_stops_estimator() {
        let tracker = FixedTracker::new(0.0);
        let probe = tracker.probe();
        let err =
            TunerEngine::with_estimator(0.0, &TunerConfig::default(), Box::new(tracker))
                .unwrap_err();
        assert!(matches!(err, ChromaError::InvalidSampleRate(_)));
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn zero_capacity_fails_construction() {
        let config = TunerConfig {
            ingest_capacity: 0,
            ..TunerConfig::default()
        };
        let tracker = FixedTracker::new(0.0);
        let probe = tracker.probe();
        let err = TunerEngine::with_estimator(44_100.0, &config, Box::new(tracker)).unwrap_err();
        assert!(matches!(err, ChromaError::InvalidCapacity(0)));
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn context_is_captured_from_constructing_thread() {
        let (engine, _) = engine_with(0.0);
        assert_eq!(engine.context().thread_id, std::thread::current().id());
    }

    #[test]
    fn engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<TunerEngine>();
    }
}
