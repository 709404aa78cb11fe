//! `FixedTracker` — deterministic estimator that reports whatever it is told.
//!
//! No background thread, no analysis. Lets the bridge, the mapper and the
//! hosts be exercised end-to-end without waiting on a real detector.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::debug;

use super::{snapshot::FrequencySnapshot, ExecutionContext, PitchEstimator};
use crate::error::Result;

/// Shared view into a `FixedTracker` that survives moving the tracker into
/// an engine.
#[derive(Debug, Clone, Default)]
pub struct FixedTrackerProbe {
    frequency: Arc<FrequencySnapshot>,
    samples: Arc<AtomicUsize>,
    chunks: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl FixedTrackerProbe {
    /// Change the frequency the tracker reports.
    pub fn set_frequency(&self, hz: f32) {
        self.frequency.publish(hz);
    }

    pub fn samples_seen(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn chunks_seen(&self) -> usize {
        self.chunks.load(Ordering::Relaxed)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::Relaxed)
    }
}

/// Estimator stub with a settable frequency.
#[derive(Debug)]
pub struct FixedTracker {
    probe: FixedTrackerProbe,
    stopped: bool,
}

impl FixedTracker {
    pub fn new(hz: f32) -> Self {
        let probe = FixedTrackerProbe::default();
        probe.set_frequency(hz);
        Self {
            probe,
            stopped: false,
        }
    }

    pub fn probe(&self) -> FixedTrackerProbe {
        self.probe.clone()
    }
}

impl Default for FixedTracker {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PitchEstimator for FixedTracker {
    fn init(&mut self, sample_rate: f64, context: &ExecutionContext) -> Result<()> {
        debug!(sample_rate, owner = ?context.name, "FixedTracker::init");
        self.stopped = false;
        Ok(())
    }

    fn reset(&mut self) {
        self.probe.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn add(&mut self, chunk: &[f32]) {
        self.probe.chunks.fetch_add(1, Ordering::Relaxed);
        self.probe.samples.fetch_add(chunk.len(), Ordering::Relaxed);
    }

    fn estimated_freq(&self) -> f32 {
        self.probe.frequency.load()
    }

    fn stop_thread(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.probe.stops.fetch_add(1, Ordering::Relaxed);
        }
    }
}
