//! `ThreadedTracker` — the default estimator: RT-side ingest, background analysis.
//!
//! ```text
//! add(chunk)  ──push_slice──►  SPSC ring  ──pop_slice──►  worker thread
//!                                                            │
//!                                        park_timeout when the ring is empty
//!                                                            ▼
//! estimated_freq() ◄── GenerationalEstimate ◄── detector.estimate(window)
//! ```
//!
//! The real-time side only ever touches the ring producer and a handful of
//! atomics. It never wakes the worker; the worker polls the ring and idles
//! with `park_timeout`. The detector, its FFT plans and the sliding analysis
//! window live on the worker thread.
//!
//! ## Reset
//!
//! `reset` records how many samples had been pushed so far and starts a new
//! estimate generation in one atomic step. The worker discards exactly the
//! samples pushed before that mark, and anything it was analysing for the
//! old generation fails to publish.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    detector::{AutocorrelationDetector, DetectorConfig},
    snapshot::GenerationalEstimate,
    ExecutionContext, PitchEstimator,
};
use crate::{
    buffering::{create_sample_ring, Consumer, Producer, SampleConsumer, SampleProducer},
    error::{ChromaError, Result},
};

/// Samples drained from the ring per worker iteration.
const DRAIN_CHUNK: usize = 1024;

/// How long the worker parks when the ring is empty.
const IDLE_WAIT: Duration = Duration::from_millis(5);

/// State shared between the RT side and the worker.
#[derive(Debug, Default)]
struct TrackerShared {
    estimate: GenerationalEstimate,
    running: AtomicBool,
    /// Total samples pushed before the most recent reset.
    reset_mark: AtomicU64,
    dropped_samples: AtomicUsize,
    analyses: AtomicUsize,
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub dropped_samples: usize,
    pub analyses: usize,
}

/// Estimator that analyses on its own background thread.
pub struct ThreadedTracker {
    config: DetectorConfig,
    shared: Arc<TrackerShared>,
    producer: Option<SampleProducer>,
    /// Samples accepted by the ring since `init`.
    pushed: u64,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedTracker {
    pub fn new(mut config: DetectorConfig) -> Self {
        config.normalize();
        Self {
            config,
            shared: Arc::new(TrackerShared::default()),
            producer: None,
            pushed: 0,
            worker: None,
        }
    }

    /// `true` while a worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.shared.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            dropped_samples: self.shared.dropped_samples.load(Ordering::Relaxed),
            analyses: self.shared.analyses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ThreadedTracker {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl PitchEstimator for ThreadedTracker {
    fn init(&mut self, sample_rate: f64, context: &ExecutionContext) -> Result<()> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ChromaError::InvalidSampleRate(sample_rate));
        }
        if self.worker.is_some() {
            debug!("tracker re-initialised; stopping previous worker");
            self.stop_thread();
        }

        let (producer, consumer) = create_sample_ring(self.config.ring_capacity);
        self.pushed = 0;
        self.shared.reset_mark.store(0, Ordering::Release);
        let generation = self.shared.estimate.reset();
        self.shared.running.store(true, Ordering::Release);

        let worker = Worker {
            detector: AutocorrelationDetector::new(sample_rate as f32, self.config.clone()),
            hop_size: self.config.hop_size,
            consumer,
            consumed: 0,
            generation,
            shared: Arc::clone(&self.shared),
        };

        let name = context.worker_name("pitch");
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker.run())
            .map_err(|e| {
                self.shared.running.store(false, Ordering::Release);
                ChromaError::ThreadSpawn(e)
            })?;

        info!(
            thread = name.as_str(),
            sample_rate,
            window = self.config.window_size,
            "pitch tracker started"
        );

        self.producer = Some(producer);
        self.worker = Some(handle);
        Ok(())
    }

    fn reset(&mut self) {
        // Mark first, so a worker that sees the new generation also sees it.
        self.shared.reset_mark.store(self.pushed, Ordering::Release);
        self.shared.estimate.reset();
    }

    fn add(&mut self, chunk: &[f32]) {
        let Some(producer) = self.producer.as_mut() else {
            return;
        };
        let written = producer.push_slice(chunk);
        self.pushed += written as u64;
        if written < chunk.len() {
            self.shared
                .dropped_samples
                .fetch_add(chunk.len() - written, Ordering::Relaxed);
        }
    }

    fn estimated_freq(&self) -> f32 {
        self.shared.estimate.load()
    }

    fn stop_thread(&mut self) {
        self.shared.running.store(false, Ordering::Release);

        if let Some(handle) = self.worker.take() {
            handle.thread().unpark();
            let name = handle.thread().name().unwrap_or("pitch").to_owned();
            if handle.join().is_err() {
                warn!(thread = name.as_str(), "pitch tracker thread panicked");
            } else {
                info!(thread = name.as_str(), "pitch tracker stopped");
            }
        }
        self.producer = None;
    }
}

impl Drop for ThreadedTracker {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

/// Everything the worker thread owns.
struct Worker {
    detector: AutocorrelationDetector,
    hop_size: usize,
    consumer: SampleConsumer,
    /// Samples popped from the ring since `init`.
    consumed: u64,
    /// Generation the current window belongs to.
    generation: u32,
    shared: Arc<TrackerShared>,
}

impl Worker {
    fn run(mut self) {
        let window_len = self.detector.window_size();
        let mut window = vec![0f32; window_len];
        let mut filled = 0usize;
        let mut since_analysis = 0usize;
        let mut raw = vec![0f32; DRAIN_CHUNK];

        while self.shared.running.load(Ordering::Acquire) {
            let n = self.consumer.pop_slice(&mut raw);
            let popped_from = self.consumed;
            self.consumed += n as u64;

            let mut fresh = 0..n;
            let generation = self.shared.estimate.generation();
            if generation != self.generation {
                self.generation = generation;
                let mark = self.shared.reset_mark.load(Ordering::Acquire);
                // The batch just popped may straddle the mark; keep its tail.
                let keep_from = mark.saturating_sub(popped_from).min(n as u64) as usize;
                fresh = keep_from..n;
                let discarded = keep_from as u64 + self.discard_until(mark, &mut raw);
                filled = 0;
                since_analysis = 0;
                debug!(discarded, "pitch tracker reset");
            }

            if fresh.is_empty() {
                if n == 0 {
                    thread::park_timeout(IDLE_WAIT);
                }
                continue;
            }

            let incoming = &raw[fresh];
            slide_in(&mut window, incoming);
            filled = (filled + incoming.len()).min(window_len);
            since_analysis += incoming.len();

            if filled < window_len || since_analysis < self.hop_size {
                continue;
            }
            since_analysis = 0;

            let hz = self.detector.estimate(&window).unwrap_or(0.0);
            self.shared.analyses.fetch_add(1, Ordering::Relaxed);

            // Fails if a reset started a newer generation meanwhile.
            self.shared.estimate.publish_if(self.generation, hz);
        }

        debug!("pitch tracker worker exiting");
    }

    /// Pop samples until `mark` samples have been consumed in total.
    /// Only pops anything when the whole of the last batch predated the mark.
    fn discard_until(&mut self, mark: u64, scratch: &mut [f32]) -> u64 {
        let mut discarded = 0;
        while self.consumed < mark {
            let want = (mark - self.consumed).min(scratch.len() as u64) as usize;
            let n = self.consumer.pop_slice(&mut scratch[..want]);
            if n == 0 {
                break;
            }
            self.consumed += n as u64;
            discarded += n as u64;
        }
        discarded
    }
}

/// Shift `incoming` into the tail of `window`, discarding the oldest samples.
fn slide_in(window: &mut [f32], incoming: &[f32]) {
    let len = window.len();
    if incoming.len() >= len {
        window.copy_from_slice(&incoming[incoming.len() - len..]);
        return;
    }
    window.copy_within(incoming.len().., 0);
    window[len - incoming.len()..].copy_from_slice(incoming);
}
