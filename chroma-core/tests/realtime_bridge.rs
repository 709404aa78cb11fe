use std::f32::consts::TAU;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use chroma_core::tracker::{ExecutionContext, PitchEstimator};
use chroma_core::{
    ChromaError, EngineState, ProcessBlock, TunerConfig, TunerEngine, TuningIndicator,
};

const SR: f64 = 44_100.0;

fn sine(freq: f32, len: usize, phase_offset: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (TAU * freq * (phase_offset + i) as f32 / SR as f32).sin())
        .collect()
}

/// Drive the engine with host-sized blocks at roughly real-time pace until a
/// readout satisfies `done`, or time runs out.
fn run_until<F>(
    engine: &mut TunerEngine,
    freq: f32,
    block_len: usize,
    timeout: Duration,
    done: F,
) -> Option<chroma_core::TunerReadout>
where
    F: Fn(&chroma_core::TunerReadout) -> bool,
{
    let start = Instant::now();
    let mut offset = 0;
    let mut output = vec![0.0; block_len];
    while start.elapsed() < timeout {
        let input = sine(freq, block_len, offset);
        offset += block_len;
        let readout = engine.process(ProcessBlock::new(&input, &mut output))?;
        if done(&readout) {
            return Some(readout);
        }
        thread::sleep(Duration::from_secs_f64(block_len as f64 / SR));
    }
    None
}

#[test]
fn concert_a_is_tracked_end_to_end() {
    let mut engine = TunerEngine::new(SR, &TunerConfig::default()).unwrap();
    engine.activate().unwrap();

    let readout = run_until(&mut engine, 440.0, 256, Duration::from_secs(3), |r| {
        r.has_pitch() && (r.frequency - 440.0).abs() < 1.0
    })
    .expect("tracker converged on 440 Hz");

    assert_eq!(readout.note_name(), "A");
    assert_eq!(readout.octave, 4);
    assert!(readout.cent_deviation.abs() < 5.0);

    engine.teardown();
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn odd_block_sizes_larger_than_ingest_capacity_are_tracked() {
    let config = TunerConfig {
        ingest_capacity: 64,
        ..TunerConfig::default()
    };
    let mut engine = TunerEngine::new(SR, &config).unwrap();
    engine.activate().unwrap();

    let readout = run_until(&mut engine, 329.63, 1000, Duration::from_secs(3), |r| {
        r.has_pitch() && (r.frequency - 329.63).abs() < 1.0
    })
    .expect("tracker converged on E4");

    assert_eq!(readout.note_name(), "E");
    assert_eq!(readout.octave, 4);
    assert!(readout.cent_deviation.abs() < 6.0);
}

#[test]
fn reactivation_clears_previous_estimate() {
    let mut engine = TunerEngine::new(SR, &TunerConfig::default()).unwrap();
    engine.activate().unwrap();
    run_until(&mut engine, 440.0, 512, Duration::from_secs(3), |r| r.has_pitch())
        .expect("pitch detected");

    engine.activate().unwrap();
    let mut output = [0.0f32; 0];
    let readout = engine.process(ProcessBlock::new(&[], &mut output)).unwrap();
    assert!(!readout.has_pitch());
    assert_eq!(readout.indicator, TuningIndicator::NoSignal);
}

#[test]
fn teardown_twice_and_drop_are_safe() {
    let mut engine = TunerEngine::new(48_000.0, &TunerConfig::default()).unwrap();
    engine.activate().unwrap();
    engine.teardown();
    engine.teardown();
    assert_eq!(engine.ingest_capacity(), None);
    drop(engine);
}

/// Counts lifecycle calls; optionally fails `init` after "starting".
struct LifecycleProbe {
    fail_init: bool,
    started: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
    running: bool,
}

impl PitchEstimator for LifecycleProbe {
    fn init(&mut self, _sample_rate: f64, _context: &ExecutionContext) -> chroma_core::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.running = true;
        if self.fail_init {
            return Err(ChromaError::Estimator("simulated init failure".into()));
        }
        Ok(())
    }

    fn reset(&mut self) {}

    fn add(&mut self, _chunk: &[f32]) {
        assert!(self.running, "add() after stop_thread()");
    }

    fn estimated_freq(&self) -> f32 {
        0.0
    }

    fn stop_thread(&mut self) {
        if self.running {
            self.running = false;
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn failed_partial_construction_stops_background_work() {
    let started = Arc::new(AtomicUsize::new(0));
    let stopped = Arc::new(AtomicUsize::new(0));
    let probe = LifecycleProbe {
        fail_init: true,
        started: Arc::clone(&started),
        stopped: Arc::clone(&stopped),
        running: false,
    };

    let err = TunerEngine::with_estimator(SR, &TunerConfig::default(), Box::new(probe))
        .expect_err("init failure must surface");
    assert!(matches!(err, ChromaError::Estimator(_)));
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn stop_happens_exactly_once_across_teardown_and_drop() {
    let started = Arc::new(AtomicUsize::new(0));
    let stopped = Arc::new(AtomicUsize::new(0));
    let probe = LifecycleProbe {
        fail_init: false,
        started: Arc::clone(&started),
        stopped: Arc::clone(&stopped),
        running: false,
    };

    let mut engine =
        TunerEngine::with_estimator(SR, &TunerConfig::default(), Box::new(probe)).unwrap();
    engine.activate().unwrap();
    let input = [0.0f32; 32];
    let mut output = [0.0f32; 32];
    engine.process(ProcessBlock::new(&input, &mut output)).unwrap();

    engine.teardown();
    assert!(engine.process(ProcessBlock::new(&input, &mut output)).is_none());
    drop(engine);

    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn engine_can_be_moved_to_an_audio_thread() {
    let mut engine = TunerEngine::new(SR, &TunerConfig::default()).unwrap();
    engine.activate().unwrap();

    let handle = thread::Builder::new()
        .name("fake-audio".into())
        .spawn(move || {
            let found = run_until(&mut engine, 196.0, 128, Duration::from_secs(3), |r| {
                r.has_pitch() && (r.frequency - 196.0).abs() < 1.0
            });
            (found, engine)
        })
        .unwrap();

    let (found, engine) = handle.join().unwrap();
    let readout = found.expect("G3 detected on the audio thread");
    assert_eq!(readout.note_name(), "G");
    assert_eq!(readout.octave, 3);
    drop(engine);
}
