use std::sync::Arc;

use chroma_core::buffering::ingest::IngestBuffer;
use chroma_core::tracker::{ExecutionContext, PitchEstimator};
use chroma_core::{ProcessBlock, TunerConfig, TunerEngine};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Estimator that records every chunk it is handed.
#[derive(Clone, Default)]
struct RecordingEstimator {
    chunks: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl RecordingEstimator {
    fn sizes(&self) -> Vec<usize> {
        self.chunks.lock().iter().map(Vec::len).collect()
    }

    fn joined(&self) -> Vec<f32> {
        self.chunks.lock().concat()
    }

    fn clear(&self) {
        self.chunks.lock().clear();
    }
}

impl PitchEstimator for RecordingEstimator {
    fn init(&mut self, _sample_rate: f64, _context: &ExecutionContext) -> chroma_core::Result<()> {
        Ok(())
    }

    fn reset(&mut self) {}

    fn add(&mut self, chunk: &[f32]) {
        self.chunks.lock().push(chunk.to_vec());
    }

    fn estimated_freq(&self) -> f32 {
        0.0
    }

    fn stop_thread(&mut self) {}
}

fn numbered(len: usize, offset: usize) -> Vec<f32> {
    (0..len).map(|i| (offset + i) as f32).collect()
}

#[test]
fn every_block_length_is_delivered_exactly() {
    const CAPACITY: usize = 64;
    let mut ingest = IngestBuffer::with_capacity(CAPACITY).unwrap();
    let mut recorder = RecordingEstimator::default();

    for n in 0..=CAPACITY * 4 + 1 {
        recorder.clear();
        let block = numbered(n, 0);
        let chunks = ingest.feed(&block, &mut recorder);

        let sizes = recorder.sizes();
        assert_eq!(chunks, sizes.len(), "n={n}");
        assert_eq!(sizes.iter().sum::<usize>(), n, "n={n}");
        assert_eq!(chunks, n.div_ceil(CAPACITY), "n={n}");
        if let Some((_, head)) = sizes.split_last() {
            assert!(head.iter().all(|&s| s == CAPACITY), "n={n} sizes={sizes:?}");
        }
        assert!(sizes.iter().all(|&s| s > 0 && s <= CAPACITY));
        assert_eq!(recorder.joined(), block, "n={n}");
    }
}

#[test]
fn random_host_block_sizes_preserve_the_stream() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let recorder = RecordingEstimator::default();
    let config = TunerConfig {
        ingest_capacity: 256,
        ..TunerConfig::default()
    };
    let mut engine =
        TunerEngine::with_estimator(44_100.0, &config, Box::new(recorder.clone())).unwrap();
    engine.activate().unwrap();

    let mut expected = Vec::new();
    let mut offset = 0;
    for _ in 0..200 {
        let n = rng.gen_range(0..2000);
        let block = numbered(n, offset);
        offset += n;
        let mut output = vec![0.0; n];
        engine
            .process(ProcessBlock::new(&block, &mut output))
            .expect("active engine");
        assert_eq!(output, block);
        expected.extend_from_slice(&block);
    }

    assert!(recorder.sizes().iter().all(|&s| s > 0 && s <= 256));
    assert_eq!(recorder.joined(), expected);
    assert_eq!(
        engine.diagnostics().snapshot().samples_ingested,
        expected.len()
    );
}

#[test]
fn random_blocks_through_muted_engine_still_feed_estimator() {
    let mut rng = StdRng::seed_from_u64(7);
    let recorder = RecordingEstimator::default();
    let config = TunerConfig {
        ingest_capacity: 100,
        ..TunerConfig::default()
    };
    let mut engine =
        TunerEngine::with_estimator(48_000.0, &config, Box::new(recorder.clone())).unwrap();
    engine.activate().unwrap();

    let mut total = 0;
    for _ in 0..50 {
        let n = rng.gen_range(1..1000);
        let block: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut output = vec![0.5; n];
        engine
            .process(ProcessBlock::new(&block, &mut output).with_mute(0.9))
            .unwrap();
        assert!(output.iter().all(|&s| s == 0.0));
        total += n;
    }
    assert_eq!(recorder.sizes().iter().sum::<usize>(), total);
}
