//! Offline run: stream a decoded clip through the engine in host-sized blocks.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use chroma_core::{ProcessBlock, TunerConfig, TunerEngine, TunerReadout};
use tracing::{debug, info};

use crate::wav::MonoClip;

#[derive(Debug, Clone, Copy)]
pub struct OfflineOptions {
    pub block_size: usize,
    /// Tuning control sent with every block.
    pub reference_hz: Option<f32>,
    pub mute: bool,
    /// Multiple of real time; `0` runs unpaced.
    pub speed: f64,
}

/// One readout per processed block, with the block's start time.
pub fn run<F>(
    clip: &MonoClip,
    config: &TunerConfig,
    options: OfflineOptions,
    mut on_readout: F,
) -> anyhow::Result<Option<TunerReadout>>
where
    F: FnMut(f64, &TunerReadout) -> anyhow::Result<()>,
{
    let block_size = options.block_size.max(1);
    let sample_rate = f64::from(clip.sample_rate);
    let pace = if options.speed > 0.0 {
        let secs = block_size as f64 / sample_rate / options.speed;
        Some(
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid pacing for --speed {}", options.speed))?,
        )
    } else {
        None
    };

    let mut engine =
        TunerEngine::new(sample_rate, config).context("failed to start tuner engine")?;
    engine.activate()?;
    info!(
        samples = clip.samples.len(),
        sample_rate,
        block_size,
        duration_secs = clip.duration_secs(),
        "streaming clip"
    );

    let mute = if options.mute { 1.0 } else { 0.0 };
    let mut output = vec![0.0f32; block_size];
    let mut last_pitched = None;

    for (index, input) in clip.samples.chunks(block_size).enumerate() {
        let mut block = ProcessBlock::new(input, &mut output[..input.len()]).with_mute(mute);
        block.tuning = options.reference_hz;

        let Some(readout) = engine.process(block) else {
            continue;
        };
        if readout.has_pitch() {
            last_pitched = Some(readout);
        }
        on_readout((index * block_size) as f64 / sample_rate, &readout)?;

        if let Some(pace) = pace {
            thread::sleep(pace);
        }
    }

    let diagnostics = engine.diagnostics().snapshot();
    debug!(?diagnostics, "clip finished");
    engine.teardown();
    Ok(last_pitched)
}
