//! Per-block processing: gate → chunked ingest → mapping.
//!
//! ```text
//! 1. Skip unless Active and both audio buffers are wired
//! 2. Gate decides pass-through / silence and writes the output
//! 3. Reference control is validated (last valid value is kept)
//! 4. Input block is drained through the ingest buffer into the estimator
//! 5. Current estimate is snapshotted and mapped to pitch class/octave/cents
//! ```

use super::{diagnostics::EngineDiagnostics, EngineState, TunerEngine};
use crate::{gate::GateMode, ipc::events::TunerReadout, pitch::PitchMapping};

/// Host buffers and control values for one call.
///
/// Mirrors plugin-style port wiring: any buffer or control may be absent.
#[derive(Debug, Default)]
pub struct ProcessBlock<'a> {
    pub input: Option<&'a [f32]>,
    pub output: Option<&'a mut [f32]>,
    /// Reference (A4) frequency control.
    pub tuning: Option<f32>,
    /// Mute control; `> 0.5` mutes.
    pub mute: Option<f32>,
}

impl<'a> ProcessBlock<'a> {
    pub fn new(input: &'a [f32], output: &'a mut [f32]) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            tuning: None,
            mute: None,
        }
    }

    pub fn with_tuning(mut self, hz: f32) -> Self {
        self.tuning = Some(hz);
        self
    }

    pub fn with_mute(mut self, mute: f32) -> Self {
        self.mute = Some(mute);
        self
    }
}

impl TunerEngine {
    /// Process one host block with separate input and output buffers.
    ///
    /// Returns `None` (and leaves the output untouched) when the engine is
    /// not `Active` or either audio buffer is missing. The block covers
    /// `min(input.len(), output.len())` samples.
    pub fn process(&mut self, block: ProcessBlock<'_>) -> Option<TunerReadout> {
        if self.state != EngineState::Active {
            EngineDiagnostics::bump(&self.diagnostics.blocks_skipped, 1);
            return None;
        }
        let (Some(input), Some(output)) = (block.input, block.output) else {
            EngineDiagnostics::bump(&self.diagnostics.blocks_skipped, 1);
            return None;
        };

        let gate = GateMode::from_control(block.mute);
        gate.apply(input, output);

        let n = input.len().min(output.len());
        self.track(&input[..n], block.tuning, gate)
    }

    /// Process a block whose output shares storage with its input.
    ///
    /// The gate decision is taken first, but silence is written only after
    /// the samples have been staged, so a muted tuner keeps tracking.
    pub fn process_in_place(
        &mut self,
        buffer: &mut [f32],
        tuning: Option<f32>,
        mute: Option<f32>,
    ) -> Option<TunerReadout> {
        if self.state != EngineState::Active {
            EngineDiagnostics::bump(&self.diagnostics.blocks_skipped, 1);
            return None;
        }

        let gate = GateMode::from_control(mute);
        let readout = self.track(buffer, tuning, gate);
        gate.apply_in_place(buffer);
        readout
    }

    fn track(&mut self, input: &[f32], tuning: Option<f32>, gate: GateMode) -> Option<TunerReadout> {
        let diagnostics = &self.diagnostics;

        if !self.reference.update(tuning) {
            EngineDiagnostics::bump(&diagnostics.references_rejected, 1);
        }

        let ingest = self.ingest.as_mut()?;
        let estimator = self.estimator.as_deref_mut()?;

        let chunks = ingest.feed(input, estimator);
        EngineDiagnostics::bump(&diagnostics.chunks_fed, chunks);
        EngineDiagnostics::bump(&diagnostics.samples_ingested, input.len());
        EngineDiagnostics::bump(&diagnostics.blocks_processed, 1);
        if gate.is_muted() {
            EngineDiagnostics::bump(&diagnostics.muted_blocks, 1);
        }

        let frequency = estimator.estimated_freq();
        let reference_hz = self.reference.hz();
        let mapping = PitchMapping::from_frequency(frequency, reference_hz);

        Some(TunerReadout::new(
            frequency,
            mapping,
            reference_hz,
            gate.is_muted(),
            self.in_tune_cents,
        ))
    }
}
