//! Per-block tuner readout.

use serde::{Deserialize, Serialize};

use crate::pitch::{PitchMapping, TuningIndicator, NOTE_NAMES};

/// Control outputs produced by one `process` call.
///
/// `Copy` and heap-free so it can travel through a lock-free ring from the
/// audio callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunerReadout {
    /// Raw estimate in Hz; `<= 0` means no pitch.
    pub frequency: f32,
    /// `0 = C` … `11 = B`.
    pub pitch_class: u8,
    pub octave: i32,
    pub cent_deviation: f32,
    /// Reference (A4) in effect for this block.
    pub reference_frequency: f32,
    /// Whether the audio output was silenced for this block.
    pub muted: bool,
    pub indicator: TuningIndicator,
}

impl TunerReadout {
    pub fn new(
        frequency: f32,
        mapping: PitchMapping,
        reference_frequency: f32,
        muted: bool,
        in_tune_cents: f32,
    ) -> Self {
        Self {
            frequency,
            pitch_class: mapping.pitch_class,
            octave: mapping.octave,
            cent_deviation: mapping.cent_deviation,
            reference_frequency,
            muted,
            indicator: TuningIndicator::classify(frequency, mapping.cent_deviation, in_tune_cents),
        }
    }

    pub fn has_pitch(&self) -> bool {
        self.frequency > 0.0
    }

    pub fn note_name(&self) -> &'static str {
        NOTE_NAMES[(self.pitch_class % 12) as usize]
    }

    pub fn mapping(&self) -> PitchMapping {
        PitchMapping {
            pitch_class: self.pitch_class,
            octave: self.octave,
            cent_deviation: self.cent_deviation,
        }
    }
}
