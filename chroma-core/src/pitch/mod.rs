//! Frequency → musical pitch mapping.
//!
//! ## Algorithm
//!
//! ```text
//! estimated <= 0          → pitch class 0, octave 0, 0 cents ("no signal")
//! note   = 12·log2(f / ref) + 69
//! near   = round(note)                    (ties away from zero)
//! class  = near mod 12                    (Euclidean, always 0..=11)
//! octave = floor(near / 12) − 1           (MIDI octaves: A4 = 69)
//! cents  = (note − near) · 100
//! ```
//!
//! The logarithm is evaluated in `f64` so that octave boundaries such as
//! C4 = 261.6256 Hz land on an integer note number.

pub mod reference;

pub use reference::ReferenceTuning;

use serde::{Deserialize, Serialize};

/// MIDI note number of the reference note (A4).
pub const REFERENCE_MIDI_NOTE: i32 = 69;

/// Concert pitch.
pub const DEFAULT_REFERENCE_HZ: f32 = 440.0;

/// Below this a frequency is shown as "no signal" even if the estimator
/// reports something.
pub const DISPLAY_FLOOR_HZ: f32 = 20.0;

/// Default half-width of the "in tune" band in cents.
pub const DEFAULT_IN_TUNE_CENTS: f32 = 2.0;

/// Sharp spelling, indexed by pitch class.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Result of mapping one frequency estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PitchMapping {
    /// Equal-tempered pitch class, `0 = C` … `11 = B`.
    pub pitch_class: u8,
    /// MIDI-convention octave; may be negative.
    pub octave: i32,
    /// Signed distance from the nearest semitone, nominally in (−50, 50].
    pub cent_deviation: f32,
}

impl PitchMapping {
    /// The "no pitch detected" sentinel.
    pub const NO_SIGNAL: Self = Self {
        pitch_class: 0,
        octave: 0,
        cent_deviation: 0.0,
    };

    /// Map `estimated_hz` against `reference_hz` (the frequency of A4).
    ///
    /// Callers must pass a positive reference; `ReferenceTuning` guarantees
    /// this. A non-positive or non-finite reference yields `NO_SIGNAL`
    /// rather than a NaN.
    pub fn from_frequency(estimated_hz: f32, reference_hz: f32) -> Self {
        if !estimated_hz.is_finite() || estimated_hz <= 0.0 {
            return Self::NO_SIGNAL;
        }
        if !ReferenceTuning::is_valid(reference_hz) {
            return Self::NO_SIGNAL;
        }

        let note_number =
            12.0 * (estimated_hz as f64 / reference_hz as f64).log2() + REFERENCE_MIDI_NOTE as f64;
        let nearest = note_number.round();
        let nearest_note = nearest as i64;

        Self {
            pitch_class: nearest_note.rem_euclid(12) as u8,
            octave: (nearest_note.div_euclid(12) - 1) as i32,
            cent_deviation: ((note_number - nearest) * 100.0) as f32,
        }
    }

    /// MIDI note number of the nearest semitone.
    pub fn midi_note(&self) -> i32 {
        (self.octave + 1) * 12 + self.pitch_class as i32
    }

    pub fn note_name(&self) -> &'static str {
        NOTE_NAMES[(self.pitch_class % 12) as usize]
    }
}

/// Which way the string needs to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TuningIndicator {
    NoSignal,
    Flat,
    InTune,
    Sharp,
}

impl TuningIndicator {
    /// Classify a readout. `tolerance_cents` is the half-width of the
    /// in-tune band.
    pub fn classify(frequency_hz: f32, cent_deviation: f32, tolerance_cents: f32) -> Self {
        if frequency_hz.is_nan() || frequency_hz < DISPLAY_FLOOR_HZ {
            Self::NoSignal
        } else if cent_deviation.abs() < tolerance_cents {
            Self::InTune
        } else if cent_deviation < 0.0 {
            Self::Flat
        } else {
            Self::Sharp
        }
    }
}

/// Free-function form of [`PitchMapping::from_frequency`].
pub fn map_frequency(estimated_hz: f32, reference_hz: f32) -> PitchMapping {
    PitchMapping::from_frequency(estimated_hz, reference_hz)
}
