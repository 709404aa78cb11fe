//! Pass-through / mute gate.
//!
//! Decided once per block, before the estimator sees anything, so the output
//! is always either an exact copy of the input or clean silence.

/// Mute control values strictly above this mute the output.
pub const MUTE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    PassThrough,
    Muted,
}

impl GateMode {
    /// Interpret the optional mute control. Absent (or NaN) means pass-through.
    #[inline]
    pub fn from_control(mute: Option<f32>) -> Self {
        match mute {
            Some(v) if v > MUTE_THRESHOLD => Self::Muted,
            _ => Self::PassThrough,
        }
    }

    pub fn is_muted(self) -> bool {
        self == Self::Muted
    }

    /// Write `input` (or silence) into `output`.
    ///
    /// Covers `min(input.len(), output.len())` samples; any extra output
    /// samples are left untouched.
    #[inline]
    pub fn apply(self, input: &[f32], output: &mut [f32]) {
        let n = input.len().min(output.len());
        match self {
            Self::Muted => output[..n].fill(0.0),
            Self::PassThrough => output[..n].copy_from_slice(&input[..n]),
        }
    }

    /// In-place variant: the output *is* the input, so pass-through is a no-op.
    #[inline]
    pub fn apply_in_place(self, buffer: &mut [f32]) {
        if self.is_muted() {
            buffer.fill(0.0);
        }
    }
}
