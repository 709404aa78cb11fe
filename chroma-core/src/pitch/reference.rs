//! Guarded reference (A4) frequency.
//!
//! The control input is read every block. Anything that is not a finite,
//! strictly positive number is ignored and the last accepted value stays in
//! effect, so the mapper never sees a degenerate reference.

use super::DEFAULT_REFERENCE_HZ;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceTuning {
    current: f32,
}

impl ReferenceTuning {
    /// Start from `initial_hz`, or concert pitch if `initial_hz` is unusable.
    pub fn new(initial_hz: f32) -> Self {
        let current = if Self::is_valid(initial_hz) {
            initial_hz
        } else {
            DEFAULT_REFERENCE_HZ
        };
        Self { current }
    }

    pub fn is_valid(hz: f32) -> bool {
        hz.is_finite() && hz > 0.0
    }

    /// Reference currently in effect. Always positive and finite.
    #[inline]
    pub fn hz(&self) -> f32 {
        self.current
    }

    /// Apply the per-block control value. Returns `false` when a value was
    /// supplied but rejected. An absent control keeps the current value.
    #[inline]
    pub fn update(&mut self, control: Option<f32>) -> bool {
        match control {
            None => true,
            Some(hz) if Self::is_valid(hz) => {
                self.current = hz;
                true
            }
            Some(_) => false,
        }
    }
}

impl Default for ReferenceTuning {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_HZ)
    }
}
