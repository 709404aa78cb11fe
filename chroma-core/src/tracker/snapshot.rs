//! Single-slot, lock-free publication of the current frequency estimate.
//!
//! The writer replaces the whole value with one atomic store; readers take
//! one atomic load. Neither side can block the other.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// An `f32` published through an `AtomicU32` bit pattern.
#[derive(Debug)]
pub struct FrequencySnapshot {
    bits: AtomicU32,
}

impl FrequencySnapshot {
    pub fn new(hz: f32) -> Self {
        Self {
            bits: AtomicU32::new(hz.to_bits()),
        }
    }

    /// Replace the published value.
    #[inline]
    pub fn publish(&self, hz: f32) {
        self.bits.store(hz.to_bits(), Ordering::Release);
    }

    /// Latest published value. Never blocks.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl Default for FrequencySnapshot {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Frequency estimate tagged with the detection generation it belongs to.
///
/// Packs `(generation, f32 bits)` into one `AtomicU64`, so a reset and the
/// value it clears change together, and a publish for an older generation
/// can never land after the reset.
#[derive(Debug, Default)]
pub struct GenerationalEstimate {
    packed: AtomicU64,
}

impl GenerationalEstimate {
    #[inline]
    fn pack(generation: u32, hz: f32) -> u64 {
        (u64::from(generation) << 32) | u64::from(hz.to_bits())
    }

    #[inline]
    fn unpack(packed: u64) -> (u32, f32) {
        ((packed >> 32) as u32, f32::from_bits(packed as u32))
    }

    /// Latest estimate. Never blocks.
    #[inline]
    pub fn load(&self) -> f32 {
        Self::unpack(self.packed.load(Ordering::Acquire)).1
    }

    /// Generation currently in effect.
    #[inline]
    pub fn generation(&self) -> u32 {
        Self::unpack(self.packed.load(Ordering::Acquire)).0
    }

    /// Start a new generation with no estimate. Returns the new generation.
    pub fn reset(&self) -> u32 {
        let mut current = self.packed.load(Ordering::Acquire);
        loop {
            let next = Self::unpack(current).0.wrapping_add(1);
            match self.packed.compare_exchange_weak(
                current,
                Self::pack(next, 0.0),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Publish `hz` only if `generation` is still current.
    pub fn publish_if(&self, generation: u32, hz: f32) -> bool {
        let mut current = self.packed.load(Ordering::Acquire);
        loop {
            if Self::unpack(current).0 != generation {
                return false;
            }
            match self.packed.compare_exchange_weak(
                current,
                Self::pack(generation, hz),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}
