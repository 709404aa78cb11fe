//! McLeod-style pitch detector on top of an FFT autocorrelation.
//!
//! ## Algorithm
//!
//! 1. Remove DC, gate on RMS (`signal_threshold`).
//! 2. Autocorrelation `r(τ)` via FFT → |X|² → inverse FFT (zero padded to
//!    at least twice the window so the correlation is linear, not circular).
//! 3. Normalised square difference `n(τ) = 2·r(τ) / m(τ)` where
//!    `m(τ) = Σ x[j]² + x[j+τ]²`, updated incrementally.
//! 4. Walk the positive lobes after the first negative crossing, keep the
//!    maximum of each lobe ("key maxima").
//! 5. Pick the first key maximum ≥ `clarity_threshold · best`, refine it by
//!    parabolic interpolation, convert lag → Hz, range check.
//!
//! Runs only on the tracker worker thread; it owns all of its scratch
//! storage, sized once in `new`.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

/// Detector tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct DetectorConfig {
    /// Analysis window in samples. Default: 2048.
    pub window_size: usize,
    /// New samples required between two analyses. Default: 512.
    pub hop_size: usize,
    /// Lowest reported frequency (Hz). Default: 30.
    pub min_frequency: f32,
    /// Highest reported frequency (Hz). Default: 2000.
    pub max_frequency: f32,
    /// RMS below which a window is treated as silence. Default: 0.001.
    pub signal_threshold: f32,
    /// Fraction of the best key maximum a candidate must reach. Default: 0.9.
    pub clarity_threshold: f32,
    /// Capacity of the RT → worker sample ring. Default: 65 536.
    pub ring_capacity: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            min_frequency: 30.0,
            max_frequency: 2000.0,
            signal_threshold: 0.001,
            clarity_threshold: 0.9,
            ring_capacity: crate::buffering::SAMPLE_RING_CAPACITY,
        }
    }
}

impl DetectorConfig {
    pub fn normalize(&mut self) {
        self.window_size = self.window_size.clamp(256, 16_384);
        self.hop_size = self.hop_size.clamp(1, self.window_size);
        self.min_frequency = self.min_frequency.clamp(10.0, 1000.0);
        self.max_frequency = self.max_frequency.clamp(self.min_frequency * 2.0, 8000.0);
        self.signal_threshold = self.signal_threshold.clamp(0.0, 0.5);
        self.clarity_threshold = self.clarity_threshold.clamp(0.5, 1.0);
        self.ring_capacity = self.ring_capacity.clamp(self.window_size, 1 << 22);
    }
}

/// FFT-based normalised square difference pitch detector.
pub struct AutocorrelationDetector {
    sample_rate: f32,
    config: DetectorConfig,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    frame: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    nsdf: Vec<f32>,
    key_maxima: Vec<(usize, f32)>,
}

impl AutocorrelationDetector {
    pub fn new(sample_rate: f32, config: DetectorConfig) -> Self {
        let window = config.window_size;
        let fft_len = (window * 2).next_power_of_two();

        let mut planner = FftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(fft_len);
        let fft_inverse = planner.plan_fft_inverse(fft_len);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());

        Self {
            sample_rate,
            config,
            fft_forward,
            fft_inverse,
            frame: vec![0.0; window],
            spectrum: vec![Complex::new(0.0, 0.0); fft_len],
            fft_scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            nsdf: vec![0.0; window],
            key_maxima: Vec::with_capacity(window / 2),
        }
    }

    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    /// Estimate the fundamental of `window` (must hold `window_size()` samples;
    /// extra samples are ignored, fewer yield `None`).
    pub fn estimate(&mut self, window: &[f32]) -> Option<f32> {
        let n = self.config.window_size;
        if window.len() < n {
            return None;
        }
        let window = &window[window.len() - n..];

        let mean = window.iter().sum::<f32>() / n as f32;
        let mut energy = 0.0f32;
        for (dst, &src) in self.frame.iter_mut().zip(window) {
            *dst = src - mean;
            energy += *dst * *dst;
        }
        let rms = (energy / n as f32).sqrt();
        if !rms.is_finite() || rms < self.config.signal_threshold || energy <= f32::EPSILON {
            return None;
        }

        self.autocorrelate();
        self.normalise();

        let min_tau = ((self.sample_rate / self.config.max_frequency).floor() as usize).max(1);
        let max_tau = ((self.sample_rate / self.config.min_frequency).ceil() as usize).min(n - 2);
        if min_tau >= max_tau {
            return None;
        }

        self.collect_key_maxima(min_tau, max_tau);
        let best = self
            .key_maxima
            .iter()
            .map(|&(_, v)| v)
            .fold(f32::MIN, f32::max);
        if best <= 0.0 {
            return None;
        }
        let cutoff = self.config.clarity_threshold * best;
        let &(tau, _) = self.key_maxima.iter().find(|&&(_, v)| v >= cutoff)?;

        let period = tau as f32 + self.parabolic_shift(tau);
        let freq = self.sample_rate / period;

        let in_range = freq >= self.config.min_frequency * 0.95
            && freq <= self.config.max_frequency * 1.05;
        (freq.is_finite() && in_range).then_some(freq)
    }

    fn autocorrelate(&mut self) {
        let fft_len = self.spectrum.len();
        for (i, slot) in self.spectrum.iter_mut().enumerate() {
            let re = self.frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(re, 0.0);
        }
        self.fft_forward
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);
        for c in self.spectrum.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.fft_inverse
            .process_with_scratch(&mut self.spectrum, &mut self.fft_scratch);

        let scale = 1.0 / fft_len as f32;
        for c in self.spectrum.iter_mut() {
            c.re *= scale;
        }
    }

    /// Turn the raw autocorrelation in `spectrum[..].re` into `nsdf`.
    fn normalise(&mut self) {
        let n = self.frame.len();
        let mut m = 2.0 * self.spectrum[0].re;
        for tau in 0..n {
            if tau > 0 {
                let head = self.frame[tau - 1];
                let tail = self.frame[n - tau];
                m -= head * head + tail * tail;
            }
            self.nsdf[tau] = if m > f32::EPSILON {
                2.0 * self.spectrum[tau].re / m
            } else {
                0.0
            };
        }
    }

    fn collect_key_maxima(&mut self, min_tau: usize, max_tau: usize) {
        self.key_maxima.clear();

        // Skip the lobe around τ = 0.
        let mut tau = 1;
        while tau < max_tau && self.nsdf[tau] > 0.0 {
            tau += 1;
        }

        while tau < max_tau {
            while tau < max_tau && self.nsdf[tau] <= 0.0 {
                tau += 1;
            }
            let mut peak: Option<(usize, f32)> = None;
            while tau < max_tau && self.nsdf[tau] > 0.0 {
                if peak.map_or(true, |(_, v)| self.nsdf[tau] > v) {
                    peak = Some((tau, self.nsdf[tau]));
                }
                tau += 1;
            }
            if let Some(p) = peak.filter(|&(t, _)| t >= min_tau) {
                self.key_maxima.push(p);
            }
        }
    }

    fn parabolic_shift(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 >= self.nsdf.len() {
            return 0.0;
        }
        let (a, b, c) = (self.nsdf[tau - 1], self.nsdf[tau], self.nsdf[tau + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() < 1e-9 {
            0.0
        } else {
            0.5 * (a - c) / denom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SR: f32 = 44_100.0;

    fn sine(freq: f32, len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (TAU * freq * i as f32 / SR).sin())
            .collect()
    }

    fn detector() -> AutocorrelationDetector {
        AutocorrelationDetector::new(SR, DetectorConfig::default())
    }

    #[test]
    fn detects_concert_a() {
        let mut det = detector();
        let f = det.estimate(&sine(440.0, 2048, 0.5)).expect("pitch");
        assert!((f - 440.0).abs() < 1.0, "f={f}");
    }

    #[test]
    fn detects_low_e_string() {
        let mut det = detector();
        let f = det.estimate(&sine(82.41, 2048, 0.5)).expect("pitch");
        assert!((f - 82.41).abs() < 0.5, "f={f}");
    }

    #[test]
    fn harmonic_rich_tone_reports_fundamental() {
        let mut det = detector();
        let fundamental = sine(220.0, 2048, 0.4);
        let second = sine(440.0, 2048, 0.3);
        let third = sine(660.0, 2048, 0.2);
        let mix: Vec<f32> = fundamental
            .iter()
            .zip(&second)
            .zip(&third)
            .map(|((a, b), c)| a + b + c)
            .collect();
        let f = det.estimate(&mix).expect("pitch");
        assert!((f - 220.0).abs() < 1.0, "f={f}");
    }

    #[test]
    fn silence_is_rejected() {
        let mut det = detector();
        assert_eq!(det.estimate(&vec![0.0; 2048]), None);
    }

    #[test]
    fn dc_offset_is_ignored() {
        let mut det = detector();
        assert_eq!(det.estimate(&vec![0.7; 2048]), None);
    }

    #[test]
    fn short_window_is_rejected() {
        let mut det = detector();
        assert_eq!(det.estimate(&sine(440.0, 100, 0.5)), None);
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut cfg = DetectorConfig {
            window_size: 3,
            hop_size: 0,
            min_frequency: 0.0,
            max_frequency: 1.0,
            signal_threshold: -1.0,
            clarity_threshold: 3.0,
            ring_capacity: 0,
        };
        cfg.normalize();
        assert_eq!(cfg.window_size, 256);
        assert_eq!(cfg.hop_size, 1);
        assert_eq!(cfg.min_frequency, 10.0);
        assert_eq!(cfg.max_frequency, 20.0);
        assert_eq!(cfg.signal_threshold, 0.0);
        assert_eq!(cfg.clarity_threshold, 1.0);
        assert_eq!(cfg.ring_capacity, 256);
    }
}
