//! Tuner configuration (JSON file, camelCase keys, every field optional).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    buffering::ingest::DEFAULT_INGEST_CAPACITY,
    error::{ChromaError, Result},
    pitch::{DEFAULT_IN_TUNE_CENTS, DEFAULT_REFERENCE_HZ},
    tracker::DetectorConfig,
};

/// Lowest reference (A4) a config may carry, in Hz.
pub const MIN_REFERENCE_HZ: f32 = 100.0;

/// Highest reference (A4) a config may carry, in Hz.
pub const MAX_REFERENCE_HZ: f32 = 1000.0;

/// Configuration for `TunerEngine` and its default tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TunerConfig {
    /// Fixed staging buffer size in samples. Default: 8192.
    pub ingest_capacity: usize,
    /// Reference (A4) used until a tuning control arrives. Default: 440.
    pub default_reference_hz: f32,
    /// Half-width of the in-tune band in cents. Default: 2.
    pub in_tune_cents: f32,
    /// Detector settings for the threaded tracker.
    pub detector: DetectorConfig,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            ingest_capacity: DEFAULT_INGEST_CAPACITY,
            default_reference_hz: DEFAULT_REFERENCE_HZ,
            in_tune_cents: DEFAULT_IN_TUNE_CENTS,
            detector: DetectorConfig::default(),
        }
    }
}

impl TunerConfig {
    /// Clamp every field into its usable range.
    pub fn normalize(&mut self) {
        self.ingest_capacity = self.ingest_capacity.clamp(64, 1 << 20);
        if !(self.default_reference_hz.is_finite() && self.default_reference_hz > 0.0) {
            self.default_reference_hz = DEFAULT_REFERENCE_HZ;
        }
        self.default_reference_hz = self.default_reference_hz.clamp(MIN_REFERENCE_HZ, MAX_REFERENCE_HZ);
        if !self.in_tune_cents.is_finite() {
            self.in_tune_cents = DEFAULT_IN_TUNE_CENTS;
        }
        self.in_tune_cents = self.in_tune_cents.clamp(0.1, 50.0);
        self.detector.normalize();
    }

    /// Reject values that `normalize` would silently rewrite beyond recognition.
    pub fn validate(&self) -> Result<()> {
        if self.ingest_capacity == 0 {
            return Err(ChromaError::Config("ingestCapacity must be > 0".into()));
        }
        if !(self.default_reference_hz.is_finite() && self.default_reference_hz > 0.0) {
            return Err(ChromaError::Config(format!(
                "defaultReferenceHz must be a positive number, got {}",
                self.default_reference_hz
            )));
        }
        if self.detector.min_frequency >= self.detector.max_frequency {
            return Err(ChromaError::Config(
                "detector.minFrequency must be below detector.maxFrequency".into(),
            ));
        }
        Ok(())
    }

    /// Parse and normalize a JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }

    /// Strict load: missing file or malformed JSON is an error.
    pub fn try_load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Lenient load: falls back to defaults (and logs why).
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                debug!(path = %path.display(), "tuner config loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), "using default tuner config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
