//! Where the tuner config lives and how the CLI loads it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chroma_core::{
    config::{MAX_REFERENCE_HZ, MIN_REFERENCE_HZ},
    TunerConfig,
};
use tracing::info;

/// Platform data directory + `chromasense/config.json`.
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ChromaSense")
            .join("config.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("chromasense")
            .join("config.json")
    }
}

/// An explicit `--config` must parse; the default location is optional.
pub fn load_config(
    explicit: Option<&Path>,
    reference_override: Option<f32>,
) -> anyhow::Result<TunerConfig> {
    let mut config = match explicit {
        Some(path) => TunerConfig::try_load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                TunerConfig::load(&path)
            } else {
                TunerConfig::default()
            }
        }
    };

    if let Some(hz) = reference_override {
        anyhow::ensure!(
            hz.is_finite() && (MIN_REFERENCE_HZ..=MAX_REFERENCE_HZ).contains(&hz),
            "--reference must be between {MIN_REFERENCE_HZ} and {MAX_REFERENCE_HZ} Hz, got {hz}"
        );
        config.default_reference_hz = hz;
        config.normalize();
    }

    info!(
        reference_hz = config.default_reference_hz,
        ingest_capacity = config.ingest_capacity,
        window = config.detector.window_size,
        "tuner config resolved"
    );
    Ok(config)
}
