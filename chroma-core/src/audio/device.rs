//! Input device enumeration and selection.

use serde::{Deserialize, Serialize};

/// Metadata about an audio input device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Human-readable device name reported by the OS.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
    /// Sample rate of the device's default input config, if it has one.
    pub default_sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Pick a device index: exact preferred name, else case-insensitive
/// preferred name, else the default device, else the first device.
pub fn select_device_index(
    names: &[String],
    preferred: Option<&str>,
    default_name: Option<&str>,
) -> Option<usize> {
    if let Some(preferred) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(i) = names.iter().position(|n| n == preferred) {
            return Some(i);
        }
        if let Some(i) = names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(preferred))
        {
            return Some(i);
        }
    }
    if let Some(default_name) = default_name {
        if let Some(i) = names.iter().position(|n| n == default_name) {
            return Some(i);
        }
    }
    (!names.is_empty()).then_some(0)
}

/// Enumerate input devices on the default host.
#[cfg(feature = "audio-cpal")]
pub fn list_input_devices() -> crate::error::Result<Vec<DeviceInfo>> {
    use cpal::traits::{DeviceTrait, HostTrait};

    use crate::error::ChromaError;

    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());
    let devices = host
        .input_devices()
        .map_err(|e| ChromaError::AudioDevice(e.to_string()))?;

    Ok(devices
        .filter_map(|device| {
            let name = device.name().ok()?;
            let config = device.default_input_config().ok();
            Some(DeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                default_sample_rate: config.as_ref().map(|c| c.sample_rate().0),
                channels: config.as_ref().map(|c| c.channels()),
                name,
            })
        })
        .collect())
}

#[cfg(not(feature = "audio-cpal"))]
pub fn list_input_devices() -> crate::error::Result<Vec<DeviceInfo>> {
    Err(crate::error::ChromaError::AudioDevice(
        "compiled without audio-cpal feature".into(),
    ))
}
