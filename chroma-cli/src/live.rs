//! Live run: poll the capture-side tuner and print what it reports.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chroma_core::{audio::device, LiveTuner, TunerConfig};
use tracing::{info, warn};

use crate::report;

#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub device: Option<String>,
    pub interval: Duration,
    pub duration: Option<Duration>,
    pub json: bool,
}

pub fn list_devices(json: bool) -> anyhow::Result<()> {
    let devices = device::list_input_devices().context("failed to enumerate input devices")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }
    if devices.is_empty() {
        println!("no input devices found");
    }
    for info in &devices {
        let marker = if info.is_default { "*" } else { " " };
        let rate = info
            .default_sample_rate
            .map(|r| format!("{r} Hz"))
            .unwrap_or_else(|| "-".into());
        let channels = info
            .channels
            .map(|c| format!("{c} ch"))
            .unwrap_or_else(|| "-".into());
        println!("{marker} {}  ({rate}, {channels})", info.name);
    }
    Ok(())
}

pub fn run(config: &TunerConfig, options: &LiveOptions) -> anyhow::Result<()> {
    let mut tuner = LiveTuner::open(config, options.device.as_deref())
        .context("failed to open live input")?;
    info!(
        device = tuner.device_name.as_str(),
        sample_rate = tuner.sample_rate,
        "listening"
    );

    let started = Instant::now();
    let mut reported_error: Option<String> = None;
    loop {
        if let Some(limit) = options.duration {
            if started.elapsed() >= limit {
                break;
            }
        }
        thread::sleep(options.interval);

        if let Some(err) = tuner.last_error() {
            if reported_error.as_deref() != Some(err.as_str()) {
                warn!("input stream reported: {err}");
                reported_error = Some(err);
            }
        }
        if let Some(readout) = tuner.latest() {
            report::emit(started.elapsed().as_secs_f64(), &readout, options.json)?;
        }
    }

    info!(diagnostics = ?tuner.diagnostics(), "live session finished");
    Ok(())
}
