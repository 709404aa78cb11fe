//! `chromasense`: chromatic tuner on the command line.
//!
//! ```text
//! chromasense devices            list capture devices
//! chromasense live               tune from a live input
//! chromasense file take.wav      tune a recording, block by block
//! ```

mod live;
mod offline;
mod report;
mod settings;
mod wav;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "chromasense", version, about = "Real-time chromatic tuner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List audio input devices (default marked with '*')
    Devices {
        /// Print JSON instead of a table
        #[arg(long, action = clap::ArgAction::SetTrue)]
        json: bool,
    },

    /// Tune from a live input device
    Live {
        /// Input device name (falls back to the system default)
        #[arg(long, value_name = "NAME")]
        device: Option<String>,

        /// Tuner config JSON (defaults to the per-user config file)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Reference frequency for A4 in Hz
        #[arg(long, value_name = "HZ")]
        reference: Option<f32>,

        /// Emit one JSON object per line
        #[arg(long, action = clap::ArgAction::SetTrue)]
        json: bool,

        /// How often to print the latest readout
        #[arg(long, value_name = "MS", default_value_t = 100)]
        interval_ms: u64,

        /// Stop after this many seconds (runs until interrupted otherwise)
        #[arg(long, value_name = "SECS")]
        duration_secs: Option<f64>,
    },

    /// Stream a WAV file through the tuner
    File {
        /// Input WAV file (any channel count; mixed to mono)
        input: PathBuf,

        /// Host block size in samples
        #[arg(long, value_name = "SAMPLES", default_value_t = 512)]
        block_size: usize,

        /// Reference frequency for A4 in Hz
        #[arg(long, value_name = "HZ")]
        reference: Option<f32>,

        /// Engage the mute gate (readouts keep coming)
        #[arg(long, action = clap::ArgAction::SetTrue)]
        mute: bool,

        /// Playback pacing as a multiple of real time; 0 runs unpaced
        #[arg(long, value_name = "X", default_value_t = 1.0)]
        speed: f64,

        /// Emit one JSON object per line
        #[arg(long, action = clap::ArgAction::SetTrue)]
        json: bool,

        /// Tuner config JSON (defaults to the per-user config file)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chromasense=info,chroma_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Devices { json } => live::list_devices(json),
        Command::Live {
            device,
            config,
            reference,
            json,
            interval_ms,
            duration_secs,
        } => {
            let config = settings::load_config(config.as_deref(), reference)?;
            let duration = duration_secs
                .map(|secs| {
                    Duration::try_from_secs_f64(secs)
                        .with_context(|| format!("invalid --duration-secs {secs}"))
                })
                .transpose()?;
            live::run(
                &config,
                &live::LiveOptions {
                    device,
                    interval: Duration::from_millis(interval_ms.max(1)),
                    duration,
                    json,
                },
            )
        }
        Command::File {
            input,
            block_size,
            reference,
            mute,
            speed,
            json,
            config,
        } => {
            anyhow::ensure!(block_size > 0, "--block-size must be at least 1");
            anyhow::ensure!(
                speed.is_finite() && speed >= 0.0,
                "--speed must be a non-negative number"
            );
            let config = settings::load_config(config.as_deref(), reference)?;
            let clip = wav::read_mono(&input)?;
            info!(path = %input.display(), "tuning file");

            let last = offline::run(
                &clip,
                &config,
                offline::OfflineOptions {
                    block_size,
                    reference_hz: reference,
                    mute,
                    speed,
                },
                |t, readout| report::emit(t, readout, json),
            )?;

            match last {
                Some(readout) => info!(
                    note = readout.note_name(),
                    octave = readout.octave,
                    cents = readout.cent_deviation,
                    "last detected pitch"
                ),
                None => info!("no pitch detected"),
            }
            Ok(())
        }
    }
}
