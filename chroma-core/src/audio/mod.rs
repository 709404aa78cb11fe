//! Live input host built on cpal.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated priority.
//! It **must not**:
//! - Allocate heap memory
//! - Block on a mutex or condvar
//! - Perform I/O
//!
//! `LiveTuner` satisfies that contract: the `TunerEngine` is built and
//! activated on the calling thread, then moved into the callback together
//! with a preallocated mono mix buffer. Control values arrive through
//! atomics and readouts leave through a lock-free SPSC ring.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio on
//! macOS). `LiveTuner` therefore must be created and dropped on the same
//! thread. Dropping it drops the stream, the callback and the engine inside
//! it, which joins the tracker thread.

pub mod device;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{
    buffering::{Consumer, Producer, ReadoutConsumer, ReadoutProducer},
    engine::{DiagnosticsSnapshot, EngineDiagnostics, TunerEngine},
    ipc::events::TunerReadout,
    tracker::FrequencySnapshot,
};

#[cfg(feature = "audio-cpal")]
use crate::{
    buffering::{create_readout_ring, READOUT_RING_CAPACITY},
    config::TunerConfig,
    error::{ChromaError, Result},
};

/// Mono frames processed per engine call inside the callback.
pub const MIX_BUFFER_FRAMES: usize = 4096;

/// Control values written by the UI side, read once per callback.
#[derive(Debug)]
pub struct LiveControls {
    reference: FrequencySnapshot,
    muted: AtomicBool,
}

impl LiveControls {
    pub fn new(reference_hz: f32) -> Self {
        Self {
            reference: FrequencySnapshot::new(reference_hz),
            muted: AtomicBool::new(false),
        }
    }

    /// Invalid values are forwarded as-is; the engine keeps its last valid
    /// reference when it sees one.
    pub fn set_reference(&self, hz: f32) {
        self.reference.publish(hz);
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    fn tuning(&self) -> f32 {
        self.reference.load()
    }

    fn mute(&self) -> f32 {
        if self.muted.load(Ordering::Relaxed) {
            1.0
        } else {
            0.0
        }
    }
}

/// Everything the audio callback owns.
pub struct InputCallback {
    engine: TunerEngine,
    mix: Vec<f32>,
    channels: usize,
    controls: Arc<LiveControls>,
    readouts: ReadoutProducer,
}

impl InputCallback {
    pub fn new(
        engine: TunerEngine,
        channels: u16,
        controls: Arc<LiveControls>,
        readouts: ReadoutProducer,
    ) -> Self {
        Self {
            engine,
            mix: vec![0.0; MIX_BUFFER_FRAMES],
            channels: channels.max(1) as usize,
            controls,
            readouts,
        }
    }

    /// Down-mix an interleaved buffer to mono and run it through the engine,
    /// `MIX_BUFFER_FRAMES` frames at a time. One readout per engine call.
    pub fn on_input<T: Copy>(&mut self, data: &[T], to_f32: impl Fn(T) -> f32) {
        let ch = self.channels;
        let tuning = Some(self.controls.tuning());
        let mute = Some(self.controls.mute());

        for interleaved in data.chunks(MIX_BUFFER_FRAMES * ch) {
            let frames = interleaved.len() / ch;
            let mono = &mut self.mix[..frames];
            for (f, out) in mono.iter_mut().enumerate() {
                let base = f * ch;
                let sum: f32 = interleaved[base..base + ch].iter().map(|&s| to_f32(s)).sum();
                *out = sum / ch as f32;
            }

            if let Some(readout) = self.engine.process_in_place(mono, tuning, mute) {
                // Full ring: the poller is behind, newest readout is dropped.
                let _ = self.readouts.try_push(readout);
            }
        }
    }
}

/// Handle to an active live tuner.
///
/// **Not `Send`** — holds a `cpal::Stream`.
pub struct LiveTuner {
    /// Kept alive so the stream is not dropped prematurely.
    #[cfg(feature = "audio-cpal")]
    _stream: cpal::Stream,
    readouts: ReadoutConsumer,
    controls: Arc<LiveControls>,
    diagnostics: Arc<EngineDiagnostics>,
    last_error: Arc<Mutex<Option<String>>>,
    /// Capture sample rate reported by the device (Hz).
    pub sample_rate: u32,
    pub device_name: String,
}

impl LiveTuner {
    /// Open an input device by preferred name, otherwise the default input
    /// device, otherwise the first available one, and start tuning.
    ///
    /// # Errors
    /// - `ChromaError::NoDefaultInputDevice` when no input exists.
    /// - `ChromaError::AudioDevice` / `ChromaError::AudioStream` on cpal failures.
    /// - Any engine construction error.
    #[cfg(feature = "audio-cpal")]
    pub fn open(config: &TunerConfig, preferred_device_name: Option<&str>) -> Result<Self> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use cpal::{Sample, SampleFormat};
        use tracing::{error, info};

        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| ChromaError::AudioDevice(e.to_string()))?
            .collect();
        let names: Vec<String> = devices
            .iter()
            .map(|d| d.name().unwrap_or_default())
            .collect();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let index = device::select_device_index(
            &names,
            preferred_device_name,
            default_name.as_deref(),
        )
        .ok_or(ChromaError::NoDefaultInputDevice)?;
        let device = &devices[index];
        let device_name = names[index].clone();

        if let Some(preferred) = preferred_device_name {
            if preferred != device_name {
                tracing::warn!(
                    "preferred input device '{}' not found, using '{}'",
                    preferred,
                    device_name
                );
            }
        }

        let supported = device
            .default_input_config()
            .map_err(|e| ChromaError::AudioDevice(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let sample_format = supported.sample_format();
        info!(
            device = device_name.as_str(),
            sample_rate, channels, "opening input device"
        );

        let stream_config = supported.config();

        let mut engine = TunerEngine::new(sample_rate as f64, config)?;
        engine.activate()?;
        let diagnostics = engine.diagnostics();

        let controls = Arc::new(LiveControls::new(config.default_reference_hz));
        let (producer, readouts) = create_readout_ring(READOUT_RING_CAPACITY);
        let mut callback = InputCallback::new(engine, channels, Arc::clone(&controls), producer);

        let last_error = Arc::new(Mutex::new(None));
        let error_slot = Arc::clone(&last_error);
        let on_error = move |err: cpal::StreamError| {
            error!("audio stream error: {err}");
            *error_slot.lock() = Some(err.to_string());
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| callback.on_input(data, |s| s),
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    callback.on_input(data, |s| s.to_sample::<f32>())
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    callback.on_input(data, |s| s.to_sample::<f32>())
                },
                on_error,
                None,
            ),
            fmt => {
                return Err(ChromaError::AudioStream(format!(
                    "unsupported sample format: {fmt:?}"
                )))
            }
        }
        .map_err(|e| ChromaError::AudioStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ChromaError::AudioStream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            readouts,
            controls,
            diagnostics,
            last_error,
            sample_rate,
            device_name,
        })
    }

    /// Drain pending readouts and return the newest one.
    pub fn latest(&mut self) -> Option<TunerReadout> {
        let mut latest = None;
        while let Some(readout) = self.readouts.try_pop() {
            latest = Some(readout);
        }
        latest
    }

    pub fn set_reference(&self, hz: f32) {
        self.controls.set_reference(hz);
    }

    pub fn set_muted(&self, muted: bool) {
        self.controls.set_muted(muted);
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Most recent error reported by the audio backend, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
