//! # Audio Capture Module
//!
//! Microphone capture behind the [`AudioSource`] capability, with a CPAL
//! implementation for the default input device.
//!
//! ## Features
//! - Prefers a mono 32-bit float input near 44.1 kHz, down-mixes otherwise
//! - Emits overlapping analysis windows (~60 per second)
//! - Suspend/resume without tearing the stream down
//! - Stopping drops the stream and releases the device

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::error::AudioError;

/// Samples per analysis window.
///
/// 2048 samples (~46ms at 44.1kHz) hold several periods of the lowest
/// trumpet notes.
pub const BUFFER_SIZE: usize = 2048;

/// Analysis windows per second the capture aims for.
pub const FRAMES_PER_SECOND: u32 = 60;

const TARGET_SAMPLE_RATE: u32 = 44100;

/// A platform microphone. Implementations are created on the analysis
/// thread and never leave it.
pub trait AudioSource {
    /// Opens the device and starts streaming analysis windows into
    /// `frames`. Errors raised by the running stream go to `faults`.
    /// Returns the sample rate.
    fn start(
        &mut self,
        frames: Sender<Vec<f32>>,
        faults: Sender<AudioError>,
    ) -> Result<u32, AudioError>;

    /// Pauses delivery while keeping the device open.
    fn suspend(&mut self);

    fn resume(&mut self) -> Result<(), AudioError>;

    /// Closes the stream and releases the device.
    fn stop(&mut self);
}

/// Cuts a continuous sample stream into overlapping windows.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    buffer: Vec<f32>,
    window: usize,
    hop: usize,
}

impl FrameAssembler {
    pub fn new(window: usize, hop: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(window * 2),
            window,
            hop: hop.clamp(1, window),
        }
    }

    /// Hop size giving roughly [`FRAMES_PER_SECOND`] windows per second.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let hop = (sample_rate / FRAMES_PER_SECOND) as usize;
        Self::new(BUFFER_SIZE, hop)
    }

    /// Appends samples and returns every window that became complete.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.buffer.extend_from_slice(samples);
        let mut frames = Vec::new();
        while self.buffer.len() >= self.window {
            frames.push(self.buffer[..self.window].to_vec());
            self.buffer.drain(..self.hop);
        }
        frames
    }
}

/// The default input device through CPAL.
#[derive(Default)]
pub struct CpalInput {
    stream: Option<cpal::Stream>,
}

impl AudioSource for CpalInput {
    fn start(
        &mut self,
        frames: Sender<Vec<f32>>,
        faults: Sender<AudioError>,
    ) -> Result<u32, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;

        match device.name() {
            Ok(name) => info!("using audio input device: {}", name),
            Err(e) => warn!("could not read input device name: {}", e),
        }

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
            .ok_or_else(|| AudioError::UnsupportedFormat("no f32 input format".to_string()))?;

        let rate = TARGET_SAMPLE_RATE
            .clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0);
        let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let config: cpal::StreamConfig = config.into();

        info!(sample_rate, channels, "selected input format");

        let err_fn = move |err: cpal::StreamError| {
            warn!("an error occurred on the audio stream: {}", err);
            let _ = faults.try_send(AudioError::from(err));
        };
        let mut assembler = FrameAssembler::for_sample_rate(sample_rate);
        let mut mono = Vec::new();

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let samples = if channels > 1 {
                    mono.clear();
                    mono.extend(
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                    );
                    &mono[..]
                } else {
                    data
                };
                for frame in assembler.push(samples) {
                    // Dropping frames is fine when the analysis falls behind.
                    let _ = frames.try_send(frame);
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(sample_rate)
    }

    fn suspend(&mut self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                warn!("could not suspend input stream: {}", e);
            }
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        match &self.stream {
            Some(stream) => Ok(stream.play()?),
            None => Err(AudioError::Stream("input stream is closed".to_string())),
        }
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("error pausing stream: {}", e);
            }
            drop(stream);
            info!("audio input released");
        }
    }
}

/// Picks the f32 input configuration closest to `target_rate`, preferring
/// mono over multi-channel.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_distance = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                min_diff.min(max_diff)
            };
            (c.channels() != 1, rate_distance)
        })
}
