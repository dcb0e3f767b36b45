//! cpal-backed audio output for the standalone demo binary.
//!
//! The engine itself has no concept of a callback thread or an event
//! queue (§5) — this module supplies exactly that for the demo: a
//! bounded channel of raw MIDI messages, decoded with [`crate::midi::parse_midi`]
//! once per callback before rendering, so there is exactly one place in
//! the crate that interprets MIDI status bytes.

use crate::audio::engine::Engine;
use crate::midi::parse_midi;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Receiver;

/// A single, already-framed MIDI message (e.g. `[0x90, 60, 100]`).
pub type MidiMessage = Vec<u8>;

pub struct AudioOutput {
    _stream: Stream,
    sample_rate: f32,
}

impl AudioOutput {
    /// Starts a stream rendering `engine`, consuming it (the callback
    /// thread owns it from here on — matches the engine's single-thread
    /// contract).
    pub fn new(engine: Engine, event_rx: Receiver<MidiMessage>) -> Result<Self, String> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| "No output device available".to_string())?;

        let config = device
            .default_output_config()
            .map_err(|e| format!("Failed to get default output config: {e}"))?;

        let sample_rate = config.sample_rate().0 as f32;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), engine, event_rx)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), engine, event_rx)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), engine, event_rx)?
            }
            other => return Err(format!("Unsupported sample format: {other:?}")),
        };

        stream.play().map_err(|e| format!("Failed to play stream: {e}"))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut engine: Engine,
        event_rx: Receiver<MidiMessage>,
    ) -> Result<Stream, String>
    where
        T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut left = vec![0.0f32; 1024];
        let mut right = vec![0.0f32; 1024];

        let err_fn = |err| eprintln!("Audio stream error: {err}");

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for message in event_rx.try_iter() {
                        parse_midi(&mut engine, &message);
                    }

                    let frames_per_chunk = data.len() / channels;
                    let mut rendered = 0;
                    while rendered < frames_per_chunk {
                        let frames = (frames_per_chunk - rendered).min(left.len());
                        left[..frames].fill(0.0);
                        right[..frames].fill(0.0);
                        engine.render(&mut left[..frames], &mut right[..frames], frames);

                        for i in 0..frames {
                            let frame = &mut data[(rendered + i) * channels..][..channels];
                            frame[0] = cpal::Sample::from_sample(left[i]);
                            if channels > 1 {
                                frame[1] = cpal::Sample::from_sample(right[i]);
                            }
                            for sample in frame.iter_mut().skip(2) {
                                *sample = cpal::Sample::from_sample(left[i]);
                            }
                        }
                        rendered += frames;
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| format!("Failed to build output stream: {e}"))?;

        Ok(stream)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

pub fn list_output_devices() -> Result<Vec<String>, String> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| format!("Failed to enumerate devices: {e}"))?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            device_names.push(name);
        }
    }

    Ok(device_names)
}
