//! Microphone capture into 16 bit WAV files.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Sample, SizedSample,
};
use log::{error, info, warn};

use crate::{
    error::{AudioError, AudioResult},
    sounds,
};

type SampleBuffer = Arc<Mutex<Vec<i16>>>;

struct Capture {
    samples: SampleBuffer,
    spec: hound::WavSpec,
}

/// At most one capture at a time. The captured samples are kept until they
/// have been written out, so a failed save can be retried. Dropping the
/// recorder discards an unfinished capture.
#[derive(Default)]
pub struct Recorder {
    // capture stops when the stream is dropped
    stream: Option<cpal::Stream>,
    capture: Option<Capture>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.capture.is_some()
    }

    /// Starts capturing from the default input device.
    ///
    /// # Errors
    /// [`AudioError::PermissionDenied`] when there is no usable microphone,
    /// [`AudioError::AlreadyRecording`] if a capture is running
    pub fn start(&mut self) -> AudioResult<()> {
        if self.capture.is_some() {
            return Err(AudioError::AlreadyRecording);
        }
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::PermissionDenied("no input device".to_string()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::PermissionDenied(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let spec = hound::WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate.0,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let samples = SampleBuffer::default();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &samples),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &samples),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &samples),
            other => Err(AudioError::Capture(format!(
                "unsupported sample format {other}"
            ))),
        }?;
        stream
            .play()
            .map_err(|e| AudioError::Capture(e.to_string()))?;

        info!(
            "recording started ({} channels, {} Hz)",
            spec.channels, spec.sample_rate
        );
        self.stream = Some(stream);
        self.capture = Some(Capture { samples, spec });
        Ok(())
    }

    /// Stops capturing and writes the recording into `dir` as
    /// `recording-<ms>.wav`, or `<label>-<ms>.wav` when a label is given.
    /// If writing fails the capture is kept, paused, and `stop` can be
    /// called again.
    ///
    /// # Errors
    /// [`AudioError::NotRecording`] if nothing is being captured, otherwise
    /// file errors
    pub fn stop(&mut self, dir: &Path, label: Option<&str>) -> AudioResult<PathBuf> {
        let capture = self.capture.as_ref().ok_or(AudioError::NotRecording)?;
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                warn!("couldn't pause input stream: {e}");
            }
        }
        let path = write_capture(capture, dir, label)?;
        self.stream = None;
        self.capture = None;
        Ok(path)
    }

    #[cfg(test)]
    fn with_samples(spec: hound::WavSpec, samples: Vec<i16>) -> Self {
        Self {
            stream: None,
            capture: Some(Capture {
                samples: Arc::new(Mutex::new(samples)),
                spec,
            }),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.capture.is_some() {
            warn!("discarding unfinished recording");
        }
    }
}

fn write_capture(capture: &Capture, dir: &Path, label: Option<&str>) -> AudioResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let epoch_ms = chrono::Utc::now().timestamp_millis();
    let path = dir.join(sounds::recording_file_name(label, epoch_ms));

    let samples = capture
        .samples
        .lock()
        .map_err(|_| AudioError::Capture("sample buffer poisoned".to_string()))?;
    let mut writer = hound::WavWriter::create(&path, capture.spec)?;
    for sample in samples.iter() {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    info!(
        "recording saved to {} ({} samples)",
        path.display(),
        samples.len()
    );
    Ok(path)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: &SampleBuffer,
) -> AudioResult<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let samples = Arc::clone(samples);
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = samples.lock() {
                    samples.extend(data.iter().map(|s| i16::from_sample(*s)));
                }
            },
            |e| error!("input stream error: {e}"),
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AudioError::PermissionDenied(e.to_string())
            }
            e => AudioError::Capture(e.to_string()),
        })
}
