//! Playback sinks: where finished sample buffers go.
//!
//! The engine never talks to an audio device directly. Each ready buffer is
//! handed to a [`PlaybackSink`] together with the sample rate and the current
//! output gain; what happens next is up to the host.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SinkError;

/// Consumer of generated sample buffers.
///
/// Implementations run on the playback thread, so they must be `Send`.
pub trait PlaybackSink: Send {
    /// Plays one buffer of signed 8-bit samples at `gain` in `[0, 1]`.
    fn play(&mut self, samples: &[i8], sample_rate: u32, gain: f32) -> Result<(), SinkError>;

    /// Flushes any pending output. Called once when the engine stops.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: PlaybackSink + ?Sized> PlaybackSink for Box<S> {
    fn play(&mut self, samples: &[i8], sample_rate: u32, gain: f32) -> Result<(), SinkError> {
        (**self).play(samples, sample_rate, gain)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Scales a sample by `gain`, rounding and saturating to `i8`.
#[inline]
pub fn apply_gain(sample: i8, gain: f32) -> i8 {
    let gain = if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 0.0 };
    (sample as f32 * gain).round().clamp(-128.0, 127.0) as i8
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn play(&mut self, _samples: &[i8], _sample_rate: u32, _gain: f32) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Everything a [`MemorySink`] has received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capture {
    /// Raw samples, before gain.
    pub samples: Vec<i8>,
    /// Gain passed with each buffer, in arrival order.
    pub gains: Vec<f32>,
    /// Sample rate of the last buffer.
    pub sample_rate: u32,
    /// Whether `finish` has been called.
    pub finished: bool,
}

impl Capture {
    /// Number of buffers received.
    pub fn buffers(&self) -> usize {
        self.gains.len()
    }
}

/// Records buffers into shared memory.
///
/// Clones share the same capture, so a test can keep one handle while the
/// engine owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    capture: Arc<Mutex<Capture>>,
    limit: Option<usize>,
}

impl MemorySink {
    /// Creates an unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that stops recording samples after `limit` samples.
    /// Gains are still recorded for every buffer.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            capture: Arc::default(),
            limit: Some(limit),
        }
    }

    /// Copy of everything received so far.
    pub fn capture(&self) -> Capture {
        self.capture.lock().clone()
    }

    /// Number of samples received so far.
    pub fn sample_count(&self) -> usize {
        self.capture.lock().samples.len()
    }

    /// Number of buffers received so far.
    pub fn buffer_count(&self) -> usize {
        self.capture.lock().buffers()
    }
}

impl PlaybackSink for MemorySink {
    fn play(&mut self, samples: &[i8], sample_rate: u32, gain: f32) -> Result<(), SinkError> {
        let mut capture = self.capture.lock();
        let room = self
            .limit
            .map_or(samples.len(), |limit| limit.saturating_sub(capture.samples.len()));
        capture
            .samples
            .extend_from_slice(&samples[..room.min(samples.len())]);
        capture.gains.push(gain);
        capture.sample_rate = sample_rate;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.capture.lock().finished = true;
        Ok(())
    }
}

/// Writes gained samples to an 8-bit mono WAV stream.
pub struct WavSink<W: Write + Seek> {
    writer: Option<hound::WavWriter<W>>,
    sample_rate: u32,
    written: u64,
}

impl WavSink<BufWriter<File>> {
    /// Creates a WAV file at `path`.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, SinkError> {
        let writer = hound::WavWriter::create(path, wav_spec(sample_rate))?;
        Ok(Self::from_writer(writer, sample_rate))
    }
}

impl<W: Write + Seek> WavSink<W> {
    /// Wraps any seekable writer.
    pub fn new(inner: W, sample_rate: u32) -> Result<Self, SinkError> {
        let writer = hound::WavWriter::new(inner, wav_spec(sample_rate))?;
        Ok(Self::from_writer(writer, sample_rate))
    }

    fn from_writer(writer: hound::WavWriter<W>, sample_rate: u32) -> Self {
        Self {
            writer: Some(writer),
            sample_rate,
            written: 0,
        }
    }

    /// Samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.written
    }

    /// Sample rate in the file header.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    }
}

impl<W: Write + Seek + Send> PlaybackSink for WavSink<W> {
    fn play(&mut self, samples: &[i8], sample_rate: u32, gain: f32) -> Result<(), SinkError> {
        if sample_rate != self.sample_rate {
            return Err(SinkError::playback(format!(
                "sample rate {} does not match WAV header rate {}",
                sample_rate, self.sample_rate
            )));
        }
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        for &sample in samples {
            writer.write_sample(apply_gain(sample, gain))?;
        }
        self.written += samples.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            log::debug!("WAV sink finalized after {} samples", self.written);
        }
        Ok(())
    }
}
