//! Producer/consumer buffer pipeline.
//!
//! A fixed set of [`AudioBuffer`]s circulates through two bounded channels:
//! the *free* queue feeds the producer, the *ready* queue feeds the consumer.
//! Whoever holds a buffer owns it, so a buffer can never be written and read
//! at the same time. The `ready_for_consumption` flag travels with the buffer
//! and is checked on each hand-off; a buffer arriving in the wrong state is
//! passed along untouched instead of being overwritten or played.
//!
//! Neither side ever sees a partially filled buffer.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{EngineError, EngineResult};

/// One fixed-length block of samples plus its hand-off metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<i8>,
    gain: f32,
    enabled: bool,
    ready_for_consumption: bool,
}

impl AudioBuffer {
    /// Allocates a zeroed buffer of `length` samples.
    pub fn new(length: usize) -> EngineResult<Self> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(length)
            .map_err(|_| EngineError::Allocation { count: 1, length })?;
        samples.resize(length, 0);
        Ok(Self {
            samples,
            gain: 0.0,
            enabled: false,
            ready_for_consumption: false,
        })
    }

    /// Samples.
    pub fn samples(&self) -> &[i8] {
        &self.samples
    }

    /// Output gain captured when the buffer was filled.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Whether the buffer holds sound (as opposed to a disabled range).
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the buffer is full and waiting for the consumer.
    pub fn is_ready(&self) -> bool {
        self.ready_for_consumption
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// What a fill produced, returned by the producer's fill callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Output gain to play the buffer at.
    pub gain: f32,
    /// False if the buffer was zero-filled for a disabled range.
    pub enabled: bool,
}

/// Result of one producer or consumer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A buffer of this many samples changed hands.
    Transferred(usize),
    /// No buffer arrived within the poll interval.
    TimedOut,
    /// A buffer arrived in the wrong state and was forwarded unprocessed.
    Skipped,
    /// The other side has gone away.
    Disconnected,
}

/// Producer end: takes free buffers, fills them, queues them for playback.
#[derive(Debug)]
pub struct Producer {
    free: Receiver<AudioBuffer>,
    ready: Sender<AudioBuffer>,
}

impl Producer {
    /// Waits up to `timeout` for a free buffer and fills it with `fill`.
    pub fn fill_next<F>(&self, timeout: Duration, fill: F) -> Step
    where
        F: FnOnce(&mut [i8]) -> Fill,
    {
        let mut buffer = match self.free.recv_timeout(timeout) {
            Ok(buffer) => buffer,
            Err(RecvTimeoutError::Timeout) => return Step::TimedOut,
            Err(RecvTimeoutError::Disconnected) => return Step::Disconnected,
        };

        if buffer.ready_for_consumption {
            log::error!("Generator received a buffer that has not been played");
            return self.forward(buffer, Step::Skipped);
        }

        let Fill { gain, enabled } = fill(&mut buffer.samples);
        buffer.gain = gain;
        buffer.enabled = enabled;
        buffer.ready_for_consumption = true;
        let len = buffer.len();
        self.forward(buffer, Step::Transferred(len))
    }

    fn forward(&self, buffer: AudioBuffer, step: Step) -> Step {
        match self.ready.send(buffer) {
            Ok(()) => step,
            Err(_) => Step::Disconnected,
        }
    }
}

/// Consumer end: takes ready buffers, plays them, returns them to the pool.
#[derive(Debug)]
pub struct Consumer {
    ready: Receiver<AudioBuffer>,
    free: Sender<AudioBuffer>,
}

impl Consumer {
    /// Waits up to `timeout` for a ready buffer and hands it to `play`.
    ///
    /// The buffer returns to the free queue only after `play` returns.
    pub fn consume_next<F>(&self, timeout: Duration, play: F) -> Step
    where
        F: FnOnce(&AudioBuffer),
    {
        let mut buffer = match self.ready.recv_timeout(timeout) {
            Ok(buffer) => buffer,
            Err(RecvTimeoutError::Timeout) => return Step::TimedOut,
            Err(RecvTimeoutError::Disconnected) => return Step::Disconnected,
        };

        if !buffer.ready_for_consumption {
            log::error!("Playback received a buffer that was never filled");
            return self.forward(buffer, Step::Skipped);
        }

        play(&buffer);
        buffer.ready_for_consumption = false;
        let len = buffer.len();
        self.forward(buffer, Step::Transferred(len))
    }

    fn forward(&self, buffer: AudioBuffer, step: Step) -> Step {
        match self.free.send(buffer) {
            Ok(()) => step,
            Err(_) => Step::Disconnected,
        }
    }
}

/// Allocates `count` buffers of `length` samples and wires up both ends.
///
/// All buffers start on the free queue. Fails without leaving anything
/// allocated if any buffer cannot be reserved.
pub fn channel(count: usize, length: usize) -> EngineResult<(Producer, Consumer)> {
    let (free_tx, free_rx) = bounded(count);
    let (ready_tx, ready_rx) = bounded(count);

    for _ in 0..count {
        let buffer =
            AudioBuffer::new(length).map_err(|_| EngineError::Allocation { count, length })?;
        // Capacity equals count and the receiver is alive, so this cannot block or fail.
        if free_tx.send(buffer).is_err() {
            return Err(EngineError::Allocation { count, length });
        }
    }

    Ok((
        Producer {
            free: free_rx,
            ready: ready_tx,
        },
        Consumer {
            ready: ready_rx,
            free: free_tx,
        },
    ))
}
