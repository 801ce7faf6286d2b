//! Engine counters and the diagnostic snapshot.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use vvvf_spec::{RotorState, SpeedRange, WaveformKind};

/// Counters shared between the worker threads and the host.
///
/// All accesses are relaxed: values are diagnostics, not synchronization.
#[derive(Debug, Default)]
pub struct StatsCounters {
    generated: AtomicU64,
    consumed: AtomicU64,
    starved: AtomicU64,
    sink_errors: AtomicU64,
    carrier_hz_bits: AtomicU32,
}

impl StatsCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `n` generated samples.
    pub fn add_generated(&self, n: usize) {
        self.generated.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Records `n` consumed samples.
    pub fn add_consumed(&self, n: usize) {
        self.consumed.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Records one starvation event.
    pub fn add_starvation(&self) {
        self.starved.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed `play` call.
    pub fn add_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Publishes the carrier frequency of the last generated buffer.
    pub fn set_carrier_hz(&self, hz: f32) {
        self.carrier_hz_bits.store(hz.to_bits(), Ordering::Relaxed);
    }

    /// Total generated samples.
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Total consumed samples.
    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Total starvation events.
    pub fn starved(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }

    /// Total failed `play` calls.
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    /// Carrier frequency of the last generated buffer.
    pub fn carrier_hz(&self) -> f32 {
        f32::from_bits(self.carrier_hz_bits.load(Ordering::Relaxed))
    }
}

/// Turns monotonically increasing totals into per-second rates between
/// successive calls.
#[derive(Debug, Clone)]
pub struct RateMeter {
    last_at: Instant,
    last_generated: u64,
    last_consumed: u64,
}

impl RateMeter {
    /// Starts measuring now from zero totals.
    pub fn new() -> Self {
        Self::with_totals(0, 0)
    }

    /// Starts measuring now from existing totals.
    pub fn with_totals(generated: u64, consumed: u64) -> Self {
        Self {
            last_at: Instant::now(),
            last_generated: generated,
            last_consumed: consumed,
        }
    }

    /// Returns `(generated/s, consumed/s)` since the previous call.
    pub fn sample(&mut self, generated: u64, consumed: u64) -> (f64, f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_at).as_secs_f64();
        let rates = if elapsed > 0.0 {
            (
                generated.saturating_sub(self.last_generated) as f64 / elapsed,
                consumed.saturating_sub(self.last_consumed) as f64 / elapsed,
            )
        } else {
            (0.0, 0.0)
        };

        self.last_at = now;
        self.last_generated = generated;
        self.last_consumed = consumed;
        rates
    }
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    /// Whether the worker threads are running.
    pub running: bool,
    /// Total generated samples.
    pub generated_samples: u64,
    /// Total consumed samples.
    pub consumed_samples: u64,
    /// Generated samples per second since the previous snapshot.
    pub generated_per_second: f64,
    /// Consumed samples per second since the previous snapshot.
    pub consumed_per_second: f64,
    /// Starvation events.
    pub starvation_count: u64,
    /// Failed sink calls.
    pub sink_errors: u64,
    /// Vehicle speed in km/h.
    pub speed_kmh: f32,
    /// Rotor state.
    pub rotor_state: RotorState,
    /// Active speed range.
    pub active_range: SpeedRange,
    /// Waveform the active range plays in the current rotor state.
    pub waveform: WaveformKind,
    /// Carrier frequency of the last generated buffer in Hz.
    pub carrier_hz: f32,
    /// Output gain.
    pub amplitude: f32,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples Generated/s: {:.0}", self.generated_per_second)?;
        writeln!(f, "Samples Consumed/s: {:.0}", self.consumed_per_second)?;
        writeln!(f, "Starved Buffers: {}", self.starvation_count)?;
        writeln!(f, "Speed: {:.2} km/h", self.speed_kmh)?;
        writeln!(
            f,
            "Speed Range: {:.1} - {:.1} km/h",
            self.active_range.min_speed_kmh, self.active_range.max_speed_kmh
        )?;
        writeln!(f, "Rotor State: {}", self.rotor_state)?;
        writeln!(f, "SPWM Mode: {}", self.waveform)?;
        writeln!(f, "Carrier Frequency: {:.2} Hz", self.carrier_hz)?;
        write!(f, "Amplitude: {:.3}", self.amplitude)
    }
}
