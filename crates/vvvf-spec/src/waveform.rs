//! Waveform behaviors attached to each speed range.
//!
//! A [`SpeedRange`](crate::SpeedRange) carries one [`WaveformSpec`] per
//! [`RotorState`]. The spec decides how the carrier frequency is derived while
//! the range is active.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the rotor is currently speeding up, holding speed, or slowing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotorState {
    /// Speed is rising faster than the coasting threshold.
    Accelerating,
    /// Speed is steady within the coasting threshold.
    #[default]
    Coasting,
    /// Speed is falling faster than the coasting threshold.
    Decelerating,
}

impl RotorState {
    /// Returns the human-readable name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RotorState::Accelerating => "Accelerating",
            RotorState::Coasting => "Coasting",
            RotorState::Decelerating => "Decelerating",
        }
    }
}

impl fmt::Display for RotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carrier behavior for one rotor state within a speed range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum WaveformSpec {
    /// Output silenced.
    #[default]
    Disabled,
    /// Asynchronous carrier at a constant frequency.
    FixedAsync {
        /// Carrier frequency in Hz.
        carrier_hz: f32,
    },
    /// Asynchronous carrier swept linearly across the range's speed span.
    RampAsync {
        /// Carrier frequency at the range's minimum speed.
        carrier_hz_start: f32,
        /// Carrier frequency at the range's maximum speed.
        carrier_hz_end: f32,
    },
    /// Randomized carrier, re-drawn periodically within the given bounds.
    Resonant {
        /// Lower bound of the carrier frequency in Hz.
        carrier_hz_min: f32,
        /// Upper bound of the carrier frequency in Hz.
        carrier_hz_max: f32,
    },
    /// Carrier locked to a multiple of the rotor frequency.
    Sync {
        /// Number of carrier pulses per rotor revolution.
        pulse_count: u32,
    },
}

impl WaveformSpec {
    /// Returns the kind tag of this spec.
    pub fn kind(&self) -> WaveformKind {
        match self {
            WaveformSpec::Disabled => WaveformKind::Disabled,
            WaveformSpec::FixedAsync { .. } => WaveformKind::FixedAsync,
            WaveformSpec::RampAsync { .. } => WaveformKind::RampAsync,
            WaveformSpec::Resonant { .. } => WaveformKind::Resonant,
            WaveformSpec::Sync { .. } => WaveformKind::Sync,
        }
    }

    /// Returns true if this spec produces sound.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, WaveformSpec::Disabled)
    }
}

impl fmt::Display for WaveformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveformSpec::Disabled => write!(f, "{}", self.kind()),
            WaveformSpec::FixedAsync { carrier_hz } => {
                write!(f, "{} ({:.1} Hz)", self.kind(), carrier_hz)
            }
            WaveformSpec::RampAsync {
                carrier_hz_start,
                carrier_hz_end,
            } => write!(
                f,
                "{} ({:.1} Hz -> {:.1} Hz)",
                self.kind(),
                carrier_hz_start,
                carrier_hz_end
            ),
            WaveformSpec::Resonant {
                carrier_hz_min,
                carrier_hz_max,
            } => write!(
                f,
                "{} ({:.1} Hz .. {:.1} Hz)",
                self.kind(),
                carrier_hz_min,
                carrier_hz_max
            ),
            WaveformSpec::Sync { pulse_count } => {
                write!(f, "{} ({} pulses)", self.kind(), pulse_count)
            }
        }
    }
}

/// Payload-free tag of a [`WaveformSpec`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformKind {
    /// Output silenced.
    #[default]
    Disabled,
    /// Fixed-frequency asynchronous carrier.
    FixedAsync,
    /// Ramped asynchronous carrier.
    RampAsync,
    /// Randomized carrier.
    Resonant,
    /// Synchronous carrier.
    Sync,
}

impl WaveformKind {
    /// Returns the human-readable name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveformKind::Disabled => "Disabled",
            WaveformKind::FixedAsync => "Fixed Async",
            WaveformKind::RampAsync => "Ramp Async",
            WaveformKind::Resonant => "Random SPWM",
            WaveformKind::Sync => "Synchronous",
        }
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three per-rotor-state behaviors of a speed range.
///
/// States missing from JSON default to [`WaveformSpec::Disabled`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Behaviors {
    /// Behavior while accelerating.
    pub accelerating: WaveformSpec,
    /// Behavior while coasting.
    pub coasting: WaveformSpec,
    /// Behavior while decelerating.
    pub decelerating: WaveformSpec,
}

impl Behaviors {
    /// Uses the same spec for every rotor state.
    pub fn uniform(spec: WaveformSpec) -> Self {
        Self {
            accelerating: spec,
            coasting: spec,
            decelerating: spec,
        }
    }

    /// Every rotor state silenced.
    pub fn disabled() -> Self {
        Self::uniform(WaveformSpec::Disabled)
    }

    /// Returns the spec for the given rotor state.
    pub fn for_state(&self, state: RotorState) -> &WaveformSpec {
        match state {
            RotorState::Accelerating => &self.accelerating,
            RotorState::Coasting => &self.coasting,
            RotorState::Decelerating => &self.decelerating,
        }
    }

    /// Replaces the spec for the given rotor state.
    pub fn set(&mut self, state: RotorState, spec: WaveformSpec) {
        match state {
            RotorState::Accelerating => self.accelerating = spec,
            RotorState::Coasting => self.coasting = spec,
            RotorState::Decelerating => self.decelerating = spec,
        }
    }

    /// Iterates over `(state, spec)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (RotorState, &WaveformSpec)> {
        [
            (RotorState::Accelerating, &self.accelerating),
            (RotorState::Coasting, &self.coasting),
            (RotorState::Decelerating, &self.decelerating),
        ]
        .into_iter()
    }
}
