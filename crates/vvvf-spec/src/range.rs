//! Speed ranges and the bounded table that maps vehicle speed onto them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::waveform::{Behaviors, RotorState, WaveformSpec};

/// Maximum number of ranges a table can hold.
pub const MAX_SPEED_RANGES: usize = 16;

/// Upper bound reported by the silence sentinel.
pub const SENTINEL_MAX_SPEED_KMH: f32 = 99999.0;

/// Range returned whenever no configured range applies. Never stored in a table.
pub const SENTINEL_RANGE: SpeedRange = SpeedRange {
    min_speed_kmh: 0.0,
    max_speed_kmh: SENTINEL_MAX_SPEED_KMH,
    behaviors: Behaviors {
        accelerating: WaveformSpec::Disabled,
        coasting: WaveformSpec::Disabled,
        decelerating: WaveformSpec::Disabled,
    },
};

/// A speed interval and its per-rotor-state waveform behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeedRange {
    /// Lower bound in km/h (inclusive).
    pub min_speed_kmh: f32,
    /// Upper bound in km/h (inclusive).
    pub max_speed_kmh: f32,
    /// Waveform behaviors for each rotor state.
    pub behaviors: Behaviors,
}

impl SpeedRange {
    /// Creates a new range.
    pub fn new(min_speed_kmh: f32, max_speed_kmh: f32, behaviors: Behaviors) -> Self {
        Self {
            min_speed_kmh,
            max_speed_kmh,
            behaviors,
        }
    }

    /// Returns true if this is the silence sentinel.
    pub fn is_sentinel(&self) -> bool {
        *self == SENTINEL_RANGE
    }

    /// Width of the range in km/h.
    pub fn span(&self) -> f32 {
        self.max_speed_kmh - self.min_speed_kmh
    }

    /// Returns true if `speed_kmh` lies within `[min - margin, max]`.
    pub fn contains(&self, speed_kmh: f32, lower_margin_kmh: f32) -> bool {
        speed_kmh >= self.min_speed_kmh - lower_margin_kmh && speed_kmh <= self.max_speed_kmh
    }

    /// Returns the waveform spec for the given rotor state.
    pub fn spec_for(&self, state: RotorState) -> &WaveformSpec {
        self.behaviors.for_state(state)
    }
}

impl fmt::Display for SpeedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Min Speed: {:.1} km/h", self.min_speed_kmh)?;
        writeln!(f, "  Max Speed: {:.1} km/h", self.max_speed_kmh)?;
        for (state, spec) in self.behaviors.iter() {
            writeln!(f, "  {}: {}", state, spec)?;
        }
        Ok(())
    }
}

/// Thresholds applied by [`SpeedRangeTable::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupLimits {
    /// Speeds above this are capped before lookup (km/h).
    pub max_speed_kmh: f32,
    /// Below this speed the inverter is considered idle unless excited (km/h).
    pub zero_speed_cutoff_kmh: f32,
    /// Below this current (A) a near-standstill motor is considered idle.
    pub excitation_current_threshold: f32,
    /// Margin subtracted from the first range's minimum (km/h).
    pub first_range_margin_kmh: f32,
}

impl Default for LookupLimits {
    fn default() -> Self {
        Self {
            max_speed_kmh: 200.0,
            zero_speed_cutoff_kmh: 1.0,
            excitation_current_threshold: 3.0,
            first_range_margin_kmh: 1.0,
        }
    }
}

/// Ordered, bounded table of speed ranges.
///
/// Ranges are expected in ascending `min_speed_kmh` order. The table does not
/// re-sort; [`crate::validation::validate_config`] reports malformed tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<SpeedRange>", into = "Vec<SpeedRange>")]
pub struct SpeedRangeTable {
    ranges: Vec<SpeedRange>,
}

impl SpeedRangeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            ranges: Vec::with_capacity(MAX_SPEED_RANGES),
        }
    }

    /// Appends a range, failing once the table is full.
    pub fn push(&mut self, range: SpeedRange) -> ConfigResult<()> {
        if self.ranges.len() >= MAX_SPEED_RANGES {
            return Err(ConfigError::TableFull {
                capacity: MAX_SPEED_RANGES,
            });
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Number of configured ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if no range is configured.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the range at `index`.
    pub fn get(&self, index: usize) -> Option<&SpeedRange> {
        self.ranges.get(index)
    }

    /// Iterates over the configured ranges in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, SpeedRange> {
        self.ranges.iter()
    }

    /// Finds the range that applies at `speed_kmh` with `motor_current` amps.
    ///
    /// Returns [`SENTINEL_RANGE`] when the table is empty, when the drive is
    /// idle (slow and barely excited), or when no range contains the speed.
    pub fn lookup(&self, speed_kmh: f32, motor_current: f32, limits: &LookupLimits) -> SpeedRange {
        if self.ranges.is_empty() {
            return SENTINEL_RANGE;
        }

        let speed_kmh = speed_kmh.min(limits.max_speed_kmh);

        // Stall with high current still sounds; true standstill does not.
        if speed_kmh < limits.zero_speed_cutoff_kmh
            && motor_current < limits.excitation_current_threshold
        {
            return SENTINEL_RANGE;
        }

        self.ranges
            .iter()
            .enumerate()
            .find(|(i, range)| {
                let margin = if *i == 0 {
                    limits.first_range_margin_kmh
                } else {
                    0.0
                };
                range.contains(speed_kmh, margin)
            })
            .map(|(_, range)| *range)
            .unwrap_or(SENTINEL_RANGE)
    }
}

impl TryFrom<Vec<SpeedRange>> for SpeedRangeTable {
    type Error = ConfigError;

    fn try_from(ranges: Vec<SpeedRange>) -> ConfigResult<Self> {
        let mut table = SpeedRangeTable::new();
        for range in ranges {
            table.push(range)?;
        }
        Ok(table)
    }
}

impl From<SpeedRangeTable> for Vec<SpeedRange> {
    fn from(table: SpeedRangeTable) -> Self {
        table.ranges
    }
}

impl<'a> IntoIterator for &'a SpeedRangeTable {
    type Item = &'a SpeedRange;
    type IntoIter = std::slice::Iter<'a, SpeedRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
