//! Rotor state classification from a sliding window of speed samples.

use vvvf_spec::{ClassifierConfig, RotorState};

use crate::telemetry::RollingAverage;

/// Classifies the rotor as accelerating, coasting or decelerating.
///
/// Each new sample is compared with the mean of the window it has just
/// joined. There is no hysteresis band: a signal hovering around the
/// threshold may flip state on every update.
#[derive(Debug, Clone)]
pub struct RotorStateClassifier {
    history: RollingAverage,
    coasting_threshold: f32,
    state: RotorState,
}

impl RotorStateClassifier {
    /// Creates a classifier with an all-zero history.
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            history: RollingAverage::new(config.history_size),
            coasting_threshold: config.coasting_threshold,
            state: RotorState::Coasting,
        }
    }

    /// Pushes the latest speed (or rotor frequency) and returns the new state.
    pub fn classify(&mut self, latest: f32) -> RotorState {
        let mean = self.history.push(latest);
        let delta = (mean - latest).abs();

        self.state = if delta <= self.coasting_threshold {
            RotorState::Coasting
        } else if latest > mean {
            RotorState::Accelerating
        } else {
            RotorState::Decelerating
        };
        self.state
    }

    /// State from the most recent classification.
    pub fn state(&self) -> RotorState {
        self.state
    }

    /// Window length.
    pub fn history_size(&self) -> usize {
        self.history.len()
    }
}
