//! Rolling averages over noisy motor telemetry.

use vvvf_spec::TelemetryConfig;

/// Fixed-window moving average over the last `N` pushed samples.
///
/// The window starts filled with zeros, so the first few averages ramp up
/// from zero rather than jumping to the first sample.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    samples: Box<[f32]>,
    idx: usize,
    sum: f32,
}

impl RollingAverage {
    /// Creates a window of `size` samples (at least one).
    pub fn new(size: usize) -> Self {
        Self {
            samples: vec![0.0; size.max(1)].into_boxed_slice(),
            idx: 0,
            sum: 0.0,
        }
    }

    /// Pushes a sample, evicting the oldest, and returns the new mean.
    pub fn push(&mut self, value: f32) -> f32 {
        let evicted = std::mem::replace(&mut self.samples[self.idx], value);
        self.idx = (self.idx + 1) % self.samples.len();

        // Recompute on wrap so float drift from the running sum cannot build up.
        if self.idx == 0 {
            self.sum = self.samples.iter().sum();
        } else {
            self.sum += value - evicted;
        }
        self.mean()
    }

    /// Mean over the whole window.
    pub fn mean(&self) -> f32 {
        self.sum / self.samples.len() as f32
    }

    /// Window size.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a window holds at least one slot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Refills the window with zeros.
    pub fn clear(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.idx = 0;
        self.sum = 0.0;
    }
}

/// Smoothed motor telemetry.
#[derive(Debug, Clone)]
pub struct TelemetryAverager {
    current: RollingAverage,
    frequency: RollingAverage,
    pole_count: u32,
}

impl TelemetryAverager {
    /// Creates an averager with the configured window.
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            current: RollingAverage::new(config.window),
            frequency: RollingAverage::new(config.window),
            pole_count: 0,
        }
    }

    /// Pushes a phase current sample (A) and returns the averaged current.
    pub fn push_current(&mut self, amps: f32) -> f32 {
        self.current.push(amps)
    }

    /// Pushes an electrical frequency sample (Hz) and returns the averaged frequency.
    pub fn push_frequency(&mut self, hz: f32) -> f32 {
        self.frequency.push(hz)
    }

    /// Sets the motor pole count. Not averaged.
    pub fn set_pole_count(&mut self, poles: u32) {
        self.pole_count = poles;
    }

    /// Averaged phase current (A).
    pub fn current(&self) -> f32 {
        self.current.mean()
    }

    /// Averaged electrical frequency (Hz).
    pub fn frequency(&self) -> f32 {
        self.frequency.mean()
    }

    /// Motor pole count.
    pub fn pole_count(&self) -> u32 {
        self.pole_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_ramps_from_zero() {
        let mut avg = RollingAverage::new(5);
        assert_eq!(avg.push(10.0), 2.0);
        assert_eq!(avg.push(10.0), 4.0);
        for _ in 0..3 {
            avg.push(10.0);
        }
        assert_eq!(avg.mean(), 10.0);
    }

    #[test]
    fn test_average_evicts_oldest() {
        let mut avg = RollingAverage::new(3);
        avg.push(3.0);
        avg.push(6.0);
        avg.push(9.0);
        assert_eq!(avg.mean(), 6.0);
        avg.push(0.0);
        assert_eq!(avg.mean(), 5.0);
    }

    #[test]
    fn test_zero_window_is_promoted() {
        let mut avg = RollingAverage::new(0);
        assert_eq!(avg.len(), 1);
        assert_eq!(avg.push(7.0), 7.0);
    }

    #[test]
    fn test_clear() {
        let mut avg = RollingAverage::new(2);
        avg.push(4.0);
        avg.clear();
        assert_eq!(avg.mean(), 0.0);
    }

    #[test]
    fn test_averager_channels_are_independent() {
        let mut telemetry = TelemetryAverager::new(&TelemetryConfig { window: 2 });
        telemetry.push_current(10.0);
        telemetry.push_frequency(50.0);
        telemetry.push_frequency(50.0);
        telemetry.set_pole_count(4);

        assert_eq!(telemetry.current(), 5.0);
        assert_eq!(telemetry.frequency(), 50.0);
        assert_eq!(telemetry.pole_count(), 4);
    }
}
