//! Running minimum and maximum.

use super::Sample;

/// All-time extremes observed since the engine started or was last reset.
///
/// Starts at `(-inf, +inf)` so the first sample always becomes both the
/// maximum and the minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    max: f64,
    min: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
        }
    }

    /// Raise the maximum if `sample` is strictly greater. Returns true if it changed.
    pub fn update_max(&mut self, sample: Sample) -> bool {
        if sample.value() > self.max {
            self.max = sample.value();
            true
        } else {
            false
        }
    }

    /// Lower the minimum if `sample` is strictly smaller. Returns true if it changed.
    pub fn update_min(&mut self, sample: Sample) -> bool {
        if sample.value() < self.min {
            self.min = sample.value();
            true
        } else {
            false
        }
    }

    /// Raw maximum, `-inf` before the first sample.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Raw minimum, `+inf` before the first sample.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum, or `None` before the first sample.
    pub fn observed_max(&self) -> Option<f64> {
        self.max.is_finite().then_some(self.max)
    }

    /// Minimum, or `None` before the first sample.
    pub fn observed_min(&self) -> Option<f64> {
        self.min.is_finite().then_some(self.min)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
