//! Arrival-ordered temperature series and its render projection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{Classification, Sample, Thresholds};

/// Mapping from arrival index to the chart's x axis.
///
/// No wall-clock time is stored: a sample's x coordinate is
/// `index / samples_per_unit`, labelled with `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAxis {
    pub samples_per_unit: f64,
    pub label: String,
}

impl Default for TimeAxis {
    fn default() -> Self {
        Self {
            samples_per_unit: 10.0,
            label: "Time (minutes)".to_string(),
        }
    }
}

impl TimeAxis {
    pub fn x(&self, index: u64) -> f64 {
        index as f64 / self.samples_per_unit
    }
}

/// One sample as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Arrival index since the last reset.
    pub index: u64,
    pub x: f64,
    pub value: f64,
    pub class: Classification,
}

/// Samples in arrival order, optionally bounded.
///
/// With a retention bound the oldest samples are evicted, but arrival indices
/// keep counting so x coordinates stay stable.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: VecDeque<Sample>,
    /// Arrival index of `samples[0]`.
    first_index: u64,
    retention: Option<usize>,
}

impl TimeSeries {
    /// Create an empty series. `None` (or zero) means unbounded.
    pub fn new(retention: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            first_index: 0,
            retention: retention.filter(|&n| n > 0),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        if let Some(limit) = self.retention {
            while self.samples.len() > limit {
                self.samples.pop_front();
                self.first_index += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.first_index = 0;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn retention(&self) -> Option<usize> {
        self.retention
    }

    /// Total samples pushed since the last clear, including evicted ones.
    pub fn total_arrived(&self) -> u64 {
        self.first_index + self.samples.len() as u64
    }

    pub fn last(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    /// Retained samples with their arrival indices.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Sample)> + '_ {
        self.samples.iter().enumerate().map(|(i, s)| (self.first_index + i as u64, *s))
    }

    /// Project every retained sample for rendering, classifying on the fly.
    pub fn points(&self, thresholds: &Thresholds, axis: &TimeAxis) -> Vec<SeriesPoint> {
        self.iter()
            .map(|(index, sample)| SeriesPoint {
                index,
                x: axis.x(index),
                value: sample.value(),
                class: thresholds.classify(sample),
            })
            .collect()
    }
}
