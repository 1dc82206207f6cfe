//! Temperature thresholds and per-sample classification.

use serde::{Deserialize, Serialize};

use super::Sample;

/// Cutoffs used for alerting and for the chart's colour hints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Readings at or above this value raise an alert and render as `High`.
    pub high: f64,
    /// Readings at or below this value render as `Low`. No alert is raised.
    pub low: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 35.0,
            low: 25.0,
        }
    }
}

impl Thresholds {
    /// Classify a reading. Pure function of the value; never cached.
    pub fn classify(&self, sample: Sample) -> Classification {
        let value = sample.value();
        if value >= self.high {
            Classification::High
        } else if value <= self.low {
            Classification::Low
        } else {
            Classification::Normal
        }
    }

    /// Whether a reading must fire a threshold alert (inclusive).
    pub fn is_alert(&self, sample: Sample) -> bool {
        sample.value() >= self.high
    }
}

/// Render hint derived from a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    High,
    Normal,
    Low,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Classification::High => "HIGH",
            Classification::Normal => "NORMAL",
            Classification::Low => "LOW",
        }
    }

    /// Marker used in the readings table.
    pub fn symbol(self) -> &'static str {
        match self {
            Classification::High => "▲ HIGH",
            Classification::Normal => "● NORMAL",
            Classification::Low => "▼ LOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: f64) -> Sample {
        Sample::new(v).unwrap()
    }

    #[test]
    fn test_classification_boundaries() {
        let t = Thresholds::default();
        assert_eq!(t.classify(s(25.0)), Classification::Low);
        assert_eq!(t.classify(s(25.01)), Classification::Normal);
        assert_eq!(t.classify(s(34.99)), Classification::Normal);
        assert_eq!(t.classify(s(35.0)), Classification::High);
    }

    #[test]
    fn test_alert_boundary_is_inclusive() {
        let t = Thresholds::default();
        assert!(!t.is_alert(s(34.9)));
        assert!(t.is_alert(s(35.0)));
        assert!(t.is_alert(s(36.0)));
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            high: 80.0,
            low: 10.0,
        };
        assert_eq!(t.classify(s(35.0)), Classification::Normal);
        assert_eq!(t.classify(s(10.0)), Classification::Low);
        assert!(t.is_alert(s(80.0)));
    }
}
