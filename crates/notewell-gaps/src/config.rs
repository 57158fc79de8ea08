use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DetectionError;

/// Tunable constants of the detection engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct DetectionConfig {
    /// Sections scoring below this are flagged for review.
    pub review_threshold: f64,
    /// Sections scoring below this are high severity.
    pub critical_threshold: f64,
    /// Share of the score driven by expected-keyword coverage, 0–1.
    pub keyword_weight: f64,
    /// Weight of required sections in the completeness average.
    pub required_weight: f64,
    /// Minimum content length for sections whose template sets none.
    pub default_min_length: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            review_threshold: 60.0,
            critical_threshold: 40.0,
            keyword_weight: 0.3,
            required_weight: 2.0,
            default_min_length: 0,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), DetectionError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);

        if !in_range(self.review_threshold) || !in_range(self.critical_threshold) {
            return Err(DetectionError::InvalidInput(
                "thresholds must be between 0 and 100".to_string(),
            ));
        }
        if self.critical_threshold > self.review_threshold {
            return Err(DetectionError::InvalidInput(format!(
                "critical threshold {} exceeds review threshold {}",
                self.critical_threshold, self.review_threshold
            )));
        }
        if !self.keyword_weight.is_finite() || !(0.0..=1.0).contains(&self.keyword_weight) {
            return Err(DetectionError::InvalidInput(
                "keyword weight must be between 0 and 1".to_string(),
            ));
        }
        if !self.required_weight.is_finite() || self.required_weight <= 0.0 {
            return Err(DetectionError::InvalidInput(
                "required weight must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: &DetectionOverrides) -> Self {
        if let Some(v) = overrides.review_threshold {
            self.review_threshold = v;
        }
        if let Some(v) = overrides.critical_threshold {
            self.critical_threshold = v;
        }
        if let Some(v) = overrides.keyword_weight {
            self.keyword_weight = v;
        }
        if let Some(v) = overrides.required_weight {
            self.required_weight = v;
        }
        if let Some(v) = overrides.default_min_length {
            self.default_min_length = v;
        }
        self
    }
}

/// Per-request adjustments to the service's [`DetectionConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DetectionOverrides {
    #[serde(default)]
    pub review_threshold: Option<f64>,
    #[serde(default)]
    pub critical_threshold: Option<f64>,
    #[serde(default)]
    pub keyword_weight: Option<f64>,
    #[serde(default)]
    pub required_weight: Option<f64>,
    #[serde(default)]
    pub default_min_length: Option<u32>,
}
