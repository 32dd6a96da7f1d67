//! Simulation configuration and validation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_HAZARD_SKILL_VARIANCE, DEFAULT_MAX_20H_SUB_SAMPLE, DEFAULT_MAX_EXTENDS,
    DEFAULT_MAX_TICKS, DEFAULT_NUM_EXTENDS, DEFAULT_NUM_TRIALS,
};
use crate::numbers::hours_to_ticks;

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("num_trials must be at least 1")]
    ZeroTrials,
    #[error("max_20h_sub_sample must be at least 1")]
    ZeroSubSample,
    #[error("max_ticks must be at least 1")]
    ZeroTickLimit,
    #[error("hazard_skill_variance must be between 0.00 and 1.00 (got {0:.2})")]
    VarianceOutOfRange(f64),
    #[error("elapsed_hours must be a finite, non-negative number (got {0})")]
    InvalidElapsedHours(f64),
    #[error("current_resource must not be negative (got {0})")]
    NegativeCurrentResource(i64),
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Knobs for one estimator run. Immutable once the batch starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_num_trials")]
    pub num_trials: u32,
    /// Extend levels reported, in addition to level 0.
    #[serde(default = "SimulationConfig::default_num_extends")]
    pub num_extends: u32,
    /// Refills a single trial may consume before it is abandoned.
    #[serde(default = "SimulationConfig::default_max_extends")]
    pub max_extends: u32,
    /// Leading trials that keep extending past `num_extends` to measure the
    /// cost of reaching 20 hours.
    #[serde(default = "SimulationConfig::default_max_20h_sub_sample")]
    pub max_20h_sub_sample: u32,
    #[serde(default = "SimulationConfig::default_hazard_skill_variance")]
    pub hazard_skill_variance: f64,
    #[serde(default)]
    pub start_resource: i64,
    /// Resource on hand when resuming a voyage; 0 means `start_resource`.
    #[serde(default)]
    pub current_resource: i64,
    /// Hours already elapsed when resuming a voyage.
    #[serde(default)]
    pub elapsed_hours: f64,
    /// Absolute tick at which any trial is cut off.
    #[serde(default = "SimulationConfig::default_max_ticks")]
    pub max_ticks: u32,
    /// Run seed; `None` draws one from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    const fn default_num_trials() -> u32 {
        DEFAULT_NUM_TRIALS
    }

    const fn default_num_extends() -> u32 {
        DEFAULT_NUM_EXTENDS
    }

    const fn default_max_extends() -> u32 {
        DEFAULT_MAX_EXTENDS
    }

    const fn default_max_20h_sub_sample() -> u32 {
        DEFAULT_MAX_20H_SUB_SAMPLE
    }

    const fn default_hazard_skill_variance() -> f64 {
        DEFAULT_HAZARD_SKILL_VARIANCE
    }

    const fn default_max_ticks() -> u32 {
        DEFAULT_MAX_TICKS
    }

    /// Default configuration for a fresh voyage with `start_resource` antimatter.
    #[must_use]
    pub fn for_voyage(start_resource: i64) -> Self {
        Self {
            start_resource,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON document and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or violates an invariant.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants that must hold before any trial runs.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        if self.max_20h_sub_sample == 0 {
            return Err(ConfigError::ZeroSubSample);
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::ZeroTickLimit);
        }
        if !(0.0..=1.0).contains(&self.hazard_skill_variance) {
            return Err(ConfigError::VarianceOutOfRange(self.hazard_skill_variance));
        }
        if !self.elapsed_hours.is_finite() || self.elapsed_hours < 0.0 {
            return Err(ConfigError::InvalidElapsedHours(self.elapsed_hours));
        }
        if self.current_resource < 0 {
            return Err(ConfigError::NegativeCurrentResource(self.current_resource));
        }
        Ok(())
    }

    #[must_use]
    pub const fn with_num_trials(mut self, num_trials: u32) -> Self {
        self.num_trials = num_trials;
        self
    }

    #[must_use]
    pub const fn with_num_extends(mut self, num_extends: u32) -> Self {
        self.num_extends = num_extends;
        self
    }

    #[must_use]
    pub const fn with_max_extends(mut self, max_extends: u32) -> Self {
        self.max_extends = max_extends;
        self
    }

    #[must_use]
    pub const fn with_max_20h_sub_sample(mut self, max_20h_sub_sample: u32) -> Self {
        self.max_20h_sub_sample = max_20h_sub_sample;
        self
    }

    #[must_use]
    pub const fn with_hazard_skill_variance(mut self, variance: f64) -> Self {
        self.hazard_skill_variance = variance;
        self
    }

    #[must_use]
    pub const fn with_start_resource(mut self, start_resource: i64) -> Self {
        self.start_resource = start_resource;
        self
    }

    /// Resume an in-progress voyage.
    #[must_use]
    pub const fn resuming(mut self, current_resource: i64, elapsed_hours: f64) -> Self {
        self.current_resource = current_resource;
        self.elapsed_hours = elapsed_hours;
        self
    }

    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resource each trial starts with.
    #[must_use]
    pub const fn initial_resource(&self) -> i64 {
        if self.current_resource == 0 {
            self.start_resource
        } else {
            self.current_resource
        }
    }

    /// Tick counter value before the first simulated tick.
    #[must_use]
    pub fn initial_tick(&self) -> u32 {
        hours_to_ticks(self.elapsed_hours)
    }

    /// Trials whose 20-hour statistics are averaged.
    #[must_use]
    pub fn sub_sample_size(&self) -> u32 {
        self.num_trials.min(self.max_20h_sub_sample)
    }

    /// Number of reported extend levels, including level 0.
    #[must_use]
    pub fn level_count(&self) -> usize {
        usize::try_from(self.num_extends).map_or(usize::MAX, |n| n.saturating_add(1))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_trials: Self::default_num_trials(),
            num_extends: Self::default_num_extends(),
            max_extends: Self::default_max_extends(),
            max_20h_sub_sample: Self::default_max_20h_sub_sample(),
            hazard_skill_variance: Self::default_hazard_skill_variance(),
            start_resource: 0,
            current_resource: 0,
            elapsed_hours: 0.0,
            max_ticks: Self::default_max_ticks(),
            seed: None,
        }
    }
}
