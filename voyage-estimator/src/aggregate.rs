//! Reduce accumulated trial observations into reportable estimates.
use serde::{Deserialize, Serialize};

use crate::batch::{BatchAccumulator, LevelObservations};
use crate::constants::HOURS_BETWEEN_DILEMMAS;
use crate::numbers::{ceil_f64_to_u64, round_f64_to_u32, u64_to_f64, usize_to_f64};

/// Estimates for one extend level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendLevelResult {
    pub level: u32,
    /// Trials that reached this level. Zero marks an unreached level whose
    /// remaining fields are all zero.
    pub samples: usize,
    pub median_hours: f64,
    /// 10th percentile.
    pub safe_hours: f64,
    /// 1st percentile.
    pub safer_hours: f64,
    /// Last two-hour milestone reached with non-zero confidence.
    pub last_milestone_hours: u32,
    pub milestone_confidence_pct: u32,
    /// Average refill cost paid to reach this level; always 0 at level 0.
    pub average_refill_cost: u64,
}

impl ExtendLevelResult {
    /// Placeholder for a level no trial reached.
    #[must_use]
    pub const fn unreached(level: u32) -> Self {
        Self {
            level,
            samples: 0,
            median_hours: 0.0,
            safe_hours: 0.0,
            safer_hours: 0.0,
            last_milestone_hours: 0,
            milestone_confidence_pct: 0,
            average_refill_cost: 0,
        }
    }

    #[must_use]
    pub const fn is_reached(&self) -> bool {
        self.samples > 0
    }
}

/// Final output of an estimator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One entry per extend level, level 0 first.
    pub extends: Vec<ExtendLevelResult>,
    /// Average refill cost to run past 20 hours.
    pub avg_20h_refill_cost: u64,
    /// Average number of refills to run past 20 hours.
    pub avg_20h_refill_count: u32,
    pub trials_run: u32,
}

impl SimulationResult {
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&ExtendLevelResult> {
        self.extends.get(level)
    }
}

/// Last milestone (in milestone steps) and the percentage of trials that reached it.
///
/// `sorted` must be ascending and non-empty.
#[must_use]
pub fn milestone_confidence(sorted: &[f64]) -> (u32, u32) {
    let step = f64::from(HOURS_BETWEEN_DILEMMAS);
    let mut milestone = 0_u32;
    let mut failures_before = 0_usize;
    for (index, &hours) in sorted.iter().enumerate() {
        let reached = milestone_index(hours / step);
        if reached > milestone {
            milestone = reached;
            failures_before = index;
        }
    }
    let n = usize_to_f64(sorted.len());
    let survivors = usize_to_f64(sorted.len() - failures_before);
    let confidence = round_f64_to_u32(100.0 * survivors / n);
    if confidence == 0 {
        (milestone.saturating_sub(1), 100)
    } else {
        (milestone, confidence)
    }
}

fn milestone_index(steps: f64) -> u32 {
    // floor of a non-negative finite value; anything else counts as no milestone.
    if steps.is_finite() && steps > 0.0 {
        round_f64_to_u32(steps.floor())
    } else {
        0
    }
}

/// Sort a level's observations in place and compute its estimates.
pub fn aggregate_level(level: u32, observations: &mut LevelObservations, trials: u32) -> ExtendLevelResult {
    let hours = &mut observations.hours;
    if hours.is_empty() {
        return ExtendLevelResult::unreached(level);
    }
    hours.sort_by(f64::total_cmp);
    let n = hours.len();
    let (milestone, confidence) = milestone_confidence(hours);
    let average_refill_cost = if level > 0 && trials > 0 {
        ceil_f64_to_u64(u64_to_f64(observations.refill_cost_sum) / f64::from(trials))
    } else {
        0
    };
    ExtendLevelResult {
        level,
        samples: n,
        median_hours: hours[n / 2],
        safe_hours: hours[n / 10],
        safer_hours: hours[n / 100],
        last_milestone_hours: milestone.saturating_mul(HOURS_BETWEEN_DILEMMAS),
        milestone_confidence_pct: confidence,
        average_refill_cost,
    }
}

/// Consume a batch and produce the final result.
///
/// `sub_sample_size` is the number of trials the 20-hour averages divide by.
#[must_use]
pub fn aggregate(mut batch: BatchAccumulator, sub_sample_size: u32) -> SimulationResult {
    let trials = batch.trials;
    let extends = batch
        .levels
        .iter_mut()
        .enumerate()
        .map(|(index, observations)| {
            let level = u32::try_from(index).unwrap_or(u32::MAX);
            aggregate_level(level, observations, trials)
        })
        .collect();
    let divisor = f64::from(sub_sample_size.max(1));
    SimulationResult {
        extends,
        avg_20h_refill_cost: ceil_f64_to_u64(u64_to_f64(batch.sum_20h_refill_cost) / divisor),
        avg_20h_refill_count: round_f64_to_u32(u64_to_f64(batch.sum_20h_refills) / divisor),
        trials_run: trials,
    }
}
