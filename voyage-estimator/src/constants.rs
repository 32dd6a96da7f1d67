//! Centralized time model and tuning constants for the voyage estimator.
//!
//! The simulation advances in fixed 20-second ticks. Every derived rate below
//! is expressed in ticks so that the trial loop stays in integer arithmetic
//! until an elapsed time has to be reported.

// Time model ---------------------------------------------------------------
pub const SECONDS_PER_TICK: u32 = 20;
pub const TICKS_PER_MINUTE: u32 = 60 / SECONDS_PER_TICK;
pub const TICKS_PER_HOUR: u32 = TICKS_PER_MINUTE * 60;
pub const TICKS_BETWEEN_DILEMMAS: u32 = TICKS_PER_HOUR * 2;
pub const TICKS_BETWEEN_HAZARDS: u32 = 4;
pub const TICKS_BETWEEN_REWARDS: u32 = 7;
pub const TICKS_PER_HAZARD_REWARD: u32 = TICKS_BETWEEN_HAZARDS * TICKS_BETWEEN_REWARDS;
pub const HOURS_BETWEEN_DILEMMAS: u32 = TICKS_BETWEEN_DILEMMAS / TICKS_PER_HOUR;

// Hazard difficulty --------------------------------------------------------
pub const HAZARD_SKILL_PER_HOUR: u32 = 1_260;
pub const HAZARD_SKILL_PER_TICK: u32 = HAZARD_SKILL_PER_HOUR / TICKS_PER_HOUR;
pub(crate) const PRIMARY_SKILL_CHANCE: f64 = 0.35;
pub(crate) const SECONDARY_SKILL_CHANCE: f64 = 0.25;
pub const OTHER_SKILL_COUNT: usize = 4;

// Resource deltas ----------------------------------------------------------
pub(crate) const HAZARD_PASS_GAIN: i64 = 5;
pub(crate) const HAZARD_FAIL_LOSS: i64 = 30;
pub(crate) const PASSIVE_DECAY: i64 = 1;

// Refill pricing -----------------------------------------------------------
pub const MINUTES_PER_REFILL_UNIT: f64 = 5.0;
pub const TWENTY_HOURS: f64 = 20.0;

// Configuration defaults ---------------------------------------------------
pub const DEFAULT_NUM_TRIALS: u32 = 5_000;
pub const DEFAULT_NUM_EXTENDS: u32 = 2;
pub const DEFAULT_MAX_EXTENDS: u32 = 100;
pub const DEFAULT_MAX_20H_SUB_SAMPLE: u32 = 100;
pub const DEFAULT_HAZARD_SKILL_VARIANCE: f64 = 0.20;
pub const DEFAULT_MAX_TICKS: u32 = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_rates_match_time_model() {
        assert_eq!(TICKS_PER_MINUTE, 3);
        assert_eq!(TICKS_PER_HOUR, 180);
        assert_eq!(TICKS_BETWEEN_DILEMMAS, 360);
        assert_eq!(HAZARD_SKILL_PER_TICK, 7);
        assert_eq!(TICKS_PER_HAZARD_REWARD, 28);
        assert_eq!(HOURS_BETWEEN_DILEMMAS, 2);
    }
}
