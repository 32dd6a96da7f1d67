//! Voyage Duration Estimator
//!
//! Monte Carlo estimate of how long a voyage runs before its antimatter is
//! exhausted, how much it costs to refill and keep going, and how confident
//! the crew can be of reaching each two-hour milestone.
//!
//! The pipeline is strictly one-way: [`trial`] simulates one voyage,
//! [`batch`] repeats it and accumulates outcomes, and [`aggregate`] reduces
//! the accumulated observations into a [`SimulationResult`].

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod constants;
pub mod estimator;
pub mod hazard;
pub mod numbers;
pub mod seed;
pub mod skills;
pub mod tick;
pub mod trial;

// Re-export commonly used types
pub use aggregate::{ExtendLevelResult, SimulationResult, aggregate, aggregate_level};
pub use batch::{BatchAccumulator, BatchDriver, LevelObservations, TerminationTally};
pub use config::{ConfigError, SimulationConfig};
pub use estimator::{EstimateError, VoyageEstimator, estimate_voyage};
pub use hazard::{HazardDraw, HazardOutcome, resolve_check, resolve_hazard};
pub use seed::TrialSeeder;
pub use skills::{InputError, SkillInputs, SkillSlot};
pub use tick::{TickKind, classify};
pub use trial::{
    ExtendObservation, TerminationReason, Trial, TrialOutcome, TrialPhase, TrialState,
    TwentyHourSample, run_trial,
};
