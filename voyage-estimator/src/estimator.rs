//! Public entry points tying the trial runner, batch driver, and aggregator together.
use log::{debug, warn};
use rand::Rng;
use std::time::Instant;
use thiserror::Error;

use crate::aggregate::{SimulationResult, aggregate};
use crate::batch::{BatchAccumulator, BatchDriver};
use crate::config::{ConfigError, SimulationConfig};
use crate::seed::TrialSeeder;
use crate::skills::{InputError, SkillInputs};

/// Errors surfaced before a batch starts.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Configured estimator that can be run against any number of skill sets.
#[derive(Debug, Clone, PartialEq)]
pub struct VoyageEstimator {
    config: SimulationConfig,
    strict: bool,
    sequential: bool,
}

impl VoyageEstimator {
    /// Estimator that accepts degenerate inputs.
    #[must_use]
    pub const fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            strict: false,
            sequential: false,
        }
    }

    /// Reject non-positive skills and starting resource instead of simulating them.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Keep seeded runs on the calling thread. Results are identical either way.
    #[must_use]
    pub const fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Validate configuration and, in strict mode, inputs.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or input problem found.
    pub fn check(&self, skills: &SkillInputs) -> Result<(), EstimateError> {
        self.config.validate()?;
        if self.strict {
            skills.validate()?;
            if self.config.start_resource <= 0 {
                return Err(InputError::NonPositiveResource {
                    field: "start_resource",
                    value: self.config.start_resource,
                }
                .into());
            }
        } else if skills.is_degenerate() || self.config.start_resource <= 0 {
            warn!(
                "simulating degenerate inputs (skills {skills:?}, start resource {}); results skew toward early failure",
                self.config.start_resource
            );
        }
        Ok(())
    }

    /// Run the configured number of trials, seeding from the config or entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or (in strict mode) the inputs are invalid.
    pub fn estimate(&self, skills: &SkillInputs) -> Result<SimulationResult, EstimateError> {
        self.check(skills)?;
        let seeder = self
            .config
            .seed
            .map_or_else(TrialSeeder::from_entropy, TrialSeeder::new);
        let started = Instant::now();
        let driver = BatchDriver::new(skills, &self.config);
        let batch = if self.sequential {
            driver.run_seeded_sequential(seeder)
        } else {
            driver.run_seeded(seeder)
        };
        Ok(self.finish(batch, Some(seeder.run_seed()), started))
    }

    /// Run every trial on one caller-supplied random stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or (in strict mode) the inputs are invalid.
    pub fn estimate_with_rng<R: Rng + ?Sized>(
        &self,
        skills: &SkillInputs,
        rng: &mut R,
    ) -> Result<SimulationResult, EstimateError> {
        self.check(skills)?;
        let started = Instant::now();
        let batch = BatchDriver::new(skills, &self.config).run_with_rng(rng);
        Ok(self.finish(batch, None, started))
    }

    fn finish(&self, batch: BatchAccumulator, run_seed: Option<u64>, started: Instant) -> SimulationResult {
        debug!(
            "ran {} trials (seed {run_seed:?}) in {:?}: {:?}",
            batch.trials,
            started.elapsed(),
            batch.terminations
        );
        let result = aggregate(batch, self.config.sub_sample_size());
        for level in result.extends.iter().filter(|level| !level.is_reached()) {
            warn!("extend level {} was never reached by any trial", level.level);
        }
        result
    }
}

/// Estimate a fresh or resumed voyage with default settings.
///
/// `current_resource` of 0 means the voyage starts with `start_resource`;
/// `elapsed_hours` of 0 means a fresh voyage.
///
/// # Errors
///
/// Returns an error if the derived configuration is invalid.
#[allow(clippy::too_many_arguments)]
pub fn estimate_voyage(
    primary: f64,
    secondary: f64,
    other1: f64,
    other2: f64,
    other3: f64,
    other4: f64,
    start_resource: i64,
    num_extends: u32,
    current_resource: i64,
    elapsed_hours: f64,
) -> Result<SimulationResult, EstimateError> {
    let skills = SkillInputs::new(primary, secondary, [other1, other2, other3, other4]);
    let config = SimulationConfig::for_voyage(start_resource)
        .with_num_extends(num_extends)
        .resuming(current_resource, elapsed_hours);
    VoyageEstimator::new(config).estimate(&skills)
}
