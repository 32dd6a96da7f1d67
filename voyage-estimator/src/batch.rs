//! Batch driver: runs many independent trials and accumulates their outcomes.
//!
//! Accumulators are plain sums and concatenations, so per-worker partials can
//! be merged in any order without changing the aggregated result.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::seed::TrialSeeder;
use crate::skills::SkillInputs;
use crate::trial::{TerminationReason, TrialOutcome, run_trial};

/// Raw observations for one extend level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelObservations {
    /// Elapsed hours at failure, one entry per trial that reached the level.
    pub hours: Vec<f64>,
    /// Refill cost paid to reach this level, summed over trials.
    pub refill_cost_sum: u64,
}

/// How many trials stopped for each reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationTally {
    pub max_extends: u32,
    pub past_twenty_hours: u32,
    pub extends_reported: u32,
    pub tick_limit: u32,
}

impl TerminationTally {
    pub fn record(&mut self, reason: TerminationReason) {
        let slot = match reason {
            TerminationReason::MaxExtends => &mut self.max_extends,
            TerminationReason::PastTwentyHours => &mut self.past_twenty_hours,
            TerminationReason::ExtendsReported => &mut self.extends_reported,
            TerminationReason::TickLimit => &mut self.tick_limit,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            max_extends: self.max_extends.saturating_add(other.max_extends),
            past_twenty_hours: self.past_twenty_hours.saturating_add(other.past_twenty_hours),
            extends_reported: self.extends_reported.saturating_add(other.extends_reported),
            tick_limit: self.tick_limit.saturating_add(other.tick_limit),
        }
    }
}

/// Everything the aggregator needs from a batch of trials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAccumulator {
    pub levels: Vec<LevelObservations>,
    pub sum_20h_refill_cost: u64,
    pub sum_20h_refills: u64,
    pub trials: u32,
    pub terminations: TerminationTally,
}

impl BatchAccumulator {
    /// Empty accumulator tracking `level_count` extend levels.
    #[must_use]
    pub fn new(level_count: usize) -> Self {
        Self {
            levels: vec![LevelObservations::default(); level_count],
            ..Self::default()
        }
    }

    /// Fold a finished trial into the running totals.
    pub fn absorb(&mut self, outcome: &TrialOutcome) {
        for obs in &outcome.observations {
            let Some(level) = usize::try_from(obs.level)
                .ok()
                .and_then(|index| self.levels.get_mut(index))
            else {
                continue;
            };
            level.hours.push(obs.elapsed_hours);
            if obs.level > 0 {
                level.refill_cost_sum = level.refill_cost_sum.saturating_add(obs.refill_cost);
            }
        }
        if let Some(sample) = outcome.twenty_hour {
            self.sum_20h_refill_cost = self.sum_20h_refill_cost.saturating_add(sample.refill_cost);
            self.sum_20h_refills = self
                .sum_20h_refills
                .saturating_add(u64::from(sample.refills));
        }
        self.trials = self.trials.saturating_add(1);
        self.terminations.record(outcome.termination);
    }

    /// Combine two partial accumulators.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if self.levels.len() < other.levels.len() {
            self.levels
                .resize_with(other.levels.len(), LevelObservations::default);
        }
        for (mine, theirs) in self.levels.iter_mut().zip(other.levels) {
            mine.hours.extend(theirs.hours);
            mine.refill_cost_sum = mine.refill_cost_sum.saturating_add(theirs.refill_cost_sum);
        }
        self.sum_20h_refill_cost = self
            .sum_20h_refill_cost
            .saturating_add(other.sum_20h_refill_cost);
        self.sum_20h_refills = self.sum_20h_refills.saturating_add(other.sum_20h_refills);
        self.trials = self.trials.saturating_add(other.trials);
        self.terminations = self.terminations.merge(other.terminations);
        self
    }
}

/// Runs `num_trials` independent trials for one set of inputs.
#[derive(Debug, Clone, Copy)]
pub struct BatchDriver<'a> {
    skills: &'a SkillInputs,
    config: &'a SimulationConfig,
}

impl<'a> BatchDriver<'a> {
    #[must_use]
    pub const fn new(skills: &'a SkillInputs, config: &'a SimulationConfig) -> Self {
        Self { skills, config }
    }

    fn in_sub_sample(&self, index: u32) -> bool {
        index < self.config.max_20h_sub_sample
    }

    fn run_one<R: Rng + ?Sized>(&self, index: u32, rng: &mut R) -> TrialOutcome {
        run_trial(self.skills, self.config, self.in_sub_sample(index), rng)
    }

    /// Run every trial sequentially on one caller-owned random stream.
    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> BatchAccumulator {
        let mut acc = BatchAccumulator::new(self.config.level_count());
        for index in 0..self.config.num_trials {
            acc.absorb(&self.run_one(index, rng));
        }
        acc
    }

    /// Run every trial sequentially, each on its own derived stream.
    #[must_use]
    pub fn run_seeded_sequential(&self, seeder: TrialSeeder) -> BatchAccumulator {
        let mut acc = BatchAccumulator::new(self.config.level_count());
        for index in 0..self.config.num_trials {
            acc.absorb(&self.run_one(index, &mut seeder.trial_rng(index)));
        }
        acc
    }

    /// Run every trial on its own derived stream, in parallel when the
    /// `parallel` feature is enabled.
    #[must_use]
    pub fn run_seeded(&self, seeder: TrialSeeder) -> BatchAccumulator {
        #[cfg(feature = "parallel")]
        {
            self.run_seeded_parallel(seeder)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.run_seeded_sequential(seeder)
        }
    }

    #[cfg(feature = "parallel")]
    fn run_seeded_parallel(&self, seeder: TrialSeeder) -> BatchAccumulator {
        use rayon::prelude::*;

        let level_count = self.config.level_count();
        (0..self.config.num_trials)
            .into_par_iter()
            .fold(
                || BatchAccumulator::new(level_count),
                |mut acc, index| {
                    acc.absorb(&self.run_one(index, &mut seeder.trial_rng(index)));
                    acc
                },
            )
            .reduce(|| BatchAccumulator::new(level_count), BatchAccumulator::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{ExtendObservation, TwentyHourSample};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use smallvec::smallvec;

    fn outcome(levels: &[(u32, f64, u64)], twenty: Option<(u64, u32)>) -> TrialOutcome {
        TrialOutcome {
            observations: levels
                .iter()
                .map(|&(level, elapsed_hours, refill_cost)| ExtendObservation {
                    level,
                    elapsed_hours,
                    refill_cost,
                })
                .collect(),
            twenty_hour: twenty.map(|(refill_cost, refills)| TwentyHourSample {
                refill_cost,
                refills,
            }),
            termination: if twenty.is_some() {
                TerminationReason::PastTwentyHours
            } else {
                TerminationReason::ExtendsReported
            },
            final_tick: 0,
        }
    }

    #[test]
    fn absorb_skips_refill_cost_at_level_zero() {
        let mut acc = BatchAccumulator::new(3);
        acc.absorb(&outcome(&[(0, 4.0, 7), (1, 6.0, 48), (2, 7.5, 120)], None));
        assert_eq!(acc.levels[0].hours, vec![4.0]);
        assert_eq!(acc.levels[0].refill_cost_sum, 0);
        assert_eq!(acc.levels[1].refill_cost_sum, 48);
        assert_eq!(acc.levels[2].refill_cost_sum, 120);
        assert_eq!(acc.trials, 1);
        assert_eq!(acc.terminations.extends_reported, 1);
    }

    #[test]
    fn absorb_ignores_levels_beyond_tracking() {
        let mut acc = BatchAccumulator::new(1);
        acc.absorb(&TrialOutcome {
            observations: smallvec![ExtendObservation {
                level: 5,
                elapsed_hours: 1.0,
                refill_cost: 1,
            }],
            twenty_hour: None,
            termination: TerminationReason::TickLimit,
            final_tick: 10,
        });
        assert!(acc.levels[0].hours.is_empty());
        assert_eq!(acc.terminations.tick_limit, 1);
    }

    #[test]
    fn merge_sums_and_concatenates() {
        let mut left = BatchAccumulator::new(2);
        left.absorb(&outcome(&[(0, 3.0, 0), (1, 5.0, 36)], Some((100, 4))));
        let mut right = BatchAccumulator::new(2);
        right.absorb(&outcome(&[(0, 2.0, 0)], None));

        let merged = left.merge(right);
        assert_eq!(merged.levels[0].hours, vec![3.0, 2.0]);
        assert_eq!(merged.levels[1].refill_cost_sum, 36);
        assert_eq!(merged.sum_20h_refill_cost, 100);
        assert_eq!(merged.sum_20h_refills, 4);
        assert_eq!(merged.trials, 2);
        assert_eq!(merged.terminations.past_twenty_hours, 1);

        let from_identity = BatchAccumulator::default().merge(merged.clone());
        assert_eq!(from_identity, merged);
    }

    #[test]
    fn sequential_and_parallel_seeded_runs_agree() {
        let skills = SkillInputs::new(1_000.0, 1_000.0, [500.0; 4]);
        let cfg = SimulationConfig::for_voyage(2_500).with_num_trials(200);
        let driver = BatchDriver::new(&skills, &cfg);
        let seeder = TrialSeeder::new(99);

        let mut sequential = driver.run_seeded_sequential(seeder);
        let mut seeded = driver.run_seeded(seeder);
        for level in sequential.levels.iter_mut().chain(seeded.levels.iter_mut()) {
            level.hours.sort_by(f64::total_cmp);
        }
        assert_eq!(sequential, seeded);
        assert_eq!(seeded.trials, 200);
    }

    #[test]
    fn only_leading_trials_extend_past_reported_levels() {
        let skills = SkillInputs::new(0.0, 0.0, [0.0; 4]);
        let cfg = SimulationConfig::for_voyage(100)
            .with_num_trials(5)
            .with_max_20h_sub_sample(2);
        let driver = BatchDriver::new(&skills, &cfg);
        let acc = driver.run_seeded_sequential(TrialSeeder::new(3));
        assert_eq!(acc.trials, 5);
        assert_eq!(acc.terminations.extends_reported, 3);
        // The two sub-sample trials use up every refill before 20 hours.
        assert_eq!(acc.terminations.max_extends, 2);
        assert!(acc.levels.iter().all(|level| level.hours.len() == 5));
    }

    #[test]
    fn zero_skill_twenty_hour_failures_all_count() {
        let skills = SkillInputs::new(0.0, 0.0, [0.0; 4]);
        let cfg = SimulationConfig::for_voyage(30_000)
            .with_num_trials(200)
            .with_max_20h_sub_sample(100);
        let acc = BatchDriver::new(&skills, &cfg).run_seeded_sequential(TrialSeeder::new(1));
        assert_eq!(acc.terminations.past_twenty_hours, 200);
        assert_eq!(acc.sum_20h_refills, 200);
        let result = crate::aggregate::aggregate(acc, cfg.sub_sample_size());
        assert_eq!(result.avg_20h_refill_count, 2);
    }

    #[test]
    fn single_stream_run_is_reproducible() {
        let skills = SkillInputs::new(1_000.0, 1_000.0, [500.0; 4]);
        let cfg = SimulationConfig::for_voyage(2_500).with_num_trials(50);
        let driver = BatchDriver::new(&skills, &cfg);
        let first = driver.run_with_rng(&mut ChaCha20Rng::seed_from_u64(5));
        let second = driver.run_with_rng(&mut ChaCha20Rng::seed_from_u64(5));
        assert_eq!(first, second);
        assert_eq!(first.levels.len(), 3);
        // Every trial fails at least once with these inputs.
        assert_eq!(first.levels[0].hours.len(), 50);
    }
}
