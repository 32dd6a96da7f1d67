//! Single-trial voyage simulation.
//!
//! A trial advances tick by tick until its antimatter runs out, then pays for a
//! refill ("extend") and keeps going until one of the stopping conditions
//! fires. The loop is an explicit state machine so each stop can be exercised
//! on its own.
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::SimulationConfig;
use crate::constants::{TICKS_PER_MINUTE, TWENTY_HOURS};
use crate::hazard::{HazardDraw, resolve_hazard};
use crate::numbers::ticks_to_hours;
use crate::skills::SkillInputs;
use crate::tick::{TickKind, classify};

/// Ticks of elapsed voyage time paid for by one unit of refill cost (five minutes).
const TICKS_PER_REFILL_UNIT: u32 = TICKS_PER_MINUTE * 5;

/// Mutable per-trial bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialState {
    pub tick: u32,
    pub resource: i64,
    /// Refills consumed so far.
    pub extend_index: u32,
    /// Refill cost paid so far.
    pub refill_cost_accumulated: u64,
}

impl TrialState {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            tick: config.initial_tick(),
            resource: config.initial_resource(),
            extend_index: 0,
            refill_cost_accumulated: 0,
        }
    }

    #[must_use]
    pub fn elapsed_hours(&self) -> f64 {
        ticks_to_hours(self.tick)
    }
}

/// Why a trial stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Ran dry with every allowed refill already spent.
    MaxExtends,
    /// Ran dry after the 20-hour mark.
    PastTwentyHours,
    /// Every reported extend level was observed and the trial is outside the
    /// 20-hour sub-sample.
    ExtendsReported,
    /// Hit the tick safety bound.
    TickLimit,
}

/// Position of a trial in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Running,
    /// Resource is exhausted; the next step records the failure and refills.
    Resetting,
    Terminated(TerminationReason),
}

/// A failure observed at a reported extend level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendObservation {
    pub level: u32,
    pub elapsed_hours: f64,
    /// Refill cost paid before this level's failure.
    pub refill_cost: u64,
}

/// Contribution of a trial that ran past 20 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwentyHourSample {
    pub refill_cost: u64,
    pub refills: u32,
}

/// Everything a finished trial hands to the batch driver.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub observations: SmallVec<[ExtendObservation; 4]>,
    pub twenty_hour: Option<TwentyHourSample>,
    pub termination: TerminationReason,
    pub final_tick: u32,
}

/// Refill cost for running dry at `tick`: one unit per five minutes elapsed, rounded up.
#[must_use]
pub fn refill_cost_at(tick: u32) -> u64 {
    u64::from(tick.div_ceil(TICKS_PER_REFILL_UNIT))
}

/// One simulated voyage.
#[derive(Debug)]
pub struct Trial<'a> {
    skills: &'a SkillInputs,
    config: &'a SimulationConfig,
    in_sub_sample: bool,
    state: TrialState,
    phase: TrialPhase,
    observations: SmallVec<[ExtendObservation; 4]>,
    twenty_hour: Option<TwentyHourSample>,
}

impl<'a> Trial<'a> {
    /// `in_sub_sample` lets the trial keep extending past the reported levels.
    #[must_use]
    pub fn new(skills: &'a SkillInputs, config: &'a SimulationConfig, in_sub_sample: bool) -> Self {
        Self {
            skills,
            config,
            in_sub_sample,
            state: TrialState::new(config),
            phase: TrialPhase::Running,
            observations: SmallVec::new(),
            twenty_hour: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TrialState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Advance the state machine by one transition.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TrialPhase {
        self.phase = match self.phase {
            TrialPhase::Running => self.advance_tick(rng),
            TrialPhase::Resetting => self.refill(),
            terminated @ TrialPhase::Terminated(_) => terminated,
        };
        self.phase
    }

    /// Step until the trial terminates.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> TrialOutcome {
        let termination = loop {
            if let TrialPhase::Terminated(reason) = self.step(rng) {
                break reason;
            }
        };
        trace!(
            "trial terminated: {termination:?} at tick {} after {} refills",
            self.state.tick, self.state.extend_index
        );
        TrialOutcome {
            observations: self.observations,
            twenty_hour: self.twenty_hour,
            termination,
            final_tick: self.state.tick,
        }
    }

    fn advance_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TrialPhase {
        if self.state.tick >= self.config.max_ticks {
            return TrialPhase::Terminated(TerminationReason::TickLimit);
        }
        self.state.tick += 1;
        let tick = self.state.tick;
        let delta = match classify(tick) {
            TickKind::Hazard => {
                let draw = HazardDraw::sample(rng);
                let (_, outcome) =
                    resolve_hazard(self.skills, tick, self.config.hazard_skill_variance, draw);
                TickKind::hazard_delta(outcome.passed())
            }
            kind => kind.fixed_delta(),
        };
        self.state.resource += delta;
        if self.state.resource <= 0 {
            TrialPhase::Resetting
        } else {
            TrialPhase::Running
        }
    }

    fn refill(&mut self) -> TrialPhase {
        let cfg = self.config;
        let state = &mut self.state;
        if state.extend_index == cfg.max_extends {
            return TrialPhase::Terminated(TerminationReason::MaxExtends);
        }

        let elapsed_hours = state.elapsed_hours();
        let refill_cost = refill_cost_at(state.tick);

        if state.extend_index <= cfg.num_extends {
            self.observations.push(ExtendObservation {
                level: state.extend_index,
                elapsed_hours,
                refill_cost: state.refill_cost_accumulated,
            });
        }

        state.resource = cfg.start_resource;
        state.refill_cost_accumulated += refill_cost;
        state.extend_index += 1;

        if elapsed_hours > TWENTY_HOURS {
            self.twenty_hour = Some(TwentyHourSample {
                refill_cost: state.refill_cost_accumulated,
                refills: state.extend_index,
            });
            return TrialPhase::Terminated(TerminationReason::PastTwentyHours);
        }
        if state.extend_index > cfg.num_extends && !self.in_sub_sample {
            return TrialPhase::Terminated(TerminationReason::ExtendsReported);
        }
        TrialPhase::Running
    }
}

/// Run one complete trial.
pub fn run_trial<R: Rng + ?Sized>(
    skills: &SkillInputs,
    config: &SimulationConfig,
    in_sub_sample: bool,
    rng: &mut R,
) -> TrialOutcome {
    Trial::new(skills, config, in_sub_sample).run(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const ZERO_SKILLS: SkillInputs = SkillInputs::new(0.0, 0.0, [0.0; 4]);

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(1)
    }

    #[test]
    fn refill_cost_rounds_up_per_five_minutes() {
        assert_eq!(refill_cost_at(1), 1);
        assert_eq!(refill_cost_at(15), 1);
        assert_eq!(refill_cost_at(16), 2);
        // 20 hours
        assert_eq!(refill_cost_at(3_600), 240);
    }

    #[test]
    fn zero_skill_trial_fails_on_known_ticks() {
        let cfg = SimulationConfig::for_voyage(100);
        let outcome = run_trial(&ZERO_SKILLS, &cfg, false, &mut rng());

        let ticks: Vec<f64> = outcome.observations.iter().map(|o| o.elapsed_hours * 180.0).collect();
        assert_eq!(outcome.observations.len(), 3);
        assert!((ticks[0] - 15.0).abs() < 1e-9);
        assert!((ticks[1] - 30.0).abs() < 1e-9);
        assert!((ticks[2] - 44.0).abs() < 1e-9);

        let costs: Vec<u64> = outcome.observations.iter().map(|o| o.refill_cost).collect();
        assert_eq!(costs, vec![0, 1, 3]);
        assert_eq!(outcome.termination, TerminationReason::ExtendsReported);
        assert_eq!(outcome.final_tick, 44);
        assert!(outcome.twenty_hour.is_none());
    }

    #[test]
    fn max_extends_abandons_trial() {
        let cfg = SimulationConfig::for_voyage(100).with_max_extends(1);
        let outcome = run_trial(&ZERO_SKILLS, &cfg, true, &mut rng());
        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.termination, TerminationReason::MaxExtends);
        assert_eq!(outcome.final_tick, 30);
    }

    #[test]
    fn tick_limit_truncates_runaway_trial() {
        let strong = SkillInputs::new(1e9, 1e9, [1e9; 4]);
        let cfg = SimulationConfig::for_voyage(100).with_max_ticks(500);
        let outcome = run_trial(&strong, &cfg, true, &mut rng());
        assert!(outcome.observations.is_empty());
        assert_eq!(outcome.termination, TerminationReason::TickLimit);
        assert_eq!(outcome.final_tick, 500);
    }

    #[test]
    fn failure_past_twenty_hours_records_sample() {
        let cfg = SimulationConfig::for_voyage(30_000);
        let outcome = run_trial(&ZERO_SKILLS, &cfg, true, &mut rng());
        assert_eq!(outcome.termination, TerminationReason::PastTwentyHours);
        assert_eq!(outcome.observations.len(), 1);
        assert!(outcome.observations[0].elapsed_hours > 20.0);
        let sample = outcome.twenty_hour.expect("twenty hour sample");
        assert_eq!(sample.refills, 1);
        assert_eq!(sample.refill_cost, refill_cost_at(outcome.final_tick));
    }

    #[test]
    fn trials_outside_sub_sample_still_record_twenty_hour_sample() {
        let cfg = SimulationConfig::for_voyage(30_000);
        let outcome = run_trial(&ZERO_SKILLS, &cfg, false, &mut rng());
        assert_eq!(outcome.termination, TerminationReason::PastTwentyHours);
        assert_eq!(outcome.observations.len(), 1);
        let sample = outcome.twenty_hour.expect("twenty hour sample");
        assert_eq!(sample.refills, 1);
        assert_eq!(sample.refill_cost, refill_cost_at(outcome.final_tick));
    }

    #[test]
    fn sub_sample_trials_keep_extending() {
        let cfg = SimulationConfig::for_voyage(100);
        let outcome = run_trial(&ZERO_SKILLS, &cfg, true, &mut rng());
        // Only levels 0..=2 are recorded even though the trial keeps going.
        assert_eq!(outcome.observations.len(), 3);
        assert_ne!(outcome.termination, TerminationReason::ExtendsReported);
        assert!(outcome.final_tick > 44);
    }

    #[test]
    fn resumed_trial_starts_from_elapsed_time() {
        let cfg = SimulationConfig::for_voyage(2_500).resuming(10, 2.0);
        let mut trial = Trial::new(&ZERO_SKILLS, &cfg, false);
        assert_eq!(trial.state().tick, 360);
        assert_eq!(trial.state().resource, 10);
        assert_eq!(trial.step(&mut rng()), TrialPhase::Running);
        assert_eq!(trial.state().tick, 361);

        let outcome = run_trial(&ZERO_SKILLS, &cfg, false, &mut rng());
        assert!(outcome.observations[0].elapsed_hours > 2.0);
        assert!(outcome.observations[0].elapsed_hours < 2.1);
    }

    #[test]
    fn exhausted_resource_moves_to_resetting() {
        let cfg = SimulationConfig::for_voyage(100).resuming(1, 0.0);
        let mut trial = Trial::new(&ZERO_SKILLS, &cfg, false);
        let mut rng = rng();
        assert_eq!(trial.step(&mut rng), TrialPhase::Resetting);
        assert_eq!(trial.step(&mut rng), TrialPhase::Running);
        assert_eq!(trial.state().resource, 100);
        assert_eq!(trial.state().extend_index, 1);
        assert_eq!(trial.state().refill_cost_accumulated, 1);
    }
}
