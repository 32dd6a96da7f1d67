//! Hazard skill checks.
//!
//! Difficulty ramps linearly with the tick counter. The tested skill is picked
//! by weight and its value is spread into a band of `skill +/- variance`;
//! difficulties below the band always pass, difficulties at or above the top
//! always fail, and anything in between is decided by a uniform roll.
use rand::Rng;

use crate::constants::HAZARD_SKILL_PER_TICK;
use crate::skills::{SkillInputs, SkillSlot};

/// The two uniform draws a hazard consumes, each in `[0, 1)`.
///
/// Both are always drawn so that every hazard advances the stream by the same
/// amount regardless of outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardDraw {
    pub slot: f64,
    pub roll: f64,
}

impl HazardDraw {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let slot = rng.gen_range(0.0..1.0);
        let roll = rng.gen_range(0.0..1.0);
        Self { slot, roll }
    }
}

/// How a hazard check was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardOutcome {
    /// Difficulty below the skill band.
    AutoPass,
    /// Difficulty at or above the skill band.
    AutoFail,
    /// Inside the band; the roll met the difficulty.
    RolledPass,
    /// Inside the band; the roll fell short.
    RolledFail,
}

impl HazardOutcome {
    #[must_use]
    pub const fn passed(self) -> bool {
        matches!(self, Self::AutoPass | Self::RolledPass)
    }
}

/// Difficulty of a hazard occurring on `tick`.
#[must_use]
pub fn difficulty_at(tick: u32) -> f64 {
    f64::from(tick) * f64::from(HAZARD_SKILL_PER_TICK)
}

/// Resolve a check of `skill` against `difficulty` with a `[0, 1)` roll fraction.
#[must_use]
pub fn resolve_check(skill: f64, difficulty: f64, variance: f64, roll_fraction: f64) -> HazardOutcome {
    let band = skill * variance;
    let low = skill - band;
    let high = skill + band;
    if difficulty < low {
        return HazardOutcome::AutoPass;
    }
    // Negated so NaN skills land on the failing side.
    if !(difficulty < high) {
        return HazardOutcome::AutoFail;
    }
    let roll = low + roll_fraction * (high - low);
    if roll >= difficulty {
        HazardOutcome::RolledPass
    } else {
        HazardOutcome::RolledFail
    }
}

/// Pick a skill with `draw.slot` and resolve the hazard for `tick`.
#[must_use]
pub fn resolve_hazard(
    skills: &SkillInputs,
    tick: u32,
    variance: f64,
    draw: HazardDraw,
) -> (SkillSlot, HazardOutcome) {
    let slot = SkillSlot::from_draw(draw.slot);
    let outcome = resolve_check(skills.get(slot), difficulty_at(tick), variance, draw.roll);
    (slot, outcome)
}
