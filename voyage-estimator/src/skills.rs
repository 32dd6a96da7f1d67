//! Crew skill inputs and weighted hazard skill selection.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{OTHER_SKILL_COUNT, PRIMARY_SKILL_CHANCE, SECONDARY_SKILL_CHANCE};
use crate::numbers::usize_to_f64;

/// Which of the six voyage skills a hazard tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSlot {
    Primary,
    Secondary,
    Other(u8),
}

impl fmt::Display for SkillSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
            Self::Other(index) => write!(f, "other[{index}]"),
        }
    }
}

impl SkillSlot {
    /// Map a uniform draw in `[0, 1)` onto a slot: primary 35%, secondary 25%,
    /// and 10% for each of the four other skills.
    #[must_use]
    pub fn from_draw(draw: f64) -> Self {
        if draw < PRIMARY_SKILL_CHANCE {
            return Self::Primary;
        }
        let secondary_ceiling = PRIMARY_SKILL_CHANCE + SECONDARY_SKILL_CHANCE;
        if draw < secondary_ceiling {
            return Self::Secondary;
        }
        let other_span = (1.0 - secondary_ceiling) / usize_to_f64(OTHER_SKILL_COUNT);
        let mut index = 0_u8;
        let mut ceiling = secondary_ceiling + other_span;
        while usize::from(index) + 1 < OTHER_SKILL_COUNT && draw >= ceiling {
            index += 1;
            ceiling += other_span;
        }
        Self::Other(index)
    }
}

/// Errors raised by strict input validation.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{slot} skill must be a positive finite number (got {value})")]
    NonPositiveSkill { slot: SkillSlot, value: f64 },
    #[error("{field} must be positive (got {value})")]
    NonPositiveResource { field: &'static str, value: i64 },
}

/// The six skill contributions a crew brings to a voyage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillInputs {
    pub primary: f64,
    pub secondary: f64,
    pub other: [f64; OTHER_SKILL_COUNT],
}

impl SkillInputs {
    #[must_use]
    pub const fn new(primary: f64, secondary: f64, other: [f64; OTHER_SKILL_COUNT]) -> Self {
        Self {
            primary,
            secondary,
            other,
        }
    }

    /// Skill value for a slot. Out-of-range `Other` indices read as zero.
    #[must_use]
    pub fn get(&self, slot: SkillSlot) -> f64 {
        match slot {
            SkillSlot::Primary => self.primary,
            SkillSlot::Secondary => self.secondary,
            SkillSlot::Other(index) => self.other.get(usize::from(index)).copied().unwrap_or(0.0),
        }
    }

    /// Iterate every slot alongside its value, primary first.
    pub fn iter(&self) -> impl Iterator<Item = (SkillSlot, f64)> + '_ {
        [SkillSlot::Primary, SkillSlot::Secondary]
            .into_iter()
            .chain((0..OTHER_SKILL_COUNT).filter_map(|i| u8::try_from(i).ok().map(SkillSlot::Other)))
            .map(|slot| (slot, self.get(slot)))
    }

    /// Multiply every skill by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            primary: self.primary * factor,
            secondary: self.secondary * factor,
            other: self.other.map(|value| value * factor),
        }
    }

    /// Returns true when any skill is zero, negative, or non-finite.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.iter().any(|(_, value)| !(value.is_finite() && value > 0.0))
    }

    /// Reject zero, negative, and non-finite skills.
    ///
    /// # Errors
    ///
    /// Returns the first offending slot in primary, secondary, other order.
    pub fn validate(&self) -> Result<(), InputError> {
        match self
            .iter()
            .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        {
            Some((slot, value)) => Err(InputError::NonPositiveSkill { slot, value }),
            None => Ok(()),
        }
    }
}
