//! Tick classification for the voyage timeline.
use crate::constants::{
    HAZARD_FAIL_LOSS, HAZARD_PASS_GAIN, PASSIVE_DECAY, TICKS_BETWEEN_DILEMMAS,
    TICKS_BETWEEN_HAZARDS, TICKS_BETWEEN_REWARDS, TICKS_PER_HAZARD_REWARD,
};

/// What happens on a single 20-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Two-hour milestone. No resource change.
    Dilemma,
    /// Skill check that gains or costs resource.
    Hazard,
    /// Reward drop (including hazards that rolled into rewards). No resource change.
    Reward,
    /// Nothing happened; resource decays by one.
    Passive,
}

impl TickKind {
    /// Resource change for non-hazard ticks. Hazards resolve through
    /// [`TickKind::hazard_delta`] once the skill check is known.
    #[must_use]
    pub const fn fixed_delta(self) -> i64 {
        match self {
            Self::Dilemma | Self::Reward | Self::Hazard => 0,
            Self::Passive => -PASSIVE_DECAY,
        }
    }

    /// Resource change for a resolved hazard.
    #[must_use]
    pub const fn hazard_delta(passed: bool) -> i64 {
        if passed {
            HAZARD_PASS_GAIN
        } else {
            -HAZARD_FAIL_LOSS
        }
    }
}

/// Classify an absolute tick counter.
#[must_use]
pub const fn classify(tick: u32) -> TickKind {
    let dilemma = tick % TICKS_BETWEEN_DILEMMAS == 0;
    let hazard_as_reward = tick % TICKS_PER_HAZARD_REWARD == 0;
    if dilemma {
        TickKind::Dilemma
    } else if tick % TICKS_BETWEEN_HAZARDS == 0 && !hazard_as_reward {
        TickKind::Hazard
    } else if tick % TICKS_BETWEEN_REWARDS == 0 || hazard_as_reward {
        TickKind::Reward
    } else {
        TickKind::Passive
    }
}
