//! Every random decision the race makes goes through a [`DecisionPolicy`].
//!
//! The live game uses [`RandomPolicy`]; tests and replays can plug in a
//! policy with fixed answers to pin down a scenario.

use crate::constants::{
    CRUISE_MAX_FRACTION, CRUISE_MIN_FRACTION, GRID_LATERAL_SPREAD, GRID_SPEED_MAX_KMH,
    GRID_SPEED_MIN_KMH, LANE_CHANGE_CHANCE_SCALE, LANE_TARGET_SPAN,
    OPPONENT_ATTACK_CHANCE_SCALE, OPPONENT_ATTACK_COOLDOWN_MAX_S, OPPONENT_ATTACK_COOLDOWN_MIN_S,
    RECOVERY_MAX_S, RECOVERY_MIN_S, SHADOW_SPEED_JITTER,
};
use crate::rng::SeededRng;

/// Starting slot for one opponent on the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSlot {
    pub lateral: f32,
    pub speed: f32,
}

pub trait DecisionPolicy {
    /// Whether a nearby opponent shadows the player's speed this tick.
    fn shadow_player(&mut self, intelligence: f32) -> bool;
    /// Multiplier applied to the player's speed while shadowing.
    fn shadow_speed_factor(&mut self) -> f32;
    /// Fraction of max speed an opponent cruises at this tick.
    fn cruise_fraction(&mut self) -> f32;
    /// New lateral target, if the opponent changes lanes this tick.
    fn lane_change(&mut self, intelligence: f32) -> Option<f32>;
    fn attack(&mut self, aggressiveness: f32) -> bool;
    fn attack_cooldown(&mut self) -> f32;
    fn recovery_duration(&mut self) -> f32;
    fn grid_slot(&mut self) -> GridSlot;
}

#[derive(Clone, Copy, Debug)]
pub struct RandomPolicy {
    rng: SeededRng,
}

impl RandomPolicy {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed),
        }
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }
}

impl DecisionPolicy for RandomPolicy {
    fn shadow_player(&mut self, intelligence: f32) -> bool {
        self.rng.chance(intelligence)
    }

    fn shadow_speed_factor(&mut self) -> f32 {
        1.0 + self.rng.range_f32(-SHADOW_SPEED_JITTER, SHADOW_SPEED_JITTER)
    }

    fn cruise_fraction(&mut self) -> f32 {
        self.rng.range_f32(CRUISE_MIN_FRACTION, CRUISE_MAX_FRACTION)
    }

    fn lane_change(&mut self, intelligence: f32) -> Option<f32> {
        if self.rng.chance(LANE_CHANGE_CHANCE_SCALE * intelligence) {
            Some(self.rng.range_f32(-LANE_TARGET_SPAN, LANE_TARGET_SPAN))
        } else {
            None
        }
    }

    fn attack(&mut self, aggressiveness: f32) -> bool {
        self.rng
            .chance(aggressiveness * OPPONENT_ATTACK_CHANCE_SCALE)
    }

    fn attack_cooldown(&mut self) -> f32 {
        self.rng.range_f32(OPPONENT_ATTACK_COOLDOWN_MIN_S, OPPONENT_ATTACK_COOLDOWN_MAX_S)
    }

    fn recovery_duration(&mut self) -> f32 {
        self.rng.range_f32(RECOVERY_MIN_S, RECOVERY_MAX_S)
    }

    fn grid_slot(&mut self) -> GridSlot {
        GridSlot {
            lateral: self.rng.range_f32(-GRID_LATERAL_SPREAD, GRID_LATERAL_SPREAD),
            speed: self.rng.range_f32(GRID_SPEED_MIN_KMH, GRID_SPEED_MAX_KMH),
        }
    }
}

/// Answers every roll with a fixed value. Useful for pinning a scenario in
/// tests or for hosts that want opponents without any randomness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScriptedPolicy {
    pub shadow: bool,
    pub shadow_factor: f32,
    pub cruise: f32,
    pub lane_target: Option<f32>,
    pub attack: bool,
    pub attack_cooldown: f32,
    pub recovery: f32,
    pub slot: GridSlot,
}

impl Default for ScriptedPolicy {
    fn default() -> Self {
        Self {
            shadow: false,
            shadow_factor: 1.0,
            cruise: CRUISE_MAX_FRACTION,
            lane_target: None,
            attack: false,
            attack_cooldown: OPPONENT_ATTACK_COOLDOWN_MIN_S,
            recovery: RECOVERY_MIN_S,
            slot: GridSlot {
                lateral: 0.0,
                speed: GRID_SPEED_MIN_KMH,
            },
        }
    }
}

impl DecisionPolicy for ScriptedPolicy {
    fn shadow_player(&mut self, _intelligence: f32) -> bool {
        self.shadow
    }

    fn shadow_speed_factor(&mut self) -> f32 {
        self.shadow_factor
    }

    fn cruise_fraction(&mut self) -> f32 {
        self.cruise
    }

    fn lane_change(&mut self, _intelligence: f32) -> Option<f32> {
        self.lane_target
    }

    fn attack(&mut self, _aggressiveness: f32) -> bool {
        self.attack
    }

    fn attack_cooldown(&mut self) -> f32 {
        self.attack_cooldown
    }

    fn recovery_duration(&mut self) -> f32 {
        self.recovery
    }

    fn grid_slot(&mut self) -> GridSlot {
        self.slot
    }
}
