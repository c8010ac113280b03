use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    HEADING_DEADBAND_RAD, LANE_ARRIVAL_TOLERANCE, LANE_LOOKAHEAD, MAX_HEADING_RAD,
    NATURAL_DECELERATION, OPPONENT_ACCEL_BASE, OPPONENT_ACCEL_STEP, OPPONENT_AGGRESSION_BASE,
    OPPONENT_AGGRESSION_STEP, OPPONENT_ATTACK_LATERAL, OPPONENT_ATTACK_RANGE,
    OPPONENT_ATTACK_WINDOW_S, OPPONENT_BRAKING_FORCE, OPPONENT_CRASH_FORCE,
    OPPONENT_CRASH_HEALTH, OPPONENT_INTELLIGENCE_BASE, OPPONENT_INTELLIGENCE_STEP,
    OPPONENT_MAX_SPEED_BASE, OPPONENT_MAX_SPEED_STEP, OPPONENT_PROXIMITY, OPPONENT_TURN_BASE,
    OPPONENT_TURN_STEP, SPEED_DEADBAND_KMH,
};
use crate::policy::DecisionPolicy;
use crate::vehicle::{DriveIntent, Mode, VehicleState, VehicleStats};

/// Per-opponent parameters, all linear in the difficulty level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentTuning {
    pub max_speed: f32,
    pub acceleration: f32,
    pub turn_rate: f32,
    /// Chance weight for shadowing the player and changing lanes.
    pub intelligence: f32,
    /// Chance weight for attacking when alongside the player.
    pub aggressiveness: f32,
}

impl OpponentTuning {
    pub fn for_difficulty(difficulty: u32) -> Self {
        let d = difficulty as f32;
        Self {
            max_speed: OPPONENT_MAX_SPEED_BASE + OPPONENT_MAX_SPEED_STEP * d,
            acceleration: OPPONENT_ACCEL_BASE + OPPONENT_ACCEL_STEP * d,
            turn_rate: OPPONENT_TURN_BASE + OPPONENT_TURN_STEP * d,
            intelligence: OPPONENT_INTELLIGENCE_BASE + OPPONENT_INTELLIGENCE_STEP * d,
            aggressiveness: OPPONENT_AGGRESSION_BASE + OPPONENT_AGGRESSION_STEP * d,
        }
    }

    pub fn vehicle_stats(&self) -> VehicleStats {
        VehicleStats {
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            deceleration: NATURAL_DECELERATION,
            braking_force: OPPONENT_BRAKING_FORCE,
            turn_rate: self.turn_rate,
            damage_multiplier: 1.0,
            crash_force: OPPONENT_CRASH_FORCE,
            crash_health: OPPONENT_CRASH_HEALTH,
        }
    }
}

/// Reactive opponent controller. The only state it carries between ticks is
/// the lane it is currently drifting toward.
#[derive(Clone, Debug, PartialEq)]
pub struct OpponentDriver {
    pub tuning: OpponentTuning,
    pub lane_target: Option<f32>,
}

impl OpponentDriver {
    pub fn new(tuning: OpponentTuning) -> Self {
        Self {
            tuning,
            lane_target: None,
        }
    }

    /// Picks this tick's intent for `actor`. May start an attack on the
    /// actor directly; the attack window then runs down inside
    /// [`VehicleState::integrate`].
    pub fn decide<P>(
        &mut self,
        actor: &mut VehicleState,
        dt: f32,
        player_position: Vec3,
        player_speed: f32,
        policy: &mut P,
    ) -> DriveIntent
    where
        P: DecisionPolicy + ?Sized,
    {
        if actor.is_crashed() {
            return DriveIntent::default();
        }

        let (accelerate, brake) = self.throttle(actor, player_position, player_speed, policy);
        let (steer_left, steer_right) = self.steering(actor, dt, policy);
        self.maybe_attack(actor, player_position, policy);

        DriveIntent {
            accelerate,
            brake,
            steer_left,
            steer_right,
        }
    }

    fn throttle<P>(
        &self,
        actor: &VehicleState,
        player_position: Vec3,
        player_speed: f32,
        policy: &mut P,
    ) -> (bool, bool)
    where
        P: DecisionPolicy + ?Sized,
    {
        if player_position.z > actor.position.z {
            return (true, false);
        }

        let near_player = actor.position.distance(player_position) < OPPONENT_PROXIMITY;
        let target = if near_player && policy.shadow_player(self.tuning.intelligence) {
            player_speed * policy.shadow_speed_factor()
        } else {
            self.tuning.max_speed * policy.cruise_fraction()
        };

        if actor.speed < target - SPEED_DEADBAND_KMH {
            (true, false)
        } else if actor.speed > target + SPEED_DEADBAND_KMH {
            (false, true)
        } else {
            (false, false)
        }
    }

    fn steering<P>(&mut self, actor: &VehicleState, dt: f32, policy: &mut P) -> (bool, bool)
    where
        P: DecisionPolicy + ?Sized,
    {
        if let Some(target) = policy.lane_change(self.tuning.intelligence) {
            self.lane_target = Some(target);
        }

        let desired = match self.lane_target {
            Some(target) if (target - actor.position.x).abs() <= LANE_ARRIVAL_TOLERANCE => {
                self.lane_target = None;
                0.0
            }
            Some(target) => (target - actor.position.x).atan2(LANE_LOOKAHEAD),
            None => 0.0,
        }
        .clamp(-MAX_HEADING_RAD, MAX_HEADING_RAD);

        // Don't chase an error smaller than half a tick of turning.
        let one_tick = actor.stats.turn_rate * actor.turn_factor() * dt.max(0.0);
        let deadband = HEADING_DEADBAND_RAD.max(one_tick * 0.5);
        let error = desired - actor.heading;
        (error > deadband, error < -deadband)
    }

    fn maybe_attack<P>(&self, actor: &mut VehicleState, player_position: Vec3, policy: &mut P)
    where
        P: DecisionPolicy + ?Sized,
    {
        if actor.mode != Mode::Normal || actor.attack_cooldown > 0.0 {
            return;
        }
        let offset = player_position - actor.position;
        if offset.z.abs() >= OPPONENT_ATTACK_RANGE || offset.x.abs() >= OPPONENT_ATTACK_LATERAL {
            return;
        }
        if policy.attack(self.tuning.aggressiveness) {
            let cooldown = policy.attack_cooldown();
            actor.begin_attack(cooldown, OPPONENT_ATTACK_WINDOW_S);
        }
    }
}
