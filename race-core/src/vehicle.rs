//! Kinematic model shared by the player bike and every opponent.
//!
//! Speeds are km/h, distances are meters, angles are radians. A positive
//! heading turns the bike toward `+x`; heading zero points straight down
//! the track along `+z`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CRASH_LEAN_RAD, HIGH_SPEED_TURN_PENALTY, IMPULSE_DAMAGE_SCALE, IMPULSE_SPEED_SCALE,
    KMH_PER_MPS, LEAN_IN_RATE, LEAN_MAX_RAD, LEAN_OUT_RATE, MAX_HEADING_RAD, MAX_HEALTH,
    MIN_TURN_FACTOR, RECOVERY_SPEED_CAP_KMH, TRACK_HALF_WIDTH,
};
use crate::policy::DecisionPolicy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Normal,
    Attacking,
    Crashed,
}

/// What a controller asks the bike to do for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveIntent {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

/// Tuning fixed when the actor is created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStats {
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub braking_force: f32,
    pub turn_rate: f32,
    pub damage_multiplier: f32,
    /// Impulses strictly above this force always crash the bike.
    pub crash_force: f32,
    /// Health at or below this level crashes the bike on the next impulse.
    pub crash_health: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    pub position: Vec3,
    pub heading: f32,
    pub lean: f32,
    pub speed: f32,
    pub health: f32,
    pub mode: Mode,
    pub attack_cooldown: f32,
    pub attack_release_at: f32,
    pub recovery_time: f32,
    pub distance_traveled: f32,
    pub stats: VehicleStats,
}

impl VehicleState {
    pub fn new(position: Vec3, stats: VehicleStats) -> Self {
        Self {
            position,
            heading: 0.0,
            lean: 0.0,
            speed: 0.0,
            health: MAX_HEALTH,
            mode: Mode::Normal,
            attack_cooldown: 0.0,
            attack_release_at: 0.0,
            recovery_time: 0.0,
            distance_traveled: 0.0,
            stats,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.clamp(0.0, self.stats.max_speed);
        self
    }

    #[inline]
    pub fn is_crashed(&self) -> bool {
        self.mode == Mode::Crashed
    }

    /// Unit vector along the current heading, on the ground plane.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.heading.sin(), 0.0, self.heading.cos())
    }

    /// Advances the bike by `dt` seconds. Non-positive or non-finite deltas
    /// leave the state untouched.
    pub fn integrate(&mut self, dt: f32, intent: DriveIntent) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);
        if self.mode == Mode::Attacking
            && (self.attack_cooldown < self.attack_release_at || self.attack_cooldown <= 0.0)
        {
            self.mode = Mode::Normal;
        }

        if self.mode == Mode::Crashed {
            self.recovery_time = (self.recovery_time - dt).max(0.0);
            if self.recovery_time <= 0.0 {
                self.mode = Mode::Normal;
                self.speed = self.speed.min(RECOVERY_SPEED_CAP_KMH);
                self.lean = 0.0;
            }
            // A downed bike neither moves nor turns this tick.
            return;
        }

        self.update_speed(dt, intent);
        self.update_heading(dt, intent);
        self.update_lean(dt, intent);

        let step = self.speed * dt / KMH_PER_MPS;
        let forward = self.forward();
        self.position.x =
            (self.position.x + forward.x * step).clamp(-TRACK_HALF_WIDTH, TRACK_HALF_WIDTH);
        self.position.z += forward.z * step;
        self.distance_traveled += step;
    }

    fn update_speed(&mut self, dt: f32, intent: DriveIntent) {
        let stats = &self.stats;
        self.speed = if intent.accelerate {
            (self.speed + stats.acceleration * dt).min(stats.max_speed)
        } else if intent.brake {
            (self.speed - stats.braking_force * dt).max(0.0)
        } else {
            (self.speed - stats.deceleration * dt).max(0.0)
        };
    }

    fn update_heading(&mut self, dt: f32, intent: DriveIntent) {
        let delta = self.stats.turn_rate * self.turn_factor() * dt;
        if intent.steer_left {
            self.heading += delta;
        } else if intent.steer_right {
            self.heading -= delta;
        }
        self.heading = self.heading.clamp(-MAX_HEADING_RAD, MAX_HEADING_RAD);
    }

    /// Steering authority left at the current speed, in `[0.3, 1]`.
    pub fn turn_factor(&self) -> f32 {
        if self.stats.max_speed <= 0.0 {
            return 1.0;
        }
        (1.0 - HIGH_SPEED_TURN_PENALTY * (self.speed / self.stats.max_speed)).max(MIN_TURN_FACTOR)
    }

    fn update_lean(&mut self, dt: f32, intent: DriveIntent) {
        let (target, rate) = if intent.steer_left {
            (LEAN_MAX_RAD, LEAN_IN_RATE)
        } else if intent.steer_right {
            (-LEAN_MAX_RAD, LEAN_IN_RATE)
        } else {
            (0.0, LEAN_OUT_RATE)
        };
        self.lean += (target - self.lean) * (rate * dt).min(1.0);
    }

    /// Starts an attack if the bike is upright and off cooldown. The bike
    /// stays in [`Mode::Attacking`] for `window` seconds of the cooldown.
    pub fn begin_attack(&mut self, cooldown: f32, window: f32) -> bool {
        if self.mode != Mode::Normal || self.attack_cooldown > 0.0 {
            return false;
        }
        self.mode = Mode::Attacking;
        self.attack_cooldown = cooldown.max(0.0);
        self.attack_release_at = (cooldown - window).max(0.0);
        true
    }

    /// Applies collision damage. Returns true when this impulse put the bike
    /// down; a bike that is already down gets a fresh recovery timer.
    pub fn apply_impulse<P>(&mut self, force: f32, policy: &mut P) -> bool
    where
        P: DecisionPolicy + ?Sized,
    {
        if !force.is_finite() {
            return false;
        }
        let force = force.max(0.0);

        self.health =
            (self.health - force * IMPULSE_DAMAGE_SCALE * self.stats.damage_multiplier).max(0.0);
        self.speed = (self.speed - force * IMPULSE_SPEED_SCALE).max(0.0);

        if force > self.stats.crash_force || self.health <= self.stats.crash_health {
            self.mode = Mode::Crashed;
            self.recovery_time = policy.recovery_duration().max(0.0);
            self.lean = if self.lean < 0.0 {
                -CRASH_LEAN_RAD
            } else {
                CRASH_LEAN_RAD
            };
            return true;
        }

        false
    }
}
