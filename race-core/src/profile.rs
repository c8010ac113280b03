use serde::{Deserialize, Serialize};

use crate::constants::{
    NATURAL_DECELERATION, PLAYER_CRASH_FORCE, PLAYER_CRASH_HEALTH,
};
use crate::vehicle::VehicleStats;

pub const DEFAULT_PROFILE_ID: &str = "default";

/// Rider-facing bike ratings, each on a 0-100 scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    pub max_speed: f32,
    pub acceleration: f32,
    pub handling: f32,
    pub durability: f32,
}

const PROFILES: [(&str, VehicleProfile); 4] = [
    (
        "sport",
        VehicleProfile {
            max_speed: 90.0,
            acceleration: 85.0,
            handling: 80.0,
            durability: 40.0,
        },
    ),
    (
        "cruiser",
        VehicleProfile {
            max_speed: 75.0,
            acceleration: 70.0,
            handling: 65.0,
            durability: 70.0,
        },
    ),
    (
        "chopper",
        VehicleProfile {
            max_speed: 60.0,
            acceleration: 55.0,
            handling: 50.0,
            durability: 90.0,
        },
    ),
    (
        DEFAULT_PROFILE_ID,
        VehicleProfile {
            max_speed: 70.0,
            acceleration: 70.0,
            handling: 70.0,
            durability: 60.0,
        },
    ),
];

impl VehicleProfile {
    pub fn preset(id: &str) -> Option<Self> {
        PROFILES
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, profile)| *profile)
    }

    /// Resolves a preset by id. Unknown ids fall back to the default bike
    /// so a bad menu selection never blocks the race from starting.
    pub fn lookup(id: &str) -> Self {
        match Self::preset(id) {
            Some(profile) => profile,
            None => {
                tracing::warn!(
                    profile = id,
                    fallback = DEFAULT_PROFILE_ID,
                    "unknown vehicle profile, using default"
                );
                Self::default()
            }
        }
    }

    pub fn preset_ids() -> impl Iterator<Item = &'static str> {
        PROFILES.iter().map(|(name, _)| *name)
    }

    pub fn clamped(self) -> Self {
        Self {
            max_speed: rating(self.max_speed),
            acceleration: rating(self.acceleration),
            handling: rating(self.handling),
            durability: rating(self.durability),
        }
    }

    /// Maps 0-100 ratings onto the player's kinematic stats.
    pub fn player_stats(self) -> VehicleStats {
        let p = self.clamped();
        VehicleStats {
            max_speed: 150.0 + p.max_speed * 0.5,
            acceleration: 30.0 + p.acceleration * 0.2,
            deceleration: NATURAL_DECELERATION,
            braking_force: 80.0 + p.handling * 0.2,
            turn_rate: 1.5 + p.handling * 0.005,
            damage_multiplier: 1.0 - p.durability * 0.004,
            crash_force: PLAYER_CRASH_FORCE,
            crash_health: PLAYER_CRASH_HEALTH,
        }
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        PROFILES[PROFILES.len() - 1].1
    }
}

fn rating(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Named difficulty levels offered by hosts. The core itself only sees the
/// numeric level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn level(self) -> u32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(name))
    }
}
