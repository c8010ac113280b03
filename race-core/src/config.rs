use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_OPPONENTS, FINISH_DISTANCE_M, MAX_DIFFICULTY, OPPONENTS_PER_DIFFICULTY, RACE_DURATION_S,
};
use crate::error::RaceError;
use crate::profile::{VehicleProfile, DEFAULT_PROFILE_ID};

/// Everything fixed at race creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaceConfig {
    pub difficulty: u32,
    /// Preset id; unknown ids resolve to the default bike.
    pub vehicle: String,
    /// Explicit ratings. When present they win over `vehicle`.
    pub custom_vehicle: Option<VehicleProfile>,
    /// Shown by hosts only.
    pub player_name: String,
    pub race_duration_s: f32,
    pub finish_distance_m: f32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            difficulty: 1,
            vehicle: DEFAULT_PROFILE_ID.to_string(),
            custom_vehicle: None,
            player_name: "Rider".to_string(),
            race_duration_s: RACE_DURATION_S,
            finish_distance_m: FINISH_DISTANCE_M,
        }
    }
}

impl RaceConfig {
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_vehicle(mut self, vehicle: impl Into<String>) -> Self {
        self.vehicle = vehicle.into();
        self
    }

    pub fn validate(&self) -> Result<(), RaceError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(RaceError::InvalidConfig(format!(
                "difficulty {} exceeds maximum {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        if !(self.race_duration_s.is_finite() && self.race_duration_s > 0.0) {
            return Err(RaceError::InvalidConfig(format!(
                "race duration must be positive, got {}",
                self.race_duration_s
            )));
        }
        if !(self.finish_distance_m.is_finite() && self.finish_distance_m > 0.0) {
            return Err(RaceError::InvalidConfig(format!(
                "finish distance must be positive, got {}",
                self.finish_distance_m
            )));
        }
        Ok(())
    }

    pub fn opponent_count(&self) -> u32 {
        BASE_OPPONENTS + OPPONENTS_PER_DIFFICULTY * self.difficulty
    }

    pub fn profile(&self) -> VehicleProfile {
        match self.custom_vehicle {
            Some(profile) => profile.clamped(),
            None => VehicleProfile::lookup(&self.vehicle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RaceConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.opponent_count(), 5);
        assert_eq!(config.clone().with_difficulty(0).opponent_count(), 3);
        assert_eq!(config.with_difficulty(5).opponent_count(), 13);
    }

    #[test]
    fn rejects_nonsense() {
        let too_hard = RaceConfig::default().with_difficulty(MAX_DIFFICULTY + 1);
        assert!(matches!(too_hard.validate(), Err(RaceError::InvalidConfig(_))));

        let no_time = RaceConfig {
            race_duration_s: 0.0,
            ..RaceConfig::default()
        };
        assert!(no_time.validate().is_err());

        let no_finish = RaceConfig {
            finish_distance_m: f32::NAN,
            ..RaceConfig::default()
        };
        assert!(no_finish.validate().is_err());
    }

    #[test]
    fn custom_ratings_override_preset() {
        let custom = VehicleProfile {
            max_speed: 100.0,
            acceleration: 100.0,
            handling: 100.0,
            durability: 0.0,
        };
        let config = RaceConfig {
            custom_vehicle: Some(custom),
            ..RaceConfig::default().with_vehicle("chopper")
        };
        assert_eq!(config.profile(), custom);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RaceConfig =
            serde_json::from_str(r#"{"difficulty":2,"vehicle":"sport"}"#).expect("config json");
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.vehicle, "sport");
        assert_eq!(config.race_duration_s, RACE_DURATION_S);
        assert_eq!(config.finish_distance_m, FINISH_DISTANCE_M);
    }

    #[test]
    fn json_keys_are_camel_case() {
        let json = serde_json::to_value(RaceConfig::default()).expect("config json");
        for key in ["customVehicle", "playerName", "raceDurationS", "finishDistanceM"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("race_duration_s").is_none());

        let config: RaceConfig =
            serde_json::from_str(r#"{"playerName":"Axel","raceDurationS":45}"#).expect("json");
        assert_eq!(config.player_name, "Axel");
        assert_eq!(config.race_duration_s, 45.0);
    }
}
