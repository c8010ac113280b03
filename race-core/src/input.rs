use serde::{Deserialize, Serialize};

use crate::constants::{PLAYER_ATTACK_COOLDOWN_S, PLAYER_ATTACK_WINDOW_S};
use crate::vehicle::{DriveIntent, VehicleState};

/// Raw control signals for one tick, as the host read them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerIntent {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    pub attack: bool,
}

impl PlayerIntent {
    pub const IDLE: Self = Self {
        accelerate: false,
        brake: false,
        steer_left: false,
        steer_right: false,
        attack: false,
    };

    #[inline]
    pub fn drive(self) -> DriveIntent {
        DriveIntent {
            accelerate: self.accelerate,
            brake: self.brake,
            steer_left: self.steer_left,
            steer_right: self.steer_right,
        }
    }

    pub fn to_bits(self) -> u8 {
        (self.accelerate as u8)
            | (self.brake as u8) << 1
            | (self.steer_left as u8) << 2
            | (self.steer_right as u8) << 3
            | (self.attack as u8) << 4
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            accelerate: bits & 0x01 != 0,
            brake: bits & 0x02 != 0,
            steer_left: bits & 0x04 != 0,
            steer_right: bits & 0x08 != 0,
            attack: bits & 0x10 != 0,
        }
    }
}

/// Turns the player's signals into a kinematic command. Attack is consumed
/// here: it starts an attack window when the bike is upright and off
/// cooldown, and is otherwise ignored.
pub fn translate(player: &mut VehicleState, intent: PlayerIntent) -> DriveIntent {
    if intent.attack {
        player.begin_attack(PLAYER_ATTACK_COOLDOWN_S, PLAYER_ATTACK_WINDOW_S);
    }
    intent.drive()
}
