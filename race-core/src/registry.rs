use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ai::OpponentDriver;
use crate::vehicle::VehicleState;

/// Stable actor handle. The player is always id 0; opponents follow in grid
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    pub const PLAYER: ActorId = ActorId(0);
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Player,
    Ai,
}

/// Which logic drives an actor. Owned alongside the state, never pointed to
/// from it.
#[derive(Clone, Debug, PartialEq)]
pub enum Controller {
    Player,
    Opponent(OpponentDriver),
}

impl Controller {
    pub fn role(&self) -> Role {
        match self {
            Controller::Player => Role::Player,
            Controller::Opponent(_) => Role::Ai,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub state: VehicleState,
    pub controller: Controller,
}

/// Owns every actor in a race. Slot 0 holds the player.
#[derive(Clone, Debug)]
pub struct ActorRegistry {
    actors: Vec<Actor>,
}

impl ActorRegistry {
    pub fn new(player: VehicleState) -> Self {
        Self {
            actors: vec![Actor {
                id: ActorId::PLAYER,
                state: player,
                controller: Controller::Player,
            }],
        }
    }

    pub fn add_opponent(&mut self, state: VehicleState, driver: OpponentDriver) -> ActorId {
        let id = ActorId(self.actors.len() as u32);
        self.actors.push(Actor {
            id,
            state,
            controller: Controller::Opponent(driver),
        });
        id
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0 as usize)
    }

    #[inline]
    pub fn player(&self) -> &VehicleState {
        &self.actors[0].state
    }

    pub fn opponents(&self) -> &[Actor] {
        &self.actors[1..]
    }

    /// Splits the registry so the player and the rest of the field can be
    /// borrowed mutably at the same time.
    pub fn split_player_mut(&mut self) -> (&mut VehicleState, &mut [Actor]) {
        let (player, opponents) = self.actors.split_at_mut(1);
        (&mut player[0].state, opponents)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    /// Player included, so never zero.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}
