pub mod ai;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod policy;
pub mod profile;
pub mod registry;
pub mod rng;
pub mod sim;
pub mod vehicle;

pub use config::RaceConfig;
pub use error::{RaceError, RuleCode};
pub use glam::Vec3;
pub use input::PlayerIntent;
pub use policy::{DecisionPolicy, RandomPolicy, ScriptedPolicy};
pub use registry::ActorId;
pub use sim::{
    replay, replay_strict, replay_with_checkpoints, ActorPose, LiveRace, RaceOutcome, RacePhase,
    RaceSnapshot, TickInput,
};
pub use vehicle::{Mode, VehicleState};
