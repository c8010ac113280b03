use thiserror::Error;

use crate::registry::ActorId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum RuleCode {
    #[error("SPEED_RANGE")]
    SpeedRange,
    #[error("HEALTH_RANGE")]
    HealthRange,
    #[error("LATERAL_BOUNDS")]
    LateralBounds,
    #[error("TIMER_RANGE")]
    TimerRange,
    #[error("RACE_POSITION_RANGE")]
    RacePositionRange,
    #[error("TIME_REMAINING_RANGE")]
    TimeRemainingRange,
    #[error("CRASH_FREEZE")]
    CrashFreeze,
    #[error("DISTANCE_REGRESSION")]
    DistanceRegression,
    #[error("POST_GAME_OVER_MOTION")]
    PostGameOverMotion,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum RaceError {
    #[error("invalid tick delta: {dt} (allowed 0 < dt <= {max})")]
    InvalidDelta { dt: f32, max: f32 },
    #[error("no actor with id {id}")]
    ActorNotFound { id: ActorId },
    #[error("invalid race config: {0}")]
    InvalidConfig(String),
    #[error("rule violation at tick {tick}: {rule}")]
    RuleViolation { tick: u32, rule: RuleCode },
}
