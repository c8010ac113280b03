use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::RaceConfig;
use crate::error::{RaceError, RuleCode};
use crate::input::PlayerIntent;
use crate::policy::{DecisionPolicy, RandomPolicy};
use crate::registry::{ActorId, Role};
use crate::vehicle::{Mode, VehicleState};

mod race;

use race::Race;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceOutcome {
    /// Crossed the finish line.
    Victory,
    /// Health ran out first.
    Wrecked,
    /// The clock ran out first.
    TimeExpired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RacePhase {
    Running,
    Finished(RaceOutcome),
}

/// Derived race state emitted after every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSnapshot {
    pub tick: u32,
    pub player_speed: f32,
    pub player_distance: f32,
    pub player_health: f32,
    pub position: u32,
    pub time_remaining: f32,
    pub score: i32,
    pub game_over: bool,
    pub race_finished: bool,
    pub outcome: Option<RaceOutcome>,
}

/// Read-only transform for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorPose {
    pub id: ActorId,
    pub role: Role,
    pub position: Vec3,
    pub heading: f32,
    pub lean: f32,
    pub mode: Mode,
}

/// One host tick: elapsed seconds plus the control signals read that frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickInput {
    pub dt: f32,
    #[serde(default)]
    pub intent: PlayerIntent,
}

impl TickInput {
    pub fn new(dt: f32, intent: PlayerIntent) -> Self {
        Self { dt, intent }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayCheckpoint {
    /// Number of inputs consumed so far.
    pub input_index: u32,
    pub rng_state: u32,
    pub elapsed_s: f32,
    pub player_position: Vec3,
    pub snapshot: RaceSnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActorMotion {
    mode: Mode,
    position: Vec3,
    distance: f32,
}

#[derive(Clone, Debug, PartialEq)]
struct TransitionState {
    game_over: bool,
    actors: Vec<ActorMotion>,
}

pub struct LiveRace<P = RandomPolicy> {
    race: Race<P>,
}

pub fn replay(
    config: &RaceConfig,
    seed: u32,
    inputs: &[TickInput],
) -> Result<RaceSnapshot, RaceError> {
    let mut race = LiveRace::new(config.clone(), seed)?;
    for input in inputs {
        race.tick(input.dt, input.intent);
    }
    Ok(race.snapshot())
}

/// Replays `inputs` and checks every tick. Unlike [`replay`], a bad delta
/// is an error here, as is any broken invariant or illegal transition.
pub fn replay_strict(
    config: &RaceConfig,
    seed: u32,
    inputs: &[TickInput],
) -> Result<RaceSnapshot, RaceError> {
    let mut race = Race::new(config.clone(), RandomPolicy::new(seed))?;
    race.validate_invariants()
        .map_err(|rule| RaceError::RuleViolation { tick: 0, rule })?;

    for (index, input) in inputs.iter().enumerate() {
        let tick = index as u32 + 1;
        let before_step = race.transition_state();
        race.step(input.dt, input.intent)?;
        let after_step = race.transition_state();

        validate_transition(&before_step, &after_step)
            .map_err(|rule| RaceError::RuleViolation { tick, rule })?;
        race.validate_invariants()
            .map_err(|rule| RaceError::RuleViolation { tick, rule })?;
    }

    Ok(race.snapshot())
}

pub fn replay_with_checkpoints(
    config: &RaceConfig,
    seed: u32,
    inputs: &[TickInput],
    sample_every: u32,
) -> Result<Vec<ReplayCheckpoint>, RaceError> {
    let mut race = LiveRace::new(config.clone(), seed)?;
    let stride = sample_every.max(1);
    let total = inputs.len() as u32;
    let mut checkpoints = vec![race.checkpoint(0)];

    for (index, input) in inputs.iter().enumerate() {
        race.tick(input.dt, input.intent);
        let consumed = index as u32 + 1;
        if consumed % stride == 0 || consumed == total {
            checkpoints.push(race.checkpoint(consumed));
        }
    }

    Ok(checkpoints)
}

fn validate_transition(prev: &TransitionState, next: &TransitionState) -> Result<(), RuleCode> {
    for (before, after) in prev.actors.iter().zip(&next.actors) {
        let moved = before.position != after.position || before.distance != after.distance;
        if prev.game_over && moved {
            return Err(RuleCode::PostGameOverMotion);
        }
        if before.mode == Mode::Crashed && moved {
            return Err(RuleCode::CrashFreeze);
        }
        if after.distance < before.distance {
            return Err(RuleCode::DistanceRegression);
        }
    }
    if prev.game_over && !next.game_over {
        return Err(RuleCode::PostGameOverMotion);
    }
    Ok(())
}

impl LiveRace<RandomPolicy> {
    pub fn new(config: RaceConfig, seed: u32) -> Result<Self, RaceError> {
        Self::with_policy(config, RandomPolicy::new(seed))
    }

    pub fn rng_state(&self) -> u32 {
        self.race.policy().rng_state()
    }

    fn checkpoint(&self, input_index: u32) -> ReplayCheckpoint {
        ReplayCheckpoint {
            input_index,
            rng_state: self.rng_state(),
            elapsed_s: self.race.elapsed(),
            player_position: self.race.player().position,
            snapshot: self.snapshot(),
        }
    }
}

impl<P: DecisionPolicy> LiveRace<P> {
    pub fn with_policy(config: RaceConfig, policy: P) -> Result<Self, RaceError> {
        Ok(Self {
            race: Race::new(config, policy)?,
        })
    }

    /// Advances one tick. An invalid `dt` is logged and ignored, and the
    /// previous snapshot comes back unchanged.
    #[inline]
    pub fn tick(&mut self, dt: f32, intent: PlayerIntent) -> RaceSnapshot {
        self.race
            .step(dt, intent)
            .unwrap_or_else(|_| self.race.snapshot())
    }

    #[inline]
    pub fn try_tick(&mut self, dt: f32, intent: PlayerIntent) -> Result<RaceSnapshot, RaceError> {
        self.race.step(dt, intent)
    }

    /// Like [`try_tick`](Self::try_tick), but also checks the transition and
    /// the resulting state. On a violation the race is left where it was.
    pub fn tick_checked(
        &mut self,
        dt: f32,
        intent: PlayerIntent,
    ) -> Result<RaceSnapshot, RaceError>
    where
        P: Clone,
    {
        let before_step = self.race.transition_state();
        let mut next = self.race.clone();
        let snapshot = next.step(dt, intent)?;
        let after_step = next.transition_state();

        let tick = snapshot.tick;
        validate_transition(&before_step, &after_step)
            .map_err(|rule| RaceError::RuleViolation { tick, rule })?;
        next.validate_invariants()
            .map_err(|rule| RaceError::RuleViolation { tick, rule })?;

        self.race = next;
        Ok(snapshot)
    }

    #[inline]
    pub fn snapshot(&self) -> RaceSnapshot {
        self.race.snapshot()
    }

    #[inline]
    pub fn phase(&self) -> RacePhase {
        self.race.phase()
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        matches!(self.race.phase(), RacePhase::Finished(_))
    }

    pub fn pose(&self, id: ActorId) -> Result<ActorPose, RaceError> {
        self.race.pose(id).ok_or(RaceError::ActorNotFound { id })
    }

    pub fn poses(&self) -> Vec<ActorPose> {
        self.race.poses().collect()
    }

    pub fn player(&self) -> &VehicleState {
        self.race.player()
    }

    pub fn opponent_count(&self) -> usize {
        self.race.opponent_count()
    }

    pub fn elapsed(&self) -> f32 {
        self.race.elapsed()
    }

    pub fn config(&self) -> &RaceConfig {
        self.race.config()
    }

    #[inline]
    pub fn validate(&self) -> Result<(), RuleCode> {
        self.race.validate_invariants()
    }
}
