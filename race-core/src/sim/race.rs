use super::*;

use crate::ai::{OpponentDriver, OpponentTuning};
use crate::collision::{broad_phase, collision_force, Aabb};
use crate::constants::{
    BROAD_PHASE_CELL, BROAD_PHASE_MIN_OPPONENTS, GRID_FIRST_ROW_Z, GRID_ROW_SPACING_Z,
    MAX_HEALTH, MAX_TICK_DT, SCORE_DISTANCE_DIVISOR, SCORE_POSITION_BASE, SCORE_POSITION_WEIGHT,
    TRACK_HALF_WIDTH,
};
use crate::input::translate;
use crate::registry::{Actor, ActorRegistry, Controller};

#[derive(Clone)]
pub(super) struct Race<P> {
    config: RaceConfig,
    actors: ActorRegistry,
    policy: P,
    elapsed: f32,
    tick: u32,
    phase: RacePhase,
    snapshot: RaceSnapshot,
}

impl<P> Race<P> {
    #[inline]
    pub(super) fn snapshot(&self) -> RaceSnapshot {
        self.snapshot
    }

    #[inline]
    pub(super) fn phase(&self) -> RacePhase {
        self.phase
    }

    #[inline]
    pub(super) fn policy(&self) -> &P {
        &self.policy
    }

    #[inline]
    pub(super) fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub(super) fn config(&self) -> &RaceConfig {
        &self.config
    }

    #[inline]
    pub(super) fn player(&self) -> &VehicleState {
        self.actors.player()
    }

    pub(super) fn opponent_count(&self) -> usize {
        self.actors.opponents().len()
    }

    pub(super) fn pose(&self, id: ActorId) -> Option<ActorPose> {
        self.actors.get(id).map(Self::actor_pose)
    }

    pub(super) fn poses(&self) -> impl Iterator<Item = ActorPose> + '_ {
        self.actors.iter().map(Self::actor_pose)
    }

    fn actor_pose(actor: &Actor) -> ActorPose {
        ActorPose {
            id: actor.id,
            role: actor.controller.role(),
            position: actor.state.position,
            heading: actor.state.heading,
            lean: actor.state.lean,
            mode: actor.state.mode,
        }
    }

    pub(super) fn transition_state(&self) -> TransitionState {
        TransitionState {
            game_over: self.snapshot.game_over,
            actors: self
                .actors
                .iter()
                .map(|actor| ActorMotion {
                    mode: actor.state.mode,
                    position: actor.state.position,
                    distance: actor.state.distance_traveled,
                })
                .collect(),
        }
    }

    pub(super) fn validate_invariants(&self) -> Result<(), RuleCode> {
        for actor in self.actors.iter() {
            let state = &actor.state;
            if !(state.speed.is_finite() && (0.0..=state.stats.max_speed).contains(&state.speed)) {
                return Err(RuleCode::SpeedRange);
            }
            if !(state.health.is_finite() && (0.0..=MAX_HEALTH).contains(&state.health)) {
                return Err(RuleCode::HealthRange);
            }
            if !state.position.x.is_finite() || state.position.x.abs() > TRACK_HALF_WIDTH {
                return Err(RuleCode::LateralBounds);
            }
            if !(non_negative(state.attack_cooldown)
                && non_negative(state.recovery_time)
                && non_negative(state.attack_release_at))
            {
                return Err(RuleCode::TimerRange);
            }
        }

        let snapshot = &self.snapshot;
        if snapshot.position == 0 || snapshot.position as usize > self.actors.actor_count() {
            return Err(RuleCode::RacePositionRange);
        }
        if !(0.0..=self.config.race_duration_s).contains(&snapshot.time_remaining) {
            return Err(RuleCode::TimeRemainingRange);
        }

        Ok(())
    }

    /// Rebuilds the snapshot from the actors. Position and score are always
    /// derived here, never carried over from the previous tick.
    fn derive_snapshot(&self) -> RaceSnapshot {
        let player = self.actors.player();
        let position = 1 + self
            .actors
            .opponents()
            .iter()
            .filter(|opponent| opponent.state.position.z > player.position.z)
            .count() as u32;
        let time_remaining = (self.config.race_duration_s - self.elapsed).max(0.0);
        let race_finished = player.distance_traveled >= self.config.finish_distance_m;
        let game_over = race_finished || player.health <= 0.0 || time_remaining <= 0.0;
        let score = (player.distance_traveled / SCORE_DISTANCE_DIVISOR).floor() as i32
            + (SCORE_POSITION_BASE - position as i32) * SCORE_POSITION_WEIGHT;

        let outcome = if !game_over {
            None
        } else if race_finished {
            Some(RaceOutcome::Victory)
        } else if player.health <= 0.0 {
            Some(RaceOutcome::Wrecked)
        } else {
            Some(RaceOutcome::TimeExpired)
        };

        RaceSnapshot {
            tick: self.tick,
            player_speed: player.speed,
            player_distance: player.distance_traveled,
            player_health: player.health,
            position,
            time_remaining,
            score,
            game_over,
            race_finished,
            outcome,
        }
    }
}

impl<P: DecisionPolicy> Race<P> {
    pub(super) fn new(config: RaceConfig, mut policy: P) -> Result<Self, RaceError> {
        config.validate()?;

        let player = VehicleState::new(Vec3::ZERO, config.profile().player_stats());
        let mut actors = ActorRegistry::new(player);

        let tuning = OpponentTuning::for_difficulty(config.difficulty);
        for row in 0..config.opponent_count() {
            let slot = policy.grid_slot();
            let z = GRID_FIRST_ROW_Z + GRID_ROW_SPACING_Z * row as f32;
            let start = Vec3::new(slot.lateral.clamp(-TRACK_HALF_WIDTH, TRACK_HALF_WIDTH), 0.0, z);
            let state = VehicleState::new(start, tuning.vehicle_stats()).with_speed(slot.speed);
            actors.add_opponent(state, OpponentDriver::new(tuning));
        }

        tracing::debug!(
            difficulty = config.difficulty,
            opponents = actors.opponents().len(),
            vehicle = %config.vehicle,
            "race created"
        );

        let mut race = Self {
            config,
            actors,
            policy,
            elapsed: 0.0,
            tick: 0,
            phase: RacePhase::Running,
            snapshot: RaceSnapshot {
                tick: 0,
                player_speed: 0.0,
                player_distance: 0.0,
                player_health: MAX_HEALTH,
                position: 1,
                time_remaining: 0.0,
                score: 0,
                game_over: false,
                race_finished: false,
                outcome: None,
            },
        };
        race.snapshot = race.derive_snapshot();
        Ok(race)
    }

    pub(super) fn step(
        &mut self,
        dt: f32,
        intent: PlayerIntent,
    ) -> Result<RaceSnapshot, RaceError> {
        if !(dt.is_finite() && dt > 0.0 && dt <= MAX_TICK_DT) {
            tracing::warn!(dt, max = MAX_TICK_DT, "rejecting tick with invalid delta");
            return Err(RaceError::InvalidDelta {
                dt,
                max: MAX_TICK_DT,
            });
        }
        if let RacePhase::Finished(_) = self.phase {
            return Ok(self.snapshot);
        }

        self.tick += 1;
        self.elapsed += dt;

        self.drive_actors(dt, intent);
        self.resolve_collisions();

        self.snapshot = self.derive_snapshot();
        if let Some(outcome) = self.snapshot.outcome {
            self.phase = RacePhase::Finished(outcome);
            tracing::info!(
                ?outcome,
                tick = self.tick,
                distance = self.snapshot.player_distance,
                position = self.snapshot.position,
                score = self.snapshot.score,
                "race finished"
            );
        }

        Ok(self.snapshot)
    }

    fn drive_actors(&mut self, dt: f32, intent: PlayerIntent) {
        let (player, opponents) = self.actors.split_player_mut();

        let before = player.mode;
        let drive = translate(player, intent);
        player.integrate(dt, drive);
        log_mode_change(ActorId::PLAYER, before, player.mode);

        let player_position = player.position;
        let player_speed = player.speed;
        for actor in opponents.iter_mut() {
            let Controller::Opponent(driver) = &mut actor.controller else {
                continue;
            };
            let before = actor.state.mode;
            let drive = driver.decide(
                &mut actor.state,
                dt,
                player_position,
                player_speed,
                &mut self.policy,
            );
            actor.state.integrate(dt, drive);
            log_mode_change(actor.id, before, actor.state.mode);
        }
    }

    /// Player-vs-opponent only; opponents never collide with each other.
    fn resolve_collisions(&mut self) {
        let (player, opponents) = self.actors.split_player_mut();
        let player_box = Aabb::around_bike(player.position, player.heading);

        let candidates: Vec<usize> = if opponents.len() >= BROAD_PHASE_MIN_OPPONENTS {
            broad_phase(
                player.position,
                opponents.iter().map(|actor| actor.state.position),
                BROAD_PHASE_CELL,
            )
        } else {
            (0..opponents.len()).collect()
        };

        for index in candidates {
            let opponent = &mut opponents[index];
            let opponent_box = Aabb::around_bike(opponent.state.position, opponent.state.heading);
            if !player_box.intersects(&opponent_box) {
                continue;
            }

            let force = collision_force(player.speed, opponent.state.speed);
            let player_before = player.mode;
            let opponent_before = opponent.state.mode;
            player.apply_impulse(force, &mut self.policy);
            opponent.state.apply_impulse(force, &mut self.policy);

            tracing::trace!(opponent = %opponent.id, force, "collision");
            log_mode_change(ActorId::PLAYER, player_before, player.mode);
            log_mode_change(opponent.id, opponent_before, opponent.state.mode);
        }
    }
}

#[inline]
fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn log_mode_change(id: ActorId, before: Mode, after: Mode) {
    match (before, after) {
        (Mode::Crashed, Mode::Crashed) => {}
        (_, Mode::Crashed) => tracing::debug!(actor = %id, "actor crashed"),
        (Mode::Crashed, _) => tracing::debug!(actor = %id, "actor recovered"),
        (Mode::Normal, Mode::Attacking) => tracing::debug!(actor = %id, "attack started"),
        _ => {}
    }
}

#[cfg(test)]
mod tests;
