use crate::config::RunnerPolicy;
use crate::riders::{create_rider, rider_ids, RiderBot, RiderView};
use anyhow::{anyhow, Context, Result};
use race_core::{replay_strict, LiveRace, RaceConfig, RaceOutcome, TickInput};
use serde::Serialize;

/// Converts a measured frame time to the delta handed to the core, capped
/// at `max_dt_ms` so a stalled frame never turns into one giant step.
pub fn clamp_frame_dt(frame_ms: f32, max_dt_ms: u32) -> f32 {
    if !frame_ms.is_finite() {
        return max_dt_ms as f32 / 1000.0;
    }
    frame_ms.clamp(0.0, max_dt_ms as f32) / 1000.0
}

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub rider_id: String,
    pub player_name: String,
    pub seed: u32,
    pub difficulty: u32,
    pub vehicle: String,
    pub max_ticks: u32,
    pub tick_count: u32,
    pub elapsed_s: f32,
    pub final_score: i32,
    pub final_distance: f32,
    pub final_health: f32,
    pub final_position: u32,
    pub final_rng_state: u32,
    pub outcome: Option<RaceOutcome>,
    pub game_over: bool,
    pub throttle_ticks: u32,
    pub brake_ticks: u32,
    pub steer_ticks: u32,
    pub attack_ticks: u32,
    pub crashed_ticks: u32,
}

impl RunMetrics {
    pub fn finished(&self) -> bool {
        self.outcome == Some(RaceOutcome::Victory)
    }

    pub fn wrecked(&self) -> bool {
        self.outcome == Some(RaceOutcome::Wrecked)
    }
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    /// Every input fed to the race, in order. Kept in memory only.
    pub inputs: Vec<TickInput>,
}

pub fn run_race(
    rider_id: &str,
    seed: u32,
    config: &RaceConfig,
    runner: RunnerPolicy,
    max_ticks: u32,
) -> Result<RunArtifact> {
    let mut rider = create_rider(rider_id).ok_or_else(|| {
        let available = rider_ids().join(", ");
        anyhow!("unknown rider '{rider_id}'. available: {available}")
    })?;
    run_rider_instance(rider.as_mut(), seed, config, runner, max_ticks)
}

pub fn run_rider_instance(
    rider: &mut dyn RiderBot,
    seed: u32,
    config: &RaceConfig,
    runner: RunnerPolicy,
    max_ticks: u32,
) -> Result<RunArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    rider.reset(seed);

    let mut race = LiveRace::new(config.clone(), seed)
        .with_context(|| format!("failed to start race for seed {seed:#010x}"))?;
    race.validate()
        .map_err(|rule| anyhow!("initial invariant failure: {rule}"))?;

    let dt = runner.frame_dt();
    let mut snapshot = race.snapshot();
    let mut inputs = Vec::with_capacity(max_ticks as usize);
    let mut throttle_ticks = 0u32;
    let mut brake_ticks = 0u32;
    let mut steer_ticks = 0u32;
    let mut attack_ticks = 0u32;
    let mut crashed_ticks = 0u32;

    while snapshot.tick < max_ticks && !snapshot.game_over {
        if race.player().is_crashed() {
            crashed_ticks += 1;
        }

        let poses = race.poses();
        let intent = rider.next_intent(&RiderView {
            snapshot: &snapshot,
            player: race.player(),
            poses: &poses,
        });

        throttle_ticks += intent.accelerate as u32;
        brake_ticks += intent.brake as u32;
        steer_ticks += (intent.steer_left || intent.steer_right) as u32;
        attack_ticks += intent.attack as u32;

        snapshot = race
            .try_tick(dt, intent)
            .with_context(|| format!("tick {} rejected", snapshot.tick + 1))?;
        race.validate()
            .map_err(|rule| anyhow!("invariant {rule} broken at tick {}", snapshot.tick))?;
        inputs.push(TickInput::new(dt, intent));
    }

    if snapshot.game_over {
        tracing::debug!(
            rider = rider.id(),
            seed,
            outcome = ?snapshot.outcome,
            ticks = snapshot.tick,
            "run finished"
        );
    } else {
        tracing::debug!(rider = rider.id(), seed, ticks = snapshot.tick, "tick budget spent");
    }

    let setup = race.config();
    Ok(RunArtifact {
        metrics: RunMetrics {
            rider_id: rider.id().to_string(),
            player_name: setup.player_name.clone(),
            seed,
            difficulty: setup.difficulty,
            vehicle: setup.vehicle.clone(),
            max_ticks,
            tick_count: snapshot.tick,
            elapsed_s: race.elapsed(),
            final_score: snapshot.score,
            final_distance: snapshot.player_distance,
            final_health: snapshot.player_health,
            final_position: snapshot.position,
            final_rng_state: race.rng_state(),
            outcome: snapshot.outcome,
            game_over: snapshot.game_over,
            throttle_ticks,
            brake_ticks,
            steer_ticks,
            attack_ticks,
            crashed_ticks,
        },
        inputs,
    })
}

/// Re-runs the recorded inputs through the strict replay and checks that it
/// lands on the same final state the live run reported.
pub fn verify_replay(config: &RaceConfig, artifact: &RunArtifact) -> Result<()> {
    let metrics = &artifact.metrics;
    let replayed = replay_strict(config, metrics.seed, &artifact.inputs)
        .with_context(|| format!("strict replay failed for seed {:#010x}", metrics.seed))?;

    if replayed.tick != metrics.tick_count
        || replayed.score != metrics.final_score
        || replayed.player_distance != metrics.final_distance
        || replayed.outcome != metrics.outcome
    {
        return Err(anyhow!(
            "replay diverged: live tick={} score={} vs replay tick={} score={}",
            metrics.tick_count,
            metrics.final_score,
            replayed.tick,
            replayed.score
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_is_clamped_to_the_host_cap() {
        assert!((clamp_frame_dt(16.0, 100) - 0.016).abs() < 1e-6);
        assert_eq!(clamp_frame_dt(250.0, 100), 0.1);
        assert_eq!(clamp_frame_dt(-5.0, 100), 0.0);
        assert_eq!(clamp_frame_dt(f32::INFINITY, 100), 0.1);
        assert_eq!(clamp_frame_dt(f32::NAN, 50), 0.05);
    }

    #[test]
    fn unknown_rider_lists_the_roster() {
        let err = run_race("ghost", 1, &RaceConfig::default(), RunnerPolicy::default(), 10)
            .expect_err("unknown rider");
        let message = err.to_string();
        assert!(message.contains("ghost"));
        assert!(message.contains("full-throttle"));
    }

    #[test]
    fn zero_tick_budget_is_rejected() {
        assert!(run_race(
            "full-throttle",
            1,
            &RaceConfig::default(),
            RunnerPolicy::default(),
            0
        )
        .is_err());
    }

    #[test]
    fn run_stops_at_tick_budget() {
        let artifact = run_race(
            "cautious",
            0xC0FF_EE01,
            &RaceConfig::default(),
            RunnerPolicy::default(),
            300,
        )
        .expect("run");
        assert_eq!(artifact.metrics.tick_count, 300);
        assert_eq!(artifact.inputs.len(), 300);
        assert!(!artifact.metrics.game_over);
        assert!(artifact.metrics.final_distance > 0.0);
    }

    #[test]
    fn metrics_carry_the_race_setup() {
        let config = RaceConfig {
            player_name: "Axel".to_string(),
            ..RaceConfig::default().with_difficulty(3).with_vehicle("sport")
        };
        let artifact = run_race("weaver", 9, &config, RunnerPolicy::default(), 30).expect("run");
        let metrics = &artifact.metrics;
        assert_eq!(metrics.player_name, "Axel");
        assert_eq!(metrics.difficulty, 3);
        assert_eq!(metrics.vehicle, "sport");

        let json = serde_json::to_value(metrics).expect("metrics json");
        assert_eq!(json["player_name"], "Axel");
    }
}
