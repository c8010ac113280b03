use super::*;
use crate::constants::RACE_DURATION_S;
use crate::policy::ScriptedPolicy;
use crate::profile::VehicleProfile;
use crate::rng::SeededRng;

const DT: f32 = 1.0 / 60.0;

fn calm_race(config: RaceConfig) -> Race<ScriptedPolicy> {
    Race::new(config, ScriptedPolicy::default()).expect("config should be valid")
}

/// A race holding the player plus exactly the given opponents.
fn staged_race(player: VehicleState, opponents: Vec<VehicleState>) -> Race<ScriptedPolicy> {
    let mut race = calm_race(RaceConfig::default().with_difficulty(0));
    let tuning = OpponentTuning::for_difficulty(0);
    let mut actors = ActorRegistry::new(player);
    for state in opponents {
        actors.add_opponent(state, OpponentDriver::new(tuning));
    }
    race.actors = actors;
    race.snapshot = race.derive_snapshot();
    race
}

fn player_at(x: f32, z: f32, speed: f32) -> VehicleState {
    VehicleState::new(Vec3::new(x, 0.0, z), VehicleProfile::default().player_stats())
        .with_speed(speed)
}

fn opponent_at(x: f32, z: f32, speed: f32) -> VehicleState {
    VehicleState::new(
        Vec3::new(x, 0.0, z),
        OpponentTuning::for_difficulty(0).vehicle_stats(),
    )
    .with_speed(speed)
}

fn rider(race: &mut Race<ScriptedPolicy>) -> &mut VehicleState {
    race.actors.split_player_mut().0
}

fn rival(race: &mut Race<ScriptedPolicy>, index: usize) -> &mut VehicleState {
    &mut race.actors.split_player_mut().1[index].state
}

fn random_inputs(rng: &mut SeededRng, len: usize) -> Vec<TickInput> {
    (0..len)
        .map(|_| {
            let dt = rng.range_f32(0.005, MAX_TICK_DT);
            let intent = PlayerIntent::from_bits((rng.next() & 0x1F) as u8);
            TickInput::new(dt, intent)
        })
        .collect()
}

fn assert_invariant_violation(
    mutator: impl FnOnce(&mut Race<ScriptedPolicy>),
    expected: RuleCode,
) {
    let mut race = calm_race(RaceConfig::default());
    race.validate_invariants().expect("fresh race must be valid");
    mutator(&mut race);
    assert_eq!(race.validate_invariants(), Err(expected));
}

fn assert_transition_violation(
    mut race: Race<ScriptedPolicy>,
    intent: PlayerIntent,
    mutate: impl FnOnce(&mut TransitionState),
    expected: RuleCode,
) {
    let before_step = race.transition_state();
    race.step(DT, intent).expect("tick should be accepted");
    let mut after_step = race.transition_state();
    validate_transition(&before_step, &after_step).expect("honest transition must pass");

    mutate(&mut after_step);
    assert_eq!(validate_transition(&before_step, &after_step), Err(expected));
}

#[test]
fn same_seed_and_inputs_are_deterministic() {
    let mut rng = SeededRng::new(0x5EED_0001);
    let inputs = random_inputs(&mut rng, 400);
    let config = RaceConfig::default();

    let a = replay(&config, 0x1234_5678, &inputs).expect("replay");
    let b = replay(&config, 0x1234_5678, &inputs).expect("replay");
    assert_eq!(a, b);

    let mut live = LiveRace::new(config, 0x1234_5678).expect("live race");
    for input in &inputs {
        live.tick(input.dt, input.intent);
    }
    assert_eq!(live.snapshot(), a);
    live.validate().expect("live race must remain valid");
}

#[test]
fn strict_replay_matches_regular_replay_on_random_inputs() {
    let mut rng = SeededRng::new(0xC0FF_EE00);

    for _ in 0..32 {
        let seed = rng.next();
        let config = RaceConfig::default().with_difficulty(rng.next_int(4));
        let len = (rng.next_int(900) + 1) as usize;
        let inputs = random_inputs(&mut rng, len);

        let regular = replay(&config, seed, &inputs).expect("regular replay");
        let strict = replay_strict(&config, seed, &inputs).expect("strict replay should succeed");
        assert_eq!(regular, strict);
    }
}

#[test]
fn invariants_hold_every_tick_in_a_crowded_field() {
    // Large enough to route collisions through the broad phase.
    let config = RaceConfig::default().with_difficulty(8);
    assert!(config.opponent_count() as usize >= BROAD_PHASE_MIN_OPPONENTS);

    let mut rng = SeededRng::new(0xF1E1_D000);
    for _ in 0..6 {
        let mut race = Race::new(config.clone(), RandomPolicy::new(rng.next())).expect("race");
        for input in random_inputs(&mut rng, 1_500) {
            let before_step = race.transition_state();
            race.step(input.dt, input.intent).expect("tick");
            let after_step = race.transition_state();
            assert_eq!(validate_transition(&before_step, &after_step), Ok(()));
            assert_eq!(race.validate_invariants(), Ok(()));
        }
    }
}

#[test]
fn overlapping_bikes_lose_health_by_relative_speed() {
    let mut race = staged_race(player_at(0.0, 0.0, 120.0), vec![opponent_at(0.5, 0.0, 100.0)]);
    let multiplier = race.actors.player().stats.damage_multiplier;

    race.resolve_collisions();

    // force = |120 - 100| * 0.5 = 10
    let player = race.actors.player();
    let opponent = &race.actors.opponents()[0].state;
    assert!((player.health - (100.0 - 10.0 * 0.2 * multiplier)).abs() < 1e-4);
    assert!((opponent.health - 98.0).abs() < 1e-4);
    assert!((player.speed - 115.0).abs() < 1e-4);
    assert!((opponent.speed - 95.0).abs() < 1e-4);
    assert_eq!(player.mode, Mode::Normal);
    assert_eq!(opponent.mode, Mode::Normal);
}

#[test]
fn opponent_goes_down_before_player_on_the_same_hit() {
    let mut race = staged_race(player_at(0.0, 0.0, 150.0), vec![opponent_at(0.2, 0.3, 50.0)]);

    race.resolve_collisions();

    // force = 50: above the opponent threshold, not above the player's.
    let opponent = &race.actors.opponents()[0].state;
    assert_eq!(opponent.mode, Mode::Crashed);
    assert_eq!(opponent.recovery_time, ScriptedPolicy::default().recovery);
    assert_eq!(race.actors.player().mode, Mode::Normal);
}

#[test]
fn distant_opponents_are_never_hit() {
    let mut race = staged_race(
        player_at(0.0, 0.0, 150.0),
        vec![opponent_at(3.0, 0.0, 0.0), opponent_at(0.0, 2.0, 0.0)],
    );
    race.resolve_collisions();
    assert_eq!(race.actors.player().health, MAX_HEALTH);
    assert!(race
        .actors
        .opponents()
        .iter()
        .all(|opponent| opponent.state.health == MAX_HEALTH));
}

#[test]
fn time_expiry_ends_the_race_and_freezes_everyone() {
    let config = RaceConfig {
        race_duration_s: 2.0,
        ..RaceConfig::default()
    };
    let mut race = calm_race(config);
    rider(&mut race).health = 50.0;

    let mut ended = None;
    for _ in 0..40 {
        let snapshot = race.step(0.1, PlayerIntent::IDLE).expect("tick");
        if snapshot.game_over {
            ended = Some(snapshot);
            break;
        }
    }

    let snapshot = ended.expect("race should end once the clock runs out");
    assert_eq!(snapshot.time_remaining, 0.0);
    assert!(!snapshot.race_finished);
    assert_eq!(snapshot.player_health, 50.0);
    assert_eq!(snapshot.outcome, Some(RaceOutcome::TimeExpired));
    assert_eq!(race.phase(), RacePhase::Finished(RaceOutcome::TimeExpired));

    let before = race.transition_state();
    let throttle = PlayerIntent {
        accelerate: true,
        ..PlayerIntent::IDLE
    };
    let after_snapshot = race.step(0.1, throttle).expect("tick after game over");
    assert_eq!(after_snapshot, snapshot);
    assert_eq!(race.transition_state(), before);
}

#[test]
fn crossing_the_finish_line_wins_immediately() {
    let mut race = calm_race(RaceConfig::default());
    {
        let player = rider(&mut race);
        player.distance_traveled = 1_999.5;
        player.speed = 180.0;
    }

    let throttle = PlayerIntent {
        accelerate: true,
        ..PlayerIntent::IDLE
    };
    let snapshot = race.step(DT, throttle).expect("tick");

    assert!(snapshot.race_finished);
    assert!(snapshot.game_over);
    assert!(snapshot.player_distance >= 2_000.0);
    assert!(snapshot.time_remaining > 0.0);
    assert_eq!(snapshot.player_health, MAX_HEALTH);
    assert_eq!(snapshot.outcome, Some(RaceOutcome::Victory));

    let distance = race.actors.player().distance_traveled;
    race.step(DT, throttle).expect("tick");
    assert_eq!(race.actors.player().distance_traveled, distance);
    assert_eq!(race.snapshot().tick, snapshot.tick);
}

#[test]
fn wrecked_player_ends_the_race() {
    let mut race = staged_race(player_at(0.0, 0.0, 10.0), vec![opponent_at(0.0, 0.0, 10.0)]);
    rider(&mut race).health = 0.5;

    // A light knock takes the last of the health.
    let (player, _) = race.actors.split_player_mut();
    player.apply_impulse(5.0, &mut race.policy);
    let snapshot = race.step(DT, PlayerIntent::IDLE).expect("tick");

    assert_eq!(snapshot.player_health, 0.0);
    assert!(snapshot.game_over);
    assert_eq!(snapshot.outcome, Some(RaceOutcome::Wrecked));
}

#[test]
fn invalid_delta_is_rejected_without_side_effects() {
    let mut race = calm_race(RaceConfig::default());
    race.step(DT, PlayerIntent::IDLE).expect("tick");
    let snapshot = race.snapshot();
    let state = race.transition_state();

    for dt in [0.0, -DT, f32::NAN, f32::INFINITY, MAX_TICK_DT * 2.0] {
        let err = race.step(dt, PlayerIntent::IDLE).expect_err("bad delta must be rejected");
        assert!(matches!(err, RaceError::InvalidDelta { .. }));
        assert_eq!(race.snapshot(), snapshot);
        assert_eq!(race.transition_state(), state);
    }
}

#[test]
fn crashed_opponent_holds_position_through_a_tick() {
    let mut downed = opponent_at(1.0, 30.0, 120.0);
    downed.mode = Mode::Crashed;
    downed.recovery_time = 2.0;
    let mut race = staged_race(player_at(0.0, 0.0, 0.0), vec![downed.clone()]);

    race.step(DT, PlayerIntent::IDLE).expect("tick");

    let state = &race.actors.opponents()[0].state;
    assert_eq!(state.position, downed.position);
    assert_eq!(state.distance_traveled, downed.distance_traveled);
    assert!((state.recovery_time - (2.0 - DT)).abs() < 1e-6);
}

#[test]
fn position_and_score_are_derived_from_the_field() {
    let mut player = player_at(0.0, 0.0, 0.0);
    player.distance_traveled = 123.0;
    let race = staged_race(
        player,
        vec![
            opponent_at(0.0, 10.0, 0.0),
            opponent_at(0.0, -5.0, 0.0),
            opponent_at(0.0, 30.0, 0.0),
        ],
    );

    let snapshot = race.derive_snapshot();
    assert_eq!(snapshot.position, 3);
    assert_eq!(snapshot.score, 12 + 3 * 30);
    assert!(!snapshot.game_over);
}

#[test]
fn starting_grid_follows_row_spacing() {
    let race = calm_race(RaceConfig::default().with_difficulty(2));
    assert_eq!(race.opponent_count(), 7);
    for (row, opponent) in race.actors.opponents().iter().enumerate() {
        let expected_z = GRID_FIRST_ROW_Z + GRID_ROW_SPACING_Z * row as f32;
        assert_eq!(opponent.state.position.z, expected_z);
        assert_eq!(opponent.state.speed, ScriptedPolicy::default().slot.speed);
    }
    assert_eq!(race.player().position, Vec3::ZERO);
    assert_eq!(race.snapshot().position, 8);
    assert_eq!(race.snapshot().time_remaining, RACE_DURATION_S);
}

#[test]
fn invariant_checks_report_expected_rule_codes() {
    assert_invariant_violation(
        |race| {
            let opponent = rival(race, 0);
            opponent.speed = opponent.stats.max_speed + 1.0;
        },
        RuleCode::SpeedRange,
    );
    assert_invariant_violation(|race| rider(race).health = -1.0, RuleCode::HealthRange);
    assert_invariant_violation(
        |race| rider(race).position.x = TRACK_HALF_WIDTH + 0.5,
        RuleCode::LateralBounds,
    );
    assert_invariant_violation(|race| rival(race, 1).recovery_time = -0.1, RuleCode::TimerRange);
    assert_invariant_violation(|race| race.snapshot.position = 0, RuleCode::RacePositionRange);
    assert_invariant_violation(
        |race| race.snapshot.time_remaining = race.config.race_duration_s + 1.0,
        RuleCode::TimeRemainingRange,
    );
}

#[test]
fn transition_check_catches_a_sliding_crashed_bike() {
    let mut downed = opponent_at(0.0, 40.0, 100.0);
    downed.mode = Mode::Crashed;
    downed.recovery_time = 3.0;
    let race = staged_race(player_at(0.0, 0.0, 0.0), vec![downed]);

    assert_transition_violation(
        race,
        PlayerIntent::IDLE,
        |after| after.actors[1].position.z += 1.0,
        RuleCode::CrashFreeze,
    );
}

#[test]
fn transition_check_catches_distance_going_backwards() {
    let race = staged_race(player_at(0.0, 0.0, 100.0), vec![opponent_at(0.0, 60.0, 100.0)]);
    assert_transition_violation(
        race,
        PlayerIntent {
            accelerate: true,
            ..PlayerIntent::IDLE
        },
        |after| after.actors[0].distance -= 1.0,
        RuleCode::DistanceRegression,
    );
}

#[test]
fn transition_check_catches_motion_after_game_over() {
    let config = RaceConfig {
        race_duration_s: 0.05,
        ..RaceConfig::default()
    };
    let mut race = calm_race(config);
    race.step(0.1, PlayerIntent::IDLE).expect("tick");
    assert!(race.snapshot().game_over);

    assert_transition_violation(
        race,
        PlayerIntent::IDLE,
        |after| after.actors[0].position.x += 0.1,
        RuleCode::PostGameOverMotion,
    );
}
