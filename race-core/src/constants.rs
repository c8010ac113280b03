use glam::Vec3;

// Track
pub const TRACK_HALF_WIDTH: f32 = 5.0;
pub const KMH_PER_MPS: f32 = 3.6;
pub const MAX_HEADING_RAD: f32 = 1.2; // keeps forward progress monotonic

// Timing
pub const MAX_TICK_DT: f32 = 0.1; // 100ms host clamp
pub const RACE_DURATION_S: f32 = 180.0;
pub const FINISH_DISTANCE_M: f32 = 2_000.0;

// Field size
pub const BASE_OPPONENTS: u32 = 3;
pub const OPPONENTS_PER_DIFFICULTY: u32 = 2;
pub const MAX_DIFFICULTY: u32 = 30;

// Starting grid
pub const GRID_FIRST_ROW_Z: f32 = 20.0;
pub const GRID_ROW_SPACING_Z: f32 = 15.0;
pub const GRID_LATERAL_SPREAD: f32 = 3.0;
pub const GRID_SPEED_MIN_KMH: f32 = 100.0;
pub const GRID_SPEED_MAX_KMH: f32 = 150.0;

// Vehicle kinematics
pub const MAX_HEALTH: f32 = 100.0;
pub const NATURAL_DECELERATION: f32 = 20.0; // km/h per second
pub const MIN_TURN_FACTOR: f32 = 0.3;
pub const HIGH_SPEED_TURN_PENALTY: f32 = 0.7;
pub const RECOVERY_SPEED_CAP_KMH: f32 = 20.0;
pub const RECOVERY_MIN_S: f32 = 3.0;
pub const RECOVERY_MAX_S: f32 = 5.0;

// Lean (cosmetic)
pub const LEAN_MAX_RAD: f32 = 0.2;
pub const LEAN_IN_RATE: f32 = 5.0;
pub const LEAN_OUT_RATE: f32 = 3.0;
pub const CRASH_LEAN_RAD: f32 = 0.5;

// Impulses
pub const COLLISION_FORCE_SCALE: f32 = 0.5;
pub const IMPULSE_DAMAGE_SCALE: f32 = 0.2;
pub const IMPULSE_SPEED_SCALE: f32 = 0.5;
pub const PLAYER_CRASH_FORCE: f32 = 50.0;
pub const PLAYER_CRASH_HEALTH: f32 = 0.0;
pub const OPPONENT_CRASH_FORCE: f32 = 40.0;
pub const OPPONENT_CRASH_HEALTH: f32 = 20.0; // opponents go down early to keep the pack moving

// Attacks
pub const PLAYER_ATTACK_COOLDOWN_S: f32 = 1.0;
pub const PLAYER_ATTACK_WINDOW_S: f32 = 0.2;
pub const OPPONENT_ATTACK_WINDOW_S: f32 = 0.5;
pub const OPPONENT_ATTACK_COOLDOWN_MIN_S: f32 = 3.0;
pub const OPPONENT_ATTACK_COOLDOWN_MAX_S: f32 = 5.0;
pub const OPPONENT_ATTACK_RANGE: f32 = 1.5;
pub const OPPONENT_ATTACK_LATERAL: f32 = 1.0;
pub const OPPONENT_ATTACK_CHANCE_SCALE: f32 = 0.1;

// Opponent decision policy
pub const OPPONENT_PROXIMITY: f32 = 5.0;
pub const SHADOW_SPEED_JITTER: f32 = 0.1;
pub const CRUISE_MIN_FRACTION: f32 = 0.7;
pub const CRUISE_MAX_FRACTION: f32 = 1.0;
pub const LANE_CHANGE_CHANCE_SCALE: f32 = 0.01;
pub const LANE_TARGET_SPAN: f32 = 4.0;
pub const LANE_LOOKAHEAD: f32 = 10.0;
pub const LANE_ARRIVAL_TOLERANCE: f32 = 0.25;
pub const HEADING_DEADBAND_RAD: f32 = 0.02;
pub const SPEED_DEADBAND_KMH: f32 = 2.0;

// Opponent tuning: base + per difficulty step
pub const OPPONENT_MAX_SPEED_BASE: f32 = 180.0;
pub const OPPONENT_MAX_SPEED_STEP: f32 = 10.0;
pub const OPPONENT_ACCEL_BASE: f32 = 40.0;
pub const OPPONENT_ACCEL_STEP: f32 = 5.0;
pub const OPPONENT_TURN_BASE: f32 = 1.0;
pub const OPPONENT_TURN_STEP: f32 = 0.2;
pub const OPPONENT_INTELLIGENCE_BASE: f32 = 0.3;
pub const OPPONENT_INTELLIGENCE_STEP: f32 = 0.2;
pub const OPPONENT_AGGRESSION_BASE: f32 = 0.2;
pub const OPPONENT_AGGRESSION_STEP: f32 = 0.25;
pub const OPPONENT_BRAKING_FORCE: f32 = 100.0;

// Collision volumes
pub const BIKE_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.7, 0.8);
pub const BIKE_CENTER_HEIGHT: f32 = 0.7;
pub const BROAD_PHASE_CELL: f32 = 10.0;
pub const BROAD_PHASE_MIN_OPPONENTS: usize = 16;

// Scoring
pub const SCORE_DISTANCE_DIVISOR: f32 = 10.0;
pub const SCORE_POSITION_BASE: i32 = 6;
pub const SCORE_POSITION_WEIGHT: i32 = 30;
