use race_core::constants::TRACK_HALF_WIDTH;
use race_core::registry::Role;
use race_core::rng::SeededRng;
use race_core::{ActorPose, Mode, PlayerIntent, RaceSnapshot, VehicleState};

const LINE_LOOKAHEAD: f32 = 10.0;
const LINE_MAX_HEADING: f32 = 0.6;
const LINE_DEADBAND: f32 = 0.03;
const SAFE_LANE: f32 = TRACK_HALF_WIDTH - 1.0;

/// What a rider sees before choosing its input for the next tick.
pub struct RiderView<'a> {
    pub snapshot: &'a RaceSnapshot,
    pub player: &'a VehicleState,
    pub poses: &'a [ActorPose],
}

impl RiderView<'_> {
    fn opponents(&self) -> impl Iterator<Item = &ActorPose> + '_ {
        self.poses.iter().filter(|pose| pose.role == Role::Ai)
    }

    /// Closest opponent ahead of the player within `range` metres along the
    /// track, with its forward gap.
    fn nearest_ahead(&self, range: f32, lateral: f32) -> Option<(&ActorPose, f32)> {
        let here = self.player.position;
        self.opponents()
            .map(|pose| (pose, pose.position.z - here.z))
            .filter(|(pose, gap)| {
                (0.0..=range).contains(gap) && (pose.position.x - here.x).abs() <= lateral
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

pub trait RiderBot {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    fn next_intent(&mut self, view: &RiderView<'_>) -> PlayerIntent;
}

/// Steering that settles the bike onto lateral line `target_x`.
pub fn hold_line(player: &VehicleState, target_x: f32) -> (bool, bool) {
    let target_x = target_x.clamp(-SAFE_LANE, SAFE_LANE);
    let desired = (target_x - player.position.x)
        .atan2(LINE_LOOKAHEAD)
        .clamp(-LINE_MAX_HEADING, LINE_MAX_HEADING);
    let error = desired - player.heading;
    if error > LINE_DEADBAND {
        (true, false)
    } else if error < -LINE_DEADBAND {
        (false, true)
    } else {
        (false, false)
    }
}

fn steer(intent: PlayerIntent, (steer_left, steer_right): (bool, bool)) -> PlayerIntent {
    PlayerIntent {
        steer_left,
        steer_right,
        ..intent
    }
}

const THROTTLE: PlayerIntent = PlayerIntent {
    accelerate: true,
    ..PlayerIntent::IDLE
};

#[derive(Clone, Debug, Default)]
pub struct FullThrottleRider;

impl RiderBot for FullThrottleRider {
    fn id(&self) -> &'static str {
        "full-throttle"
    }

    fn description(&self) -> &'static str {
        "Pinned throttle down the centre line, never brakes or attacks"
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_intent(&mut self, view: &RiderView<'_>) -> PlayerIntent {
        steer(THROTTLE, hold_line(view.player, 0.0))
    }
}

#[derive(Clone, Debug)]
pub struct CautiousRider {
    lane: f32,
    speed_fraction: f32,
}

impl Default for CautiousRider {
    fn default() -> Self {
        Self {
            lane: 0.0,
            speed_fraction: 0.8,
        }
    }
}

impl RiderBot for CautiousRider {
    fn id(&self) -> &'static str {
        "cautious"
    }

    fn description(&self) -> &'static str {
        "Cruises below top speed and brakes or swerves around bikes ahead"
    }

    fn reset(&mut self, _seed: u32) {
        self.lane = 0.0;
    }

    fn next_intent(&mut self, view: &RiderView<'_>) -> PlayerIntent {
        let player = view.player;
        let mut intent = PlayerIntent {
            accelerate: player.speed < player.stats.max_speed * self.speed_fraction,
            ..PlayerIntent::IDLE
        };

        // A battered bike leaves itself more room.
        let lookahead = if view.snapshot.player_health < 40.0 {
            12.0
        } else {
            8.0
        };
        if let Some((blocker, gap)) = view.nearest_ahead(lookahead, 1.5) {
            // Pass on whichever side has more road.
            self.lane = if blocker.position.x > 0.0 {
                blocker.position.x - 2.5
            } else {
                blocker.position.x + 2.5
            };
            if gap < 4.0 {
                intent.accelerate = false;
                intent.brake = true;
            }
        }

        steer(intent, hold_line(player, self.lane))
    }
}

#[derive(Clone, Debug, Default)]
pub struct BrawlerRider;

impl RiderBot for BrawlerRider {
    fn id(&self) -> &'static str {
        "brawler"
    }

    fn description(&self) -> &'static str {
        "Hunts the nearest upright bike ahead and swings at it in range"
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_intent(&mut self, view: &RiderView<'_>) -> PlayerIntent {
        let player = view.player;
        let target = view
            .opponents()
            .filter(|pose| pose.mode != Mode::Crashed)
            .map(|pose| (pose, pose.position.z - player.position.z))
            .filter(|(_, gap)| (-1.0..=20.0).contains(gap))
            .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));

        let Some((target, gap)) = target else {
            return steer(THROTTLE, hold_line(player, 0.0));
        };

        let close = gap.abs() < 2.0 && (target.position.x - player.position.x).abs() < 1.2;
        let intent = PlayerIntent {
            attack: close && player.mode == Mode::Normal && player.attack_cooldown <= 0.0,
            ..THROTTLE
        };
        steer(intent, hold_line(player, target.position.x))
    }
}

#[derive(Clone, Debug)]
pub struct WeaverRider {
    rng: SeededRng,
    lane: f32,
    hold_ticks: u32,
}

impl Default for WeaverRider {
    fn default() -> Self {
        Self {
            rng: SeededRng::new(1),
            lane: 0.0,
            hold_ticks: 0,
        }
    }
}

impl RiderBot for WeaverRider {
    fn id(&self) -> &'static str {
        "weaver"
    }

    fn description(&self) -> &'static str {
        "Full throttle, drifting to a fresh random lane every one to three seconds"
    }

    fn reset(&mut self, seed: u32) {
        // Decorrelate from the race's own stream, which uses the same seed.
        self.rng = SeededRng::new(seed ^ 0x9E37_79B9);
        self.lane = 0.0;
        self.hold_ticks = 0;
    }

    fn next_intent(&mut self, view: &RiderView<'_>) -> PlayerIntent {
        if self.hold_ticks == 0 {
            self.lane = self.rng.range_f32(-SAFE_LANE, SAFE_LANE);
            self.hold_ticks = 60 + self.rng.next_int(120);
        }
        self.hold_ticks -= 1;
        steer(THROTTLE, hold_line(view.player, self.lane))
    }
}

const RIDER_IDS: [&str; 4] = ["full-throttle", "cautious", "brawler", "weaver"];

pub fn rider_ids() -> &'static [&'static str] {
    &RIDER_IDS
}

pub fn create_rider(id: &str) -> Option<Box<dyn RiderBot>> {
    match id {
        "full-throttle" => Some(Box::new(FullThrottleRider)),
        "cautious" => Some(Box::new(CautiousRider::default())),
        "brawler" => Some(Box::new(BrawlerRider)),
        "weaver" => Some(Box::new(WeaverRider::default())),
        _ => None,
    }
}

pub fn describe_riders() -> Vec<(&'static str, &'static str)> {
    RIDER_IDS
        .iter()
        .filter_map(|id| create_rider(id))
        .map(|rider| (rider.id(), rider.description()))
        .collect()
}
