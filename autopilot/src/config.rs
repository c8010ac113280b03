use crate::host::clamp_frame_dt;
use anyhow::{anyhow, Context, Result};
use race_core::rng::SeededRng;
use race_core::RaceConfig;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_FRAME_HZ: u32 = 60;
/// Longest frame the host will forward to the core.
pub const DEFAULT_MAX_DT_MS: u32 = 100;
pub const DEFAULT_WALK_START: u32 = 0x5EED_0001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunnerPolicy {
    pub frame_hz: u32,
    pub max_dt_ms: u32,
}

impl Default for RunnerPolicy {
    fn default() -> Self {
        Self {
            frame_hz: DEFAULT_FRAME_HZ,
            max_dt_ms: DEFAULT_MAX_DT_MS,
        }
    }
}

impl RunnerPolicy {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let frame_hz = read_u32(&lookup, "AUTOPILOT_FRAME_HZ", DEFAULT_FRAME_HZ);
        let mut max_dt_ms = read_u32(&lookup, "AUTOPILOT_MAX_DT_MS", DEFAULT_MAX_DT_MS);

        if max_dt_ms > DEFAULT_MAX_DT_MS {
            tracing::warn!(
                "AUTOPILOT_MAX_DT_MS ({}) exceeds the {} ms tick cap. Falling back to default.",
                max_dt_ms,
                DEFAULT_MAX_DT_MS
            );
            max_dt_ms = DEFAULT_MAX_DT_MS;
        }

        Self {
            frame_hz,
            max_dt_ms,
        }
    }

    /// Fixed per-tick delta in seconds.
    pub fn frame_dt(&self) -> f32 {
        clamp_frame_dt(1000.0 / self.frame_hz.max(1) as f32, self.max_dt_ms)
    }
}

fn read_u32<F>(lookup: &F, name: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => value,
        _ => {
            tracing::warn!("{name}={raw:?} is not a positive integer. Using default {default}.");
            default
        }
    }
}

/// Reads a race setup from JSON. Missing fields take their defaults.
pub fn load_race_config(path: &Path) -> Result<RaceConfig> {
    let data = fs::read(path)
        .with_context(|| format!("failed reading race config {}", path.display()))?;
    let config: RaceConfig = serde_json::from_slice(&data)
        .with_context(|| format!("failed parsing race config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid race config {}", path.display()))?;
    Ok(config)
}

/// A race seed as written by people: decimal or `0x` hex. Displays as
/// zero-padded hex so logs and reports line up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RaceSeed(pub u32);

impl FromStr for RaceSeed {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let text = raw.trim();
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(digits) => u32::from_str_radix(digits, 16),
            None => text.parse::<u32>(),
        };
        parsed
            .map(Self)
            .map_err(|_| anyhow!("seed '{text}' is neither decimal nor 0x-prefixed hex"))
    }
}

impl fmt::Display for RaceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Where a batch of races gets its seeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedPlan {
    Listed(Vec<u32>),
    /// Seeds separated by whitespace or commas. `#` starts a comment.
    File(PathBuf),
    /// `count` seeds drawn from the race RNG seeded with `start`.
    Walk { start: u32, count: u32 },
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self::Walk {
            start: DEFAULT_WALK_START,
            count: 12,
        }
    }
}

impl SeedPlan {
    pub fn resolve(&self) -> Result<Vec<u32>> {
        let seeds = match self {
            Self::Listed(seeds) => seeds.clone(),
            Self::File(path) => read_seed_file(path)?,
            Self::Walk { start, count } => {
                let mut rng = SeededRng::new(*start);
                (0..*count).map(|_| rng.next()).collect()
            }
        };
        if seeds.is_empty() {
            return Err(anyhow!("seed plan {self:?} produced no seeds"));
        }
        Ok(seeds)
    }
}

fn read_seed_file(path: &Path) -> Result<Vec<u32>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<RaceSeed>()
                .map(|seed| seed.0)
                .with_context(|| format!("bad seed in {}", path.display()))
        })
        .collect()
}
