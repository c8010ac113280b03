use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use race_autopilot::benchmark::{resolve_riders, run_benchmark, BenchmarkConfig, Objective};
use race_autopilot::config::{
    load_race_config, RaceSeed, RunnerPolicy, SeedPlan, DEFAULT_WALK_START,
};
use race_autopilot::host::{run_race, verify_replay};
use race_autopilot::riders::describe_riders;
use race_core::profile::{Difficulty, VehicleProfile};
use race_core::RaceConfig;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "race-autopilot")]
#[command(about = "Headless race host: scripted riders, single races and multi-seed benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Race setup shared by every command that starts races.
#[derive(Args, Debug)]
struct RaceArgs {
    /// JSON race config; the flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Level number or one of easy, normal, hard
    #[arg(long)]
    difficulty: Option<String>,
    /// Vehicle preset id
    #[arg(long)]
    vehicle: Option<String>,
    #[arg(long)]
    duration_s: Option<f32>,
    #[arg(long)]
    finish_m: Option<f32>,
}

impl RaceArgs {
    fn resolve(self) -> Result<RaceConfig> {
        let mut config = match &self.config {
            Some(path) => load_race_config(path)?,
            None => RaceConfig::default(),
        };
        if let Some(raw) = self.difficulty.as_deref() {
            config.difficulty = parse_difficulty(raw)?;
        }
        if let Some(vehicle) = self.vehicle {
            if VehicleProfile::preset(&vehicle).is_none() {
                let available = VehicleProfile::preset_ids().collect::<Vec<_>>().join(", ");
                return Err(anyhow!("unknown vehicle '{vehicle}'. available: {available}"));
            }
            config.vehicle = vehicle;
            config.custom_vehicle = None;
        }
        if let Some(duration_s) = self.duration_s {
            config.race_duration_s = duration_s;
        }
        if let Some(finish_m) = self.finish_m {
            config.finish_distance_m = finish_m;
        }
        config.validate().context("invalid race setup")?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available riders
    ListRiders,
    /// List vehicle presets with their derived stats
    ListVehicles,
    /// Run a single race with one rider
    Race {
        #[arg(long)]
        rider: String,
        /// Decimal or 0x-prefixed hex
        #[arg(long)]
        seed: RaceSeed,
        #[command(flatten)]
        race: RaceArgs,
        #[arg(long, default_value_t = 12_000)]
        max_ticks: u32,
        /// Re-run the recorded inputs through the strict replay afterwards
        #[arg(long, default_value_t = false)]
        verify: bool,
        /// Print run metrics as JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run multi-seed benchmark across one or more riders
    Benchmark {
        #[arg(long)]
        riders: Option<String>,
        /// Comma-separated seeds
        #[arg(long, value_delimiter = ',', conflicts_with = "seed_file")]
        seeds: Vec<RaceSeed>,
        /// File of seeds, one or more per line, `#` comments allowed
        #[arg(long)]
        seed_file: Option<PathBuf>,
        /// Start of the seed walk used when no seeds are given
        #[arg(long)]
        seed_start: Option<RaceSeed>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[command(flatten)]
        race: RaceArgs,
        #[arg(long, default_value_t = 12_000)]
        max_ticks: u32,
        #[arg(long, value_enum, default_value_t = CliObjective::Score)]
        objective: CliObjective,
        #[arg(long)]
        jobs: Option<usize>,
        /// Print the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Score,
    Finish,
    Survival,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Score => Objective::Score,
            CliObjective::Finish => Objective::Finish,
            CliObjective::Survival => Objective::Survival,
        }
    }
}

fn parse_difficulty(raw: &str) -> Result<u32> {
    if let Some(level) = Difficulty::from_name(raw.trim()) {
        return Ok(level.level());
    }
    raw.trim().parse::<u32>().with_context(|| {
        format!("invalid difficulty '{raw}': expected a number or easy/normal/hard")
    })
}

fn seed_plan(
    seeds: Vec<RaceSeed>,
    seed_file: Option<PathBuf>,
    seed_start: Option<RaceSeed>,
    seed_count: u32,
) -> SeedPlan {
    if let Some(path) = seed_file {
        return SeedPlan::File(path);
    }
    if !seeds.is_empty() {
        return SeedPlan::Listed(seeds.into_iter().map(|seed| seed.0).collect());
    }
    SeedPlan::Walk {
        start: seed_start.map_or(DEFAULT_WALK_START, |seed| seed.0),
        count: seed_count,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let Cli { command } = Cli::parse();
    let runner = RunnerPolicy::from_env();

    match command {
        Commands::ListRiders => {
            for (id, description) in describe_riders() {
                println!("{id:16} {description}");
            }
        }
        Commands::ListVehicles => {
            for id in VehicleProfile::preset_ids() {
                let profile = VehicleProfile::lookup(id);
                let stats = profile.player_stats();
                println!(
                    "{id:10} max_speed={:.0}km/h accel={:.0} turn={:.2} braking={:.0} damage_x={:.2}",
                    stats.max_speed,
                    stats.acceleration,
                    stats.turn_rate,
                    stats.braking_force,
                    stats.damage_multiplier,
                );
            }
        }
        Commands::Race {
            rider,
            seed,
            race,
            max_ticks,
            verify,
            json,
        } => {
            let config = race.resolve()?;
            let artifact = run_race(&rider, seed.0, &config, runner, max_ticks)?;
            if verify {
                verify_replay(&config, &artifact)?;
            }

            let metrics = &artifact.metrics;
            if json {
                println!("{}", serde_json::to_string_pretty(metrics)?);
            } else {
                println!("rider={}", metrics.rider_id);
                println!("player={}", metrics.player_name);
                println!("seed={}", RaceSeed(metrics.seed));
                println!("difficulty={}", metrics.difficulty);
                println!("vehicle={}", metrics.vehicle);
                println!("ticks={}", metrics.tick_count);
                println!("elapsed_s={:.2}", metrics.elapsed_s);
                println!("score={}", metrics.final_score);
                println!("distance_m={:.1}", metrics.final_distance);
                println!("health={:.1}", metrics.final_health);
                println!("position={}", metrics.final_position);
                println!(
                    "outcome={}",
                    metrics
                        .outcome
                        .map(|outcome| format!("{outcome:?}"))
                        .unwrap_or_else(|| "unfinished".to_string())
                );
                println!("rng={:#010x}", metrics.final_rng_state);
                if verify {
                    println!("replay=verified");
                }
            }
        }
        Commands::Benchmark {
            riders,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            race,
            max_ticks,
            objective,
            jobs,
            json,
        } => {
            let riders = resolve_riders(riders.as_deref())?;
            let objective: Objective = objective.into();

            let report = run_benchmark(BenchmarkConfig {
                riders,
                seeds: seed_plan(seeds, seed_file, seed_start, seed_count),
                race: race.resolve()?,
                runner,
                max_ticks,
                objective,
                jobs,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("objective={}", objective.as_str());
            println!("difficulty={}", report.difficulty);
            println!("vehicle={}", report.vehicle);
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("rankings:");
            for (idx, rider) in report.rider_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  objective={:.2} avg_score={:.1} avg_distance={:.1} avg_position={:.2} finish={:.0}% wrecked={:.0}%",
                    idx + 1,
                    rider.rider_id,
                    rider.objective_value,
                    rider.avg_score,
                    rider.avg_distance,
                    rider.avg_position,
                    rider.finish_rate * 100.0,
                    rider.wreck_rate * 100.0,
                );
            }
        }
    }

    Ok(())
}
