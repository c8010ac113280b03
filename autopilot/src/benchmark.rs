use crate::config::{RaceSeed, RunnerPolicy, SeedPlan};
use crate::host::{run_race, RunMetrics};
use crate::riders::{create_rider, rider_ids};
use anyhow::{anyhow, Context, Result};
use race_core::{RaceConfig, RaceOutcome};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Score,
    Finish,
    Survival,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        let finished = if metrics.finished() { 1.0 } else { 0.0 };
        let upright = if metrics.wrecked() { 0.0 } else { 1.0 };
        match self {
            Self::Score => {
                (metrics.final_score as f64) * 1.0 + (metrics.final_health as f64) * 0.5
            }
            Self::Finish => {
                finished * 1_000.0 + (metrics.final_distance as f64) * 0.25
                    - (metrics.elapsed_s as f64) * 2.0
            }
            Self::Survival => {
                upright * 500.0
                    + (metrics.final_health as f64) * 10.0
                    + (metrics.final_distance as f64) * 0.05
                    - (metrics.crashed_ticks as f64) * 0.1
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Finish => "finish",
            Self::Survival => "survival",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub riders: Vec<String>,
    pub seeds: SeedPlan,
    pub race: RaceConfig,
    pub runner: RunnerPolicy,
    pub max_ticks: u32,
    pub objective: Objective,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub rider_id: String,
    pub seed: u32,
    pub seed_hex: String,
    pub tick_count: u32,
    pub final_score: i32,
    pub final_distance: f32,
    pub final_health: f32,
    pub final_position: u32,
    pub outcome: Option<RaceOutcome>,
    pub objective_value: f64,
    pub attack_ticks: u32,
    pub crashed_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiderAggregate {
    pub rider_id: String,
    pub runs: usize,
    pub avg_score: f64,
    pub max_score: i32,
    pub avg_distance: f64,
    pub avg_ticks: f64,
    pub avg_health: f64,
    pub avg_position: f64,
    pub finish_rate: f64,
    pub wreck_rate: f64,
    pub objective_value: f64,
    pub avg_attack_ticks: f64,
    pub avg_crashed_ticks: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub objective: Objective,
    pub difficulty: u32,
    pub vehicle: String,
    pub max_ticks: u32,
    pub frame_hz: u32,
    pub jobs: Option<usize>,
    pub riders: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub rider_rankings: Vec<RiderAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_riders(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(rider_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let mut riders = Vec::new();
            for token in raw.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                if create_rider(token).is_none() {
                    let available = rider_ids().join(", ");
                    return Err(anyhow!("unknown rider '{token}'. available: {available}"));
                }
                riders.push(token.to_string());
            }
            if riders.is_empty() {
                return Err(anyhow!("--riders resolved to empty list"));
            }
            Ok(riders)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    let seeds = config.seeds.resolve().context("benchmark requires at least one seed")?;
    if config.riders.is_empty() {
        return Err(anyhow!("benchmark requires at least one rider"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    config.race.validate().context("invalid benchmark race config")?;

    let run_jobs: Vec<(String, u32)> = config
        .riders
        .iter()
        .flat_map(|rider| seeds.iter().map(move |seed| (rider.clone(), *seed)))
        .collect();

    tracing::info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark started"
    );

    let run_one = |(rider_id, seed): &(String, u32)| -> Result<(RunMetrics, f64)> {
        let artifact = run_race(rider_id, *seed, &config.race, config.runner, config.max_ticks)
            .with_context(|| format!("benchmark run failed for rider={rider_id} seed={seed:#x}"))?;
        let objective_value = config.objective.run_value(&artifact.metrics);
        Ok((artifact.metrics, objective_value))
    };

    let run_results: Vec<Result<(RunMetrics, f64)>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let rankings = rank_riders(&runs);

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|(metrics, objective_value)| RunRecord {
            rider_id: metrics.rider_id.clone(),
            seed: metrics.seed,
            seed_hex: RaceSeed(metrics.seed).to_string(),
            tick_count: metrics.tick_count,
            final_score: metrics.final_score,
            final_distance: metrics.final_distance,
            final_health: metrics.final_health,
            final_position: metrics.final_position,
            outcome: metrics.outcome,
            objective_value: *objective_value,
            attack_ticks: metrics.attack_ticks,
            crashed_ticks: metrics.crashed_ticks,
        })
        .collect();

    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.final_score.cmp(&a.final_score))
            .then_with(|| a.rider_id.cmp(&b.rider_id))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    Ok(BenchmarkReport {
        objective: config.objective,
        difficulty: config.race.difficulty,
        vehicle: config.race.vehicle,
        max_ticks: config.max_ticks,
        frame_hz: config.runner.frame_hz,
        jobs: config.jobs,
        riders: config.riders,
        seeds,
        run_count: run_records.len(),
        rider_rankings: rankings,
        runs: run_records,
    })
}

fn rank_riders(runs: &[(RunMetrics, f64)]) -> Vec<RiderAggregate> {
    let mut grouped: HashMap<&str, Vec<&(RunMetrics, f64)>> = HashMap::new();
    for run in runs {
        grouped.entry(run.0.rider_id.as_str()).or_default().push(run);
    }

    let mut rankings = Vec::with_capacity(grouped.len());
    for (rider_id, rider_runs) in grouped {
        let count = rider_runs.len() as f64;
        let mean = |value: fn(&RunMetrics) -> f64| {
            rider_runs.iter().map(|(metrics, _)| value(metrics)).sum::<f64>() / count
        };
        let rate = |hit: fn(&RunMetrics) -> bool| {
            rider_runs.iter().filter(|(metrics, _)| hit(metrics)).count() as f64 / count
        };

        rankings.push(RiderAggregate {
            rider_id: rider_id.to_string(),
            runs: rider_runs.len(),
            avg_score: mean(|m| m.final_score as f64),
            max_score: rider_runs
                .iter()
                .map(|(metrics, _)| metrics.final_score)
                .max()
                .unwrap_or_default(),
            avg_distance: mean(|m| m.final_distance as f64),
            avg_ticks: mean(|m| m.tick_count as f64),
            avg_health: mean(|m| m.final_health as f64),
            avg_position: mean(|m| m.final_position as f64),
            finish_rate: rate(RunMetrics::finished),
            wreck_rate: rate(RunMetrics::wrecked),
            objective_value: rider_runs.iter().map(|(_, value)| *value).sum::<f64>() / count,
            avg_attack_ticks: mean(|m| m.attack_ticks as f64),
            avg_crashed_ticks: mean(|m| m.crashed_ticks as f64),
        });
    }

    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_score.total_cmp(&a.avg_score))
            .then_with(|| a.rider_id.cmp(&b.rider_id))
    });
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_race() -> RaceConfig {
        RaceConfig {
            race_duration_s: 10.0,
            finish_distance_m: 150.0,
            ..RaceConfig::default()
        }
    }

    #[test]
    fn resolve_riders_defaults_to_roster_and_rejects_unknown() {
        assert_eq!(resolve_riders(None).expect("roster").len(), rider_ids().len());
        assert_eq!(
            resolve_riders(Some("weaver, brawler")).expect("csv"),
            vec!["weaver".to_string(), "brawler".to_string()]
        );
        assert!(resolve_riders(Some("weaver,ghost")).is_err());
        assert!(resolve_riders(Some(" , ")).is_err());
    }

    #[test]
    fn benchmark_covers_every_pair_and_ranks_descending() {
        let report = run_benchmark(BenchmarkConfig {
            riders: vec!["full-throttle".to_string(), "cautious".to_string()],
            seeds: SeedPlan::Listed(vec![1, 2, 3]),
            race: short_race(),
            runner: RunnerPolicy::default(),
            max_ticks: 1_200,
            objective: Objective::Finish,
            jobs: Some(2),
        })
        .expect("benchmark");

        assert_eq!(report.run_count, 6);
        assert_eq!(report.rider_rankings.len(), 2);
        assert!(report
            .rider_rankings
            .windows(2)
            .all(|pair| pair[0].objective_value >= pair[1].objective_value));
        for rider in &report.rider_rankings {
            assert_eq!(rider.runs, 3);
            assert!((0.0..=1.0).contains(&rider.finish_rate));
            assert!(rider.finish_rate + rider.wreck_rate <= 1.0);
        }
    }

    #[test]
    fn benchmark_is_independent_of_thread_count() {
        let config = |jobs| BenchmarkConfig {
            riders: vec!["weaver".to_string()],
            seeds: SeedPlan::Listed(vec![0xA1, 0xB2]),
            race: short_race(),
            runner: RunnerPolicy::default(),
            max_ticks: 600,
            objective: Objective::Score,
            jobs,
        };
        let single = run_benchmark(config(Some(1))).expect("single");
        let pooled = run_benchmark(config(None)).expect("pooled");
        let scores = |report: &BenchmarkReport| {
            report
                .runs
                .iter()
                .map(|run| (run.seed, run.final_score, run.tick_count))
                .collect::<Vec<_>>()
        };
        assert_eq!(scores(&single), scores(&pooled));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let err = run_benchmark(BenchmarkConfig {
            riders: vec!["weaver".to_string()],
            seeds: SeedPlan::Listed(vec![1]),
            race: short_race(),
            runner: RunnerPolicy::default(),
            max_ticks: 10,
            objective: Objective::Score,
            jobs: Some(0),
        })
        .expect_err("zero jobs");
        assert!(err.to_string().contains("--jobs"));
    }

    #[test]
    fn walk_plan_seeds_every_run_and_labels_them_in_hex() {
        let plan = SeedPlan::Walk { start: 0x42, count: 2 };
        let expected = plan.resolve().expect("walk");
        let report = run_benchmark(BenchmarkConfig {
            riders: vec!["cautious".to_string()],
            seeds: plan,
            race: short_race(),
            runner: RunnerPolicy::default(),
            max_ticks: 60,
            objective: Objective::Survival,
            jobs: Some(1),
        })
        .expect("benchmark");
        assert_eq!(report.seeds, expected);
        for run in &report.runs {
            assert_eq!(run.seed_hex, format!("{:#010x}", run.seed));
        }

        let err = run_benchmark(BenchmarkConfig {
            riders: vec!["weaver".to_string()],
            seeds: SeedPlan::Walk { start: 1, count: 0 },
            race: short_race(),
            runner: RunnerPolicy::default(),
            max_ticks: 10,
            objective: Objective::Score,
            jobs: None,
        })
        .expect_err("empty walk");
        assert!(err.to_string().contains("at least one seed"));
    }
}
