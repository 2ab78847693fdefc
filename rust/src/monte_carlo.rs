//! Monte Carlo driver.
//!
//! Every trial gets its own seed derived from one top-level seed, its own
//! generator and its own `Schedule`; the static `Project` is shared read-only.
//! Trials (and sweep points) are therefore independent and run on the rayon
//! pool without any synchronization.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::config::SimulationConfig;
use crate::error::{SimulationError, TrialExecutionError};
use crate::idle::{IdleAttribution, IdleTime};
use crate::models::PercentileSummary;
use crate::project::{Project, RoleTable};
use crate::scheduler::TimelineScheduler;
use crate::{log_changes, log_checks};

/// Use the caller's seed, or draw a fresh one from OS entropy and log it.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::thread_rng().gen();
            tracing::info!(seed, "no seed supplied; generated one");
            seed
        }
    }
}

/// Derive `n` per-trial seeds from one top-level seed.
///
/// Trial `i` always gets the same seed for a given top-level seed, whatever
/// `n` is and in whatever order trials later run.
pub fn derive_trial_seeds(seed: u64, n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen()).collect()
}

/// Result of one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialOutcome {
    pub seed: u64,
    /// `max(real_end)` over all tasks.
    pub duration: f64,
    pub idle: IdleTime,
}

/// Run one trial: sample, schedule, attribute idle time.
pub fn run_trial(
    scheduler: &TimelineScheduler<'_>,
    attribution: IdleAttribution,
    seed: u64,
) -> Result<TrialOutcome, TrialExecutionError> {
    let schedule = scheduler.schedule(seed)?;
    Ok(TrialOutcome {
        seed,
        duration: schedule.project_duration(),
        idle: schedule.idle_time(attribution),
    })
}

/// All trials of one Monte Carlo run at a fixed target percentile.
#[derive(Clone, Debug)]
pub struct TrialBatch {
    pub percentile: f64,
    /// Top-level seed the trial seeds were derived from.
    pub seed: u64,
    /// Deterministic planned finish at the same percentile.
    pub planned_duration: f64,
    pub trials: Vec<TrialOutcome>,
}

impl TrialBatch {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Project durations in trial order.
    pub fn durations(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.duration).collect()
    }

    /// Idle mappings in trial order; roles that never idled are absent.
    pub fn idle_maps(&self, roles: &RoleTable) -> Vec<HashMap<String, f64>> {
        self.trials.iter().map(|t| t.idle.to_map(roles)).collect()
    }

    /// Mean duration, duration spread and mean idle time.
    pub fn summary(&self, roles: &RoleTable) -> PercentileSummary {
        let n = self.trials.len();
        if n == 0 {
            return PercentileSummary {
                percentile: self.percentile,
                seed: self.seed,
                ..PercentileSummary::default()
            };
        }
        let count = n as f64;

        let mean_duration = self.trials.iter().map(|t| t.duration).sum::<f64>() / count;
        let variance = self
            .trials
            .iter()
            .map(|t| (t.duration - mean_duration).powi(2))
            .sum::<f64>()
            / count;

        let mut idle_sums = vec![0.0; roles.len()];
        for trial in &self.trials {
            for (sum, days) in idle_sums.iter_mut().zip(trial.idle.by_role()) {
                *sum += days;
            }
        }
        let mean_total_idle = idle_sums.iter().sum::<f64>() / count;
        let mean_idle_by_role = roles
            .names()
            .iter()
            .zip(&idle_sums)
            .map(|(name, sum)| (name.clone(), sum / count))
            .collect();

        PercentileSummary {
            percentile: self.percentile,
            n_iter: n,
            seed: self.seed,
            mean_duration,
            stddev_duration: variance.sqrt(),
            mean_idle_by_role,
            mean_total_idle,
        }
    }
}

/// Run `n_iter` independent trials at `percentile`.
///
/// # Arguments
/// * `project` - Validated task set (shared read-only by all trials)
/// * `percentile` - Target percentile for planned durations, in (0, 1)
/// * `n_iter` - Number of trials, at least 1
/// * `seed` - Top-level seed; `None` draws one and records it in the batch
/// * `config` - Idle attribution, kickoff policy, parallelism, verbosity
///
/// # Errors
/// Fails the whole batch if any trial fails; partial results are discarded.
pub fn monte_carlo_simulation(
    project: &Project,
    percentile: f64,
    n_iter: usize,
    seed: Option<u64>,
    config: &SimulationConfig,
) -> Result<TrialBatch, SimulationError> {
    if n_iter == 0 {
        return Err(SimulationError::InvalidConfig(
            "n_iter must be at least 1".to_string(),
        ));
    }
    let attribution = config.attribution()?;
    let scheduler = TimelineScheduler::new(project, percentile, config)?;
    let seed = resolve_seed(seed);
    let trial_seeds = derive_trial_seeds(seed, n_iter);

    log_changes!(
        config.verbosity,
        "monte carlo: percentile={} n_iter={} seed={}",
        percentile,
        n_iter,
        seed
    );

    let run = |trial_seed: u64| {
        let outcome = run_trial(&scheduler, attribution, trial_seed);
        if let Ok(outcome) = &outcome {
            log_checks!(
                config.verbosity,
                "trial seed={} duration={:.2} idle={:.2}",
                trial_seed,
                outcome.duration,
                outcome.idle.total()
            );
        }
        outcome
    };

    let trials: Vec<TrialOutcome> = if config.parallel {
        trial_seeds.into_par_iter().map(run).collect::<Result<_, _>>()?
    } else {
        trial_seeds.into_iter().map(run).collect::<Result<_, _>>()?
    };

    let planned_duration = scheduler.planned_project_duration();

    log_changes!(
        config.verbosity,
        "monte carlo done: percentile={} planned={:.2}",
        percentile,
        planned_duration
    );

    Ok(TrialBatch {
        percentile,
        seed,
        planned_duration,
        trials,
    })
}

/// Run an independent batch for each target percentile.
///
/// Point `i` uses the `i`-th seed derived from the top-level seed. A failing
/// point yields an error for that point only.
pub fn percentile_sweep(
    project: &Project,
    percentiles: &[f64],
    n_iter: usize,
    seed: Option<u64>,
    config: &SimulationConfig,
) -> Vec<(f64, Result<TrialBatch, SimulationError>)> {
    let seed = resolve_seed(seed);
    let point_seeds = derive_trial_seeds(seed, percentiles.len());

    log_changes!(
        config.verbosity,
        "percentile sweep: {} points, n_iter={} seed={}",
        percentiles.len(),
        n_iter,
        seed
    );

    let run = |(&percentile, point_seed): (&f64, u64)| {
        let batch = monte_carlo_simulation(project, percentile, n_iter, Some(point_seed), config);
        (percentile, batch)
    };

    if config.parallel {
        percentiles
            .par_iter()
            .zip(point_seeds.into_par_iter())
            .map(run)
            .collect()
    } else {
        percentiles.iter().zip(point_seeds).map(run).collect()
    }
}
