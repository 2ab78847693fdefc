//! Project buffer estimation.

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::models::BufferEstimate;
use crate::monte_carlo::{monte_carlo_simulation, percentile_sweep, TrialBatch};
use crate::project::Project;

/// Linearly interpolated `q`-quantile of `samples`, `q` in [0, 1].
///
/// Uses the `(n - 1) * q` rank with interpolation between neighbours.
pub fn quantile(samples: &[f64], q: f64) -> Result<f64, SimulationError> {
    if !(0.0..=1.0).contains(&q) {
        return Err(SimulationError::InvalidPercentile(q));
    }
    if samples.is_empty() {
        return Err(SimulationError::EmptySample);
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(SimulationError::NonFiniteSample);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Buffer that covers `percentile_project` of the simulated overruns.
///
/// Each trial's overrun is `max(0, duration - planned_duration)`; finishing
/// early never shrinks the buffer below zero.
///
/// # Arguments
/// * `durations` - Simulated project durations
/// * `planned_duration` - Planned finish of the baseline at the same task percentile
/// * `percentile_project` - Target on-time confidence, in [0, 1]
pub fn calculate_buffer(
    durations: &[f64],
    planned_duration: f64,
    percentile_project: f64,
) -> Result<f64, SimulationError> {
    // f64::max swallows NaN, so reject it before flooring
    if !planned_duration.is_finite() || durations.iter().any(|d| !d.is_finite()) {
        return Err(SimulationError::NonFiniteSample);
    }
    let overruns: Vec<f64> = durations
        .iter()
        .map(|&d| (d - planned_duration).max(0.0))
        .collect();
    quantile(&overruns, percentile_project)
}

/// Buffer estimate for one project percentile from an existing batch.
pub fn estimate_from_batch(
    batch: &TrialBatch,
    percentile_project: f64,
) -> Result<BufferEstimate, SimulationError> {
    let durations = batch.durations();
    let buffer = calculate_buffer(&durations, batch.planned_duration, percentile_project)?;
    let mean_duration = durations.iter().sum::<f64>() / durations.len() as f64;
    Ok(BufferEstimate {
        task_percentile: batch.percentile,
        project_percentile: percentile_project,
        planned_duration: batch.planned_duration,
        buffer,
        mean_duration,
        buffered_duration: mean_duration + buffer,
    })
}

/// Plan at `percentile_tasks`, simulate at the same percentile, and size the
/// buffer for `percentile_project`.
pub fn project_buffer(
    project: &Project,
    percentile_tasks: f64,
    percentile_project: f64,
    n_iter: usize,
    seed: Option<u64>,
    config: &SimulationConfig,
) -> Result<BufferEstimate, SimulationError> {
    let batch = monte_carlo_simulation(project, percentile_tasks, n_iter, seed, config)?;
    estimate_from_batch(&batch, percentile_project)
}

/// Buffer estimates for every (task percentile, project percentile) pair.
///
/// Rows follow `task_percentiles`, columns follow `project_percentiles`. One
/// batch per task percentile is shared across its row. Failed cells are logged
/// and hold NaN sentinels.
pub fn buffer_grid(
    project: &Project,
    task_percentiles: &[f64],
    project_percentiles: &[f64],
    n_iter: usize,
    seed: Option<u64>,
    config: &SimulationConfig,
) -> Vec<Vec<BufferEstimate>> {
    percentile_sweep(project, task_percentiles, n_iter, seed, config)
        .into_iter()
        .map(|(task_percentile, batch)| {
            project_percentiles
                .iter()
                .map(|&project_percentile| {
                    let estimate = batch
                        .as_ref()
                        .map_err(Clone::clone)
                        .and_then(|batch| estimate_from_batch(batch, project_percentile));
                    estimate.unwrap_or_else(|err| {
                        tracing::warn!(
                            task_percentile,
                            project_percentile,
                            error = %err,
                            "buffer grid cell failed"
                        );
                        BufferEstimate::failed(task_percentile, project_percentile)
                    })
                })
                .collect()
        })
        .collect()
}
