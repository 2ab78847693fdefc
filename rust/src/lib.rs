//! Monte Carlo schedule-risk engine with a Python extension module.
//!
//! Estimates how long a project of stochastic, dependency-linked tasks really
//! takes when every role has a single unit of capacity, and how much buffer
//! must follow the planned finish to hit a target confidence.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

pub mod buffer;
mod config;
mod error;
pub mod graph;
pub mod idle;
pub mod logging;
mod models;
pub mod monte_carlo;
mod project;
pub mod sampler;
pub mod scheduler;

pub use buffer::{buffer_grid, calculate_buffer, estimate_from_batch, project_buffer, quantile};
pub use config::SimulationConfig;
pub use error::{CyclicDependencyError, InvalidTaskError, SimulationError, TrialExecutionError};
pub use graph::DependencyGraph;
pub use idle::{calculate_idle_time, IdleAttribution, IdleTime};
pub use models::{BufferEstimate, PercentileSummary, ScheduledTask, Task};
pub use monte_carlo::{
    derive_trial_seeds, monte_carlo_simulation, percentile_sweep, resolve_seed, run_trial,
    TrialBatch, TrialOutcome,
};
pub use project::{Project, RoleId, RoleTable};
pub use sampler::DurationSampler;
pub use scheduler::{
    build_schedule, calculate_planned_duration, calculate_project_duration, Schedule,
    TaskTiming, TimelineScheduler,
};

/// A schedule built for Python callers.
///
/// Owns its project so it can outlive the call that produced it.
#[pyclass(name = "Schedule")]
#[derive(Clone, Debug)]
pub struct PySchedule {
    project: Arc<Project>,
    timings: Vec<TaskTiming>,
    attribution: IdleAttribution,
    #[pyo3(get)]
    seed: u64,
    #[pyo3(get)]
    percentile: f64,
}

#[pymethods]
impl PySchedule {
    /// Scheduled tasks in input order.
    #[getter]
    fn tasks(&self) -> Vec<ScheduledTask> {
        scheduler::scheduled_tasks(&self.project, &self.timings)
    }

    fn project_duration(&self) -> f64 {
        calculate_project_duration(&self.timings)
    }

    fn planned_duration(&self) -> f64 {
        calculate_planned_duration(&self.timings)
    }

    fn idle_time(&self) -> HashMap<String, f64> {
        calculate_idle_time(&self.project, &self.timings, self.attribution)
            .to_map(self.project.roles())
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(tasks={}, percentile={}, seed={}, duration={:.2})",
            self.timings.len(),
            self.percentile,
            self.seed,
            self.project_duration()
        )
    }
}

/// Sample task durations and compute planned and real timelines.
///
/// # Arguments
/// * `tasks` - Task records (unique ids, known dependencies, acyclic)
/// * `percentile` - Target percentile for planned durations, in (0, 1)
/// * `seed` - Seed for the real duration draws (random if omitted)
/// * `config` - Simulation configuration
///
/// # Raises
/// * InvalidTaskError / CyclicDependencyError (both ValueError) for bad input
/// * ValueError for an out-of-range percentile
/// * TrialExecutionError (a RuntimeError) if a sampled duration is degenerate
#[pyfunction]
#[pyo3(name = "build_schedule", signature = (tasks, percentile, seed=None, config=None))]
fn py_build_schedule(
    py: Python<'_>,
    tasks: Vec<Task>,
    percentile: f64,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<PySchedule> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let attribution = config.attribution()?;
        let project = Project::new(tasks)?;
        let seed = resolve_seed(seed);
        let timings = build_schedule(&project, percentile, seed, &config)?.into_timings();
        Ok(PySchedule {
            project: Arc::new(project),
            timings,
            attribution,
            seed,
            percentile,
        })
    });
    Ok(result?)
}

/// Project finish of a schedule: the latest real end of any task.
#[pyfunction]
#[pyo3(name = "calculate_project_duration")]
fn py_calculate_project_duration(schedule: PyRef<'_, PySchedule>) -> f64 {
    schedule.project_duration()
}

/// Idle days per role; roles that never idled are absent.
#[pyfunction]
#[pyo3(name = "calculate_idle_time")]
fn py_calculate_idle_time(schedule: PyRef<'_, PySchedule>) -> HashMap<String, f64> {
    schedule.idle_time()
}

/// Run `n_iter` Monte Carlo trials at one target percentile.
///
/// # Returns
/// * `(durations, idle_by_role)` with one entry per trial
///
/// # Raises
/// * ValueError (or a subclass) for invalid input
/// * TrialExecutionError if any trial fails
#[pyfunction]
#[pyo3(name = "monte_carlo_simulation", signature = (tasks, percentile, n_iter, seed=None, config=None))]
fn py_monte_carlo_simulation(
    py: Python<'_>,
    tasks: Vec<Task>,
    percentile: f64,
    n_iter: usize,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<(Vec<f64>, Vec<HashMap<String, f64>>)> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let project = Project::new(tasks)?;
        let batch = monte_carlo_simulation(&project, percentile, n_iter, seed, &config)?;
        Ok((batch.durations(), batch.idle_maps(project.roles())))
    });
    Ok(result?)
}

/// Run one Monte Carlo batch per target percentile, in parallel.
///
/// # Returns
/// * List of `(percentile, durations, idle_by_role)` in input order
#[pyfunction]
#[pyo3(name = "parallel_monte_carlo_simulation", signature = (tasks, percentiles, n_iter, seed=None, config=None))]
#[allow(clippy::type_complexity)]
fn py_parallel_monte_carlo_simulation(
    py: Python<'_>,
    tasks: Vec<Task>,
    percentiles: Vec<f64>,
    n_iter: usize,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<Vec<(f64, Vec<f64>, Vec<HashMap<String, f64>>)>> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let project = Project::new(tasks)?;
        percentile_sweep(&project, &percentiles, n_iter, seed, &config)
            .into_iter()
            .map(|(percentile, batch)| -> Result<_, SimulationError> {
                let batch = batch?;
                Ok((
                    percentile,
                    batch.durations(),
                    batch.idle_maps(project.roles()),
                ))
            })
            .collect::<Result<Vec<_>, SimulationError>>()
    });
    Ok(result?)
}

/// Summaries (mean duration, mean idle per role) for each target percentile.
#[pyfunction]
#[pyo3(name = "percentile_analysis", signature = (tasks, percentiles, n_iter=1000, seed=None, config=None))]
fn py_percentile_analysis(
    py: Python<'_>,
    tasks: Vec<Task>,
    percentiles: Vec<f64>,
    n_iter: usize,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<Vec<PercentileSummary>> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let project = Project::new(tasks)?;
        percentile_sweep(&project, &percentiles, n_iter, seed, &config)
            .into_iter()
            .map(|(_, batch)| -> Result<_, SimulationError> {
                Ok(batch?.summary(project.roles()))
            })
            .collect::<Result<Vec<_>, SimulationError>>()
    });
    Ok(result?)
}

/// Buffer covering `percentile_project` of overruns beyond `planned_duration`.
///
/// # Raises
/// * ValueError if `durations` is empty or holds non-finite values
#[pyfunction]
#[pyo3(name = "calculate_buffer")]
fn py_calculate_buffer(
    durations: Vec<f64>,
    planned_duration: f64,
    percentile_project: f64,
) -> PyResult<f64> {
    Ok(calculate_buffer(&durations, planned_duration, percentile_project)?)
}

/// Plan at `percentile_tasks`, simulate, and size the project buffer.
#[pyfunction]
#[pyo3(name = "project_buffer", signature = (
    tasks,
    percentile_tasks=0.5,
    percentile_project=0.9,
    n_iter=1000,
    seed=None,
    config=None
))]
fn py_project_buffer(
    py: Python<'_>,
    tasks: Vec<Task>,
    percentile_tasks: f64,
    percentile_project: f64,
    n_iter: usize,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<BufferEstimate> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let project = Project::new(tasks)?;
        project_buffer(
            &project,
            percentile_tasks,
            percentile_project,
            n_iter,
            seed,
            &config,
        )
    });
    Ok(result?)
}

/// Buffer estimates for every task percentile × project percentile pair.
///
/// Failed cells hold NaN instead of raising.
#[pyfunction]
#[pyo3(name = "buffer_grid", signature = (
    tasks,
    task_percentiles,
    project_percentiles,
    n_iter=100,
    seed=None,
    config=None
))]
fn py_buffer_grid(
    py: Python<'_>,
    tasks: Vec<Task>,
    task_percentiles: Vec<f64>,
    project_percentiles: Vec<f64>,
    n_iter: usize,
    seed: Option<u64>,
    config: Option<SimulationConfig>,
) -> PyResult<Vec<Vec<BufferEstimate>>> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| -> Result<_, SimulationError> {
        let project = Project::new(tasks)?;
        Ok(buffer_grid(
            &project,
            &task_percentiles,
            &project_percentiles,
            n_iter,
            seed,
            &config,
        ))
    });
    Ok(result?)
}

/// The schedule_risk.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<ScheduledTask>()?;
    m.add_class::<PySchedule>()?;
    m.add_class::<PercentileSummary>()?;
    m.add_class::<BufferEstimate>()?;

    // Config types
    m.add_class::<SimulationConfig>()?;

    // Exceptions
    let py = m.py();
    m.add(
        "InvalidTaskError",
        py.get_type_bound::<error::exceptions::InvalidTaskError>(),
    )?;
    m.add(
        "CyclicDependencyError",
        py.get_type_bound::<error::exceptions::CyclicDependencyError>(),
    )?;
    m.add(
        "TrialExecutionError",
        py.get_type_bound::<error::exceptions::TrialExecutionError>(),
    )?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_build_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_calculate_project_duration, m)?)?;
    m.add_function(wrap_pyfunction!(py_calculate_idle_time, m)?)?;
    m.add_function(wrap_pyfunction!(py_monte_carlo_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(py_parallel_monte_carlo_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(py_percentile_analysis, m)?)?;
    m.add_function(wrap_pyfunction!(py_calculate_buffer, m)?)?;
    m.add_function(wrap_pyfunction!(py_project_buffer, m)?)?;
    m.add_function(wrap_pyfunction!(py_buffer_grid, m)?)?;

    Ok(())
}
