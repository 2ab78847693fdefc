//! Core data types exchanged with the loader, exporter and plotting layers.

use pyo3::prelude::*;
use std::collections::HashMap;

/// A task record as produced by the loader.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Task {
    #[pyo3(get, set)]
    pub task_id: u32,
    #[pyo3(get, set)]
    pub role: String,
    #[pyo3(get, set)]
    pub dependencies: Vec<u32>,
    #[pyo3(get, set)]
    pub mean: f64,
    #[pyo3(get, set)]
    pub stddev: f64,
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (task_id, role, dependencies, mean, stddev))]
    fn py_new(task_id: u32, role: String, dependencies: Vec<u32>, mean: f64, stddev: f64) -> Self {
        Self::new(task_id, role, dependencies, mean, stddev)
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(task_id={}, role={:?}, deps={:?}, mean={}, stddev={})",
            self.task_id, self.role, self.dependencies, self.mean, self.stddev
        )
    }
}

impl Task {
    pub fn new(
        task_id: u32,
        role: impl Into<String>,
        dependencies: Vec<u32>,
        mean: f64,
        stddev: f64,
    ) -> Self {
        Self {
            task_id,
            role: role.into(),
            dependencies,
            mean,
            stddev,
        }
    }
}

/// A task with both its planned and real timelines populated.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    #[pyo3(get)]
    pub task_id: u32,
    #[pyo3(get)]
    pub role: String,
    #[pyo3(get)]
    pub dependencies: Vec<u32>,
    #[pyo3(get)]
    pub mean: f64,
    #[pyo3(get)]
    pub stddev: f64,
    #[pyo3(get)]
    pub planned_duration: f64,
    #[pyo3(get)]
    pub planned_start_time: f64,
    #[pyo3(get)]
    pub planned_end_time: f64,
    #[pyo3(get)]
    pub real_duration: f64,
    #[pyo3(get)]
    pub real_start_time: f64,
    #[pyo3(get)]
    pub real_end_time: f64,
}

#[pymethods]
impl ScheduledTask {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledTask(task_id={}, role={:?}, planned=[{:.2}, {:.2}], real=[{:.2}, {:.2}])",
            self.task_id,
            self.role,
            self.planned_start_time,
            self.planned_end_time,
            self.real_start_time,
            self.real_end_time
        )
    }
}

/// Aggregate statistics of one Monte Carlo batch.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct PercentileSummary {
    #[pyo3(get)]
    pub percentile: f64,
    #[pyo3(get)]
    pub n_iter: usize,
    #[pyo3(get)]
    pub seed: u64,
    #[pyo3(get)]
    pub mean_duration: f64,
    #[pyo3(get)]
    pub stddev_duration: f64,
    /// Mean idle days per role; a role missing from a trial counts as zero.
    #[pyo3(get)]
    pub mean_idle_by_role: HashMap<String, f64>,
    /// Mean over trials of the summed idle days of all roles.
    #[pyo3(get)]
    pub mean_total_idle: f64,
}

#[pymethods]
impl PercentileSummary {
    fn __repr__(&self) -> String {
        format!(
            "PercentileSummary(percentile={}, n_iter={}, mean_duration={:.2}, mean_total_idle={:.2})",
            self.percentile, self.n_iter, self.mean_duration, self.mean_total_idle
        )
    }
}

/// Buffer sizing for one (task percentile, project percentile) pair.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct BufferEstimate {
    #[pyo3(get)]
    pub task_percentile: f64,
    #[pyo3(get)]
    pub project_percentile: f64,
    /// Planned finish of the deterministic baseline, `max(planned_end)`.
    #[pyo3(get)]
    pub planned_duration: f64,
    #[pyo3(get)]
    pub buffer: f64,
    #[pyo3(get)]
    pub mean_duration: f64,
    /// `mean_duration + buffer`.
    #[pyo3(get)]
    pub buffered_duration: f64,
}

#[pymethods]
impl BufferEstimate {
    fn __repr__(&self) -> String {
        format!(
            "BufferEstimate(task_percentile={}, project_percentile={}, buffer={:.2})",
            self.task_percentile, self.project_percentile, self.buffer
        )
    }
}

impl BufferEstimate {
    /// Sentinel for a cell whose batch failed; every number is NaN.
    pub fn failed(task_percentile: f64, project_percentile: f64) -> Self {
        Self {
            task_percentile,
            project_percentile,
            planned_duration: f64::NAN,
            buffer: f64::NAN,
            mean_duration: f64::NAN,
            buffered_duration: f64::NAN,
        }
    }

    /// Whether this cell holds a failure sentinel.
    pub fn is_failed(&self) -> bool {
        self.buffer.is_nan()
    }
}
