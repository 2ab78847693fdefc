//! Error types for validation, scheduling and simulation.
//!
//! At the Python boundary each concern gets its own exception class (see
//! [`exceptions`]). Invalid input raises a `ValueError` subclass and a failed
//! trial raises a `RuntimeError` subclass. Task ids are `u32`, so a negative
//! `task_id` is rejected by PyO3 with `OverflowError` before validation runs.

use pyo3::exceptions::PyValueError;
use pyo3::PyErr;
use thiserror::Error;

/// Python exception classes registered on the extension module.
pub mod exceptions {
    use pyo3::create_exception;
    use pyo3::exceptions::{PyRuntimeError, PyValueError};

    create_exception!(
        rust,
        InvalidTaskError,
        PyValueError,
        "A task record cannot be scheduled."
    );
    create_exception!(
        rust,
        CyclicDependencyError,
        PyValueError,
        "The task dependencies contain a cycle."
    );
    create_exception!(
        rust,
        TrialExecutionError,
        PyRuntimeError,
        "A Monte Carlo trial failed."
    );
}

/// A task record that cannot be scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidTaskError {
    #[error("Task id must be positive, got {0}")]
    NonPositiveTaskId(u32),
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(u32),
    #[error("Task {task_id} depends on unknown task {dependency}")]
    UnknownDependency { task_id: u32, dependency: u32 },
    #[error("Task {0} depends on itself")]
    SelfDependency(u32),
    #[error("Task {task_id} has non-positive mean duration {mean}")]
    NonPositiveMean { task_id: u32, mean: f64 },
    #[error("Task {task_id} has negative duration stddev {stddev}")]
    NegativeStddev { task_id: u32, stddev: f64 },
    #[error("Task {0} has a non-finite duration parameter")]
    NonFiniteParameter(u32),
    #[error("Task {0} has an empty role")]
    EmptyRole(u32),
    #[error("Task {task_id} has degenerate planned duration {duration} at percentile {percentile}")]
    DegenerateDuration {
        task_id: u32,
        percentile: f64,
        duration: f64,
    },
}

/// The dependency graph contains at least one cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency detected; blocked tasks: {blocked:?}")]
pub struct CyclicDependencyError {
    /// Sorted ids of every task whose dependencies could never be satisfied.
    pub blocked: Vec<u32>,
}

/// A single Monte Carlo trial failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Trial failed (seed={seed}, percentile={percentile}, task={task_id}): {reason}")]
pub struct TrialExecutionError {
    pub seed: u64,
    pub percentile: f64,
    pub task_id: u32,
    pub reason: String,
}

/// Any error surfaced by the simulation core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidTask(#[from] InvalidTaskError),
    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependencyError),
    #[error(transparent)]
    TrialExecution(#[from] TrialExecutionError),
    #[error("Percentile out of range: {0}")]
    InvalidPercentile(f64),
    #[error("Cannot take a quantile of an empty sample")]
    EmptySample,
    #[error("Sample contains a non-finite value")]
    NonFiniteSample,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Python exception class an error is raised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PyErrorKind {
    InvalidTask,
    CyclicDependency,
    TrialExecution,
    Value,
}

impl SimulationError {
    fn py_kind(&self) -> PyErrorKind {
        match self {
            Self::InvalidTask(_) => PyErrorKind::InvalidTask,
            Self::CyclicDependency(_) => PyErrorKind::CyclicDependency,
            Self::TrialExecution(_) => PyErrorKind::TrialExecution,
            _ => PyErrorKind::Value,
        }
    }
}

impl From<SimulationError> for PyErr {
    fn from(err: SimulationError) -> Self {
        let message = err.to_string();
        match err.py_kind() {
            PyErrorKind::InvalidTask => exceptions::InvalidTaskError::new_err(message),
            PyErrorKind::CyclicDependency => exceptions::CyclicDependencyError::new_err(message),
            PyErrorKind::TrialExecution => exceptions::TrialExecutionError::new_err(message),
            PyErrorKind::Value => PyValueError::new_err(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_blocked_tasks() {
        let err = CyclicDependencyError {
            blocked: vec![1, 2],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected; blocked tasks: [1, 2]"
        );
    }

    #[test]
    fn test_transparent_wrapping() {
        let err: SimulationError = InvalidTaskError::DuplicateTaskId(4).into();
        assert_eq!(err.to_string(), "Duplicate task id: 4");
        assert!(matches!(
            err,
            SimulationError::InvalidTask(InvalidTaskError::DuplicateTaskId(4))
        ));
    }

    #[test]
    fn test_trial_error_carries_reproduction_context() {
        let err = TrialExecutionError {
            seed: 42,
            percentile: 0.5,
            task_id: 3,
            reason: "non-finite duration".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("seed=42"));
        assert!(message.contains("percentile=0.5"));
        assert!(message.contains("task=3"));
    }

    #[test]
    fn test_python_exception_per_concern() {
        let cycle: SimulationError = CyclicDependencyError { blocked: vec![1] }.into();
        let invalid: SimulationError = InvalidTaskError::SelfDependency(2).into();
        let trial: SimulationError = TrialExecutionError {
            seed: 1,
            percentile: 0.5,
            task_id: 1,
            reason: "zero".to_string(),
        }
        .into();

        assert_eq!(cycle.py_kind(), PyErrorKind::CyclicDependency);
        assert_eq!(invalid.py_kind(), PyErrorKind::InvalidTask);
        assert_eq!(trial.py_kind(), PyErrorKind::TrialExecution);
        assert_eq!(
            SimulationError::InvalidPercentile(2.0).py_kind(),
            PyErrorKind::Value
        );
        assert_eq!(SimulationError::EmptySample.py_kind(), PyErrorKind::Value);
    }
}
