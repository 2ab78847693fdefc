//! Configuration types for the simulation core.

use pyo3::prelude::*;

use crate::error::SimulationError;
use crate::idle::IdleAttribution;

/// Knobs shared by single schedules, Monte Carlo batches and sweeps.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Idle-time semantics: "cross_role" or "total_lag"
    #[pyo3(get, set)]
    pub idle_attribution: String,
    /// Floor each real start at the task's planned start
    #[pyo3(get, set)]
    pub hold_to_planned_start: bool,
    /// Run independent trials and sweep points on the rayon pool
    #[pyo3(get, set)]
    pub parallel: bool,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            idle_attribution: "cross_role".to_string(),
            hold_to_planned_start: true,
            parallel: true,
            verbosity: 0,
        }
    }
}

impl SimulationConfig {
    /// Parse the idle attribution strategy.
    pub fn attribution(&self) -> Result<IdleAttribution, SimulationError> {
        self.idle_attribution.parse()
    }

    /// Validate every field up front.
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.attribution().map(|_| ())
    }
}

#[pymethods]
impl SimulationConfig {
    #[new]
    #[pyo3(signature = (
        idle_attribution=None,
        hold_to_planned_start=None,
        parallel=None,
        verbosity=None
    ))]
    fn new(
        idle_attribution: Option<String>,
        hold_to_planned_start: Option<bool>,
        parallel: Option<bool>,
        verbosity: Option<u8>,
    ) -> PyResult<Self> {
        let defaults = Self::default();
        let config = Self {
            idle_attribution: idle_attribution.unwrap_or(defaults.idle_attribution),
            hold_to_planned_start: hold_to_planned_start
                .unwrap_or(defaults.hold_to_planned_start),
            parallel: parallel.unwrap_or(defaults.parallel),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        };
        config.validate()?;
        Ok(config)
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(idle_attribution={:?}, hold_to_planned_start={}, parallel={}, verbosity={})",
            self.idle_attribution, self.hold_to_planned_start, self.parallel, self.verbosity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.idle_attribution, "cross_role");
        assert!(config.hold_to_planned_start);
        assert!(config.parallel);
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.attribution().unwrap(), IdleAttribution::CrossRole);
    }

    #[test]
    fn test_repr_lists_every_field() {
        let config = SimulationConfig {
            verbosity: 2,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.__repr__(),
            "SimulationConfig(idle_attribution=\"cross_role\", hold_to_planned_start=true, parallel=true, verbosity=2)"
        );
    }

    #[test]
    fn test_unknown_attribution_rejected() {
        let config = SimulationConfig {
            idle_attribution: "blame_everyone".to_string(),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }
}
