//! Log-normal duration sampling.
//!
//! Each task's duration follows a log-normal distribution whose mean and
//! standard deviation match the task's `mean`/`stddev`:
//!
//! - `a = 1 + (stddev / mean)^2`
//! - shape `s = sqrt(ln a)`
//! - scale `= mean / sqrt(a)` (so the log-location is `ln(scale)`)
//!
//! The planned duration is a quantile of that distribution and never depends on
//! the random stream; the real duration is one draw from it.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{ContinuousCDF, LogNormal, Normal};

use crate::error::{InvalidTaskError, SimulationError};

/// Reject target percentiles outside the open interval (0, 1).
pub fn validate_percentile(percentile: f64) -> Result<f64, SimulationError> {
    if percentile.is_finite() && percentile > 0.0 && percentile < 1.0 {
        Ok(percentile)
    } else {
        Err(SimulationError::InvalidPercentile(percentile))
    }
}

/// Standard normal score for a percentile in (0, 1).
fn standard_score(percentile: f64) -> Result<f64, SimulationError> {
    let percentile = validate_percentile(percentile)?;
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| SimulationError::InvalidConfig(format!("standard normal: {e}")))?;
    Ok(normal.inverse_cdf(percentile))
}

/// Duration distribution of a single task.
#[derive(Clone, Debug)]
pub struct DurationSampler {
    task_id: u32,
    /// Log-space location, `ln(scale)`.
    location: f64,
    /// Log-space shape `s`. Zero when the task is deterministic.
    shape: f64,
    /// Median of the distribution.
    scale: f64,
    /// `None` when `shape == 0`: every quantile and draw equals `scale`.
    dist: Option<LogNormal>,
}

impl DurationSampler {
    /// Parametrize the distribution from a task's mean and standard deviation.
    pub fn new(task_id: u32, mean: f64, stddev: f64) -> Result<Self, InvalidTaskError> {
        if !mean.is_finite() || !stddev.is_finite() {
            return Err(InvalidTaskError::NonFiniteParameter(task_id));
        }
        if mean <= 0.0 {
            return Err(InvalidTaskError::NonPositiveMean { task_id, mean });
        }
        if stddev < 0.0 {
            return Err(InvalidTaskError::NegativeStddev { task_id, stddev });
        }

        let cv = stddev / mean;
        let a = 1.0 + cv * cv;
        let shape = a.ln().sqrt();
        let scale = mean / a.sqrt();
        let location = scale.ln();
        // Extreme coefficients of variation underflow the median to zero
        if !location.is_finite() {
            return Err(InvalidTaskError::NonFiniteParameter(task_id));
        }

        // LogNormal rejects a zero shape, so stddev == 0 stays a constant.
        let dist = if shape > 0.0 {
            Some(
                LogNormal::new(location, shape)
                    .map_err(|_| InvalidTaskError::NonFiniteParameter(task_id))?,
            )
        } else {
            None
        };

        Ok(Self {
            task_id,
            location,
            shape,
            scale,
            dist,
        })
    }

    /// The `percentile`-quantile of the distribution.
    ///
    /// Fails if the quantile underflows to zero or overflows.
    pub fn planned_duration(&self, percentile: f64) -> Result<f64, SimulationError> {
        let z = standard_score(percentile)?;
        Ok(self.checked_quantile(z, percentile)?)
    }

    fn checked_quantile(&self, z: f64, percentile: f64) -> Result<f64, InvalidTaskError> {
        let duration = self.quantile_at_score(z);
        if duration.is_finite() && duration > 0.0 {
            Ok(duration)
        } else {
            Err(InvalidTaskError::DegenerateDuration {
                task_id: self.task_id,
                percentile,
                duration,
            })
        }
    }

    /// Quantile for a precomputed standard normal score.
    #[inline]
    pub(crate) fn quantile_at_score(&self, z: f64) -> f64 {
        if self.dist.is_none() {
            return self.scale;
        }
        (self.location + self.shape * z).exp()
    }

    /// One random draw from the distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.dist {
            Some(dist) => dist.sample(rng),
            None => self.scale,
        }
    }

    pub fn task_id(&self) -> u32 {
        self.task_id
    }

    /// Log-space shape parameter.
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Median of the distribution.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Planned durations for every sampler at one percentile.
pub(crate) fn planned_durations(
    samplers: &[DurationSampler],
    percentile: f64,
) -> Result<Vec<f64>, SimulationError> {
    let z = standard_score(percentile)?;
    samplers
        .iter()
        .map(|s| s.checked_quantile(z, percentile).map_err(SimulationError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parameters_match_moments() {
        let sampler = DurationSampler::new(1, 10.0, 2.0).unwrap();
        let a: f64 = 1.0 + 0.04;
        assert!((sampler.shape() - a.ln().sqrt()).abs() < 1e-12);
        assert!((sampler.scale() - 10.0 / a.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_median_is_scale() {
        let sampler = DurationSampler::new(1, 10.0, 2.0).unwrap();
        let median = sampler.planned_duration(0.5).unwrap();
        assert!((median - sampler.scale()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_stddev_is_deterministic() {
        let sampler = DurationSampler::new(1, 5.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sampler.planned_duration(0.5).unwrap(), 5.0);
        assert_eq!(sampler.planned_duration(0.95).unwrap(), 5.0);
        assert_eq!(sampler.sample(&mut rng), 5.0);
    }

    #[test]
    fn test_planned_ignores_seed_real_varies() {
        let sampler = DurationSampler::new(1, 8.0, 3.0).unwrap();
        let mut rng_a = StdRng::seed_from_u64(1);
        let mut rng_b = StdRng::seed_from_u64(2);

        let planned = sampler.planned_duration(0.8).unwrap();
        let real_a = sampler.sample(&mut rng_a);
        let real_b = sampler.sample(&mut rng_b);

        assert_eq!(planned, sampler.planned_duration(0.8).unwrap());
        assert_ne!(real_a, real_b);
        assert!(real_a > 0.0 && real_b > 0.0);
    }

    #[test]
    fn test_planned_monotone_in_percentile() {
        let sampler = DurationSampler::new(1, 4.0, 1.5).unwrap();
        let mut last = 0.0;
        for p in [0.05, 0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            let planned = sampler.planned_duration(p).unwrap();
            assert!(planned >= last);
            last = planned;
        }
    }

    #[test]
    fn test_sample_mean_converges() {
        let sampler = DurationSampler::new(1, 10.0, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| sampler.sample(&mut rng)).sum();
        let mean = sum / n as f64;
        assert!((mean - 10.0).abs() < 0.1, "sample mean {mean}");
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            DurationSampler::new(3, 0.0, 1.0).unwrap_err(),
            InvalidTaskError::NonPositiveMean {
                task_id: 3,
                mean: 0.0
            }
        );
        assert_eq!(
            DurationSampler::new(3, 1.0, -0.5).unwrap_err(),
            InvalidTaskError::NegativeStddev {
                task_id: 3,
                stddev: -0.5
            }
        );
        assert_eq!(
            DurationSampler::new(3, f64::NAN, 1.0).unwrap_err(),
            InvalidTaskError::NonFiniteParameter(3)
        );
    }

    #[test]
    fn test_underflowing_median_is_rejected() {
        assert_eq!(
            DurationSampler::new(5, 1e-200, 1e-50).unwrap_err(),
            InvalidTaskError::NonFiniteParameter(5)
        );
    }

    #[test]
    fn test_planned_duration_underflow_is_an_error() {
        // Median near 1e-304 with a wide shape: low percentiles underflow to 0
        let sampler = DurationSampler::new(2, 1e-174, 1e-44).unwrap();
        assert!(sampler.planned_duration(0.5).unwrap() > 0.0);
        assert!(matches!(
            sampler.planned_duration(0.01),
            Err(SimulationError::InvalidTask(InvalidTaskError::DegenerateDuration {
                task_id: 2,
                ..
            }))
        ));
        assert!(matches!(
            planned_durations(&[sampler], 0.01),
            Err(SimulationError::InvalidTask(InvalidTaskError::DegenerateDuration {
                task_id: 2,
                ..
            }))
        ));
    }

    #[test]
    fn test_percentile_bounds() {
        let sampler = DurationSampler::new(1, 4.0, 1.0).unwrap();
        for p in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                sampler.planned_duration(p),
                Err(SimulationError::InvalidPercentile(_))
            ));
        }
    }
}
