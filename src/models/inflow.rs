//! Prescribed inflow at the root of the network
//!
//! Defines the mean velocity `u_in(t)` imposed at the inlet of the root vessel.
//! The network wraps time into `[0, T)` before evaluation when the run is
//! periodic, so a waveform only needs to describe one cardiac cycle.
//!
//! # Example
//!
//! ```rust
//! use hemo_rs::models::InflowWaveform;
//!
//! // Step from rest to 0.01 at t = 0
//! let inflow = InflowWaveform::step(0.0, 0.0, 0.01);
//! assert_eq!(inflow.evaluate(-1.0), 0.0);
//! assert_eq!(inflow.evaluate(0.5), 0.01);
//!
//! // One cycle sampled at four instants
//! let cycle = InflowWaveform::tabulated(vec![0.0, 0.25, 0.5, 1.0], vec![0.0, 1.0, 0.0, 0.0]).unwrap();
//! assert_eq!(cycle.evaluate(0.125), 0.5);
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{Result, SimulationError};

/// Inlet velocity as a function of time
pub enum InflowWaveform {
    /// Same value at all times
    Constant(f64),

    /// `before` until `time`, `after` from `time` on
    Step { time: f64, before: f64, after: f64 },

    /// `mean + amplitude · sin(2π t / period + phase)`
    Sinusoidal {
        mean: f64,
        amplitude: f64,
        period: f64,
        phase: f64,
    },

    /// Samples of one cycle, linearly interpolated
    ///
    /// Held constant outside the sampled interval.
    Tabulated { times: Vec<f64>, values: Vec<f64> },

    /// User-defined function of time
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),

    /// No inflow (always 0)
    None,
}

// ==================== Manual Clone Implementation ====================

impl Clone for InflowWaveform {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(value) => Self::Constant(*value),
            Self::Step { time, before, after } => Self::Step {
                time: *time,
                before: *before,
                after: *after,
            },
            Self::Sinusoidal {
                mean,
                amplitude,
                period,
                phase,
            } => Self::Sinusoidal {
                mean: *mean,
                amplitude: *amplitude,
                period: *period,
                phase: *phase,
            },
            Self::Tabulated { times, values } => Self::Tabulated {
                times: times.clone(),
                values: values.clone(),
            },
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
            Self::None => Self::None,
        }
    }
}

// ==================== Manual Debug Implementation ====================

impl std::fmt::Debug for InflowWaveform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Step { time, before, after } => f
                .debug_struct("Step")
                .field("time", time)
                .field("before", before)
                .field("after", after)
                .finish(),
            Self::Sinusoidal {
                mean,
                amplitude,
                period,
                phase,
            } => f
                .debug_struct("Sinusoidal")
                .field("mean", mean)
                .field("amplitude", amplitude)
                .field("period", period)
                .field("phase", phase)
                .finish(),
            Self::Tabulated { times, .. } => f
                .debug_struct("Tabulated")
                .field("samples", &times.len())
                .finish(),
            Self::Custom(_) => f
                .debug_struct("Custom")
                .field("function", &"<user-defined>")
                .finish(),
            Self::None => f.debug_struct("None").finish(),
        }
    }
}

// ==================== Implementation ====================

impl InflowWaveform {
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    pub fn step(time: f64, before: f64, after: f64) -> Self {
        Self::Step { time, before, after }
    }

    /// Sinusoid with zero phase
    pub fn sinusoidal(mean: f64, amplitude: f64, period: f64) -> Self {
        Self::Sinusoidal {
            mean,
            amplitude,
            period,
            phase: 0.0,
        }
    }

    /// Sampled cycle
    ///
    /// # Errors
    ///
    /// Fewer than two samples, length mismatch, or times not strictly increasing.
    pub fn tabulated(times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(SimulationError::configuration(format!(
                "inflow table has {} times and {} values",
                times.len(),
                values.len()
            )));
        }
        if times.len() < 2 {
            return Err(SimulationError::configuration("inflow table needs at least two samples"));
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SimulationError::configuration("inflow table times must be strictly increasing"));
        }
        Ok(Self::Tabulated { times, values })
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn none() -> Self {
        Self::None
    }

    /// Inlet velocity at time `t`
    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            Self::Constant(value) => *value,

            Self::Step { time, before, after } => {
                if t < *time {
                    *before
                } else {
                    *after
                }
            }

            Self::Sinusoidal {
                mean,
                amplitude,
                period,
                phase,
            } => mean + amplitude * (2.0 * PI * t / period + phase).sin(),

            Self::Tabulated { times, values } => interpolate(times, values, t),

            Self::Custom(f) => f(t),

            Self::None => 0.0,
        }
    }

    /// Evaluate at multiple time points
    pub fn evaluate_series(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.evaluate(t)).collect()
    }
}

/// Piecewise-linear interpolation, clamped at both ends
fn interpolate(times: &[f64], values: &[f64], t: f64) -> f64 {
    let last = times.len() - 1;
    if t <= times[0] {
        return values[0];
    }
    if t >= times[last] {
        return values[last];
    }
    // First sample strictly after t; 1 <= upper <= last here
    let upper = times.partition_point(|&s| s <= t);
    let (t0, t1) = (times[upper - 1], times[upper]);
    let (v0, v1) = (values[upper - 1], values[upper]);
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

// =================================================================================================
// Tests
// =================================================================================================
