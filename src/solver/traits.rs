//! Time settings, recording schedule and results
//!
//! - [`TimeConfiguration`]: step size, step count, number of snapshots and
//!   inflow period of a run
//! - [`RecordSchedule`]: decides at which time steps a snapshot is taken
//! - [`SimulationResult`]: trajectory returned by the standalone integrator

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::physics::VesselState;

// =================================================================================================
// Time configuration
// =================================================================================================

/// Timing of a network run
///
/// # Examples
///
/// ```rust
/// use hemo_rs::solver::TimeConfiguration;
///
/// // 3000 steps of 0.5, 50 snapshots over the whole run
/// let fixed = TimeConfiguration::fixed(3000, 0.5, 50);
/// assert_eq!(fixed.final_time(), 1500.0);
///
/// // Four cycles of period 1.0, snapshots over the last one
/// let periodic = TimeConfiguration::periodic(0.125, 1.0, 4, 5);
/// assert_eq!(periodic.time_steps, 32);
/// assert_eq!(periodic.record_times()[0], 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeConfiguration {
    /// Number of time steps nt
    pub time_steps: usize,

    /// Time step dt
    pub dt: f64,

    /// Number of snapshots ntr
    pub records: usize,

    /// Inflow period T (0 = not periodic)
    pub period: f64,

    /// Number of periods simulated (1 for non-periodic runs)
    pub cycles: usize,
}

impl TimeConfiguration {
    /// Non-periodic run, snapshots spread over `[0, nt·dt]`
    pub fn fixed(time_steps: usize, dt: f64, records: usize) -> Self {
        Self {
            time_steps,
            dt,
            records,
            period: 0.0,
            cycles: 1,
        }
    }

    /// `cycles` periods of length `period`, snapshots over the last one
    pub fn periodic(dt: f64, period: f64, cycles: usize, records: usize) -> Self {
        let time_steps = (cycles as f64 * period / dt).round() as usize;
        Self {
            time_steps,
            dt,
            records,
            period,
            cycles,
        }
    }

    /// tf = nt·dt
    pub fn final_time(&self) -> f64 {
        self.time_steps as f64 * self.dt
    }

    /// Time after `step` steps
    ///
    /// Computed from the index rather than accumulated, so rounding errors
    /// do not build up over long runs.
    pub fn time(&self, step: usize) -> f64 {
        step as f64 * self.dt
    }

    /// True when the inflow repeats with period T
    pub fn is_periodic(&self) -> bool {
        self.period > 0.0
    }

    /// Snapshot instants: `records` points over `[tf - T, tf]`
    ///
    /// Non-periodic runs use the whole horizon `[0, tf]`.
    pub fn record_times(&self) -> Vec<f64> {
        let end = self.final_time();
        let start = if self.is_periodic() { end - self.period } else { 0.0 };
        linspace(start, end, self.records)
    }

    /// Validate
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "time step must be positive, got {}",
                self.dt
            )));
        }
        if self.time_steps == 0 {
            return Err(SimulationError::configuration("at least one time step required"));
        }
        if self.records == 0 {
            return Err(SimulationError::configuration("at least one record required"));
        }
        if !(self.period >= 0.0 && self.period.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "inflow period must be non-negative, got {}",
                self.period
            )));
        }
        if self.period > self.final_time() {
            return Err(SimulationError::configuration(format!(
                "inflow period {} exceeds the simulated time {}",
                self.period,
                self.final_time()
            )));
        }

        let times = self.record_times();
        if let [first, second, ..] = times[..]
            && second - first < self.dt * (1.0 - 1e-9)
        {
            return Err(SimulationError::configuration(format!(
                "{} records over {} give a spacing of {}, finer than dt = {}",
                self.records,
                times[times.len() - 1] - first,
                second - first,
                self.dt
            )));
        }
        Ok(())
    }
}

/// `count` evenly spaced values over `[start, end]`
pub(crate) fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

// =================================================================================================
// Record schedule
// =================================================================================================

/// Snapshot schedule of a run
///
/// Holds the `ntr` target instants and the index of the next one. A time
/// level is recorded when it lies strictly within `tolerance` of the next
/// target; the index then advances. Targets whose window already lies
/// behind the checked time are skipped. With targets at least `tolerance`
/// apart and every time level checked in order, each target is hit exactly
/// once.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchedule {
    times: Vec<f64>,
    tolerance: f64,
    next: usize,
}

impl RecordSchedule {
    pub fn new(times: Vec<f64>, tolerance: f64) -> Self {
        Self {
            times,
            tolerance,
            next: 0,
        }
    }

    /// Schedule of a network run
    pub fn from_configuration(configuration: &TimeConfiguration) -> Self {
        Self::new(configuration.record_times(), configuration.dt)
    }

    /// Snapshot index for time level `t`, if one is due
    pub fn check(&mut self, t: f64) -> Option<usize> {
        while self.times.get(self.next).is_some_and(|&target| target + self.tolerance <= t) {
            self.next += 1;
        }
        let target = *self.times.get(self.next)?;
        if (t - target).abs() < self.tolerance {
            self.next += 1;
            Some(self.next - 1)
        } else {
            None
        }
    }

    /// Number of targets passed so far, recorded or skipped
    pub fn recorded(&self) -> usize {
        self.next
    }

    /// True once every target has been recorded
    pub fn is_complete(&self) -> bool {
        self.next == self.times.len()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Recorded trajectory of a standalone integration
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Time of each snapshot
    pub time_points: Vec<f64>,

    /// Snapshots, one per entry of `time_points`
    pub trajectory: Vec<VesselState>,

    /// State after the last step
    pub final_state: VesselState,

    /// Free-form diagnostics (method, step count, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(time_points: Vec<f64>, trajectory: Vec<VesselState>, final_state: VesselState) -> Self {
        Self {
            time_points,
            trajectory,
            final_state,
            metadata: HashMap::new(),
        }
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
