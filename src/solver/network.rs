//! Network of arteries
//!
//! [`ArteryNetwork`] owns a symmetric binary tree of vessels stored in
//! breadth-first order (heap indexing):
//!
//! ```text
//!              0                 level 0 (root, inlet)
//!         1         2            level 1
//!       3   4     5   6          level 2 (leaves, outlets)
//! ```
//!
//! The daughters of vessel `p` are `2p + 1` (radius scaled by `a`) and
//! `2p + 2` (scaled by `b`); the last `2^(depth-1)` vessels are the leaves.
//!
//! # Time step
//!
//! Each global step runs in two phases:
//!
//! 1. boundary states of every vessel are computed from the previous time
//!    level (inflow at the root inlet, distal pressure at the leaf outlets,
//!    held values at internal junctions);
//! 2. every vessel is advanced by the Lax-Wendroff integrator and its CFL
//!    condition checked.
//!
//! No vessel reads another vessel's state during phase 2, so vessels may be
//! advanced in parallel (feature `parallel`).
//!
//! # Example
//!
//! ```rust
//! use hemo_rs::models::{ArteryParameters, InflowWaveform, NetworkParameters, WallModel};
//! use hemo_rs::solver::{ArteryNetwork, NullObserver, TimeConfiguration};
//!
//! let artery = ArteryParameters::new(WallModel::constant(100.0), 20.0, 10.0, 0.1);
//! let mut network = ArteryNetwork::new(&NetworkParameters::new(1, 1.0, 0.9, 0.6, artery))?;
//!
//! network.mesh(21)?;
//! network.set_time(TimeConfiguration::fixed(100, 0.05, 11))?;
//! network.initial_conditions(0.0)?;
//! network.solve(&InflowWaveform::constant(0.01), 0.0, &mut NullObserver)?;
//!
//! let history = network.arteries()[0].history().unwrap();
//! assert_eq!(history.records(), 11);
//! # Ok::<(), hemo_rs::SimulationError>(())
//! ```

use nalgebra::Vector2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SimulationError};
use crate::models::{Artery, InflowWaveform, NetworkParameters};
use crate::solver::boundary::{bifurcation_boundary, cfl_check, inlet_boundary, outlet_boundary, periodic};
use crate::solver::methods::LaxWendroff;
use crate::solver::observer::SimulationObserver;
use crate::solver::traits::{RecordSchedule, TimeConfiguration};

/// Boundary states of one vessel for the coming step
type BoundaryPair = (Vector2<f64>, Vector2<f64>);

/// Binary tree of arteries with a global clock
#[derive(Debug, Clone)]
pub struct ArteryNetwork {
    depth: usize,
    arteries: Vec<Artery>,
    timing: Option<TimeConfiguration>,
    schedule: RecordSchedule,
    steps_taken: usize,
}

impl ArteryNetwork {
    /// Build the tree described by `parameters`
    pub fn new(parameters: &NetworkParameters) -> Result<Self> {
        parameters.validate()?;

        let count = parameters.vessel_count();
        let mut radii = Vec::with_capacity(count);
        radii.push((parameters.inlet_radius, parameters.outlet_radius));
        for pos in 1..count {
            let (inlet, outlet) = radii[(pos - 1) / 2];
            let scale = if pos % 2 == 1 { parameters.scale_a } else { parameters.scale_b };
            radii.push((inlet * scale, outlet * scale));
        }

        let arteries = radii
            .iter()
            .enumerate()
            .map(|(pos, &(inlet, outlet))| Artery::new(pos, level_of(pos), inlet, outlet, &parameters.artery))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            depth: parameters.depth,
            arteries,
            timing: None,
            schedule: RecordSchedule::new(Vec::new(), 0.0),
            steps_taken: 0,
        })
    }

    // ====== Tree ======

    /// Number of generations
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Vessels in breadth-first order
    pub fn arteries(&self) -> &[Artery] {
        &self.arteries
    }

    /// Mutable access to the vessels (custom initial states)
    pub fn arteries_mut(&mut self) -> &mut [Artery] {
        &mut self.arteries
    }

    pub fn len(&self) -> usize {
        self.arteries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arteries.is_empty()
    }

    /// True for terminal vessels (the last `2^(depth-1)` positions)
    pub fn is_leaf(&self, pos: usize) -> bool {
        pos >= self.arteries.len() - (1 << (self.depth - 1))
    }

    /// Parent of `pos`, `None` for the root
    pub fn parent(&self, pos: usize) -> Option<usize> {
        (pos > 0).then(|| (pos - 1) / 2)
    }

    /// Daughters of `pos`, `None` for leaves
    pub fn children(&self, pos: usize) -> Option<(usize, usize)> {
        (!self.is_leaf(pos)).then_some((2 * pos + 1, 2 * pos + 2))
    }

    // ====== Setup ======

    /// Mesh every vessel with `points` nodes
    pub fn mesh(&mut self, points: usize) -> Result<()> {
        self.arteries.iter_mut().try_for_each(|artery| artery.mesh(points))
    }

    /// Set the time step, step count, snapshots and inflow period
    ///
    /// Resets the clock and the snapshot schedule.
    pub fn set_time(&mut self, timing: TimeConfiguration) -> Result<()> {
        timing.validate()?;
        self.schedule = RecordSchedule::from_configuration(&timing);
        self.timing = Some(timing);
        self.steps_taken = 0;
        Ok(())
    }

    /// Every vessel at rest with uniform flow `flow`
    ///
    /// History buffers are sized from the time settings, so
    /// [`ArteryNetwork::set_time`] must come first. Restarts the clock.
    pub fn initial_conditions(&mut self, flow: f64) -> Result<()> {
        let timing = *self.timing()?;
        self.arteries
            .iter_mut()
            .try_for_each(|artery| artery.initial_conditions(flow, timing.records))?;
        self.schedule = RecordSchedule::from_configuration(&timing);
        self.steps_taken = 0;
        Ok(())
    }

    pub fn timing(&self) -> Result<&TimeConfiguration> {
        self.timing
            .as_ref()
            .ok_or_else(|| SimulationError::configuration("time settings missing; call set_time first"))
    }

    /// Current simulation time
    pub fn time(&self) -> f64 {
        self.timing.map_or(0.0, |timing| timing.time(self.steps_taken))
    }

    /// Number of completed global steps
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Snapshot instants, `ntr` points over `[tf - T, tf]`
    pub fn record_times(&self) -> Result<Vec<f64>> {
        Ok(self.timing()?.record_times())
    }

    // ====== Time stepping ======

    /// Advance every vessel by one time step
    ///
    /// The inflow is evaluated at the new time level (wrapped into `[0, T)`
    /// for periodic runs); leaves discharge against `distal_pressure`.
    /// Snapshots follow the schedule set by [`ArteryNetwork::set_time`], so
    /// stepping by hand and [`ArteryNetwork::solve`] can be mixed. Returns the
    /// snapshot index stored at the new time level, if any.
    ///
    /// # Errors
    ///
    /// Same as [`ArteryNetwork::solve`]; configuration errors are raised
    /// before any vessel moves.
    pub fn step(&mut self, inflow: &InflowWaveform, distal_pressure: f64) -> Result<Option<usize>> {
        let timing = *self.timing()?;
        self.ensure_ready(&timing, distal_pressure)?;
        self.record_initial()?;
        self.advance(&timing, inflow, distal_pressure)
    }

    /// Run until the configured number of steps
    ///
    /// Snapshots are taken at the time levels within one `dt` of the
    /// instants returned by [`ArteryNetwork::record_times`]. A run resumed
    /// after [`ArteryNetwork::step`] continues the same schedule.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] before the first step when the
    /// network is not meshed, has no time settings or initial conditions, or
    /// when the distal pressure has no matching area.
    /// [`SimulationError::StabilityViolation`] aborts the run.
    pub fn solve(
        &mut self,
        inflow: &InflowWaveform,
        distal_pressure: f64,
        observer: &mut dyn SimulationObserver,
    ) -> Result<()> {
        let timing = *self.timing()?;
        self.ensure_ready(&timing, distal_pressure)?;

        if self.depth > 1 {
            log::warn!(
                "Network of depth {} has {} internal junctions without coupling; junction nodes keep their initial values",
                self.depth,
                self.arteries.len() - (1 << (self.depth - 1))
            );
        }

        observer.on_start(timing.time_steps, self.arteries.len());
        if let Some(index) = self.record_initial()? {
            observer.on_record(index, 0.0);
        }

        while self.steps_taken < timing.time_steps {
            let record = self.advance(&timing, inflow, distal_pressure)?;
            let t = self.time();

            if let Some(index) = record {
                observer.on_record(index, t);
            }
            observer.on_step(self.steps_taken, t);
        }

        observer.on_finish(self.time());
        Ok(())
    }

    // ====== Internals ======

    /// Store the initial state when the first snapshot is due at t = 0
    fn record_initial(&mut self) -> Result<Option<usize>> {
        if self.steps_taken > 0 {
            return Ok(None);
        }
        let Some(index) = self.schedule.check(0.0) else {
            return Ok(None);
        };
        for artery in &mut self.arteries {
            artery.record(index)?;
        }
        Ok(Some(index))
    }

    /// One global step without the setup checks
    fn advance(&mut self, timing: &TimeConfiguration, inflow: &InflowWaveform, distal_pressure: f64) -> Result<Option<usize>> {
        let step = self.steps_taken + 1;
        let dt = timing.dt;
        let velocity = inflow.evaluate(periodic(timing.time(step), timing.period));

        let boundaries = (0..self.arteries.len())
            .map(|pos| self.boundary_states(pos, velocity, distal_pressure, dt, step))
            .collect::<Result<Vec<_>>>()?;

        let record = self.schedule.check(timing.time(step));
        advance_all(&mut self.arteries, &boundaries, dt, step, record)?;
        for artery in &self.arteries {
            cfl_check(artery, dt, step)?;
        }

        self.steps_taken = step;
        Ok(record)
    }

    fn ensure_ready(&self, timing: &TimeConfiguration, distal_pressure: f64) -> Result<()> {
        for artery in &self.arteries {
            let history = artery.history().ok_or_else(|| {
                SimulationError::configuration(format!(
                    "artery {} has no initial conditions",
                    artery.position()
                ))
            })?;
            if history.records() != timing.records {
                return Err(SimulationError::configuration(format!(
                    "artery {} holds {} records, time settings ask for {}",
                    artery.position(),
                    history.records(),
                    timing.records
                )));
            }
            if self.is_leaf(artery.position()) {
                artery.area_at_pressure(distal_pressure, artery.grid().points() - 1)?;
            }
        }
        Ok(())
    }

    /// Inlet and outlet states of vessel `pos` for the coming step
    fn boundary_states(&self, pos: usize, velocity: f64, distal_pressure: f64, dt: f64, step: usize) -> Result<BoundaryPair> {
        let artery = &self.arteries[pos];
        let previous = artery.state()?;

        let inlet = match self.parent(pos) {
            None => inlet_boundary(artery, previous, velocity, dt, step)?,
            Some(parent) => {
                let daughter = if pos % 2 == 1 { 1 } else { 2 };
                self.junction(parent)
                    .map_or_else(|| previous.first(), |states| states[daughter])
            }
        };

        let outlet = if self.is_leaf(pos) {
            let last = previous.points() - 1;
            let area = artery.area_at_pressure(distal_pressure, last)?;
            outlet_boundary(artery, previous, area, dt, step)?
        } else {
            self.junction(pos).map_or_else(|| previous.last(), |states| states[0])
        };

        Ok((inlet, outlet))
    }

    /// Coupled states at the junction below `parent`, if coupling is available
    fn junction(&self, parent: usize) -> Option<[Vector2<f64>; 3]> {
        let (first, second) = self.children(parent)?;
        bifurcation_boundary(&self.arteries[parent], &self.arteries[first], &self.arteries[second])
    }
}

/// Generation of the vessel at breadth-first position `pos`
fn level_of(pos: usize) -> usize {
    (usize::BITS - 1 - (pos + 1).leading_zeros()) as usize
}

fn advance_one(artery: &mut Artery, boundary: &BoundaryPair, dt: f64, step: usize, record: Option<usize>) -> Result<()> {
    let integrator = LaxWendroff::new(dt, artery.dx())?;
    artery.advance(&integrator, &boundary.0, &boundary.1, step, record)
}

#[cfg(not(feature = "parallel"))]
fn advance_all(arteries: &mut [Artery], boundaries: &[BoundaryPair], dt: f64, step: usize, record: Option<usize>) -> Result<()> {
    arteries
        .iter_mut()
        .zip(boundaries)
        .try_for_each(|(artery, boundary)| advance_one(artery, boundary, dt, step, record))
}

#[cfg(feature = "parallel")]
fn advance_all(arteries: &mut [Artery], boundaries: &[BoundaryPair], dt: f64, step: usize, record: Option<usize>) -> Result<()> {
    if arteries.len() >= crate::solver::parallel_threshold() {
        arteries
            .par_iter_mut()
            .zip(boundaries.par_iter())
            .try_for_each(|(artery, boundary)| advance_one(artery, boundary, dt, step, record))
    } else {
        arteries
            .iter_mut()
            .zip(boundaries)
            .try_for_each(|(artery, boundary)| advance_one(artery, boundary, dt, step, record))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArteryParameters, WallModel};
    use crate::physics::StateQuantity;
    use crate::solver::observer::NullObserver;
    use approx::assert_relative_eq;

    fn parameters(depth: usize) -> NetworkParameters {
        let artery = ArteryParameters::new(WallModel::constant(100.0), 20.0, 10.0, 0.1);
        NetworkParameters::new(depth, 1.0, 0.9, 0.6, artery)
    }

    fn ready(depth: usize, timing: TimeConfiguration) -> ArteryNetwork {
        let mut network = ArteryNetwork::new(&parameters(depth)).unwrap();
        network.mesh(21).unwrap();
        network.set_time(timing).unwrap();
        network.initial_conditions(0.0).unwrap();
        network
    }

    #[test]
    fn test_level_of() {
        let levels: Vec<usize> = (0..7).map(level_of).collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 2, 2, 2]);
        assert_eq!(level_of(7), 3);
    }

    #[test]
    fn test_tree_topology() {
        let network = ArteryNetwork::new(&parameters(3)).unwrap();

        assert_eq!(network.len(), 7);
        assert_eq!(network.parent(0), None);
        assert_eq!(network.parent(4), Some(1));
        assert_eq!(network.parent(6), Some(2));
        assert_eq!(network.children(0), Some((1, 2)));
        assert_eq!(network.children(2), Some((5, 6)));
        assert_eq!(network.children(3), None);

        let leaves: Vec<usize> = (0..7).filter(|&p| network.is_leaf(p)).collect();
        assert_eq!(leaves, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_single_vessel_is_root_and_leaf() {
        let network = ArteryNetwork::new(&parameters(1)).unwrap();
        assert_eq!(network.len(), 1);
        assert!(network.is_leaf(0));
        assert_eq!(network.children(0), None);
    }

    #[test]
    fn test_tapered_tree_scales_both_ends() {
        let network = ArteryNetwork::new(&parameters(2).tapered(0.8)).unwrap();
        let daughter = &network.arteries()[2];

        assert_relative_eq!(daughter.inlet_radius(), 0.6);
        assert_relative_eq!(daughter.outlet_radius(), 0.48);
        assert_eq!(daughter.level(), 1);
    }

    #[test]
    fn test_initial_conditions_need_time_settings() {
        let mut network = ArteryNetwork::new(&parameters(1)).unwrap();
        network.mesh(11).unwrap();
        let error = network.initial_conditions(0.0).unwrap_err();
        assert!(error.to_string().contains("set_time"));
    }

    #[test]
    fn test_initial_conditions_need_mesh() {
        let mut network = ArteryNetwork::new(&parameters(1)).unwrap();
        network.set_time(TimeConfiguration::fixed(10, 0.01, 2)).unwrap();
        assert!(network.initial_conditions(0.0).is_err());
    }

    #[test]
    fn test_solve_requires_initial_conditions() {
        let mut network = ArteryNetwork::new(&parameters(1)).unwrap();
        network.mesh(11).unwrap();
        network.set_time(TimeConfiguration::fixed(10, 0.01, 2)).unwrap();

        let error = network
            .solve(&InflowWaveform::none(), 0.0, &mut NullObserver)
            .unwrap_err();
        assert!(matches!(error, SimulationError::Configuration(_)));
    }

    #[test]
    fn test_solve_rejects_unreachable_distal_pressure() {
        let mut network = ready(1, TimeConfiguration::fixed(10, 0.01, 2));
        let result = network.solve(&InflowWaveform::none(), 150.0, &mut NullObserver);
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
        assert_eq!(network.steps_taken(), 0);
    }

    #[test]
    fn test_rest_state_is_steady() {
        let mut network = ready(1, TimeConfiguration::fixed(50, 0.02, 6));
        network.solve(&InflowWaveform::none(), 0.0, &mut NullObserver).unwrap();

        assert_eq!(network.steps_taken(), 50);
        assert_relative_eq!(network.time(), 1.0, epsilon = 1e-12);

        let artery = &network.arteries()[0];
        let state = artery.state().unwrap();
        for j in 0..state.points() {
            assert_relative_eq!(state.area(j), artery.unstressed_area()[j], epsilon = 1e-10);
            assert_relative_eq!(state.flow(j), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_every_snapshot_is_filled() {
        let mut network = ready(1, TimeConfiguration::fixed(200, 0.02, 9));
        network
            .solve(&InflowWaveform::constant(0.05), 0.0, &mut NullObserver)
            .unwrap();

        // Inflow raises the inlet pressure; no snapshot after the first stays at rest
        let inlet_pressure = network.arteries()[0]
            .history()
            .unwrap()
            .trace(StateQuantity::Pressure, 0);
        assert_eq!(inlet_pressure[0], 0.0);
        assert!(inlet_pressure[1..].iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_solve_resumes_after_manual_steps() {
        let timing = TimeConfiguration::fixed(100, 0.02, 6);
        let inflow = InflowWaveform::constant(0.05);

        let mut resumed = ready(1, timing);
        assert_eq!(resumed.step(&inflow, 0.0).unwrap(), None);
        assert_eq!(resumed.step(&inflow, 0.0).unwrap(), None);
        resumed.solve(&inflow, 0.0, &mut NullObserver).unwrap();
        assert_eq!(resumed.steps_taken(), 100);

        let mut straight = ready(1, timing);
        straight.solve(&inflow, 0.0, &mut NullObserver).unwrap();

        let history = resumed.arteries()[0].history().unwrap();
        assert!(history.trace(StateQuantity::Area, 0).iter().all(|&a| a > 0.0));
        assert_eq!(history, straight.arteries()[0].history().unwrap());
    }

    #[test]
    fn test_step_returns_scheduled_snapshot() {
        let mut network = ready(1, TimeConfiguration::fixed(10, 0.02, 3));
        let records: Vec<Option<usize>> = (0..10)
            .map(|_| network.step(&InflowWaveform::none(), 0.0).unwrap())
            .collect();

        // The t = 0 snapshot is stored before the first step
        let indices: Vec<usize> = records.iter().flatten().copied().collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_step_checks_distal_pressure_before_moving() {
        let mut network = ready(1, TimeConfiguration::fixed(10, 0.01, 2));
        let before = network.arteries()[0].state().unwrap().clone();

        let error = network.step(&InflowWaveform::constant(0.05), 150.0).unwrap_err();
        assert!(matches!(error, SimulationError::Configuration(_)));
        assert_eq!(network.steps_taken(), 0);
        assert_eq!(network.arteries()[0].state().unwrap(), &before);
    }

    #[test]
    fn test_initial_conditions_restart_the_clock() {
        let mut network = ready(1, TimeConfiguration::fixed(20, 0.02, 3));
        network.solve(&InflowWaveform::constant(0.05), 0.0, &mut NullObserver).unwrap();
        assert_eq!(network.steps_taken(), 20);

        network.initial_conditions(0.0).unwrap();
        assert_eq!(network.steps_taken(), 0);
        network.solve(&InflowWaveform::none(), 0.0, &mut NullObserver).unwrap();

        let area = network.arteries()[0].history().unwrap().trace(StateQuantity::Area, 0);
        assert!(area.iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_periodic_record_window() {
        let network = ready(1, TimeConfiguration::periodic(0.01, 0.5, 4, 11));
        let times = network.record_times().unwrap();

        assert_eq!(times.len(), 11);
        assert_relative_eq!(times[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(times[10], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_junction_nodes_are_held() {
        let mut network = ready(2, TimeConfiguration::fixed(40, 0.02, 3));
        network
            .solve(&InflowWaveform::constant(0.05), 0.0, &mut NullObserver)
            .unwrap();

        let root = &network.arteries()[0];
        let last = root.state().unwrap().points() - 1;
        assert_eq!(root.state().unwrap().area(last), root.unstressed_area()[last]);

        for daughter in &network.arteries()[1..] {
            assert_eq!(daughter.state().unwrap().area(0), daughter.unstressed_area()[0]);
            assert_eq!(daughter.state().unwrap().flow(0), 0.0);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        use crate::solver::ThresholdGuard;

        let run = |threshold: usize| {
            let _guard = ThresholdGuard::save(threshold);
            let mut network = ready(3, TimeConfiguration::fixed(60, 0.02, 4));
            network
                .solve(&InflowWaveform::constant(0.05), 0.0, &mut NullObserver)
                .unwrap();
            network
                .arteries()
                .iter()
                .map(|artery| artery.state().unwrap().clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(1), run(usize::MAX));
    }

    #[test]
    fn test_cfl_violation_aborts_run() {
        // c0 = sqrt(50) ≈ 7.07, dx = 1: dt = 0.2 gives a Courant number of 1.41
        let mut network = ready(1, TimeConfiguration::fixed(10, 0.2, 2));
        let error = network
            .solve(&InflowWaveform::none(), 0.0, &mut NullObserver)
            .unwrap_err();

        assert!(error.is_stability_violation());
        assert_eq!(network.steps_taken(), 0);
    }
}
