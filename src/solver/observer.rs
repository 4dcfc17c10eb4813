//! Run observers
//!
//! The network loop never prints. Progress and snapshots are handed to a
//! [`SimulationObserver`]; [`NullObserver`] drops them and [`LogObserver`]
//! forwards them to the `log` facade.

/// Callbacks invoked by [`ArteryNetwork::solve`](crate::solver::ArteryNetwork::solve)
///
/// Every method has an empty default, so an observer only implements what it
/// needs.
pub trait SimulationObserver {
    /// Called once before the first step
    fn on_start(&mut self, _time_steps: usize, _vessels: usize) {}

    /// Called after every completed step
    fn on_step(&mut self, _step: usize, _time: f64) {}

    /// Called when a snapshot has been stored
    fn on_record(&mut self, _index: usize, _time: f64) {}

    /// Called once after the last step
    fn on_finish(&mut self, _final_time: f64) {}
}

/// Observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {}

/// Observer reporting through the `log` facade
///
/// Progress goes to `info` every 10 % of the run, snapshots to `debug`.
#[derive(Debug, Clone, Default)]
pub struct LogObserver {
    time_steps: usize,
    next_percent: usize,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimulationObserver for LogObserver {
    fn on_start(&mut self, time_steps: usize, vessels: usize) {
        self.time_steps = time_steps;
        self.next_percent = 10;
        log::info!("Starting run: {time_steps} time steps, {vessels} vessels");
    }

    fn on_step(&mut self, step: usize, time: f64) {
        if self.time_steps == 0 {
            return;
        }
        let percent = step * 100 / self.time_steps;
        if percent >= self.next_percent {
            log::info!("Progress {percent}% (t = {time:.4e})");
            self.next_percent = (percent / 10 + 1) * 10;
        }
    }

    fn on_record(&mut self, index: usize, time: f64) {
        log::debug!("Snapshot {index} recorded at t = {time:.4e}");
    }

    fn on_finish(&mut self, final_time: f64) {
        log::info!("Run finished at t = {final_time:.4e}");
    }
}

// =================================================================================================
// Tests
// =================================================================================================
