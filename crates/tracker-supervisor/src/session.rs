//! Mutable record of the current tracker run.

use crate::process::TrackerHandle;
use crate::report::is_reportable;

/// State of the process-backed tracker.
///
/// Every run gets a generation number. Output and exit callbacks carry the
/// generation they were spawned with, so a late event from an earlier run
/// cannot touch the current one.
#[derive(Debug, Default)]
pub struct TrackerSession {
    generation: u64,
    handle: Option<TrackerHandle>,
    last_emissions_file: Option<String>,
    last_emissions: Option<f64>,
    emissions_reported: bool,
    no_emissions_reported: bool,
}

impl TrackerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Open a new run and return its generation.
    ///
    /// The last emissions file survives until the new run announces one.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.last_emissions = None;
        self.emissions_reported = false;
        self.no_emissions_reported = false;
        self.generation
    }

    pub fn attach(&mut self, handle: TrackerHandle) {
        self.handle = Some(handle);
    }

    pub fn handle(&self) -> Option<&TrackerHandle> {
        self.handle.as_ref()
    }

    /// Detach the handle for an explicit stop.
    pub fn take_handle(&mut self) -> Option<TrackerHandle> {
        self.handle.take()
    }

    /// Exit callback: drop the handle if it still belongs to `generation`.
    /// Returns false when an explicit stop or a newer run got there first.
    pub fn clear_if_current(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.handle.is_none() {
            return false;
        }
        self.handle = None;
        true
    }

    /// Record an emissions summary and return whether it should be shown.
    ///
    /// The first reportable value of a run is shown. An unparseable or zero
    /// value is shown once as "no emissions" and never hides a reportable
    /// value that follows. Nothing is shown after a reportable value.
    pub fn record_emissions(&mut self, generation: u64, value: Option<f64>) -> bool {
        if !self.is_current(generation) || self.emissions_reported {
            return false;
        }
        self.last_emissions = value;
        if is_reportable(value) {
            self.emissions_reported = true;
            true
        } else {
            !std::mem::replace(&mut self.no_emissions_reported, true)
        }
    }

    pub fn record_emissions_file(&mut self, generation: u64, path: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.last_emissions_file = Some(path);
        true
    }

    pub fn last_emissions_file(&self) -> Option<&str> {
        self.last_emissions_file.as_deref()
    }

    /// The last parsed value, consumed by a stop.
    pub fn take_last_emissions(&mut self) -> Option<f64> {
        self.last_emissions.take()
    }
}
