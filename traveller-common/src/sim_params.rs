use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OutputFormat;

/// Simulation parameters derived from the configuration, shared read-only by every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimParams {
    // Board
    pub rows: usize,
    pub cols: usize,

    // Travellers
    pub slots: usize,
    pub spawn_probability: u8, // Percent chance per spawn check
    pub move_probability: u8,  // Percent chance per move check

    // Timing
    pub spawn_interval: Duration,
    pub move_interval: Duration,
    pub snapshot_interval: Duration,

    // Output & RNG
    pub format: OutputFormat,
    pub seed: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        crate::config::SimulationConfig::default().get_sim_params()
    }
}
