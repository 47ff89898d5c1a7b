pub mod config;
pub mod position;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, BoardConfig, TravellerConfig, SnapshotConfig, RunConfig, OutputFormat, MAX_SLOTS};
pub use position::{Position, Direction};
pub use sim_params::SimParams;
pub use snapshot::{Snapshot, EMPTY_CELL};
