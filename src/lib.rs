//! Concurrent traveller simulation on a shared grid.
//!
//! Spawner slots place travellers on random empty cells, each traveller then
//! walks randomly on its own thread, and a reporter periodically prints the
//! board together with the trails left since the previous snapshot. The
//! [`board::Board`] lock is the only synchronization point between them.

pub mod board;
pub mod reporter;
pub mod shutdown;
pub mod simulation;
pub mod traveller;

pub use board::{Board, BoardGuard, TravellerKey};
pub use reporter::Reporter;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use simulation::Simulation;
pub use traveller::{Spawner, Traveller};
