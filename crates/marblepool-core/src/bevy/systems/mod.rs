//! Systems for the headless table.
//!
//! Organized by functionality:
//! - command: Command queue processing from the host
//! - simulation: Table ticks
//! - state_sync: Publish table events and the summary snapshot

pub mod command;
pub mod simulation;
pub mod state_sync;

pub use command::*;
pub use simulation::*;
pub use state_sync::*;
