//! Bevy integration for the marble table.
//!
//! The table runs as a headless plugin: a fixed-step system ticks it with the
//! latest input snapshot, its side effects are re-published as messages, and
//! a summary resource mirrors its state for hosts.

pub mod events;
pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use events::*;
pub use plugin::{MarblePoolHeadlessPlugin, TableSet};
pub use resources::*;
