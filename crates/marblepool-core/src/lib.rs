//! MarblePool Core Library
//!
//! Turn-based marble table game on top of `Rapier3D` with deterministic,
//! seeded behavior.
//!
//! The [`table::Table`] owns one match: physics world, marbles, structures,
//! inventories and the phase machine. Hosts feed it one [`input::FrameInput`]
//! per fixed step and drain [`events::TableEvent`]s for sounds, particles and
//! announcements. The [`bevy`] module wraps the same table in a headless
//! Bevy plugin.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod input;
pub mod inventory;
pub mod level;
pub mod marble;
pub mod mesh;
pub mod physics;
pub mod player;
pub mod structure;
pub mod table;
pub mod util;

// Bevy integration
pub mod bevy;

pub use clock::FrameClock;
pub use config::{HudLayout, PHYSICS_DT, PhysicsConfig, TableConfig};
pub use error::{LevelError, PhysicsError};
pub use events::{ParticleKind, PhaseKind, TableEvent};
pub use input::{FrameInput, Ray};
pub use inventory::{Inventory, PlayerInventory};
pub use level::{ShootZone, Stage, StageCatalog, Symmetry};
pub use marble::{Marble, MarbleId, MarbleManager, MarbleType};
pub use mesh::{MeshLibrary, MeshSource, TriangleMesh};
pub use physics::{ContactEvent, PhysicsWorld};
pub use player::{Controller, GameMode, Player};
pub use structure::{Structure, StructureId, StructureKind, StructureManager};
pub use table::{Phase, Table, TableSummary};
