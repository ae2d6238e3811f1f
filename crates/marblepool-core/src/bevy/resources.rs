//! ECS resources for the headless table.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::Mutex;

use crate::config::{PhysicsConfig, TableConfig};
use crate::input::FrameInput;
use crate::level::StageCatalog;
use crate::mesh::{MeshLibrary, MeshSource};
use crate::player::GameMode;
use crate::table::{Table, TableSummary};

/// The table currently being played, if any.
#[derive(Resource, Debug, Default)]
pub struct TableRes {
    pub table: Option<Table>,
}

impl TableRes {
    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }
}

/// Stages that `LoadStage` can refer to.
#[derive(Resource, Debug, Clone)]
pub struct StageCatalogRes(pub StageCatalog);

impl Default for StageCatalogRes {
    fn default() -> Self {
        Self(StageCatalog::builtin())
    }
}

/// Mesh lookup shared with every table the app builds.
#[derive(Resource, Clone)]
pub struct MeshSourceRes(pub Arc<dyn MeshSource>);

impl Default for MeshSourceRes {
    fn default() -> Self {
        Self(Arc::new(MeshLibrary::with_builtin_meshes()))
    }
}

/// Seed, default mode and tunables used when a stage is loaded.
#[derive(Resource, Debug, Clone)]
pub struct TableSettings {
    pub seed: u64,
    pub mode: GameMode,
    pub config: TableConfig,
    pub physics: PhysicsConfig,
}

impl TableSettings {
    pub fn new(seed: u64, mode: GameMode) -> Self {
        Self {
            seed,
            mode,
            config: TableConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self::new(12345, GameMode::default())
    }
}

/// Input snapshot fed to the next table tick.
///
/// Click flags only apply to one tick and are cleared after it runs.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameInputRes(pub FrameInput);

/// Latest table snapshot for hosts, with a version bumped on every refresh.
#[derive(Resource, Debug, Clone, Default)]
pub struct TableSummaryRes {
    pub summary: Option<TableSummary>,
    pub version: u64,
}

/// Commands that can be sent from the host.
#[derive(Debug, Clone)]
pub enum TableCommand {
    /// Build a table for a stage of the catalog. Without a mode the
    /// configured [`TableSettings::mode`] is used.
    LoadStage { stage: String, mode: Option<GameMode> },
    /// Replace the input snapshot for the next tick.
    SetInput(FrameInput),
    /// Drop the current table.
    Unload,
    /// Frame boundary marker - commands after this are processed in the next tick.
    Yield,
}

/// Thread-safe command queue shared with the host.
#[derive(Resource, Clone)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<TableCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Push a command to be processed.
    pub fn push(&self, command: TableCommand) {
        self.inner.lock().push_back(command);
    }

    /// Drain all pending commands.
    pub fn drain(&self) -> Vec<TableCommand> {
        self.inner.lock().drain(..).collect()
    }

    /// Drain commands until Yield or empty.
    ///
    /// Yield itself is consumed but not returned.
    pub fn drain_until_yield(&self) -> Vec<TableCommand> {
        let mut guard = self.inner.lock();
        let mut commands = Vec::new();
        while let Some(command) = guard.pop_front() {
            if matches!(command, TableCommand::Yield) {
                tracing::debug!("[command] Yield - deferring remaining commands to next tick");
                break;
            }
            commands.push(command);
        }
        commands
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_until_yield() {
        let queue = CommandQueue::new();
        queue.push(TableCommand::SetInput(FrameInput::default().clicked()));
        queue.push(TableCommand::Yield);
        queue.push(TableCommand::Unload);

        let first = queue.drain_until_yield();
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], TableCommand::SetInput(input) if input.left_click));

        let second = queue.drain_until_yield();
        assert!(matches!(second.as_slice(), [TableCommand::Unload]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_clones_share_state() {
        let queue = CommandQueue::new();
        let host = queue.clone();
        host.push(TableCommand::Unload);
        assert!(!queue.is_empty());
        assert_eq!(queue.drain().len(), 1);
        assert!(host.is_empty());
    }
}
