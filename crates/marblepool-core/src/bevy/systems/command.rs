//! Command processing system.
//!
//! Processes commands pushed by the host through the [`CommandQueue`].

use bevy::prelude::*;

use crate::bevy::{
    CommandQueue, FrameInputRes, MeshSourceRes, StageCatalogRes, StageLoadedMessage, TableCommand,
    TableRes, TableSettings,
};
use crate::input::FrameInput;
use crate::table::Table;

/// System to process commands from the external command queue.
///
/// Handles commands until a Yield is encountered.
/// Commands after Yield are processed in the next tick.
pub fn process_commands(
    command_queue: Res<CommandQueue>,
    catalog: Res<StageCatalogRes>,
    meshes: Res<MeshSourceRes>,
    settings: Res<TableSettings>,
    mut table: ResMut<TableRes>,
    mut input: ResMut<FrameInputRes>,
    mut loaded_events: MessageWriter<StageLoadedMessage>,
) {
    for command in command_queue.drain_until_yield() {
        match command {
            TableCommand::LoadStage { stage, mode } => {
                let mode = mode.unwrap_or(settings.mode);
                tracing::info!("[command] LoadStage: {} ({:?})", stage, mode);
                let loaded = catalog.0.stage(&stage).cloned().and_then(|data| {
                    Table::new(
                        data,
                        mode,
                        settings.config.clone(),
                        settings.physics.clone(),
                        meshes.0.clone(),
                        settings.seed,
                    )
                });
                match loaded {
                    Ok(new_table) => {
                        table.table = Some(new_table);
                        input.0 = FrameInput::default();
                        loaded_events.write(StageLoadedMessage { stage });
                    }
                    Err(e) => tracing::warn!("[command] LoadStage failed: {}", e),
                }
            }
            TableCommand::SetInput(frame_input) => {
                input.0 = frame_input;
            }
            TableCommand::Unload => {
                tracing::info!("[command] Unload");
                table.table = None;
            }
            // Yield is consumed by drain_until_yield(), should not reach here
            TableCommand::Yield => {}
        }
    }
}
