//! Table tick system.

use bevy::prelude::*;

use crate::bevy::{FrameInputRes, TableRes};

/// Runs one table tick with the current input snapshot.
///
/// Clicks are edge-triggered, so they are cleared once the tick has seen
/// them; held buttons and the camera ray persist until the host changes them.
pub fn tick_table(mut table: ResMut<TableRes>, mut input: ResMut<FrameInputRes>) {
    let Some(table) = table.table.as_mut() else {
        return;
    };
    table.update(&input.0);
    input.0.left_click = false;
    input.0.right_click = false;
}
