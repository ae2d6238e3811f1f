//! State synchronization systems.
//!
//! Forwards table side effects as messages and refreshes the summary resource.

use bevy::prelude::*;

use crate::bevy::{TableEventMessage, TableRes, TableSummaryRes, VictoryMessage};
use crate::events::TableEvent;

/// Publishes the events produced by the last tick, in order.
pub fn publish_table_events(
    mut table: ResMut<TableRes>,
    mut table_events: MessageWriter<TableEventMessage>,
    mut victory_events: MessageWriter<VictoryMessage>,
) {
    let Some(table) = table.table.as_mut() else {
        return;
    };
    for event in table.drain_events() {
        if let TableEvent::Victory { winner, from_run_out } = event {
            victory_events.write(VictoryMessage { winner, from_run_out });
        }
        table_events.write(TableEventMessage(event));
    }
}

/// Refreshes the summary snapshot. Must run after `publish_table_events`.
pub fn refresh_table_summary(table: Res<TableRes>, mut summary: ResMut<TableSummaryRes>) {
    summary.summary = table.table.as_ref().map(crate::table::Table::summary);
    summary.version += 1;
}
