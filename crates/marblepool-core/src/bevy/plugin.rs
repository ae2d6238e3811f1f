//! Bevy plugin for the marble table.
//!
//! Provides `MarblePoolHeadlessPlugin`: logic only, no rendering or window
//! dependencies. Hosts that draw the table add their own plugins on top and
//! read the published messages and the summary resource.

use bevy::prelude::*;

use crate::bevy::events::*;
use crate::bevy::resources::*;
use crate::bevy::systems;
use crate::config::PHYSICS_DT;
use crate::player::GameMode;

/// Ordering of the table systems inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableSet {
    Commands,
    Tick,
    Publish,
}

/// Headless plugin running the table at the fixed physics rate.
///
/// Use this plugin in tests with `MinimalPlugins` to run the table without a
/// windowing or rendering backend.
pub struct MarblePoolHeadlessPlugin {
    pub seed: u64,
    pub mode: GameMode,
    pub command_queue: Option<CommandQueue>,
}

impl Default for MarblePoolHeadlessPlugin {
    fn default() -> Self {
        Self {
            seed: 12345,
            mode: GameMode::default(),
            command_queue: None,
        }
    }
}

impl Plugin for MarblePoolHeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_seconds(f64::from(PHYSICS_DT)));

        app.insert_resource(TableSettings::new(self.seed, self.mode))
            .insert_resource(self.command_queue.clone().unwrap_or_default())
            .init_resource::<StageCatalogRes>()
            .init_resource::<MeshSourceRes>()
            .init_resource::<TableRes>()
            .init_resource::<FrameInputRes>()
            .init_resource::<TableSummaryRes>();

        app.add_message::<TableEventMessage>()
            .add_message::<StageLoadedMessage>()
            .add_message::<VictoryMessage>();

        app.configure_sets(
            FixedUpdate,
            (TableSet::Commands, TableSet::Tick, TableSet::Publish).chain(),
        );
        app.add_systems(FixedUpdate, systems::process_commands.in_set(TableSet::Commands));
        app.add_systems(FixedUpdate, systems::tick_table.in_set(TableSet::Tick));
        app.add_systems(
            FixedUpdate,
            (systems::publish_table_events, systems::refresh_table_summary)
                .chain()
                .in_set(TableSet::Publish),
        );
    }
}
