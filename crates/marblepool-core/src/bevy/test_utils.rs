//! Test utilities for headless Bevy integration tests.
//!
//! Provides `TestApp`, a wrapper around `bevy::app::App` that uses
//! `MinimalPlugins` + `MarblePoolHeadlessPlugin` for testing the table
//! without a rendering or windowing backend.

use bevy::prelude::*;

use crate::bevy::plugin::MarblePoolHeadlessPlugin;
use crate::bevy::resources::{CommandQueue, TableCommand, TableSummaryRes};
use crate::config::PHYSICS_DT;
use crate::player::GameMode;
use crate::table::TableSummary;

/// A headless Bevy app wrapper for testing.
pub(crate) struct TestApp {
    pub app: App,
}

impl TestApp {
    /// Create a new test app with default seed.
    pub fn new() -> Self {
        Self::with_seed(12345)
    }

    /// Create a new test app with a specific RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_plugin(MarblePoolHeadlessPlugin {
            seed,
            ..Default::default()
        })
    }

    /// Create a new test app around a configured plugin.
    pub fn with_plugin(plugin: MarblePoolHeadlessPlugin) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(plugin);
        // Pause virtual time so that only explicit step_physics calls
        // advance the table.
        app.world_mut().resource_mut::<Time<Virtual>>().pause();
        app.update();
        Self { app }
    }

    /// Advance the table by exactly `n` fixed timesteps.
    ///
    /// Uses `Time<Fixed>::accumulate_overstep` to feed time directly into
    /// the fixed-timestep accumulator, bypassing virtual time.
    pub fn step_physics(&mut self, n: usize) {
        let dt = std::time::Duration::from_secs_f32(PHYSICS_DT);
        for _ in 0..n {
            self.app
                .world_mut()
                .resource_mut::<Time<Fixed>>()
                .accumulate_overstep(dt);
            self.app.update();
        }
    }

    /// Push a command to the command queue.
    pub fn push_command(&mut self, command: TableCommand) {
        self.app.world().resource::<CommandQueue>().push(command);
    }

    /// Load a stage and run one tick so the command is processed.
    pub fn load_stage(&mut self, stage: &str, mode: GameMode) {
        self.push_command(TableCommand::LoadStage {
            stage: stage.to_string(),
            mode: Some(mode),
        });
        self.step_physics(1);
    }

    pub fn summary(&self) -> Option<TableSummary> {
        self.app.world().resource::<TableSummaryRes>().summary.clone()
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }
}
