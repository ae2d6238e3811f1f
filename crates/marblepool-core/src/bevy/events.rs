//! ECS messages published by the headless table.
//!
//! In Bevy 0.18+, buffered events use the Message trait instead of Event.

use bevy::prelude::*;

use crate::events::TableEvent;
use crate::player::Player;

/// One side effect produced by the table during a tick.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct TableEventMessage(pub TableEvent);

/// Message fired when a stage has been loaded onto the table.
#[derive(Message, Debug, Clone)]
pub struct StageLoadedMessage {
    pub stage: String,
}

/// Message fired when a player wins.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VictoryMessage {
    pub winner: Player,
    pub from_run_out: bool,
}
