//! Side effects the table produces for the renderer and audio collaborators.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Name of a table phase, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Picking,
    Positioning,
    Shooting,
    Shot,
    Ai,
    Victory,
}

impl PhaseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Picking => "picking",
            Self::Positioning => "positioning",
            Self::Shooting => "shooting",
            Self::Shot => "shot",
            Self::Ai => "ai",
            Self::Victory => "victory",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Particle bursts the renderer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Fire,
    Burn,
    Shockwave,
    Structure,
    Collect,
    Expire,
}

/// One side effect, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    Sound { name: String, volume: f32, pitch: f32 },
    Particles { kind: ParticleKind, position: Vec3 },
    Announcement { text: String },
    PhaseChanged { from: PhaseKind, to: PhaseKind },
    TurnChanged { player: Player },
    Victory { winner: Player, from_run_out: bool },
    /// The table has been torn down and the host should leave the stage.
    Exit,
}

impl TableEvent {
    pub fn sound(name: &str, volume: f32, pitch: f32) -> Self {
        Self::Sound {
            name: name.to_string(),
            volume,
            pitch,
        }
    }
}
