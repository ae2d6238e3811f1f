//! The two seats at the table.

use serde::{Deserialize, Serialize};

/// One of the two players sharing the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::P1, Player::P2];

    pub const fn other(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "p1",
            Self::P2 => "p2",
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is making the decisions for a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Computer,
}

/// How the two seats are controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Player one against the computer.
    #[default]
    SinglePlayer,
    /// Two humans sharing the machine.
    Multiplayer,
    /// Computer against computer.
    Demo,
}

impl GameMode {
    pub const fn controller(self, player: Player) -> Controller {
        match (self, player) {
            (Self::Multiplayer, _) | (Self::SinglePlayer, Player::P1) => Controller::Human,
            (Self::Demo, _) | (Self::SinglePlayer, Player::P2) => Controller::Computer,
        }
    }
}
