//! Stage data: marble layout, shoot zones and starting inventories.
//!
//! Stages are plain JSON with camelCase keys. A catalog maps stage names to
//! stages; the default catalog is compiled into the crate.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::marble::MarbleType;
use crate::mesh::MeshSource;
use crate::player::Player;
use crate::util::{closed_path, is_point_in_polygon};

/// Default stage catalog, embedded at compile time.
pub const BUILTIN_STAGES: &str = include_str!("../stages/stages.json");

/// Automatic duplication of marbles and shoot zones for the second team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symmetry {
    #[default]
    None,
    /// Reflect across the X axis: (x, y) -> (x, -y).
    Mirror,
    /// Half turn around the origin: (x, y) -> (-x, -y).
    Rotate,
}

impl Symmetry {
    fn apply(self, point: Vec2) -> Option<Vec2> {
        match self {
            Self::None => None,
            Self::Mirror => Some(Vec2::new(point.x, -point.y)),
            Self::Rotate => Some(-point),
        }
    }

    /// Marbles on the symmetry axis (or centre) are not duplicated.
    fn is_fixed_point(self, point: Vec2) -> bool {
        match self {
            Self::None => true,
            Self::Mirror => point.y == 0.0,
            Self::Rotate => point == Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarbleSpawn {
    #[serde(rename = "type")]
    pub kind: MarbleType,
    pub position: [f32; 3],
}

impl MarbleSpawn {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Polygon at a fixed height where shots can be launched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootZone {
    pub height: f32,
    pub polygon: Vec<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_restriction: Option<Player>,
}

impl ShootZone {
    pub fn points(&self) -> Vec<Vec2> {
        self.polygon.iter().map(|p| Vec2::from_array(*p)).collect()
    }

    pub fn allows(&self, player: Player) -> bool {
        self.player_restriction.is_none_or(|p| p == player)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        is_point_in_polygon(&self.points(), point)
    }

    /// Zone boundary as a closed path.
    pub fn boundary(&self) -> Vec<Vec2> {
        closed_path(&self.points())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub title: String,
    pub stage_mesh: String,
    #[serde(default)]
    pub stage_texture: String,
    #[serde(default)]
    pub theme: String,
    pub marble_collect_height: f32,
    #[serde(default)]
    pub marble_collection: Vec<MarbleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_marble_collection: Option<Vec<MarbleType>>,
    #[serde(default)]
    pub marbles: Vec<MarbleSpawn>,
    #[serde(default)]
    pub feature_symmetry: Symmetry,
    #[serde(default)]
    pub no_team_mirror: bool,
    #[serde(default)]
    pub shoot_zones: Vec<ShootZone>,
}

impl Stage {
    fn mirrored_kind(&self, kind: MarbleType) -> MarbleType {
        if self.no_team_mirror { kind } else { kind.team_swapped() }
    }

    /// Authored marbles followed by their symmetric copies.
    pub fn expanded_marbles(&self) -> Vec<MarbleSpawn> {
        let mut spawns = Vec::with_capacity(self.marbles.len() * 2);
        for spawn in &self.marbles {
            spawns.push(spawn.clone());
            let [x, y, z] = spawn.position;
            let point = Vec2::new(x, y);
            if self.feature_symmetry.is_fixed_point(point) {
                continue;
            }
            if let Some(mirrored) = self.feature_symmetry.apply(point) {
                spawns.push(MarbleSpawn {
                    kind: self.mirrored_kind(spawn.kind),
                    position: [mirrored.x, mirrored.y, z],
                });
            }
        }
        spawns
    }

    /// Authored shoot zones followed by their symmetric copies.
    pub fn expanded_shoot_zones(&self) -> Vec<ShootZone> {
        let mut zones = self.shoot_zones.clone();
        for zone in &self.shoot_zones {
            let polygon: Option<Vec<[f32; 2]>> = zone
                .points()
                .into_iter()
                .map(|p| self.feature_symmetry.apply(p).map(|v| v.to_array()))
                .collect();
            let Some(polygon) = polygon else {
                continue;
            };
            let player_restriction = if self.no_team_mirror {
                zone.player_restriction
            } else {
                zone.player_restriction.map(Player::other)
            };
            zones.push(ShootZone {
                height: zone.height,
                polygon,
                player_restriction,
            });
        }
        for zone in &zones {
            if zone.polygon.len() < 3 {
                tracing::warn!("[level] Shoot zone in '{}' has fewer than 3 points", self.title);
            }
        }
        zones
    }

    /// Starting inventory for a seat.
    pub fn starting_collection(&self, player: Player, computer: bool) -> &[MarbleType] {
        match (player, &self.ai_marble_collection) {
            (Player::P2, Some(ai)) if computer => ai,
            _ => &self.marble_collection,
        }
    }
}

/// Named collection of stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageCatalog {
    stages: BTreeMap<String, Stage>,
}

impl StageCatalog {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The catalog compiled into the crate.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_STAGES).expect("builtin stage catalog is valid JSON")
    }

    pub fn stage(&self, name: &str) -> Result<&Stage, LevelError> {
        self.stages
            .get(name)
            .ok_or_else(|| LevelError::UnknownStage(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, stage: Stage) {
        self.stages.insert(name.into(), stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Checks that every stage's table mesh is available.
    pub fn validate(&self, meshes: &dyn MeshSource) -> Result<(), LevelError> {
        for (name, stage) in &self.stages {
            if meshes.mesh(&stage.stage_mesh).is_none() {
                return Err(LevelError::MissingMesh {
                    stage: name.clone(),
                    mesh: stage.stage_mesh.clone(),
                });
            }
        }
        Ok(())
    }
}
