//! Static obstacles: shooting platforms and the ramps/pillars built by
//! structure marbles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::{PILLAR_MESH, PLATFORM_MESH, RAMP_MESH};

/// Unique identifier for a structure.
pub type StructureId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Temporary pad the shot marble sits on.
    Platform,
    Ramp,
    Pillar,
}

impl StructureKind {
    pub const fn mesh_key(self) -> &'static str {
        match self {
            Self::Platform => PLATFORM_MESH,
            Self::Ramp => RAMP_MESH,
            Self::Pillar => PILLAR_MESH,
        }
    }

    pub const fn texture_key(self) -> &'static str {
        match self {
            Self::Platform => "square",
            Self::Ramp => "structure_ramp",
            Self::Pillar => "structure_pillar",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub kind: StructureKind,
    pub position: Vec3,
    /// Rotation around Z.
    pub angle: f32,
    pub scale: f32,
    /// Turn boundaries survived.
    pub turns_alive: u32,
    pub is_shrinking: bool,
    pub is_dead: bool,
    pub time: u32,
}

impl Structure {
    pub fn new(id: StructureId, kind: StructureKind, position: Vec3, angle: f32) -> Self {
        Self {
            id,
            kind,
            position,
            angle,
            scale: 1.0,
            turns_alive: 0,
            is_shrinking: false,
            is_dead: false,
            time: 0,
        }
    }

    /// Advances the shrink animation. Returns `true` once the structure is gone.
    pub fn update(&mut self, shrink_rate: f32) -> bool {
        if self.is_dead {
            return true;
        }
        self.time += 1;
        if self.is_shrinking {
            self.scale -= shrink_rate;
            if self.scale <= 0.0 {
                self.scale = 0.0;
                self.is_dead = true;
            }
        }
        self.is_dead
    }

    /// Ages the structure by one turn. Returns `true` when it starts shrinking.
    pub fn age(&mut self, lifetime_turns: u32) -> bool {
        if self.is_shrinking || self.is_dead {
            return false;
        }
        self.turns_alive += 1;
        if self.turns_alive >= lifetime_turns {
            self.is_shrinking = true;
            return true;
        }
        false
    }
}

/// Registry of structures in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureManager {
    structures: Vec<Structure>,
    next_id: StructureId,
}

impl StructureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: StructureKind, position: Vec3, angle: f32) -> StructureId {
        let id = self.next_id;
        self.next_id += 1;
        self.structures.push(Structure::new(id, kind, position, angle));
        id
    }

    pub fn remove(&mut self, id: StructureId) -> Option<Structure> {
        let index = self.structures.iter().position(|s| s.id == id)?;
        Some(self.structures.remove(index))
    }

    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.structures.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn clear(&mut self) -> Vec<Structure> {
        self.structures.drain(..).collect()
    }
}
