//! Gameplay and physics tunables.
//!
//! Every number the table logic depends on lives here so hosts can tweak the
//! feel of the game from a JSON file without touching code.

use serde::{Deserialize, Serialize};

/// Fixed timestep for physics simulation (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Screen-space layout of the inventory strip used while picking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HudLayout {
    /// Left edge of slot 0, in game-space pixels.
    pub inventory_left: f32,
    pub inventory_top: f32,
    pub inventory_bottom: f32,
    /// Width of one inventory slot.
    pub slot_width: f32,
}

impl Default for HudLayout {
    fn default() -> Self {
        Self {
            inventory_left: 130.0,
            inventory_top: 460.0,
            inventory_bottom: 540.0,
            slot_width: 64.0,
        }
    }
}

impl HudLayout {
    /// Maps a mouse position to an inventory slot index.
    ///
    /// Returns `None` outside the strip; the caller still has to check the
    /// index against the inventory length.
    pub fn slot_at(&self, mouse: [f32; 2], slot_count: usize) -> Option<usize> {
        let [x, y] = mouse;
        #[allow(clippy::cast_precision_loss)]
        let right = self.inventory_left + self.slot_width * slot_count as f32;
        if x < self.inventory_left || x >= right || y < self.inventory_top || y > self.inventory_bottom {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = ((x - self.inventory_left) / self.slot_width) as usize;
        Some(index)
    }

    /// Centre of a slot, handy for scripted input.
    pub fn slot_center(&self, index: usize) -> [f32; 2] {
        #[allow(clippy::cast_precision_loss)]
        let x = self.inventory_left + self.slot_width * (index as f32 + 0.5);
        [x, f32::midpoint(self.inventory_top, self.inventory_bottom)]
    }
}

/// Turn, ability and AI tunables for the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    /// Frames of held mouse button that reach full power.
    pub shoot_time: u32,
    pub min_shoot_power: f32,
    pub max_shoot_power: f32,
    /// Speed under which a marble counts as stopped.
    pub marble_stop_threshold: f32,
    /// Consecutive stopped frames required before a shot can end.
    pub settle_frames: u32,
    /// Initial value of the end-of-shot wait counter.
    pub shot_min_wait: u32,
    /// Wait imposed after a marble turns into a structure.
    pub structure_wait: u32,
    /// Wait imposed when a turn ends without a physical shot.
    pub pass_wait: u32,
    /// Frames a phase must have lasted before clicks are accepted.
    pub phase_debounce: u32,
    pub moves_per_turn: u32,
    pub max_inventory_size: usize,
    pub fire_speed_threshold: f32,
    pub fire_particle_chance: f64,
    pub shock_range: f32,
    pub shock_force: f32,
    pub structure_stop_threshold: f32,
    pub structure_touch_frames: u32,
    pub structure_lifetime_turns: u32,
    pub shooter_lifetime_turns: u32,
    pub shrink_rate: f32,
    /// Radius within which an aim point snaps onto a shoot-zone boundary.
    pub snap_distance: f32,
    pub ai_pick_frame: u32,
    pub ai_shoot_frame: u32,
    pub ai_attempts: u32,
    pub ai_defensive_skip_chance: f64,
    pub ai_frozen_penalty: f32,
    pub ai_defense_power: f32,
    pub ai_defense_jitter: f32,
    pub ai_offense_power: f32,
    pub ai_offense_jitter: f32,
    pub announcement_frames: u32,
    pub victory_exit_delay: u32,
    pub victory_animation_count: u32,
    pub victory_animation_interval: u32,
    pub hud: HudLayout,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            shoot_time: 55,
            min_shoot_power: 0.1,
            max_shoot_power: 30.0,
            marble_stop_threshold: 0.1,
            settle_frames: 20,
            shot_min_wait: 30,
            structure_wait: 40,
            pass_wait: 20,
            phase_debounce: 5,
            moves_per_turn: 2,
            max_inventory_size: 8,
            fire_speed_threshold: 1.8,
            fire_particle_chance: 0.3,
            shock_range: 6.0,
            shock_force: 40.0,
            structure_stop_threshold: 0.6,
            structure_touch_frames: 3,
            structure_lifetime_turns: 4,
            shooter_lifetime_turns: 2,
            shrink_rate: 0.05,
            snap_distance: 1.0,
            ai_pick_frame: 30,
            ai_shoot_frame: 90,
            ai_attempts: 30,
            ai_defensive_skip_chance: 0.6,
            ai_frozen_penalty: 10.0,
            ai_defense_power: 0.5,
            ai_defense_jitter: 0.1,
            ai_offense_power: 1.03,
            ai_offense_jitter: 0.2,
            announcement_frames: 90,
            victory_exit_delay: 120,
            victory_animation_count: 12,
            victory_animation_interval: 8,
            hud: HudLayout::default(),
        }
    }
}

impl TableConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Friction/restitution pair for one class of contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// Rigid-body world settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity in game space (Z up).
    pub gravity: [f32; 3],
    pub marble_linear_damping: f32,
    pub marble_angular_damping: f32,
    /// Marble against the static table mesh.
    pub marble_table: ContactMaterial,
    /// Marble against a structure.
    pub marble_structure: ContactMaterial,
    /// Marble against marble.
    pub marble_marble: ContactMaterial,
    /// Minimum table-hit force that produces a sound.
    pub table_hit_threshold: f32,
    /// Minimum marble-hit force that produces a sound.
    pub marble_hit_threshold: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -30.0],
            marble_linear_damping: 0.7,
            marble_angular_damping: 0.9,
            marble_table: ContactMaterial {
                friction: 0.06,
                restitution: 0.5,
            },
            marble_structure: ContactMaterial {
                friction: 0.06,
                restitution: 0.5,
            },
            marble_marble: ContactMaterial {
                friction: 0.1,
                restitution: 0.95,
            },
            table_hit_threshold: 50.0,
            marble_hit_threshold: 10.0,
        }
    }
}
