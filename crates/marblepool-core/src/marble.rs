//! Marble kinds, the per-marble state machine and the marble registry.

use std::f32::consts::PI;
use std::fmt;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::structure::StructureKind;

/// Unique identifier for a marble.
pub type MarbleId = u32;

/// Density scale applied on top of the per-kind density.
pub const MASS_FACTOR: f32 = 15.18;

/// Every kind of marble that can appear on the table or in an inventory.
///
/// Serialized as its snake_case string name. Unrecognized names become
/// [`MarbleType::Unknown`], which behaves like a plain marble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarbleType {
    Basic,
    Goal(Player),
    Bonus,
    Heavy,
    Mega,
    Fire,
    Shock,
    Metal,
    StructureRamp,
    StructurePillar,
    Shooter(Player),
    Evil,
    PlusOne,
    Unknown,
}

/// Static per-kind data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarbleProperties {
    pub scale: f32,
    pub density: f32,
    /// Rendered without lighting (glowing marbles).
    pub unshaded: bool,
    /// Ignored by fire.
    pub fire_immune: bool,
}

const fn props(scale: f32, density: f32, unshaded: bool) -> MarbleProperties {
    MarbleProperties {
        scale,
        density,
        unshaded,
        fire_immune: false,
    }
}

impl MarbleType {
    pub const ALL: [MarbleType; 16] = [
        Self::Basic,
        Self::Goal(Player::P1),
        Self::Goal(Player::P2),
        Self::Bonus,
        Self::Heavy,
        Self::Mega,
        Self::Fire,
        Self::Shock,
        Self::Metal,
        Self::StructureRamp,
        Self::StructurePillar,
        Self::Shooter(Player::P1),
        Self::Shooter(Player::P2),
        Self::Evil,
        Self::PlusOne,
        Self::Unknown,
    ];

    /// Parses a type name, falling back to [`MarbleType::Unknown`].
    pub fn parse(name: &str) -> Self {
        match name {
            "basic" => Self::Basic,
            "goal_p1" => Self::Goal(Player::P1),
            "goal_p2" => Self::Goal(Player::P2),
            "bonus" => Self::Bonus,
            "heavy" => Self::Heavy,
            "mega" => Self::Mega,
            "fire" => Self::Fire,
            "shock" => Self::Shock,
            "metal" => Self::Metal,
            "structure_ramp" => Self::StructureRamp,
            "structure_pillar" => Self::StructurePillar,
            "shooter_p1" => Self::Shooter(Player::P1),
            "shooter_p2" => Self::Shooter(Player::P2),
            "evil" => Self::Evil,
            "plus_one" => Self::PlusOne,
            "unknown" => Self::Unknown,
            other => {
                tracing::warn!("[level] Unknown marble type '{}', using defaults", other);
                Self::Unknown
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Goal(Player::P1) => "goal_p1",
            Self::Goal(Player::P2) => "goal_p2",
            Self::Bonus => "bonus",
            Self::Heavy => "heavy",
            Self::Mega => "mega",
            Self::Fire => "fire",
            Self::Shock => "shock",
            Self::Metal => "metal",
            Self::StructureRamp => "structure_ramp",
            Self::StructurePillar => "structure_pillar",
            Self::Shooter(Player::P1) => "shooter_p1",
            Self::Shooter(Player::P2) => "shooter_p2",
            Self::Evil => "evil",
            Self::PlusOne => "plus_one",
            Self::Unknown => "unknown",
        }
    }

    pub const fn properties(self) -> MarbleProperties {
        match self {
            Self::Goal(_) => MarbleProperties {
                fire_immune: true,
                ..props(0.67, 1.2, false)
            },
            Self::Bonus => props(0.46, 0.8, true),
            Self::Heavy => props(0.9, 2.0, false),
            Self::Mega => props(1.3, 1.5, false),
            Self::Metal => props(0.5, 4.0, false),
            Self::Fire | Self::Shock | Self::Evil | Self::PlusOne => props(0.5, 1.0, true),
            Self::Basic
            | Self::StructureRamp
            | Self::StructurePillar
            | Self::Shooter(_)
            | Self::Unknown => props(0.5, 1.0, false),
        }
    }

    pub const fn scale(self) -> f32 {
        self.properties().scale
    }

    pub const fn density(self) -> f32 {
        self.properties().density
    }

    pub const fn goal_owner(self) -> Option<Player> {
        match self {
            Self::Goal(player) => Some(player),
            _ => None,
        }
    }

    pub const fn shooter_owner(self) -> Option<Player> {
        match self {
            Self::Shooter(player) => Some(player),
            _ => None,
        }
    }

    /// The structure this marble turns into once shot and stopped.
    pub const fn structure_kind(self) -> Option<StructureKind> {
        match self {
            Self::StructureRamp => Some(StructureKind::Ramp),
            Self::StructurePillar => Some(StructureKind::Pillar),
            _ => None,
        }
    }

    /// Same kind for the other team (goal and shooter marbles swap owner).
    pub const fn team_swapped(self) -> Self {
        match self {
            Self::Goal(player) => Self::Goal(player.other()),
            Self::Shooter(player) => Self::Shooter(player.other()),
            other => other,
        }
    }

    /// Texture asset key for the renderer.
    pub fn texture_key(self, frozen: bool) -> String {
        match (self, frozen) {
            (Self::Unknown, _) => "square".to_string(),
            (_, true) => "uv_marble_frozen".to_string(),
            (kind, false) => format!("uv_marble_{}", kind.as_str()),
        }
    }
}

impl fmt::Display for MarbleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MarbleType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for MarbleType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<MarbleType> for String {
    fn from(kind: MarbleType) -> Self {
        kind.as_str().to_string()
    }
}

/// Mass of a marble: sphere volume times density times [`MASS_FACTOR`].
pub fn marble_mass(scale: f32, density: f32) -> f32 {
    let radius = scale / 2.0;
    4.0 / 3.0 * PI * radius.powi(3) * MASS_FACTOR * density
}

/// Impulse a shockwave at `origin` applies to a marble at `target`.
///
/// Strength falls off linearly from `force` at distance zero to nothing at
/// `range`.
pub fn shockwave_impulse(origin: Vec3, target: Vec3, range: f32, force: f32) -> Option<Vec3> {
    let distance = origin.distance(target);
    if distance >= range {
        return None;
    }
    let strength = crate::util::lerp(force, 0.0, distance / range);
    Some((target - origin).normalize_or_zero() * strength)
}

/// Thresholds a marble needs for its per-frame update.
#[derive(Debug, Clone, Copy)]
pub struct MarbleFrameContext {
    /// Marbles below this height are collected.
    pub collect_height: f32,
    pub fire_speed_threshold: f32,
    pub fire_particle_chance: f64,
    pub structure_stop_threshold: f32,
    pub structure_touch_frames: u32,
}

/// What a marble asks the table to do after its update.
#[derive(Debug, Clone, PartialEq)]
pub enum MarbleAction {
    /// Fell below the collect height.
    Collected,
    /// Emit a fire particle at the marble.
    FireParticle { position: Vec3 },
    /// Replace the marble with a structure.
    BecomeStructure {
        kind: StructureKind,
        position: Vec3,
        angle: f32,
    },
}

/// A marble on the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marble {
    pub id: MarbleId,
    pub kind: MarbleType,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw, pitch and roll mirrored from the physics body.
    pub rotation: [f32; 3],
    pub scale: f32,
    pub density: f32,
    /// Launched by a player this turn.
    pub is_shot: bool,
    pub is_frozen: bool,
    pub should_be_frozen: bool,
    /// Frames since the marble last touched the table or a structure.
    pub table_touch_time: u32,
    pub is_marked_for_death: bool,
    pub is_dead: bool,
    /// Has a body in the physics world.
    pub is_physical: bool,
    /// A shock marble that already sent its wave.
    pub has_fired: bool,
    /// Turn boundaries survived since the marble was shot.
    pub turns_alive: u32,
    pub time: u32,
    heading: Vec2,
}

impl Marble {
    /// Creates a marble resting on `ground`, lifted by half its size.
    pub fn new(id: MarbleId, kind: MarbleType, ground: Vec3) -> Self {
        let MarbleProperties { scale, density, .. } = kind.properties();
        Self {
            id,
            kind,
            position: ground + Vec3::Z * (scale * 0.5 + 0.1),
            velocity: Vec3::ZERO,
            rotation: [0.0; 3],
            scale,
            density,
            is_shot: false,
            is_frozen: false,
            should_be_frozen: false,
            table_touch_time: 0,
            is_marked_for_death: false,
            is_dead: false,
            is_physical: false,
            has_fired: false,
            turns_alive: 0,
            time: 0,
            heading: Vec2::X,
        }
    }

    pub fn radius(&self) -> f32 {
        self.scale / 2.0
    }

    pub fn mass(&self) -> f32 {
        marble_mass(self.scale, self.density)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Live and not waiting for removal.
    pub fn is_alive(&self) -> bool {
        !self.is_dead && !self.is_marked_for_death
    }

    pub fn is_on_fire(&self, speed_threshold: f32) -> bool {
        self.kind == MarbleType::Fire && self.is_alive() && self.speed() > speed_threshold
    }

    /// Sets the marble alight. Returns `true` if it will burn.
    pub fn burn_up(&mut self) -> bool {
        if self.kind.properties().fire_immune || !self.is_alive() {
            return false;
        }
        self.is_marked_for_death = true;
        true
    }

    /// Marks a shock marble as spent. Returns `false` if it cannot fire.
    pub fn fire_shockwave(&mut self) -> bool {
        if self.kind != MarbleType::Shock || self.has_fired || !self.is_alive() || !self.is_physical {
            return false;
        }
        self.has_fired = true;
        self.is_marked_for_death = true;
        true
    }

    /// Direction of travel in the table plane, as an angle around Z.
    pub fn heading_angle(&self) -> f32 {
        self.heading.y.atan2(self.heading.x)
    }

    pub fn texture_key(&self) -> String {
        self.kind.texture_key(self.is_frozen)
    }

    /// Advances the marble by one frame.
    pub fn update<R: Rng>(&mut self, ctx: &MarbleFrameContext, rng: &mut R) -> Vec<MarbleAction> {
        let mut actions = Vec::new();
        if self.is_dead {
            return actions;
        }
        self.time += 1;

        let planar = self.velocity.truncate();
        if planar.length_squared() > f32::EPSILON {
            self.heading = planar.normalize();
        }

        if self.is_physical && self.position.z < ctx.collect_height {
            self.is_dead = true;
            actions.push(MarbleAction::Collected);
            return actions;
        }

        if self.is_on_fire(ctx.fire_speed_threshold) && rng.random::<f64>() < ctx.fire_particle_chance {
            actions.push(MarbleAction::FireParticle {
                position: self.position,
            });
        }

        if let Some(kind) = self.kind.structure_kind() {
            let grounded = self.table_touch_time < ctx.structure_touch_frames;
            if self.is_shot
                && self.is_alive()
                && grounded
                && self.speed() < ctx.structure_stop_threshold
            {
                self.is_dead = true;
                actions.push(MarbleAction::BecomeStructure {
                    kind,
                    position: self.position - Vec3::Z * (self.scale / 2.0),
                    angle: self.heading_angle(),
                });
            }
        }

        actions
    }
}

/// Registry of marbles in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarbleManager {
    marbles: Vec<Marble>,
    next_id: MarbleId,
}

impl MarbleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a marble resting on `ground` and returns its ID.
    pub fn spawn(&mut self, kind: MarbleType, ground: Vec3) -> MarbleId {
        let id = self.next_id;
        self.next_id += 1;
        self.marbles.push(Marble::new(id, kind, ground));
        id
    }

    pub fn remove(&mut self, id: MarbleId) -> Option<Marble> {
        let index = self.marbles.iter().position(|m| m.id == id)?;
        Some(self.marbles.remove(index))
    }

    pub fn get(&self, id: MarbleId) -> Option<&Marble> {
        self.marbles.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MarbleId) -> Option<&mut Marble> {
        self.marbles.iter_mut().find(|m| m.id == id)
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Marble> {
        self.marbles.iter_mut()
    }

    /// IDs in update order.
    pub fn ids(&self) -> Vec<MarbleId> {
        self.marbles.iter().map(|m| m.id).collect()
    }

    /// Number of live marbles of the given kind.
    pub fn live_count(&self, kind: MarbleType) -> usize {
        self.marbles.iter().filter(|m| m.kind == kind && !m.is_dead).count()
    }

    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }

    /// Removes every marble and returns them.
    pub fn clear(&mut self) -> Vec<Marble> {
        self.marbles.drain(..).collect()
    }
}
