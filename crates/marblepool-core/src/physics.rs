//! Physics simulation using `Rapier3D` with deterministic behavior.
//!
//! [`PhysicsWorld`] owns the rigid-body world and the mapping from marbles and
//! structures to bodies. Game entities never touch Rapier directly: the table
//! adds and removes bodies through this adapter, and each step reports the
//! contacts it saw as a list of [`ContactEvent`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec3;
use parking_lot::Mutex;
use rapier3d::prelude::*;

use crate::config::{ContactMaterial, PHYSICS_DT, PhysicsConfig};
use crate::error::PhysicsError;
use crate::marble::{Marble, MarbleId, MarbleManager};
use crate::mesh::TriangleMesh;
use crate::structure::{Structure, StructureId};
use crate::util::quaternion_to_yaw_pitch_roll;

/// Type tags for collider `user_data` encoding.
pub const USER_DATA_TABLE: u64 = 1;
pub const USER_DATA_MARBLE: u64 = 2;
pub const USER_DATA_STRUCTURE: u64 = 3;

/// Encodes a type tag and ID into u128 user_data.
pub fn encode_user_data(type_tag: u64, id: u64) -> u128 {
    (u128::from(type_tag) << 64) | u128::from(id)
}

/// Decodes u128 user_data into (type_tag, id).
#[allow(clippy::cast_possible_truncation)]
pub fn decode_user_data(user_data: u128) -> (u64, u64) {
    ((user_data >> 64) as u64, user_data as u64)
}

/// A contact that began during the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    /// Marble hit the static table.
    TableHit { marble: MarbleId, force: f32 },
    /// Marble hit a structure.
    StructureHit {
        marble: MarbleId,
        structure: StructureId,
        force: f32,
    },
    /// Two marbles hit each other.
    MarbleHit { a: MarbleId, b: MarbleId, force: f32 },
}

/// Which body a collider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BodyTag {
    Table,
    Marble(MarbleId),
    Structure(StructureId),
}

impl BodyTag {
    #[allow(clippy::cast_possible_truncation)]
    fn decode(user_data: u128) -> Option<Self> {
        match decode_user_data(user_data) {
            (USER_DATA_TABLE, _) => Some(Self::Table),
            (USER_DATA_MARBLE, id) => Some(Self::Marble(id as MarbleId)),
            (USER_DATA_STRUCTURE, id) => Some(Self::Structure(id as StructureId)),
            _ => None,
        }
    }
}

/// Raw contact captured inside the Rapier callback.
#[derive(Debug, Clone, Copy)]
enum RawContact {
    Started { a: BodyTag, b: BodyTag, speed: f32 },
    Stopped { a: BodyTag, b: BodyTag },
}

/// Collects collision events during a pipeline step.
///
/// Rapier requires `Send + Sync` handlers, so the buffer sits behind a mutex.
#[derive(Default)]
struct ContactCollector {
    contacts: Mutex<Vec<RawContact>>,
}

impl ContactCollector {
    fn tag(colliders: &ColliderSet, handle: ColliderHandle) -> Option<BodyTag> {
        colliders.get(handle).and_then(|c| BodyTag::decode(c.user_data))
    }

    fn velocity(bodies: &RigidBodySet, colliders: &ColliderSet, handle: ColliderHandle) -> Vec3 {
        colliders
            .get(handle)
            .and_then(|c| c.parent())
            .and_then(|parent| bodies.get(parent))
            .map_or(Vec3::ZERO, |body| {
                let v = body.linvel();
                Vec3::new(v.x, v.y, v.z)
            })
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        match event {
            CollisionEvent::Started(h1, h2, _) => {
                let (Some(a), Some(b)) = (Self::tag(colliders, h1), Self::tag(colliders, h2)) else {
                    return;
                };
                // Velocities are still pre-impact here: events fire before the solver.
                let relative = Self::velocity(bodies, colliders, h1) - Self::velocity(bodies, colliders, h2);
                let normal = contact_pair
                    .and_then(|pair| pair.manifolds.first())
                    .map(|manifold| {
                        let n = manifold.data.normal;
                        Vec3::new(n.x, n.y, n.z)
                    })
                    .unwrap_or(Vec3::ZERO);
                let speed = if normal == Vec3::ZERO {
                    relative.length()
                } else {
                    relative.dot(normal).abs()
                };
                self.contacts.lock().push(RawContact::Started { a, b, speed });
            }
            CollisionEvent::Stopped(h1, h2, _) => {
                if let (Some(a), Some(b)) = (Self::tag(colliders, h1), Self::tag(colliders, h2)) {
                    self.contacts.lock().push(RawContact::Stopped { a, b });
                }
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Picks friction and restitution for each contact from the material of the
/// pair, not from the two colliders' own coefficients.
#[derive(Debug, Clone, Copy)]
struct MaterialHooks {
    marble_marble: ContactMaterial,
    marble_table: ContactMaterial,
    marble_structure: ContactMaterial,
}

impl MaterialHooks {
    fn material(&self, a: BodyTag, b: BodyTag) -> Option<ContactMaterial> {
        match (a, b) {
            (BodyTag::Marble(_), BodyTag::Marble(_)) => Some(self.marble_marble),
            (BodyTag::Marble(_), BodyTag::Table) | (BodyTag::Table, BodyTag::Marble(_)) => Some(self.marble_table),
            (BodyTag::Marble(_), BodyTag::Structure(_)) | (BodyTag::Structure(_), BodyTag::Marble(_)) => {
                Some(self.marble_structure)
            }
            _ => None,
        }
    }
}

impl PhysicsHooks for MaterialHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let tag = |handle| context.colliders.get(handle).and_then(|c| BodyTag::decode(c.user_data));
        let (Some(a), Some(b)) = (tag(context.collider1), tag(context.collider2)) else {
            return;
        };
        let Some(material) = self.material(a, b) else {
            return;
        };
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = material.friction;
            contact.restitution = material.restitution;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MarbleBody {
    body: RigidBodyHandle,
    mass: f32,
}

/// Physics world containing all `Rapier3D` components for deterministic simulation.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vector,
    pub frame: u64,
    config: PhysicsConfig,
    table: Option<RigidBodyHandle>,
    marbles: BTreeMap<MarbleId, MarbleBody>,
    structures: BTreeMap<StructureId, RigidBodyHandle>,
    /// Marble contacts with the table or a structure that are still touching.
    ground_contacts: BTreeSet<(MarbleId, BodyTag)>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("marbles", &self.marbles.len())
            .field("structures", &self.structures.len())
            .finish_non_exhaustive()
    }
}

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

fn static_collider(
    mesh: &TriangleMesh,
    key: &str,
    material: ContactMaterial,
    user_data: u128,
) -> Result<Collider, PhysicsError> {
    if mesh.is_empty() {
        return Err(PhysicsError::EmptyMesh(key.to_string()));
    }
    let vertices = mesh.vertices.iter().map(|v| to_vector(*v)).collect();
    let builder = ColliderBuilder::trimesh(vertices, mesh.indices.clone()).map_err(|e| PhysicsError::Trimesh {
        mesh: key.to_string(),
        reason: format!("{e:?}"),
    })?;
    Ok(builder
        .friction(material.friction)
        .restitution(material.restitution)
        .user_data(user_data)
        .build())
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            ..Default::default()
        };
        let [gx, gy, gz] = config.gravity;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(gx, gy, gz),
            frame: 0,
            config,
            table: None,
            marbles: BTreeMap::new(),
            structures: BTreeMap::new(),
            ground_contacts: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Installs the permanent static table body. Replaces any previous table.
    pub fn set_table_mesh(&mut self, mesh: &TriangleMesh, key: &str) -> Result<(), PhysicsError> {
        let collider = static_collider(
            mesh,
            key,
            self.config.marble_table,
            encode_user_data(USER_DATA_TABLE, 0),
        )?;
        if let Some(old) = self.table.take() {
            self.remove_rigid_body(old);
        }
        tracing::debug!("[physics] Table mesh '{}' with {} triangles", key, mesh.triangle_count());
        let handle = self.rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.table = Some(handle);
        Ok(())
    }

    /// Creates a dynamic sphere body for the marble, seeded with its position
    /// and velocity.
    pub fn add_marble(&mut self, marble: &Marble) {
        if self.marbles.contains_key(&marble.id) {
            tracing::warn!("[physics] Marble {} already has a body", marble.id);
            return;
        }
        let mass = marble.mass();
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(marble.position))
            .linvel(to_vector(marble.velocity))
            .linear_damping(self.config.marble_linear_damping)
            .angular_damping(self.config.marble_angular_damping)
            .ccd_enabled(true)
            .build();
        let body = self.rigid_body_set.insert(rigid_body);

        let collider = ColliderBuilder::ball(marble.radius())
            .mass(mass)
            .friction(self.config.marble_marble.friction)
            .restitution(self.config.marble_marble.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            // Pair materials are applied by `MaterialHooks`.
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .user_data(encode_user_data(USER_DATA_MARBLE, u64::from(marble.id)))
            .build();
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);

        self.marbles.insert(marble.id, MarbleBody { body, mass });
    }

    /// Removes the marble's body, if any.
    pub fn remove_marble(&mut self, id: MarbleId) -> bool {
        let Some(entry) = self.marbles.remove(&id) else {
            return false;
        };
        self.remove_rigid_body(entry.body);
        self.ground_contacts.retain(|(marble, _)| *marble != id);
        true
    }

    pub fn has_marble(&self, id: MarbleId) -> bool {
        self.marbles.contains_key(&id)
    }

    /// Creates a fixed trimesh body for the structure from its mesh, scaled and
    /// rotated around Z by the structure's angle.
    pub fn add_structure(&mut self, structure: &Structure, mesh: &TriangleMesh) -> Result<(), PhysicsError> {
        if self.structures.contains_key(&structure.id) {
            return Ok(());
        }
        let scaled = mesh.scaled(structure.scale);
        let collider = static_collider(
            &scaled,
            structure.kind.mesh_key(),
            self.config.marble_structure,
            encode_user_data(USER_DATA_STRUCTURE, u64::from(structure.id)),
        )?;
        let rigid_body = RigidBodyBuilder::fixed()
            .translation(to_vector(structure.position))
            .rotation(Vector::new(0.0, 0.0, structure.angle))
            .build();
        let body = self.rigid_body_set.insert(rigid_body);
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        self.structures.insert(structure.id, body);
        Ok(())
    }

    pub fn remove_structure(&mut self, id: StructureId) -> bool {
        let Some(body) = self.structures.remove(&id) else {
            return false;
        };
        self.remove_rigid_body(body);
        self.ground_contacts
            .retain(|(_, tag)| *tag != BodyTag::Structure(id));
        true
    }

    pub fn has_structure(&self, id: StructureId) -> bool {
        self.structures.contains_key(&id)
    }

    /// Applies an impulse through the marble's center of mass.
    pub fn apply_impulse(&mut self, id: MarbleId, impulse: Vec3) {
        let Some(entry) = self.marbles.get(&id) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(entry.body) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    /// Zeroes linear and angular velocity of every marble body.
    pub fn stop_all_marbles(&mut self) {
        for entry in self.marbles.values() {
            if let Some(body) = self.rigid_body_set.get_mut(entry.body) {
                body.set_linvel(Vector::ZERO, false);
                body.set_angvel(Vector::ZERO, false);
            }
        }
    }

    /// Mass the body was created with.
    pub fn marble_mass(&self, id: MarbleId) -> Option<f32> {
        self.marbles.get(&id).map(|entry| entry.mass)
    }

    pub fn marble_count(&self) -> usize {
        self.marbles.len()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Advances the simulation by one fixed timestep and returns the contacts
    /// that started during it.
    pub fn step(&mut self) -> Vec<ContactEvent> {
        let collector = ContactCollector::default();
        let hooks = MaterialHooks {
            marble_marble: self.config.marble_marble,
            marble_table: self.config.marble_table,
            marble_structure: self.config.marble_structure,
        };
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &hooks,
            &collector,
        );
        self.frame += 1;

        let dt = self.integration_parameters.dt;
        let mut events = Vec::new();
        for contact in collector.contacts.into_inner() {
            match contact {
                RawContact::Started { a, b, speed } => {
                    if let Some(event) = self.resolve_contact(a, b, speed, dt) {
                        events.push(event);
                    }
                }
                RawContact::Stopped { a, b } => match (a, b) {
                    (BodyTag::Marble(id), ground @ (BodyTag::Table | BodyTag::Structure(_)))
                    | (ground @ (BodyTag::Table | BodyTag::Structure(_)), BodyTag::Marble(id)) => {
                        self.ground_contacts.remove(&(id, ground));
                    }
                    _ => {}
                },
            }
        }
        events
    }

    fn resolve_contact(&mut self, a: BodyTag, b: BodyTag, speed: f32, dt: f32) -> Option<ContactEvent> {
        match (a, b) {
            (BodyTag::Marble(marble), ground @ (BodyTag::Table | BodyTag::Structure(_)))
            | (ground @ (BodyTag::Table | BodyTag::Structure(_)), BodyTag::Marble(marble)) => {
                self.ground_contacts.insert((marble, ground));
                let force = speed / dt;
                Some(match ground {
                    BodyTag::Structure(structure) => ContactEvent::StructureHit {
                        marble,
                        structure,
                        force,
                    },
                    _ => ContactEvent::TableHit { marble, force },
                })
            }
            (BodyTag::Marble(first), BodyTag::Marble(second)) => {
                let mass_a = self.marble_mass(first)?;
                let mass_b = self.marble_mass(second)?;
                let reduced = mass_a * mass_b / (mass_a + mass_b);
                let (a, b) = if first < second { (first, second) } else { (second, first) };
                Some(ContactEvent::MarbleHit {
                    a,
                    b,
                    force: speed * reduced / dt,
                })
            }
            _ => None,
        }
    }

    /// Whether the marble currently rests on the table or a structure.
    pub fn is_grounded(&self, id: MarbleId) -> bool {
        self.ground_contacts.range((id, BodyTag::Table)..).next().is_some_and(|(m, _)| *m == id)
    }

    /// Copies body position, velocity and orientation onto the marbles and
    /// updates their table contact timers.
    pub fn sync_marbles(&self, marbles: &mut MarbleManager) {
        for marble in marbles.iter_mut() {
            let Some(entry) = self.marbles.get(&marble.id) else {
                continue;
            };
            let Some(body) = self.rigid_body_set.get(entry.body) else {
                continue;
            };
            let pos = body.translation();
            marble.position = Vec3::new(pos.x, pos.y, pos.z);
            let vel = body.linvel();
            marble.velocity = Vec3::new(vel.x, vel.y, vel.z);
            let rot = body.rotation();
            marble.rotation = quaternion_to_yaw_pitch_roll([rot.x, rot.y, rot.z, rot.w]);

            if self.is_grounded(marble.id) {
                marble.table_touch_time = 0;
            } else {
                marble.table_touch_time = marble.table_touch_time.saturating_add(1);
            }
        }
    }

    /// Steps the world and mirrors the result onto the marbles.
    pub fn simulate_step(&mut self, marbles: &mut MarbleManager) -> Vec<ContactEvent> {
        let events = self.step();
        self.sync_marbles(marbles);
        events
    }

    /// Computes a deterministic hash of the current physics state.
    #[cfg(test)]
    pub fn compute_hash(&self) -> u64 {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.frame.hash(&mut hasher);

        for (id, entry) in &self.marbles {
            id.hash(&mut hasher);
            let Some(body) = self.rigid_body_set.get(entry.body) else {
                continue;
            };
            let pos = body.translation();
            let vel = body.linvel();
            let rot = body.rotation();
            for value in [pos.x, pos.y, pos.z, vel.x, vel.y, vel.z, rot.x, rot.y, rot.z, rot.w] {
                value.to_bits().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Removes every marble and structure body, keeping the table.
    pub fn clear_entities(&mut self) {
        let marbles: Vec<MarbleId> = self.marbles.keys().copied().collect();
        for id in marbles {
            self.remove_marble(id);
        }
        let structures: Vec<StructureId> = self.structures.keys().copied().collect();
        for id in structures {
            self.remove_structure(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marble::MarbleType;
    use crate::mesh::{FLAT_TABLE_MESH, MeshLibrary, MeshSource, RAMP_MESH};
    use crate::structure::StructureKind;

    fn world_with_table() -> PhysicsWorld {
        let library = MeshLibrary::with_builtin_meshes();
        let mut world = PhysicsWorld::new();
        world
            .set_table_mesh(library.mesh(FLAT_TABLE_MESH).unwrap(), FLAT_TABLE_MESH)
            .unwrap();
        world
    }

    fn physical(manager: &mut MarbleManager, world: &mut PhysicsWorld, kind: MarbleType, ground: Vec3) -> MarbleId {
        let id = manager.spawn(kind, ground);
        let marble = manager.get_mut(id).unwrap();
        marble.is_physical = true;
        world.add_marble(marble);
        id
    }

    #[test]
    fn test_user_data_roundtrip() {
        let encoded = encode_user_data(USER_DATA_MARBLE, 42);
        assert_eq!(decode_user_data(encoded), (USER_DATA_MARBLE, 42));
        assert_eq!(BodyTag::decode(encoded), Some(BodyTag::Marble(42)));
        assert_eq!(BodyTag::decode(0), None);
    }

    #[test]
    fn test_marble_falls_and_lands() {
        let mut world = world_with_table();
        let mut manager = MarbleManager::new();
        let id = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::new(0.0, 0.0, 2.0));

        let mut hit_table = false;
        for _ in 0..120 {
            for event in world.simulate_step(&mut manager) {
                if matches!(event, ContactEvent::TableHit { marble, .. } if marble == id) {
                    hit_table = true;
                }
            }
        }

        let marble = manager.get(id).unwrap();
        assert!(hit_table);
        assert!(marble.position.z > 0.0 && marble.position.z < 0.5, "z = {}", marble.position.z);
        assert!(marble.table_touch_time < 3);
    }

    #[test]
    fn test_marble_without_table_falls_forever() {
        let mut world = PhysicsWorld::new();
        let mut manager = MarbleManager::new();
        let id = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::ZERO);
        for _ in 0..30 {
            world.simulate_step(&mut manager);
        }
        let marble = manager.get(id).unwrap();
        assert!(marble.position.z < -1.0);
        assert!(marble.velocity.z < 0.0);
        assert_eq!(marble.table_touch_time, 30);
    }

    #[test]
    fn test_impulse_changes_velocity_by_mass() {
        let mut world = PhysicsWorld::new();
        let mut manager = MarbleManager::new();
        let id = physical(&mut manager, &mut world, MarbleType::Heavy, Vec3::ZERO);
        let mass = world.marble_mass(id).unwrap();

        world.apply_impulse(id, Vec3::new(5.0 * mass, 0.0, 0.0));
        world.simulate_step(&mut manager);
        let vx = manager.get(id).unwrap().velocity.x;
        assert!((vx - 5.0).abs() < 0.2, "vx = {vx}");

        world.stop_all_marbles();
        world.sync_marbles(&mut manager);
        assert_eq!(manager.get(id).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_marbles_collide() {
        let mut world = world_with_table();
        let mut manager = MarbleManager::new();
        let a = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::new(-2.0, 0.0, 0.0));
        let b = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::new(0.0, 0.0, 0.0));
        for _ in 0..30 {
            world.simulate_step(&mut manager);
        }
        let mass = world.marble_mass(a).unwrap();
        world.apply_impulse(a, Vec3::new(10.0 * mass, 0.0, 0.0));

        let mut hit = None;
        for _ in 0..60 {
            for event in world.simulate_step(&mut manager) {
                if let ContactEvent::MarbleHit { a: x, b: y, force } = event {
                    hit = Some((x, y, force));
                }
            }
        }
        let (x, y, force) = hit.expect("marbles never collided");
        assert_eq!((x, y), (a, b));
        assert!(force > 10.0);
        assert!(manager.get(b).unwrap().position.x > 0.1);
    }

    /// Highest upward speed of a basic marble dropped onto the table.
    fn rebound_speed(config: PhysicsConfig) -> f32 {
        let library = MeshLibrary::with_builtin_meshes();
        let mut world = PhysicsWorld::with_config(config);
        world
            .set_table_mesh(library.mesh(FLAT_TABLE_MESH).unwrap(), FLAT_TABLE_MESH)
            .unwrap();
        let mut manager = MarbleManager::new();
        let id = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::new(0.0, 0.0, 3.0));
        let mut peak = 0.0_f32;
        for _ in 0..90 {
            world.simulate_step(&mut manager);
            peak = peak.max(manager.get(id).unwrap().velocity.z);
        }
        peak
    }

    #[test]
    fn test_table_bounce_uses_table_material() {
        let bouncy_table = |marble_restitution: f32| {
            let mut config = PhysicsConfig::default();
            config.marble_table.restitution = 0.9;
            config.marble_marble.restitution = marble_restitution;
            config
        };
        let lively = rebound_speed(bouncy_table(0.95));
        let dull = rebound_speed(bouncy_table(0.1));
        assert!(lively > 3.0, "rebound = {lively}");
        assert!((lively - dull).abs() < 0.05 * lively, "{lively} vs {dull}");

        let mut dead_table = bouncy_table(0.95);
        dead_table.marble_table.restitution = 0.0;
        assert!(rebound_speed(dead_table) < 0.5 * lively);
    }

    #[test]
    fn test_structure_lifecycle() {
        let library = MeshLibrary::with_builtin_meshes();
        let mut world = world_with_table();
        let structure = Structure::new(7, StructureKind::Ramp, Vec3::ZERO, 0.5);

        world.add_structure(&structure, library.mesh(RAMP_MESH).unwrap()).unwrap();
        assert!(world.has_structure(7));
        let bodies = world.rigid_body_set.len();

        assert!(world.remove_structure(7));
        assert!(!world.remove_structure(7));
        assert_eq!(world.rigid_body_set.len(), bodies - 1);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let mut world = PhysicsWorld::new();
        let result = world.set_table_mesh(&TriangleMesh::default(), "nothing");
        assert!(matches!(result, Err(PhysicsError::EmptyMesh(_))));
    }

    #[test]
    fn test_remove_marble_frees_body() {
        let mut world = world_with_table();
        let mut manager = MarbleManager::new();
        let id = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::ZERO);
        assert_eq!(world.marble_count(), 1);
        assert!(world.remove_marble(id));
        assert!(!world.remove_marble(id));
        assert_eq!(world.marble_count(), 0);
        assert_eq!(world.rigid_body_set.len(), 1);
    }

    #[test]
    fn test_deterministic_simulation() {
        let run = || {
            let mut world = world_with_table();
            let mut manager = MarbleManager::new();
            let a = physical(&mut manager, &mut world, MarbleType::Basic, Vec3::new(-1.0, 0.1, 1.0));
            physical(&mut manager, &mut world, MarbleType::Heavy, Vec3::new(1.0, 0.0, 0.5));
            world.apply_impulse(a, Vec3::new(3.0, 0.0, 0.0));
            for _ in 0..100 {
                world.simulate_step(&mut manager);
            }
            world.compute_hash()
        };
        assert_eq!(run(), run());
    }
}
