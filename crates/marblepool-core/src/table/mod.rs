//! The table: turn and phase state machine on top of the physics world.
//!
//! One [`Table::update`] call is one 60 Hz tick. Each tick steps physics,
//! resolves contacts, updates marbles and structures, then runs the current
//! phase. Everything the renderer or audio needs comes out as [`TableEvent`]s.

pub mod ai;
mod phase;
mod turn;

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, TableConfig};
use crate::effects::{EffectList, FlightMode};
use crate::error::LevelError;
use crate::events::{ParticleKind, PhaseKind, TableEvent};
use crate::input::FrameInput;
use crate::inventory::PlayerInventory;
use crate::level::{ShootZone, Stage, StageCatalog};
use crate::marble::{MarbleAction, MarbleFrameContext, MarbleId, MarbleManager, MarbleType};
use crate::mesh::{MeshLibrary, MeshSource};
use crate::physics::{ContactEvent, PhysicsWorld};
use crate::player::{Controller, GameMode, Player};
use crate::structure::{StructureId, StructureKind, StructureManager};
use crate::util::map_range;

pub use phase::{PendingShot, Phase, shot_power};

/// A message shown to the players for a fixed number of frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub frames_left: u32,
}

/// Serializable snapshot of the table for hosts and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub phase: PhaseKind,
    pub active_player: Player,
    pub moves_left: u32,
    pub inventories: [Vec<MarbleType>; 2],
    pub queues: [Vec<MarbleType>; 2],
    pub winner: Option<Player>,
    pub win_from_run_out: bool,
    pub marble_count: usize,
    pub structure_count: usize,
    pub time: u64,
    pub finished: bool,
}

/// A match in progress on one stage.
pub struct Table {
    config: TableConfig,
    mode: GameMode,
    stage: Stage,
    shoot_zones: Vec<ShootZone>,
    meshes: Arc<dyn MeshSource>,
    physics: PhysicsWorld,
    marbles: MarbleManager,
    structures: StructureManager,
    effects: EffectList,
    inventories: [PlayerInventory; 2],
    active_player: Player,
    moves_left: u32,
    got_extra_move: bool,
    /// The active player could not shoot; end the turn after the wait.
    turn_passed: bool,
    phase: Phase,
    phase_time: u32,
    time: u64,
    wait_until_end_of_shot: u32,
    settled_frames: u32,
    announcements: VecDeque<Announcement>,
    winner: Option<Player>,
    win_from_run_out: bool,
    rng: ChaCha8Rng,
    events: Vec<TableEvent>,
    finished: bool,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("stage", &self.stage.title)
            .field("phase", &self.phase)
            .field("active_player", &self.active_player)
            .field("moves_left", &self.moves_left)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Builds the table for `stage`: loads the stage mesh into physics, spawns
    /// the stage marbles and hands out the starting inventories.
    pub fn new(
        stage: Stage,
        mode: GameMode,
        config: TableConfig,
        physics_config: PhysicsConfig,
        meshes: Arc<dyn MeshSource>,
        seed: u64,
    ) -> Result<Self, LevelError> {
        let mut physics = PhysicsWorld::with_config(physics_config);
        let table_mesh = meshes.mesh(&stage.stage_mesh).ok_or_else(|| LevelError::MissingMesh {
            stage: stage.title.clone(),
            mesh: stage.stage_mesh.clone(),
        })?;
        physics.set_table_mesh(table_mesh, &stage.stage_mesh)?;

        let mut marbles = MarbleManager::new();
        for spawn in stage.expanded_marbles() {
            let id = marbles.spawn(spawn.kind, spawn.position());
            if let Some(marble) = marbles.get_mut(id) {
                marble.is_physical = true;
                physics.add_marble(marble);
            }
        }

        let inventories = Player::ALL.map(|player| {
            let computer = mode.controller(player) == Controller::Computer;
            let mut inventory = PlayerInventory::new(player, config.max_inventory_size);
            for &token in stage.starting_collection(player, computer) {
                inventory.enqueue(token);
            }
            inventory.dequeue(false);
            inventory
        });

        let shoot_zones = stage.expanded_shoot_zones();
        tracing::info!(
            "[level] Loaded '{}': {} marbles, {} shoot zones, mode {:?}, seed {}",
            stage.title,
            marbles.len(),
            shoot_zones.len(),
            mode,
            seed
        );

        let mut table = Self {
            moves_left: config.moves_per_turn,
            config,
            mode,
            stage,
            shoot_zones,
            meshes,
            physics,
            marbles,
            structures: StructureManager::new(),
            effects: EffectList::default(),
            inventories,
            active_player: Player::P1,
            got_extra_move: false,
            turn_passed: false,
            phase: Phase::Picking,
            phase_time: 0,
            time: 0,
            wait_until_end_of_shot: 0,
            settled_frames: 0,
            announcements: VecDeque::new(),
            winner: None,
            win_from_run_out: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
            finished: false,
        };
        table.phase = table.turn_phase();
        Ok(table)
    }

    /// Builds a table from a named stage of `catalog` with the procedural
    /// meshes and default tunables.
    pub fn from_catalog(catalog: &StageCatalog, stage: &str, mode: GameMode, seed: u64) -> Result<Self, LevelError> {
        let stage = catalog.stage(stage)?.clone();
        Self::new(
            stage,
            mode,
            TableConfig::default(),
            PhysicsConfig::default(),
            Arc::new(MeshLibrary::with_builtin_meshes()),
            seed,
        )
    }

    /// Runs one tick.
    pub fn update(&mut self, input: &FrameInput) {
        if self.finished {
            return;
        }
        self.time += 1;
        self.phase_time += 1;

        let contacts = self.physics.simulate_step(&mut self.marbles);
        self.resolve_contacts(&contacts);
        self.update_marbles();
        self.update_structures();
        self.effects.update();
        self.update_announcements();
        self.update_phase(input);
    }

    /// Takes the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            phase: self.phase.kind(),
            active_player: self.active_player,
            moves_left: self.moves_left,
            inventories: self.inventories.each_ref().map(|inv| inv.active.tokens().to_vec()),
            queues: self.inventories.each_ref().map(|inv| inv.queue.clone()),
            winner: self.winner,
            win_from_run_out: self.win_from_run_out,
            marble_count: self.marbles.len(),
            structure_count: self.structures.len(),
            time: self.time,
            finished: self.finished,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn active_player(&self) -> Player {
        self.active_player
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn got_extra_move(&self) -> bool {
        self.got_extra_move
    }

    pub fn inventory(&self, player: Player) -> &PlayerInventory {
        &self.inventories[player.index()]
    }

    pub fn marbles(&self) -> &MarbleManager {
        &self.marbles
    }

    pub fn structures(&self) -> &StructureManager {
        &self.structures
    }

    pub fn effects(&self) -> &EffectList {
        &self.effects
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn shoot_zones(&self) -> &[ShootZone] {
        &self.shoot_zones
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn announcements(&self) -> impl Iterator<Item = &Announcement> {
        self.announcements.iter()
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn win_from_run_out(&self) -> bool {
        self.win_from_run_out
    }

    pub fn wait_until_end_of_shot(&self) -> u32 {
        self.wait_until_end_of_shot
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// The match is over and every table-owned entity has been torn down.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn active_index(&self) -> usize {
        self.active_player.index()
    }

    fn controller(&self) -> Controller {
        self.mode.controller(self.active_player)
    }

    fn emit(&mut self, event: TableEvent) {
        self.events.push(event);
    }

    fn play_sound(&mut self, name: &str, volume: f32, pitch: f32) {
        self.emit(TableEvent::sound(name, volume, pitch));
    }

    fn particles(&mut self, kind: ParticleKind, position: Vec3) {
        self.emit(TableEvent::Particles { kind, position });
    }

    fn announce(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.emit(TableEvent::Announcement { text: text.clone() });
        self.announcements.push_back(Announcement {
            text,
            frames_left: self.config.announcement_frames,
        });
    }

    fn update_announcements(&mut self) {
        let Some(front) = self.announcements.front_mut() else {
            return;
        };
        front.frames_left = front.frames_left.saturating_sub(1);
        if front.frames_left == 0 {
            self.announcements.pop_front();
        }
    }

    fn resolve_contacts(&mut self, contacts: &[ContactEvent]) {
        let table_threshold = self.physics.config().table_hit_threshold;
        let marble_threshold = self.physics.config().marble_hit_threshold;

        for contact in contacts {
            match *contact {
                ContactEvent::TableHit { marble, force } | ContactEvent::StructureHit { marble, force, .. } => {
                    if force > table_threshold && self.marbles.get(marble).is_some_and(|m| !m.is_dead) {
                        let volume = map_range(force, 0.0, 1000.0, 0.0, 1.0, true);
                        let pitch = map_range(force, 0.0, 2000.0, 0.7, 1.2, true);
                        self.play_sound("hitTable", volume, pitch);
                    }
                }
                ContactEvent::MarbleHit { a, b, force } => {
                    if force > marble_threshold {
                        let volume = map_range(force, 0.0, 1000.0, 0.0, 1.0, true);
                        let pitch = map_range(force, 0.0, 2000.0, 0.5, 1.1, true);
                        self.play_sound("hitMarble", volume, pitch);
                    }
                    self.spread_fire(a, b);
                    self.spread_fire(b, a);
                }
            }
        }
    }

    /// A burning `source` sets `target` alight.
    fn spread_fire(&mut self, source: MarbleId, target: MarbleId) {
        let threshold = self.config.fire_speed_threshold;
        if !self.marbles.get(source).is_some_and(|m| m.is_on_fire(threshold)) {
            return;
        }
        let Some(marble) = self.marbles.get_mut(target) else {
            return;
        };
        if marble.burn_up() {
            let position = marble.position;
            tracing::debug!("[table] Marble {} caught fire from {}", target, source);
            self.particles(ParticleKind::Burn, position);
            self.play_sound("burn", 1.0, 1.0);
        }
    }

    fn update_marbles(&mut self) {
        let ctx = MarbleFrameContext {
            collect_height: self.stage.marble_collect_height,
            fire_speed_threshold: self.config.fire_speed_threshold,
            fire_particle_chance: self.config.fire_particle_chance,
            structure_stop_threshold: self.config.structure_stop_threshold,
            structure_touch_frames: self.config.structure_touch_frames,
        };

        // Marbles spawned below are not updated again this tick.
        for id in self.marbles.ids() {
            let Some(marble) = self.marbles.get_mut(id) else {
                continue;
            };
            let actions = marble.update(&ctx, &mut self.rng);
            for action in actions {
                match action {
                    MarbleAction::Collected => self.collect(id),
                    MarbleAction::FireParticle { position } => self.particles(ParticleKind::Fire, position),
                    MarbleAction::BecomeStructure { kind, position, angle } => {
                        self.transform_into_structure(id, kind, position, angle);
                    }
                }
            }
        }
    }

    /// Takes a marble off the table and credits it, unless it was already
    /// doomed.
    fn collect(&mut self, id: MarbleId) {
        let Some(marble) = self.marbles.remove(id) else {
            return;
        };
        self.physics.remove_marble(id);
        self.particles(ParticleKind::Collect, marble.position);
        tracing::debug!("[table] Collected {} marble {}", marble.kind, id);
        if !marble.is_marked_for_death {
            self.add_marble(marble.kind, marble.is_shot);
        }
    }

    fn transform_into_structure(&mut self, id: MarbleId, kind: StructureKind, position: Vec3, angle: f32) {
        self.marbles.remove(id);
        self.physics.remove_marble(id);
        if self.spawn_structure(kind, position, angle).is_none() {
            return;
        }
        self.particles(ParticleKind::Structure, position);
        self.play_sound("structure", 1.0, 1.0);
        self.wait_until_end_of_shot = self.wait_until_end_of_shot.max(self.config.structure_wait);
        self.announce("Structure built!");
    }

    /// Spawns a structure with its physics body. A structure whose mesh is
    /// missing or cannot be built is dropped.
    fn spawn_structure(&mut self, kind: StructureKind, position: Vec3, angle: f32) -> Option<StructureId> {
        let id = self.structures.spawn(kind, position, angle);
        let result = match (self.meshes.mesh(kind.mesh_key()), self.structures.get(id)) {
            (Some(mesh), Some(structure)) => self.physics.add_structure(structure, mesh).map_err(|e| e.to_string()),
            _ => Err(format!("missing mesh '{}'", kind.mesh_key())),
        };
        if let Err(reason) = result {
            tracing::warn!("[table] Dropping {:?} structure: {}", kind, reason);
            self.structures.remove(id);
            return None;
        }
        Some(id)
    }

    fn remove_structure(&mut self, id: StructureId) {
        self.structures.remove(id);
        self.physics.remove_structure(id);
    }

    fn update_structures(&mut self) {
        let shrink_rate = self.config.shrink_rate;
        let gone: Vec<StructureId> = self
            .structures
            .iter_mut()
            .filter_map(|s| s.update(shrink_rate).then_some(s.id))
            .collect();
        for id in gone {
            self.remove_structure(id);
        }
    }

    /// Removes burned, fired and expired marbles without credit.
    fn remove_doomed_marbles(&mut self) {
        let doomed: Vec<MarbleId> = self
            .marbles
            .marbles()
            .iter()
            .filter(|m| m.is_dead || m.is_marked_for_death)
            .map(|m| m.id)
            .collect();
        for id in doomed {
            self.marbles.remove(id);
            self.physics.remove_marble(id);
        }
    }

    /// Applies the effect of a marble leaving the table.
    fn add_marble(&mut self, kind: MarbleType, was_shot: bool) {
        self.effects.spawn(kind, FlightMode::Collect, &mut self.rng);
        match kind {
            MarbleType::Goal(owner) => {
                if self.marbles.live_count(kind) == 0 {
                    self.enter_victory(owner.other(), false);
                }
            }
            MarbleType::Bonus => {
                self.moves_left += 1;
                self.got_extra_move = true;
                self.announce("Extra move!");
                self.play_sound("bonus", 1.0, 1.0);
            }
            MarbleType::Shooter(_) => {}
            MarbleType::Evil => self.play_sound("lose", 1.0, 1.0),
            _ if was_shot => self.play_sound("lose", 1.0, 1.0),
            _ => {
                let index = self.active_index();
                self.inventories[index].enqueue(kind);
                self.play_sound("collect", 1.0, 1.0);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::input::Ray;

    #[test]
    fn test_new_table_setup() {
        let table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(table.active_player(), Player::P1);
        assert_eq!(table.moves_left(), 2);
        assert_eq!(table.marbles().len(), 3);
        assert_eq!(table.physics().marble_count(), 3);
        assert_eq!(
            table.inventory(Player::P1).active.tokens(),
            &[MarbleType::Basic, MarbleType::Shooter(Player::P1)]
        );
        assert_eq!(
            table.inventory(Player::P2).active.tokens(),
            &[MarbleType::Basic, MarbleType::Shooter(Player::P2)]
        );
    }

    #[test]
    fn test_missing_stage_mesh() {
        let mut stage = test_stage(&[]);
        stage.stage_mesh = "nowhere".to_string();
        let result = Table::new(
            stage,
            GameMode::Multiplayer,
            TableConfig::default(),
            PhysicsConfig::default(),
            Arc::new(MeshLibrary::with_builtin_meshes()),
            1,
        );
        assert!(matches!(result, Err(LevelError::MissingMesh { .. })));
    }

    #[test]
    fn test_starting_phase_follows_controller() {
        let table = Table::from_catalog(&StageCatalog::builtin(), "training", GameMode::Demo, 3).unwrap();
        assert_eq!(table.phase_kind(), PhaseKind::Ai);
        let table = Table::from_catalog(&StageCatalog::builtin(), "training", GameMode::SinglePlayer, 3).unwrap();
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(
            &table.inventory(Player::P2).active.tokens()[..3],
            &[MarbleType::Basic, MarbleType::Basic, MarbleType::Metal]
        );
    }

    #[test]
    fn test_full_shot_returns_to_picking() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        run(&mut table, FrameInput::default(), 10);

        click_slot(&mut table, 0);
        assert_eq!(table.phase_kind(), PhaseKind::Positioning);

        let aim = FrameInput::default().with_ray(Ray::looking_down_at(0.0, -5.0));
        run(&mut table, aim, 6);
        assert!(matches!(table.phase(), Phase::Positioning { selected: Some(_), .. }));
        table.update(&aim.clicked());
        assert_eq!(table.phase_kind(), PhaseKind::Shooting);
        assert_eq!(table.structures().len(), 1);
        assert_eq!(table.physics().structure_count(), 1);
        assert_eq!(table.marbles().len(), 4);
        assert_eq!(table.physics().marble_count(), 3);

        let target = FrameInput::default().with_ray(Ray::looking_down_at(0.0, -9.0));
        table.update(&target);
        run(&mut table, target.holding(), 30);
        assert!(matches!(table.phase(), Phase::Shooting { power: 30, .. }));
        table.update(&target);
        assert_eq!(table.phase_kind(), PhaseKind::Shot);
        assert_eq!(table.moves_left(), 1);
        assert_eq!(
            table.inventory(Player::P1).active.tokens(),
            &[MarbleType::Shooter(Player::P1)]
        );

        let Phase::Shot { marble: Some(shot), .. } = *table.phase() else {
            panic!("expected a shot marble");
        };
        table.update(&FrameInput::default());
        let marble = table.marbles().get(shot).unwrap();
        assert!(marble.is_shot && marble.is_physical);
        let planar = marble.velocity.truncate();
        let expected = map_range(30.0, 0.0, 55.0, 0.1, 30.0, true);
        assert!(planar.y < 0.0);
        assert!((planar.length() - expected).abs() < 1.0, "speed {}", planar.length());

        let mut frames = 0;
        while table.phase_kind() != PhaseKind::Picking {
            table.update(&FrameInput::default());
            frames += 1;
            assert!(frames < 1200, "shot never ended");
        }
        assert_eq!(table.active_player(), Player::P1);
        assert_eq!(table.moves_left(), 1);
        assert!(table.structures().is_empty());
        assert_eq!(table.physics().structure_count(), 0);
        // The shot marble left the table and was not credited.
        assert!(table.marbles().get(shot).is_none());
        assert!(table.inventory(Player::P1).queue.is_empty());
    }

    #[test]
    fn test_structure_marble_lands_as_structure() {
        let mut table = table(&[MarbleType::StructureRamp], GameMode::Multiplayer);
        run(&mut table, FrameInput::default(), 10);
        shoot(&mut table, 0, Ray::looking_down_at(0.0, -1.0), 10);
        assert_eq!(table.phase_kind(), PhaseKind::Shot);

        let events = settle(&mut table);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, TableEvent::Particles { kind: ParticleKind::Structure, .. }))
        );
        assert!(events.contains(&TableEvent::Announcement {
            text: "Structure built!".to_string(),
        }));

        let ramps: Vec<_> = table
            .structures()
            .structures()
            .iter()
            .filter(|s| s.kind == StructureKind::Ramp)
            .collect();
        assert_eq!(ramps.len(), 1);
        assert_eq!(table.structures().len(), 1);
        assert_eq!(table.physics().structure_count(), 1);
        assert!(ramps[0].position.y > -4.5 && ramps[0].position.y < 6.0);
        assert!(!table.marbles().marbles().iter().any(|m| m.kind == MarbleType::StructureRamp));
        assert!(table.inventory(Player::P1).queue.is_empty());
        assert_eq!(table.moves_left(), 1);
    }

    #[test]
    fn test_shock_marble_fires_when_it_settles() {
        let mut table = table(&[MarbleType::Shock], GameMode::Multiplayer);
        run(&mut table, FrameInput::default(), 10);
        shoot(&mut table, 0, Ray::looking_down_at(0.0, -1.0), 10);
        let Phase::Shot { marble: Some(shock), .. } = *table.phase() else {
            panic!("expected a shot marble, got {:?}", table.phase());
        };

        let events = settle(&mut table);
        let fired = events
            .iter()
            .filter(|e| matches!(e, TableEvent::Particles { kind: ParticleKind::Shockwave, .. }))
            .count();
        assert_eq!(fired, 1);
        assert!(events.contains(&TableEvent::sound("shock", 1.0, 1.0)));
        assert!(table.marbles().get(shock).is_none());
        assert!(!table.physics().has_marble(shock));
        assert_eq!(table.active_player(), Player::P1);
        assert_eq!(table.moves_left(), 1);
    }

    #[test]
    fn test_last_goal_loss_wins_for_other_player() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let goals = goal_ids(&table, Player::P1);
        assert_eq!(goals.len(), 2);

        table.collect(goals[0]);
        assert_eq!(table.winner(), None);
        table.collect(goals[1]);
        assert_eq!(table.winner(), Some(Player::P2));
        assert!(!table.win_from_run_out());
        assert_eq!(table.phase_kind(), PhaseKind::Victory);
        assert_eq!(table.physics().marble_count(), 1);

        let events = table.drain_events();
        assert!(events.contains(&TableEvent::Victory {
            winner: Player::P2,
            from_run_out: false,
        }));
        assert!(events.contains(&TableEvent::sound("win", 1.0, 1.0)));
    }

    #[test]
    fn test_collection_credit_rules() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);

        table.add_marble(MarbleType::Heavy, false);
        table.add_marble(MarbleType::Fire, true);
        table.add_marble(MarbleType::Evil, false);
        table.add_marble(MarbleType::Shooter(Player::P2), false);
        assert_eq!(table.inventory(Player::P1).queue, vec![MarbleType::Heavy]);
        assert_eq!(table.effects().len(), 4);

        table.add_marble(MarbleType::Bonus, false);
        assert_eq!(table.moves_left(), 3);
        assert!(table.got_extra_move());
        assert_eq!(table.announcements().count(), 1);
    }

    #[test]
    fn test_doomed_marble_is_not_credited() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let id = table.marbles.spawn(MarbleType::Heavy, Vec3::new(0.0, 0.0, 0.0));
        if let Some(marble) = table.marbles.get_mut(id) {
            marble.is_physical = true;
            marble.is_marked_for_death = true;
        }
        table.collect(id);
        table.collect(id);
        assert!(table.inventory(Player::P1).queue.is_empty());
        assert!(table.marbles().get(id).is_none());
    }

    #[test]
    fn test_fire_spreads_on_contact() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let fire = table.marbles.spawn(MarbleType::Fire, Vec3::ZERO);
        let basic = table.marbles.spawn(MarbleType::Basic, Vec3::X);
        let goal = goal_ids(&table, Player::P1)[0];
        if let Some(marble) = table.marbles.get_mut(fire) {
            marble.velocity = Vec3::new(5.0, 0.0, 0.0);
        }

        table.resolve_contacts(&[
            ContactEvent::MarbleHit {
                a: fire,
                b: basic,
                force: 500.0,
            },
            ContactEvent::MarbleHit {
                a: goal,
                b: fire,
                force: 5.0,
            },
        ]);
        assert!(table.marbles().get(basic).unwrap().is_marked_for_death);
        assert!(!table.marbles().get(goal).unwrap().is_marked_for_death);

        let events = table.drain_events();
        let sounds: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TableEvent::Sound { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(sounds, vec!["hitMarble", "burn"]);
    }

    #[test]
    fn test_announcements_expire_in_order() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        table.announce("one");
        table.announce("two");
        for _ in 0..table.config().announcement_frames {
            table.update_announcements();
        }
        let texts: Vec<_> = table.announcements().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["two"]);
    }

    #[test]
    fn test_summary_serializes() {
        let table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let summary = table.summary();
        assert_eq!(summary.phase, PhaseKind::Picking);
        assert_eq!(summary.marble_count, 3);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"shooter_p1\""));
    }
}
