//! Per-phase behaviour: picking, positioning, shooting, the shot itself and
//! the computer's turn.

use glam::Vec3;

use super::Table;
use super::ai::{self, AiContext};
use crate::events::{ParticleKind, PhaseKind, TableEvent};
use crate::input::{FrameInput, Ray};
use crate::marble::{MarbleId, MarbleType, shockwave_impulse};
use crate::player::Controller;
use crate::structure::{StructureId, StructureKind};
use crate::util::{closest_point_on_path, map_range};

/// A marble sitting on its launch platform, waiting to be fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingShot {
    /// Inventory slot the marble was picked from.
    pub slot: usize,
    pub kind: MarbleType,
    pub launch: Vec3,
    pub target: Vec3,
    pub marble: MarbleId,
    pub platform: Option<StructureId>,
}

/// Table phase with the data that only lives during that phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Picking,
    Positioning {
        slot: usize,
        kind: MarbleType,
        selected: Option<Vec3>,
    },
    Shooting {
        shot: PendingShot,
        /// Frames the button has been held.
        power: u32,
        /// The button was released at least once since shooting began.
        ready: bool,
    },
    Shot {
        marble: Option<MarbleId>,
        platform: Option<StructureId>,
    },
    Ai {
        shot: Option<PendingShot>,
        defensive: bool,
    },
    Victory {
        time: u32,
    },
}

impl Phase {
    pub const fn kind(&self) -> PhaseKind {
        match self {
            Self::Picking => PhaseKind::Picking,
            Self::Positioning { .. } => PhaseKind::Positioning,
            Self::Shooting { .. } => PhaseKind::Shooting,
            Self::Shot { .. } => PhaseKind::Shot,
            Self::Ai { .. } => PhaseKind::Ai,
            Self::Victory { .. } => PhaseKind::Victory,
        }
    }
}

/// Impulse per unit of mass for a button held `frames` frames.
pub fn shot_power(frames: u32, shoot_time: u32, min_power: f32, max_power: f32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let (frames, shoot_time) = (frames as f32, shoot_time as f32);
    map_range(frames, 0.0, shoot_time, min_power, max_power, true)
}

impl Table {
    pub(super) fn set_phase(&mut self, next: Phase) {
        let from = self.phase.kind();
        let to = next.kind();
        self.phase = next;
        self.phase_time = 0;
        if from != to {
            tracing::debug!("[table] Phase {} -> {} ({})", from, to, self.active_player);
            self.emit(TableEvent::PhaseChanged { from, to });
        }
    }

    /// Phase that starts a move for the active player.
    pub(super) fn turn_phase(&self) -> Phase {
        match self.controller() {
            Controller::Human => Phase::Picking,
            Controller::Computer => Phase::Ai {
                shot: None,
                defensive: false,
            },
        }
    }

    pub(super) fn update_phase(&mut self, input: &FrameInput) {
        match self.phase {
            Phase::Picking => self.update_picking(input),
            Phase::Positioning { slot, kind, .. } => self.update_positioning(input, slot, kind),
            Phase::Shooting { shot, power, ready } => self.update_shooting(input, shot, power, ready),
            Phase::Shot { marble, platform } => self.update_shot(input, marble, platform),
            Phase::Ai { shot, defensive } => self.update_ai(shot, defensive),
            Phase::Victory { time } => self.update_victory(input, time),
        }
    }

    /// Ends the move without a physical shot, after a short wait.
    fn pass_move(&mut self) {
        self.wait_until_end_of_shot = self.config.pass_wait;
        self.settled_frames = 0;
        self.set_phase(Phase::Shot {
            marble: None,
            platform: None,
        });
    }

    fn update_picking(&mut self, input: &FrameInput) {
        let index = self.active_index();
        if self.inventories[index].active.is_empty() {
            tracing::debug!("[table] {} has nothing to pick", self.active_player);
            self.pass_move();
            return;
        }
        if !input.left_click || self.phase_time <= self.config.phase_debounce {
            return;
        }
        let inventory = &self.inventories[index].active;
        let Some(slot) = self.config.hud.slot_at(input.mouse_position, inventory.len()) else {
            return;
        };
        let Some(kind) = inventory.get(slot) else {
            return;
        };

        if kind == MarbleType::PlusOne {
            self.inventories[index].active.remove_at(slot);
            self.inventories[index].enqueue(MarbleType::Basic);
            self.moves_left = self.moves_left.saturating_sub(1);
            self.play_sound("collect", 1.0, 1.0);
            if self.moves_left == 0 {
                self.pass_move();
            } else {
                self.set_phase(Phase::Picking);
            }
            return;
        }

        self.set_phase(Phase::Positioning {
            slot,
            kind,
            selected: None,
        });
    }

    fn update_positioning(&mut self, input: &FrameInput, slot: usize, kind: MarbleType) {
        if input.right_click {
            self.set_phase(Phase::Picking);
            return;
        }

        let selected = input.camera_ray.and_then(|ray| self.aim_at_zone(&ray));
        if let Phase::Positioning { selected: current, .. } = &mut self.phase {
            *current = selected;
        }

        if input.left_click && self.phase_time > self.config.phase_debounce {
            if let Some(launch) = selected {
                self.begin_shooting(slot, kind, launch);
            }
        }
    }

    /// Launch point under the cursor: the first allowed shoot zone containing
    /// the ray's hit point, else the nearest zone boundary within snapping
    /// range.
    pub(super) fn aim_at_zone(&self, ray: &Ray) -> Option<Vec3> {
        let player = self.active_player;
        let zones = self.shoot_zones.iter().filter(|zone| zone.allows(player));

        let mut snapped: Option<(f32, Vec3)> = None;
        for zone in zones {
            let Some(hit) = ray.at_height(zone.height) else {
                continue;
            };
            let point = hit.truncate();
            if zone.contains(point) {
                return Some(point.extend(zone.height));
            }
            if let Some(closest) = closest_point_on_path(&zone.boundary(), point, self.config.snap_distance) {
                let distance = closest.distance(point);
                if snapped.is_none_or(|(best, _)| distance < best) {
                    snapped = Some((distance, closest.extend(zone.height)));
                }
            }
        }
        snapped.map(|(_, point)| point)
    }

    /// Whether the token at `slot` is still the one that was picked.
    fn is_pick_current(&self, slot: usize, kind: MarbleType) -> bool {
        let index = self.active_index();
        if self.inventories[index].active.get(slot) == Some(kind) {
            return true;
        }
        tracing::warn!(
            "[table] Inventory slot {} of {} no longer holds {}",
            slot,
            self.active_player,
            kind
        );
        false
    }

    fn begin_shooting(&mut self, slot: usize, kind: MarbleType, launch: Vec3) {
        if !self.is_pick_current(slot, kind) {
            self.set_phase(Phase::Picking);
            return;
        }
        let shot = self.spawn_pending_shot(slot, kind, launch);
        self.set_phase(Phase::Shooting {
            shot,
            power: 0,
            ready: false,
        });
    }

    /// Puts a launch platform and the picked marble at `launch`. The marble
    /// has no physics body until the shot is committed.
    pub(super) fn spawn_pending_shot(&mut self, slot: usize, kind: MarbleType, launch: Vec3) -> PendingShot {
        let platform = self.spawn_structure(StructureKind::Platform, launch, 0.0);
        let marble = self.marbles.spawn(kind, launch);
        PendingShot {
            slot,
            kind,
            launch,
            target: launch,
            marble,
            platform,
        }
    }

    /// Removes a shot's platform and marble without touching the inventory.
    pub(super) fn cancel_shot(&mut self, shot: &PendingShot) {
        self.marbles.remove(shot.marble);
        self.physics.remove_marble(shot.marble);
        if let Some(platform) = shot.platform {
            self.remove_structure(platform);
        }
    }

    fn update_shooting(&mut self, input: &FrameInput, mut shot: PendingShot, mut power: u32, mut ready: bool) {
        if input.right_click {
            if power > 0 {
                power = 0;
                ready = false;
            } else {
                self.cancel_shot(&shot);
                self.set_phase(Phase::Positioning {
                    slot: shot.slot,
                    kind: shot.kind,
                    selected: Some(shot.launch),
                });
                return;
            }
        }

        if let Some(target) = input.camera_ray.and_then(|ray| ray.at_height(shot.launch.z)) {
            shot.target = target;
        }

        if !input.left_held {
            if ready && power > 0 {
                let power = shot_power(
                    power,
                    self.config.shoot_time,
                    self.config.min_shoot_power,
                    self.config.max_shoot_power,
                );
                self.commit_shot(shot, power);
                return;
            }
            ready = true;
        } else if ready {
            power = (power + 1).min(self.config.shoot_time);
        }

        self.phase = Phase::Shooting { shot, power, ready };
    }

    /// Fires the pending shot with `power` (impulse per unit of mass).
    pub(super) fn commit_shot(&mut self, shot: PendingShot, power: f32) {
        if !self.is_pick_current(shot.slot, shot.kind) {
            self.cancel_shot(&shot);
            self.set_phase(self.turn_phase());
            return;
        }
        if self.marbles.get(shot.marble).is_none() {
            tracing::warn!("[table] Marble {} for the pending shot is gone", shot.marble);
            self.cancel_shot(&shot);
            self.set_phase(self.turn_phase());
            return;
        }
        let index = self.active_index();
        self.inventories[index].active.remove_at(shot.slot);

        let Some(marble) = self.marbles.get_mut(shot.marble) else {
            return;
        };
        marble.is_physical = true;
        marble.is_shot = true;
        marble.should_be_frozen = true;
        self.physics.add_marble(marble);
        let mass = self.physics.marble_mass(shot.marble).unwrap_or_else(|| marble.mass());

        let direction = (shot.target - shot.launch).normalize_or_zero();
        self.physics.apply_impulse(shot.marble, direction * power * mass);

        self.moves_left = self.moves_left.saturating_sub(1);
        self.got_extra_move = false;
        self.wait_until_end_of_shot = self.config.shot_min_wait;
        self.settled_frames = 0;

        tracing::debug!(
            "[table] {} shot {} with power {:.2}, {} moves left",
            self.active_player,
            shot.kind,
            power,
            self.moves_left
        );
        let volume = map_range(power, 0.0, self.config.max_shoot_power, 0.3, 1.0, true);
        self.play_sound("shoot", volume, 1.0);
        self.set_phase(Phase::Shot {
            marble: Some(shot.marble),
            platform: shot.platform,
        });
    }

    /// Sends the shockwave of a shock marble: every other live marble in range
    /// gets pushed away from it.
    pub(super) fn trigger_shockwave(&mut self, id: MarbleId) -> bool {
        let Some(marble) = self.marbles.get_mut(id) else {
            return false;
        };
        if !marble.fire_shockwave() {
            return false;
        }
        let origin = marble.position;
        let (range, force) = (self.config.shock_range, self.config.shock_force);

        let pushes: Vec<(MarbleId, Vec3)> = self
            .marbles
            .marbles()
            .iter()
            .filter(|m| m.id != id && m.is_alive() && m.is_physical)
            .filter_map(|m| shockwave_impulse(origin, m.position, range, force).map(|impulse| (m.id, impulse)))
            .collect();
        for (target, impulse) in &pushes {
            self.physics.apply_impulse(*target, *impulse);
        }

        tracing::debug!("[table] Shockwave from marble {} pushed {} marbles", id, pushes.len());
        self.particles(ParticleKind::Shockwave, origin);
        self.play_sound("shock", 1.0, 1.0);
        self.settled_frames = 0;
        true
    }

    fn update_shot(&mut self, input: &FrameInput, marble: Option<MarbleId>, platform: Option<StructureId>) {
        let stop_threshold = self.config.marble_stop_threshold;

        if let Some(id) = marble {
            let trigger = if self.controller() == Controller::Human
                && input.left_click
                && self.phase_time > self.config.phase_debounce
            {
                true
            } else {
                self.wait_until_end_of_shot == 0
                    && self.marbles.get(id).is_some_and(|m| {
                        m.kind == MarbleType::Shock && !m.has_fired && m.speed() < stop_threshold
                    })
            };
            if trigger {
                self.trigger_shockwave(id);
            }
        }

        for marble in self.marbles.iter_mut() {
            if marble.is_physical && marble.speed() > stop_threshold {
                marble.should_be_frozen = true;
            }
        }

        self.wait_until_end_of_shot = self.wait_until_end_of_shot.saturating_sub(1);
        let settled = self
            .marbles
            .marbles()
            .iter()
            .filter(|m| m.is_alive() && m.is_physical)
            .all(|m| m.speed() < stop_threshold);
        if settled {
            self.settled_frames += 1;
        } else {
            self.settled_frames = 0;
        }

        if self.wait_until_end_of_shot == 0
            && self.settled_frames >= self.config.settle_frames
            && self.announcements.is_empty()
        {
            self.end_of_shot(platform);
        }
    }

    fn update_ai(&mut self, shot: Option<PendingShot>, defensive: bool) {
        match shot {
            None if self.phase_time >= self.config.ai_pick_frame => self.ai_pick(),
            Some(shot) if self.phase_time >= self.config.ai_shoot_frame => {
                let multiplier = ai::power_multiplier(&self.config, defensive, &mut self.rng);
                let power = multiplier * self.config.max_shoot_power;
                self.commit_shot(shot, power);
            }
            _ => {}
        }
    }

    fn ai_pick(&mut self) {
        let index = self.active_index();
        let plan = {
            let ctx = AiContext {
                player: self.active_player,
                zones: &self.shoot_zones,
                marbles: self.marbles.marbles(),
                inventory: &self.inventories[index].active,
                config: &self.config,
            };
            ai::plan_shot(&ctx, &mut self.rng)
        };

        let Some((plan, kind)) = plan.and_then(|p| self.inventories[index].active.get(p.slot).map(|k| (p, k))) else {
            tracing::info!("[ai] {} has no shot and passes", self.active_player);
            self.turn_passed = true;
            self.pass_move();
            return;
        };

        let mut shot = self.spawn_pending_shot(plan.slot, kind, plan.launch);
        shot.target = plan.target;
        tracing::debug!(
            "[ai] {} picked {} from slot {} ({})",
            self.active_player,
            kind,
            plan.slot,
            if plan.defensive { "defensive" } else { "offensive" }
        );
        self.phase = Phase::Ai {
            shot: Some(shot),
            defensive: plan.defensive,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::player::{GameMode, Player};

    #[test]
    fn test_shot_power_mapping() {
        assert!((shot_power(0, 55, 0.1, 30.0) - 0.1).abs() < 1e-6);
        assert!((shot_power(55, 55, 0.1, 30.0) - 30.0).abs() < 1e-4);
        assert!((shot_power(80, 55, 0.1, 30.0) - 30.0).abs() < 1e-4);
        let expected = 0.1 + 29.9 * 30.0 / 55.0;
        assert!((shot_power(30, 55, 0.1, 30.0) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_debounce_ignores_early_click() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let mouse = table.config().hud.slot_center(0);
        table.update(&FrameInput::idle_at(mouse).clicked());
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        click_slot(&mut table, 0);
        assert_eq!(table.phase_kind(), PhaseKind::Positioning);
    }

    #[test]
    fn test_click_outside_strip_is_ignored() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        // Two tokens: basic and the shooter; slot 2 is past the end.
        click_slot(&mut table, 2);
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
    }

    #[test]
    fn test_plus_one_converts_moves() {
        let mut table = table(&[MarbleType::PlusOne, MarbleType::PlusOne], GameMode::Multiplayer);

        click_slot(&mut table, 0);
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(table.moves_left(), 1);
        assert_eq!(table.inventory(Player::P1).queue, vec![MarbleType::Basic]);

        click_slot(&mut table, 0);
        assert_eq!(table.moves_left(), 0);
        assert_eq!(table.phase_kind(), PhaseKind::Shot);

        let mut frames = 0;
        while table.active_player() == Player::P1 {
            table.update(&FrameInput::default());
            frames += 1;
            assert!(frames < 600, "turn never ended");
        }
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(table.moves_left(), 2);
        assert_eq!(
            table.inventory(Player::P1).active.tokens(),
            &[MarbleType::Shooter(Player::P1), MarbleType::Basic, MarbleType::Basic]
        );
        assert!(table.inventory(Player::P1).queue.is_empty());
    }

    #[test]
    fn test_aim_snaps_to_zone_boundary() {
        let table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let inside = table.aim_at_zone(&Ray::looking_down_at(1.0, -5.0)).unwrap();
        assert_eq!(inside, Vec3::new(1.0, -5.0, 0.0));

        let snapped = table.aim_at_zone(&Ray::looking_down_at(2.0, -3.9)).unwrap();
        assert!((snapped - Vec3::new(2.0, -4.5, 0.0)).length() < 1e-4);

        assert!(table.aim_at_zone(&Ray::looking_down_at(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_right_click_cancels() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        click_slot(&mut table, 0);
        let aim = FrameInput::default().with_ray(Ray::looking_down_at(0.0, -5.0));
        run(&mut table, aim, 6);
        table.update(&aim.clicked());
        assert_eq!(table.phase_kind(), PhaseKind::Shooting);

        // Release, then hold for a few frames to build power.
        table.update(&aim);
        run(&mut table, aim.holding(), 5);
        table.update(&aim.holding().right_clicked());
        assert!(matches!(table.phase(), Phase::Shooting { power: 0, ready: false, .. }));

        table.update(&aim.right_clicked());
        assert_eq!(table.phase_kind(), PhaseKind::Positioning);
        assert!(table.structures().is_empty());
        assert_eq!(table.marbles().len(), 3);

        table.update(&aim.right_clicked());
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(table.inventory(Player::P1).active.len(), 2);
    }

    #[test]
    fn test_stale_pick_returns_to_picking() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        table.inventories[0].active.remove_at(0);
        table.begin_shooting(0, MarbleType::Basic, Vec3::new(0.0, -5.0, 0.0));
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert!(table.structures().is_empty());
    }

    #[test]
    fn test_missing_shot_marble_keeps_token() {
        let mut table = table(&[MarbleType::Heavy], GameMode::Multiplayer);
        let shot = table.spawn_pending_shot(0, MarbleType::Heavy, Vec3::new(0.0, -5.0, 0.0));
        table.marbles.remove(shot.marble);

        table.commit_shot(shot, 10.0);
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
        assert_eq!(table.moves_left(), 2);
        assert_eq!(table.inventory(Player::P1).active.get(0), Some(MarbleType::Heavy));
        assert!(table.structures().is_empty());
    }

    #[test]
    fn test_shockwave_pushes_neighbours() {
        let mut table = table(&[MarbleType::Basic], GameMode::Multiplayer);
        let goals = goal_ids(&table, Player::P1);
        let origin = table.marbles().get(goals[0]).unwrap().position;
        let shock = table.marbles.spawn(MarbleType::Shock, origin + Vec3::new(-1.0, 0.0, -0.5));
        if let Some(marble) = table.marbles.get_mut(shock) {
            marble.is_physical = true;
        }

        assert!(table.trigger_shockwave(shock));
        assert!(!table.trigger_shockwave(shock));
        assert!(table.marbles().get(shock).unwrap().is_marked_for_death);

        table.update(&FrameInput::default());
        let pushed = table.marbles().get(goals[0]).unwrap();
        assert!(pushed.velocity.x > 0.5, "velocity {:?}", pushed.velocity);
        let far = table.marbles().get(goal_ids(&table, Player::P2)[0]).unwrap();
        assert!(far.velocity.truncate().length() < 0.1);
    }

    #[test]
    fn test_ai_turn_commits_a_shot() {
        let mut table = table(&[MarbleType::Basic], GameMode::Demo);
        assert_eq!(table.phase_kind(), PhaseKind::Ai);

        run(&mut table, FrameInput::default(), 30);
        let Phase::Ai { shot: Some(shot), .. } = *table.phase() else {
            panic!("expected a planned shot, got {:?}", table.phase());
        };
        assert_eq!(table.structures().len(), 1);
        assert!(!table.marbles().get(shot.marble).unwrap().is_physical);

        run(&mut table, FrameInput::default(), 60);
        assert_eq!(table.phase_kind(), PhaseKind::Shot);
        assert_eq!(table.moves_left(), 1);
        assert!(table.marbles().get(shot.marble).unwrap().is_physical);
    }

    #[test]
    fn test_empty_inventory_passes_the_turn() {
        let mut table = table(&[], GameMode::Multiplayer);
        table.inventories[0].active.remove_at(0);
        table.update(&FrameInput::default());
        assert_eq!(table.phase_kind(), PhaseKind::Shot);
        assert_eq!(table.moves_left(), 2);

        let mut frames = 0;
        while table.active_player() == Player::P1 {
            table.update(&FrameInput::default());
            frames += 1;
            assert!(frames < 600, "turn never ended");
        }
        assert_eq!(table.phase_kind(), PhaseKind::Picking);
    }
}
