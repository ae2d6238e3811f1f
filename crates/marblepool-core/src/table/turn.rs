//! Shot resolution, turn boundaries and the end of the match.

use glam::Vec3;

use super::{Phase, Table};
use crate::effects::FlightMode;
use crate::events::{ParticleKind, TableEvent};
use crate::input::FrameInput;
use crate::marble::MarbleType;
use crate::player::{GameMode, Player};
use crate::structure::{StructureId, StructureKind};

impl Table {
    /// Everything has settled after a shot: decide whether the active player
    /// shoots again or the turn passes.
    pub(super) fn end_of_shot(&mut self, platform: Option<StructureId>) {
        self.physics.stop_all_marbles();
        for marble in self.marbles.iter_mut() {
            marble.velocity = Vec3::ZERO;
        }
        if let Some(platform) = platform {
            self.remove_structure(platform);
        }
        self.remove_doomed_marbles();

        let index = self.active_index();
        if self.moves_left == 0 || self.inventories[index].active.is_empty() || self.turn_passed {
            self.end_turn();
            return;
        }

        let freeze = !self.got_extra_move;
        let mut frozen = 0;
        for marble in self.marbles.iter_mut() {
            if freeze && marble.should_be_frozen && !marble.is_frozen {
                marble.is_frozen = true;
                frozen += 1;
            }
            marble.should_be_frozen = false;
        }
        tracing::debug!(
            "[table] {} shoots again, {} moves left, froze {} marbles",
            self.active_player,
            self.moves_left,
            frozen
        );
        self.set_phase(self.turn_phase());
    }

    /// Hands the table to the other player.
    pub(super) fn end_turn(&mut self) {
        self.remove_doomed_marbles();
        self.expire_shooters();
        self.age_structures();

        self.active_player = self.active_player.other();
        self.moves_left = self.config.moves_per_turn;
        self.got_extra_move = false;
        self.turn_passed = false;

        for player in Player::ALL {
            let shooter = MarbleType::Shooter(player);
            let on_table = self
                .marbles
                .marbles()
                .iter()
                .any(|m| m.kind == shooter && m.is_physical && m.is_alive());
            let evicted = self.inventories[player.index()].dequeue(on_table);
            if !evicted.is_empty() {
                tracing::debug!("[table] {} inventory full, evicted {:?}", player, evicted);
            }
        }
        for marble in self.marbles.iter_mut() {
            marble.is_shot = false;
            marble.is_frozen = false;
            marble.should_be_frozen = false;
        }

        let player = self.active_player;
        tracing::info!("[table] Turn {} -> {}", player.other(), player);
        self.emit(TableEvent::TurnChanged { player });
        self.announce(format!("{player} turn"));

        if self.inventories[player.index()].is_exhausted() {
            tracing::info!("[table] {} has run out of marbles", player);
            self.enter_victory(player.other(), true);
            return;
        }
        self.set_phase(self.turn_phase());
    }

    /// Shot shooter marbles stay on the table for a few turns.
    fn expire_shooters(&mut self) {
        let lifetime = self.config.shooter_lifetime_turns;
        let mut expired = Vec::new();
        for marble in self.marbles.iter_mut() {
            if marble.kind.shooter_owner().is_none() || !marble.is_physical || !marble.is_alive() {
                continue;
            }
            marble.turns_alive += 1;
            if marble.turns_alive >= lifetime {
                marble.is_marked_for_death = true;
                expired.push(marble.position);
            }
        }
        for position in expired {
            self.particles(ParticleKind::Expire, position);
            self.play_sound("expire", 1.0, 1.0);
        }
        self.remove_doomed_marbles();
    }

    /// Built structures start shrinking once they are old enough and stop
    /// colliding right away.
    fn age_structures(&mut self) {
        let lifetime = self.config.structure_lifetime_turns;
        let shrinking: Vec<StructureId> = self
            .structures
            .iter_mut()
            .filter(|s| s.kind != StructureKind::Platform)
            .filter_map(|s| s.age(lifetime).then_some(s.id))
            .collect();
        for id in shrinking {
            self.physics.remove_structure(id);
        }
    }

    pub(super) fn enter_victory(&mut self, winner: Player, from_run_out: bool) {
        if self.winner.is_some() {
            return;
        }
        self.winner = Some(winner);
        self.win_from_run_out = from_run_out;

        let sound = if self.human_lost(winner) { "lose" } else { "win" };
        self.play_sound(sound, 1.0, 1.0);
        self.emit(TableEvent::Victory { winner, from_run_out });
        self.announce(format!("{winner} wins!"));
        tracing::info!(
            "[table] {} wins{} after {} frames",
            winner,
            if from_run_out { " by run-out" } else { "" },
            self.time
        );
        self.set_phase(Phase::Victory { time: 0 });
    }

    /// The only human player lost to the computer.
    fn human_lost(&self, winner: Player) -> bool {
        self.mode == GameMode::SinglePlayer && winner != Player::P1
    }

    pub(super) fn update_victory(&mut self, input: &FrameInput, time: u32) {
        let time = time + 1;
        self.phase = Phase::Victory { time };

        let interval = self.config.victory_animation_interval.max(1);
        if let Some(winner) = self.winner {
            if time % interval == 0 && time / interval <= self.config.victory_animation_count {
                // A beaten human sees their own goal marbles drop instead.
                let (kind, mode) = if self.human_lost(winner) {
                    (MarbleType::Goal(Player::P1), FlightMode::Defeat)
                } else {
                    (MarbleType::Goal(winner), FlightMode::Victory)
                };
                self.effects.spawn(kind, mode, &mut self.rng);
            }
        }

        let delay = self.config.victory_exit_delay;
        let exit = match self.mode {
            GameMode::Demo => time >= delay * 2,
            _ => time >= delay && input.left_click,
        };
        if exit {
            self.teardown();
        }
    }

    /// Removes every table-owned entity and physics body.
    fn teardown(&mut self) {
        self.physics.clear_entities();
        self.marbles.clear();
        self.structures.clear();
        self.effects.clear();
        self.announcements.clear();
        self.finished = true;
        self.emit(TableEvent::Exit);
        tracing::info!("[table] Match on '{}' finished", self.stage.title);
    }
}
