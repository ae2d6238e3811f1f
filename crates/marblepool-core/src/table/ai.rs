//! Shot selection for computer-controlled players.
//!
//! A coarse greedy heuristic: sample launch points along the shoot-zone
//! boundaries, aim at the nearest goal marble, and keep the first sample that
//! pushes an enemy goal away from the centre of the table (or pulls an own
//! goal towards it).

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::config::TableConfig;
use crate::inventory::Inventory;
use crate::level::ShootZone;
use crate::marble::Marble;
use crate::player::Player;
use crate::util::{closest_point_on_path, pick_random_point};

/// What the computer decided to shoot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiPlan {
    /// Inventory slot to shoot.
    pub slot: usize,
    pub launch: Vec3,
    pub target: Vec3,
    /// Aiming at one of its own goals.
    pub defensive: bool,
}

/// Everything the planner looks at.
pub struct AiContext<'a> {
    pub player: Player,
    pub zones: &'a [ShootZone],
    pub marbles: &'a [Marble],
    pub inventory: &'a Inventory,
    pub config: &'a TableConfig,
}

/// Whether pushing a goal at `goal` along `direction` moves it the right way.
///
/// Offensive shots must move it away from the table centre, defensive shots
/// towards it.
pub fn improves_position(goal: Vec2, direction: Vec2, defensive: bool) -> bool {
    let before = goal.length();
    let after = (goal + direction).length();
    if defensive { after < before } else { after > before }
}

/// Multiplier of the maximum shot power for an offensive or defensive shot.
pub fn power_multiplier<R: Rng>(config: &TableConfig, defensive: bool, rng: &mut R) -> f32 {
    let (base, jitter) = if defensive {
        (config.ai_defense_power, config.ai_defense_jitter)
    } else {
        (config.ai_offense_power, config.ai_offense_jitter)
    };
    base * (1.0 + rng.random_range(-jitter..=jitter))
}

/// Picks a shot, or `None` when there is nothing to shoot or nowhere to
/// shoot from.
pub fn plan_shot<R: Rng>(ctx: &AiContext<'_>, rng: &mut R) -> Option<AiPlan> {
    if ctx.inventory.is_empty() {
        return None;
    }
    let zones: Vec<&ShootZone> = ctx.zones.iter().filter(|z| z.allows(ctx.player)).collect();
    let paths: Vec<Vec<Vec2>> = zones.iter().map(|z| z.boundary()).collect();
    let goals: Vec<&Marble> = ctx
        .marbles
        .iter()
        .filter(|m| m.is_alive() && m.is_physical && m.kind.goal_owner().is_some())
        .collect();
    if goals.is_empty() {
        return None;
    }

    let mut last = None;
    for attempt in 0..ctx.config.ai_attempts {
        let point = pick_random_point(&paths, rng)?;
        let height = zones
            .iter()
            .zip(&paths)
            .find(|(_, path)| closest_point_on_path(path, point, 1e-3).is_some())
            .map_or(0.0, |(zone, _)| zone.height);
        let launch = point.extend(height);

        let goal = goals.iter().min_by(|a, b| {
            let da = effective_distance(a, point, ctx.config.ai_frozen_penalty);
            let db = effective_distance(b, point, ctx.config.ai_frozen_penalty);
            da.total_cmp(&db)
        })?;
        let defensive = goal.kind.goal_owner() == Some(ctx.player);

        let slot = if defensive {
            0
        } else {
            rng.random_range(0..ctx.inventory.len())
        };
        let goal_xy = goal.position.truncate();
        let direction = (goal_xy - point).normalize_or_zero();
        let plan = AiPlan {
            slot,
            launch,
            target: goal_xy.extend(height),
            defensive,
        };
        last = Some(plan);

        if defensive && rng.random::<f64>() < ctx.config.ai_defensive_skip_chance {
            continue;
        }
        if improves_position(goal_xy, direction, defensive) {
            tracing::debug!("[ai] {} accepted shot after {} attempts", ctx.player, attempt + 1);
            return Some(plan);
        }
    }

    tracing::debug!("[ai] {} fell back to the last candidate", ctx.player);
    last
}

fn effective_distance(goal: &Marble, point: Vec2, frozen_penalty: f32) -> f32 {
    let distance = goal.position.truncate().distance(point);
    if goal.is_frozen { distance + frozen_penalty } else { distance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marble::MarbleType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn goal(id: u32, owner: Player, x: f32, y: f32) -> Marble {
        let mut marble = Marble::new(id, MarbleType::Goal(owner), Vec3::new(x, y, 0.0));
        marble.is_physical = true;
        marble
    }

    fn zone() -> ShootZone {
        ShootZone {
            height: 0.0,
            polygon: vec![[-8.0, -5.5], [8.0, -5.5], [8.0, -4.5], [-8.0, -4.5]],
            player_restriction: None,
        }
    }

    #[test]
    fn test_improves_position() {
        let goal = Vec2::new(2.0, 0.0);
        assert!(improves_position(goal, Vec2::X, false));
        assert!(!improves_position(goal, Vec2::NEG_X, false));
        assert!(improves_position(goal, Vec2::NEG_X, true));
        assert!(!improves_position(goal, Vec2::X, true));
    }

    #[test]
    fn test_offensive_shot_pushes_goal_outwards() {
        let config = TableConfig::default();
        let zones = [zone()];
        let marbles = [goal(0, Player::P1, 0.0, 1.5)];
        let inventory = Inventory::with_tokens([MarbleType::Basic, MarbleType::Heavy], 8);
        let ctx = AiContext {
            player: Player::P2,
            zones: &zones,
            marbles: &marbles,
            inventory: &inventory,
            config: &config,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let plan = plan_shot(&ctx, &mut rng).unwrap();
        assert!(!plan.defensive);
        assert!(plan.slot < 2);
        let direction = (plan.target - plan.launch).truncate().normalize();
        assert!(improves_position(Vec2::new(0.0, 1.5), direction, false));
        assert!(closest_point_on_path(&zones[0].boundary(), plan.launch.truncate(), 1e-3).is_some());
    }

    #[test]
    fn test_falls_back_to_last_candidate() {
        // Launching from behind the goal always pushes it towards the centre.
        let config = TableConfig {
            ai_attempts: 5,
            ..TableConfig::default()
        };
        let zones = [ShootZone {
            height: 0.5,
            polygon: vec![[-1.0, -5.0], [1.0, -5.0], [1.0, -5.0]],
            player_restriction: None,
        }];
        let marbles = [goal(0, Player::P1, 0.0, -3.0)];
        let inventory = Inventory::with_tokens([MarbleType::Basic], 8);
        let ctx = AiContext {
            player: Player::P2,
            zones: &zones,
            marbles: &marbles,
            inventory: &inventory,
            config: &config,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let plan = plan_shot(&ctx, &mut rng).unwrap();
        assert!(!plan.defensive);
        assert_eq!(plan.slot, 0);
        assert_eq!(plan.launch.z, 0.5);
        assert_eq!(plan.target, Vec3::new(0.0, -3.0, 0.5));
    }

    #[test]
    fn test_nothing_to_plan() {
        let config = TableConfig::default();
        let zones = [zone()];
        let empty = Inventory::new(8);
        let marbles = [goal(0, Player::P1, 0.0, 0.0)];
        let ctx = AiContext {
            player: Player::P2,
            zones: &zones,
            marbles: &marbles,
            inventory: &empty,
            config: &config,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(plan_shot(&ctx, &mut rng).is_none());

        let inventory = Inventory::with_tokens([MarbleType::Basic], 8);
        let ctx = AiContext {
            player: Player::P1,
            zones: &zones[..0],
            marbles: &marbles,
            inventory: &inventory,
            config: &config,
        };
        assert!(plan_shot(&ctx, &mut rng).is_none());
    }

    #[test]
    fn test_frozen_goals_are_avoided() {
        let config = TableConfig::default();
        let zones = [zone()];
        let mut near = goal(0, Player::P1, 0.0, -3.0);
        near.is_frozen = true;
        let far = goal(1, Player::P1, 0.0, 3.0);
        let marbles = [near, far];
        let inventory = Inventory::with_tokens([MarbleType::Basic], 8);
        let ctx = AiContext {
            player: Player::P2,
            zones: &zones,
            marbles: &marbles,
            inventory: &inventory,
            config: &config,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let plan = plan_shot(&ctx, &mut rng).unwrap();
        assert_eq!(plan.target.truncate(), Vec2::new(0.0, 3.0));
    }

    #[test]
    fn test_power_multiplier_range() {
        let config = TableConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            let defense = power_multiplier(&config, true, &mut rng);
            assert!((0.45..=0.55).contains(&defense));
            let offense = power_multiplier(&config, false, &mut rng);
            assert!((0.824..=1.236).contains(&offense));
        }
    }
}
