//! Decorative marbles that fly across the HUD after a collection or at the
//! end of a match. They have no physics body and no gameplay effect.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::marble::MarbleType;

/// Per-frame downward acceleration of a flying marble.
const FLIGHT_GRAVITY: f32 = 0.02;
/// Height below which a flying marble is discarded.
const FLIGHT_FLOOR: f32 = -50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightMode {
    /// Tossed up from the left after a normal collection.
    Collect,
    /// Tossed up across the screen when a player wins.
    Victory,
    /// Dropped from above when a player loses.
    Defeat,
}

/// A collected marble flying through UI space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedMarble {
    pub kind: MarbleType,
    pub mode: FlightMode,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub angular_velocity: Vec3,
    /// Drawn at twice the marble's table scale.
    pub scale: f32,
    pub time: u32,
    pub is_dead: bool,
}

impl CollectedMarble {
    pub fn new<R: Rng>(kind: MarbleType, mode: FlightMode, rng: &mut R) -> Self {
        let (position, velocity) = match mode {
            FlightMode::Victory => (
                Vec3::new(-6.0 + rng.random::<f32>() * 12.0, -10.4, -6.7),
                Vec3::new(-0.04 + rng.random::<f32>() * 0.08, 0.0, 0.6 + rng.random::<f32>() * 0.08),
            ),
            FlightMode::Defeat => (
                Vec3::new(-6.0 + rng.random::<f32>() * 12.0, -10.4, 6.7),
                Vec3::new(-0.02 + rng.random::<f32>() * 0.04, 0.0, 0.0),
            ),
            FlightMode::Collect => (
                Vec3::new(-6.0 + rng.random::<f32>() * 3.0, -10.4, -6.7),
                Vec3::new(-0.04 - rng.random::<f32>() * 0.04, 0.0, 0.6 + rng.random::<f32>() * 0.08),
            ),
        };
        let rotation = Vec3::new(
            rng.random::<f32>() * std::f32::consts::PI,
            rng.random::<f32>() * std::f32::consts::PI,
            0.0,
        );
        let angular_velocity = Vec3::new(rng.random::<f32>() * 0.04, rng.random::<f32>() * 0.04, 0.0);

        Self {
            kind,
            mode,
            position,
            velocity,
            rotation,
            angular_velocity,
            scale: 2.0 * kind.scale(),
            time: 0,
            is_dead: false,
        }
    }

    /// Moves the marble one frame. Returns `true` once it has left the screen.
    pub fn update(&mut self) -> bool {
        self.time += 1;
        self.velocity.z -= FLIGHT_GRAVITY;
        self.position += self.velocity;
        self.rotation += self.angular_velocity;
        if self.position.z < FLIGHT_FLOOR {
            self.is_dead = true;
        }
        self.is_dead
    }
}

/// Live flying marbles in spawn order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectList {
    marbles: Vec<CollectedMarble>,
}

impl EffectList {
    pub fn spawn<R: Rng>(&mut self, kind: MarbleType, mode: FlightMode, rng: &mut R) {
        self.marbles.push(CollectedMarble::new(kind, mode, rng));
    }

    pub fn update(&mut self) {
        self.marbles.retain_mut(|m| !m.update());
    }

    pub fn marbles(&self) -> &[CollectedMarble] {
        &self.marbles
    }

    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }

    pub fn clear(&mut self) {
        self.marbles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_flight_arcs_and_dies() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut marble = CollectedMarble::new(MarbleType::Fire, FlightMode::Collect, &mut rng);
        let start = marble.position;
        assert!(start.x >= -6.0 && start.x < -3.0);

        let mut peak = start.z;
        let mut frames = 0;
        while !marble.update() {
            peak = peak.max(marble.position.z);
            frames += 1;
            assert!(frames < 1000, "marble never fell");
        }
        assert!(peak > start.z);
        assert!(marble.position.z < FLIGHT_FLOOR);
        assert_eq!(marble.scale, 1.0);
    }

    #[test]
    fn test_effect_list_drops_finished() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut effects = EffectList::default();
        effects.spawn(MarbleType::Basic, FlightMode::Defeat, &mut rng);
        assert_eq!(effects.len(), 1);
        for _ in 0..200 {
            effects.update();
        }
        assert!(effects.is_empty());
    }
}
