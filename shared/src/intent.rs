//! Control intents and the sources that produce them.
//!
//! The simulation only ever asks a player's [`Controller`] for "the intent for this
//! tick". Where that intent comes from (a keyboard, a remote client, a policy) is
//! invisible to it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::physics::{Arena, Vector2};

/// Largest per-second step the random policy moves its look target by on each axis.
const POLICY_AIM_DRIFT: f32 = 300.0;

/// What a player wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Intent {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub shoot: bool,
    /// Point the player faces, in arena coordinates.
    pub look_target: Vector2,
}

impl Intent {
    /// Unnormalized movement direction from the four movement flags.
    pub fn direction(&self) -> Vector2 {
        let mut dir = Vector2::ZERO;
        if self.move_up {
            dir.y -= 1.0;
        }
        if self.move_down {
            dir.y += 1.0;
        }
        if self.move_left {
            dir.x -= 1.0;
        }
        if self.move_right {
            dir.x += 1.0;
        }
        dir
    }
}

/// Seeded random controller: mashes movement keys, drifts its aim, never stops firing.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
    aim: Vector2,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            aim: Vector2::ZERO,
        }
    }

    pub fn next_intent(&mut self, dt: f32, arena: &Arena) -> Intent {
        let drift_x = self.rng.gen_range(-POLICY_AIM_DRIFT..=POLICY_AIM_DRIFT) * dt;
        let drift_y = self.rng.gen_range(-POLICY_AIM_DRIFT..=POLICY_AIM_DRIFT) * dt;
        self.aim = arena.clamp(self.aim.add(&Vector2::new(drift_x, drift_y)));

        Intent {
            move_up: self.rng.gen(),
            move_down: self.rng.gen(),
            move_left: self.rng.gen(),
            move_right: self.rng.gen(),
            shoot: true,
            look_target: self.aim,
        }
    }
}

/// Where a player's intent comes from.
#[derive(Debug, Clone)]
pub enum Controller {
    /// Latest intent pushed from outside: local input capture or a remote client.
    Input(Intent),
    /// Seeded random policy.
    Policy(RandomPolicy),
    /// Mirror of another participant's player. Never simulated locally.
    Replica,
}

impl Default for Controller {
    fn default() -> Self {
        Controller::Input(Intent::default())
    }
}

impl Controller {
    /// Intent for this tick, or `None` when the player must not be simulated here.
    pub fn next_intent(&mut self, dt: f32, arena: &Arena) -> Option<Intent> {
        match self {
            Controller::Input(intent) => Some(*intent),
            Controller::Policy(policy) => Some(policy.next_intent(dt, arena)),
            Controller::Replica => None,
        }
    }

    pub fn is_replica(&self) -> bool {
        matches!(self, Controller::Replica)
    }
}
