use serde::{Deserialize, Serialize};

use crate::intent::{Controller, Intent};
use crate::physics::Vector2;
use crate::{BULLET_DAMAGE, BULLET_RADIUS, BULLET_SPEED, PLAYER_MAX_HP};

/// Uuid value meaning "let the store assign one".
pub const UNASSIGNED: u64 = 0;

/// Side a player fights for. Bullets never hurt members of their owner's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Team(pub u64);

#[derive(Debug, Clone)]
pub struct Player {
    pub uuid: u64,
    /// Top-left corner of the player's bounding box.
    pub x: f32,
    pub y: f32,
    /// Facing angle in radians.
    pub rotation: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub score: i64,
    /// Seconds until the next shot. Ready at or below zero.
    pub cooldown: f32,
    pub team: Team,
    /// Displacement applied on the last tick.
    pub motion: Vector2,
    pub shooting: bool,
    pub controller: Controller,
}

impl Player {
    pub fn new(x: f32, y: f32, team: Team, controller: Controller) -> Self {
        Self {
            uuid: UNASSIGNED,
            x,
            y,
            rotation: 0.0,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            score: 0,
            cooldown: 0.0,
            team,
            motion: Vector2::ZERO,
            shooting: false,
            controller,
        }
    }

    /// Empty shell used when a snapshot mentions a player we have never seen.
    pub fn replica(uuid: u64) -> Self {
        Self {
            uuid,
            ..Self::new(0.0, 0.0, Team(uuid), Controller::Replica)
        }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn set_intent(&mut self, intent: Intent) {
        self.controller = Controller::Input(intent);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub uuid: u64,
    pub x: f32,
    pub y: f32,
    /// Direction of travel in radians, fixed at spawn.
    pub rotation: f32,
    pub speed: f32,
    pub radius: f32,
    pub damage: i32,
    /// Uuid of the firing player. Non-owning: the player may be gone already.
    pub owner: Option<u64>,
    /// Team of the firing player at the moment of the shot.
    pub owner_team: Option<Team>,
}

impl Bullet {
    pub fn new(x: f32, y: f32, rotation: f32) -> Self {
        Self {
            uuid: UNASSIGNED,
            x,
            y,
            rotation,
            speed: BULLET_SPEED,
            radius: BULLET_RADIUS,
            damage: BULLET_DAMAGE,
            owner: None,
            owner_team: None,
        }
    }

    /// A bullet leaving `shooter`'s position along its facing.
    pub fn fired_by(shooter: &Player) -> Self {
        Self {
            owner: Some(shooter.uuid),
            owner_team: Some(shooter.team),
            ..Self::new(shooter.x, shooter.y, shooter.rotation)
        }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    /// Whether this bullet may damage `player` at all, ignoring distance.
    pub fn can_harm(&self, player: &Player) -> bool {
        if self.owner == Some(player.uuid) {
            return false;
        }
        self.owner_team != Some(player.team)
    }

    pub fn advance(&mut self, dt: f32) {
        let step = Vector2::from_angle(self.rotation).scale(self.speed * dt);
        self.x += step.x;
        self.y += step.y;
    }
}
