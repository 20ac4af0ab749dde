//! Entity <-> transmissible record mapping. Pure, no I/O.
//!
//! Bullet speed, radius and damage are not part of the record. They are local
//! tuning constants on every peer, so a replicated bullet gets the defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Bullet, Player, Team};
use crate::physics::Vector2;
use crate::store::EntityStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub uuid: u64,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub hp: i32,
    pub score: i64,
    pub is_shooting: bool,
    pub motion: Vector2,
    pub cooldown: f32,
    pub team: Team,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletRecord {
    pub uuid: u64,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Every live entity's synchronized fields at one instant, keyed by uuid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: BTreeMap<u64, PlayerRecord>,
    pub bullets: BTreeMap<u64, BulletRecord>,
}

pub fn encode_player(player: &Player) -> PlayerRecord {
    PlayerRecord {
        uuid: player.uuid,
        x: player.x,
        y: player.y,
        rotation: player.rotation,
        hp: player.hp,
        score: player.score,
        is_shooting: player.shooting,
        motion: player.motion,
        cooldown: player.cooldown,
        team: player.team,
    }
}

/// Copies every field except identity onto `target`.
pub fn decode_player(record: &PlayerRecord, target: &mut Player) {
    target.x = record.x;
    target.y = record.y;
    target.rotation = record.rotation;
    target.hp = record.hp;
    target.score = record.score;
    target.shooting = record.is_shooting;
    target.motion = record.motion;
    target.cooldown = record.cooldown;
    target.team = record.team;
}

/// Builds a replica for a player seen for the first time.
///
/// Cooldown starts at zero so an imported player is never stuck unable to fire.
pub fn instantiate_player(record: &PlayerRecord) -> Player {
    let mut player = Player::replica(record.uuid);
    decode_player(record, &mut player);
    player.cooldown = 0.0;
    player
}

pub fn encode_bullet(bullet: &Bullet) -> BulletRecord {
    BulletRecord {
        uuid: bullet.uuid,
        x: bullet.x,
        y: bullet.y,
        rotation: bullet.rotation,
    }
}

pub fn decode_bullet(record: &BulletRecord, target: &mut Bullet) {
    target.x = record.x;
    target.y = record.y;
    target.rotation = record.rotation;
}

/// Builds a replica bullet. The owner is not replicated, so it has none.
pub fn instantiate_bullet(record: &BulletRecord) -> Bullet {
    let mut bullet = Bullet::new(record.x, record.y, record.rotation);
    bullet.uuid = record.uuid;
    bullet
}

pub fn encode_world(store: &EntityStore) -> WorldSnapshot {
    WorldSnapshot {
        players: store.players().map(|p| (p.uuid, encode_player(p))).collect(),
        bullets: store.bullets().map(|b| (b.uuid, encode_bullet(b))).collect(),
    }
}
