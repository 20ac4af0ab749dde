//! Simulation core and wire protocol shared by the arena server and its clients.
//!
//! The server drives [`Simulation::tick`] over an [`EntityStore`] and broadcasts
//! [`codec::encode_world`] snapshots. Clients merge those snapshots with
//! [`reconcile::apply`] and predict their own avatar with [`Simulation::predict`].

pub mod codec;
pub mod combat;
pub mod entity;
pub mod intent;
pub mod physics;
pub mod protocol;
pub mod reconcile;
pub mod simulation;
pub mod store;

pub use codec::{BulletRecord, PlayerRecord, WorldSnapshot};
pub use combat::{CombatReport, Hit};
pub use entity::{Bullet, Player, Team};
pub use intent::{Controller, Intent, RandomPolicy};
pub use physics::{Arena, Vector2};
pub use protocol::{FrameError, FrameReader, Packet};
pub use reconcile::ReconcileReport;
pub use simulation::{Simulation, TickReport};
pub use store::{EntityStore, WorldView};

pub const PLAYER_SPEED: f32 = 300.0;
pub const PLAYER_SIZE: f32 = 32.0;
pub const PLAYER_MAX_HP: i32 = 100;
pub const BULLET_SPEED: f32 = 500.0;
pub const BULLET_RADIUS: f32 = 5.0;
pub const BULLET_DAMAGE: i32 = 10;
/// Seconds between shots.
pub const FIRE_COOLDOWN: f32 = 1.0;
pub const KILL_BONUS: i64 = 100;
pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_SNAPSHOT_RATE: u32 = 20;
