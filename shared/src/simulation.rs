//! Fixed-delta world stepping.
//!
//! [`Simulation::tick`] is the authoritative step: every simulated player consumes its
//! intent, bullets fly, then [`combat::resolve`] settles hits and removals. The step
//! depends only on `dt` and the intents. There is no hidden clock.
//!
//! [`Simulation::predict`] is the client-side variant that only moves one avatar and
//! lets existing bullets drift until the next authoritative snapshot replaces them.

use crate::combat::{self, CombatReport};
use crate::entity::{Bullet, Player};
use crate::intent::Intent;
use crate::physics::{Arena, Vector2};
use crate::store::EntityStore;
use crate::{FIRE_COOLDOWN, PLAYER_SPEED};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub bullets_fired: usize,
    pub combat: CombatReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Simulation {
    arena: Arena,
}

impl Simulation {
    pub fn new(arena: Arena) -> Self {
        Self { arena }
    }

    /// Advances the whole world by `dt` seconds and resolves combat.
    pub fn tick(&self, store: &mut EntityStore, dt: f32) -> TickReport {
        let mut fired = Vec::new();

        for uuid in store.player_ids() {
            let Some(player) = store.find_player_mut(uuid) else {
                continue;
            };
            let Some(intent) = player.controller.next_intent(dt, &self.arena) else {
                continue;
            };

            self.step_player(player, &intent, dt);

            if intent.shoot && player.can_fire() {
                fired.push(Bullet::fired_by(player));
                player.cooldown = FIRE_COOLDOWN;
            }
        }

        let bullets_fired = fired.len();
        for bullet in fired {
            store.add_bullet(bullet);
        }

        for bullet in store.bullets_mut() {
            bullet.advance(dt);
        }

        TickReport {
            bullets_fired,
            combat: combat::resolve(store, &self.arena),
        }
    }

    /// Moves one locally controlled player and drifts every bullet.
    ///
    /// Never spawns bullets or applies damage; only the authoritative side does that.
    pub fn predict(&self, store: &mut EntityStore, uuid: u64, intent: &Intent, dt: f32) {
        if let Some(player) = store.find_player_mut(uuid) {
            self.step_player(player, intent, dt);
        }

        for bullet in store.bullets_mut() {
            bullet.advance(dt);
        }

        let gone: Vec<u64> = store
            .bullets()
            .filter(|b| !self.arena.contains(b.x, b.y))
            .map(|b| b.uuid)
            .collect();
        for uuid in gone {
            store.remove_bullet(uuid);
        }
    }

    /// Cooldown, movement and facing for one player. Firing is left to the caller.
    fn step_player(&self, player: &mut Player, intent: &Intent, dt: f32) {
        player.cooldown -= dt;

        let motion = intent.direction().normalize().scale(PLAYER_SPEED * dt);
        let next = self.arena.clamp(player.position().add(&motion));
        player.motion = Vector2::new(next.x - player.x, next.y - player.y);
        player.x = next.x;
        player.y = next.y;

        let look = intent.look_target;
        player.rotation = (look.y - player.y).atan2(look.x - player.x);
        player.shooting = intent.shoot;
    }
}
