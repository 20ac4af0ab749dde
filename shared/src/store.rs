//! Owner of every live [`Player`] and [`Bullet`].
//!
//! The store is plain data: it knows nothing about threads. Callers that share it
//! across tasks wrap it in one coarse lock and hold that lock for a whole pass
//! (simulation, encoding or reconciliation).
//!
//! Entities are kept in uuid order, so every traversal visits them in the same
//! order on every run. Uuids come from two monotonic counters, one per entity
//! kind, and are never handed out twice.

use std::collections::BTreeMap;

use crate::entity::{Bullet, Player, UNASSIGNED};
use crate::intent::Intent;

/// Read-only copy of the world for the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    pub players: Vec<Player>,
    pub bullets: Vec<Bullet>,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    players: BTreeMap<u64, Player>,
    bullets: BTreeMap<u64, Bullet>,
    next_player_id: u64,
    next_bullet_id: u64,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            bullets: BTreeMap::new(),
            next_player_id: 1,
            next_bullet_id: 1,
        }
    }

    /// Inserts a player and returns its uuid, assigning the next one if unset.
    pub fn add_player(&mut self, mut player: Player) -> u64 {
        player.uuid = Self::claim_id(&mut self.next_player_id, player.uuid);
        let uuid = player.uuid;
        self.players.insert(uuid, player);
        uuid
    }

    /// Inserts a player under the uuid it already carries, replacing any
    /// previous holder. Replicated entities come in this way, uuid 0 included.
    pub fn insert_player_with_id(&mut self, player: Player) -> u64 {
        let uuid = player.uuid;
        Self::reserve_id(&mut self.next_player_id, uuid);
        self.players.insert(uuid, player);
        uuid
    }

    pub fn remove_player(&mut self, uuid: u64) -> Option<Player> {
        self.players.remove(&uuid)
    }

    /// Inserts a bullet and returns its uuid, assigning the next one if unset.
    pub fn add_bullet(&mut self, mut bullet: Bullet) -> u64 {
        bullet.uuid = Self::claim_id(&mut self.next_bullet_id, bullet.uuid);
        let uuid = bullet.uuid;
        self.bullets.insert(uuid, bullet);
        uuid
    }

    /// Inserts a bullet under the uuid it already carries.
    pub fn insert_bullet_with_id(&mut self, bullet: Bullet) -> u64 {
        let uuid = bullet.uuid;
        Self::reserve_id(&mut self.next_bullet_id, uuid);
        self.bullets.insert(uuid, bullet);
        uuid
    }

    pub fn remove_bullet(&mut self, uuid: u64) -> Option<Bullet> {
        self.bullets.remove(&uuid)
    }

    pub fn find_player(&self, uuid: u64) -> Option<&Player> {
        self.players.get(&uuid)
    }

    pub fn find_player_mut(&mut self, uuid: u64) -> Option<&mut Player> {
        self.players.get_mut(&uuid)
    }

    pub fn find_bullet(&self, uuid: u64) -> Option<&Bullet> {
        self.bullets.get(&uuid)
    }

    pub fn find_bullet_mut(&mut self, uuid: u64) -> Option<&mut Bullet> {
        self.bullets.get_mut(&uuid)
    }

    pub fn for_each_player<F: FnMut(&Player)>(&self, f: F) {
        self.players.values().for_each(f);
    }

    pub fn for_each_bullet<F: FnMut(&Bullet)>(&self, f: F) {
        self.bullets.values().for_each(f);
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.values()
    }

    pub(crate) fn bullets_mut(&mut self) -> impl Iterator<Item = &mut Bullet> {
        self.bullets.values_mut()
    }

    /// Point-in-time copy of the player uuids, safe to walk while mutating the store.
    pub fn player_ids(&self) -> Vec<u64> {
        self.players.keys().copied().collect()
    }

    /// Point-in-time copy of the bullet uuids, safe to walk while mutating the store.
    pub fn bullet_ids(&self) -> Vec<u64> {
        self.bullets.keys().copied().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    /// Routes an externally produced intent to a player. Returns false if the player is gone.
    pub fn set_intent(&mut self, uuid: u64, intent: Intent) -> bool {
        match self.players.get_mut(&uuid) {
            Some(player) => {
                player.set_intent(intent);
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> WorldView {
        WorldView {
            players: self.players.values().cloned().collect(),
            bullets: self.bullets.values().cloned().collect(),
        }
    }

    fn claim_id(counter: &mut u64, requested: u64) -> u64 {
        if requested == UNASSIGNED {
            let id = *counter;
            *counter = counter.saturating_add(1);
            id
        } else {
            Self::reserve_id(counter, requested);
            requested
        }
    }

    /// Pushes the counter past an explicit id so it is never handed out again.
    fn reserve_id(counter: &mut u64, taken: u64) {
        *counter = (*counter).max(taken.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Team;
    use crate::intent::Controller;

    fn player() -> Player {
        Player::new(10.0, 10.0, Team(0), Controller::default())
    }

    #[test]
    fn test_store_creation() {
        let store = EntityStore::new();
        assert_eq!(store.player_count(), 0);
        assert_eq!(store.bullet_count(), 0);
    }

    #[test]
    fn test_add_player_assigns_monotonic_ids() {
        let mut store = EntityStore::new();
        let a = store.add_player(player());
        let b = store.add_player(player());

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.find_player(a).map(|p| p.uuid), Some(1));
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut store = EntityStore::new();
        let a = store.add_player(player());
        assert!(store.remove_player(a).is_some());

        let b = store.add_player(player());
        assert_ne!(a, b);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_explicit_id_advances_counter() {
        let mut store = EntityStore::new();
        let mut replica = player();
        replica.uuid = 7;

        assert_eq!(store.add_player(replica), 7);
        assert_eq!(store.add_player(player()), 8);
    }

    #[test]
    fn test_insert_with_id_keeps_zero() {
        let mut store = EntityStore::new();
        let mut replica = player();
        replica.uuid = 0;

        assert_eq!(store.insert_player_with_id(replica), 0);
        assert_eq!(store.player_ids(), vec![0]);
        assert_eq!(store.add_player(player()), 1);

        let mut bullet = Bullet::new(0.0, 0.0, 0.0);
        bullet.uuid = 0;
        assert_eq!(store.insert_bullet_with_id(bullet), 0);
        assert_eq!(store.bullet_ids(), vec![0]);
    }

    #[test]
    fn test_insert_with_max_id_does_not_overflow() {
        let mut store = EntityStore::new();
        let mut replica = player();
        replica.uuid = u64::MAX;

        assert_eq!(store.insert_player_with_id(replica), u64::MAX);
        assert!(store.find_player(u64::MAX).is_some());

        let mut bullet = Bullet::new(0.0, 0.0, 0.0);
        bullet.uuid = u64::MAX;
        assert_eq!(store.add_bullet(bullet), u64::MAX);
    }

    #[test]
    fn test_bullet_ids_are_independent() {
        let mut store = EntityStore::new();
        store.add_player(player());
        store.add_player(player());

        let bullet = store.add_bullet(Bullet::new(0.0, 0.0, 0.0));
        assert_eq!(bullet, 1);
        assert!(store.find_bullet(bullet).is_some());
        assert!(store.remove_bullet(bullet).is_some());
        assert!(store.remove_bullet(bullet).is_none());
        assert_eq!(store.add_bullet(Bullet::new(0.0, 0.0, 0.0)), 2);
    }

    #[test]
    fn test_remove_missing_player() {
        let mut store = EntityStore::new();
        assert!(store.remove_player(42).is_none());
    }

    #[test]
    fn test_iteration_is_uuid_ordered() {
        let mut store = EntityStore::new();
        for uuid in [5, 2, 9] {
            let mut p = player();
            p.uuid = uuid;
            store.add_player(p);
        }

        let mut seen = Vec::new();
        store.for_each_player(|p| seen.push(p.uuid));
        assert_eq!(seen, vec![2, 5, 9]);
        assert_eq!(store.player_ids(), vec![2, 5, 9]);
    }

    #[test]
    fn test_removal_while_walking_id_copy() {
        let mut store = EntityStore::new();
        for _ in 0..4 {
            store.add_player(player());
        }

        for uuid in store.player_ids() {
            if uuid % 2 == 0 {
                store.remove_player(uuid);
            }
        }

        assert_eq!(store.player_ids(), vec![1, 3]);
    }

    #[test]
    fn test_set_intent() {
        let mut store = EntityStore::new();
        let uuid = store.add_player(player());
        let intent = Intent {
            shoot: true,
            ..Intent::default()
        };

        assert!(store.set_intent(uuid, intent));
        assert!(!store.set_intent(99, intent));

        match &store.find_player(uuid).map(|p| p.controller.clone()) {
            Some(Controller::Input(stored)) => assert!(stored.shoot),
            other => panic!("unexpected controller: {:?}", other),
        }
    }

    #[test]
    fn test_view_copies_everything() {
        let mut store = EntityStore::new();
        store.add_player(player());
        store.add_bullet(Bullet::new(1.0, 2.0, 0.0));

        let view = store.view();
        assert_eq!(view.players.len(), 1);
        assert_eq!(view.bullets.len(), 1);
        assert_eq!(view.bullets[0].x, 1.0);
    }
}
