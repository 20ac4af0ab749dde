//! Bullet vs player resolution, run once per tick after movement.
//!
//! Nothing is removed while the scan is running. Dead players and spent bullets are
//! collected first and dropped in a second pass.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::physics::{circle_intersects_box, Arena};
use crate::store::EntityStore;
use crate::{KILL_BONUS, PLAYER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub bullet: u64,
    pub victim: u64,
    /// `None` when the shooter is no longer in the store.
    pub shooter: Option<u64>,
    pub victim_hp: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub hits: Vec<Hit>,
    /// Players removed this pass, in the order they died.
    pub killed: Vec<u64>,
    /// Bullets removed for leaving the arena.
    pub expired_bullets: Vec<u64>,
}

/// Resolves every bullet against every player, then applies removals.
pub fn resolve(store: &mut EntityStore, arena: &Arena) -> CombatReport {
    let mut report = CombatReport::default();
    let mut spent_bullets: BTreeSet<u64> = BTreeSet::new();
    let mut dead_players: BTreeSet<u64> = BTreeSet::new();

    let player_ids = store.player_ids();

    for bullet_id in store.bullet_ids() {
        let Some(bullet) = store.find_bullet(bullet_id).cloned() else {
            continue;
        };

        if !arena.contains(bullet.x, bullet.y) {
            spent_bullets.insert(bullet_id);
            report.expired_bullets.push(bullet_id);
            continue;
        }

        for &player_id in &player_ids {
            let Some(victim) = store.find_player_mut(player_id) else {
                continue;
            };
            if !bullet.can_harm(victim) {
                continue;
            }
            if !circle_intersects_box(bullet.position(), bullet.radius, victim.position(), PLAYER_SIZE)
            {
                continue;
            }

            victim.hp -= bullet.damage;
            victim.score -= i64::from(bullet.damage);
            let victim_hp = victim.hp;
            let died = victim.is_dead() && dead_players.insert(player_id);

            let shooter = bullet
                .owner
                .and_then(|owner| store.find_player_mut(owner))
                .map(|owner| {
                    owner.score += i64::from(bullet.damage);
                    if died {
                        owner.score += KILL_BONUS;
                    }
                    owner.uuid
                });

            if died {
                report.killed.push(player_id);
            }
            report.hits.push(Hit {
                bullet: bullet_id,
                victim: player_id,
                shooter,
                victim_hp,
            });
            debug!(
                "Bullet {} hit player {} (hp {}, shooter {:?})",
                bullet_id, player_id, victim_hp, shooter
            );

            spent_bullets.insert(bullet_id);
            // One target per bullet per tick.
            break;
        }
    }

    for bullet_id in spent_bullets {
        store.remove_bullet(bullet_id);
    }
    for player_id in dead_players {
        store.remove_player(player_id);
        info!("Player {} eliminated", player_id);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Bullet, Player, Team};
    use crate::intent::Controller;
    use crate::{BULLET_DAMAGE, PLAYER_MAX_HP};

    fn add_player(store: &mut EntityStore, x: f32, y: f32, team: u64) -> u64 {
        store.add_player(Player::new(x, y, Team(team), Controller::default()))
    }

    fn fire(store: &mut EntityStore, shooter: u64, x: f32, y: f32) -> u64 {
        let mut bullet = store
            .find_player(shooter)
            .map(Bullet::fired_by)
            .expect("shooter exists");
        bullet.x = x;
        bullet.y = y;
        store.add_bullet(bullet)
    }

    #[test]
    fn test_single_hit_scores() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let x = add_player(&mut store, 100.0, 100.0, 0);
        let y = add_player(&mut store, 105.0, 100.0, 1);
        let bullet = fire(&mut store, y, 105.0, 100.0);

        let report = resolve(&mut store, &arena);

        let victim = store.find_player(x).unwrap();
        assert_eq!(victim.hp, 90);
        assert_eq!(victim.score, -10);
        assert_eq!(store.find_player(y).unwrap().score, 10);
        assert!(store.find_bullet(bullet).is_none());
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].shooter, Some(y));
        assert!(report.killed.is_empty());
    }

    #[test]
    fn test_ten_hits_kill_and_award_bonus_once() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let x = add_player(&mut store, 100.0, 100.0, 0);
        let y = add_player(&mut store, 105.0, 100.0, 1);

        for round in 1..=10 {
            fire(&mut store, y, 105.0, 100.0);
            let report = resolve(&mut store, &arena);
            if round < 10 {
                assert!(report.killed.is_empty());
                assert_eq!(store.find_player(x).unwrap().hp, PLAYER_MAX_HP - 10 * round);
            } else {
                assert_eq!(report.killed, vec![x]);
            }
        }

        assert!(store.find_player(x).is_none());
        assert_eq!(store.find_player(y).unwrap().score, 10 * 10 + KILL_BONUS);
    }

    #[test]
    fn test_two_bullets_same_tick_bonus_once() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let x = add_player(&mut store, 100.0, 100.0, 0);
        let y = add_player(&mut store, 300.0, 300.0, 1);
        store.find_player_mut(x).unwrap().hp = 10;

        fire(&mut store, y, 110.0, 110.0);
        fire(&mut store, y, 112.0, 112.0);

        let report = resolve(&mut store, &arena);

        assert_eq!(report.hits.len(), 2);
        assert_eq!(report.hits[1].victim_hp, -10);
        assert_eq!(report.killed, vec![x]);
        assert!(store.find_player(x).is_none());
        assert_eq!(store.bullet_count(), 0);
        assert_eq!(store.find_player(y).unwrap().score, 20 + KILL_BONUS);
    }

    #[test]
    fn test_bullet_hits_only_first_player() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let a = add_player(&mut store, 100.0, 100.0, 0);
        let b = add_player(&mut store, 102.0, 102.0, 1);
        let shooter = add_player(&mut store, 400.0, 400.0, 2);

        fire(&mut store, shooter, 110.0, 110.0);
        let report = resolve(&mut store, &arena);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].victim, a);
        assert_eq!(store.find_player(a).unwrap().hp, PLAYER_MAX_HP - BULLET_DAMAGE);
        assert_eq!(store.find_player(b).unwrap().hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_no_friendly_fire() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let mate = add_player(&mut store, 100.0, 100.0, 3);
        let shooter = add_player(&mut store, 105.0, 100.0, 3);

        let bullet = fire(&mut store, shooter, 110.0, 110.0);
        let report = resolve(&mut store, &arena);

        assert!(report.hits.is_empty());
        assert_eq!(store.find_player(mate).unwrap().hp, PLAYER_MAX_HP);
        assert_eq!(store.find_player(shooter).unwrap().hp, PLAYER_MAX_HP);
        assert!(store.find_bullet(bullet).is_some());
    }

    #[test]
    fn test_bullet_skips_teammate_and_hits_enemy_behind() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let mate = add_player(&mut store, 100.0, 100.0, 1);
        let enemy = add_player(&mut store, 104.0, 104.0, 2);
        let shooter = add_player(&mut store, 500.0, 500.0, 1);

        fire(&mut store, shooter, 110.0, 110.0);
        let report = resolve(&mut store, &arena);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].victim, enemy);
        assert_eq!(store.find_player(mate).unwrap().hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_out_of_bounds_bullet_removed_without_collision() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        // A player straddling the left edge would be hit if collisions were tested.
        let edge = add_player(&mut store, 0.0, 100.0, 0);
        let shooter = add_player(&mut store, 400.0, 400.0, 1);
        let bullet = fire(&mut store, shooter, -3.0, 110.0);

        let report = resolve(&mut store, &arena);

        assert_eq!(report.expired_bullets, vec![bullet]);
        assert!(report.hits.is_empty());
        assert!(store.find_bullet(bullet).is_none());
        assert_eq!(store.find_player(edge).unwrap().hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_vanished_owner_gets_no_credit() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let victim = add_player(&mut store, 100.0, 100.0, 0);
        let shooter = add_player(&mut store, 105.0, 100.0, 1);
        let bullet = fire(&mut store, shooter, 110.0, 110.0);
        store.remove_player(shooter);

        let report = resolve(&mut store, &arena);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].shooter, None);
        assert_eq!(store.find_player(victim).unwrap().hp, 90);
        assert!(store.find_bullet(bullet).is_none());
    }

    #[test]
    fn test_ownerless_bullet_hits_anyone() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        let victim = add_player(&mut store, 100.0, 100.0, 0);
        store.add_bullet(Bullet::new(110.0, 110.0, 0.0));

        let report = resolve(&mut store, &arena);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(store.find_player(victim).unwrap().hp, 90);
    }

    #[test]
    fn test_missed_bullet_survives() {
        let arena = Arena::default();
        let mut store = EntityStore::new();
        add_player(&mut store, 100.0, 100.0, 0);
        let shooter = add_player(&mut store, 400.0, 400.0, 1);
        let bullet = fire(&mut store, shooter, 300.0, 50.0);

        let report = resolve(&mut store, &arena);

        assert!(report.hits.is_empty());
        assert!(store.find_bullet(bullet).is_some());
    }
}
