//! Merges an incoming [`WorldSnapshot`] into a local [`EntityStore`].
//!
//! Add what is new, update what is known, evict what the snapshot no longer
//! mentions. The receiver's own player (`local_identity`) is never touched, so
//! server echo cannot overwrite local prediction. Unknown uuids in either direction
//! are ordinary joins and leaves, not errors. Applying the same snapshot twice
//! leaves the store exactly as the first application did.
//!
//! Replicas are never simulated, so their cooldown is held at zero on every
//! merge, not only on first sight. That keeps a second application of a snapshot
//! identical to the first.

use crate::codec::{
    decode_bullet, decode_player, instantiate_bullet, instantiate_player, WorldSnapshot,
};
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added_players: Vec<u64>,
    pub updated_players: usize,
    pub removed_players: Vec<u64>,
    pub added_bullets: usize,
    pub removed_bullets: usize,
}

pub fn apply(
    snapshot: &WorldSnapshot,
    store: &mut EntityStore,
    local_identity: Option<u64>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for (&uuid, record) in &snapshot.players {
        if Some(uuid) == local_identity {
            continue;
        }
        match store.find_player_mut(uuid) {
            Some(player) => {
                // Record cooldown ignored so re-applying a snapshot is idempotent.
                decode_player(record, player);
                player.cooldown = 0.0;
                report.updated_players += 1;
            }
            None => {
                store.insert_player_with_id(instantiate_player(record));
                report.added_players.push(uuid);
            }
        }
    }

    // Walk a copy of the ids so eviction never mutates what we iterate.
    for uuid in store.player_ids() {
        if Some(uuid) == local_identity || snapshot.players.contains_key(&uuid) {
            continue;
        }
        store.remove_player(uuid);
        report.removed_players.push(uuid);
    }

    for (&uuid, record) in &snapshot.bullets {
        match store.find_bullet_mut(uuid) {
            Some(bullet) => decode_bullet(record, bullet),
            None => {
                store.insert_bullet_with_id(instantiate_bullet(record));
                report.added_bullets += 1;
            }
        }
    }

    for uuid in store.bullet_ids() {
        if !snapshot.bullets.contains_key(&uuid) {
            store.remove_bullet(uuid);
            report.removed_bullets += 1;
        }
    }

    report
}
