use log::{debug, info};
use shared::codec::instantiate_player;
use shared::{
    reconcile, Arena, Controller, EntityStore, Intent, Player, ReconcileReport, Simulation,
    WorldSnapshot, WorldView,
};

/// Client-side world: remote players mirrored from snapshots plus the locally
/// predicted avatar.
pub struct ClientGameState {
    store: EntityStore,
    simulation: Simulation,
    local_uuid: u64,
    seen_self: bool,
    eliminated: bool,
}

impl ClientGameState {
    pub fn new(local_uuid: u64, arena: Arena) -> Self {
        Self {
            store: EntityStore::new(),
            simulation: Simulation::new(arena),
            local_uuid,
            seen_self: false,
            eliminated: false,
        }
    }

    /// Merges one authoritative snapshot.
    ///
    /// Remote entities follow the snapshot exactly. The local avatar is created
    /// from the first snapshot that contains it and afterwards only takes `hp` and
    /// `score` from the server; its motion stays predicted.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> ReconcileReport {
        let report = reconcile::apply(snapshot, &mut self.store, Some(self.local_uuid));

        match snapshot.players.get(&self.local_uuid) {
            Some(record) if !self.eliminated => match self.store.find_player_mut(self.local_uuid) {
                Some(avatar) => {
                    avatar.hp = record.hp;
                    avatar.score = record.score;
                }
                None => {
                    let mut avatar = instantiate_player(record);
                    avatar.controller = Controller::Input(Intent::default());
                    self.store.insert_player_with_id(avatar);
                    self.seen_self = true;
                    info!(
                        "Spawned as player {} at ({:.1}, {:.1})",
                        self.local_uuid, record.x, record.y
                    );
                }
            },
            Some(_) => {}
            None if self.seen_self && !self.eliminated => {
                let last = self.store.remove_player(self.local_uuid);
                self.eliminated = true;
                info!(
                    "Player {} eliminated with score {}, now observing",
                    self.local_uuid,
                    last.map_or(0, |p| p.score)
                );
            }
            None => {}
        }

        if !report.added_players.is_empty() || !report.removed_players.is_empty() {
            debug!(
                "Reconciled: +{:?} -{:?} players, +{} -{} bullets",
                report.added_players,
                report.removed_players,
                report.added_bullets,
                report.removed_bullets
            );
        }

        report
    }

    /// Advances the local avatar with `intent` and drifts every bullet.
    pub fn predict(&mut self, intent: &Intent, dt: f32) {
        if let Some(avatar) = self.store.find_player_mut(self.local_uuid) {
            avatar.set_intent(*intent);
        }
        self.simulation
            .predict(&mut self.store, self.local_uuid, intent, dt);
    }

    pub fn local_uuid(&self) -> u64 {
        self.local_uuid
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.store.find_player(self.local_uuid)
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Read-only copy for whatever presents the world.
    pub fn view(&self) -> WorldView {
        self.store.view()
    }

    /// One-line summary for the periodic status log.
    pub fn status_line(&self) -> String {
        let me = match self.local_player() {
            Some(p) => format!("hp {}/{} score {}", p.hp, p.max_hp, p.score),
            None if self.eliminated => "eliminated".to_string(),
            None => "waiting for spawn".to_string(),
        };
        format!(
            "player {}: {} | {} players, {} bullets",
            self.local_uuid,
            me,
            self.store.player_count(),
            self.store.bullet_count()
        )
    }
}
