//! Authoritative world ownership on the server side.
//!
//! The world lives in one [`EntityStore`] behind a tokio `RwLock`. The simulation
//! task takes the write lock for a whole tick, the broadcaster takes the read lock
//! while encoding, and connection handlers take the write lock briefly to spawn,
//! steer or remove their player.

use crate::config::{ServerConfig, TeamMode};
use log::{debug, info, warn};
use rand::Rng;
use shared::{Arena, Controller, EntityStore, Intent, Player, RandomPolicy, Simulation, Team};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, Instant, MissedTickBehavior};

pub type SharedStore = Arc<RwLock<EntityStore>>;

/// Largest step the simulation will take after a stall, in seconds.
pub const MAX_DELTA_TIME: f32 = 1.0 / 20.0;

pub fn shared_store(store: EntityStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Inserts a player at a random spot inside the arena and returns its uuid.
///
/// The team depends on the uuid, so it is assigned once the store has handed one out.
pub fn spawn_player<R: Rng>(
    store: &mut EntityStore,
    arena: &Arena,
    controller: Controller,
    team_mode: TeamMode,
    rng: &mut R,
) -> u64 {
    let extent = arena.spawn_extent();
    let x = rng.gen_range(0.0..=extent.x);
    let y = rng.gen_range(0.0..=extent.y);

    let uuid = store.add_player(Player::new(x, y, Team(0), controller));
    if let Some(player) = store.find_player_mut(uuid) {
        player.team = team_mode.team_for(uuid);
        info!(
            "Spawned player {} at ({:.1}, {:.1}) on team {}",
            uuid, x, y, player.team.0
        );
    }
    uuid
}

/// Inserts the configured number of policy-driven players.
pub fn spawn_bots<R: Rng>(store: &mut EntityStore, config: &ServerConfig, rng: &mut R) -> Vec<u64> {
    (0..config.bots)
        .map(|i| {
            let policy = RandomPolicy::new(config.seed.wrapping_add(i as u64));
            spawn_player(
                store,
                &config.arena,
                Controller::Policy(policy),
                config.team_mode,
                rng,
            )
        })
        .collect()
}

/// Replaces a connected player's intent. False if the player is gone.
pub fn apply_intent(store: &mut EntityStore, uuid: u64, intent: Intent) -> bool {
    store.set_intent(uuid, intent)
}

/// Removes a player if it is still present.
pub fn remove_player(store: &mut EntityStore, uuid: u64) -> bool {
    if store.remove_player(uuid).is_some() {
        info!("Removed player {}", uuid);
        true
    } else {
        false
    }
}

/// Caps the measured frame time so a stalled task does not teleport bullets.
pub fn clamp_delta(delta_time: f32) -> f32 {
    if delta_time > MAX_DELTA_TIME {
        warn!(
            "Large delta time detected ({:.3}s), capping to {:.3}s",
            delta_time, MAX_DELTA_TIME
        );
        MAX_DELTA_TIME
    } else {
        delta_time
    }
}

/// Steps the world at a fixed cadence until the task is aborted.
pub async fn run_simulation(store: SharedStore, simulation: Simulation, tick_interval: Duration) {
    let mut interval_timer = interval(tick_interval);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick fires immediately
    interval_timer.tick().await;
    let mut last_update = Instant::now();
    let mut tick: u64 = 0;

    loop {
        interval_timer.tick().await;

        let now = Instant::now();
        let delta_time = clamp_delta((now - last_update).as_secs_f32());
        last_update = now;

        let (report, players, bullets) = {
            let mut state = store.write().await;
            let report = simulation.tick(&mut state, delta_time);
            (report, state.player_count(), state.bullet_count())
        };
        tick += 1;

        if report.bullets_fired > 0 || !report.combat.hits.is_empty() {
            debug!(
                "Tick {}: {} fired, {} hits",
                tick,
                report.bullets_fired,
                report.combat.hits.len()
            );
        }
        if tick % 600 == 0 {
            debug!("Tick {}: {} players, {} bullets", tick, players, bullets);
        }
    }
}
