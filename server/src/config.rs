use shared::{Arena, Team, DEFAULT_SNAPSHOT_RATE, DEFAULT_TICK_RATE};
use std::time::Duration;

/// How players are split into sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamMode {
    /// Every player is alone on its own team.
    FreeForAll,
    /// Players are dealt round-robin into this many teams by uuid.
    Teams(u64),
}

impl TeamMode {
    /// `0` means free for all.
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            TeamMode::FreeForAll
        } else {
            TeamMode::Teams(count)
        }
    }

    pub fn team_for(&self, uuid: u64) -> Team {
        match self {
            TeamMode::FreeForAll => Team(uuid),
            TeamMode::Teams(count) => Team(uuid % count),
        }
    }
}

/// Runtime settings for an arena server, fixed at start-up.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// World snapshots sent to clients per second.
    pub broadcast_rate: u32,
    pub max_clients: usize,
    pub arena: Arena,
    pub team_mode: TeamMode,
    /// Server-side policy players inserted at start-up.
    pub bots: usize,
    pub seed: u64,
    /// Disconnect clients that stay silent for this long.
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            tick_rate: DEFAULT_TICK_RATE,
            broadcast_rate: DEFAULT_SNAPSHOT_RATE,
            max_clients: 16,
            arena: Arena::default(),
            team_mode: TeamMode::FreeForAll,
            bots: 0,
            seed: 0,
            client_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(1) / self.broadcast_rate.max(1)
    }
}
