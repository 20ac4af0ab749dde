use shared::DEFAULT_TICK_RATE;
use std::time::Duration;

/// Runtime settings for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, `host:port`
    pub server: String,
    /// Drive the avatar with the random policy instead of an idle intent
    pub bot: bool,
    pub seed: u64,
    /// Local prediction steps per second
    pub predict_rate: u32,
    /// Snapshot pulls (and intent uploads) per second
    pub pull_rate: u32,
    /// Longest a pull waits for a frame
    pub recv_timeout: Duration,
    pub handshake_timeout: Duration,
    /// Period of the headless status line
    pub status_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:8080".to_string(),
            bot: false,
            seed: 0,
            predict_rate: DEFAULT_TICK_RATE,
            pull_rate: 20,
            recv_timeout: Duration::from_millis(50),
            handshake_timeout: Duration::from_secs(5),
            status_interval: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    pub fn predict_interval(&self) -> Duration {
        Duration::from_secs(1) / self.predict_rate.max(1)
    }

    pub fn pull_interval(&self) -> Duration {
        Duration::from_secs(1) / self.pull_rate.max(1)
    }
}
