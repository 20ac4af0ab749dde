use clap::Parser;
use log::{error, info};
use server::config::{ServerConfig, TeamMode};
use server::network::Server;
use shared::Arena;
use std::time::Duration;

/// Authoritative arena shooter server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Simulation steps per second
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Snapshots sent to clients per second
    #[clap(short, long, default_value = "20")]
    broadcast_rate: u32,
    /// Maximum concurrent clients
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Arena width
    #[clap(long, default_value = "800")]
    width: f32,
    /// Arena height
    #[clap(long, default_value = "600")]
    height: f32,
    /// Number of teams, 0 for free for all
    #[clap(long, default_value = "0")]
    teams: u64,
    /// Server-controlled random players to add at start-up
    #[clap(long, default_value = "0")]
    bots: usize,
    /// Seed for spawn positions and bot behaviour
    #[clap(long, default_value = "0")]
    seed: u64,
    /// Evict clients silent for this many seconds
    #[clap(long, default_value = "5")]
    client_timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            address: format!("{}:{}", args.host, args.port),
            tick_rate: args.tick_rate,
            broadcast_rate: args.broadcast_rate,
            max_clients: args.max_clients,
            arena: Arena::new(args.width, args.height),
            team_mode: TeamMode::from_count(args.teams),
            bots: args.bots,
            seed: args.seed,
            client_timeout: Duration::from_secs(args.client_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!("Server stopped: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
