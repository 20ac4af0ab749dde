use clap::Parser;
use client::config::ClientConfig;
use client::network::Client;
use log::{error, info};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Let the random policy play instead of standing idle
    #[arg(short = 'b', long)]
    bot: bool,

    /// Seed for the random policy
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Snapshot pulls and intent uploads per second
    #[arg(short = 'r', long, default_value = "20")]
    pull_rate: u32,

    /// Longest a pull waits for a snapshot, in milliseconds
    #[arg(long, default_value = "50")]
    recv_timeout_ms: u64,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        ClientConfig {
            server: args.server,
            bot: args.bot,
            seed: args.seed,
            pull_rate: args.pull_rate,
            recv_timeout: Duration::from_millis(args.recv_timeout_ms),
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::from(Args::parse());
    info!("Starting client...");
    if config.bot {
        info!("Random policy is driving the avatar (seed {})", config.seed);
    }

    let result = match Client::connect(config).await {
        Ok(client) => client.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Connection lost: {}", e);
        std::process::exit(1);
    }
}
