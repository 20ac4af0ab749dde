//! # Arena Server Library
//!
//! This library provides the authoritative server for the networked arena shooter.
//! It owns the canonical world, steps it at a fixed rate, and broadcasts full world
//! snapshots to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, firing, bullet flight and combat resolution all happen here. Damage,
//! kills and score are decided only by the server; clients adopt them from
//! snapshots.
//!
//! ### Client Management
//! Handles the lifecycle of client connections:
//! - Join handshake and player spawn
//! - Capacity limit with an explicit rejection
//! - Intent routing from each client to its player
//! - Idle-timeout and broken-connection eviction
//!
//! ### State Broadcasting
//! A broadcaster encodes the world once per cadence and queues the same frame for
//! every client. Slow clients miss snapshots instead of slowing anyone else down.
//!
//! ## Architecture Design
//!
//! ### Decoupled Cadences
//! The simulation (60 Hz by default) and the broadcaster (20 Hz by default) are
//! independent tasks. They meet only at the world lock.
//!
//! ### One Coarse Lock
//! The world is a single `EntityStore` behind a tokio `RwLock`. Each pass
//! (a tick, an encode, an eviction) holds the lock for its whole duration, so no
//! pass ever observes another one half done.
//!
//! ### Length-Prefixed TCP
//! Every message is one frame on a reliable stream: a 4-byte length followed by a
//! bincode payload. See `shared::protocol`.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Start-up settings: address, rates, capacity, arena size, team mode, bots.
//!
//! ### Client Manager Module (`client_manager`)
//! Registry of connected clients keyed by player uuid:
//! - Outbound frame queues with drop-on-full semantics
//! - Last-seen tracking for the idle timeout
//! - Ownership of each connection's reader/writer tasks
//!
//! ### Game Module (`game`)
//! Spawning, intent routing, removal, and the fixed-rate simulation task.
//!
//! ### Network Module (`network`)
//! Accept loop, handshake, per-connection tasks, broadcaster and eviction.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ServerConfig {
//!         address: "127.0.0.1:8080".to_string(),
//!         bots: 2,
//!         ..ServerConfig::default()
//!     };
//!
//!     // Runs until the listener fails:
//!     // - Accepts clients and hands each one a player
//!     // - Steps the world at the tick rate
//!     // - Broadcasts snapshots at the broadcast rate
//!     // - Evicts clients that disconnect or go silent
//!     Server::bind(config).await?.run().await
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
