//! # Arena Client Library
//!
//! Headless client for the arena shooter. It joins a server, mirrors the
//! authoritative world from periodic snapshots, predicts its own avatar locally
//! and uploads its control intent.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! The client's own avatar moves immediately on the local intent. Snapshots never
//! overwrite its position, facing or cooldown; only `hp` and `score`, which the
//! server alone decides, are adopted from them.
//!
//! ### Snapshot Reconciliation
//! Every other player and every bullet follows the latest snapshot exactly: new
//! uuids appear, known ones update, missing ones vanish. Only the newest snapshot
//! in a pull is applied.
//!
//! ### One Task, No Locks
//! Prediction, pulling and status reporting are branches of one `select!` loop over
//! independent intervals, so the client world is owned outright and never locked.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Server address, cadences, timeouts and the bot switch.
//!
//! ### Game Module (`game`)
//! The client-side world: reconciliation, own-avatar handling, prediction and the
//! status line that stands in for rendering.
//!
//! ### Input Module (`input`)
//! Produces the avatar's intent: idle, or the seeded random policy.
//!
//! ### Network Module (`network`)
//! Handshake, bounded snapshot pulls and intent uploads over one TCP connection.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ClientConfig {
//!         server: "127.0.0.1:8080".to_string(),
//!         bot: true,
//!         ..ClientConfig::default()
//!     };
//!
//!     // Returns only when the connection breaks
//!     Client::connect(config).await?.run().await
//! }
//! ```

pub mod config;
pub mod game;
pub mod input;
pub mod network;
