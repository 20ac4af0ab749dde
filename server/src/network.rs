//! Server network layer: TCP accept loop, per-connection tasks and the periodic
//! snapshot broadcaster.

use crate::client_manager::{Client, ClientManager, Frame};
use crate::config::ServerConfig;
use crate::game::{self, SharedStore};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::protocol::{encode_frame, write_frame, write_packet};
use shared::{codec, Controller, EntityStore, FrameReader, Packet, Simulation};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Snapshots queued per client before new ones are dropped for it.
const OUTBOUND_QUEUE: usize = 8;
const TIMEOUT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// Longest a reader blocks before re-checking how long its client has been quiet.
const READ_POLL: Duration = Duration::from_millis(50);

/// Messages sent from network tasks to the main server loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    ClientLost { uuid: u64, reason: String },
}

/// Authoritative arena server: owns the listener, the world and the client registry
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    store: SharedStore,
    clients: Arc<RwLock<ClientManager>>,
    simulation: Simulation,
    rng: StdRng,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Binds the listener and seeds the world with the configured bots.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.address).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut store = EntityStore::new();
        let bots = game::spawn_bots(&mut store, &config, &mut rng);
        if !bots.is_empty() {
            info!("Spawned {} bots", bots.len());
        }

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            simulation: Simulation::new(config.arena),
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            store: game::shared_store(store),
            config,
            rng,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the authoritative world.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Runs until the listener fails. Background tasks stop when this returns.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let tasks = vec![
            tokio::spawn(game::run_simulation(
                Arc::clone(&self.store),
                self.simulation,
                self.config.tick_interval(),
            )),
            self.spawn_broadcaster(),
            self.spawn_timeout_checker(),
        ];

        info!(
            "Server started: {} Hz simulation, {} Hz snapshots, arena {}x{}",
            self.config.tick_rate,
            self.config.broadcast_rate,
            self.config.arena.width,
            self.config.arena.height
        );

        let result: Result<(), ServerError> = loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_connection(stream, addr).await,
                        Err(e) => break Err(e.into()),
                    }
                }

                message = self.server_rx.recv() => {
                    // The loop holds a sender, so the channel never closes.
                    if let Some(ServerMessage::ClientLost { uuid, reason }) = message {
                        self.evict(uuid, &reason).await;
                    }
                }
            }
        };

        for task in tasks {
            task.abort();
        }
        result
    }

    /// Performs the join handshake for a new connection.
    async fn handle_connection(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        if self.clients.read().await.is_full() {
            warn!("Rejecting {}: server full", addr);
            tokio::spawn(async move {
                let packet = Packet::Rejected {
                    reason: "Server full".to_string(),
                };
                if let Err(e) = write_packet(&mut stream, &packet).await {
                    debug!("Failed to send rejection to {}: {}", addr, e);
                }
                let _ = stream.shutdown().await;
            });
            return;
        }

        let uuid = {
            let mut store = self.store.write().await;
            game::spawn_player(
                &mut store,
                &self.config.arena,
                Controller::default(),
                self.config.team_mode,
                &mut self.rng,
            )
        };

        let join = Packet::Join {
            uuid,
            arena: self.config.arena,
        };
        let frame: Frame = match encode_frame(&join) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                error!("Failed to encode join for {}: {}", addr, e);
                game::remove_player(&mut *self.store.write().await, uuid);
                return;
            }
        };

        // Join goes first in the queue, ahead of any snapshot.
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        if outbound_tx.try_send(frame).is_err() {
            game::remove_player(&mut *self.store.write().await, uuid);
            return;
        }

        let registered = self
            .clients
            .write()
            .await
            .add_client(Client::new(uuid, addr, outbound_tx));
        if !registered {
            game::remove_player(&mut *self.store.write().await, uuid);
            return;
        }

        let (read_half, write_half) = stream.into_split();
        let tasks = vec![
            self.spawn_writer(uuid, write_half, outbound_rx),
            self.spawn_reader(uuid, read_half),
        ];
        self.clients.write().await.attach_tasks(uuid, tasks);
    }

    /// Drains a client's outbound queue onto its socket.
    fn spawn_writer(
        &self,
        uuid: u64,
        mut write_half: OwnedWriteHalf,
        mut outbound_rx: mpsc::Receiver<Frame>,
    ) -> JoinHandle<()> {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write_frame(&mut write_half, &frame).await {
                    let _ = server_tx.send(ServerMessage::ClientLost {
                        uuid,
                        reason: format!("write failed: {}", e),
                    });
                    return;
                }
            }
        })
    }

    /// Reads intents from a client and routes them to its player.
    ///
    /// Reads are bounded by [`READ_POLL`], so a peer that goes quiet without
    /// closing is reported once it has been silent for the client timeout.
    fn spawn_reader(&self, uuid: u64, read_half: OwnedReadHalf) -> JoinHandle<()> {
        let server_tx = self.server_tx.clone();
        let clients = Arc::clone(&self.clients);
        let store = Arc::clone(&self.store);
        let idle_limit = self.config.client_timeout;

        tokio::spawn(async move {
            let mut reader = FrameReader::new(read_half);
            let mut last_packet = Instant::now();

            loop {
                let packet = match tokio::time::timeout(READ_POLL, reader.read_packet()).await {
                    Ok(packet) => packet,
                    Err(_) => {
                        if last_packet.elapsed() > idle_limit {
                            let _ = server_tx.send(ServerMessage::ClientLost {
                                uuid,
                                reason: format!("silent for {:?}", last_packet.elapsed()),
                            });
                            return;
                        }
                        continue;
                    }
                };

                if packet.is_ok() {
                    last_packet = Instant::now();
                }

                match packet {
                    Ok(Packet::Intent(intent)) => {
                        clients.write().await.touch(uuid);
                        if !game::apply_intent(&mut *store.write().await, uuid, intent) {
                            debug!("Ignoring intent from eliminated player {}", uuid);
                        }
                    }
                    Ok(other) => {
                        clients.write().await.touch(uuid);
                        warn!("Unexpected packet from client {}: {:?}", uuid, other);
                    }
                    Err(e) if !e.is_fatal() => {
                        warn!("Dropping malformed frame from client {}: {}", uuid, e);
                    }
                    Err(e) => {
                        let _ = server_tx.send(ServerMessage::ClientLost {
                            uuid,
                            reason: e.to_string(),
                        });
                        return;
                    }
                }
            }
        })
    }

    /// Encodes the world once per cadence and queues it for every client.
    fn spawn_broadcaster(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = self.config.broadcast_interval();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if clients.read().await.is_empty() {
                    continue;
                }

                let snapshot = codec::encode_world(&*store.read().await);
                let frame: Frame = match encode_frame(&Packet::Snapshot(snapshot)) {
                    Ok(bytes) => bytes.into(),
                    Err(e) => {
                        error!("Failed to encode snapshot: {}", e);
                        continue;
                    }
                };

                let closed = clients.read().await.broadcast(&frame);
                for uuid in closed {
                    let _ = server_tx.send(ServerMessage::ClientLost {
                        uuid,
                        reason: "outbound channel closed".to_string(),
                    });
                }
            }
        })
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.config.client_timeout;

        tokio::spawn(async move {
            let mut ticker = interval(TIMEOUT_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let timed_out = clients.read().await.check_timeouts(timeout);
                for uuid in timed_out {
                    let _ = server_tx.send(ServerMessage::ClientLost {
                        uuid,
                        reason: format!("no packets for {:?}", timeout),
                    });
                }
            }
        })
    }

    /// Drops the client's connection and its player. Safe to call twice.
    async fn evict(&mut self, uuid: u64, reason: &str) {
        let removed = self.clients.write().await.remove_client(&uuid);
        if !removed {
            return;
        }

        info!("Evicting client {}: {}", uuid, reason);
        game::remove_player(&mut *self.store.write().await, uuid);
    }
}
