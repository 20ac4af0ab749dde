use crate::config::ClientConfig;
use crate::game::ClientGameState;
use crate::input::InputManager;
use log::{debug, info, warn};
use shared::protocol::write_packet;
use shared::{Arena, FrameError, FrameReader, Packet, ReconcileReport, WorldSnapshot};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, MissedTickBehavior};

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// One connected session with an arena server
pub struct Client {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    config: ClientConfig,
    arena: Arena,

    game_state: ClientGameState,
    input_manager: InputManager,

    snapshots_applied: u64,
    frames_dropped: u64,
}

impl Client {
    /// Connects and completes the join handshake.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        info!("Connecting to {}...", config.server);
        let stream = TcpStream::connect(&config.server).await?;
        stream.set_nodelay(true)?;

        let (read_half, writer) = stream.into_split();
        let mut reader = FrameReader::new(read_half);

        let (uuid, arena) = match timeout(config.handshake_timeout, reader.read_packet()).await {
            Err(_) => return Err("timed out waiting for join".into()),
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(Packet::Join { uuid, arena })) => (uuid, arena),
            Ok(Ok(Packet::Rejected { reason })) => {
                return Err(format!("rejected by server: {}", reason).into())
            }
            Ok(Ok(other)) => return Err(format!("unexpected handshake packet: {:?}", other).into()),
        };

        info!(
            "Connected! Player {} in a {}x{} arena",
            uuid, arena.width, arena.height
        );

        let input_manager = if config.bot {
            InputManager::bot(config.seed)
        } else {
            InputManager::idle()
        };

        Ok(Client {
            reader,
            writer,
            arena,
            game_state: ClientGameState::new(uuid, arena),
            input_manager,
            config,
            snapshots_applied: 0,
            frames_dropped: 0,
        })
    }

    pub fn uuid(&self) -> u64 {
        self.game_state.local_uuid()
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    /// Waits briefly for a snapshot, drains whatever else is buffered and applies
    /// only the newest one.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Fatal stream errors are
    /// returned; malformed frames are dropped.
    pub async fn pull(&mut self) -> Result<Option<ReconcileReport>, ClientError> {
        let mut latest = None;

        match timeout(self.config.recv_timeout, self.reader.read_packet()).await {
            Err(_) => {}
            Ok(result) => self.accept(result, &mut latest)?,
        }
        while let Some(result) = self.reader.next_buffered() {
            self.accept(result, &mut latest)?;
        }

        Ok(latest.map(|snapshot| {
            self.snapshots_applied += 1;
            self.game_state.apply_snapshot(&snapshot)
        }))
    }

    fn accept(
        &mut self,
        result: Result<Packet, FrameError>,
        latest: &mut Option<WorldSnapshot>,
    ) -> Result<(), ClientError> {
        match result {
            Ok(Packet::Snapshot(snapshot)) => {
                if latest.replace(snapshot).is_some() {
                    self.frames_dropped += 1;
                }
            }
            Ok(other) => warn!("Unexpected packet from server: {:?}", other),
            Err(e) if !e.is_fatal() => {
                self.frames_dropped += 1;
                warn!("Dropping malformed snapshot: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Uploads the avatar's latest intent.
    pub async fn send_intent(&mut self) -> Result<(), ClientError> {
        let packet = Packet::Intent(self.input_manager.get_current_intent());
        write_packet(&mut self.writer, &packet).await?;
        Ok(())
    }

    /// One prediction step of `dt` seconds. Bullets drift even after elimination.
    pub fn predict(&mut self, dt: f32) {
        let intent = self.input_manager.update(dt, &self.arena);
        self.game_state.predict(&intent, dt);
    }

    /// Runs the session until the connection breaks.
    pub async fn run(mut self) -> Result<(), ClientError> {
        let mut predict_interval = interval(self.config.predict_interval());
        let mut pull_interval = interval(self.config.pull_interval());
        let mut status_interval = interval(self.config.status_interval);
        for ticker in [&mut predict_interval, &mut pull_interval, &mut status_interval] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        let dt = self.config.predict_interval().as_secs_f32();

        loop {
            tokio::select! {
                _ = predict_interval.tick() => {
                    self.predict(dt);
                },

                _ = pull_interval.tick() => {
                    if let Some(report) = self.pull().await? {
                        debug!("Snapshot applied: {} players updated", report.updated_players);
                    }
                    self.send_intent().await?;
                },

                _ = status_interval.tick() => {
                    info!(
                        "{} | {} snapshots, {} dropped",
                        self.game_state.status_line(),
                        self.snapshots_applied,
                        self.frames_dropped
                    );
                },
            }
        }
    }
}
