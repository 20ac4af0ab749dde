//! Registry of connected clients for the arena server
//!
//! This module tracks everything the server holds per connection:
//! - The player uuid handed out in the join handshake
//! - The outbound frame queue drained by the connection's writer task
//! - Last activity time for idle-timeout eviction
//! - The reader/writer task handles, so eviction can tear the socket down
//!
//! Removing a client aborts its tasks, which drops both socket halves and closes
//! the connection.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// One already-framed message, shared between every client it is sent to.
pub type Frame = Arc<[u8]>;

/// Why an outbound frame did not reach a client's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// Queue full; the frame was dropped for this client only.
    Dropped,
    /// Writer task is gone; the client must be evicted.
    Closed,
}

/// Represents a connected client
#[derive(Debug)]
pub struct Client {
    /// Uuid of the player this connection controls
    pub uuid: u64,
    /// Peer address, for logging
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    outbound: mpsc::Sender<Frame>,
    tasks: Vec<JoinHandle<()>>,
}

impl Client {
    pub fn new(uuid: u64, addr: SocketAddr, outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            uuid,
            addr,
            last_seen: Instant::now(),
            outbound,
            tasks: Vec::new(),
        }
    }

    /// Queues a frame without waiting. A full queue drops the frame.
    pub fn send(&self, frame: Frame) -> SendOutcome {
        match self.outbound.try_send(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(TrySendError::Full(_)) => SendOutcome::Dropped,
            Err(TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Checks if the client has been silent for longer than `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Manages all connected clients and enforces the capacity limit
pub struct ClientManager {
    /// Connected clients indexed by player uuid
    clients: HashMap<u64, Client>,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a client. Returns false if the server is full or the uuid is taken.
    pub fn add_client(&mut self, client: Client) -> bool {
        if self.is_full() || self.clients.contains_key(&client.uuid) {
            return false;
        }

        info!("Client {} connected from {}", client.uuid, client.addr);
        self.clients.insert(client.uuid, client);
        true
    }

    /// Hands the connection's reader/writer tasks to the registry.
    ///
    /// If the client is already gone the tasks are aborted right away.
    pub fn attach_tasks(&mut self, uuid: u64, tasks: Vec<JoinHandle<()>>) {
        match self.clients.get_mut(&uuid) {
            Some(client) => client.tasks.extend(tasks),
            None => tasks.iter().for_each(JoinHandle::abort),
        }
    }

    /// Removes a client and closes its connection.
    ///
    /// Returns true if the client was found and removed, false if already gone.
    pub fn remove_client(&mut self, uuid: &u64) -> bool {
        if let Some(client) = self.clients.remove(uuid) {
            info!("Client {} disconnected", client.uuid);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, uuid: &u64) -> bool {
        self.clients.contains_key(uuid)
    }

    /// Records activity from a client.
    pub fn touch(&mut self, uuid: u64) {
        if let Some(client) = self.clients.get_mut(&uuid) {
            client.last_seen = Instant::now();
        }
    }

    /// Queues `frame` for every client. Returns the clients whose writer is gone.
    pub fn broadcast(&self, frame: &Frame) -> Vec<u64> {
        let mut closed = Vec::new();

        for (uuid, client) in &self.clients {
            match client.send(Arc::clone(frame)) {
                SendOutcome::Queued => {}
                SendOutcome::Dropped => {
                    debug!("Client {} is behind, dropping snapshot", uuid);
                }
                SendOutcome::Closed => closed.push(*uuid),
            }
        }

        closed
    }

    /// Returns the uuids of clients silent for longer than `timeout`
    ///
    /// The clients stay registered; the caller evicts them together with their
    /// players so both disappear under the same pass.
    pub fn check_timeouts(&self, timeout: Duration) -> Vec<u64> {
        self.clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(uuid, _)| *uuid)
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn frame(bytes: &[u8]) -> Frame {
        Arc::from(bytes)
    }

    fn client(uuid: u64, addr: SocketAddr, capacity: usize) -> (Client, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Client::new(uuid, addr, tx), rx)
    }

    #[test]
    fn test_client_creation() {
        let (client, _rx) = client(3, test_addr(), 4);
        assert_eq!(client.uuid, 3);
        assert_eq!(client.addr, test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_timeout() {
        let (mut client, _rx) = client(1, test_addr(), 4);
        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_add_and_remove_client() {
        let mut manager = ClientManager::new(2);
        let (c, _rx) = client(1, test_addr(), 4);

        assert!(manager.add_client(c));
        assert!(manager.contains(&1));
        assert_eq!(manager.len(), 1);

        assert!(manager.remove_client(&1));
        assert!(!manager.remove_client(&1));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);
        let (c1, _rx1) = client(1, test_addr(), 4);
        let (c2, _rx2) = client(2, test_addr2(), 4);

        assert!(manager.add_client(c1));
        assert!(manager.is_full());
        assert!(!manager.add_client(c2));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_duplicate_uuid_rejected() {
        let mut manager = ClientManager::new(4);
        let (c1, _rx1) = client(1, test_addr(), 4);
        let (c2, _rx2) = client(1, test_addr2(), 4);

        assert!(manager.add_client(c1));
        assert!(!manager.add_client(c2));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_broadcast_reaches_every_client() {
        let mut manager = ClientManager::new(4);
        let (c1, mut rx1) = client(1, test_addr(), 4);
        let (c2, mut rx2) = client(2, test_addr2(), 4);
        manager.add_client(c1);
        manager.add_client(c2);

        let closed = manager.broadcast(&frame(b"snapshot"));

        assert!(closed.is_empty());
        assert_eq!(&*rx1.try_recv().unwrap(), b"snapshot");
        assert_eq!(&*rx2.try_recv().unwrap(), b"snapshot");
    }

    #[test]
    fn test_broadcast_drops_for_slow_client_only() {
        let mut manager = ClientManager::new(4);
        let (slow, mut slow_rx) = client(1, test_addr(), 1);
        let (fast, mut fast_rx) = client(2, test_addr2(), 4);
        manager.add_client(slow);
        manager.add_client(fast);

        manager.broadcast(&frame(b"first"));
        let closed = manager.broadcast(&frame(b"second"));

        assert!(closed.is_empty());
        assert_eq!(&*slow_rx.try_recv().unwrap(), b"first");
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(&*fast_rx.try_recv().unwrap(), b"first");
        assert_eq!(&*fast_rx.try_recv().unwrap(), b"second");
    }

    #[test]
    fn test_broadcast_reports_closed_writer() {
        let mut manager = ClientManager::new(4);
        let (gone, rx) = client(7, test_addr(), 4);
        manager.add_client(gone);
        drop(rx);

        assert_eq!(manager.broadcast(&frame(b"x")), vec![7]);
        assert_eq!(manager.clients[&7].send(frame(b"y")), SendOutcome::Closed);
    }

    #[test]
    fn test_check_timeouts() {
        let mut manager = ClientManager::new(4);
        let (c1, _rx1) = client(1, test_addr(), 4);
        let (c2, _rx2) = client(2, test_addr2(), 4);
        manager.add_client(c1);
        manager.add_client(c2);

        if let Some(c) = manager.clients.get_mut(&1) {
            c.last_seen = Instant::now() - Duration::from_secs(10);
        }

        assert_eq!(manager.check_timeouts(Duration::from_secs(5)), vec![1]);

        manager.touch(1);
        assert!(manager.check_timeouts(Duration::from_secs(5)).is_empty());
    }

    #[tokio::test]
    async fn test_remove_client_aborts_tasks() {
        let mut manager = ClientManager::new(2);
        let (c, _rx) = client(1, test_addr(), 4);
        manager.add_client(c);

        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        manager.attach_tasks(1, vec![task]);

        manager.remove_client(&1);

        // The sender is dropped once the aborted task is torn down.
        let torn_down = tokio::time::timeout(Duration::from_secs(1), alive_rx).await;
        assert!(matches!(torn_down, Ok(Err(_))));
    }
}
