//! Client registry implementation
//!
//! The registry maps client identifiers to their sinks and replicates every
//! chunk coming out of the playback pipeline to each of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use super::client::{ClientId, ClientSink, ClientStream, Delivery};

/// Default per-client buffer capacity in chunks
pub const DEFAULT_CLIENT_CAPACITY: usize = 1024;

/// Result of one broadcast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients the chunk was queued for
    pub delivered: usize,
    /// Clients removed during this pass
    pub pruned: usize,
}

/// Registry of connected listeners
///
/// Thread-safe via `RwLock`. A broadcast holds the write lock for the whole
/// pass, so a client registered concurrently either sees the entire chunk or
/// none of it.
pub struct ClientRegistry {
    /// Map of client id to sink
    clients: RwLock<HashMap<ClientId, ClientSink>>,

    /// Chunks buffered per client
    capacity: usize,

    /// Clients removed because their buffer overflowed
    evicted: AtomicU64,
}

impl ClientRegistry {
    /// Create a new registry with the default per-client capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CLIENT_CAPACITY)
    }

    /// Create a new registry buffering up to `capacity` chunks per client
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            evicted: AtomicU64::new(0),
        }
    }

    /// Register a new listener
    ///
    /// The listener only receives chunks broadcast after this call returns.
    pub async fn register(&self) -> (ClientId, ClientStream) {
        let id = ClientId::new();
        let (tx, rx) = mpsc::channel(self.capacity);

        let mut clients = self.clients.write().await;
        clients.insert(id, ClientSink::new(tx));

        tracing::info!(client_id = %id, clients = clients.len(), "Client registered");

        (id, ClientStream::new(id, rx))
    }

    /// Remove a listener; unknown ids are ignored
    pub async fn unregister(&self, id: ClientId) -> bool {
        let mut clients = self.clients.write().await;
        let removed = clients.remove(&id).is_some();

        if removed {
            tracing::info!(client_id = %id, clients = clients.len(), "Client unregistered");
        }

        removed
    }

    /// Write a chunk to every live client
    ///
    /// Never waits on a client. Sinks found closed are removed as part of the
    /// pass, and so are clients whose buffer is full: a listener that far
    /// behind real time is no longer live.
    pub async fn broadcast(&self, chunk: Bytes) -> BroadcastReport {
        let mut clients = self.clients.write().await;
        let mut report = BroadcastReport::default();

        clients.retain(|id, sink| {
            if sink.is_closed() {
                tracing::debug!(client_id = %id, "Pruning closed client");
                report.pruned += 1;
                return false;
            }

            match sink.deliver(chunk.clone()) {
                Delivery::Sent => {
                    report.delivered += 1;
                    true
                }
                Delivery::Closed => {
                    tracing::debug!(client_id = %id, "Pruning closed client");
                    report.pruned += 1;
                    false
                }
                Delivery::Lagging => {
                    tracing::warn!(client_id = %id, "Evicting client that fell behind");
                    self.evicted.fetch_add(1, Ordering::Relaxed);
                    report.pruned += 1;
                    false
                }
            }
        });

        report
    }

    /// Check whether a client is still registered
    pub async fn contains(&self, id: ClientId) -> bool {
        self.clients.read().await.contains_key(&id)
    }

    /// Number of registered clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Number of clients evicted for lagging
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Drop every client; their streams end once drained
    pub async fn clear(&self) {
        let mut clients = self.clients.write().await;
        let count = clients.len();
        clients.clear();

        tracing::debug!(clients = count, "Registry cleared");
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
