//! Broadcaster pump
//!
//! Every throttle writes into one shared feed. A single pump task drains the
//! feed and hands each chunk to the client registry, so chunks from a retired
//! throttle always reach clients before chunks from its replacement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::registry::ClientRegistry;

/// Default feed capacity in chunks
pub const DEFAULT_FEED_CAPACITY: usize = 16;

/// Counters updated by the pump
#[derive(Debug, Default)]
pub struct BroadcastCounters {
    /// Chunks handed to the registry
    pub chunks: AtomicU64,
    /// Bytes handed to the registry
    pub bytes: AtomicU64,
}

/// Fan-out stage between the throttles and the client registry
pub struct Broadcaster {
    feed: mpsc::Sender<Bytes>,
    counters: Arc<BroadcastCounters>,
    pump: JoinHandle<()>,
}

impl Broadcaster {
    /// Spawn the pump task feeding `registry`
    pub fn spawn(registry: Arc<ClientRegistry>, capacity: usize) -> Self {
        let (feed, mut rx) = mpsc::channel::<Bytes>(capacity.max(1));
        let counters = Arc::new(BroadcastCounters::default());
        let pump_counters = Arc::clone(&counters);

        let pump = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                let len = chunk.len() as u64;
                let report = registry.broadcast(chunk).await;

                pump_counters.chunks.fetch_add(1, Ordering::Relaxed);
                pump_counters.bytes.fetch_add(len, Ordering::Relaxed);

                tracing::trace!(
                    bytes = len,
                    delivered = report.delivered,
                    pruned = report.pruned,
                    "Chunk broadcast"
                );
            }

            tracing::debug!("Broadcaster feed closed");
        });

        Self {
            feed,
            counters,
            pump,
        }
    }

    /// A handle for a throttle to write into
    pub fn feed(&self) -> mpsc::Sender<Bytes> {
        self.feed.clone()
    }

    /// Total chunks broadcast
    pub fn chunks_broadcast(&self) -> u64 {
        self.counters.chunks.load(Ordering::Relaxed)
    }

    /// Total bytes broadcast
    pub fn bytes_broadcast(&self) -> u64 {
        self.counters.bytes.load(Ordering::Relaxed)
    }

    /// Stop the pump; chunks still queued are discarded
    pub fn shutdown(&self) {
        self.pump.abort();
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
