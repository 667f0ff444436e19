//! Client identifiers and listener streams
//!
//! Each listener owns a [`ClientStream`], the receiving half of a bounded
//! channel. The registry keeps the sending half and treats a dropped stream
//! as a closed sink.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for a connected listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiving side of a listener connection
///
/// Chunks arrive in the order the pipeline produced them. The stream yields
/// `None` once the client has been unregistered and its buffer drained.
#[derive(Debug)]
pub struct ClientStream {
    id: ClientId,
    rx: mpsc::Receiver<Bytes>,
}

impl ClientStream {
    pub(super) fn new(id: ClientId, rx: mpsc::Receiver<Bytes>) -> Self {
        Self { id, rx }
    }

    /// Identifier this stream was registered under
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Wait for the next chunk
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Take a chunk if one is already buffered
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    /// Close the sink; the next broadcast pass prunes this client
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for ClientStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Sending side held by the registry
#[derive(Debug)]
pub(super) struct ClientSink {
    tx: mpsc::Sender<Bytes>,
}

/// Outcome of writing one chunk to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Delivery {
    /// Chunk queued for the client
    Sent,
    /// Client dropped or closed its stream
    Closed,
    /// Client buffer is full; it is not keeping up with real time
    Lagging,
}

impl ClientSink {
    pub(super) fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }

    /// Queue a chunk without waiting
    pub(super) fn deliver(&self, chunk: Bytes) -> Delivery {
        match self.tx.try_send(chunk) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Lagging,
        }
    }

    pub(super) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ClientId::new();
        let b = ClientId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[tokio::test]
    async fn test_sink_delivery() {
        let (tx, rx) = mpsc::channel(1);
        let sink = ClientSink::new(tx);
        let mut stream = ClientStream::new(ClientId::new(), rx);

        assert_eq!(sink.deliver(Bytes::from_static(b"a")), Delivery::Sent);
        assert_eq!(sink.deliver(Bytes::from_static(b"b")), Delivery::Lagging);
        assert_eq!(stream.recv().await.unwrap(), Bytes::from_static(b"a"));

        stream.close();
        assert!(sink.is_closed());
        assert_eq!(sink.deliver(Bytes::from_static(b"c")), Delivery::Closed);
    }
}
