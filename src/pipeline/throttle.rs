//! Real-time throttle stage
//!
//! A throttle reads from its current upstream and releases the bytes into the
//! broadcaster feed at a fixed rate, so listeners receive audio no faster
//! than it plays.
//!
//! The upstream can be detached and reattached while the task keeps running.
//! A chunk is either fully forwarded before a detach takes effect or never
//! read from the upstream at all, so a hot-swap never loses or repeats
//! bytes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

/// Byte source feeding a throttle
pub type Upstream = Box<dyn AsyncRead + Send + Unpin>;

/// Largest chunk forwarded in one step
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// How far the pacer may fall behind before it stops trying to catch up
const MAX_LAG: Duration = Duration::from_millis(500);

enum Control {
    Attach(Upstream),
    Detach(oneshot::Sender<Option<Upstream>>),
    End,
}

/// Why a throttle task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleExit {
    /// `end()` was called or the handle was dropped
    Ended,
    /// The upstream reached end of file
    UpstreamFinished,
    /// The upstream returned a read error
    UpstreamFailed,
    /// The broadcaster feed is gone
    FeedClosed,
}

/// Handle to a running throttle task
///
/// Dropping the handle ends the task.
pub struct Throttle {
    rate: u64,
    control: mpsc::UnboundedSender<Control>,
    forwarded: Arc<AtomicU64>,
    done: watch::Receiver<Option<ThrottleExit>>,
}

impl Throttle {
    /// Spawn a throttle releasing `rate` bytes/sec into `feed`
    ///
    /// The throttle starts without an upstream; call [`attach`](Self::attach)
    /// to begin forwarding.
    pub fn new(rate: u64, feed: mpsc::Sender<Bytes>) -> Self {
        let rate = rate.max(1);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = watch::channel(None);
        let forwarded = Arc::new(AtomicU64::new(0));

        let task = ThrottleTask {
            pacer: Pacer::new(rate),
            chunk_size: chunk_size_for(rate),
            control: control_rx,
            feed,
            forwarded: Arc::clone(&forwarded),
        };

        tokio::spawn(async move {
            let exit = task.run().await;
            let _ = done_tx.send(Some(exit));
        });

        Self {
            rate,
            control: control_tx,
            forwarded,
            done: done_rx,
        }
    }

    /// Spawn a throttle already reading from `upstream`
    pub fn with_upstream(rate: u64, feed: mpsc::Sender<Bytes>, upstream: Upstream) -> Self {
        let throttle = Self::new(rate, feed);
        // Freshly spawned task cannot have exited yet
        let _ = throttle.control.send(Control::Attach(upstream));
        throttle
    }

    /// Target rate in bytes/sec
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Total bytes released into the feed
    pub fn bytes_forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Start forwarding from `upstream`, replacing any current one
    ///
    /// Hands the upstream back if the task already exited.
    pub fn attach(&self, upstream: Upstream) -> Result<(), Upstream> {
        if let Err(mpsc::error::SendError(Control::Attach(upstream))) =
            self.control.send(Control::Attach(upstream))
        {
            return Err(upstream);
        }
        Ok(())
    }

    /// Pause forwarding and take the upstream back
    ///
    /// Any chunk already read is delivered first. Returns `None` when the
    /// throttle has no upstream or has already exited.
    pub async fn detach(&self) -> Option<Upstream> {
        let (tx, rx) = oneshot::channel();
        self.control.send(Control::Detach(tx)).ok()?;
        rx.await.ok().flatten()
    }

    /// Stop forwarding; a no-op if the task already exited
    pub fn end(&self) {
        let _ = self.control.send(Control::End);
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Wait for the task to exit
    pub async fn finished(&self) -> ThrottleExit {
        let mut done = self.done.clone();
        loop {
            if let Some(exit) = *done.borrow_and_update() {
                return exit;
            }
            if done.changed().await.is_err() {
                return ThrottleExit::Ended;
            }
        }
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("rate", &self.rate)
            .field("forwarded", &self.bytes_forwarded())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Chunk size for a rate: a tenth of a second of audio
fn chunk_size_for(rate: u64) -> usize {
    ((rate / 10) as usize).clamp(1, MAX_CHUNK_SIZE)
}

enum Event {
    Control(Option<Control>),
    Read(std::io::Result<usize>),
}

struct ThrottleTask {
    pacer: Pacer,
    chunk_size: usize,
    control: mpsc::UnboundedReceiver<Control>,
    feed: mpsc::Sender<Bytes>,
    forwarded: Arc<AtomicU64>,
}

impl ThrottleTask {
    async fn run(mut self) -> ThrottleExit {
        let mut upstream: Option<Upstream> = None;
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let event = match upstream.as_mut() {
                Some(reader) => {
                    // Commands win over reads so a detach never races a read
                    tokio::select! {
                        biased;
                        cmd = self.control.recv() => Event::Control(cmd),
                        read = reader.read(&mut buf) => Event::Read(read),
                    }
                }
                None => Event::Control(self.control.recv().await),
            };

            match event {
                Event::Control(Some(Control::Attach(reader))) => {
                    tracing::debug!(rate = self.pacer.rate, "Throttle upstream attached");
                    upstream = Some(reader);
                    self.pacer.reset();
                }
                Event::Control(Some(Control::Detach(reply))) => {
                    tracing::debug!("Throttle upstream detached");
                    let _ = reply.send(upstream.take());
                }
                Event::Control(Some(Control::End)) | Event::Control(None) => {
                    return ThrottleExit::Ended;
                }
                Event::Read(Ok(0)) => {
                    tracing::debug!(
                        forwarded = self.forwarded.load(Ordering::Relaxed),
                        "Throttle upstream finished"
                    );
                    return ThrottleExit::UpstreamFinished;
                }
                Event::Read(Ok(n)) => {
                    let chunk = Bytes::copy_from_slice(&buf[..n]);
                    if self.feed.send(chunk).await.is_err() {
                        return ThrottleExit::FeedClosed;
                    }
                    self.forwarded.fetch_add(n as u64, Ordering::Relaxed);
                    self.pacer.pace(n).await;
                }
                Event::Read(Err(e)) => {
                    tracing::warn!(error = %e, "Throttle upstream read failed");
                    return ThrottleExit::UpstreamFailed;
                }
            }
        }
    }
}

/// Sleeps so that the bytes released so far match the elapsed time
#[derive(Debug)]
struct Pacer {
    rate: u64,
    started: Instant,
    released: u64,
}

impl Pacer {
    fn new(rate: u64) -> Self {
        Self {
            rate,
            started: Instant::now(),
            released: 0,
        }
    }

    fn reset(&mut self) {
        self.started = Instant::now();
        self.released = 0;
    }

    /// Account for `n` released bytes and wait until they are due
    async fn pace(&mut self, n: usize) {
        self.released += n as u64;
        let due = self.started + Duration::from_secs_f64(self.released as f64 / self.rate as f64);
        let now = Instant::now();

        if now > due + MAX_LAG {
            // Upstream stalled; catching up would burst far above the rate
            self.reset();
            return;
        }

        tokio::time::sleep_until(due).await;
    }
}
