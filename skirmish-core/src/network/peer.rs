//! One established connection and the two pipelines that drive it.
//!
//! ```text
//!  send() ──► SendQueue ──► writer task ──► FramedWrite ──► wire
//!  wire ──► FramedRead ──► reader task ──► latest slot ──► latest_snapshot()
//! ```
//!
//! The first fault either task sees is parked as the peer's sticky error
//! and closes the peer. Closing cancels a shared token; both tasks stop,
//! the write half is shut down and both halves are dropped.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::codec::SnapshotCodec;
use crate::config::NetConfig;
use crate::error::NetError;
use crate::queue::SendQueue;
use crate::snapshot::Snapshot;

// ── PeerStats ────────────────────────────────────────────────────

/// Traffic counters for one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerStats {
    /// Snapshots written to the wire.
    pub sent: u64,
    /// Snapshots decoded from the wire.
    pub received: u64,
    /// Snapshots evicted from the send queue before transmission.
    pub dropped: u64,
}

// ── Shared state ─────────────────────────────────────────────────

struct Shared {
    queue: SendQueue,
    latest: RwLock<Option<Snapshot>>,
    error: OnceLock<NetError>,
    closed: AtomicBool,
    shutdown: CancellationToken,
    sent: AtomicU64,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn new(queue_capacity: usize) -> Self {
        Self {
            queue: SendQueue::new(queue_capacity),
            latest: RwLock::new(None),
            error: OnceLock::new(),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn mark_closed(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Flip the closed flag. Only the winning caller cancels the pipelines.
    fn begin_close(&self) -> bool {
        let won = self.mark_closed();
        if won {
            self.shutdown.cancel();
        }
        won
    }

    /// Close because of `err`. The fault is parked only if it is what
    /// closed the peer; anything seen after closure is dropped.
    fn fail(&self, err: NetError) {
        if !self.mark_closed() {
            return;
        }
        if err.is_stream_ended() {
            debug!("remote peer ended the stream");
        } else {
            warn!("peer transport failed: {err}");
        }
        let _ = self.error.set(err);
        self.shutdown.cancel();
    }

    fn store_latest(&self, snapshot: Snapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        self.received.fetch_add(1, Ordering::Relaxed);
    }
}

struct Pipelines {
    reader: JoinHandle<()>,
    writer: JoinHandle<io::Result<()>>,
}

// ── Peer ─────────────────────────────────────────────────────────

/// The live transport endpoint for one established connection.
///
/// Must be created inside a Tokio runtime. Every method except
/// [`close`](Self::close) and [`closed`](Self::closed) is a non-blocking
/// cache read or queue push.
pub struct Peer {
    shared: Arc<Shared>,
    tasks: Mutex<Option<Pipelines>>,
}

impl Peer {
    /// Take ownership of `stream` and start the reader and writer tasks.
    pub fn spawn<S>(stream: S, config: &NetConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let codec = SnapshotCodec::with_max_frame_len(config.max_frame_len);
        let shared = Arc::new(Shared::new(config.send_queue_capacity));

        let reader = tokio::spawn(read_loop(
            Arc::clone(&shared),
            FramedRead::new(read_half, codec.clone()),
        ));
        let writer = tokio::spawn(write_loop(
            Arc::clone(&shared),
            FramedWrite::new(write_half, codec),
        ));

        Self {
            shared,
            tasks: Mutex::new(Some(Pipelines { reader, writer })),
        }
    }

    /// Queue `snapshot` for transmission without blocking.
    ///
    /// A full queue drops its oldest entry to make room. On a closed peer
    /// the snapshot is discarded and the sticky error, if any, is returned.
    pub fn send(&self, snapshot: Snapshot) -> Result<(), NetError> {
        if self.shared.is_closed() {
            return match self.error() {
                Some(err) => Err(err),
                None => Ok(()),
            };
        }
        if self.shared.queue.push(snapshot).is_some() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            trace!("send queue full; dropped oldest pending snapshot");
        }
        Ok(())
    }

    /// The most recently decoded remote snapshot, or `None` if nothing
    /// has arrived yet. Survives closure.
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.shared
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The first fault recorded for this peer.
    pub fn error(&self) -> Option<NetError> {
        self.shared.error.get().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn stats(&self) -> PeerStats {
        PeerStats {
            sent: self.shared.sent.load(Ordering::Relaxed),
            received: self.shared.received.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    /// Resolves once the peer has been closed for any reason.
    pub async fn closed(&self) {
        self.shared.shutdown.cancelled().await
    }

    /// Stop both pipelines and release the connection.
    ///
    /// Only the first call tears down; later calls return
    /// [`NetError::AlreadyClosed`]. Waits for the tasks to unwind, which
    /// never depends on in-flight I/O completing.
    pub async fn close(&self) -> Result<(), NetError> {
        let requested = self.shared.begin_close();
        let tasks = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Pipelines { reader, writer }) = tasks else {
            return Err(NetError::AlreadyClosed);
        };

        reader.await?;
        match writer.await? {
            Err(e) if requested => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.shared.begin_close();
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("closed", &self.is_closed())
            .field("error", &self.shared.error.get())
            .field("stats", &self.stats())
            .finish()
    }
}

// ── Pipelines ────────────────────────────────────────────────────

async fn read_loop<R>(shared: Arc<Shared>, mut frames: FramedRead<R, SnapshotCodec>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = shared.shutdown.cancelled() => break,
            next = frames.next() => next,
        };
        match next {
            Some(Ok(snapshot)) => shared.store_latest(snapshot),
            Some(Err(e)) => {
                shared.fail(e);
                break;
            }
            None => {
                shared.fail(NetError::StreamEnded);
                break;
            }
        }
    }
    trace!("reader stopped");
}

async fn write_loop<W>(shared: Arc<Shared>, mut frames: FramedWrite<W, SnapshotCodec>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let snapshot = match shared.queue.pop() {
            Some(snapshot) => snapshot,
            None => {
                let woken = tokio::select! {
                    biased;
                    _ = shared.shutdown.cancelled() => false,
                    _ = shared.queue.ready() => true,
                };
                if !woken {
                    break;
                }
                continue;
            }
        };

        let written = tokio::select! {
            biased;
            _ = shared.shutdown.cancelled() => break,
            written = frames.send(snapshot) => written,
        };
        match written {
            Ok(()) => {
                shared.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                shared.fail(e);
                break;
            }
        }
    }
    trace!("writer stopped");
    frames.into_inner().shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_pipe() -> NetError {
        io::Error::from(io::ErrorKind::BrokenPipe).into()
    }

    #[test]
    fn fault_after_close_is_not_recorded() {
        let shared = Shared::new(4);
        assert!(shared.begin_close());
        shared.fail(broken_pipe());

        assert!(shared.error.get().is_none());
        assert!(shared.is_closed());
        assert!(shared.shutdown.is_cancelled());
    }

    #[test]
    fn first_fault_closes_and_sticks() {
        let shared = Shared::new(4);
        shared.fail(NetError::StreamEnded);
        shared.fail(broken_pipe());

        assert!(shared.error.get().is_some_and(NetError::is_stream_ended));
        assert!(shared.shutdown.is_cancelled());
        assert!(!shared.begin_close());
    }
}
