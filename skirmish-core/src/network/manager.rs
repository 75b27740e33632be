//! Session-facing facade over at most one [`Peer`].
//!
//! A `Manager` comes from either end of the handshake:
//!
//! - [`Manager::host`] binds a listener and returns immediately. A single
//!   background accept attempt binds the first inbound connection as the
//!   peer; the listener is released right after that attempt.
//! - [`Manager::join`] dials the host (bounded by the dial timeout) and
//!   returns with the peer already running.
//!
//! Once bound, the peer is never replaced. A closed manager stays closed.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::NetConfig;
use crate::error::NetError;
use crate::network::peer::{Peer, PeerStats};
use crate::session::TickExchange;
use crate::snapshot::Snapshot;

// ── Slots ────────────────────────────────────────────────────────

/// The single pending accept attempt. The task owns the listening socket
/// and drops it as soon as it finishes.
struct PendingAccept {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl PendingAccept {
    async fn close(self) -> Result<(), NetError> {
        self.stop.cancel();
        self.task.await?;
        Ok(())
    }
}

#[derive(Default)]
struct Slots {
    listener: Option<PendingAccept>,
    peer: Option<Arc<Peer>>,
    closed: bool,
}

struct Inner {
    slots: RwLock<Slots>,
    error: OnceLock<NetError>,
    /// Outcome of the one teardown every `close` call waits on.
    teardown: OnceCell<Result<(), NetError>>,
    config: NetConfig,
    local_addr: Option<SocketAddr>,
}

impl Inner {
    fn new(config: NetConfig, local_addr: Option<SocketAddr>) -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            error: OnceLock::new(),
            teardown: OnceCell::new(),
            config,
            local_addr,
        }
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn peer(&self) -> Option<Arc<Peer>> {
        self.read_slots().peer.clone()
    }

    /// Bind `stream` as the peer unless one is already bound or the
    /// manager has closed, in which case the connection is dropped unused.
    fn bind(&self, stream: TcpStream, remote: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle for {remote}: {e}");
        }
        let mut slots = self.write_slots();
        if slots.closed || slots.peer.is_some() {
            debug!("closing surplus connection from {remote}");
            return;
        }
        slots.peer = Some(Arc::new(Peer::spawn(stream, &self.config)));
        slots.listener = None;
        info!("peer connected from {remote}");
    }

    /// Act on the result of the single accept attempt.
    fn finish_accept(&self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        match accepted {
            Ok((stream, remote)) => self.bind(stream, remote),
            Err(e) => {
                warn!("accept failed: {e}");
                let _ = self.error.set(NetError::Accept(Arc::new(e)));
                self.write_slots().listener = None;
            }
        }
    }

    /// Mark the manager closed, then stop the accept attempt and the peer.
    async fn shut_down(&self) -> Result<(), NetError> {
        let (pending, peer) = {
            let mut slots = self.write_slots();
            slots.closed = true;
            (slots.listener.take(), slots.peer.clone())
        };

        let mut first = None;
        if let Some(pending) = pending {
            keep_first(&mut first, pending.close().await);
        }
        if let Some(peer) = peer {
            keep_first(&mut first, peer.close().await);
        }
        debug!("session closed");
        first.map_or(Ok(()), Err)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slots.listener.take() {
            pending.stop.cancel();
        }
    }
}

async fn accept_once(manager: Weak<Inner>, listener: TcpListener, stop: CancellationToken) {
    let accepted = tokio::select! {
        biased;
        _ = stop.cancelled() => {
            debug!("listener closed before a peer connected");
            return;
        }
        accepted = listener.accept() => accepted,
    };
    drop(listener);

    let Some(inner) = manager.upgrade() else {
        debug!("manager dropped while accepting; discarding connection");
        return;
    };
    inner.finish_accept(accepted);
}

// ── Manager ──────────────────────────────────────────────────────

/// Handle a game session holds to talk to its remote peer.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

impl Manager {
    /// Listen on `address` (or the default listen address when blank).
    pub async fn host(address: &str) -> Result<Self, NetError> {
        Self::host_with(address, NetConfig::default()).await
    }

    pub async fn host_with(address: &str, config: NetConfig) -> Result<Self, NetError> {
        let addr = config.resolve_listen_addr(address);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| NetError::listen(&addr, e))?;
        let local_addr = listener.local_addr().ok();
        info!("hosting on {}", local_addr.map_or(addr, |a| a.to_string()));

        let inner = Arc::new(Inner::new(config, local_addr));
        {
            // Held across the spawn so the accept task cannot bind a peer
            // before the listener slot is filled.
            let mut slots = inner.write_slots();
            let stop = CancellationToken::new();
            let task = tokio::spawn(accept_once(Arc::downgrade(&inner), listener, stop.clone()));
            slots.listener = Some(PendingAccept { stop, task });
        }
        Ok(Self { inner })
    }

    /// Dial `address` (or the default dial address when blank).
    pub async fn join(address: &str) -> Result<Self, NetError> {
        Self::join_with(address, NetConfig::default()).await
    }

    pub async fn join_with(address: &str, config: NetConfig) -> Result<Self, NetError> {
        let addr = config.resolve_dial_addr(address);
        let timeout = config.dial_timeout();
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(NetError::dial(addr, e)),
            Err(_) => {
                let e = io::Error::new(io::ErrorKind::TimedOut, format!("no answer within {timeout:?}"));
                return Err(NetError::dial(addr, e));
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle for {addr}: {e}");
        }
        info!("connected to {addr}");

        let inner = Arc::new(Inner::new(config, None));
        inner.write_slots().peer = Some(Arc::new(Peer::spawn(stream, &inner.config)));
        Ok(Self { inner })
    }

    /// Queue a local snapshot for the remote peer. A no-op while no peer
    /// is bound.
    pub fn send(&self, snapshot: Snapshot) -> Result<(), NetError> {
        match self.inner.peer() {
            Some(peer) => peer.send(snapshot),
            None => Ok(()),
        }
    }

    /// The freshest remote snapshot, if any has arrived.
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.inner.peer().and_then(|peer| peer.latest_snapshot())
    }

    /// The manager's own sticky error, else the bound peer's.
    pub fn err(&self) -> Option<NetError> {
        self.inner
            .error
            .get()
            .cloned()
            .or_else(|| self.inner.peer().and_then(|peer| peer.error()))
    }

    /// Run one tick of the session contract: push `local`, pull the
    /// latest remote snapshot, poll the transport error.
    pub fn exchange(&self, local: Snapshot) -> TickExchange {
        let sent = self.send(local);
        let remote = self.latest_snapshot();
        let error = self.err().or(sent.err());
        TickExchange { remote, error }
    }

    /// Tear the session down. Only the first call does any work and gets
    /// the first non-benign fault met along the way; concurrent and later
    /// calls wait for that teardown to finish and return `Ok(())`.
    pub async fn close(&self) -> Result<(), NetError> {
        let mut tore_down = false;
        let outcome = self
            .inner
            .teardown
            .get_or_init(|| {
                tore_down = true;
                self.inner.shut_down()
            })
            .await;
        if tore_down { outcome.clone() } else { Ok(()) }
    }

    /// Address the host is listening on. `None` for joined sessions.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr
    }

    /// Whether a peer is bound and still open.
    pub fn is_connected(&self) -> bool {
        self.inner.peer().is_some_and(|peer| !peer.is_closed())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read_slots().closed
    }

    pub fn stats(&self) -> Option<PeerStats> {
        self.inner.peer().map(|peer| peer.stats())
    }

    pub fn config(&self) -> &NetConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.inner.read_slots();
        f.debug_struct("Manager")
            .field("local_addr", &self.inner.local_addr)
            .field("listening", &slots.listener.is_some())
            .field("peer", &slots.peer)
            .field("closed", &slots.closed)
            .finish()
    }
}

fn keep_first(first: &mut Option<NetError>, result: Result<(), NetError>) {
    if let Err(e) = result {
        if e.is_benign() {
            debug!("ignoring benign close error: {e}");
        } else if first.is_none() {
            *first = Some(e);
        }
    }
}
