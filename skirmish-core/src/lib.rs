//! # skirmish-core
//!
//! Peer-to-peer state transport for a two-player real-time game.
//!
//! This crate contains:
//! - **Snapshot model**: `Snapshot`, `PlayerState`, `BulletState`
//! - **Codec**: `SnapshotCodec`, self-delimiting JSON records via `tokio_util`
//! - **Queue**: `SendQueue`, bounded drop-oldest outbound buffer
//! - **Network**: `Peer` (reader/writer pipelines) and `Manager` (host/join facade)
//! - **Session**: `SessionMode` and the per-tick `exchange`
//! - **Config**: `NetConfig`
//! - **Error**: `NetError`, typed `thiserror`-based errors
//!
//! Nothing the game loop calls per tick blocks: `send` pushes into a bounded
//! queue, `latest_snapshot` and `err` are cache reads. Faults are parked as
//! sticky errors and polled.

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod queue;
pub mod session;
pub mod snapshot;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{DEFAULT_MAX_FRAME_LEN, SnapshotCodec};
pub use config::{DEFAULT_DIAL_ADDR, DEFAULT_DIAL_TIMEOUT, DEFAULT_LISTEN_ADDR, NetConfig};
pub use error::NetError;
pub use network::{Manager, Peer, PeerStats};
pub use queue::{DEFAULT_SEND_QUEUE_CAPACITY, SendQueue};
pub use session::{SessionMode, TickExchange};
pub use snapshot::{BulletState, PlayerState, Snapshot};
