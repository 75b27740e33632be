//! Session mode selection and the per-tick exchange.
//!
//! A game tick talks to the transport exactly once, in a fixed order:
//! push the local snapshot, pull the freshest remote one, poll the
//! transport error. [`exchange`] performs that sequence and treats a
//! local session (no manager) as an exchange that never yields anything.

use std::fmt;

use crate::config::NetConfig;
use crate::error::NetError;
use crate::network::Manager;
use crate::snapshot::Snapshot;

// ── SessionMode ──────────────────────────────────────────────────

/// How this process takes part in a session.
///
/// Addresses may be empty, meaning "use the configured default".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Single machine, no networking.
    #[default]
    Local,
    /// Listen for the remote player.
    Host(String),
    /// Connect to a hosting player.
    Client(String),
}

impl SessionMode {
    pub fn is_networked(&self) -> bool {
        !matches!(self, SessionMode::Local)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Local => write!(f, "local"),
            SessionMode::Host(addr) if addr.is_empty() => write!(f, "host"),
            SessionMode::Host(addr) => write!(f, "host ({addr})"),
            SessionMode::Client(addr) if addr.is_empty() => write!(f, "client"),
            SessionMode::Client(addr) => write!(f, "client ({addr})"),
        }
    }
}

/// Open the network side of a session. `Local` yields no manager.
pub async fn start(mode: &SessionMode, config: &NetConfig) -> Result<Option<Manager>, NetError> {
    match mode {
        SessionMode::Local => Ok(None),
        SessionMode::Host(addr) => Manager::host_with(addr, config.clone()).await.map(Some),
        SessionMode::Client(addr) => Manager::join_with(addr, config.clone()).await.map(Some),
    }
}

// ── Tick exchange ────────────────────────────────────────────────

/// What one tick got back from the transport.
#[derive(Debug, Clone, Default)]
pub struct TickExchange {
    /// Freshest remote snapshot known so far.
    pub remote: Option<Snapshot>,
    /// Session-fatal transport fault, if one has been recorded.
    pub error: Option<NetError>,
}

/// Push `local`, pull the remote snapshot and poll for a fault.
pub fn exchange(net: Option<&Manager>, local: Snapshot) -> TickExchange {
    match net {
        Some(manager) => manager.exchange(local),
        None => TickExchange::default(),
    }
}
