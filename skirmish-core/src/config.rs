//! Transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_MAX_FRAME_LEN;
use crate::queue::DEFAULT_SEND_QUEUE_CAPACITY;

/// Address `host` listens on when none is given.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4000";

/// Address `join` dials when none is given.
pub const DEFAULT_DIAL_ADDR: &str = "127.0.0.1:4000";

/// Upper bound on the `join` dial.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by both ends of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Listen address used by `host` when the override is empty.
    pub listen_addr: String,
    /// Remote address used by `join` when the override is empty.
    pub dial_addr: String,
    /// Dial timeout in milliseconds.
    pub dial_timeout_ms: u64,
    /// Snapshots buffered for the writer before the oldest is dropped.
    pub send_queue_capacity: usize,
    /// Largest number of bytes a single inbound record may occupy.
    pub max_frame_len: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            dial_addr: DEFAULT_DIAL_ADDR.into(),
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT.as_millis() as u64,
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl NetConfig {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    /// `address` when non-blank, otherwise the configured listen address.
    /// A bare `:port` listens on every interface.
    pub fn resolve_listen_addr(&self, address: &str) -> String {
        let addr = pick(address, &self.listen_addr, DEFAULT_LISTEN_ADDR);
        match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => addr,
        }
    }

    /// `address` when non-blank, otherwise the configured dial address.
    pub fn resolve_dial_addr(&self, address: &str) -> String {
        pick(address, &self.dial_addr, DEFAULT_DIAL_ADDR)
    }
}

fn pick(address: &str, configured: &str, fallback: &str) -> String {
    [address, configured]
        .into_iter()
        .map(str::trim)
        .find(|a| !a.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NetConfig::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:4000");
        assert_eq!(cfg.dial_addr, "127.0.0.1:4000");
        assert_eq!(cfg.dial_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.send_queue_capacity, 8);
    }

    #[test]
    fn explicit_address_wins() {
        let cfg = NetConfig::default();
        assert_eq!(cfg.resolve_listen_addr("127.0.0.1:0"), "127.0.0.1:0");
        assert_eq!(cfg.resolve_dial_addr(" 10.0.0.2:4000 "), "10.0.0.2:4000");
    }

    #[test]
    fn bare_port_listens_everywhere() {
        let cfg = NetConfig::default();
        assert_eq!(cfg.resolve_listen_addr(":4100"), "0.0.0.0:4100");
    }

    #[test]
    fn blank_address_falls_back() {
        let mut cfg = NetConfig::default();
        assert_eq!(cfg.resolve_listen_addr(""), DEFAULT_LISTEN_ADDR);
        cfg.dial_addr = "  ".into();
        assert_eq!(cfg.resolve_dial_addr(""), DEFAULT_DIAL_ADDR);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: NetConfig = toml::from_str("send_queue_capacity = 2\n").unwrap();
        assert_eq!(cfg.send_queue_capacity, 2);
        assert_eq!(cfg.dial_timeout_ms, 5000);
        assert_eq!(cfg.listen_addr, DEFAULT_LISTEN_ADDR);
    }
}
