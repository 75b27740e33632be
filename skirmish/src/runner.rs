//! Fixed-rate session loop.
//!
//! Each tick advances the scripted local player, then talks to the
//! transport in the order the session contract requires: push the local
//! snapshot, pull the remote one, poll for a fault. A polled fault ends
//! the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use skirmish_core::session::{self, SessionMode};
use skirmish_core::{Manager, NetError, PeerStats};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::SkirmishConfig;
use crate::mirror::RemoteMirror;
use crate::puppet::Puppet;

/// How a finished session went.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub remote_changes: u64,
    pub stats: Option<PeerStats>,
}

// ── SessionRunner ────────────────────────────────────────────────

pub struct SessionRunner {
    mode: SessionMode,
    config: SkirmishConfig,
    running: Arc<AtomicBool>,
}

impl SessionRunner {
    pub fn new(mode: SessionMode, config: SkirmishConfig) -> Self {
        Self {
            mode,
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle that stops the loop from another task (Ctrl-C handler).
    /// Storing `false` before [`run`](Self::run) starts makes it return
    /// without ticking.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run until stopped, until `max_ticks` ticks have passed (0 = no
    /// limit), or until the transport reports a fault.
    pub async fn run(&self, max_ticks: u64) -> Result<RunSummary, NetError> {
        let net = session::start(&self.mode, &self.config.network).await?;
        info!("session started in {} mode", self.mode);

        let result = self.tick_loop(net.as_ref(), max_ticks).await;

        if let Some(net) = &net {
            if let Err(e) = net.close().await {
                error!("error while closing session: {e}");
            }
        }
        self.running.store(false, Ordering::SeqCst);

        let summary = result?;
        info!(
            "session ended after {} ticks ({} remote updates)",
            summary.ticks, summary.remote_changes
        );
        Ok(summary)
    }

    async fn tick_loop(&self, net: Option<&Manager>, max_ticks: u64) -> Result<RunSummary, NetError> {
        let mut interval = tokio::time::interval(self.config.session.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let hosting = matches!(self.mode, SessionMode::Host(_));
        let mut puppet = Puppet::for_side(hosting);
        let mut mirror = RemoteMirror::new();
        let mut connected = false;

        while self.running.load(Ordering::SeqCst) {
            if max_ticks > 0 && puppet.tick() >= max_ticks {
                break;
            }
            interval.tick().await;
            puppet.step();

            let tick = session::exchange(net, puppet.snapshot());
            if let Some(remote) = tick.remote {
                if !connected {
                    info!("remote player is in the arena");
                    connected = true;
                }
                mirror.apply(remote);
            }
            if let Some(err) = tick.error {
                if err.is_stream_ended() {
                    info!("remote player left");
                } else {
                    error!("transport failure: {err}");
                }
                return Err(err);
            }

            if puppet.tick() % u64::from(self.config.session.tick_rate.max(1)) == 0 {
                debug!(
                    "tick {}: remote at {:?}, {} remote bullets",
                    puppet.tick(),
                    mirror.player().map(|p| (p.x, p.y)),
                    mirror.bullets().len()
                );
            }
        }

        Ok(RunSummary {
            ticks: puppet.tick(),
            remote_changes: mirror.changes(),
            stats: net.and_then(Manager::stats),
        })
    }
}
