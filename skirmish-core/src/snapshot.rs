//! Wire-transmissible player state.
//!
//! A [`Snapshot`] is one player's kinematic state plus every projectile
//! they own at the instant it was captured. Bullets carry no identity,
//! so a receiver treats each snapshot's bullet list as a full
//! replacement of the previous one.
//!
//! Field names on the wire are the capitalised names used by the other
//! implementation of this protocol, so both can talk to each other.

use serde::{Deserialize, Deserializer, Serialize};

// ── PlayerState ──────────────────────────────────────────────────

/// Kinematic state of one player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "VelocityX")]
    pub vx: f64,
    #[serde(rename = "VelocityY")]
    pub vy: f64,
    #[serde(rename = "OnGround")]
    pub on_ground: bool,
    #[serde(rename = "FacingRight")]
    pub facing_right: bool,
}

impl PlayerState {
    fn is_finite(&self) -> bool {
        [self.x, self.y, self.vx, self.vy].iter().all(|v| v.is_finite())
    }
}

// ── BulletState ──────────────────────────────────────────────────

/// One live projectile. Bullets only travel horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletState {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "VelocityX")]
    pub vx: f64,
}

impl BulletState {
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite()
    }
}

// ── Snapshot ─────────────────────────────────────────────────────

/// One player plus their live bullets, in the sender's order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(rename = "Player")]
    pub player: PlayerState,
    #[serde(rename = "Bullets", deserialize_with = "null_as_empty")]
    pub bullets: Vec<BulletState>,
}

impl Snapshot {
    pub fn new(player: PlayerState, bullets: Vec<BulletState>) -> Self {
        Self { player, bullets }
    }

    /// Whether every float is representable on the wire.
    pub fn is_finite(&self) -> bool {
        self.player.is_finite() && self.bullets.iter().all(BulletState::is_finite)
    }
}

/// A nil bullet slice is encoded as `null` by the other implementation.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<BulletState>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<BulletState>>::deserialize(deserializer)?.unwrap_or_default())
}
