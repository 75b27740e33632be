//! Local copy of the remote player.

use skirmish_core::{BulletState, PlayerState, Snapshot};

/// What this side currently believes about the remote player.
///
/// Each applied snapshot replaces the previous one as a whole: the player
/// fields move together and the bullet list is swapped, never merged.
#[derive(Debug, Default)]
pub struct RemoteMirror {
    current: Option<Snapshot>,
    changes: u64,
}

impl RemoteMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `snapshot`. Returns `true` if it differs from what was shown.
    pub fn apply(&mut self, snapshot: Snapshot) -> bool {
        if self.current.as_ref() == Some(&snapshot) {
            return false;
        }
        self.current = Some(snapshot);
        self.changes += 1;
        true
    }

    /// `None` until the remote player has been seen.
    pub fn player(&self) -> Option<&PlayerState> {
        self.current.as_ref().map(|s| &s.player)
    }

    pub fn bullets(&self) -> &[BulletState] {
        self.current.as_ref().map(|s| s.bullets.as_slice()).unwrap_or(&[])
    }

    /// Number of distinct snapshots applied.
    pub fn changes(&self) -> u64 {
        self.changes
    }
}
