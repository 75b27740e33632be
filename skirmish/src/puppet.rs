//! Scripted local player.
//!
//! Stands in for keyboard-driven play in a headless session: walks back
//! and forth across the arena and fires at a fixed cadence, so the peer
//! always has moving state and a changing bullet list to mirror.

use skirmish_core::{BulletState, PlayerState, Snapshot};

const ARENA_LEFT: f64 = 0.0;
const ARENA_RIGHT: f64 = 800.0;
const GROUND_Y: f64 = 540.0;
const WALK_SPEED: f64 = 3.0;
const BULLET_SPEED: f64 = 10.0;
const FIRE_EVERY: u64 = 30;

pub struct Puppet {
    player: PlayerState,
    bullets: Vec<BulletState>,
    tick: u64,
}

impl Puppet {
    /// A puppet standing at `x`, walking towards the arena centre.
    pub fn new(x: f64) -> Self {
        let x = x.clamp(ARENA_LEFT, ARENA_RIGHT);
        let facing_right = x < (ARENA_LEFT + ARENA_RIGHT) / 2.0;
        Self {
            player: PlayerState {
                x,
                y: GROUND_Y,
                vx: if facing_right { WALK_SPEED } else { -WALK_SPEED },
                vy: 0.0,
                on_ground: true,
                facing_right,
            },
            bullets: Vec::new(),
            tick: 0,
        }
    }

    /// Host spawns on the left, client on the right.
    pub fn for_side(hosting: bool) -> Self {
        if hosting {
            Self::new(ARENA_LEFT + 100.0)
        } else {
            Self::new(ARENA_RIGHT - 100.0)
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one simulation tick.
    pub fn step(&mut self) {
        self.tick += 1;

        let p = &mut self.player;
        p.x += p.vx;
        if p.x <= ARENA_LEFT || p.x >= ARENA_RIGHT {
            p.x = p.x.clamp(ARENA_LEFT, ARENA_RIGHT);
            p.vx = -p.vx;
            p.facing_right = p.vx > 0.0;
        }

        for bullet in &mut self.bullets {
            bullet.x += bullet.vx;
        }
        self.bullets
            .retain(|b| (ARENA_LEFT..=ARENA_RIGHT).contains(&b.x));

        if self.tick % FIRE_EVERY == 0 {
            let dir = if p.facing_right { 1.0 } else { -1.0 };
            self.bullets.push(BulletState {
                x: p.x,
                y: p.y - 20.0,
                vx: dir * BULLET_SPEED,
            });
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.player, self.bullets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_towards_centre() {
        let mut left = Puppet::for_side(true);
        let start = left.snapshot().player.x;
        left.step();
        assert!(left.snapshot().player.x > start);

        let mut right = Puppet::for_side(false);
        let start = right.snapshot().player.x;
        right.step();
        assert!(right.snapshot().player.x < start);
    }

    #[test]
    fn turns_around_at_the_wall() {
        let mut puppet = Puppet::new(ARENA_RIGHT - 1.0);
        puppet.player.vx = WALK_SPEED;
        puppet.player.facing_right = true;
        puppet.step();
        let player = puppet.snapshot().player;
        assert_eq!(player.x, ARENA_RIGHT);
        assert!(player.vx < 0.0);
        assert!(!player.facing_right);
    }

    #[test]
    fn fires_on_cadence_and_bullets_expire() {
        let mut puppet = Puppet::for_side(true);
        for _ in 0..FIRE_EVERY {
            puppet.step();
        }
        let snapshot = puppet.snapshot();
        assert_eq!(snapshot.bullets.len(), 1);
        assert!(snapshot.bullets[0].vx > 0.0);

        // A bullet crosses the whole arena well before 200 ticks pass.
        let first = snapshot.bullets[0];
        for _ in 0..200 {
            puppet.step();
        }
        assert!(!puppet.snapshot().bullets.contains(&first));
        assert_eq!(puppet.tick(), FIRE_EVERY + 200);
    }
}
