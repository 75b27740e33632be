//! # skirmish: headless session runner
//!
//! Drives one side of a two-player session at a fixed tick rate without a
//! window: a scripted local player is pushed to the peer every tick and the
//! remote player's latest snapshot is mirrored locally.
//!
//! ## Modes
//!
//! - **local**: no networking; the tick loop runs on its own.
//! - **host**: listen for the remote player.
//! - **join**: connect to a hosting player.

pub mod cli;
pub mod config;
pub mod mirror;
pub mod puppet;
pub mod runner;
