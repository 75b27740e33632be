pub mod manager;
pub mod peer;

pub use manager::Manager;
pub use peer::{Peer, PeerStats};
