//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use skirmish_core::SessionMode;

#[derive(Parser, Debug)]
#[command(name = "skirmish", about = "Headless two-player session runner")]
pub struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "skirmish.toml")]
    pub config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    pub gen_config: bool,

    /// Stop after this many ticks (0 runs until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    pub ticks: u64,

    #[command(subcommand)]
    pub mode: Option<ModeCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ModeCommand {
    /// Play without a remote peer.
    Local,
    /// Wait for the other player to join.
    Host {
        /// Listen address, e.g. `0.0.0.0:4000` or `:4000`.
        #[arg(long, default_value = "")]
        addr: String,
    },
    /// Connect to a hosting player.
    Join {
        /// Host address, e.g. `192.168.0.5:4000`.
        #[arg(long, default_value = "")]
        addr: String,
    },
}

impl Cli {
    /// The session mode, defaulting to local play.
    pub fn session_mode(&self) -> SessionMode {
        self.mode.clone().map(SessionMode::from).unwrap_or_default()
    }
}

impl From<ModeCommand> for SessionMode {
    fn from(mode: ModeCommand) -> Self {
        match mode {
            ModeCommand::Local => SessionMode::Local,
            ModeCommand::Host { addr } => SessionMode::Host(addr),
            ModeCommand::Join { addr } => SessionMode::Client(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_is_local() {
        let cli = Cli::try_parse_from(["skirmish"]).unwrap();
        assert_eq!(cli.session_mode(), SessionMode::Local);
        assert_eq!(cli.ticks, 0);
    }

    #[test]
    fn host_with_address() {
        let cli = Cli::try_parse_from(["skirmish", "host", "--addr", "0.0.0.0:5000"]).unwrap();
        assert_eq!(cli.session_mode(), SessionMode::Host("0.0.0.0:5000".into()));
    }

    #[test]
    fn join_without_address_uses_default() {
        let cli = Cli::try_parse_from(["skirmish", "--ticks", "10", "join"]).unwrap();
        assert_eq!(cli.session_mode(), SessionMode::Client(String::new()));
        assert_eq!(cli.ticks, 10);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["skirmish", "spectate"]).is_err());
    }
}
