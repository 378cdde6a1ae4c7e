//! Command-line argument definitions.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "twentyone",
    version,
    about = "Twentyone CLI: deal and simulate multiplayer 21 sessions"
)]
pub struct TwentyoneCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start one session and show the dealt hands
    Deal {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        players: Option<usize>,
    },
    /// Play complete sessions with automated players
    Sim {
        #[arg(long)]
        games: Option<u64>,
        #[arg(long)]
        players: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long = "stand-on")]
        stand_on: Option<i32>,
        /// Write one JSON line per game to this file
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the resolved configuration and where each value came from
    Cfg,
}
