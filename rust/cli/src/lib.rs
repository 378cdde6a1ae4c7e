//! # Twentyone CLI Library
//!
//! Command-line tools around the multiplayer 21 engine: deal a single
//! table for inspection, simulate many games with automated players, and
//! show the resolved configuration.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line arguments
//! and executes the appropriate subcommand.
//!
//! ## Available Subcommands
//!
//! - `deal`: Seat a table, deal it and print every hand
//! - `sim`: Play complete games with automated strategies and summarize the results
//! - `cfg`: Display current configuration settings
//!
//! ## Configuration
//!
//! Defaults can come from a TOML file named by `TWENTYONE_CLI_CONFIG`, then
//! from `TWENTYONE_SEED`, `TWENTYONE_PLAYERS` and `TWENTYONE_STRATEGY`.
//! Command-line flags override both.

use clap::Parser;
use std::io::Write;
pub mod cli;
mod commands;
pub mod config;
mod error;
pub mod ui;

use cli::{Commands, TwentyoneCli};
use commands::{SimOptions, handle_cfg_command, handle_deal_command, handle_sim_command};

pub use error::CliError;

const COMMANDS: &[&str] = &["deal", "sim", "cfg"];

/// Main entry point for the CLI application.
///
/// # Arguments
///
/// * `args` - Iterator over command-line arguments (typically `std::env::args()`)
/// * `out` - Output stream for normal output (typically `stdout`)
/// * `err` - Output stream for error messages (typically `stderr`)
///
/// # Returns
///
/// Exit code: `0` for success, `2` for errors
///
/// # Example
///
/// ```
/// use std::io;
/// let args = vec!["twentyone", "deal", "--seed", "42", "--players", "3"];
/// let code = twentyone_cli::run(args, &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let parsed = TwentyoneCli::try_parse_from(&argv);
    match parsed {
        Err(e) => {
            use clap::error::ErrorKind;

            // Help and version should print to stdout and exit 0
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return 2;
                    }
                    0
                }
                _ => {
                    if write_usage(err, &e).is_err() {
                        return 2;
                    }
                    2
                }
            }
        }
        Ok(cli) => match dispatch(cli.cmd, out, err) {
            Ok(()) => 0,
            Err(e) => {
                if writeln!(err, "Error: {}", e).is_err() {
                    return 2;
                }
                2
            }
        },
    }
}

fn write_usage(err: &mut dyn Write, e: &clap::Error) -> std::io::Result<()> {
    writeln!(err, "{}", e)?;
    writeln!(err)?;
    writeln!(err, "Twentyone CLI")?;
    writeln!(err, "Usage: twentyone <command> [options]\n")?;
    writeln!(err, "Commands:")?;
    for c in COMMANDS {
        writeln!(err, "  {}", c)?;
    }
    writeln!(err, "\nFor full help, run: twentyone --help")
}

fn dispatch(cmd: Commands, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    match cmd {
        Commands::Cfg => {
            let resolved = config::load_with_sources()?;
            handle_cfg_command(&resolved, out)
        }
        Commands::Deal { seed, players } => {
            let cfg = config::load()?;
            handle_deal_command(seed.or(cfg.seed), players.unwrap_or(cfg.players), out)
        }
        Commands::Sim {
            games,
            players,
            seed,
            strategy,
            stand_on,
            output,
        } => {
            let cfg = config::load()?;
            let opts = SimOptions {
                games: games.unwrap_or(cfg.games),
                players: players.unwrap_or(cfg.players),
                seed: seed.or(cfg.seed),
                strategy: strategy.unwrap_or(cfg.strategy),
                stand_on: stand_on.or(cfg.stand_on),
                output,
            };
            handle_sim_command(opts, out, err)
        }
    }
}
