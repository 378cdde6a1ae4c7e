//! Simulation command handler.
//!
//! Plays complete sessions where every seat is driven by the same automated
//! strategy, then reports how the games ended. Game `i` (zero-based) uses
//! seed `base_seed + i`, so a run is reproducible from its base seed.
//!
//! # Examples
//!
//! ```no_run
//! use std::io;
//! let args = vec!["twentyone", "sim", "--games", "500", "--players", "5", "--seed", "42"];
//! let code = twentyone_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```

use crate::commands::deal::seated_session;
use crate::error::CliError;
use crate::ui;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use twentyone_ai::{Decision, Strategy, create_strategy_with_threshold};
use twentyone_engine::engine::BlackjackOutcome;
use twentyone_engine::errors::GameError;
use twentyone_engine::hand::{Hand, PlayerId};
use twentyone_engine::session::{EndReason, LifecycleState, Session};

/// Fully resolved `sim` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOptions {
    pub games: u64,
    pub players: usize,
    pub seed: Option<u64>,
    pub strategy: String,
    pub stand_on: Option<i32>,
    pub output: Option<String>,
}

/// One line of `--output`.
#[derive(Debug, Clone, Serialize)]
struct GameRecord {
    game: u64,
    seed: u64,
    players: usize,
    strategy: String,
    winner: Option<PlayerId>,
    end_reason: Option<EndReason>,
    totals: Vec<i32>,
    busts: usize,
    blackjack: bool,
}

#[derive(Debug, Default)]
struct SimSummary {
    games: u64,
    wins: Vec<u64>,
    no_winner: u64,
    busts: u64,
    blackjacks: u64,
}

impl SimSummary {
    fn new(players: usize) -> Self {
        Self {
            wins: vec![0; players],
            ..Default::default()
        }
    }

    fn record(&mut self, game: &GameRecord) {
        self.games += 1;
        self.busts += game.busts as u64;
        if game.blackjack {
            self.blackjacks += 1;
        }
        match game.winner {
            Some(winner) => {
                // seats are numbered from 1
                if let Some(slot) = self.wins.get_mut(winner as usize - 1) {
                    *slot += 1;
                }
            }
            None => self.no_winner += 1,
        }
    }
}

/// Handle the sim command.
///
/// # Errors
///
/// `CliError::Config` for an out-of-range player count or zero games,
/// `CliError::InvalidInput` for an unknown strategy, `CliError::Io` when the
/// output file cannot be written.
pub fn handle_sim_command(
    opts: SimOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.games == 0 {
        ui::write_error(err, "games must be >= 1")?;
        return Err(CliError::InvalidInput("games must be >= 1".to_string()));
    }
    crate::config::validate_players(opts.players)?;
    let strategy = create_strategy_with_threshold(&opts.strategy, opts.stand_on)?;
    if opts.stand_on.is_some() && !opts.strategy.trim().eq_ignore_ascii_case("baseline") {
        ui::display_warning(
            err,
            &format!("--stand-on is ignored by the {} strategy", opts.strategy.trim()),
        )?;
    }

    let base_seed = opts.seed.unwrap_or_else(rand::random);
    let mut sink = match opts.output.as_deref() {
        Some(path) => Some(open_output(Path::new(path), err)?),
        None => None,
    };

    let mut summary = SimSummary::new(opts.players);
    for index in 0..opts.games {
        let seed = base_seed.wrapping_add(index);
        let record = play_game(index, seed, opts.players, strategy.as_ref())?;
        summary.record(&record);
        if let Some(writer) = sink.as_mut() {
            let line = serde_json::to_string(&record).map_err(std::io::Error::other)?;
            writeln!(writer, "{}", line)?;
        }
    }
    if let Some(mut writer) = sink {
        writer.flush()?;
    }

    write_summary(out, &summary, &opts, strategy.name(), base_seed)?;
    Ok(())
}

fn open_output(path: &Path, err: &mut dyn Write) -> Result<BufWriter<File>, CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    match File::create(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) => {
            ui::write_error(err, &format!("Failed to open output file: {}", e))?;
            Err(CliError::Io(e))
        }
    }
}

/// Deal one session and let `strategy` play every seat to the end.
fn play_game(
    index: u64,
    seed: u64,
    players: usize,
    strategy: &dyn Strategy,
) -> Result<GameRecord, CliError> {
    let mut session = seated_session(format!("sim-{}", index + 1), players, seed)?;

    // a dealt 21 is claimed before anyone acts
    let mut blackjack = false;
    for player in session.player_ids() {
        if session.hand(player).is_some_and(Hand::is_blackjack)
            && let BlackjackOutcome::Win { .. } = session.blackjack_check(player)?
        {
            blackjack = true;
            break;
        }
    }

    while session.state() == LifecycleState::Active {
        let player = session.current_player().ok_or_else(|| {
            GameError::InvariantViolation("active session has no current player".into())
        })?;
        let decision = match session.hand(player) {
            Some(hand) => strategy.decide(hand),
            None => return Err(GameError::NotInSession(player).into()),
        };
        match decision {
            Decision::Hit => {
                session.hit(player)?;
            }
            Decision::Stand => {
                session.end_turn(player)?;
            }
        }
    }

    Ok(game_record(index, seed, &session, strategy.name(), blackjack))
}

fn game_record(
    index: u64,
    seed: u64,
    session: &Session,
    strategy: &str,
    blackjack: bool,
) -> GameRecord {
    GameRecord {
        game: index + 1,
        seed,
        players: session.player_count(),
        strategy: strategy.to_string(),
        winner: session.winner(),
        end_reason: session.end_reason(),
        totals: session.hands().iter().map(Hand::total_value).collect(),
        busts: session.hands().iter().filter(|h| h.is_busted()).count(),
        blackjack,
    }
}

fn write_summary(
    out: &mut dyn Write,
    summary: &SimSummary,
    opts: &SimOptions,
    strategy: &str,
    base_seed: u64,
) -> std::io::Result<()> {
    writeln!(
        out,
        "Games: {} (players {}, strategy {}, seed {})",
        summary.games, opts.players, strategy, base_seed
    )?;
    writeln!(out, "Wins by seat:")?;
    for (seat, wins) in summary.wins.iter().enumerate() {
        let pct = *wins as f64 * 100.0 / summary.games as f64;
        writeln!(out, "  Player {}: {} ({:.1}%)", seat + 1, wins, pct)?;
    }
    writeln!(out, "No winner (all busted): {}", summary.no_winner)?;
    writeln!(out, "Busted hands: {}", summary.busts)?;
    writeln!(out, "Blackjacks: {}", summary.blackjacks)?;
    if let Some(path) = &opts.output {
        writeln!(out, "Saved {} games to {}", summary.games, path)?;
    }
    Ok(())
}
