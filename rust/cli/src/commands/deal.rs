//! Deal command handler: seat a table, start it, show what was dealt.
//!
//! Useful to eyeball a seed before simulating with it.

use crate::error::CliError;
use crate::ui;
use std::io::Write;
use twentyone_engine::hand::PlayerId;
use twentyone_engine::rules::TableRules;
use twentyone_engine::session::Session;

/// Handle the deal command.
///
/// Player 1 owns the table and players `2..=players` join. Everyone readies
/// up and the owner starts the session, which shuffles and deals two cards
/// to each seat.
///
/// # Arguments
///
/// * `seed` - Optional RNG seed for deterministic dealing
/// * `players` - Number of seats to fill, 2 to 7
/// * `out` - Output stream for command results
pub fn handle_deal_command(
    seed: Option<u64>,
    players: usize,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    crate::config::validate_players(players)?;
    let base_seed = seed.unwrap_or_else(rand::random);

    let session = seated_session(format!("deal-{}", base_seed), players, base_seed)?;

    writeln!(
        out,
        "Session {} (seed {}, {} players)",
        session.id(),
        base_seed,
        players
    )?;
    for hand in session.hands() {
        writeln!(out, "Player {}: {}", hand.player_id(), ui::format_hand(hand))?;
    }
    writeln!(out, "Deck: {} cards remaining", session.deck().remaining())?;
    if let Some(player) = session.current_player() {
        writeln!(out, "Turn: player {}", player)?;
    }
    Ok(())
}

/// Build a started session with players `1..=players`, owned by player 1.
pub(crate) fn seated_session(id: String, players: usize, seed: u64) -> Result<Session, CliError> {
    let owner: PlayerId = 1;
    let mut session = Session::new(id, owner, "table", TableRules::default(), seed)?;
    for player in 2..=players as PlayerId {
        session.join(player)?;
    }
    for player in 1..=players as PlayerId {
        session.ready(player)?;
    }
    session.start(owner)?;
    Ok(session)
}
