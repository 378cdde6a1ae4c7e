use serde::{Deserialize, Serialize};

use crate::hand::{Hand, PlayerId};

/// Fewest players a session can be started with.
pub const MIN_PLAYERS: usize = 2;

/// Hard seat cap for every session.
pub const MAX_PLAYERS: usize = 7;

/// Cards each player receives when a session is dealt.
pub const CARDS_PER_DEAL: usize = 2;

/// Per-session table limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    /// Seat cap, between [`MIN_PLAYERS`] and [`MAX_PLAYERS`].
    pub max_players: usize,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
        }
    }
}

impl TableRules {
    /// Clamp the seat cap into the allowed range.
    pub fn with_max_players(max_players: usize) -> Self {
        Self {
            max_players: max_players.clamp(MIN_PLAYERS, MAX_PLAYERS),
        }
    }
}

/// Picks the winner of a completed round.
///
/// The highest total wins. Ties go to the player seated first (lowest index
/// in turn order). Busted hands never win; when every hand is busted there is
/// no winner.
///
/// # Examples
///
/// ```
/// use twentyone_engine::hand::Hand;
/// use twentyone_engine::rules::resolve_round;
///
/// let hands = vec![Hand::new(1), Hand::new(2)];
/// // Two empty hands tie on 0, the first seat wins
/// assert_eq!(resolve_round(&hands), Some(1));
/// ```
pub fn resolve_round(hands: &[Hand]) -> Option<PlayerId> {
    let mut best: Option<&Hand> = None;
    for hand in hands.iter().filter(|h| !h.is_busted()) {
        match best {
            Some(current) if current.total_value() >= hand.total_value() => {}
            _ => best = Some(hand),
        }
    }
    best.map(Hand::player_id)
}

/// Blackjack may only be claimed between the deal and the first action:
/// the turn pointer is still on the first seat and nobody has drawn.
pub fn in_blackjack_window(turn_index: usize, hands: &[Hand]) -> bool {
    turn_index == 0 && hands.iter().all(|h| h.card_count() == CARDS_PER_DEAL)
}
