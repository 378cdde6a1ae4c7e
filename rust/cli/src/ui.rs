//! Terminal output helpers shared by the commands.

use std::io::Write;

use twentyone_engine::hand::Hand;

pub fn write_error(err: &mut dyn Write, msg: &str) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}

/// Display a warning message to stderr with "WARNING:" prefix
pub fn display_warning(err: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(err, "WARNING: {}", message)
}

/// One-line rendering of a hand, e.g. `A♠ K♥ = 21`.
pub fn format_hand(hand: &Hand) -> String {
    let cards: Vec<String> = hand.cards().iter().map(|c| c.to_string()).collect();
    let total = if hand.is_busted() {
        "BUST".to_string()
    } else {
        hand.total_value().to_string()
    };
    format!("{} = {}", cards.join(" "), total)
}
