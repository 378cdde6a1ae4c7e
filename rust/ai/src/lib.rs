//! # twentyone-ai: Automated Players
//!
//! Decision rules for seats that play without a human, used by simulations
//! and demos. A strategy only sees its own hand, the same information a
//! player gets from the session.
//!
//! ## Core Components
//!
//! - [`Strategy`] - Trait defining the interface for automated decisions
//! - [`baseline`] - Stand on 17 or more
//! - [`cautious`] - Stand on 12 or more
//! - [`create_strategy`] - Factory for strategies by name
//!
//! ## Quick Start
//!
//! ```rust
//! use twentyone_ai::{create_strategy, Decision};
//! use twentyone_engine::cards::{Card, Rank, Suit};
//! use twentyone_engine::hand::Hand;
//!
//! let strategy = create_strategy("baseline").expect("known strategy");
//!
//! let mut hand = Hand::new(1);
//! hand.receive(Card::new(Suit::Hearts, Rank::Ten));
//! hand.receive(Card::new(Suit::Clubs, Rank::Five));
//! assert_eq!(strategy.decide(&hand), Decision::Hit);
//! ```

use thiserror::Error;
use twentyone_engine::hand::Hand;

pub mod baseline;
pub mod cautious;

pub use baseline::BaselineStrategy;
pub use cautious::CautiousStrategy;

/// What an automated player does on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hit,
    Stand,
}

/// Interface for automated players.
///
/// # Example Implementation
///
/// ```rust
/// use twentyone_ai::{Decision, Strategy};
/// use twentyone_engine::hand::Hand;
///
/// struct AlwaysStand;
///
/// impl Strategy for AlwaysStand {
///     fn decide(&self, _hand: &Hand) -> Decision {
///         Decision::Stand
///     }
///
///     fn name(&self) -> &str {
///         "AlwaysStand"
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Choose the next move for the given hand. Busted hands always stand.
    fn decide(&self, hand: &Hand) -> Decision;

    fn name(&self) -> &str;
}

/// Stand once the hand total reaches `stand_on`.
pub(crate) fn threshold_decision(hand: &Hand, stand_on: i32) -> Decision {
    if hand.is_busted() || hand.total_value() >= stand_on {
        Decision::Stand
    } else {
        Decision::Hit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("Unknown strategy: {0} (expected baseline or cautious)")]
    Unknown(String),
    #[error("Stand threshold {0} is outside 2..=21")]
    InvalidThreshold(i32),
}

/// Names accepted by [`create_strategy`].
pub const STRATEGY_NAMES: [&str; 2] = ["baseline", "cautious"];

/// Factory function to create strategies by name.
///
/// ```rust
/// use twentyone_ai::create_strategy;
///
/// let strategy = create_strategy("cautious").unwrap();
/// assert_eq!(strategy.name(), "CautiousStrategy");
/// assert!(create_strategy("reckless").is_err());
/// ```
pub fn create_strategy(name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "baseline" => Ok(Box::new(BaselineStrategy::new())),
        "cautious" => Ok(Box::new(CautiousStrategy::new())),
        other => Err(StrategyError::Unknown(other.to_string())),
    }
}

/// Like [`create_strategy`], with a custom stand threshold for the
/// baseline rule. Other strategies ignore `stand_on`.
pub fn create_strategy_with_threshold(
    name: &str,
    stand_on: Option<i32>,
) -> Result<Box<dyn Strategy>, StrategyError> {
    match stand_on {
        Some(t) if name.trim().eq_ignore_ascii_case("baseline") => {
            Ok(Box::new(BaselineStrategy::with_stand_on(t)?))
        }
        _ => create_strategy(name),
    }
}
