//! Baseline strategy: draw until the hand reaches a fixed total.
//!
//! With every ace counted as 11 there are no soft hands, so a single
//! threshold is the whole rule.

use crate::{Decision, Strategy, StrategyError, threshold_decision};
use twentyone_engine::hand::{BLACKJACK, Hand};

/// Total at which the baseline strategy stops drawing.
pub const DEFAULT_STAND_ON: i32 = 17;

/// Reference strategy for simulations and benchmarks.
///
/// # Example
///
/// ```rust
/// use twentyone_ai::baseline::BaselineStrategy;
/// use twentyone_ai::Strategy;
///
/// let strategy = BaselineStrategy::new();
/// assert_eq!(strategy.name(), "BaselineStrategy");
/// assert_eq!(strategy.stand_on(), 17);
/// ```
#[derive(Debug, Clone)]
pub struct BaselineStrategy {
    stand_on: i32,
}

impl Default for BaselineStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselineStrategy {
    pub fn new() -> Self {
        Self {
            stand_on: DEFAULT_STAND_ON,
        }
    }

    pub fn with_stand_on(stand_on: i32) -> Result<Self, StrategyError> {
        if !(2..=BLACKJACK).contains(&stand_on) {
            return Err(StrategyError::InvalidThreshold(stand_on));
        }
        Ok(Self { stand_on })
    }

    pub fn stand_on(&self) -> i32 {
        self.stand_on
    }
}

impl Strategy for BaselineStrategy {
    fn decide(&self, hand: &Hand) -> Decision {
        threshold_decision(hand, self.stand_on)
    }

    fn name(&self) -> &str {
        "BaselineStrategy"
    }
}
