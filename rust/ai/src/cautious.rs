use crate::{Decision, Strategy, threshold_decision};
use twentyone_engine::hand::Hand;

/// Stands as soon as one more card could bust the hand.
#[derive(Debug, Clone, Default)]
pub struct CautiousStrategy;

impl CautiousStrategy {
    pub const STAND_ON: i32 = 12;

    pub fn new() -> Self {
        Self
    }
}

impl Strategy for CautiousStrategy {
    fn decide(&self, hand: &Hand) -> Decision {
        threshold_decision(hand, Self::STAND_ON)
    }

    fn name(&self) -> &str {
        "CautiousStrategy"
    }
}
