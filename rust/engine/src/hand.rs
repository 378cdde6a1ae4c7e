use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// Opaque player identifier issued by the authentication layer.
pub type PlayerId = u64;

/// Stored in [`Hand::total_value`] once a hand has gone over [`BLACKJACK`].
pub const BUST: i32 = -1;

/// Highest total a hand can hold without busting.
pub const BLACKJACK: i32 = 21;

/// One player's cards and score within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    player_id: PlayerId,
    cards: Vec<Card>,
    card_count: usize,
    total_value: i32,
    is_ready: bool,
}

impl Hand {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            cards: Vec::new(),
            card_count: 0,
            total_value: 0,
            is_ready: false,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_count(&self) -> usize {
        self.card_count
    }

    /// Sum of card values, or [`BUST`].
    pub fn total_value(&self) -> i32 {
        self.total_value
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn is_busted(&self) -> bool {
        self.total_value == BUST
    }

    pub fn is_blackjack(&self) -> bool {
        self.total_value == BLACKJACK
    }

    pub fn mark_ready(&mut self) {
        self.is_ready = true;
    }

    /// Empty the hand for a new deal. Readiness is kept.
    pub fn clear(&mut self) {
        self.cards.clear();
        self.card_count = 0;
        self.total_value = 0;
    }

    /// Add a card and return `true` when it busts the hand.
    pub fn receive(&mut self, card: Card) -> bool {
        self.cards.push(card);
        self.card_count += 1;
        if self.is_busted() {
            // busted hands keep the sentinel until the next deal
            return true;
        }
        self.total_value += i32::from(card.value());
        if self.total_value > BLACKJACK {
            self.total_value = BUST;
            return true;
        }
        false
    }

    /// Give up all held cards, e.g. when the player leaves mid-game.
    pub fn take_cards(&mut self) -> Vec<Card> {
        self.card_count = 0;
        self.total_value = 0;
        std::mem::take(&mut self.cards)
    }

    /// Rebuild a hand from stored parts. Count and total are recomputed so
    /// the cached values always agree with the cards.
    pub fn from_parts(player_id: PlayerId, cards: Vec<Card>, busted: bool, is_ready: bool) -> Self {
        let sum: i32 = cards.iter().map(|c| i32::from(c.value())).sum();
        Self {
            player_id,
            card_count: cards.len(),
            total_value: if busted || sum > BLACKJACK { BUST } else { sum },
            cards,
            is_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(Suit::Spades, rank)
    }

    #[test]
    fn new_hand_is_empty_and_unready() {
        let hand = Hand::new(4);
        assert_eq!(hand.player_id(), 4);
        assert!(hand.cards().is_empty());
        assert_eq!(hand.card_count(), 0);
        assert_eq!(hand.total_value(), 0);
        assert!(!hand.is_ready());
    }

    #[test]
    fn receive_accumulates_value_and_count() {
        let mut hand = Hand::new(1);
        assert!(!hand.receive(card(Rank::King)));
        assert!(!hand.receive(card(Rank::Ace)));
        assert_eq!(hand.card_count(), 2);
        assert_eq!(hand.total_value(), 21);
        assert!(hand.is_blackjack());
    }

    #[test]
    fn going_over_twenty_one_stores_the_sentinel() {
        let mut hand = Hand::new(1);
        hand.receive(card(Rank::King));
        hand.receive(card(Rank::Queen));
        assert!(hand.receive(card(Rank::Two)));
        assert_eq!(hand.total_value(), BUST);
        assert_eq!(hand.card_count(), 3);
        assert!(hand.is_busted());
    }

    #[test]
    fn two_aces_bust_without_soft_valuation() {
        let mut hand = Hand::new(1);
        hand.receive(Card::new(Suit::Hearts, Rank::Ace));
        assert!(hand.receive(Card::new(Suit::Clubs, Rank::Ace)));
        assert_eq!(hand.total_value(), BUST);
    }

    #[test]
    fn clear_keeps_readiness() {
        let mut hand = Hand::new(1);
        hand.mark_ready();
        hand.receive(card(Rank::Five));
        hand.clear();
        assert!(hand.is_ready());
        assert_eq!(hand.card_count(), 0);
        assert_eq!(hand.total_value(), 0);
    }

    #[test]
    fn from_parts_recomputes_cached_fields() {
        let hand = Hand::from_parts(2, vec![card(Rank::Nine), card(Rank::Four)], false, true);
        assert_eq!(hand.card_count(), 2);
        assert_eq!(hand.total_value(), 13);
        assert!(hand.is_ready());

        let busted = Hand::from_parts(2, vec![card(Rank::Nine)], true, false);
        assert!(busted.is_busted());
    }
}
