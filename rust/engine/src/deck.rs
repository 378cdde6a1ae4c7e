use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// The cards still to be dealt in one session, plus the RNG that orders them.
///
/// Cards are drawn from the end of the sequence. The deck never gains cards
/// except through [`Deck::shuffle`], which replaces the whole sequence with a
/// freshly permuted 52-card deck.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(seed);
        // Keep canonical order until shuffle is called explicitly
        Self {
            cards: full_deck(),
            rng,
        }
    }

    /// Deck seeded from the thread RNG; draw order is not reproducible.
    pub fn new_unseeded() -> Self {
        Self::new_with_seed(rand::random())
    }

    /// Rebuild a deck with an exact remaining order, e.g. from a stored record.
    pub fn from_cards(cards: Vec<Card>, seed: u64) -> Self {
        Self {
            cards,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Replace the contents with a uniformly random permutation of all 52 cards.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        // Fisher-Yates, walking from the last index down
        self.cards.shuffle(&mut self.rng);
    }

    /// Restore the canonical unshuffled order.
    pub fn reset(&mut self) {
        self.cards = full_deck();
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::EmptyDeck)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Remaining cards, bottom first; the last element is drawn next.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
