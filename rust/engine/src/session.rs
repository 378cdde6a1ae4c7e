use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::cards::{Card, DECK_SIZE};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{Hand, PlayerId, BLACKJACK, BUST};
use crate::rules::{TableRules, MAX_PLAYERS};

pub type SessionId = String;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Players join and ready up.
    Lobby,
    /// Cards are dealt and turns are being played.
    Active,
    /// A result is in; the owner may restart.
    Ended,
}

/// Why an `Ended` session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every player took a turn; the best hand won.
    RoundComplete,
    /// A player claimed 21 on the opening deal.
    Blackjack,
    /// Every player went over 21. No winner.
    AllBusted,
    /// The owner left while the game was running. No winner.
    OwnerLeft,
}

/// One game instance: the deck, the seated players with their hands, the
/// turn pointer and the lifecycle state.
///
/// A session is a single aggregate. The deck and every hand are only ever
/// mutated through `&mut Session`, so one lock around the session guards all
/// of them. Seat order is turn order.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) owner: PlayerId,
    pub(crate) name: String,
    pub(crate) seats: Vec<Hand>,
    pub(crate) deck: Deck,
    pub(crate) discards: Vec<Card>,
    pub(crate) turn_index: usize,
    pub(crate) state: LifecycleState,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) end_reason: Option<EndReason>,
    pub(crate) rules: TableRules,
    pub(crate) seed: u64,
    /// Completed deals; each deal shuffles with a seed derived from this.
    pub(crate) deals: u64,
}

impl Session {
    /// Open a new session in the lobby with its owner seated.
    ///
    /// The deck is built in canonical order but not dealt; it is shuffled when
    /// the owner starts the game.
    ///
    /// # Examples
    ///
    /// ```
    /// use twentyone_engine::rules::TableRules;
    /// use twentyone_engine::session::{LifecycleState, Session};
    ///
    /// let session = Session::new("s-1".into(), 1, "  Friday table ", TableRules::default(), 7)
    ///     .expect("valid name");
    /// assert_eq!(session.name(), "Friday table");
    /// assert_eq!(session.state(), LifecycleState::Lobby);
    /// assert_eq!(session.player_ids(), vec![1]);
    /// assert_eq!(session.deck().remaining(), 52);
    /// ```
    pub fn new(
        id: SessionId,
        owner: PlayerId,
        name: &str,
        rules: TableRules,
        seed: u64,
    ) -> Result<Self, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        Ok(Self {
            id,
            owner,
            name: name.to_string(),
            seats: vec![Hand::new(owner)],
            deck: Deck::new_with_seed(seed),
            discards: Vec::new(),
            turn_index: 0,
            state: LifecycleState::Lobby,
            winner: None,
            end_reason: None,
            rules,
            seed,
            deals: 0,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn rules(&self) -> TableRules {
        self.rules
    }

    /// How many times this session has been dealt, across restarts.
    pub fn deals(&self) -> u64 {
        self.deals
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Cards taken out of play by players who left mid-game.
    pub fn discards(&self) -> &[Card] {
        &self.discards
    }

    /// Hands in turn order.
    pub fn hands(&self) -> &[Hand] {
        &self.seats
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.seats.iter().map(Hand::player_id).collect()
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.rules.max_players
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.position_of(player).is_some()
    }

    pub fn position_of(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|h| h.player_id() == player)
    }

    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.seats.iter().find(|h| h.player_id() == player)
    }

    pub(crate) fn hand_mut(&mut self, player: PlayerId) -> Option<&mut Hand> {
        self.seats.iter_mut().find(|h| h.player_id() == player)
    }

    /// Whose turn it is, while the session is active.
    pub fn current_player(&self) -> Option<PlayerId> {
        match self.state {
            LifecycleState::Active => self.seats.get(self.turn_index).map(Hand::player_id),
            _ => None,
        }
    }

    pub fn all_ready(&self) -> bool {
        self.seats.iter().all(Hand::is_ready)
    }

    /// Verify every structural invariant of the aggregate.
    ///
    /// Returns [`GameError::InvariantViolation`] describing the first broken
    /// rule. Callers run this before committing a mutated copy.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        let fail = |msg: String| -> Result<(), GameError> {
            Err(GameError::InvariantViolation(msg))
        };

        if self.seats.len() > MAX_PLAYERS || self.seats.len() > self.rules.max_players {
            return fail(format!("{} players seated", self.seats.len()));
        }

        let mut seen = HashSet::new();
        for hand in &self.seats {
            if !seen.insert(hand.player_id()) {
                return fail(format!("player {} seated twice", hand.player_id()));
            }
        }

        if self.state == LifecycleState::Active && self.turn_index >= self.seats.len() {
            return fail(format!(
                "turn index {} out of range for {} players",
                self.turn_index,
                self.seats.len()
            ));
        }

        match (self.state, self.winner, self.end_reason) {
            (LifecycleState::Ended, Some(_), Some(EndReason::RoundComplete | EndReason::Blackjack)) => {}
            (LifecycleState::Ended, None, Some(EndReason::AllBusted | EndReason::OwnerLeft)) => {}
            (LifecycleState::Lobby | LifecycleState::Active, None, None) => {}
            (state, winner, reason) => {
                return fail(format!(
                    "inconsistent result: state {state:?}, winner {winner:?}, reason {reason:?}"
                ));
            }
        }
        if let Some(winner) = self.winner {
            if !self.contains(winner) {
                return fail(format!("winner {winner} is not seated"));
            }
        }

        for hand in &self.seats {
            if hand.card_count() != hand.cards().len() {
                return fail(format!(
                    "player {} card count {} but holds {} cards",
                    hand.player_id(),
                    hand.card_count(),
                    hand.cards().len()
                ));
            }
            let sum: i32 = hand.cards().iter().map(|c| i32::from(c.value())).sum();
            let consistent = if sum > BLACKJACK {
                hand.total_value() == BUST
            } else {
                hand.total_value() == sum
            };
            if !consistent {
                return fail(format!(
                    "player {} total {} does not match cards summing to {}",
                    hand.player_id(),
                    hand.total_value(),
                    sum
                ));
            }
        }

        let mut cards = HashSet::with_capacity(DECK_SIZE);
        let all = self
            .deck
            .cards()
            .iter()
            .chain(self.discards.iter())
            .chain(self.seats.iter().flat_map(|h| h.cards().iter()));
        for card in all {
            if !cards.insert(*card) {
                return fail(format!("card {card} appears twice"));
            }
        }
        if cards.len() != DECK_SIZE {
            return fail(format!("{} cards in play, expected {}", cards.len(), DECK_SIZE));
        }

        Ok(())
    }

    /// Full serializable state, for persistence.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            owner_id: self.owner,
            name: self.name.clone(),
            player_ids: self.player_ids(),
            hands: self.seats.clone(),
            deck: self.deck.cards().to_vec(),
            discards: self.discards.clone(),
            turn_index: self.turn_index,
            state: self.state,
            winner_id: self.winner,
            end_reason: self.end_reason,
            max_players: self.rules.max_players,
            seed: self.seed,
            deals: self.deals,
        }
    }

    /// Rebuild a session from a stored record. The result is invariant-checked.
    pub fn from_record(record: SessionRecord) -> Result<Self, GameError> {
        let seat_ids: Vec<PlayerId> = record.hands.iter().map(Hand::player_id).collect();
        if seat_ids != record.player_ids {
            return Err(GameError::InvariantViolation(format!(
                "record hands {seat_ids:?} do not match players {:?}",
                record.player_ids
            )));
        }
        let session = Self {
            id: record.id,
            owner: record.owner_id,
            name: record.name,
            seats: record.hands,
            deck: Deck::from_cards(record.deck, record.seed),
            discards: record.discards,
            turn_index: record.turn_index,
            state: record.state,
            winner: record.winner_id,
            end_reason: record.end_reason,
            rules: TableRules {
                max_players: record.max_players,
            },
            seed: record.seed,
            deals: record.deals,
        };
        session.check_invariants()?;
        Ok(session)
    }
}

/// Serializable snapshot of a [`Session`], including deck order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub owner_id: PlayerId,
    pub name: String,
    pub player_ids: Vec<PlayerId>,
    pub hands: Vec<Hand>,
    pub deck: Vec<Card>,
    #[serde(default)]
    pub discards: Vec<Card>,
    pub turn_index: usize,
    pub state: LifecycleState,
    pub winner_id: Option<PlayerId>,
    #[serde(default)]
    pub end_reason: Option<EndReason>,
    pub max_players: usize,
    pub seed: u64,
    #[serde(default)]
    pub deals: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> Session {
        Session::new("s".into(), 1, "table", TableRules::default(), 11).expect("session")
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = Session::new("s".into(), 1, "   ", TableRules::default(), 0).unwrap_err();
        assert_eq!(err, GameError::EmptyName);
    }

    #[test]
    fn new_session_satisfies_invariants() {
        let session = lobby();
        assert_eq!(session.owner(), 1);
        assert_eq!(session.current_player(), None);
        assert!(!session.all_ready());
        session.check_invariants().expect("fresh session is consistent");
    }

    #[test]
    fn duplicate_seat_is_detected() {
        let mut session = lobby();
        session.seats.push(Hand::new(1));
        assert!(matches!(
            session.check_invariants(),
            Err(GameError::InvariantViolation(_))
        ));
    }

    #[test]
    fn lost_card_is_detected() {
        let mut session = lobby();
        session.deck.draw().unwrap();
        assert!(matches!(
            session.check_invariants(),
            Err(GameError::InvariantViolation(msg)) if msg.contains("51 cards")
        ));
    }

    #[test]
    fn winner_outside_ended_is_detected() {
        let mut session = lobby();
        session.winner = Some(1);
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn record_round_trip_preserves_state() {
        let session = lobby();
        let record = session.to_record();
        let json = serde_json::to_string(&record).expect("serialize");
        let back: SessionRecord = serde_json::from_str(&json).expect("deserialize");
        let rebuilt = Session::from_record(back).expect("rebuild");
        assert_eq!(rebuilt.to_record(), record);
    }

    #[test]
    fn tampered_record_is_rejected() {
        let mut record = lobby().to_record();
        record.deck.pop();
        assert!(Session::from_record(record).is_err());
    }
}
