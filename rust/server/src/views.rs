//! Read-only snapshots of a session as seen by one viewer.

use serde::{Deserialize, Serialize};
use twentyone_engine::cards::Card;
use twentyone_engine::errors::GameError;
use twentyone_engine::hand::{Hand, PlayerId};
use twentyone_engine::session::{EndReason, LifecycleState, Session, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandView {
    pub player_id: PlayerId,
    pub cards: Vec<Card>,
    pub card_count: usize,
    pub total_value: i32,
    pub is_ready: bool,
    pub is_busted: bool,
}

impl From<&Hand> for HandView {
    fn from(hand: &Hand) -> Self {
        Self {
            player_id: hand.player_id(),
            cards: hand.cards().to_vec(),
            card_count: hand.card_count(),
            total_value: hand.total_value(),
            is_ready: hand.is_ready(),
            is_busted: hand.is_busted(),
        }
    }
}

/// A session as one participant sees it.
///
/// The owner sees every hand and the deck size; everyone else sees only
/// their own hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub name: String,
    pub owner_id: PlayerId,
    pub state: LifecycleState,
    pub player_ids: Vec<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerId>,
    pub turn_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    pub is_owner: bool,
    pub is_your_turn: bool,
    pub hands: Vec<HandView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_remaining: Option<usize>,
}

impl SessionView {
    pub fn build(session: &Session, viewer: PlayerId) -> Result<Self, GameError> {
        if !session.contains(viewer) {
            return Err(GameError::NotParticipant(viewer));
        }
        let is_owner = session.owner() == viewer;
        let hands = session
            .hands()
            .iter()
            .filter(|hand| is_owner || hand.player_id() == viewer)
            .map(HandView::from)
            .collect();

        Ok(Self {
            session_id: session.id().clone(),
            name: session.name().to_string(),
            owner_id: session.owner(),
            state: session.state(),
            player_ids: session.player_ids(),
            current_player: session.current_player(),
            turn_index: session.turn_index(),
            winner_id: session.winner(),
            end_reason: session.end_reason(),
            is_owner,
            is_your_turn: session.current_player() == Some(viewer),
            hands,
            deck_remaining: is_owner.then(|| session.deck().remaining()),
        })
    }
}

/// One row of the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub name: String,
    pub owner_id: PlayerId,
    pub state: LifecycleState,
    pub player_count: usize,
    pub max_players: usize,
    pub created_at: String,
}

impl SessionSummary {
    pub fn new(session: &Session, created_at: String) -> Self {
        Self {
            session_id: session.id().clone(),
            name: session.name().to_string(),
            owner_id: session.owner(),
            state: session.state(),
            player_count: session.player_count(),
            max_players: session.rules().max_players,
            created_at,
        }
    }
}

/// Remaining deck, top card last. Owner only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckView {
    pub session_id: SessionId,
    pub remaining: usize,
    pub cards: Vec<Card>,
}

impl DeckView {
    pub fn build(session: &Session, viewer: PlayerId) -> Result<Self, GameError> {
        if session.owner() != viewer {
            return Err(GameError::NotOwner(viewer));
        }
        Ok(Self {
            session_id: session.id().clone(),
            remaining: session.deck().remaining(),
            cards: session.deck().cards().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twentyone_engine::rules::TableRules;

    fn dealt() -> Session {
        let mut session =
            Session::new("v".into(), 1, "view", TableRules::default(), 21).expect("session");
        session.join(2).expect("join");
        session.ready(1).expect("ready");
        session.ready(2).expect("ready");
        session.start(1).expect("start");
        session
    }

    #[test]
    fn owner_sees_every_hand_and_the_deck() {
        let view = SessionView::build(&dealt(), 1).expect("view");
        assert!(view.is_owner);
        assert!(view.is_your_turn);
        assert_eq!(view.hands.len(), 2);
        assert_eq!(view.deck_remaining, Some(48));
    }

    #[test]
    fn players_see_only_their_own_hand() {
        let view = SessionView::build(&dealt(), 2).expect("view");
        assert!(!view.is_owner);
        assert!(!view.is_your_turn);
        assert_eq!(view.hands.len(), 1);
        assert_eq!(view.hands[0].player_id, 2);
        assert_eq!(view.deck_remaining, None);
    }

    #[test]
    fn outsiders_are_forbidden() {
        assert_eq!(
            SessionView::build(&dealt(), 7).unwrap_err(),
            GameError::NotParticipant(7)
        );
    }

    #[test]
    fn deck_view_is_owner_only() {
        let session = dealt();
        let deck = DeckView::build(&session, 1).expect("deck");
        assert_eq!(deck.remaining, 48);
        assert_eq!(deck.cards.len(), 48);
        assert_eq!(
            DeckView::build(&session, 2).unwrap_err(),
            GameError::NotOwner(2)
        );
    }
}
