//! Game operations on a [`Session`].
//!
//! Every operation validates first and mutates only once all checks have
//! passed, so a rejected call leaves the session exactly as it was. None of
//! them take locks; callers hold the session exclusively for the whole call.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{Hand, PlayerId};
use crate::rules::{in_blackjack_window, resolve_round, CARDS_PER_DEAL, MIN_PLAYERS};
use crate::session::{EndReason, LifecycleState, Session};

/// What happened to the turn pointer after a turn-ending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The same player keeps the turn.
    Continue { player_id: PlayerId },
    /// The turn passed to the next seat.
    NextPlayer { player_id: PlayerId },
    /// Every seat has played; the session ended with this result.
    RoundComplete { winner: Option<PlayerId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitOutcome {
    pub card: Card,
    pub hand: Hand,
    pub busted: bool,
    pub turn: TurnOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BlackjackOutcome {
    /// The caller held 21 and won on the spot.
    Win { winner: PlayerId },
    /// The caller does not hold 21. Nothing changed.
    NoBlackjack { total_value: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LeaveOutcome {
    /// The owner left; the game is over with no winner.
    SessionEnded,
    /// A player left; the game stopped and the table is back in the lobby.
    PlayerRemoved { remaining: usize },
}

impl Session {
    /// Seat a new player in the lobby with an unready, empty hand.
    pub fn join(&mut self, player: PlayerId) -> Result<&Hand, GameError> {
        if self.contains(player) {
            return Err(GameError::AlreadyJoined(player));
        }
        if self.is_full() {
            return Err(GameError::SessionFull {
                max: self.rules.max_players,
            });
        }
        match self.state {
            LifecycleState::Active => return Err(GameError::AlreadyStarted),
            LifecycleState::Ended => return Err(GameError::SessionEnded),
            LifecycleState::Lobby => {}
        }
        self.seats.push(Hand::new(player));
        Ok(&self.seats[self.seats.len() - 1])
    }

    pub fn ready(&mut self, player: PlayerId) -> Result<&Hand, GameError> {
        if self.state == LifecycleState::Ended {
            return Err(GameError::SessionEnded);
        }
        let hand = self
            .hand_mut(player)
            .ok_or(GameError::NotInSession(player))?;
        if hand.is_ready() {
            return Err(GameError::AlreadyReady(player));
        }
        hand.mark_ready();
        Ok(hand)
    }

    /// Shuffle, deal two cards to every seat and hand the turn to the first seat.
    ///
    /// # Examples
    ///
    /// ```
    /// use twentyone_engine::rules::TableRules;
    /// use twentyone_engine::session::{LifecycleState, Session};
    ///
    /// let mut session = Session::new("s".into(), 1, "table", TableRules::default(), 42).unwrap();
    /// session.join(2).unwrap();
    /// session.ready(1).unwrap();
    /// session.ready(2).unwrap();
    /// session.start(1).unwrap();
    ///
    /// assert_eq!(session.state(), LifecycleState::Active);
    /// assert_eq!(session.deck().remaining(), 48);
    /// assert_eq!(session.current_player(), Some(1));
    /// ```
    pub fn start(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if actor != self.owner {
            return Err(GameError::NotOwner(actor));
        }
        match self.state {
            LifecycleState::Active => return Err(GameError::AlreadyStarted),
            LifecycleState::Ended => return Err(GameError::SessionEnded),
            LifecycleState::Lobby => {}
        }
        self.check_table_ready()?;
        self.deal()
    }

    /// Play another game with the same seats after a result is in.
    pub fn restart(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if actor != self.owner {
            return Err(GameError::NotOwner(actor));
        }
        if self.state != LifecycleState::Ended {
            return Err(GameError::NotEnded);
        }
        // an owner who walked out cannot reopen the table
        if !self.contains(actor) {
            return Err(GameError::NotInSession(actor));
        }
        self.check_table_ready()?;
        self.deal()
    }

    /// Draw one card for the player whose turn it is.
    ///
    /// A hand that goes over 21 is marked busted and the turn moves on; the
    /// player otherwise keeps the turn and may hit again.
    pub fn hit(&mut self, player: PlayerId) -> Result<HitOutcome, GameError> {
        match (self.state, self.end_reason) {
            (LifecycleState::Lobby, _) => return Err(GameError::NotActive),
            // the game was abandoned, not played out
            (LifecycleState::Ended, Some(EndReason::OwnerLeft)) => {
                return Err(GameError::NotActive);
            }
            (LifecycleState::Ended, _) => return Err(GameError::GameAlreadyEnded),
            (LifecycleState::Active, _) => {}
        }
        if self.winner.is_some() {
            return Err(GameError::GameAlreadyEnded);
        }
        self.check_turn(player)?;

        let card = self.deck.draw()?;
        let hand = self
            .hand_mut(player)
            .ok_or(GameError::NotInSession(player))?;
        let busted = hand.receive(card);
        let hand = hand.clone();

        let turn = if busted {
            self.advance_turn()
        } else {
            TurnOutcome::Continue { player_id: player }
        };
        Ok(HitOutcome {
            card,
            hand,
            busted,
            turn,
        })
    }

    /// Stand: pass the turn to the next seat.
    pub fn end_turn(&mut self, player: PlayerId) -> Result<TurnOutcome, GameError> {
        if self.state != LifecycleState::Active {
            return Err(GameError::NotActive);
        }
        self.check_turn(player)?;
        Ok(self.advance_turn())
    }

    /// Claim a natural 21 straight after the deal, regardless of turn order.
    pub fn blackjack_check(&mut self, player: PlayerId) -> Result<BlackjackOutcome, GameError> {
        if self.state != LifecycleState::Active {
            return Err(GameError::NotActive);
        }
        if !in_blackjack_window(self.turn_index, &self.seats) {
            return Err(GameError::InvalidWindow);
        }
        let hand = self.hand(player).ok_or(GameError::NotInSession(player))?;
        if !hand.is_blackjack() {
            return Ok(BlackjackOutcome::NoBlackjack {
                total_value: hand.total_value(),
            });
        }
        self.finish(Some(player), EndReason::Blackjack);
        Ok(BlackjackOutcome::Win { winner: player })
    }

    /// Leave a running game.
    ///
    /// The player's hand is removed and its cards go to the discard pile. When
    /// the owner leaves the session ends without a winner; any other player
    /// leaving stops the game and returns the table to the lobby.
    pub fn leave(&mut self, player: PlayerId) -> Result<LeaveOutcome, GameError> {
        if self.state != LifecycleState::Active {
            return Err(GameError::NotActive);
        }
        let index = self
            .position_of(player)
            .ok_or(GameError::NotInSession(player))?;

        let mut hand = self.seats.remove(index);
        self.discards.extend(hand.take_cards());
        self.turn_index = 0;

        if player == self.owner {
            self.finish(None, EndReason::OwnerLeft);
            Ok(LeaveOutcome::SessionEnded)
        } else {
            self.state = LifecycleState::Lobby;
            Ok(LeaveOutcome::PlayerRemoved {
                remaining: self.seats.len(),
            })
        }
    }

    fn check_table_ready(&self) -> Result<(), GameError> {
        if self.seats.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                required: MIN_PLAYERS,
                actual: self.seats.len(),
            });
        }
        if !self.all_ready() {
            return Err(GameError::PlayersNotReady);
        }
        Ok(())
    }

    fn check_turn(&self, player: PlayerId) -> Result<(), GameError> {
        match self.current_player() {
            Some(expected) if expected == player => Ok(()),
            Some(expected) => Err(GameError::NotYourTurn {
                expected,
                actual: player,
            }),
            None => Err(GameError::NotActive),
        }
    }

    fn deal(&mut self) -> Result<(), GameError> {
        // the shuffle depends only on the seed and the deal count, so a
        // session rebuilt from its record deals exactly what the live one would
        let mut deck = Deck::new_with_seed(deal_seed(self.seed, self.deals));
        deck.shuffle();

        let required = self.seats.len() * CARDS_PER_DEAL;
        if deck.remaining() < required {
            return Err(GameError::InsufficientCards {
                required,
                available: deck.remaining(),
            });
        }

        let mut seats = self.seats.clone();
        for hand in &mut seats {
            hand.clear();
        }
        // round-robin: first card to every seat, then the second
        for _ in 0..CARDS_PER_DEAL {
            for hand in &mut seats {
                hand.receive(deck.draw()?);
            }
        }

        self.deck = deck;
        self.deals += 1;
        self.seats = seats;
        self.discards.clear();
        self.turn_index = 0;
        self.winner = None;
        self.end_reason = None;
        self.state = LifecycleState::Active;
        Ok(())
    }

    fn advance_turn(&mut self) -> TurnOutcome {
        self.turn_index += 1;
        if self.turn_index < self.seats.len() {
            return TurnOutcome::NextPlayer {
                player_id: self.seats[self.turn_index].player_id(),
            };
        }

        self.turn_index = 0;
        let winner = resolve_round(&self.seats);
        let reason = if winner.is_some() {
            EndReason::RoundComplete
        } else {
            EndReason::AllBusted
        };
        self.finish(winner, reason);
        TurnOutcome::RoundComplete { winner }
    }

    fn finish(&mut self, winner: Option<PlayerId>, reason: EndReason) {
        self.winner = winner;
        self.end_reason = Some(reason);
        self.state = LifecycleState::Ended;
    }
}

/// Seed for the shuffle of deal number `deals`. The first deal uses the
/// session seed itself.
fn deal_seed(seed: u64, deals: u64) -> u64 {
    seed.wrapping_add(deals.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{full_deck, Rank, Suit};
    use crate::deck::Deck;
    use crate::hand::BUST;
    use crate::rules::TableRules;

    fn table(players: &[PlayerId]) -> Session {
        let mut session =
            Session::new("s".into(), players[0], "table", TableRules::default(), 5).unwrap();
        for &p in &players[1..] {
            session.join(p).unwrap();
        }
        for &p in players {
            session.ready(p).unwrap();
        }
        session
    }

    /// Replace the deck so the next draws come out in `top_first` order.
    fn stack_deck(session: &mut Session, top_first: &[Card]) {
        let mut rest: Vec<Card> = full_deck()
            .into_iter()
            .filter(|c| {
                !top_first.contains(c) && !session.seats.iter().any(|h| h.cards().contains(c))
            })
            .collect();
        rest.extend(top_first.iter().rev());
        session.deck = Deck::from_cards(rest, 0);
    }

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(suit, rank)
    }

    #[test]
    fn join_rejections_keep_state() {
        let mut session = table(&[1, 2]);
        assert_eq!(session.join(2), Err(GameError::AlreadyJoined(2)));
        session.start(1).unwrap();
        assert_eq!(session.join(3), Err(GameError::AlreadyStarted));
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn full_table_rejects_joins() {
        let mut session = table(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(session.join(8), Err(GameError::SessionFull { max: 7 }));
        assert_eq!(session.player_count(), 7);
    }

    #[test]
    fn ready_twice_is_a_conflict() {
        let mut session = table(&[1, 2]);
        assert_eq!(session.ready(1).unwrap_err(), GameError::AlreadyReady(1));
        assert_eq!(session.ready(9).unwrap_err(), GameError::NotInSession(9));
    }

    #[test]
    fn start_checks_owner_players_and_readiness() {
        let mut solo = table(&[1]);
        assert_eq!(
            solo.start(1),
            Err(GameError::NotEnoughPlayers {
                required: 2,
                actual: 1
            })
        );

        let mut session = Session::new("s".into(), 1, "t", TableRules::default(), 1).unwrap();
        session.join(2).unwrap();
        session.ready(1).unwrap();
        assert_eq!(session.start(2), Err(GameError::NotOwner(2)));
        assert_eq!(session.start(1), Err(GameError::PlayersNotReady));
        assert_eq!(session.state(), LifecycleState::Lobby);

        session.ready(2).unwrap();
        session.start(1).unwrap();
        assert_eq!(session.start(1), Err(GameError::AlreadyStarted));
    }

    #[test]
    fn deal_is_round_robin() {
        let mut session = table(&[1, 2, 3]);
        let mut preview = session.deck.clone();
        preview.shuffle();
        let order: Vec<Card> = preview.cards().iter().rev().take(6).copied().collect();

        session.start(1).unwrap();
        let hands = session.hands();
        assert_eq!(hands[0].cards(), &[order[0], order[3]]);
        assert_eq!(hands[1].cards(), &[order[1], order[4]]);
        assert_eq!(hands[2].cards(), &[order[2], order[5]]);
        session.check_invariants().unwrap();
    }

    #[test]
    fn hit_out_of_turn_is_forbidden() {
        let mut session = table(&[1, 2]);
        assert_eq!(session.hit(1).unwrap_err(), GameError::NotActive);
        session.start(1).unwrap();
        assert_eq!(
            session.hit(2).unwrap_err(),
            GameError::NotYourTurn {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(session.deck().remaining(), 48);
    }

    #[test]
    fn full_round_scenario() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        // Fix the hands: player 1 holds 10+4, player 2 holds 9+8
        session.seats[0] = Hand::from_parts(
            1,
            vec![c(Rank::Ten, Suit::Clubs), c(Rank::Four, Suit::Clubs)],
            false,
            true,
        );
        session.seats[1] = Hand::from_parts(
            2,
            vec![c(Rank::Nine, Suit::Hearts), c(Rank::Eight, Suit::Hearts)],
            false,
            true,
        );
        stack_deck(
            &mut session,
            &[c(Rank::Three, Suit::Spades), c(Rank::Seven, Suit::Spades)],
        );
        session.check_invariants().unwrap();

        let first = session.hit(1).unwrap();
        assert!(!first.busted);
        assert_eq!(first.hand.total_value(), 17);
        assert_eq!(first.turn, TurnOutcome::Continue { player_id: 1 });

        let second = session.hit(1).unwrap();
        assert!(second.busted);
        assert_eq!(second.hand.total_value(), BUST);
        assert_eq!(second.turn, TurnOutcome::NextPlayer { player_id: 2 });
        assert_eq!(session.current_player(), Some(2));

        let done = session.end_turn(2).unwrap();
        assert_eq!(done, TurnOutcome::RoundComplete { winner: Some(2) });
        assert_eq!(session.turn_index(), 0);
        assert_eq!(session.winner(), Some(2));
        assert_eq!(session.state(), LifecycleState::Ended);
        assert_eq!(session.end_reason(), Some(EndReason::RoundComplete));
        session.check_invariants().unwrap();

        assert_eq!(session.hit(1).unwrap_err(), GameError::GameAlreadyEnded);
        assert_eq!(session.end_turn(1).unwrap_err(), GameError::NotActive);
    }

    #[test]
    fn everyone_busting_ends_without_winner() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.seats[0] = Hand::from_parts(
            1,
            vec![c(Rank::Ten, Suit::Clubs), c(Rank::Nine, Suit::Clubs)],
            false,
            true,
        );
        session.seats[1] = Hand::from_parts(
            2,
            vec![c(Rank::Ten, Suit::Hearts), c(Rank::Nine, Suit::Hearts)],
            false,
            true,
        );
        stack_deck(
            &mut session,
            &[c(Rank::King, Suit::Spades), c(Rank::King, Suit::Diamonds)],
        );

        session.hit(1).unwrap();
        let last = session.hit(2).unwrap();
        assert_eq!(last.turn, TurnOutcome::RoundComplete { winner: None });
        assert_eq!(session.state(), LifecycleState::Ended);
        assert_eq!(session.winner(), None);
        assert_eq!(session.end_reason(), Some(EndReason::AllBusted));
        session.check_invariants().unwrap();
    }

    #[test]
    fn blackjack_shortcut_ignores_turn_order() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.seats[1] = Hand::from_parts(
            2,
            vec![c(Rank::Ace, Suit::Spades), c(Rank::King, Suit::Spades)],
            false,
            true,
        );
        session.seats[0] = Hand::from_parts(
            1,
            vec![c(Rank::Two, Suit::Spades), c(Rank::Three, Suit::Spades)],
            false,
            true,
        );
        stack_deck(&mut session, &[]);

        assert_eq!(
            session.blackjack_check(1).unwrap(),
            BlackjackOutcome::NoBlackjack { total_value: 5 }
        );
        assert_eq!(session.state(), LifecycleState::Active);

        assert_eq!(
            session.blackjack_check(2).unwrap(),
            BlackjackOutcome::Win { winner: 2 }
        );
        assert_eq!(session.winner(), Some(2));
        assert_eq!(session.state(), LifecycleState::Ended);
        session.check_invariants().unwrap();
    }

    #[test]
    fn blackjack_window_closes_after_first_action() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.end_turn(1).unwrap();
        assert_eq!(
            session.blackjack_check(2).unwrap_err(),
            GameError::InvalidWindow
        );
    }

    #[test]
    fn owner_leaving_ends_the_session() {
        let mut session = table(&[1, 2, 3]);
        session.start(1).unwrap();
        assert_eq!(session.leave(1).unwrap(), LeaveOutcome::SessionEnded);
        assert_eq!(session.state(), LifecycleState::Ended);
        assert_eq!(session.winner(), None);
        assert_eq!(session.end_reason(), Some(EndReason::OwnerLeft));
        assert_eq!(session.player_ids(), vec![2, 3]);
        assert_eq!(session.discards().len(), 2);
        session.check_invariants().unwrap();
        assert_eq!(session.restart(1), Err(GameError::NotInSession(1)));
    }

    #[test]
    fn player_leaving_returns_to_lobby() {
        let mut session = table(&[1, 2, 3]);
        session.start(1).unwrap();
        assert_eq!(
            session.leave(2).unwrap(),
            LeaveOutcome::PlayerRemoved { remaining: 2 }
        );
        assert_eq!(session.state(), LifecycleState::Lobby);
        assert_eq!(session.player_ids(), vec![1, 3]);
        assert!(session.hand(2).is_none());
        session.check_invariants().unwrap();

        assert_eq!(session.leave(3).unwrap_err(), GameError::NotActive);
        session.start(1).unwrap();
        assert!(session.discards().is_empty());
        assert_eq!(session.deck().remaining(), 48);
    }

    #[test]
    fn restart_only_from_ended() {
        let mut session = table(&[1, 2]);
        assert_eq!(session.restart(1), Err(GameError::NotEnded));
        session.start(1).unwrap();
        session.end_turn(1).unwrap();
        session.end_turn(2).unwrap();
        assert_eq!(session.state(), LifecycleState::Ended);
        assert_eq!(session.start(1), Err(GameError::SessionEnded));
        assert_eq!(session.restart(2), Err(GameError::NotOwner(2)));
        assert_eq!(session.join(3), Err(GameError::SessionEnded));
        assert_eq!(session.player_count(), 2);

        session.restart(1).unwrap();
        assert_eq!(session.state(), LifecycleState::Active);
        assert_eq!(session.turn_index(), 0);
        assert_eq!(session.winner(), None);
        assert_eq!(session.end_reason(), None);
        assert!(session.hands().iter().all(|h| h.card_count() == 2));
        session.check_invariants().unwrap();
    }

    #[test]
    fn hit_after_owner_left_is_not_active() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.leave(1).unwrap();
        assert_eq!(session.end_reason(), Some(EndReason::OwnerLeft));
        assert_eq!(session.hit(2), Err(GameError::NotActive));
    }

    #[test]
    fn hit_after_round_end_is_already_ended() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.end_turn(1).unwrap();
        session.end_turn(2).unwrap();
        assert_eq!(session.hit(1), Err(GameError::GameAlreadyEnded));
    }

    #[test]
    fn restart_reshuffles_from_the_deal_count() {
        let mut session = table(&[1, 2, 3]);
        session.start(1).unwrap();
        let first_deal = session.deck().cards().to_vec();
        session.end_turn(1).unwrap();
        session.end_turn(2).unwrap();
        session.end_turn(3).unwrap();
        session.restart(1).unwrap();
        assert_eq!(session.deals(), 2);
        assert_ne!(session.deck().cards(), first_deal.as_slice());
    }

    #[test]
    fn ready_after_end_is_rejected() {
        let mut session = table(&[1, 2]);
        session.start(1).unwrap();
        session.leave(1).unwrap();
        assert_eq!(session.ready(2).unwrap_err(), GameError::SessionEnded);
    }
}
