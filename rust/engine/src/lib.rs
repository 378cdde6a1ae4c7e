//! # twentyone-engine: Multiplayer 21 Session Core
//!
//! The rules of a simplified multiplayer blackjack game for 2 to 7 players.
//! There is no dealer: players take turns drawing against each other and the
//! best total of 21 or less wins. The crate is pure game logic with no I/O,
//! no locking and no clock, so every session is reproducible from its seed.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and the canonical deck
//! - [`deck`] - Seeded shuffling with ChaCha20 and top-of-deck draws
//! - [`hand`] - One player's cards, cached total and bust sentinel
//! - [`rules`] - Player limits, round resolution, blackjack window
//! - [`session`] - The session aggregate, invariant checks and records
//! - [`engine`] - Operations: join, ready, start, hit, end turn, leave, restart
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use twentyone_engine::engine::TurnOutcome;
//! use twentyone_engine::rules::TableRules;
//! use twentyone_engine::session::{LifecycleState, Session};
//!
//! let mut session = Session::new("s-1".into(), 1, "table", TableRules::default(), 42).unwrap();
//! session.join(2).unwrap();
//! session.ready(1).unwrap();
//! session.ready(2).unwrap();
//! session.start(1).unwrap();
//!
//! // Both players stand on the dealt cards
//! session.end_turn(1).unwrap();
//! let outcome = session.end_turn(2).unwrap();
//!
//! assert!(matches!(outcome, TurnOutcome::RoundComplete { .. }));
//! assert_eq!(session.state(), LifecycleState::Ended);
//! session.check_invariants().unwrap();
//! ```
//!
//! ## Deterministic Gameplay
//!
//! ```rust
//! use twentyone_engine::deck::Deck;
//!
//! let mut d1 = Deck::new_with_seed(42);
//! let mut d2 = Deck::new_with_seed(42);
//! d1.shuffle();
//! d2.shuffle();
//! assert_eq!(d1.cards(), d2.cards());
//! ```

pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod hand;
pub mod rules;
pub mod session;
