//! Built-in Texas Hold'em rules engine.
//!
//! The orchestration layer treats `HoldemGame` as an external collaborator:
//! it only consumes the query/apply surface in `game.rs` and never reaches
//! into dealing or pot internals.

pub mod deck;
pub mod error;
pub mod game;
pub mod hand;
pub mod player;
pub mod pot;

pub use deck::{Card, Deck};
pub use error::{EngineError, EngineResult};
pub use game::{AvailableMoves, HandPhase, HoldemGame};
pub use hand::{determine_winners, evaluate_hand, HandRank};
pub use player::{ActionKind, PlayerAction, SeatState};
pub use pot::{Pot, PotManager};
