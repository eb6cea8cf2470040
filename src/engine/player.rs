use crate::engine::deck::Card;
use serde::{Deserialize, Serialize};

/// Internal standing of a seat inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Active, // Still in the hand, can act
    Folded, // Folded this hand
    AllIn,  // All chips committed
    Out,    // Busted, skipped when dealing
}

/// Wire-facing seat state, a projection of engine truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    In,
    ToCall,
    AllIn,
    Folded,
    Skip,
}

#[derive(Debug, Clone)]
pub struct GamePlayer {
    pub chips: i64,
    pub hole_cards: Vec<Card>,
    pub street_bet: i64,
    pub has_acted: bool,
    pub state: PlayerState,
}

impl GamePlayer {
    pub fn new(chips: i64) -> Self {
        Self {
            chips,
            hole_cards: vec![],
            street_bet: 0,
            has_acted: false,
            state: PlayerState::Active,
        }
    }

    /// Move chips from the stack into the current bet, capped at the stack.
    /// Returns the amount actually committed.
    pub fn place_bet(&mut self, amount: i64) -> i64 {
        let actual = amount.min(self.chips).max(0);
        self.chips -= actual;
        self.street_bet += actual;

        if self.chips == 0 && self.state == PlayerState::Active {
            self.state = PlayerState::AllIn;
        }

        actual
    }

    pub fn fold(&mut self) {
        self.state = PlayerState::Folded;
    }

    pub fn reset_for_street(&mut self) {
        self.street_bet = 0;
        self.has_acted = false;
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.street_bet = 0;
        self.has_acted = false;
        self.state = if self.chips > 0 {
            PlayerState::Active
        } else {
            PlayerState::Out
        };
    }

    pub fn can_act(&self) -> bool {
        self.state == PlayerState::Active
    }

    /// Still contesting the pot (can win at showdown).
    pub fn in_hand(&self) -> bool {
        matches!(self.state, PlayerState::Active | PlayerState::AllIn)
    }
}

/// A concrete player decision. `Raise` carries the total bet for the
/// current street, not a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "amount", rename_all = "UPPERCASE")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Raise(i64),
}

impl PlayerAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlayerAction::Fold => ActionKind::Fold,
            PlayerAction::Check => ActionKind::Check,
            PlayerAction::Call => ActionKind::Call,
            PlayerAction::Raise(_) => ActionKind::Raise,
        }
    }
}

/// Action type without an amount, as reported in legal-move sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
}
