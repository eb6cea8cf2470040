//! Wire-facing projections of session state.
//!
//! Everything here serializes with symbolic names and is a value copy; the
//! live session never leaks references across the boundary.

use crate::engine::{ActionKind, Card, HandPhase, SeatState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameStatus {
    Waiting,
    Running,
    Paused,
    Completed,
    Error,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Error)
    }
}

/// Card as transmitted: display pair plus the dense engine id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCard {
    pub rank: String,
    pub suit: String,
    pub id: u8,
}

impl From<Card> for WireCard {
    fn from(card: Card) -> Self {
        Self {
            rank: card.rank_char().to_string(),
            suit: card.suit_char().to_string(),
            id: card.id(),
        }
    }
}

/// Decision counters for an LLM-driven seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatStats {
    pub decisions: u64,
    pub average_thinking_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatInfo {
    pub player_id: usize,
    pub agent_type: String,
    pub display_name: String,
    pub chips: i64,
    pub state: SeatState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<Vec<WireCard>>,
    pub is_current_player: bool,
    pub chips_to_call: i64,
    /// Analyzer strength, only populated in debug mode once a flop exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_strength: Option<f64>,
    /// Present for LLM seats only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_stats: Option<SeatStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotInfo {
    pub pot_id: usize,
    pub total_amount: i64,
    pub eligible_players: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub phase: HandPhase,
    pub hand_number: u32,
    pub max_hands: u32,
    pub board: Vec<WireCard>,
    pub seats: Vec<SeatInfo>,
    pub pots: Vec<PotInfo>,
    pub total_pot: i64,
    pub current_player: Option<usize>,
    pub available_actions: Vec<ActionKind>,
    /// Minimum legal raise total from the enforced range, never the
    /// engine's advisory increment.
    pub min_raise_amount: Option<i64>,
    pub big_blind: i64,
    pub small_blind: i64,
    pub debug_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// History record of one applied action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player_id: usize,
    pub phase: HandPhase,
    pub action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub pot_before: i64,
    pub chips_remaining_after: i64,
}

/// Response to a proposed human action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<GameState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRanking {
    pub rank: usize,
    pub player_id: usize,
    pub display_name: String,
    pub chips: i64,
}
