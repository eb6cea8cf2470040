//! Multi-session Texas Hold'em orchestration core.
//!
//! Hosts concurrent tables whose seats are driven by rule-based agents,
//! LLM-backed agents or humans feeding actions in through `propose_action`.
//! The rules engine and the LLM transport sit behind seams (`engine`,
//! `llm::LlmGateway`). Everything above them lives here: turn dispatch,
//! validation, pot reconciliation, event fan-out and the session registry.

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod session;
pub mod validate;

// Re-export the boundary surface
pub use agent::{AgentCatalogEntry, AgentKind, AgentSpec, DecisionContext};
pub use config::{GameConfig, RegistryConfig};
pub use engine::{ActionKind, Card, HandPhase, PlayerAction, SeatState};
pub use error::{CoreError, CoreResult};
pub use llm::{LlmGateway, Personality};
pub use session::{
    ActionRecord, ActionResult, EventStream, FinalRanking, GameEvent, GameState, GameStatus,
    Session, SessionRegistry,
};
