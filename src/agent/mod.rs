//! Agent model: who controls a seat and what a decision looks like.
//!
//! Seat control is a tagged variant resolved once at session creation, not
//! a string looked up per turn. Decisions are made against a captured
//! [`DecisionContext`], never against the rules engine itself.

pub mod evaluate;
pub mod rules;

use crate::engine::game::AvailableMoves;
use crate::engine::{Card, HandPhase, HoldemGame, SeatState};
use crate::llm::Personality;
use evaluate::{hand_strength, pot_odds, table_position, TablePosition};
use rules::RuleKind;
use serde::{Deserialize, Serialize};

/// Who decides for a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentKind {
    Human,
    Rule(RuleKind),
    Llm {
        model: String,
        personality: Personality,
    },
}

impl AgentKind {
    pub fn is_human(&self) -> bool {
        matches!(self, AgentKind::Human)
    }

    /// Short wire identifier: `human`, the rule name, or `llm`.
    pub fn id(&self) -> String {
        match self {
            AgentKind::Human => "human".to_string(),
            AgentKind::Rule(rule) => rule.name().to_string(),
            AgentKind::Llm { .. } => "llm".to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            AgentKind::Human => "Human Player".to_string(),
            AgentKind::Rule(rule) => rule.display_name().to_string(),
            AgentKind::Llm { model, personality } => {
                format!("{} ({})", model, personality.as_str())
            }
        }
    }
}

/// Seat assignment as it arrives in a game config: a rule name, the literal
/// `human`, a registry shorthand for a known LLM setup, or an explicit
/// model + personality pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentSpec {
    Named(String),
    Llm { model: String, personality: String },
}

/// Shorthand registry names carried over from the preset catalog: each maps
/// to a concrete model id and personality.
const LLM_REGISTRY: &[(&str, &str, &str)] = &[
    ("gpt_4_1_balanced", "openai/gpt-4.1-mini", "balanced"),
    ("gpt_4_1_aggressive", "openai/gpt-4.1-mini", "aggressive"),
    ("gpt_4_1_conservative", "openai/gpt-4.1-mini", "conservative"),
    ("gpt_4_1_mathematical", "openai/gpt-4.1-mini", "mathematical"),
    ("gpt_4_1_bluffer", "openai/gpt-4.1-mini", "bluffer"),
    ("llama_balanced", "meta-llama/llama-3.1-8b-instruct", "balanced"),
    ("llama_aggressive", "meta-llama/llama-3.1-8b-instruct", "aggressive"),
    ("llama_conservative", "meta-llama/llama-3.1-8b-instruct", "conservative"),
    ("gemma_balanced", "google/gemma-3-27b-it:free", "balanced"),
    ("gemma_bluffer", "google/gemma-3-27b-it:free", "bluffer"),
    ("gemma_mathematical", "google/gemma-3-27b-it:free", "mathematical"),
];

impl AgentSpec {
    pub fn resolve(&self) -> Result<AgentKind, String> {
        match self {
            AgentSpec::Named(name) => {
                if name == "human" {
                    return Ok(AgentKind::Human);
                }
                if let Some(rule) = RuleKind::from_name(name) {
                    return Ok(AgentKind::Rule(rule));
                }
                if let Some((_, model, personality)) =
                    LLM_REGISTRY.iter().find(|(key, _, _)| *key == name.as_str())
                {
                    return Ok(AgentKind::Llm {
                        model: model.to_string(),
                        personality: Personality::from_name(personality),
                    });
                }
                Err(format!("unknown agent type '{}'", name))
            }
            AgentSpec::Llm { model, personality } => Ok(AgentKind::Llm {
                model: model.clone(),
                personality: Personality::from_name(personality),
            }),
        }
    }
}

/// One entry of the agent catalog exposed by `list_agents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCatalogEntry {
    pub agent_id: String,
    pub kind: String,
    pub description: String,
    pub available: bool,
}

/// Full catalog: every rule personality, the LLM registry and the human
/// slot. `llm_available` reflects whether a gateway is configured.
pub fn agent_catalog(llm_available: bool) -> Vec<AgentCatalogEntry> {
    let mut entries: Vec<AgentCatalogEntry> = RuleKind::ALL
        .iter()
        .map(|rule| AgentCatalogEntry {
            agent_id: rule.name().to_string(),
            kind: "rule".to_string(),
            description: rule.description().to_string(),
            available: true,
        })
        .collect();

    for (key, model, personality) in LLM_REGISTRY {
        entries.push(AgentCatalogEntry {
            agent_id: key.to_string(),
            kind: "llm".to_string(),
            description: format!("{} with {} strategy", model, personality),
            available: llm_available,
        });
    }

    entries.push(AgentCatalogEntry {
        agent_id: "human".to_string(),
        kind: "human".to_string(),
        description: "Human player via propose_action".to_string(),
        available: true,
    });

    entries
}

/// Everything an agent may look at when deciding: a value snapshot taken
/// under the session lock, including the analyzer outputs.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub seat: usize,
    pub phase: HandPhase,
    pub hole_cards: Vec<Card>,
    pub board: Vec<Card>,
    pub pot_total: i64,
    pub chips: i64,
    pub chips_to_call: i64,
    pub big_blind: i64,
    pub available: AvailableMoves,
    pub hand_strength: f64,
    pub pot_odds: Option<f64>,
    pub position: TablePosition,
    pub opponents: Vec<OpponentView>,
}

#[derive(Debug, Clone)]
pub struct OpponentView {
    pub seat: usize,
    pub chips: i64,
    pub state: SeatState,
}

impl DecisionContext {
    pub fn capture(game: &HoldemGame, seat: usize) -> Self {
        let opponents = (0..game.seat_count())
            .filter(|&s| s != seat)
            .map(|s| OpponentView {
                seat: s,
                chips: game.chips(s),
                state: game.seat_state(s),
            })
            .collect();

        Self {
            seat,
            phase: game.hand_phase(),
            hole_cards: game.hand_of(seat).to_vec(),
            board: game.board().to_vec(),
            pot_total: game.pot_total(),
            chips: game.chips(seat),
            chips_to_call: game.chips_to_call(seat),
            big_blind: game.big_blind(),
            available: game.available_moves(),
            hand_strength: hand_strength(game, seat),
            pot_odds: pot_odds(game, seat),
            position: table_position(game, seat),
            opponents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_resolution() {
        assert_eq!(
            AgentSpec::Named("human".into()).resolve().unwrap(),
            AgentKind::Human
        );
        assert_eq!(
            AgentSpec::Named("tight".into()).resolve().unwrap(),
            AgentKind::Rule(RuleKind::Tight)
        );
        assert!(matches!(
            AgentSpec::Named("llama_balanced".into()).resolve().unwrap(),
            AgentKind::Llm { .. }
        ));
        assert!(AgentSpec::Named("psychic".into()).resolve().is_err());
    }

    #[test]
    fn test_explicit_llm_spec() {
        let spec = AgentSpec::Llm {
            model: "openai/gpt-4.1-mini".into(),
            personality: "bluffer".into(),
        };
        let kind = spec.resolve().unwrap();
        assert_eq!(
            kind,
            AgentKind::Llm {
                model: "openai/gpt-4.1-mini".into(),
                personality: Personality::Bluffer,
            }
        );
    }

    #[test]
    fn test_spec_deserializes_both_shapes() {
        let named: AgentSpec = serde_json::from_str("\"loose\"").unwrap();
        assert!(matches!(named, AgentSpec::Named(ref n) if n == "loose"));

        let llm: AgentSpec =
            serde_json::from_str(r#"{"model":"m","personality":"balanced"}"#).unwrap();
        assert!(matches!(llm, AgentSpec::Llm { .. }));
    }

    #[test]
    fn test_catalog_flags_llm_availability() {
        let catalog = agent_catalog(false);
        assert!(catalog
            .iter()
            .filter(|e| e.kind == "llm")
            .all(|e| !e.available));
        assert!(catalog
            .iter()
            .filter(|e| e.kind == "rule")
            .all(|e| e.available));
        assert!(catalog.iter().any(|e| e.agent_id == "human"));
    }
}
