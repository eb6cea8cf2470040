//! LLM-backed decision making.
//!
//! The gateway trait is the transport seam: anything that can complete a
//! prompt (structured or free-form) can drive a seat. The pipeline turns
//! completions into validated actions; the prompt builder assembles the
//! situation report the model sees.

pub mod openrouter;
pub mod pipeline;
pub mod prompt;

use crate::engine::ActionKind;
use crate::session::state::ActionRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Playing style baked into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Balanced,
    Aggressive,
    Conservative,
    Bluffer,
    Mathematical,
}

impl Personality {
    pub fn from_name(name: &str) -> Self {
        match name {
            "aggressive" => Personality::Aggressive,
            "conservative" => Personality::Conservative,
            "bluffer" => Personality::Bluffer,
            "mathematical" => Personality::Mathematical,
            _ => Personality::Balanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Balanced => "balanced",
            Personality::Aggressive => "aggressive",
            Personality::Conservative => "conservative",
            Personality::Bluffer => "bluffer",
            Personality::Mathematical => "mathematical",
        }
    }
}

/// One seat's remembered actions for the current hand. Created empty at
/// hand start, appended after each applied action, discarded at settle.
#[derive(Debug, Clone, Default)]
pub struct HandMemory {
    records: Vec<ActionRecord>,
}

impl HandMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ActionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// The decision object every completion must reduce to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDecision {
    pub action: ActionKind,
    #[serde(default)]
    pub amount: Option<i64>,
    pub reasoning: String,
    pub confidence: f64,
}

/// JSON schema for structured completions, mirroring [`LlmDecision`].
pub fn decision_schema() -> serde_json::Value {
    json!({
        "name": "poker_action",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["FOLD", "CHECK", "CALL", "RAISE"],
                    "description": "The poker action to take"
                },
                "amount": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Total street bet when raising, 0 otherwise"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Brief explanation of the decision (1-2 sentences)"
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "Confidence in this decision (0.0 to 1.0)"
                }
            },
            "required": ["action", "amount", "reasoning", "confidence"],
            "additionalProperties": false
        }
    })
}

#[derive(Debug, Clone)]
pub enum GatewayError {
    /// The model or provider cannot do schema-constrained output.
    Unsupported,
    Failed(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unsupported => write!(f, "structured output not supported"),
            GatewayError::Failed(msg) => write!(f, "gateway request failed: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Transport seam to the model provider. Implementations must be safe for
/// concurrent use across sessions.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete_structured(
        &self,
        model: &str,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn complete_text(&self, model: &str, prompt: &str) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personality_round_trip() {
        assert_eq!(Personality::from_name("bluffer"), Personality::Bluffer);
        assert_eq!(Personality::from_name("unknown"), Personality::Balanced);
        assert_eq!(Personality::Mathematical.as_str(), "mathematical");
    }

    #[test]
    fn test_decision_deserializes_from_schema_shape() {
        let decision: LlmDecision = serde_json::from_value(json!({
            "action": "RAISE",
            "amount": 60,
            "reasoning": "strong hand",
            "confidence": 0.8
        }))
        .unwrap();
        assert_eq!(decision.action, ActionKind::Raise);
        assert_eq!(decision.amount, Some(60));
    }

    #[test]
    fn test_unknown_action_token_is_rejected() {
        let result: Result<LlmDecision, _> = serde_json::from_value(json!({
            "action": "ALL_IN",
            "amount": 0,
            "reasoning": "shove",
            "confidence": 0.9
        }));
        assert!(result.is_err());
    }
}
