//! Decision pipeline for LLM seats: structured completion first, one
//! text-mode retry, then strict parsing into a concrete action proposal.

use crate::agent::DecisionContext;
use crate::engine::{ActionKind, PlayerAction};
use crate::llm::prompt::{build_prompt, text_mode_instructions};
use crate::llm::{decision_schema, GatewayError, HandMemory, LlmDecision, LlmGateway, Personality};
use std::fmt;
use std::time::Duration;

/// What the pipeline hands back to the orchestrator on success.
#[derive(Debug, Clone)]
pub struct LlmOutcome {
    pub action: PlayerAction,
    pub reasoning: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub enum PipelineError {
    Gateway(GatewayError),
    Parse(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Gateway(err) => write!(f, "{}", err),
            PipelineError::Parse(msg) => write!(f, "unparseable decision: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Running totals for one LLM seat, kept across hands.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionStats {
    pub decisions: u64,
    pub total_latency: Duration,
}

impl DecisionStats {
    pub fn record(&mut self, latency: Duration) {
        self.decisions += 1;
        self.total_latency += latency;
    }

    pub fn average_latency(&self) -> Duration {
        if self.decisions == 0 {
            Duration::ZERO
        } else {
            self.total_latency / self.decisions as u32
        }
    }
}

/// Drive the gateway for one decision. The returned action is a proposal;
/// the validator downstream maps it onto the legal set, and memory is
/// appended by the caller only after the action is applied.
pub async fn decide(
    gateway: &dyn LlmGateway,
    model: &str,
    personality: Personality,
    ctx: &DecisionContext,
    memory: &HandMemory,
) -> Result<LlmOutcome, PipelineError> {
    let prompt = build_prompt(ctx, personality, memory);
    let schema = decision_schema();

    let decision = match gateway.complete_structured(model, &prompt, &schema).await {
        Ok(value) => match serde_json::from_value::<LlmDecision>(value) {
            Ok(decision) if (0.0..=1.0).contains(&decision.confidence) => Some(decision),
            Ok(_) | Err(_) => None,
        },
        Err(GatewayError::Unsupported) => None,
        Err(err) => {
            tracing::warn!(model, %err, "structured completion failed, retrying as text");
            None
        }
    };

    let decision = match decision {
        Some(decision) => decision,
        None => {
            let text_prompt = format!("{}{}", prompt, text_mode_instructions());
            let content = gateway
                .complete_text(model, &text_prompt)
                .await
                .map_err(PipelineError::Gateway)?;
            parse_text_response(&content)?
        }
    };

    Ok(into_outcome(decision, ctx))
}

fn into_outcome(decision: LlmDecision, ctx: &DecisionContext) -> LlmOutcome {
    let action = match decision.action {
        ActionKind::Fold => PlayerAction::Fold,
        ActionKind::Check => PlayerAction::Check,
        ActionKind::Call => PlayerAction::Call,
        ActionKind::Raise => {
            let amount = decision
                .amount
                .filter(|a| *a > 0)
                .unwrap_or_else(|| ctx.available.raise_range.map(|(min, _)| min).unwrap_or(0));
            PlayerAction::Raise(rewrite_delta_amount(amount, ctx))
        }
    };

    LlmOutcome {
        action,
        reasoning: decision.reasoning,
        confidence: decision.confidence.clamp(0.0, 1.0),
    }
}

/// Models sometimes answer with the raise-by delta instead of the street
/// total. An amount below the call price cannot be a total, so it is read
/// as a delta on top of the call.
fn rewrite_delta_amount(amount: i64, ctx: &DecisionContext) -> i64 {
    if ctx.chips_to_call > 0 && amount < ctx.chips_to_call {
        ctx.chips_to_call + amount
    } else {
        amount
    }
}

/// Parse the line-oriented text fallback. An ACTION line with one of the
/// four known tokens is mandatory; everything else has defaults.
pub fn parse_text_response(content: &str) -> Result<LlmDecision, PipelineError> {
    let mut action: Option<ActionKind> = None;
    let mut amount: Option<i64> = None;
    let mut reasoning = String::new();
    let mut confidence = 0.5f64;

    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("ACTION:") {
            action = match rest.trim().to_uppercase().as_str() {
                "FOLD" => Some(ActionKind::Fold),
                "CHECK" => Some(ActionKind::Check),
                "CALL" => Some(ActionKind::Call),
                "RAISE" => Some(ActionKind::Raise),
                other => {
                    return Err(PipelineError::Parse(format!(
                        "unknown action token '{}'",
                        other
                    )))
                }
            };
        } else if let Some(rest) = line.strip_prefix("AMOUNT:") {
            let value = rest.trim();
            if !value.is_empty() && !value.eq_ignore_ascii_case("null") {
                amount = value.parse().ok();
            }
        } else if let Some(rest) = line.strip_prefix("REASONING:") {
            reasoning = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            if let Ok(value) = rest.trim().parse::<f64>() {
                confidence = value;
            }
        }
    }

    let action = action.ok_or_else(|| PipelineError::Parse("no ACTION line".to_string()))?;
    if reasoning.is_empty() {
        reasoning = "No reasoning provided".to_string();
    }

    Ok(LlmDecision {
        action,
        amount,
        reasoning,
        confidence: confidence.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::evaluate::TablePosition;
    use crate::engine::game::AvailableMoves;
    use crate::engine::{Card, HandPhase};
    use async_trait::async_trait;
    use serde_json::json;

    fn ctx(to_call: i64) -> DecisionContext {
        DecisionContext {
            seat: 0,
            phase: HandPhase::PreFlop,
            hole_cards: vec![Card::new(14, 0), Card::new(14, 1)],
            board: vec![],
            pot_total: 60,
            chips: 960,
            chips_to_call: to_call,
            big_blind: 20,
            available: AvailableMoves {
                actions: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise],
                raise_range: Some((80, 960)),
            },
            hand_strength: 0.95,
            pot_odds: None,
            position: TablePosition::Middle,
            opponents: vec![],
        }
    }

    struct StructuredOnly(serde_json::Value);

    #[async_trait]
    impl LlmGateway for StructuredOnly {
        async fn complete_structured(
            &self,
            _model: &str,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, GatewayError> {
            Ok(self.0.clone())
        }

        async fn complete_text(&self, _model: &str, _prompt: &str) -> Result<String, GatewayError> {
            Err(GatewayError::Failed("text not expected".into()))
        }
    }

    struct TextOnly(String);

    #[async_trait]
    impl LlmGateway for TextOnly {
        async fn complete_structured(
            &self,
            _model: &str,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, GatewayError> {
            Err(GatewayError::Unsupported)
        }

        async fn complete_text(&self, _model: &str, _prompt: &str) -> Result<String, GatewayError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_structured_decision_parsed() {
        let gateway = StructuredOnly(json!({
            "action": "RAISE",
            "amount": 120,
            "reasoning": "value bet",
            "confidence": 0.85
        }));
        let outcome = decide(
            &gateway,
            "model",
            Personality::Balanced,
            &ctx(40),
            &HandMemory::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, PlayerAction::Raise(120));
        assert_eq!(outcome.reasoning, "value bet");
    }

    #[tokio::test]
    async fn test_delta_amount_rewritten_to_total() {
        // 20 is below the 40 call price, so it reads as "raise by 20"
        let gateway = StructuredOnly(json!({
            "action": "RAISE",
            "amount": 20,
            "reasoning": "small raise",
            "confidence": 0.6
        }));
        let outcome = decide(
            &gateway,
            "model",
            Personality::Balanced,
            &ctx(40),
            &HandMemory::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, PlayerAction::Raise(60));
    }

    #[tokio::test]
    async fn test_text_fallback_on_unsupported() {
        let gateway = TextOnly(
            "ACTION: CALL\nAMOUNT: null\nREASONING: pot odds are fine\nCONFIDENCE: 0.7"
                .to_string(),
        );
        let outcome = decide(
            &gateway,
            "model",
            Personality::Balanced,
            &ctx(40),
            &HandMemory::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, PlayerAction::Call);
        assert_eq!(outcome.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_unknown_token_is_parse_failure() {
        let gateway = TextOnly("ACTION: SHOVE\nREASONING: yolo\nCONFIDENCE: 1.0".to_string());
        let err = decide(
            &gateway,
            "model",
            Personality::Balanced,
            &ctx(40),
            &HandMemory::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn test_raise_without_amount_uses_range_minimum() {
        let gateway = StructuredOnly(json!({
            "action": "RAISE",
            "amount": 0,
            "reasoning": "raise it",
            "confidence": 0.5
        }));
        let outcome = decide(
            &gateway,
            "model",
            Personality::Balanced,
            &ctx(40),
            &HandMemory::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, PlayerAction::Raise(80));
    }

    #[test]
    fn test_parse_text_requires_action_line() {
        let err = parse_text_response("REASONING: thinking...\nCONFIDENCE: 0.4").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = DecisionStats::default();
        stats.record(Duration::from_millis(100));
        stats.record(Duration::from_millis(300));
        assert_eq!(stats.decisions, 2);
        assert_eq!(stats.average_latency(), Duration::from_millis(200));
    }
}
