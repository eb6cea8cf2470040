//! Rule-based seat personalities.
//!
//! Each personality is a pure function of the decision context and the
//! session RNG. Proposals do not have to be legal; the validator downstream
//! maps them onto the legal set.

use crate::agent::evaluate::TablePosition;
use crate::agent::DecisionContext;
use crate::engine::{ActionKind, HandPhase, PlayerAction};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Call,
    Random,
    AggressiveRandom,
    Passive,
    Tight,
    Loose,
    Bluff,
    PositionAware,
}

impl RuleKind {
    pub const ALL: [RuleKind; 8] = [
        RuleKind::Call,
        RuleKind::Random,
        RuleKind::AggressiveRandom,
        RuleKind::Passive,
        RuleKind::Tight,
        RuleKind::Loose,
        RuleKind::Bluff,
        RuleKind::PositionAware,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "call" => Some(RuleKind::Call),
            "random" => Some(RuleKind::Random),
            "aggressive_random" => Some(RuleKind::AggressiveRandom),
            "passive" => Some(RuleKind::Passive),
            "tight" => Some(RuleKind::Tight),
            "loose" => Some(RuleKind::Loose),
            "bluff" => Some(RuleKind::Bluff),
            "position_aware" => Some(RuleKind::PositionAware),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Call => "call",
            RuleKind::Random => "random",
            RuleKind::AggressiveRandom => "aggressive_random",
            RuleKind::Passive => "passive",
            RuleKind::Tight => "tight",
            RuleKind::Loose => "loose",
            RuleKind::Bluff => "bluff",
            RuleKind::PositionAware => "position_aware",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RuleKind::Call => "Call Agent",
            RuleKind::Random => "Random Agent",
            RuleKind::AggressiveRandom => "Aggressive Agent",
            RuleKind::Passive => "Passive Agent",
            RuleKind::Tight => "Tight Agent",
            RuleKind::Loose => "Loose Agent",
            RuleKind::Bluff => "Bluff Agent",
            RuleKind::PositionAware => "Position Agent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleKind::Call => "Always calls or checks when possible",
            RuleKind::Random => "Makes random legal actions",
            RuleKind::AggressiveRandom => "Random actions but never folds",
            RuleKind::Passive => "Prefers passive play, folds to heavy pressure",
            RuleKind::Tight => "Folds weak hands, raises strong hands",
            RuleKind::Loose => "Plays many hands, calls frequently",
            RuleKind::Bluff => "Occasionally raises with weak hands",
            RuleKind::PositionAware => "Loosens up in late position",
        }
    }

    /// Decide the seat's proposed action.
    pub fn decide(&self, ctx: &DecisionContext, rng: &mut ChaCha20Rng) -> PlayerAction {
        match self {
            RuleKind::Call => call_policy(ctx),
            RuleKind::Random => random_policy(ctx, rng, true),
            RuleKind::AggressiveRandom => random_policy(ctx, rng, false),
            RuleKind::Passive => passive_policy(ctx),
            RuleKind::Tight => threshold_policy(ctx, 0.35, 0.6),
            RuleKind::Loose => loose_policy(ctx),
            RuleKind::Bluff => bluff_policy(ctx, rng),
            RuleKind::PositionAware => {
                let shift = if ctx.position == TablePosition::Late {
                    0.1
                } else {
                    0.0
                };
                threshold_policy(ctx, 0.35 - shift, 0.6 - shift)
            }
        }
    }
}

fn facing_bet(ctx: &DecisionContext) -> bool {
    ctx.chips_to_call > 0
}

fn call_policy(ctx: &DecisionContext) -> PlayerAction {
    if facing_bet(ctx) {
        PlayerAction::Call
    } else {
        PlayerAction::Check
    }
}

fn random_policy(ctx: &DecisionContext, rng: &mut ChaCha20Rng, allow_fold: bool) -> PlayerAction {
    let mut choices: Vec<ActionKind> = ctx
        .available
        .actions
        .iter()
        .copied()
        .filter(|kind| allow_fold || *kind != ActionKind::Fold)
        .collect();
    if choices.is_empty() {
        choices.push(ActionKind::Fold);
    }

    match choices.choose(rng) {
        Some(ActionKind::Raise) => {
            let (min, max) = ctx.available.raise_range.unwrap_or((ctx.big_blind, ctx.chips));
            PlayerAction::Raise(rng.gen_range(min..=max))
        }
        Some(ActionKind::Check) => PlayerAction::Check,
        Some(ActionKind::Call) => PlayerAction::Call,
        _ => PlayerAction::Fold,
    }
}

fn passive_policy(ctx: &DecisionContext) -> PlayerAction {
    if !facing_bet(ctx) {
        return PlayerAction::Check;
    }
    if ctx.chips > 0 && ctx.chips_to_call as f64 > 0.4 * ctx.chips as f64 {
        PlayerAction::Fold
    } else {
        PlayerAction::Call
    }
}

/// Shared tight-style policy: fold below `fold_below` when facing a bet,
/// call the middle band, raise to twice the minimum total above `raise_above`.
fn threshold_policy(ctx: &DecisionContext, fold_below: f64, raise_above: f64) -> PlayerAction {
    if ctx.hand_strength > raise_above {
        if let Some((min, max)) = ctx.available.raise_range {
            return PlayerAction::Raise((min * 2).min(max));
        }
    }
    if facing_bet(ctx) {
        if ctx.hand_strength < fold_below {
            PlayerAction::Fold
        } else {
            PlayerAction::Call
        }
    } else {
        PlayerAction::Check
    }
}

fn loose_policy(ctx: &DecisionContext) -> PlayerAction {
    if ctx.hand_strength >= 0.55 {
        if let Some((min, _)) = ctx.available.raise_range {
            return PlayerAction::Raise(min);
        }
    }
    if facing_bet(ctx) {
        if ctx.hand_strength >= 0.2 {
            PlayerAction::Call
        } else {
            PlayerAction::Fold
        }
    } else {
        PlayerAction::Check
    }
}

fn bluff_policy(ctx: &DecisionContext, rng: &mut ChaCha20Rng) -> PlayerAction {
    let bluff_street = matches!(ctx.phase, HandPhase::Flop | HandPhase::Turn);
    if bluff_street && rng.gen_bool(0.15) {
        if let Some((min, max)) = ctx.available.raise_range {
            // Small-to-medium sizing so the bluff stays cheap
            let cap = min + (max - min) / 2;
            return PlayerAction::Raise(rng.gen_range(min..=cap.max(min)));
        }
    }
    passive_policy(ctx)
}
