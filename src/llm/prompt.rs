//! Prompt assembly for LLM seats: a structured situation report plus the
//! seat's own action memory and a personality note.

use crate::agent::evaluate::TablePosition;
use crate::agent::DecisionContext;
use crate::engine::{ActionKind, Card};
use crate::llm::{HandMemory, Personality};
use std::fmt::Write;

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "None".to_string();
    }
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn position_description(position: TablePosition) -> &'static str {
    match position {
        TablePosition::Early => "Early Position",
        TablePosition::Middle => "Middle Position",
        TablePosition::Late => "Late Position (acts last)",
    }
}

fn personality_trait(personality: Personality) -> &'static str {
    match personality {
        Personality::Aggressive => {
            "You prefer aggressive play and look for opportunities to bet and raise."
        }
        Personality::Conservative => {
            "You play tight and only make moves with strong hands or good odds."
        }
        Personality::Balanced => "You play a balanced strategy, adapting to the situation.",
        Personality::Bluffer => {
            "You occasionally bluff and use deception as part of your strategy."
        }
        Personality::Mathematical => {
            "You focus heavily on pot odds, hand strength, and mathematical analysis."
        }
    }
}

fn personality_reminder(personality: Personality) -> &'static str {
    match personality {
        Personality::Aggressive => {
            "\n\nRemember: You're an aggressive player who likes to bet and raise to put pressure on opponents."
        }
        Personality::Conservative => {
            "\n\nRemember: You're a conservative player who only plays strong hands and folds when uncertain."
        }
        Personality::Bluffer => {
            "\n\nRemember: You're a strategic player who occasionally bluffs to keep opponents guessing."
        }
        Personality::Mathematical => {
            "\n\nRemember: You're a mathematical player who focuses on odds, probabilities, and expected value."
        }
        Personality::Balanced => "",
    }
}

fn memory_section(memory: &HandMemory) -> String {
    let mut out = String::from("\n=== MY PREVIOUS ACTIONS THIS HAND ===\n");
    if memory.is_empty() {
        out.push_str("No previous actions taken this hand.\n");
        return out;
    }

    for (i, record) in memory.records().iter().enumerate() {
        let reasoning = record.reasoning.as_deref().unwrap_or("No reasoning");
        let confidence = record.confidence.unwrap_or(0.5);
        match record.amount {
            Some(amount) => {
                let _ = writeln!(
                    out,
                    "{}. {:?}: {:?} {} chips (Confidence: {:.2})",
                    i + 1,
                    record.phase,
                    record.action,
                    amount,
                    confidence
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "{}. {:?}: {:?} (Confidence: {:.2})",
                    i + 1,
                    record.phase,
                    record.action,
                    confidence
                );
            }
        }
        let _ = writeln!(out, "   Reasoning: {}", reasoning);
    }
    out
}

fn opponent_section(ctx: &DecisionContext) -> String {
    let in_hand: Vec<String> = ctx
        .opponents
        .iter()
        .filter(|o| {
            matches!(
                o.state,
                crate::engine::SeatState::In
                    | crate::engine::SeatState::ToCall
                    | crate::engine::SeatState::AllIn
            )
        })
        .map(|o| format!("Player {} ({} chips, {:?})", o.seat, o.chips, o.state))
        .collect();

    if in_hand.is_empty() {
        "No opponents remaining".to_string()
    } else {
        format!("{} opponents: {}", in_hand.len(), in_hand.join(", "))
    }
}

/// Full per-personality decision prompt.
pub fn build_prompt(
    ctx: &DecisionContext,
    personality: Personality,
    memory: &HandMemory,
) -> String {
    let available: Vec<&str> = ctx
        .available
        .actions
        .iter()
        .map(|kind| match kind {
            ActionKind::Fold => "FOLD",
            ActionKind::Check => "CHECK",
            ActionKind::Call => "CALL",
            ActionKind::Raise => "RAISE",
        })
        .collect();

    let raise_info = match ctx.available.raise_range {
        Some((min, max)) => format!("Raise range: {} to {} chips (total for the street)", min, max),
        None => String::new(),
    };

    let pot_odds_line = match ctx.pot_odds {
        Some(odds) => format!("Pot Odds: {:.2} (lower = better odds)", odds),
        None => "Pot Odds: free to continue".to_string(),
    };

    format!(
        "POKER SITUATION ANALYSIS\n\
         \n\
         === GAME STATE ===\n\
         Phase: {:?}\n\
         Your Position: {}\n\
         Pot: {} chips\n\
         \n\
         === YOUR HAND ===\n\
         Hole Cards: {}\n\
         Board Cards: {}\n\
         Hand Strength: {:.2} (0.0 = weakest, 1.0 = strongest)\n\
         \n\
         === FINANCIAL SITUATION ===\n\
         Your Chips: {}\n\
         Chips to Call: {}\n\
         {}\n\
         {}\n\
         \n\
         === OPPONENTS ===\n\
         {}\n\
         {}\
         === AVAILABLE ACTIONS ===\n\
         {}\n\
         \n\
         === PLAYING STYLE ===\n\
         {}\n\
         \n\
         === DECISION REQUIRED ===\n\
         Based on this analysis, what action should you take? Consider:\n\
         1. Hand strength and pot odds\n\
         2. Position and opponent stacks\n\
         3. Your playing style and your previous actions this hand\n\
         \n\
         Provide your decision with reasoning and confidence level.{}",
        ctx.phase,
        position_description(ctx.position),
        ctx.pot_total,
        format_cards(&ctx.hole_cards),
        format_cards(&ctx.board),
        ctx.hand_strength,
        ctx.chips,
        ctx.chips_to_call,
        pot_odds_line,
        raise_info,
        opponent_section(ctx),
        memory_section(memory),
        available.join(", "),
        personality_trait(personality),
        personality_reminder(personality),
    )
}

/// Suffix appended for the text-mode retry so the reply is line-parseable.
pub fn text_mode_instructions() -> &'static str {
    "\n\nRespond with your decision in this exact format:\n\
     ACTION: [FOLD/CHECK/CALL/RAISE]\n\
     AMOUNT: [number if raising, otherwise null]\n\
     REASONING: [brief explanation]\n\
     CONFIDENCE: [0.0 to 1.0]"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game::AvailableMoves;
    use crate::engine::HandPhase;
    use crate::session::state::ActionRecord;

    fn ctx() -> DecisionContext {
        DecisionContext {
            seat: 0,
            phase: HandPhase::Flop,
            hole_cards: vec![Card::new(14, 3), Card::new(13, 3)],
            board: vec![Card::new(2, 0), Card::new(7, 1), Card::new(12, 3)],
            pot_total: 120,
            chips: 940,
            chips_to_call: 40,
            big_blind: 20,
            available: AvailableMoves {
                actions: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise],
                raise_range: Some((80, 940)),
            },
            hand_strength: 0.62,
            pot_odds: Some(0.25),
            position: TablePosition::Late,
            opponents: vec![],
        }
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let prompt = build_prompt(&ctx(), Personality::Aggressive, &HandMemory::new());
        assert!(prompt.contains("=== GAME STATE ==="));
        assert!(prompt.contains("A♠, K♠"));
        assert!(prompt.contains("Chips to Call: 40"));
        assert!(prompt.contains("Raise range: 80 to 940"));
        assert!(prompt.contains("FOLD, CALL, RAISE"));
        assert!(prompt.contains("aggressive player"));
        assert!(prompt.contains("No previous actions taken this hand."));
    }

    #[test]
    fn test_memory_appears_in_prompt() {
        let mut memory = HandMemory::new();
        memory.record(ActionRecord {
            player_id: 0,
            phase: HandPhase::PreFlop,
            action: ActionKind::Raise,
            amount: Some(60),
            reasoning: Some("premium pair".to_string()),
            confidence: Some(0.9),
            pot_before: 30,
            chips_remaining_after: 940,
        });

        let prompt = build_prompt(&ctx(), Personality::Balanced, &memory);
        assert!(prompt.contains("1. PreFlop: Raise 60 chips"));
        assert!(prompt.contains("premium pair"));
    }
}
