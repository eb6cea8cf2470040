//! Hand analysis helpers for agent decision-making.
//!
//! Pure read-throughs over the rules engine: hand strength, pot odds and
//! table position. Nothing here mutates game state.

use crate::engine::deck::Card;
use crate::engine::hand::evaluate_hand;
use crate::engine::HoldemGame;
use serde::{Deserialize, Serialize};

/// Percentile bands of the 7462 distinct 5-card ranks, per hand class
/// (high card through straight flush). A made hand's strength lands inside
/// its class band, interpolated by hole-card rank.
const CLASS_PERCENTILE: [(f64, f64); 9] = [
    (0.0000, 0.1712), // High Card
    (0.1712, 0.5544), // Pair
    (0.5544, 0.6694), // Two Pair
    (0.6694, 0.7844), // Three of a Kind
    (0.7844, 0.7857), // Straight
    (0.7857, 0.9568), // Flush
    (0.9568, 0.9778), // Full House
    (0.9778, 0.9987), // Four of a Kind
    (0.9987, 1.0000), // Straight Flush
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TablePosition {
    Early,
    Middle,
    Late,
}

/// Normalized hand strength in [0, 1] for a seat: starting-hand heuristic
/// before the flop, rank percentile at 5-card best afterwards.
pub fn hand_strength(game: &HoldemGame, seat: usize) -> f64 {
    let hole = game.hand_of(seat);
    let board = game.board();
    if hole.len() < 2 {
        return 0.0;
    }
    if board.is_empty() {
        return preflop_strength(hole);
    }

    let rank = evaluate_hand(hole, board);
    let (lo, hi) = CLASS_PERCENTILE[rank.rank_value as usize];
    let high_hole = hole.iter().map(|c| c.rank).max().unwrap_or(2);
    let frac = (high_hole as f64 - 2.0) / 12.0;
    (lo + (hi - lo) * frac).clamp(0.0, 1.0)
}

/// Quick preflop hand strength estimate (0.0..=1.0).
///
/// Based on starting hand categories: pairs, suited connectors, high cards.
pub fn preflop_strength(hole_cards: &[Card]) -> f64 {
    if hole_cards.len() < 2 {
        return 0.0;
    }

    let r1 = hole_cards[0].rank;
    let r2 = hole_cards[1].rank;
    let high = r1.max(r2);
    let low = r1.min(r2);
    let suited = hole_cards[0].suit == hole_cards[1].suit;
    let pair = r1 == r2;
    let gap = high - low;

    if pair {
        // Pairs: 22=0.50, ..., AA=0.95
        return 0.50 + (low as f64 - 2.0) * 0.0375;
    }

    let mut strength = 0.0;

    // Base from high card (14=Ace -> 0.40, 2 -> 0.08)
    strength += (high as f64 - 2.0) * 0.027 + 0.08;

    // Bonus for second card
    strength += (low as f64 - 2.0) * 0.012;

    if suited {
        strength += 0.06;
    }

    if gap == 1 {
        strength += 0.04;
    } else if gap == 2 {
        strength += 0.02;
    }

    strength.clamp(0.0, 0.90)
}

/// Cost of continuing as a fraction of the resulting pot:
/// `to_call / (pot + to_call)`. `None` when checking is free.
pub fn pot_odds(game: &HoldemGame, seat: usize) -> Option<f64> {
    let to_call = game.chips_to_call(seat);
    if to_call <= 0 {
        return None;
    }
    let pot = game.pot_total();
    Some(to_call as f64 / (pot + to_call) as f64)
}

/// Bucket a seat's position in the action order relative to the button.
pub fn table_position(game: &HoldemGame, seat: usize) -> TablePosition {
    let n = game.seat_count();
    if n <= 2 {
        return if seat == game.button() {
            TablePosition::Late
        } else {
            TablePosition::Early
        };
    }

    // Action order starts left of the button; the button acts last
    let order = (seat + n - 1 - game.button()) % n;
    let late_start = n - n.div_ceil(3);
    let early_end = n.div_ceil(3);

    if order >= late_start {
        TablePosition::Late
    } else if order < early_end {
        TablePosition::Early
    } else {
        TablePosition::Middle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlayerAction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_preflop_aces_strongest() {
        let aces = vec![Card::new(14, 0), Card::new(14, 1)]; // AA
        let deuces = vec![Card::new(2, 0), Card::new(2, 1)]; // 22
        let junk = vec![Card::new(2, 0), Card::new(7, 1)]; // 27o

        let aa = preflop_strength(&aces);
        let twos = preflop_strength(&deuces);
        let bad = preflop_strength(&junk);

        assert!(aa > twos, "AA ({}) should beat 22 ({})", aa, twos);
        assert!(twos > bad, "22 ({}) should beat 27o ({})", twos, bad);
        assert!(aa > 0.90, "AA should be > 0.90, got {}", aa);
    }

    #[test]
    fn test_preflop_suited_better_than_offsuit() {
        let suited = vec![Card::new(14, 0), Card::new(13, 0)]; // AKs
        let offsuit = vec![Card::new(14, 0), Card::new(13, 1)]; // AKo

        assert!(preflop_strength(&suited) > preflop_strength(&offsuit));
    }

    #[test]
    fn test_made_hand_classes_separate_cleanly() {
        let board = vec![Card::new(9, 2), Card::new(5, 2), Card::new(2, 2)];
        let flush = evaluate_hand(&[Card::new(14, 2), Card::new(7, 2)], &board);
        let pair = evaluate_hand(&[Card::new(9, 0), Card::new(7, 1)], &board);

        let (flush_lo, _) = CLASS_PERCENTILE[flush.rank_value as usize];
        let (_, pair_hi) = CLASS_PERCENTILE[pair.rank_value as usize];
        assert!(flush_lo > pair_hi);
    }

    #[test]
    fn test_strength_in_unit_interval_through_a_hand() {
        let mut game = HoldemGame::new(1000, 20, 10, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        game.start_hand(&mut rng).unwrap();

        while let Some(seat) = game.current_player() {
            let s = hand_strength(&game, seat);
            assert!((0.0..=1.0).contains(&s), "strength {} out of range", s);
            game.take_action(&PlayerAction::Call).unwrap();
            if game.hand_phase() == crate::engine::HandPhase::Flop {
                break;
            }
        }
    }

    #[test]
    fn test_pot_odds_formula() {
        let mut game = HoldemGame::new(1000, 20, 10, 2);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        game.start_hand(&mut rng).unwrap();

        // Button owes 10 into a 30 pot: 10 / (30 + 10)
        let seat = game.current_player().unwrap();
        assert_eq!(pot_odds(&game, seat), Some(0.25));

        // Nothing to call after matching
        game.take_action(&PlayerAction::Call).unwrap();
        let seat = game.current_player().unwrap();
        assert_eq!(pot_odds(&game, seat), None);
    }

    #[test]
    fn test_position_buckets() {
        let mut game = HoldemGame::new(1000, 20, 10, 6);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        game.start_hand(&mut rng).unwrap();

        let button = game.button();
        assert_eq!(table_position(&game, button), TablePosition::Late);
        // Small blind acts first after the flop
        let sb = (button + 1) % 6;
        assert_eq!(table_position(&game, sb), TablePosition::Early);
    }
}
