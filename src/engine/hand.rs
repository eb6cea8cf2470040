use crate::engine::deck::Card;
use rs_poker::core::{Hand, Rankable};

/// Ranked hand: the coarse class plus the full rs_poker rank for
/// kicker-aware ordering at showdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandRank {
    pub rank_value: i32,
    pub description: &'static str,
    rank: rs_poker::core::Rank,
}

impl HandRank {
    pub fn from_hand(hand: &Hand) -> Self {
        use rs_poker::core::Rank as RsRank;

        let rs_rank = hand.rank();
        let (rank_value, description) = match rs_rank {
            RsRank::HighCard(_) => (0, "High Card"),
            RsRank::OnePair(_) => (1, "Pair"),
            RsRank::TwoPair(_) => (2, "Two Pair"),
            RsRank::ThreeOfAKind(_) => (3, "Three of a Kind"),
            RsRank::Straight(_) => (4, "Straight"),
            RsRank::Flush(_) => (5, "Flush"),
            RsRank::FullHouse(_) => (6, "Full House"),
            RsRank::FourOfAKind(_) => (7, "Four of a Kind"),
            RsRank::StraightFlush(_) => (8, "Straight Flush"),
        };

        Self {
            rank_value,
            description,
            rank: rs_rank,
        }
    }
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // rs_poker ranks encode class and kickers, so ties are true ties
        self.rank.cmp(&other.rank)
    }
}

/// Evaluates the best 5-card hand from a player's hole cards and community cards
pub fn evaluate_hand(hole_cards: &[Card], community_cards: &[Card]) -> HandRank {
    let mut all_cards = Vec::new();
    all_cards.extend(hole_cards.iter().map(|c| c.to_rs_poker()));
    all_cards.extend(community_cards.iter().map(|c| c.to_rs_poker()));

    let hand = Hand::new_with_cards(all_cards);
    HandRank::from_hand(&hand)
}

/// Determines the winner(s) from multiple hands
/// Returns indices of winning players
pub fn determine_winners(hands: Vec<(usize, HandRank)>) -> Vec<usize> {
    if hands.is_empty() {
        return vec![];
    }

    let best_rank = hands.iter().map(|(_, rank)| rank).max().unwrap().clone();

    // Return all players with the best hand (handles ties)
    hands
        .into_iter()
        .filter(move |(_, rank)| rank == &best_rank)
        .map(|(idx, _)| idx)
        .collect()
}
