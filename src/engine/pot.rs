//! Chip accounting for one hand.
//!
//! The manager keeps a commitment ledger (seat -> chips pushed across the
//! line this hand) plus the amount still standing on the table. Pots are
//! never stored: they are layered views derived from the ledger on demand,
//! which keeps side pots and mid-hand previews consistent by construction.
//! A showdown settlement marks the table clear; a fold-win deliberately
//! does not, so the leftover standing amount is observable and correctable
//! as phantom chips.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pot {
    pub amount: i64,
    pub eligible_players: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PotManager {
    committed: BTreeMap<usize, i64>,
    standing: i64,
}

impl PotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record chips a seat has pushed across the line.
    pub fn stake(&mut self, seat: usize, amount: i64) {
        if amount <= 0 {
            return;
        }
        *self.committed.entry(seat).or_insert(0) += amount;
        self.standing += amount;
    }

    /// Chips still sitting on the table.
    pub fn total(&self) -> i64 {
        self.standing
    }

    pub fn committed_by(&self, seat: usize) -> i64 {
        self.committed.get(&seat).copied().unwrap_or(0)
    }

    /// Layer the ledger into pots. Each pass peels the smallest remaining
    /// commitment from every contributor, so an all-in seat caps what it
    /// can win at its own level. Seats the predicate rejects (folded) fund
    /// a layer without being able to win it, and adjacent layers with the
    /// same winner set collapse into one pot.
    pub fn pots_view<F>(&self, mut contesting: F) -> Vec<Pot>
    where
        F: FnMut(usize) -> bool,
    {
        if self.standing == 0 {
            return Vec::new();
        }

        let mut remaining: BTreeMap<usize, i64> = self
            .committed
            .iter()
            .filter(|(_, &chips)| chips > 0)
            .map(|(&seat, &chips)| (seat, chips))
            .collect();
        let mut layers: Vec<Pot> = Vec::new();

        while let Some(&slice) = remaining.values().min() {
            let amount = slice * remaining.len() as i64;
            let eligible: Vec<usize> = remaining
                .keys()
                .copied()
                .filter(|&seat| contesting(seat))
                .collect();

            match layers.last_mut() {
                // A layer funded only by folders has no winner of its own;
                // it rides on the pot below it
                Some(last) if last.eligible_players == eligible || eligible.is_empty() => {
                    last.amount += amount;
                }
                _ => layers.push(Pot {
                    amount,
                    eligible_players: eligible,
                }),
            }

            for chips in remaining.values_mut() {
                *chips -= slice;
            }
            remaining.retain(|_, chips| *chips > 0);
        }

        layers
    }

    /// A settlement paid every pot out; nothing is left on the table.
    pub fn mark_paid(&mut self) {
        self.standing = 0;
    }

    /// Zero whatever is still standing, returning the cleared amount. This
    /// is the correction hook for fold-terminated hands, which credit the
    /// winner without clearing the table.
    pub fn clear_residue(&mut self) -> i64 {
        std::mem::take(&mut self.standing)
    }

    /// Fresh ledger for the next hand.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.standing = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn everyone(_: usize) -> bool {
        true
    }

    #[test]
    fn test_stake_builds_the_ledger() {
        let mut pot = PotManager::new();
        pot.stake(1, 10); // small blind
        pot.stake(2, 20); // big blind
        pot.stake(0, 20); // call
        pot.stake(1, 10); // complete

        assert_eq!(pot.total(), 60);
        assert_eq!(pot.committed_by(1), 20);
        assert_eq!(pot.committed_by(5), 0);
    }

    #[test]
    fn test_matched_bets_form_one_pot() {
        let mut pot = PotManager::new();
        for seat in 0..3 {
            pot.stake(seat, 60);
        }

        let pots = pot.pots_view(everyone);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 180);
        assert_eq!(pots[0].eligible_players, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_all_in_caps_its_layer() {
        let mut pot = PotManager::new();
        pot.stake(0, 200);
        pot.stake(1, 200);
        pot.stake(2, 75); // all-in short

        let pots = pot.pots_view(everyone);
        assert_eq!(
            pots,
            vec![
                Pot {
                    amount: 225,
                    eligible_players: vec![0, 1, 2],
                },
                Pot {
                    amount: 250,
                    eligible_players: vec![0, 1],
                },
            ]
        );
    }

    #[test]
    fn test_folded_chips_stay_in_but_cannot_win() {
        let mut pot = PotManager::new();
        pot.stake(0, 100);
        pot.stake(1, 100);
        pot.stake(2, 40); // folded after betting the flop

        let pots = pot.pots_view(|seat| seat != 2);
        // The folder's layer collapses into the main pot: same winner set
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 240);
        assert_eq!(pots[0].eligible_players, vec![0, 1]);
    }

    #[test]
    fn test_all_in_ladder_builds_one_layer_per_level() {
        let mut pot = PotManager::new();
        pot.stake(0, 100);
        pot.stake(1, 300);
        pot.stake(2, 800);

        let pots = pot.pots_view(everyone);
        assert_eq!(pots.len(), 3);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible_players, vec![0, 1, 2]);
        assert_eq!(pots[1].amount, 400);
        assert_eq!(pots[1].eligible_players, vec![1, 2]);
        assert_eq!(pots[2].amount, 500);
        assert_eq!(pots[2].eligible_players, vec![2]);

        let layered: i64 = pots.iter().map(|p| p.amount).sum();
        assert_eq!(layered, pot.total());
    }

    #[test]
    fn test_uncalled_overbet_refunds_through_its_own_layer() {
        let mut pot = PotManager::new();
        pot.stake(0, 500); // bets 500
        pot.stake(1, 200); // all-in call for less

        let pots = pot.pots_view(everyone);
        // The 300 nobody matched sits in a layer only the bettor can take
        assert_eq!(pots[1].amount, 300);
        assert_eq!(pots[1].eligible_players, vec![0]);
    }

    #[test]
    fn test_showdown_clears_but_fold_win_leaves_residue() {
        let mut showdown = PotManager::new();
        showdown.stake(0, 50);
        showdown.stake(1, 50);
        showdown.mark_paid();
        assert_eq!(showdown.total(), 0);
        assert!(showdown.pots_view(everyone).is_empty());

        let mut fold_win = PotManager::new();
        fold_win.stake(0, 10);
        fold_win.stake(1, 20);
        // No settlement ran: the table still shows 30 phantom chips
        assert_eq!(fold_win.total(), 30);
        assert_eq!(fold_win.clear_residue(), 30);
        assert_eq!(fold_win.total(), 0);
        assert_eq!(fold_win.clear_residue(), 0);
    }

    #[test]
    fn test_reset_starts_a_new_ledger() {
        let mut pot = PotManager::new();
        pot.stake(0, 75);
        pot.reset();

        assert_eq!(pot.total(), 0);
        assert_eq!(pot.committed_by(0), 0);
        assert!(pot.pots_view(everyone).is_empty());
    }

    #[test]
    fn test_layers_conserve_the_ledger() {
        let mut pot = PotManager::new();
        let stakes = [(0, 35), (1, 120), (2, 120), (3, 88), (4, 11)];
        for (seat, chips) in stakes {
            pot.stake(seat, chips);
        }

        // Seats 0 and 4 folded somewhere along the way
        let pots = pot.pots_view(|seat| seat != 0 && seat != 4);
        let layered: i64 = pots.iter().map(|p| p.amount).sum();
        assert_eq!(layered, pot.total());
        for p in &pots {
            assert!(!p.eligible_players.contains(&0));
            assert!(!p.eligible_players.contains(&4));
        }
    }
}
