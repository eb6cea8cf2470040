//! The rules-engine seam: a self-contained no-limit Texas Hold'em hand
//! machine. The orchestration layer only talks to this type through the
//! methods below; swapping in another rules engine means re-implementing
//! this surface.
//!
//! Known quirk, preserved deliberately: a hand that ends because everyone
//! else folded credits the winner but leaves the pot totals standing. The
//! session layer reconciles this after every hand (see the orchestrator's
//! phantom-chip pass). Showdown-settled hands clear their pots here.

use crate::engine::deck::{Card, Deck};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::hand::{determine_winners, evaluate_hand, HandRank};
use crate::engine::player::{ActionKind, GamePlayer, PlayerAction, PlayerState, SeatState};
use crate::engine::pot::{Pot, PotManager};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandPhase {
    PreHand,
    PreFlop,
    Flop,
    Turn,
    River,
    Settle,
}

impl HandPhase {
    pub fn is_betting(&self) -> bool {
        matches!(
            self,
            HandPhase::PreFlop | HandPhase::Flop | HandPhase::Turn | HandPhase::River
        )
    }
}

/// Legal action set and concrete raise totals for the seat to act.
#[derive(Debug, Clone, Default)]
pub struct AvailableMoves {
    pub actions: Vec<ActionKind>,
    /// Inclusive `[min_total, max_total]` street totals when raising is legal.
    pub raise_range: Option<(i64, i64)>,
}

impl AvailableMoves {
    pub fn allows(&self, kind: ActionKind) -> bool {
        self.actions.contains(&kind)
    }
}

#[derive(Debug, Clone)]
pub struct HoldemGame {
    buyin: i64,
    small_blind: i64,
    big_blind: i64,
    players: Vec<GamePlayer>,
    deck: Deck,
    board: Vec<Card>,
    pot: PotManager,
    phase: HandPhase,
    button: usize,
    current: usize,
    current_bet: i64,
    /// Size of the last raise; the minimum legal increment for the next one.
    min_raise_step: i64,
    hand_running: bool,
    hands_dealt: u32,
}

impl HoldemGame {
    pub fn new(buyin: i64, big_blind: i64, small_blind: i64, max_players: usize) -> Self {
        let players = (0..max_players).map(|_| GamePlayer::new(buyin)).collect();
        Self {
            buyin,
            small_blind,
            big_blind,
            players,
            deck: Deck::new(),
            board: Vec::new(),
            pot: PotManager::new(),
            phase: HandPhase::PreHand,
            button: 0,
            current: 0,
            current_bet: 0,
            min_raise_step: big_blind,
            hand_running: false,
            hands_dealt: 0,
        }
    }

    // --- contract queries -------------------------------------------------

    /// True while the table is solvent (at least two stacks with chips).
    pub fn is_game_running(&self) -> bool {
        self.players.iter().filter(|p| p.chips > 0).count() >= 2
    }

    pub fn is_hand_running(&self) -> bool {
        self.hand_running
    }

    pub fn hand_phase(&self) -> HandPhase {
        self.phase
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn hand_of(&self, seat: usize) -> &[Card] {
        &self.players[seat].hole_cards
    }

    pub fn chips(&self, seat: usize) -> i64 {
        self.players[seat].chips
    }

    pub fn seat_count(&self) -> usize {
        self.players.len()
    }

    pub fn buyin(&self) -> i64 {
        self.buyin
    }

    pub fn big_blind(&self) -> i64 {
        self.big_blind
    }

    pub fn small_blind(&self) -> i64 {
        self.small_blind
    }

    pub fn button(&self) -> usize {
        self.button
    }

    pub fn current_bet(&self) -> i64 {
        self.current_bet
    }

    /// Current pot layering: one pot per distinct commitment level, with
    /// folded seats funding but never winning.
    pub fn pots(&self) -> Vec<Pot> {
        self.pot.pots_view(|seat| self.players[seat].in_hand())
    }

    pub fn pot_total(&self) -> i64 {
        self.pot.total()
    }

    /// Seat id with a decision pending; defined during betting phases.
    pub fn current_player(&self) -> Option<usize> {
        if self.hand_running
            && self.phase.is_betting()
            && self.players.get(self.current).map(|p| p.can_act()) == Some(true)
        {
            Some(self.current)
        } else {
            None
        }
    }

    pub fn chips_to_call(&self, seat: usize) -> i64 {
        (self.current_bet - self.players[seat].street_bet).max(0)
    }

    /// Advisory minimum raise *increment*. Diverges from the enforced raise
    /// totals in `available_moves`; callers validating raises must use the
    /// range, not this value.
    pub fn min_raise(&self) -> i64 {
        self.min_raise_step
    }

    pub fn seat_state(&self, seat: usize) -> SeatState {
        let p = &self.players[seat];
        match p.state {
            PlayerState::Out => SeatState::Skip,
            PlayerState::Folded => SeatState::Folded,
            PlayerState::AllIn => SeatState::AllIn,
            PlayerState::Active => {
                if self.hand_running && self.chips_to_call(seat) > 0 {
                    SeatState::ToCall
                } else {
                    SeatState::In
                }
            }
        }
    }

    pub fn available_moves(&self) -> AvailableMoves {
        let Some(seat) = self.current_player() else {
            return AvailableMoves::default();
        };
        let p = &self.players[seat];
        let to_call = self.chips_to_call(seat);

        let mut moves = AvailableMoves {
            actions: vec![ActionKind::Fold],
            raise_range: None,
        };
        if to_call == 0 {
            moves.actions.push(ActionKind::Check);
        } else {
            moves.actions.push(ActionKind::Call);
        }

        // A raise must put in more than a call; the totals are street totals.
        let max_total = p.street_bet + p.chips;
        if max_total > self.current_bet {
            let mut min_total = self.current_bet + self.min_raise_step;
            if min_total > max_total {
                // Short stack: the only legal raise is the full-stack total
                min_total = max_total;
            }
            moves.actions.push(ActionKind::Raise);
            moves.raise_range = Some((min_total, max_total));
        }

        moves
    }

    pub fn validate_move(&self, seat: usize, action: &PlayerAction) -> bool {
        if self.current_player() != Some(seat) {
            return false;
        }
        let moves = self.available_moves();
        match action {
            PlayerAction::Raise(total) => match moves.raise_range {
                Some((min, max)) => *total >= min && *total <= max,
                None => false,
            },
            other => moves.allows(other.kind()),
        }
    }

    // --- hand lifecycle ---------------------------------------------------

    /// Deals hole cards, posts blinds and enters PreFlop.
    pub fn start_hand(&mut self, rng: &mut ChaCha20Rng) -> EngineResult<()> {
        if self.hand_running {
            return Err(EngineError::HandInProgress);
        }
        if !self.is_game_running() {
            return Err(EngineError::NotEnoughPlayers);
        }

        self.phase = HandPhase::PreHand;
        for player in &mut self.players {
            player.reset_for_hand();
        }
        self.board.clear();
        self.pot.reset();
        self.deck.reset_and_shuffle(rng);
        self.current_bet = 0;
        self.min_raise_step = self.big_blind;

        self.button = if self.hands_dealt == 0 {
            self.first_seat(|p| p.can_act())
                .ok_or(EngineError::NotEnoughPlayers)?
        } else {
            self.next_seat(self.button, |p| p.can_act())
                .ok_or(EngineError::NotEnoughPlayers)?
        };

        self.post_blinds();
        self.deal_hole_cards();

        // A blind can consume a whole stack; the turn must start on a seat
        // that can still act.
        if !self.players[self.current].can_act() {
            if let Some(next) = self.next_seat(self.current, |p| p.can_act()) {
                self.current = next;
            }
        }

        self.hands_dealt += 1;
        self.hand_running = true;
        self.phase = HandPhase::PreFlop;

        tracing::info!(
            hand = self.hands_dealt,
            button = self.button,
            "hand started"
        );

        // Blinds can consume entire stacks; with no decision left, run the
        // board out immediately.
        if self.betting_round_complete() {
            self.advance_phase();
        }
        Ok(())
    }

    fn post_blinds(&mut self) {
        let live = self.players.iter().filter(|p| p.can_act()).count();

        let (sb_seat, bb_seat) = if live == 2 {
            // Heads-up: the button posts the small blind and acts first
            let sb = self.button;
            let bb = self.next_seat(sb, |p| p.can_act()).unwrap_or(sb);
            (sb, bb)
        } else {
            let sb = self.next_seat(self.button, |p| p.can_act()).unwrap_or(self.button);
            let bb = self.next_seat(sb, |p| p.can_act()).unwrap_or(sb);
            (sb, bb)
        };

        let sb_amount = self.players[sb_seat].place_bet(self.small_blind);
        self.pot.stake(sb_seat, sb_amount);
        let bb_amount = self.players[bb_seat].place_bet(self.big_blind);
        self.pot.stake(bb_seat, bb_amount);

        // Everyone owes the full big blind even when the blind went in short
        self.current_bet = self.big_blind;

        self.current = if live == 2 {
            sb_seat
        } else {
            self.next_seat(bb_seat, |p| p.can_act()).unwrap_or(bb_seat)
        };

        tracing::debug!(
            sb_seat,
            sb_amount,
            bb_seat,
            bb_amount,
            first_to_act = self.current,
            "blinds posted"
        );
    }

    fn deal_hole_cards(&mut self) {
        // All-in blinds still contest the hand and get cards
        for seat in 0..self.players.len() {
            if self.players[seat].in_hand() {
                let cards = self.deck.deal_multiple(2);
                self.players[seat].hole_cards = cards;
            }
        }
    }

    /// Applies the current player's action; may advance phase through to
    /// Settle.
    pub fn take_action(&mut self, action: &PlayerAction) -> EngineResult<()> {
        let seat = self
            .current_player()
            .ok_or(EngineError::HandNotRunning)?;
        if !self.players[seat].can_act() {
            return Err(EngineError::CannotAct { seat });
        }

        match action {
            PlayerAction::Fold => {
                self.players[seat].fold();
            }
            PlayerAction::Check => {
                if self.chips_to_call(seat) > 0 {
                    return Err(EngineError::CannotCheck {
                        current_bet: self.current_bet,
                    });
                }
            }
            PlayerAction::Call => {
                let to_call = self.chips_to_call(seat);
                let actual = self.players[seat].place_bet(to_call);
                self.pot.stake(seat, actual);
            }
            PlayerAction::Raise(total) => {
                let moves = self.available_moves();
                let (min, max) = moves.raise_range.ok_or(EngineError::RaiseUnavailable)?;
                if *total < min || *total > max {
                    return Err(EngineError::RaiseOutOfRange {
                        min,
                        max,
                        attempted: *total,
                    });
                }

                let add = total - self.players[seat].street_bet;
                let actual = self.players[seat].place_bet(add);
                self.pot.stake(seat, actual);

                let new_total = self.players[seat].street_bet;
                if new_total > self.current_bet {
                    self.min_raise_step = (new_total - self.current_bet).max(self.big_blind);
                    self.current_bet = new_total;
                    // A fresh bet level: everyone else gets to act again
                    for (idx, player) in self.players.iter_mut().enumerate() {
                        if idx != seat {
                            player.has_acted = false;
                        }
                    }
                }
            }
        }

        self.players[seat].has_acted = true;
        tracing::debug!(seat, ?action, phase = ?self.phase, "action applied");
        self.advance_turn();
        Ok(())
    }

    fn advance_turn(&mut self) {
        if self.contesting_count() == 1 {
            self.settle_fold_win();
            return;
        }

        if self.betting_round_complete() {
            self.advance_phase();
        } else if let Some(next) = self.next_seat(self.current, |p| p.can_act()) {
            self.current = next;
        } else {
            // Nobody left to act on this street
            self.advance_phase();
        }
    }

    fn betting_round_complete(&self) -> bool {
        let actors: Vec<&GamePlayer> = self.players.iter().filter(|p| p.can_act()).collect();
        if actors.is_empty() {
            return true;
        }
        let all_acted = actors.iter().all(|p| p.has_acted);
        let all_matched = actors.iter().all(|p| p.street_bet == self.current_bet);
        all_acted && all_matched
    }

    fn advance_phase(&mut self) {
        for player in &mut self.players {
            player.reset_for_street();
        }
        self.current_bet = 0;
        self.min_raise_step = self.big_blind;

        match self.phase {
            HandPhase::PreFlop => {
                self.deck.deal(); // burn
                let flop = self.deck.deal_multiple(3);
                self.board.extend(flop);
                self.phase = HandPhase::Flop;
            }
            HandPhase::Flop => {
                self.deck.deal(); // burn
                if let Some(card) = self.deck.deal() {
                    self.board.push(card);
                }
                self.phase = HandPhase::Turn;
            }
            HandPhase::Turn => {
                self.deck.deal(); // burn
                if let Some(card) = self.deck.deal() {
                    self.board.push(card);
                }
                self.phase = HandPhase::River;
            }
            HandPhase::River => {
                self.settle_showdown();
                return;
            }
            _ => return,
        }

        self.current = self
            .next_seat(self.button, |p| p.can_act())
            .unwrap_or(self.button);

        // With fewer than two seats able to act there is no betting left;
        // run the remaining streets straight to settle.
        if self.players.iter().filter(|p| p.can_act()).count() < 2 {
            self.advance_phase();
        }
    }

    /// Everyone else folded: the pot is credited to the last contender but
    /// the pot totals are left standing (the phantom-chip quirk).
    fn settle_fold_win(&mut self) {
        let winner = self
            .players
            .iter()
            .position(|p| p.in_hand())
            .unwrap_or(self.current);
        let total = self.pot.total();
        self.players[winner].chips += total;

        self.phase = HandPhase::Settle;
        self.hand_running = false;
        tracing::info!(winner, total, "hand won uncontested");
    }

    fn settle_showdown(&mut self) {
        let pots = self.pots();
        let hands: Vec<(usize, HandRank)> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand())
            .map(|(idx, p)| (idx, evaluate_hand(&p.hole_cards, &self.board)))
            .collect();

        for pot in &pots {
            let eligible_hands: Vec<(usize, HandRank)> = hands
                .iter()
                .filter(|(idx, _)| pot.eligible_players.contains(idx))
                .cloned()
                .collect();
            let winners = determine_winners(eligible_hands);
            if winners.is_empty() {
                continue;
            }

            let share = pot.amount / winners.len() as i64;
            let odd_chips = pot.amount % winners.len() as i64;
            for (i, &seat) in winners.iter().enumerate() {
                // The odd chip goes to the first winner in seat order
                let amount = share + if i == 0 { odd_chips } else { 0 };
                self.players[seat].chips += amount;
                tracing::info!(seat, amount, "showdown payout");
            }
        }

        // Showdown settles cleanly; only fold-wins leave residue
        self.pot.mark_paid();
        self.phase = HandPhase::Settle;
        self.hand_running = false;
    }

    /// Zero any pot totals left standing after a completed hand. Returns the
    /// number of phantom chips cleared; zero while a hand is running.
    pub fn clear_phantom_chips(&mut self) -> i64 {
        if self.hand_running {
            return 0;
        }
        self.pot.clear_residue()
    }

    // --- seat iteration helpers -------------------------------------------

    fn contesting_count(&self) -> usize {
        self.players.iter().filter(|p| p.in_hand()).count()
    }

    fn first_seat<F>(&self, mut eligible: F) -> Option<usize>
    where
        F: FnMut(&GamePlayer) -> bool,
    {
        (0..self.players.len()).find(|&seat| eligible(&self.players[seat]))
    }

    fn next_seat<F>(&self, after: usize, mut eligible: F) -> Option<usize>
    where
        F: FnMut(&GamePlayer) -> bool,
    {
        let n = self.players.len();
        (1..=n)
            .map(|offset| (after + offset) % n)
            .find(|&seat| eligible(&self.players[seat]))
    }
}
