//! The per-table driver: hand lifecycle, turn dispatch, pot reconciliation
//! and event emission.
//!
//! One spawned task drives each session. Every mutation happens behind the
//! session lock, and the lock is released across every external wait: LLM
//! completions, human mailbox reads and their timeouts.

use crate::agent::{AgentKind, DecisionContext};
use crate::agent::evaluate::hand_strength;
use crate::config::GameConfig;
use crate::engine::{HandPhase, HoldemGame, PlayerAction, SeatState};
use crate::error::{CoreError, CoreResult};
use crate::llm::pipeline::{self, DecisionStats, LlmOutcome};
use crate::llm::{HandMemory, LlmGateway, Personality};
use crate::session::events::{EventBus, EventStream, GameEvent};
use crate::session::mailbox::Mailbox;
use crate::session::state::{
    ActionRecord, ActionResult, FinalRanking, GameState, GameStatus, PotInfo, SeatInfo, SeatStats,
    WireCard,
};
use crate::validate;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

struct SeatMeta {
    kind: AgentKind,
    display_name: String,
    stats: DecisionStats,
}

struct SessionCore {
    game: HoldemGame,
    seats: Vec<SeatMeta>,
    memories: HashMap<usize, HandMemory>,
    history: Vec<ActionRecord>,
    rng: ChaCha20Rng,
    status: GameStatus,
    revision: u64,
    hands_completed: u32,
    final_rankings: Vec<FinalRanking>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) struct SessionShared {
    game_id: Uuid,
    config: GameConfig,
    core: Mutex<SessionCore>,
    bus: EventBus,
    mailboxes: HashMap<usize, Arc<Mailbox>>,
    gateway: Option<Arc<dyn LlmGateway>>,
    /// Wakes the driver when a caller starts the next hand.
    advance_notify: Notify,
    /// Wakes every wait when the session goes terminal.
    shutdown: Notify,
}

/// A live table. Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<SessionShared>,
}

impl Session {
    /// Build the session, assign agents by seat, start the first hand when
    /// no human needs to opt in, and spawn the driver task.
    pub fn create(
        config: GameConfig,
        gateway: Option<Arc<dyn LlmGateway>>,
    ) -> CoreResult<Session> {
        let config = config.expanded()?;
        config.validate()?;

        let mut seats = Vec::with_capacity(config.max_players);
        let mut memories = HashMap::new();
        let mut mailboxes = HashMap::new();
        for seat in 0..config.max_players {
            let kind = match config.agents.get(&seat) {
                Some(spec) => spec.resolve().map_err(CoreError::InvalidConfig)?,
                // Unassigned seats get the most predictable agent
                None => AgentKind::Rule(crate::agent::rules::RuleKind::Call),
            };
            if matches!(kind, AgentKind::Llm { .. }) {
                memories.insert(seat, HandMemory::new());
            }
            if kind.is_human() {
                mailboxes.insert(seat, Arc::new(Mailbox::new()));
            }
            let display_name = format!("Player {} ({})", seat, kind.display_name());
            seats.push(SeatMeta {
                kind,
                display_name,
                stats: DecisionStats::default(),
            });
        }

        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let rng = ChaCha20Rng::seed_from_u64(seed);
        let game = HoldemGame::new(
            config.buyin,
            config.big_blind,
            config.small_blind,
            config.max_players,
        );

        let has_human = seats.iter().any(|s| s.kind.is_human());
        let now = Utc::now();
        let core = SessionCore {
            game,
            seats,
            memories,
            history: Vec::new(),
            rng,
            status: GameStatus::Waiting,
            revision: 0,
            hands_completed: 0,
            final_rankings: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let shared = Arc::new(SessionShared {
            game_id: Uuid::new_v4(),
            config,
            core: Mutex::new(core),
            bus: EventBus::new(),
            mailboxes,
            gateway,
            advance_notify: Notify::new(),
            shutdown: Notify::new(),
        });

        if !has_human || shared.config.auto_start {
            let mut core = shared
                .core
                .try_lock()
                .expect("freshly created session is uncontended");
            core.status = GameStatus::Running;
            start_next_hand(&shared, &mut core)?;
        }

        tracing::info!(game_id = %shared.game_id, seats = shared.config.max_players, "session created");

        let driver = shared.clone();
        tokio::spawn(async move { drive(driver).await });

        Ok(Session { shared })
    }

    pub fn game_id(&self) -> Uuid {
        self.shared.game_id
    }

    /// Lock-guarded value copy of the wire state at the current revision.
    pub async fn snapshot(&self) -> GameState {
        let core = self.shared.core.lock().await;
        project(&self.shared, &core)
    }

    /// External entry point for human decisions. Rejected synchronously
    /// when it is not that seat's turn; never mutates game state.
    pub async fn propose_action(
        &self,
        player_id: usize,
        action: PlayerAction,
    ) -> CoreResult<ActionResult> {
        let core = self.shared.core.lock().await;
        if core.status.is_terminal() {
            return Err(CoreError::SessionTerminal);
        }
        if player_id >= core.seats.len() {
            return Err(CoreError::InvalidAction(format!(
                "no seat {}",
                player_id
            )));
        }
        if core.game.current_player() != Some(player_id) {
            return Err(CoreError::OutOfTurn);
        }
        let mailbox = self
            .shared
            .mailboxes
            .get(&player_id)
            .ok_or_else(|| CoreError::InvalidAction("seat is not human-controlled".into()))?;

        mailbox.offer(action);
        Ok(ActionResult {
            success: true,
            message: "action accepted".to_string(),
            new_state: Some(project(&self.shared, &core)),
        })
    }

    /// Start the next hand. Idempotent trigger: fails with `NotReady`
    /// while a hand is running.
    pub async fn advance(&self) -> CoreResult<GameState> {
        let mut core = self.shared.core.lock().await;
        if core.status.is_terminal() {
            return Err(CoreError::SessionTerminal);
        }
        if core.game.is_hand_running() {
            tracing::debug!(game_id = %self.shared.game_id, "advance ignored mid-hand");
            return Err(CoreError::NotReady);
        }

        core.status = GameStatus::Running;
        start_next_hand(&self.shared, &mut core)?;
        self.shared.advance_notify.notify_one();
        Ok(project(&self.shared, &core))
    }

    /// Transition to Completed (unless already terminal) and drain
    /// subscribers with a terminal event.
    pub async fn end(&self) -> CoreResult<Vec<FinalRanking>> {
        let mut core = self.shared.core.lock().await;
        if core.status.is_terminal() {
            return Ok(core.final_rankings.clone());
        }
        let rankings = compute_rankings(&core);
        finish(&self.shared, &mut core, GameStatus::Completed, rankings.clone());
        Ok(rankings)
    }

    /// Bounded event stream, seeded with the current state.
    pub async fn subscribe(&self) -> EventStream {
        let core = self.shared.core.lock().await;
        let initial = GameEvent::StateUpdate {
            revision: core.revision,
            state: project(&self.shared, &core),
        };
        self.shared.bus.subscribe(Some(initial))
    }
}

/// What the driver decided to do after inspecting state under the lock.
enum Step {
    /// A rule decision was applied inline; loop again immediately.
    Applied,
    Llm {
        seat: usize,
        model: String,
        personality: Personality,
        ctx: DecisionContext,
        memory: HandMemory,
    },
    Human {
        seat: usize,
    },
    /// Hand over, no humans alive: start the next hand ourselves.
    AutoAdvance,
    /// Hand over or not started; wait for an external advance.
    Wait,
    Exit,
}

async fn drive(shared: Arc<SessionShared>) {
    loop {
        let step = {
            let mut core = shared.core.lock().await;
            plan_step(&shared, &mut core)
        };

        match step {
            Step::Applied => {}
            Step::Llm {
                seat,
                model,
                personality,
                ctx,
                memory,
            } => {
                run_llm_turn(&shared, seat, &model, personality, ctx, memory).await;
            }
            Step::Human { seat } => {
                run_human_turn(&shared, seat).await;
            }
            Step::AutoAdvance => {
                let mut core = shared.core.lock().await;
                if !core.status.is_terminal() && !core.game.is_hand_running() {
                    if let Err(err) = start_next_hand(&shared, &mut core) {
                        tracing::error!(game_id = %shared.game_id, %err, "failed to start next hand");
                        let rankings = compute_rankings(&core);
                        finish(&shared, &mut core, GameStatus::Error, rankings);
                    }
                }
            }
            Step::Wait => {
                tokio::select! {
                    _ = shared.advance_notify.notified() => {}
                    _ = shared.shutdown.notified() => {}
                }
            }
            Step::Exit => break,
        }
    }
    tracing::debug!(game_id = %shared.game_id, "driver finished");
}

fn plan_step(shared: &Arc<SessionShared>, core: &mut SessionCore) -> Step {
    if core.status.is_terminal() {
        return Step::Exit;
    }
    if core.status == GameStatus::Waiting {
        return Step::Wait;
    }
    if !core.game.is_hand_running() {
        let human_alive = core
            .seats
            .iter()
            .enumerate()
            .any(|(seat, meta)| meta.kind.is_human() && core.game.chips(seat) > 0);
        return if human_alive {
            Step::Wait
        } else {
            Step::AutoAdvance
        };
    }

    let Some(seat) = core.game.current_player() else {
        // Betting phase with no decider should not happen; the engine runs
        // boards out itself. Treat it as a fatal defect.
        tracing::error!(game_id = %shared.game_id, "running hand without a decider");
        let rankings = compute_rankings(core);
        finish(shared, core, GameStatus::Error, rankings);
        return Step::Exit;
    };

    match core.seats[seat].kind.clone() {
        AgentKind::Rule(rule) => {
            let ctx = DecisionContext::capture(&core.game, seat);
            let proposed = rule.decide(&ctx, &mut core.rng);
            apply_decision(shared, core, seat, proposed, None, None);
            Step::Applied
        }
        AgentKind::Llm { model, personality } => {
            let ctx = DecisionContext::capture(&core.game, seat);
            let memory = core.memories.get(&seat).cloned().unwrap_or_default();
            Step::Llm {
                seat,
                model,
                personality,
                ctx,
                memory,
            }
        }
        AgentKind::Human => Step::Human { seat },
    }
}

async fn run_llm_turn(
    shared: &Arc<SessionShared>,
    seat: usize,
    model: &str,
    personality: Personality,
    ctx: DecisionContext,
    memory: HandMemory,
) {
    let started = Instant::now();
    let outcome: Option<LlmOutcome> = match &shared.gateway {
        None => {
            shared.bus.publish(GameEvent::Error {
                kind: "AgentFailure".to_string(),
                detail: format!("seat {}: no LLM gateway configured", seat),
            });
            None
        }
        Some(gateway) => {
            let decision = tokio::select! {
                result = tokio::time::timeout(
                    shared.config.llm_timeout(),
                    pipeline::decide(gateway.as_ref(), model, personality, &ctx, &memory),
                ) => Some(result),
                _ = shared.shutdown.notified() => None,
            };
            match decision {
                None => return,
                Some(Err(_elapsed)) => {
                    tracing::warn!(game_id = %shared.game_id, seat, model, "LLM decision timed out");
                    shared.bus.publish(GameEvent::Error {
                        kind: "LLMTimeout".to_string(),
                        detail: format!("seat {} exceeded the decision deadline", seat),
                    });
                    None
                }
                Some(Ok(Err(err))) => {
                    tracing::warn!(game_id = %shared.game_id, seat, model, %err, "LLM decision failed");
                    shared.bus.publish(GameEvent::Error {
                        kind: "AgentFailure".to_string(),
                        detail: format!("seat {}: {}", seat, err),
                    });
                    None
                }
                Some(Ok(Ok(outcome))) => Some(outcome),
            }
        }
    };

    let mut core = shared.core.lock().await;
    if core.status.is_terminal() || core.game.current_player() != Some(seat) {
        return;
    }
    core.seats[seat].stats.record(started.elapsed());

    // Degraded decisions enter the fallback ladder at Call
    let (proposed, reasoning, confidence) = match outcome {
        Some(outcome) => (
            outcome.action,
            Some(outcome.reasoning),
            Some(outcome.confidence),
        ),
        None => (PlayerAction::Call, None, None),
    };
    apply_decision(shared, &mut core, seat, proposed, reasoning, confidence);
}

async fn run_human_turn(shared: &Arc<SessionShared>, seat: usize) {
    let Some(mailbox) = shared.mailboxes.get(&seat) else {
        // Roster invariant broken; fold the seat rather than wedge the table
        let mut core = shared.core.lock().await;
        if !core.status.is_terminal() {
            apply_decision(shared, &mut core, seat, PlayerAction::Fold, None, None);
        }
        return;
    };

    let received = tokio::select! {
        action = mailbox.recv_timeout(shared.config.human_timeout()) => action,
        _ = shared.shutdown.notified() => return,
    };

    let mut core = shared.core.lock().await;
    if core.status.is_terminal() || core.game.current_player() != Some(seat) {
        return;
    }

    let action = match received.or_else(|| mailbox.take()) {
        Some(action) => action,
        None => {
            // Missed turn: fold out of the current hand only
            let default = if core.game.chips_to_call(seat) > 0 {
                PlayerAction::Fold
            } else {
                PlayerAction::Check
            };
            tracing::info!(game_id = %shared.game_id, seat, ?default, "human turn timed out");
            shared.bus.publish(GameEvent::Error {
                kind: "HumanTimeout".to_string(),
                detail: format!("seat {} timed out, applying {:?}", seat, default),
            });
            default
        }
    };
    apply_decision(shared, &mut core, seat, action, None, None);
}

/// Validate, apply, record, reconcile, emit. The single write path for
/// every decision regardless of who made it.
fn apply_decision(
    shared: &Arc<SessionShared>,
    core: &mut SessionCore,
    seat: usize,
    proposed: PlayerAction,
    reasoning: Option<String>,
    confidence: Option<f64>,
) {
    let moves = core.game.available_moves();
    let legal = match validate::resolve(proposed, &moves) {
        Ok(action) => action,
        Err(_) => {
            tracing::error!(game_id = %shared.game_id, seat, "no legal action for seat");
            shared.bus.publish(GameEvent::Error {
                kind: "AgentFailure".to_string(),
                detail: format!("seat {} has no legal action", seat),
            });
            finish(shared, core, GameStatus::Error, Vec::new());
            return;
        }
    };

    let phase_before = core.game.hand_phase();
    let pot_before = core.game.pot_total();
    if let Err(err) = core.game.take_action(&legal) {
        // The validator guarantees legality; reaching this is an engine
        // defect and fatal to the session.
        tracing::error!(game_id = %shared.game_id, seat, %err, "validated action rejected by engine");
        shared.bus.publish(GameEvent::Error {
            kind: "RulesEngineDefect".to_string(),
            detail: err.to_string(),
        });
        finish(shared, core, GameStatus::Error, Vec::new());
        return;
    }

    let record = ActionRecord {
        player_id: seat,
        phase: phase_before,
        action: legal.kind(),
        amount: match legal {
            PlayerAction::Raise(total) => Some(total),
            _ => None,
        },
        reasoning,
        confidence,
        pot_before,
        chips_remaining_after: core.game.chips(seat),
    };
    core.history.push(record.clone());
    if let Some(memory) = core.memories.get_mut(&seat) {
        // Memory reflects only applied actions
        memory.record(record.clone());
    }

    let hand_ended = !core.game.is_hand_running();
    if hand_ended && !reconcile_pots(shared, core) {
        return;
    }

    core.revision += 1;
    core.updated_at = Utc::now();
    shared.bus.publish(GameEvent::ActionApplied(record));
    shared.bus.publish(GameEvent::StateUpdate {
        revision: core.revision,
        state: project(shared, core),
    });

    if hand_ended {
        on_hand_complete(shared, core);
    }
}

/// Phantom-chip correction: after a completed hand, clear any pot residue
/// and assert chip conservation. Returns false when the session died.
fn reconcile_pots(shared: &Arc<SessionShared>, core: &mut SessionCore) -> bool {
    let cleared = core.game.clear_phantom_chips();
    if cleared > 0 {
        tracing::debug!(game_id = %shared.game_id, cleared, "cleared phantom pot chips");
    }

    let expected = shared.config.buyin * core.game.seat_count() as i64;
    let actual: i64 = (0..core.game.seat_count())
        .map(|seat| core.game.chips(seat))
        .sum::<i64>()
        + core.game.pot_total();
    if actual != expected {
        tracing::error!(
            game_id = %shared.game_id,
            expected,
            actual,
            "chip conservation violated after reconciliation"
        );
        shared.bus.publish(GameEvent::Error {
            kind: "RulesEngineDefect".to_string(),
            detail: format!("chip total {} != expected {}", actual, expected),
        });
        finish(shared, core, GameStatus::Error, Vec::new());
        return false;
    }
    true
}

fn on_hand_complete(shared: &Arc<SessionShared>, core: &mut SessionCore) {
    core.hands_completed += 1;
    for memory in core.memories.values_mut() {
        memory.clear();
    }
    tracing::info!(
        game_id = %shared.game_id,
        hand = core.hands_completed,
        "hand complete"
    );

    if core.hands_completed >= shared.config.max_hands || !core.game.is_game_running() {
        let rankings = compute_rankings(core);
        finish(shared, core, GameStatus::Completed, rankings);
    }
}

fn start_next_hand(shared: &Arc<SessionShared>, core: &mut SessionCore) -> CoreResult<()> {
    for memory in core.memories.values_mut() {
        memory.clear();
    }
    for mailbox in shared.mailboxes.values() {
        mailbox.clear();
    }

    // Split borrow: the deck shuffle draws from the session RNG
    let SessionCore { game, rng, .. } = core;
    game.start_hand(rng)
        .map_err(|err| CoreError::InvalidAction(err.to_string()))?;

    core.revision += 1;
    core.updated_at = Utc::now();
    shared.bus.publish(GameEvent::StateUpdate {
        revision: core.revision,
        state: project(shared, core),
    });

    // Blinds alone can end the hand when stacks are tiny
    if !core.game.is_hand_running() && reconcile_pots(shared, core) {
        on_hand_complete(shared, core);
    }
    Ok(())
}

/// Terminal transition: freeze rankings, emit the last events, close the
/// bus and wake every in-flight wait.
fn finish(
    shared: &Arc<SessionShared>,
    core: &mut SessionCore,
    status: GameStatus,
    rankings: Vec<FinalRanking>,
) {
    core.status = status;
    core.final_rankings = rankings.clone();
    core.revision += 1;
    core.updated_at = Utc::now();
    shared.bus.publish(GameEvent::StateUpdate {
        revision: core.revision,
        state: project(shared, core),
    });
    shared.bus.publish(GameEvent::Terminal {
        final_rankings: rankings,
    });
    shared.bus.close();
    shared.shutdown.notify_waiters();
    tracing::info!(game_id = %shared.game_id, ?status, "session finished");
}

/// Seats sorted by chips descending, ties broken by seat id ascending.
fn compute_rankings(core: &SessionCore) -> Vec<FinalRanking> {
    let mut order: Vec<usize> = (0..core.game.seat_count()).collect();
    order.sort_by_key(|&seat| (-core.game.chips(seat), seat));
    order
        .into_iter()
        .enumerate()
        .map(|(idx, seat)| FinalRanking {
            rank: idx + 1,
            player_id: seat,
            display_name: core.seats[seat].display_name.clone(),
            chips: core.game.chips(seat),
        })
        .collect()
}

fn project(shared: &Arc<SessionShared>, core: &SessionCore) -> GameState {
    let game = &core.game;
    let current = if core.status == GameStatus::Running {
        game.current_player()
    } else {
        None
    };
    let moves = game.available_moves();
    let settle = game.hand_phase() == HandPhase::Settle;

    let seats = (0..game.seat_count())
        .map(|seat| {
            let meta = &core.seats[seat];
            let state = game.seat_state(seat);
            let in_hand = matches!(state, SeatState::In | SeatState::ToCall | SeatState::AllIn);
            let visible =
                shared.config.debug_mode || meta.kind.is_human() || (settle && in_hand);
            let hole = game.hand_of(seat);
            let hole_cards = if visible && !hole.is_empty() {
                Some(hole.iter().map(|&c| WireCard::from(c)).collect())
            } else {
                None
            };
            let strength = if shared.config.debug_mode && game.board().len() >= 3 && in_hand {
                Some(hand_strength(game, seat))
            } else {
                None
            };
            let llm_stats = if matches!(meta.kind, AgentKind::Llm { .. }) {
                Some(SeatStats {
                    decisions: meta.stats.decisions,
                    average_thinking_ms: meta.stats.average_latency().as_millis() as u64,
                })
            } else {
                None
            };

            SeatInfo {
                player_id: seat,
                agent_type: meta.kind.id(),
                display_name: meta.display_name.clone(),
                chips: game.chips(seat),
                state,
                hole_cards,
                is_current_player: current == Some(seat),
                chips_to_call: if current == Some(seat) {
                    game.chips_to_call(seat)
                } else {
                    0
                },
                hand_strength: strength,
                llm_stats,
            }
        })
        .collect();

    let pots = game
        .pots()
        .iter()
        .enumerate()
        .map(|(pot_id, pot)| PotInfo {
            pot_id,
            total_amount: pot.amount,
            eligible_players: pot.eligible_players.clone(),
        })
        .collect();

    GameState {
        game_id: shared.game_id,
        status: core.status,
        phase: game.hand_phase(),
        hand_number: core.hands_completed,
        max_hands: shared.config.max_hands,
        board: game.board().iter().map(|&c| WireCard::from(c)).collect(),
        seats,
        pots,
        total_pot: game.pot_total(),
        current_player: current,
        available_actions: moves.actions,
        min_raise_amount: moves.raise_range.map(|(min, _)| min),
        big_blind: shared.config.big_blind,
        small_blind: shared.config.small_blind,
        debug_mode: shared.config.debug_mode,
        created_at: core.created_at,
        updated_at: core.updated_at,
    }
}
