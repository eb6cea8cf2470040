//! Per-session event fan-out with bounded, loss-tolerant subscribers.
//!
//! The publisher never blocks: each subscriber owns a bounded queue, and on
//! overflow the oldest queued `StateUpdate` is discarded first. Applied
//! actions and the terminal event are only dropped if a full queue contains
//! nothing else to evict.

use crate::session::state::{ActionRecord, FinalRanking, GameState};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Notify;

/// Default per-subscriber buffer bound.
pub const SUBSCRIBER_BUFFER_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum GameEvent {
    StateUpdate { revision: u64, state: GameState },
    ActionApplied(ActionRecord),
    Error { kind: String, detail: String },
    Terminal { final_rankings: Vec<FinalRanking> },
}

impl GameEvent {
    fn is_state_update(&self) -> bool {
        matches!(self, GameEvent::StateUpdate { .. })
    }

    fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::Terminal { .. })
    }

    fn revision(&self) -> Option<u64> {
        match self {
            GameEvent::StateUpdate { revision, .. } => Some(*revision),
            _ => None,
        }
    }
}

struct SubscriberShared {
    queue: Mutex<VecDeque<GameEvent>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
}

impl SubscriberShared {
    fn push(&self, event: &GameEvent) {
        let mut queue = self.queue.lock().unwrap();

        // One StateUpdate per revision
        if let Some(revision) = event.revision() {
            if queue.iter().any(|e| e.revision() == Some(revision)) {
                return;
            }
        }

        if queue.len() >= self.capacity {
            if let Some(pos) = queue.iter().position(|e| e.is_state_update()) {
                queue.remove(pos);
            } else if let Some(pos) = queue.iter().position(|e| !e.is_terminal()) {
                // Nothing droppable by preference left; evict the oldest
                // non-terminal event to keep the bound
                queue.remove(pos);
            }
        }
        queue.push_back(event.clone());
        drop(queue);
        self.notify.notify_one();
    }
}

pub struct EventBus {
    subscribers: Mutex<Vec<Weak<SubscriberShared>>>,
    closed: AtomicBool,
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIBER_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Attach a subscriber, optionally seeding it with an initial event.
    pub fn subscribe(&self, initial: Option<GameEvent>) -> EventStream {
        let shared = Arc::new(SubscriberShared {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(self.closed.load(Ordering::Acquire)),
            capacity: self.capacity,
        });
        if let Some(event) = initial {
            shared.push(&event);
        }
        self.subscribers.lock().unwrap().push(Arc::downgrade(&shared));
        EventStream { shared }
    }

    /// Deliver an event to every live subscriber. Never blocks; dropped
    /// subscribers are pruned as a side effect.
    pub fn publish(&self, event: GameEvent) {
        if self.closed.load(Ordering::Acquire) && !event.is_terminal() {
            return;
        }
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|weak| match weak.upgrade() {
            Some(shared) => {
                shared.push(&event);
                true
            }
            None => false,
        });
    }

    /// Stop accepting events and wake every subscriber so streams drain
    /// and finish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let subscribers = self.subscribers.lock().unwrap();
        for weak in subscribers.iter() {
            if let Some(shared) = weak.upgrade() {
                shared.closed.store(true, Ordering::Release);
                shared.notify.notify_one();
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber's view: buffered events in publish order, then `None` once
/// the bus has closed and the buffer is drained.
pub struct EventStream {
    shared: Arc<SubscriberShared>,
}

impl EventStream {
    pub async fn next(&self) -> Option<GameEvent> {
        loop {
            let notified = self.shared.notify.notified();
            if let Some(event) = self.try_next() {
                return Some(event);
            }
            if self.shared.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    pub fn try_next(&self) -> Option<GameEvent> {
        self.shared.queue.lock().unwrap().pop_front()
    }

    /// Number of events currently buffered.
    pub fn buffered(&self) -> usize {
        self.shared.queue.lock().unwrap().len()
    }
}
