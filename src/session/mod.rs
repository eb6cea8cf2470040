//! Session layer: per-table orchestration, event fan-out, human input and
//! the process-wide registry.

pub mod events;
pub mod mailbox;
pub mod orchestrator;
pub mod registry;
pub mod state;

pub use events::{EventBus, EventStream, GameEvent, SUBSCRIBER_BUFFER_CAPACITY};
pub use mailbox::Mailbox;
pub use orchestrator::Session;
pub use registry::SessionRegistry;
pub use state::{
    ActionRecord, ActionResult, FinalRanking, GameState, GameStatus, PotInfo, SeatInfo, SeatStats,
    WireCard,
};
