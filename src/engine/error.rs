//! Engine-internal error types.
//!
//! These never cross the core boundary raw; the orchestrator maps them
//! into `InvalidAction` or collapses them through the validator fallback.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotEnoughPlayers,
    HandInProgress,
    HandNotRunning,
    CannotAct { seat: usize },
    CannotCheck { current_bet: i64 },
    RaiseUnavailable,
    RaiseOutOfRange { min: i64, max: i64, attempted: i64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotEnoughPlayers => {
                write!(f, "Fewer than two players have chips")
            }
            EngineError::HandInProgress => write!(f, "A hand is already running"),
            EngineError::HandNotRunning => write!(f, "No hand is running"),
            EngineError::CannotAct { seat } => write!(f, "Seat {} cannot act", seat),
            EngineError::CannotCheck { current_bet } => {
                write!(f, "Cannot check, must call or raise against bet {}", current_bet)
            }
            EngineError::RaiseUnavailable => write!(f, "Raising is not available"),
            EngineError::RaiseOutOfRange {
                min,
                max,
                attempted,
            } => {
                write!(
                    f,
                    "Raise total {} outside legal range [{}, {}]",
                    attempted, min, max
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::RaiseOutOfRange {
            min: 40,
            max: 1000,
            attempted: 5,
        };
        assert_eq!(err.to_string(), "Raise total 5 outside legal range [40, 1000]");
    }
}
