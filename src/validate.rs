//! Action validator: maps any proposed action onto the legal set.
//!
//! Pure over the reported moves; the returned action is exactly what gets
//! handed to the rules engine. Raises clamp into the reported total range,
//! an illegal raise degrades to a call, and anything still illegal falls
//! through the Check -> Call -> Fold ladder.

use crate::engine::game::AvailableMoves;
use crate::engine::{ActionKind, PlayerAction};
use std::fmt;

/// The legal set was empty: the seat cannot act at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoLegalAction;

impl fmt::Display for NoLegalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no legal action available")
    }
}

impl std::error::Error for NoLegalAction {}

pub fn resolve(
    proposed: PlayerAction,
    moves: &AvailableMoves,
) -> Result<PlayerAction, NoLegalAction> {
    if moves.actions.is_empty() {
        return Err(NoLegalAction);
    }

    let candidate = match proposed {
        PlayerAction::Raise(total) => match moves.raise_range {
            Some((min, max)) if moves.allows(ActionKind::Raise) => {
                PlayerAction::Raise(total.clamp(min, max))
            }
            _ => PlayerAction::Call,
        },
        other => other,
    };

    if moves.allows(candidate.kind()) {
        return Ok(candidate);
    }

    for fallback in [PlayerAction::Check, PlayerAction::Call, PlayerAction::Fold] {
        if moves.allows(fallback.kind()) {
            return Ok(fallback);
        }
    }

    Err(NoLegalAction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(actions: &[ActionKind], raise_range: Option<(i64, i64)>) -> AvailableMoves {
        AvailableMoves {
            actions: actions.to_vec(),
            raise_range,
        }
    }

    #[test]
    fn test_legal_action_passes_through() {
        let m = moves(&[ActionKind::Fold, ActionKind::Call], None);
        assert_eq!(resolve(PlayerAction::Call, &m), Ok(PlayerAction::Call));
        assert_eq!(resolve(PlayerAction::Fold, &m), Ok(PlayerAction::Fold));
    }

    #[test]
    fn test_raise_clamped_to_range_low() {
        let m = moves(
            &[ActionKind::Fold, ActionKind::Call, ActionKind::Raise],
            Some((40, 1000)),
        );
        assert_eq!(
            resolve(PlayerAction::Raise(5), &m),
            Ok(PlayerAction::Raise(40))
        );
    }

    #[test]
    fn test_raise_clamped_to_range_high() {
        let m = moves(
            &[ActionKind::Fold, ActionKind::Call, ActionKind::Raise],
            Some((40, 1000)),
        );
        assert_eq!(
            resolve(PlayerAction::Raise(5000), &m),
            Ok(PlayerAction::Raise(1000))
        );
    }

    #[test]
    fn test_raise_degrades_to_call_when_unavailable() {
        let m = moves(&[ActionKind::Fold, ActionKind::Call], None);
        assert_eq!(
            resolve(PlayerAction::Raise(100), &m),
            Ok(PlayerAction::Call)
        );
    }

    #[test]
    fn test_raise_degrades_to_check_when_nothing_owed() {
        // No call available: the ladder lands on Check
        let m = moves(&[ActionKind::Fold, ActionKind::Check], None);
        assert_eq!(
            resolve(PlayerAction::Raise(100), &m),
            Ok(PlayerAction::Check)
        );
    }

    #[test]
    fn test_check_facing_bet_becomes_call() {
        let m = moves(&[ActionKind::Fold, ActionKind::Call], None);
        assert_eq!(resolve(PlayerAction::Check, &m), Ok(PlayerAction::Call));
    }

    #[test]
    fn test_empty_set_is_failure() {
        let m = moves(&[], None);
        assert_eq!(resolve(PlayerAction::Call, &m), Err(NoLegalAction));
    }
}
