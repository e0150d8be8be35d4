//! Per-instance lifecycle state machine.

use std::fmt;

use super::ReconcileError;

/// Where one managed relationship is in its lifecycle.
///
/// ```text
/// Absent ──create──▶ Present ──delete──▶ Destroyed
///                     │  ▲
///                     └──┘ read (found)
/// Present ──read (not found)──▶ Absent
/// ```
///
/// There is no transition that changes a present relationship in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Not yet created, or dropped after drift was detected.
    #[default]
    Absent,
    /// Applied and believed to exist remotely.
    Present,
    /// Deleted. Terminal for this instance.
    Destroyed,
}

impl LifecycleState {
    /// Transition for a successful create.
    pub fn on_created(self) -> Result<Self, ReconcileError> {
        match self {
            Self::Absent => Ok(Self::Present),
            state => Err(ReconcileError::InvalidTransition {
                state,
                operation: "create",
            }),
        }
    }

    /// Transition for a completed existence read.
    pub fn on_read(self, found: bool) -> Result<Self, ReconcileError> {
        match (self, found) {
            (Self::Present, true) => Ok(Self::Present),
            (Self::Present, false) => Ok(Self::Absent),
            (state, _) => Err(ReconcileError::InvalidTransition {
                state,
                operation: "read",
            }),
        }
    }

    /// Transition for a successful delete.
    pub fn on_deleted(self) -> Result<Self, ReconcileError> {
        match self {
            Self::Present => Ok(Self::Destroyed),
            state => Err(ReconcileError::InvalidTransition {
                state,
                operation: "delete",
            }),
        }
    }

    /// Returns `true` once destroyed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Present => write!(f, "present"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let state = LifecycleState::default();
        let state = state.on_created().unwrap();
        assert_eq!(state, LifecycleState::Present);
        let state = state.on_read(true).unwrap();
        assert_eq!(state, LifecycleState::Present);
        let state = state.on_deleted().unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_drift_returns_to_absent() {
        let state = LifecycleState::Present.on_read(false).unwrap();
        assert_eq!(state, LifecycleState::Absent);
        assert_eq!(state.on_created().unwrap(), LifecycleState::Present);
    }

    #[test]
    fn test_illegal_transitions() {
        let err = LifecycleState::Present.on_created().unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidTransition {
                state: LifecycleState::Present,
                operation: "create"
            }
        ));

        assert!(LifecycleState::Absent.on_deleted().is_err());
        assert!(LifecycleState::Absent.on_read(true).is_err());
        assert!(LifecycleState::Destroyed.on_created().is_err());
        assert!(LifecycleState::Destroyed.on_read(false).is_err());
        assert!(LifecycleState::Destroyed.on_deleted().is_err());
    }

    #[test]
    fn test_transition_error_message() {
        let err = LifecycleState::Destroyed.on_created().unwrap_err();
        assert_eq!(err.to_string(), "cannot create a relationship in state destroyed");
    }
}
