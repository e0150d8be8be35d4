//! Plan-time diffing with replace-on-change.

use std::fmt;

use super::DesiredState;

/// What applying a change to one managed relationship will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanAction {
    /// Nothing changes.
    NoOp,
    /// The relationship will be written.
    Create,
    /// The old relationship will be deleted and the new one written.
    Replace,
    /// The relationship will be deleted.
    Delete,
}

impl PlanAction {
    /// Returns `true` if the remote store will be touched.
    pub fn changes_remote(&self) -> bool {
        !matches!(self, PlanAction::NoOp)
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::NoOp => write!(f, "no-op"),
            PlanAction::Create => write!(f, "create"),
            PlanAction::Replace => write!(f, "replace"),
            PlanAction::Delete => write!(f, "delete"),
        }
    }
}

/// The outcome of diffing prior state against proposed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    action: PlanAction,
    prior: Option<DesiredState>,
    proposed: Option<DesiredState>,
}

impl Plan {
    /// Diffs `prior` against `proposed`.
    ///
    /// Any difference in text is a replacement. An update in place is never
    /// planned.
    pub fn diff(prior: Option<&DesiredState>, proposed: Option<&DesiredState>) -> Self {
        let action = match (prior, proposed) {
            (None, None) => PlanAction::NoOp,
            (None, Some(_)) => PlanAction::Create,
            (Some(_), None) => PlanAction::Delete,
            (Some(prior), Some(proposed)) if prior == proposed => PlanAction::NoOp,
            (Some(_), Some(_)) => PlanAction::Replace,
        };

        Self {
            action,
            prior: prior.cloned(),
            proposed: proposed.cloned(),
        }
    }

    /// Returns the planned action.
    pub fn action(&self) -> PlanAction {
        self.action
    }

    /// Returns the prior state.
    pub fn prior(&self) -> Option<&DesiredState> {
        self.prior.as_ref()
    }

    /// Returns the proposed state.
    pub fn proposed(&self) -> Option<&DesiredState> {
        self.proposed.as_ref()
    }

    /// Returns `true` when the prior relationship must be destroyed first.
    pub fn requires_replace(&self) -> bool {
        self.action == PlanAction::Replace
    }
}
