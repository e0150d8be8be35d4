//! Lifecycle operation errors and host diagnostics.

use std::fmt;

use crate::error::{Error, ParseError};

use super::LifecycleState;

/// An error from a lifecycle operation.
///
/// Remote failures carry the transport [`Error`] unchanged, so the backend
/// message reaches the host verbatim. Drift is not an error; see
/// [`ReadOutcome::Absent`](super::ReadOutcome::Absent).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// The relationship text is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The remote store rejected or failed the write.
    #[error("failed to write relationship {relationship}: {source}")]
    Write {
        /// The relationship being written.
        relationship: String,
        /// The remote error.
        #[source]
        source: Error,
    },

    /// The remote store failed the existence read.
    #[error("failed to read relationship {relationship}: {source}")]
    Read {
        /// The relationship being read.
        relationship: String,
        /// The remote error.
        #[source]
        source: Error,
    },

    /// The remote store rejected or failed the delete.
    #[error("failed to delete relationship {relationship}: {source}")]
    Delete {
        /// The relationship being deleted.
        relationship: String,
        /// The remote error.
        #[source]
        source: Error,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation finished.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    /// An in-place change was requested; relationships are replaced instead.
    #[error("relationship {from} cannot be changed to {to} in place")]
    RequiresReplace {
        /// The currently applied relationship.
        from: String,
        /// The requested relationship.
        to: String,
    },

    /// The operation is not allowed from the current lifecycle state.
    #[error("cannot {operation} a relationship in state {state}")]
    InvalidTransition {
        /// The state the instance was in.
        state: LifecycleState,
        /// The attempted operation.
        operation: &'static str,
    },
}

impl ReconcileError {
    /// Returns the remote error, if this failure came from the store.
    pub fn remote(&self) -> Option<&Error> {
        match self {
            Self::Write { source, .. } | Self::Read { source, .. } | Self::Delete { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    /// Returns `true` for caller-initiated cancellation or deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Renders the error as the operation-scoped message a host displays.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse(err) => Diagnostic::error(
                "Invalid Relationship",
                format!("Unable to parse relationship: {}", err),
            ),
            Self::Write { source, .. } => Diagnostic::error(
                "SpiceDB Client Error",
                format!("Unable to create relationships, got error: {}", source.message()),
            ),
            Self::Read { source, .. } => Diagnostic::error(
                "Unable to get relationship information",
                format!("Unable to get relationship: {}", source.message()),
            ),
            Self::Delete { source, .. } => Diagnostic::error(
                "SpiceDB Client Error",
                format!("Unable to delete relationship, got error: {}", source.message()),
            ),
            Self::Cancelled => Diagnostic::error(
                "Operation Cancelled",
                "The operation was cancelled before it completed.",
            ),
            Self::DeadlineExceeded => Diagnostic::error(
                "Operation Timed Out",
                "The operation did not complete before its deadline.",
            ),
            Self::RequiresReplace { from, to } => Diagnostic::error(
                "Relationship Requires Replacement",
                format!(
                    "Relationship {} cannot be updated in place to {}; it must be destroyed and recreated.",
                    from, to
                ),
            ),
            Self::InvalidTransition { state, operation } => Diagnostic::error(
                "Invalid Lifecycle Transition",
                format!("Cannot {} a relationship that is {}.", operation, state),
            ),
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The operation failed.
    Error,
    /// The operation succeeded but something needs attention.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A host-facing message for one failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Short title.
    pub summary: String,
    /// Full message, including the backend error text.
    pub detail: String,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
    }
}

impl From<&ReconcileError> for Diagnostic {
    fn from(err: &ReconcileError) -> Self {
        err.diagnostic()
    }
}
