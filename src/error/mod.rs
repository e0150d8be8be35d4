//! Error types for relationship reconciliation.
//!
//! Three families of errors exist:
//! - [`Error`]: Remote/transport failures, categorized by [`ErrorKind`]
//! - [`ParseError`]: Malformed textual relationship encodings
//! - [`ReconcileError`](crate::reconciler::ReconcileError): Lifecycle-operation
//!   failures, wrapping the two above with the operation that failed
//!
//! ## Key Invariant
//!
//! A relationship that is missing from the store is never an error. `read()`
//! reports [`ReadOutcome::Absent`](crate::reconciler::ReadOutcome::Absent) and
//! `delete()` of an absent relationship succeeds.

#[allow(clippy::module_inception)]
mod error;
mod kind;
mod parse;

pub use error::Error;
pub use kind::ErrorKind;
pub use parse::ParseError;

/// A specialized `Result` type for remote store operations.
pub type Result<T> = std::result::Result<T, Error>;
