//! Drives one relationship through its create/read/update/delete lifecycle.
//!
//! - **Create** upserts the relationship with touch semantics. Creating twice
//!   is the same as creating once.
//! - **Read** runs a fully consistent exact-match read and stops at the first
//!   result. No result means drift: the outcome is
//!   [`ReadOutcome::Absent`], not an error.
//! - **Update** never reaches the store. Any change in text is a replacement,
//!   planned up front by [`Plan`].
//! - **Delete** removes whatever the exact-match filter selects. Deleting an
//!   absent relationship succeeds.
//! - **Import** adopts a relationship by its textual encoding without a
//!   remote call.
//!
//! Each operation issues at most one request, races it against the caller's
//! [`OperationContext`], and never retries.

mod context;
mod error;
mod plan;
mod resource;
mod state;
mod stream;

pub use context::OperationContext;
pub use error::{Diagnostic, ReconcileError, Severity};
pub use plan::{Plan, PlanAction};
pub use resource::{Applied, DesiredState, ReadOutcome, RelationshipResource, ResourceLifecycle};
pub use state::LifecycleState;
pub use stream::ReadStream;
