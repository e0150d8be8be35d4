//! The relationship reconciler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::{Error, ParseError};
use crate::types::{Consistency, ConsistencyToken, Relationship, RelationshipFilter};

use super::{Diagnostic, OperationContext, Plan, ReadStream, ReconcileError};

/// A validated relationship the host wants to exist.
///
/// Serializes as the relationship text, which is also the import ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredState {
    relationship: Relationship,
}

impl DesiredState {
    /// Parses and validates `text`.
    pub fn new(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            relationship: text.parse()?,
        })
    }

    /// Returns the parsed relationship.
    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    /// Returns the identifying text.
    pub fn id(&self) -> String {
        self.relationship.to_string()
    }

    /// Returns the exact-match filter for this relationship.
    pub fn filter(&self) -> RelationshipFilter {
        RelationshipFilter::exact(&self.relationship)
    }
}

impl From<Relationship> for DesiredState {
    fn from(relationship: Relationship) -> Self {
        Self { relationship }
    }
}

impl FromStr for DesiredState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.relationship, f)
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The desired state, unchanged.
    pub state: DesiredState,
    /// The revision at which the write became visible.
    pub written_at: ConsistencyToken,
}

/// Result of an existence read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The relationship exists remotely.
    Present(DesiredState),
    /// The relationship no longer exists; the host should drop it from state.
    Absent,
}

impl ReadOutcome {
    /// Returns `true` if the relationship exists.
    pub fn is_present(&self) -> bool {
        matches!(self, ReadOutcome::Present(_))
    }

    /// Returns the state to keep, if any.
    pub fn into_state(self) -> Option<DesiredState> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Absent => None,
        }
    }

    /// Returns the warning a host shows when `current` has drifted away.
    pub fn diagnostic(&self, current: &DesiredState) -> Option<Diagnostic> {
        match self {
            ReadOutcome::Present(_) => None,
            ReadOutcome::Absent => Some(Diagnostic::warning(
                "Relationship Not Found",
                format!(
                    "Relationship {} no longer exists and will be removed from state.",
                    current
                ),
            )),
        }
    }
}

/// The lifecycle a host drives for each managed instance.
///
/// Calls for one instance are made sequentially. Every call takes the
/// caller's [`OperationContext`] first.
#[async_trait::async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Applies the desired state with an idempotent upsert.
    async fn create(
        &self,
        ctx: &OperationContext,
        desired: &DesiredState,
    ) -> Result<Applied, ReconcileError>;

    /// Checks whether the recorded state still exists remotely.
    async fn read(
        &self,
        ctx: &OperationContext,
        current: &DesiredState,
    ) -> Result<ReadOutcome, ReconcileError>;

    /// Applies an in-place change. Only an unchanged state is accepted.
    async fn update(
        &self,
        ctx: &OperationContext,
        prior: &DesiredState,
        planned: &DesiredState,
    ) -> Result<DesiredState, ReconcileError>;

    /// Removes the relationship. Succeeds if it is already gone.
    async fn delete(
        &self,
        ctx: &OperationContext,
        current: &DesiredState,
    ) -> Result<ConsistencyToken, ReconcileError>;

    /// Adopts an existing relationship by its identifying text.
    async fn import(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<DesiredState, ReconcileError>;

    /// Diffs recorded state against proposed text.
    fn plan(
        &self,
        prior: Option<&DesiredState>,
        proposed: Option<&str>,
    ) -> Result<Plan, ReconcileError> {
        let proposed = proposed.map(DesiredState::new).transpose()?;
        Ok(Plan::diff(prior, proposed.as_ref()))
    }
}

/// Reconciles one relationship against the remote store through a shared
/// [`Client`].
///
/// ## Example
///
/// ```rust
/// use spicedb_relationship::testing::InMemoryStore;
/// use spicedb_relationship::{
///     Client, DesiredState, OperationContext, ReadOutcome, RelationshipResource,
///     ResourceLifecycle,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resource = RelationshipResource::new(Client::from_transport(InMemoryStore::new()));
/// let ctx = OperationContext::new();
/// let desired = DesiredState::new("document:doc1#viewer@user:alice")?;
///
/// resource.create(&ctx, &desired).await?;
/// assert!(resource.read(&ctx, &desired).await?.is_present());
///
/// resource.delete(&ctx, &desired).await?;
/// assert_eq!(resource.read(&ctx, &desired).await?, ReadOutcome::Absent);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RelationshipResource {
    client: Client,
}

impl RelationshipResource {
    /// Creates a reconciler over `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl ResourceLifecycle for RelationshipResource {
    #[tracing::instrument(skip_all, fields(relationship = %desired))]
    async fn create(
        &self,
        ctx: &OperationContext,
        desired: &DesiredState,
    ) -> Result<Applied, ReconcileError> {
        let written_at = ctx
            .run(async {
                self.client
                    .write_relationships(vec![desired.relationship().clone()])
                    .await
                    .map_err(|source| write_error(desired, source))
            })
            .await?;

        tracing::trace!(written_at = %written_at, "created relationship");
        Ok(Applied {
            state: desired.clone(),
            written_at,
        })
    }

    #[tracing::instrument(skip_all, fields(relationship = %current))]
    async fn read(
        &self,
        ctx: &OperationContext,
        current: &DesiredState,
    ) -> Result<ReadOutcome, ReconcileError> {
        let found = ctx
            .run(async {
                let stream = self
                    .client
                    .read_relationships(current.filter(), Consistency::FullyConsistent)
                    .await
                    .map_err(|source| read_error(current, source))?;
                ReadStream::new(stream)
                    .exists()
                    .await
                    .map_err(|source| read_error(current, source))
            })
            .await?;

        let outcome = if found {
            ReadOutcome::Present(current.clone())
        } else {
            ReadOutcome::Absent
        };
        match outcome.diagnostic(current) {
            Some(diag) => tracing::warn!(
                detail = %diag.detail,
                "relationship not found, removing from state"
            ),
            None => tracing::trace!("read relationship"),
        }
        Ok(outcome)
    }

    #[tracing::instrument(skip_all, fields(prior = %prior, planned = %planned))]
    async fn update(
        &self,
        ctx: &OperationContext,
        prior: &DesiredState,
        planned: &DesiredState,
    ) -> Result<DesiredState, ReconcileError> {
        if ctx.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        if prior != planned {
            tracing::debug!("in-place change requested, replacement required");
            return Err(ReconcileError::RequiresReplace {
                from: prior.id(),
                to: planned.id(),
            });
        }

        Ok(planned.clone())
    }

    #[tracing::instrument(skip_all, fields(relationship = %current))]
    async fn delete(
        &self,
        ctx: &OperationContext,
        current: &DesiredState,
    ) -> Result<ConsistencyToken, ReconcileError> {
        let deleted_at = ctx
            .run(async {
                self.client
                    .delete_relationships(current.filter())
                    .await
                    .map_err(|source| delete_error(current, source))
            })
            .await?;

        tracing::trace!(deleted_at = %deleted_at, "deleted relationship");
        Ok(deleted_at)
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    async fn import(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<DesiredState, ReconcileError> {
        if ctx.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        let state = DesiredState::new(id)?;
        tracing::trace!("imported relationship");
        Ok(state)
    }
}

fn write_error(desired: &DesiredState, source: Error) -> ReconcileError {
    tracing::warn!(error = %source, "failed to write relationship");
    ReconcileError::Write {
        relationship: desired.id(),
        source,
    }
}

fn read_error(current: &DesiredState, source: Error) -> ReconcileError {
    tracing::warn!(error = %source, "failed to read relationship");
    ReconcileError::Read {
        relationship: current.id(),
        source,
    }
}

fn delete_error(current: &DesiredState, source: Error) -> ReconcileError {
    tracing::warn!(error = %source, "failed to delete relationship");
    ReconcileError::Delete {
        relationship: current.id(),
        source,
    }
}
