//! Transport trait definitions and common types.
//!
//! The reconciler depends on exactly three remote primitives. This module
//! defines them as the [`TransportClient`] trait so the gRPC and REST
//! transports, and the in-memory store used in tests, are interchangeable.

use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use futures::Stream;
use parking_lot::RwLock;

use crate::Error;
use crate::types::{Consistency, ConsistencyToken, Relationship, RelationshipFilter};

// ============================================================================
// Transport Enum
// ============================================================================

/// Available transport implementations.
///
/// ```rust
/// use spicedb_relationship::Transport;
///
/// let transport: Transport = "http".parse().unwrap();
/// assert!(transport.is_http());
/// assert_eq!(Transport::default(), Transport::Grpc);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// gRPC over HTTP/2 against `authzed.api.v1.PermissionsService` (default).
    #[default]
    Grpc,
    /// JSON over HTTP against the SpiceDB HTTP gateway.
    Http,
}

impl Transport {
    /// Returns `true` if this is gRPC transport.
    pub fn is_grpc(&self) -> bool {
        matches!(self, Transport::Grpc)
    }

    /// Returns `true` if this is HTTP transport.
    pub fn is_http(&self) -> bool {
        matches!(self, Transport::Http)
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Grpc => write!(f, "gRPC"),
            Transport::Http => write!(f, "HTTP"),
        }
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grpc" => Ok(Transport::Grpc),
            "http" | "rest" => Ok(Transport::Http),
            other => Err(Error::configuration(format!(
                "unknown transport {:?}, expected \"grpc\" or \"http\"",
                other
            ))),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Request counters for a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// The network transport these counters belong to, or `None` for an
    /// in-process store.
    pub transport: Option<Transport>,
    /// Total requests sent, including retries.
    pub requests_sent: u64,
    /// Requests that ended in an error.
    pub requests_failed: u64,
    /// Read streams opened.
    pub streams_opened: u64,
    /// Read streams not yet released.
    pub streams_active: u32,
}

/// Shared, lock-protected counters.
pub(crate) type SharedStats = Arc<RwLock<TransportStats>>;

pub(crate) fn new_stats(transport: Option<Transport>) -> SharedStats {
    Arc::new(RwLock::new(TransportStats {
        transport,
        ..Default::default()
    }))
}

/// Marks a read stream as active until dropped.
///
/// The guard is moved into the stream adapter, so the counter falls back when
/// the stream is exhausted, closed early or dropped mid-flight.
pub(crate) struct ActiveStreamGuard {
    stats: SharedStats,
}

impl ActiveStreamGuard {
    pub(crate) fn new(stats: SharedStats) -> Self {
        {
            let mut s = stats.write();
            s.streams_opened += 1;
            s.streams_active += 1;
        }
        Self { stats }
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        let mut s = self.stats.write();
        s.streams_active = s.streams_active.saturating_sub(1);
    }
}

// ============================================================================
// Transport Client Trait
// ============================================================================

/// A finite, server-streamed sequence of relationships.
///
/// Dropping the stream cancels the underlying request.
pub type RelationshipStream = Pin<Box<dyn Stream<Item = Result<Relationship, Error>> + Send>>;

/// The remote relationship store.
///
/// Implementations must be safe to share across concurrent operations; every
/// method is a single request with no state carried between calls.
#[async_trait::async_trait]
pub trait TransportClient: Send + Sync {
    /// Upserts every relationship with touch semantics: created if absent,
    /// left in place if present.
    async fn write_relationships(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<ConsistencyToken, Error>;

    /// Streams every relationship matched by `filter` at the requested
    /// consistency.
    async fn read_relationships(
        &self,
        filter: RelationshipFilter,
        consistency: Consistency,
    ) -> Result<RelationshipStream, Error>;

    /// Deletes every relationship matched by `filter`. Matching nothing is
    /// success.
    async fn delete_relationships(
        &self,
        filter: RelationshipFilter,
    ) -> Result<ConsistencyToken, Error>;

    /// Returns the network transport, or `None` for an in-process store.
    fn transport_type(&self) -> Option<Transport>;

    /// Returns a snapshot of the request counters.
    fn stats(&self) -> TransportStats;
}
