//! In-process relationship store for tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::Error;
use crate::transport::{
    ActiveStreamGuard, RelationshipStream, SharedStats, Transport, TransportClient,
    TransportStats, new_stats,
};
use crate::types::{Consistency, ConsistencyToken, Relationship, RelationshipFilter};

/// The remote primitive a failure is injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `write_relationships`
    Write,
    /// `read_relationships`, failing before the stream opens.
    Read,
    /// `delete_relationships`
    Delete,
}

/// An in-memory [`TransportClient`] with the remote store's semantics.
///
/// Writes are touches, deletes select by filter and succeed on zero matches,
/// and every read observes all prior writes. Test hooks inject failures and
/// latency, and [`open_streams`](InMemoryStore::open_streams) reports read
/// streams that have not yet been released.
///
/// ## Example
///
/// ```rust
/// use spicedb_relationship::testing::InMemoryStore;
/// use spicedb_relationship::Relationship;
///
/// let store = InMemoryStore::new();
/// let rel: Relationship = "document:doc1#viewer@user:alice".parse().unwrap();
/// store.insert(rel.clone());
/// assert!(store.contains(&rel));
/// assert_eq!(store.open_streams(), 0);
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    relationships: RwLock<BTreeSet<Relationship>>,
    revision: AtomicU64,
    failures: Mutex<HashMap<StoreOperation, VecDeque<Error>>>,
    stream_failure: Mutex<Option<(usize, Error)>>,
    latency: Mutex<Option<Duration>>,
    item_delay: Mutex<Option<Duration>>,
    read_consistency: Mutex<Option<Consistency>>,
    stats: SharedStats,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                relationships: RwLock::new(BTreeSet::new()),
                revision: AtomicU64::new(0),
                failures: Mutex::new(HashMap::new()),
                stream_failure: Mutex::new(None),
                latency: Mutex::new(None),
                item_delay: Mutex::new(None),
                read_consistency: Mutex::new(None),
                stats: new_stats(None),
            }),
        }
    }

    /// Seeds a relationship without going through the transport.
    pub fn insert(&self, relationship: Relationship) -> bool {
        self.inner.relationships.write().insert(relationship)
    }

    /// Removes a relationship without going through the transport.
    pub fn remove(&self, relationship: &Relationship) -> bool {
        self.inner.relationships.write().remove(relationship)
    }

    /// Returns `true` if the relationship is stored.
    pub fn contains(&self, relationship: &Relationship) -> bool {
        self.inner.relationships.read().contains(relationship)
    }

    /// Returns every stored relationship in order.
    pub fn relationships(&self) -> Vec<Relationship> {
        self.inner.relationships.read().iter().cloned().collect()
    }

    /// Returns the number of stored relationships.
    pub fn len(&self) -> usize {
        self.inner.relationships.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.relationships.read().is_empty()
    }

    /// Removes every relationship.
    pub fn clear(&self) {
        self.inner.relationships.write().clear();
    }

    /// Makes the next call to `operation` fail with `error`.
    ///
    /// Multiple injected failures are returned in order.
    pub fn fail_next(&self, operation: StoreOperation, error: Error) {
        self.inner
            .failures
            .lock()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Makes the next read stream yield `items` relationships and then
    /// `error`.
    pub fn fail_stream_after(&self, items: usize, error: Error) {
        *self.inner.stream_failure.lock() = Some((items, error));
    }

    /// Delays every call by `latency` before it takes effect.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock() = Some(latency);
    }

    /// Delays every streamed item by `delay`.
    pub fn set_item_delay(&self, delay: Duration) {
        *self.inner.item_delay.lock() = Some(delay);
    }

    /// Returns the number of read streams not yet released.
    pub fn open_streams(&self) -> u32 {
        self.inner.stats.read().streams_active
    }

    /// Returns the consistency requirement of the most recent read.
    pub fn last_read_consistency(&self) -> Option<Consistency> {
        self.inner.read_consistency.lock().clone()
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> u64 {
        self.inner.stats.read().requests_sent
    }

    async fn begin(&self, operation: StoreOperation) -> Result<(), Error> {
        self.inner.stats.write().requests_sent += 1;

        let latency = *self.inner.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self
            .inner
            .failures
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(err) => {
                self.inner.stats.write().requests_failed += 1;
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn next_token(&self) -> ConsistencyToken {
        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        ConsistencyToken::new(format!("rev-{}", revision))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("relationships", &self.len())
            .field("open_streams", &self.open_streams())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TransportClient for InMemoryStore {
    async fn write_relationships(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<ConsistencyToken, Error> {
        self.begin(StoreOperation::Write).await?;
        self.inner.relationships.write().extend(relationships);
        Ok(self.next_token())
    }

    async fn read_relationships(
        &self,
        filter: RelationshipFilter,
        consistency: Consistency,
    ) -> Result<RelationshipStream, Error> {
        *self.inner.read_consistency.lock() = Some(consistency);
        self.begin(StoreOperation::Read).await?;

        // Every read observes the latest state, which satisfies any requirement.
        let items: VecDeque<Relationship> = self
            .inner
            .relationships
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        struct State {
            items: VecDeque<Relationship>,
            failure: Option<(usize, Error)>,
            yielded: usize,
            delay: Option<Duration>,
            _guard: ActiveStreamGuard,
        }

        let state = State {
            items,
            failure: self.inner.stream_failure.lock().take(),
            yielded: 0,
            delay: *self.inner.item_delay.lock(),
            _guard: ActiveStreamGuard::new(Arc::clone(&self.inner.stats)),
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            if let Some(delay) = state.delay {
                tokio::time::sleep(delay).await;
            }

            let fail_now = matches!(state.failure, Some((after, _)) if after == state.yielded);
            if fail_now {
                let (_, err) = state.failure.take()?;
                state.items.clear();
                return Some((Err(err), state));
            }

            let item = state.items.pop_front()?;
            state.yielded += 1;
            Some((Ok(item), state))
        });

        Ok(Box::pin(stream))
    }

    async fn delete_relationships(
        &self,
        filter: RelationshipFilter,
    ) -> Result<ConsistencyToken, Error> {
        self.begin(StoreOperation::Delete).await?;
        self.inner
            .relationships
            .write()
            .retain(|r| !filter.matches(r));
        Ok(self.next_token())
    }

    fn transport_type(&self) -> Option<Transport> {
        None
    }

    fn stats(&self) -> TransportStats {
        self.inner.stats.read().clone()
    }
}
