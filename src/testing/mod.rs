//! Testing utilities.
//!
//! [`InMemoryStore`] implements the remote store contract in process, so
//! reconciler behavior can be exercised without a running permissions
//! database.
//!
//! ```rust
//! use spicedb_relationship::testing::InMemoryStore;
//! use spicedb_relationship::{Client, RelationshipResource};
//!
//! let store = InMemoryStore::new();
//! let resource = RelationshipResource::new(Client::from_transport(store.clone()));
//! ```

mod in_memory;

pub use in_memory::{InMemoryStore, StoreOperation};
