//! Commonly used types.
//!
//! ```rust
//! use spicedb_relationship::prelude::*;
//! ```

pub use crate::{
    client::{Client, ClientBuilder},
    config::{ProviderConfig, RetryConfig, TlsConfig},
    error::{Error, ErrorKind, ParseError},
    reconciler::{
        Applied, DesiredState, OperationContext, ReadOutcome, ReconcileError,
        RelationshipResource, ResourceLifecycle,
    },
    transport::Transport,
    types::{Consistency, ConsistencyToken, Relationship, RelationshipFilter},
};
