//! # spicedb-relationship
//!
//! Declarative management of a single relationship in a SpiceDB-compatible
//! permissions database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spicedb_relationship::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .endpoint("localhost:50051")
//!         .token("somerandomkeyhere")
//!         .insecure()
//!         .build()
//!         .await?;
//!
//!     let resource = RelationshipResource::new(client);
//!     let ctx = OperationContext::new();
//!     let desired = DesiredState::new("document:doc1#viewer@group:eng#member")?;
//!
//!     resource.create(&ctx, &desired).await?;
//!     match resource.read(&ctx, &desired).await? {
//!         ReadOutcome::Present(_) => println!("in sync"),
//!         ReadOutcome::Absent => println!("drifted"),
//!     }
//!     resource.delete(&ctx, &desired).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Textual encoding**: `resourceType:resourceId#relation@subjectType:subjectId[#subjectRelation]`
//!   is both the desired state and the import ID
//! - **Idempotence**: create is a touch, delete of an absent relationship succeeds
//! - **Absence ≠ Error**: a missing relationship is [`ReadOutcome::Absent`], not `Err`
//! - **Replace, never update**: any change in text destroys and recreates
//!
//! ## Features
//!
//! - `grpc` (default): gRPC transport via tonic
//! - `rest` (default): HTTP gateway transport via reqwest
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS for the HTTP transport

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod testing;
pub mod transport;
pub mod types;

mod user_agent;

pub mod prelude;

pub use client::{Client, ClientBuilder};
pub use config::{BearerToken, ProviderConfig, RetryConfig, TlsConfig};
pub use error::{Error, ErrorKind, ParseError, Result};
pub use reconciler::{
    Applied, DesiredState, Diagnostic, LifecycleState, OperationContext, Plan, PlanAction,
    ReadOutcome, ReadStream, ReconcileError, RelationshipResource, ResourceLifecycle, Severity,
};
pub use transport::{Transport, TransportClient};
pub use types::{
    Consistency, ConsistencyToken, ObjectReference, Relationship, RelationshipFilter,
    SubjectFilter, SubjectReference, SubjectRelationFilter,
};
