//! Transport layer for the remote relationship store.
//!
//! - gRPC transport (via tonic) - default
//! - REST transport (via reqwest) - for deployments exposing only the HTTP gateway
//!
//! Both implement [`TransportClient`], the three-primitive contract the
//! reconciler is written against.
//!
//! ## Feature Flags
//!
//! - `grpc` (default): Enable gRPC transport
//! - `rest` (default): Enable REST transport

mod retry;
mod traits;

#[cfg(feature = "grpc")]
mod grpc;

#[cfg(feature = "rest")]
mod rest;

pub use traits::{RelationshipStream, Transport, TransportClient, TransportStats};

pub(crate) use traits::{ActiveStreamGuard, SharedStats, new_stats};

#[cfg(feature = "rest")]
pub use rest::RestTransport;

#[cfg(feature = "grpc")]
pub use grpc::GrpcTransport;
