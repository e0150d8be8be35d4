//! The long-lived handle to the remote relationship store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spicedb_relationship::Client;
//!
//! # async fn example() -> Result<(), spicedb_relationship::Error> {
//! let client = Client::builder()
//!     .endpoint("localhost:50051")
//!     .token("somerandomkeyhere")
//!     .insecure()
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{ClientBuilder, HasEndpoint, HasToken, NoEndpoint, NoToken};

use std::sync::Arc;

use crate::Error;
use crate::config::ProviderConfig;
use crate::transport::{RelationshipStream, Transport, TransportClient, TransportStats};
use crate::types::{Consistency, ConsistencyToken, Relationship, RelationshipFilter};

/// A handle to the remote relationship store.
///
/// Create one per host process and pass it to every operation. It is `Clone`
/// (an `Arc` bump) and holds no mutable state of its own, so concurrent
/// operations on independent relationships can share it freely.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn TransportClient>,
    endpoint: Option<String>,
}

impl Client {
    /// Creates a new client builder.
    pub fn builder() -> ClientBuilder<NoEndpoint, NoToken> {
        ClientBuilder::new()
    }

    /// Creates a client from provider configuration.
    ///
    /// No connection is made until the first request.
    pub async fn from_config(config: &ProviderConfig) -> Result<Self, Error> {
        config.validate()?;

        let transport: Arc<dyn TransportClient> = match config.transport {
            #[cfg(feature = "grpc")]
            Transport::Grpc => Arc::new(crate::transport::GrpcTransport::new(config)?),
            #[cfg(not(feature = "grpc"))]
            Transport::Grpc => {
                return Err(Error::configuration(
                    "gRPC transport requested but 'grpc' feature is not enabled",
                ));
            }
            #[cfg(feature = "rest")]
            Transport::Http => Arc::new(crate::transport::RestTransport::new(config)?),
            #[cfg(not(feature = "rest"))]
            Transport::Http => {
                return Err(Error::configuration(
                    "HTTP transport requested but 'rest' feature is not enabled",
                ));
            }
        };

        tracing::debug!(
            endpoint = %config.endpoint,
            transport = %config.transport,
            "created client"
        );

        Ok(Self {
            transport,
            endpoint: Some(config.endpoint.clone()),
        })
    }

    /// Wraps an existing transport, such as an
    /// [`InMemoryStore`](crate::testing::InMemoryStore).
    pub fn from_transport(transport: impl TransportClient + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoint: None,
        }
    }

    /// Returns the configured endpoint, if built from configuration.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Returns the network transport in use, or `None` when wrapping an
    /// in-process store.
    pub fn transport_type(&self) -> Option<Transport> {
        self.transport.transport_type()
    }

    /// Returns the transport's request counters.
    pub fn stats(&self) -> TransportStats {
        self.transport.stats()
    }

    /// Upserts relationships with touch semantics.
    pub async fn write_relationships(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<ConsistencyToken, Error> {
        self.transport.write_relationships(relationships).await
    }

    /// Streams relationships matched by `filter`.
    pub async fn read_relationships(
        &self,
        filter: RelationshipFilter,
        consistency: Consistency,
    ) -> Result<RelationshipStream, Error> {
        self.transport.read_relationships(filter, consistency).await
    }

    /// Deletes relationships matched by `filter`.
    pub async fn delete_relationships(
        &self,
        filter: RelationshipFilter,
    ) -> Result<ConsistencyToken, Error> {
        self.transport.delete_relationships(filter).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport.transport_type())
            .finish_non_exhaustive()
    }
}
