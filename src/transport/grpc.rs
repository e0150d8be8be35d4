//! gRPC transport against `authzed.api.v1.PermissionsService`.
//!
//! The channel is created lazily: constructing a [`GrpcTransport`] never
//! touches the network, and the first request establishes the HTTP/2
//! connection. Every request carries the bearer token as `authorization`
//! metadata.

use std::time::Duration;

use futures::StreamExt;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

use crate::config::{ProviderConfig, RetryConfig};
use crate::error::ErrorKind;
use crate::transport::retry::execute_with_retry;
use crate::transport::traits::{
    ActiveStreamGuard, RelationshipStream, SharedStats, Transport, TransportClient,
    TransportStats, new_stats,
};
use crate::types::{
    Consistency, ConsistencyToken, ObjectReference, Relationship, RelationshipFilter,
    SubjectReference, SubjectRelationFilter,
};
use crate::{Error, user_agent};

#[allow(clippy::all, missing_docs, unreachable_pub)]
pub(crate) mod proto {
    include!("proto/authzed.api.v1.rs");
}

use proto::permissions_service_client::PermissionsServiceClient;

/// gRPC transport client using tonic.
#[derive(Clone)]
pub struct GrpcTransport {
    client: PermissionsServiceClient<Channel>,
    authorization: MetadataValue<Ascii>,
    retry_config: RetryConfig,
    timeout: Duration,
    stats: SharedStats,
}

impl std::fmt::Debug for GrpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GrpcTransport {
    /// Creates a gRPC transport from provider configuration.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(config: &ProviderConfig) -> Result<Self, Error> {
        let url = config.endpoint_url()?;
        let origin = url.origin().ascii_serialization();

        let mut endpoint = Endpoint::from_shared(origin)
            .map_err(|e| Error::configuration(format!("invalid gRPC endpoint: {}", e)))?
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent::user_agent())
            .map_err(|e| Error::configuration(format!("invalid user agent: {}", e)))?;

        if !config.insecure {
            let mut tls = ClientTlsConfig::new().with_native_roots();
            if let Some(pem) = config.tls.load_ca_pem()? {
                tls = tls.ca_certificate(Certificate::from_pem(pem));
            }
            let domain = config
                .tls
                .domain_name
                .clone()
                .or_else(|| url.host_str().map(str::to_owned));
            if let Some(domain) = domain {
                tls = tls.domain_name(domain);
            }
            endpoint = endpoint.tls_config(tls).map_err(|e| {
                Error::configuration(format!("invalid TLS configuration: {}", e)).with_source(e)
            })?;
        }

        let authorization = format!("Bearer {}", config.token.expose())
            .parse::<MetadataValue<Ascii>>()
            .map_err(|_| Error::new(ErrorKind::Configuration, "token is not valid ASCII"))?;

        Ok(Self {
            client: PermissionsServiceClient::new(endpoint.connect_lazy()),
            authorization,
            retry_config: config.retry.clone(),
            timeout: config.timeout,
            stats: new_stats(Some(Transport::Grpc)),
        })
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request
            .metadata_mut()
            .insert("authorization", self.authorization.clone());
        request.set_timeout(self.timeout);
        request
    }
}

#[async_trait::async_trait]
impl TransportClient for GrpcTransport {
    async fn write_relationships(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<ConsistencyToken, Error> {
        let message = proto::WriteRelationshipsRequest {
            updates: relationships
                .iter()
                .map(|r| proto::RelationshipUpdate {
                    operation: proto::relationship_update::Operation::Touch as i32,
                    relationship: Some(relationship_to_proto(r)),
                })
                .collect(),
        };

        let response = execute_with_retry(&self.retry_config, &self.stats, || {
            let mut client = self.client.clone();
            let request = self.request(message.clone());
            async move {
                client
                    .write_relationships(request)
                    .await
                    .map_err(Error::from)
            }
        })
        .await?;

        Ok(token_from_proto(response.into_inner().written_at))
    }

    async fn read_relationships(
        &self,
        filter: RelationshipFilter,
        consistency: Consistency,
    ) -> Result<RelationshipStream, Error> {
        let message = proto::ReadRelationshipsRequest {
            consistency: Some(consistency_to_proto(&consistency)),
            relationship_filter: Some(filter_to_proto(&filter)),
            optional_limit: 0,
        };

        let response = execute_with_retry(&self.retry_config, &self.stats, || {
            let mut client = self.client.clone();
            let request = self.request(message.clone());
            async move {
                client
                    .read_relationships(request)
                    .await
                    .map_err(Error::from)
            }
        })
        .await?;

        let guard = ActiveStreamGuard::new(self.stats.clone());
        let stream = response.into_inner().map(move |item| {
            let _active = &guard;
            item.map_err(Error::from)
                .and_then(|r| relationship_from_proto(r.relationship))
        });

        Ok(Box::pin(stream))
    }

    async fn delete_relationships(
        &self,
        filter: RelationshipFilter,
    ) -> Result<ConsistencyToken, Error> {
        let message = proto::DeleteRelationshipsRequest {
            relationship_filter: Some(filter_to_proto(&filter)),
        };

        let response = execute_with_retry(&self.retry_config, &self.stats, || {
            let mut client = self.client.clone();
            let request = self.request(message.clone());
            async move {
                client
                    .delete_relationships(request)
                    .await
                    .map_err(Error::from)
            }
        })
        .await?;

        Ok(token_from_proto(response.into_inner().deleted_at))
    }

    fn transport_type(&self) -> Option<Transport> {
        Some(Transport::Grpc)
    }

    fn stats(&self) -> TransportStats {
        self.stats.read().clone()
    }
}

// ============================================================================
// Proto Conversion
// ============================================================================

fn object_to_proto(object: &ObjectReference) -> proto::ObjectReference {
    proto::ObjectReference {
        object_type: object.object_type().to_owned(),
        object_id: object.object_id().to_owned(),
    }
}

fn relationship_to_proto(relationship: &Relationship) -> proto::Relationship {
    proto::Relationship {
        resource: Some(object_to_proto(relationship.resource())),
        relation: relationship.relation().to_owned(),
        subject: Some(proto::SubjectReference {
            object: Some(object_to_proto(relationship.subject().object())),
            optional_relation: relationship
                .subject_relation()
                .unwrap_or_default()
                .to_owned(),
        }),
    }
}

fn relationship_from_proto(
    relationship: Option<proto::Relationship>,
) -> Result<Relationship, Error> {
    let missing = |field: &str| {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("relationship in response is missing {}", field),
        )
    };

    let relationship = relationship.ok_or_else(|| missing("relationship"))?;
    let resource = relationship.resource.ok_or_else(|| missing("resource"))?;
    let subject = relationship.subject.ok_or_else(|| missing("subject"))?;
    let subject_object = subject.object.ok_or_else(|| missing("subject object"))?;

    Ok(Relationship::new(
        ObjectReference::new(resource.object_type, resource.object_id),
        relationship.relation,
        SubjectReference::new(subject_object.object_type, subject_object.object_id)
            .with_relation(subject.optional_relation),
    ))
}

fn filter_to_proto(filter: &RelationshipFilter) -> proto::RelationshipFilter {
    proto::RelationshipFilter {
        resource_type: filter.resource_type.clone(),
        optional_resource_id: filter.optional_resource_id.clone().unwrap_or_default(),
        optional_relation: filter.optional_relation.clone().unwrap_or_default(),
        optional_subject_filter: filter.optional_subject_filter.as_ref().map(|subject| {
            proto::SubjectFilter {
                subject_type: subject.subject_type.clone(),
                optional_subject_id: subject.optional_subject_id.clone().unwrap_or_default(),
                // An empty relation filter selects direct subjects only.
                optional_relation: subject.optional_relation.as_ref().map(|relation| {
                    proto::subject_filter::RelationFilter {
                        relation: match relation {
                            SubjectRelationFilter::Direct => String::new(),
                            SubjectRelationFilter::Relation(name) => name.clone(),
                        },
                    }
                }),
            }
        }),
    }
}

fn consistency_to_proto(consistency: &Consistency) -> proto::Consistency {
    use proto::consistency::Requirement;

    let requirement = match consistency {
        Consistency::MinimizeLatency => Requirement::MinimizeLatency(true),
        Consistency::AtLeastAsFresh(token) => Requirement::AtLeastAsFresh(proto::ZedToken {
            token: token.value().to_owned(),
        }),
        Consistency::AtExactSnapshot(token) => Requirement::AtExactSnapshot(proto::ZedToken {
            token: token.value().to_owned(),
        }),
        Consistency::FullyConsistent => Requirement::FullyConsistent(true),
    };

    proto::Consistency {
        requirement: Some(requirement),
    }
}

fn token_from_proto(token: Option<proto::ZedToken>) -> ConsistencyToken {
    ConsistencyToken::new(token.map(|t| t.token).unwrap_or_default())
}
