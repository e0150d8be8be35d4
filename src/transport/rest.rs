//! REST transport against the SpiceDB HTTP gateway.
//!
//! Writes and deletes are plain JSON requests. Reads are server-streamed as
//! newline-delimited JSON, one `{"result": ...}` or `{"error": ...}` object per
//! line.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

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

const WRITE_PATH: &str = "/v1/relationships/write";
const READ_PATH: &str = "/v1/relationships/read";
const DELETE_PATH: &str = "/v1/relationships/delete";

// ============================================================================
// REST Transport
// ============================================================================

/// REST transport using reqwest.
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
    retry_config: RetryConfig,
    stats: SharedStats,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    /// Creates a REST transport from provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, Error> {
        let base_url = config.endpoint_url()?;

        let mut client_builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent::user_agent());

        if !config.insecure {
            if let Some(pem) = config.tls.load_ca_pem()? {
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    Error::configuration(format!("invalid CA certificate: {}", e)).with_source(e)
                })?;
                client_builder = client_builder.add_root_certificate(cert);
            }
        }

        let client = client_builder.build().map_err(|e| {
            Error::configuration(format!("failed to create HTTP client: {}", e)).with_source(e)
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.expose()))
            .map_err(|_| Error::configuration("token is not a valid header value"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            client,
            base_url,
            headers,
            retry_config: config.retry.clone(),
            stats: new_stats(Some(Transport::Http)),
        })
    }

    /// Sends a POST request, retrying per the retry configuration, and returns
    /// the successful response.
    async fn send<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response, Error> {
        let url = self.base_url.join(path)?;

        execute_with_retry(&self.retry_config, &self.stats, || async {
            let response = self
                .client
                .post(url.clone())
                .headers(self.headers.clone())
                .json(body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let request_id = response
                .headers()
                .get("io.spicedb.respmeta.requestid")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let error_text = response.text().await.unwrap_or_default();
            let err = map_status_error(status.as_u16(), &error_text);
            Err(match request_id {
                Some(id) => err.with_request_id(id),
                None => err,
            })
        })
        .await
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, Error>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        response.json::<R>().await.map_err(|e| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("failed to parse response: {}", e),
            )
            .with_source(e)
        })
    }
}

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ObjectReferenceDto {
    object_type: String,
    object_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct SubjectReferenceDto {
    object: ObjectReferenceDto,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    optional_relation: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RelationshipDto {
    resource: ObjectReferenceDto,
    relation: String,
    subject: SubjectReferenceDto,
}

impl From<&Relationship> for RelationshipDto {
    fn from(r: &Relationship) -> Self {
        Self {
            resource: ObjectReferenceDto {
                object_type: r.resource_type().to_owned(),
                object_id: r.resource_id().to_owned(),
            },
            relation: r.relation().to_owned(),
            subject: SubjectReferenceDto {
                object: ObjectReferenceDto {
                    object_type: r.subject_type().to_owned(),
                    object_id: r.subject_id().to_owned(),
                },
                optional_relation: r.subject_relation().unwrap_or_default().to_owned(),
            },
        }
    }
}

impl From<RelationshipDto> for Relationship {
    fn from(dto: RelationshipDto) -> Self {
        Relationship::new(
            ObjectReference::new(dto.resource.object_type, dto.resource.object_id),
            dto.relation,
            SubjectReference::new(dto.subject.object.object_type, dto.subject.object.object_id)
                .with_relation(dto.subject.optional_relation),
        )
    }
}

#[derive(Debug, Serialize)]
struct RelationshipUpdateDto {
    operation: &'static str,
    relationship: RelationshipDto,
}

#[derive(Debug, Serialize)]
struct WriteRelationshipsBody {
    updates: Vec<RelationshipUpdateDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteRelationshipsResponse {
    #[serde(default)]
    written_at: Option<ConsistencyToken>,
}

#[derive(Debug, Serialize)]
struct RelationFilterDto {
    relation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectFilterDto {
    subject_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_relation: Option<RelationFilterDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipFilterDto {
    resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_relation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_subject_filter: Option<SubjectFilterDto>,
}

impl From<&RelationshipFilter> for RelationshipFilterDto {
    fn from(filter: &RelationshipFilter) -> Self {
        Self {
            resource_type: filter.resource_type.clone(),
            optional_resource_id: filter.optional_resource_id.clone(),
            optional_relation: filter.optional_relation.clone(),
            optional_subject_filter: filter.optional_subject_filter.as_ref().map(|subject| {
                SubjectFilterDto {
                    subject_type: subject.subject_type.clone(),
                    optional_subject_id: subject.optional_subject_id.clone(),
                    optional_relation: subject.optional_relation.as_ref().map(|relation| {
                        RelationFilterDto {
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
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum ConsistencyDto {
    MinimizeLatency(bool),
    AtLeastAsFresh(ConsistencyToken),
    AtExactSnapshot(ConsistencyToken),
    FullyConsistent(bool),
}

impl From<Consistency> for ConsistencyDto {
    fn from(consistency: Consistency) -> Self {
        match consistency {
            Consistency::MinimizeLatency => ConsistencyDto::MinimizeLatency(true),
            Consistency::AtLeastAsFresh(token) => ConsistencyDto::AtLeastAsFresh(token),
            Consistency::AtExactSnapshot(token) => ConsistencyDto::AtExactSnapshot(token),
            Consistency::FullyConsistent => ConsistencyDto::FullyConsistent(true),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadRelationshipsBody {
    consistency: ConsistencyDto,
    relationship_filter: RelationshipFilterDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRelationshipsBody {
    relationship_filter: RelationshipFilterDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRelationshipsResponse {
    #[serde(default)]
    deleted_at: Option<ConsistencyToken>,
}

/// One line of a streamed read.
#[derive(Debug, Deserialize)]
struct ReadStreamLine {
    #[serde(default)]
    result: Option<ReadResult>,
    #[serde(default)]
    error: Option<GatewayError>,
}

#[derive(Debug, Deserialize)]
struct ReadResult {
    relationship: RelationshipDto,
}

/// Error body reported by the gateway, carrying the gRPC status code.
#[derive(Debug, Deserialize)]
struct GatewayError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

// ============================================================================
// TransportClient Implementation
// ============================================================================

#[async_trait::async_trait]
impl TransportClient for RestTransport {
    async fn write_relationships(
        &self,
        relationships: Vec<Relationship>,
    ) -> Result<ConsistencyToken, Error> {
        let body = WriteRelationshipsBody {
            updates: relationships
                .iter()
                .map(|r| RelationshipUpdateDto {
                    operation: "OPERATION_TOUCH",
                    relationship: r.into(),
                })
                .collect(),
        };

        let response: WriteRelationshipsResponse = self.post(WRITE_PATH, &body).await?;
        Ok(response.written_at.unwrap_or_else(|| ConsistencyToken::new("")))
    }

    async fn read_relationships(
        &self,
        filter: RelationshipFilter,
        consistency: Consistency,
    ) -> Result<RelationshipStream, Error> {
        let body = ReadRelationshipsBody {
            consistency: consistency.into(),
            relationship_filter: (&filter).into(),
        };

        let response = self.send(READ_PATH, &body).await?;
        let guard = ActiveStreamGuard::new(Arc::clone(&self.stats));
        let stream = parse_ndjson_stream(response.bytes_stream(), guard);

        Ok(Box::pin(stream))
    }

    async fn delete_relationships(
        &self,
        filter: RelationshipFilter,
    ) -> Result<ConsistencyToken, Error> {
        let body = DeleteRelationshipsBody {
            relationship_filter: (&filter).into(),
        };

        let response: DeleteRelationshipsResponse = self.post(DELETE_PATH, &body).await?;
        Ok(response.deleted_at.unwrap_or_else(|| ConsistencyToken::new("")))
    }

    fn transport_type(&self) -> Option<Transport> {
        Some(Transport::Http)
    }

    fn stats(&self) -> TransportStats {
        self.stats.read().clone()
    }
}

// ============================================================================
// NDJSON Parsing
// ============================================================================

/// Parses a newline-delimited JSON read stream into relationships.
///
/// The stream ends after the first error. `guard` is held until the stream is
/// finished or dropped.
fn parse_ndjson_stream<S>(
    byte_stream: S,
    guard: ActiveStreamGuard,
) -> impl Stream<Item = Result<Relationship, Error>> + Send + 'static
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    struct State<S> {
        stream: S,
        buffer: Vec<u8>,
        done: bool,
        _guard: ActiveStreamGuard,
    }

    let state = State {
        stream: byte_stream,
        buffer: Vec::new(),
        done: false,
        _guard: guard,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if let Some(pos) = state.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                match parse_line(&line) {
                    Some(Ok(relationship)) => return Some((Ok(relationship), state)),
                    Some(Err(err)) => {
                        state.done = true;
                        return Some((Err(err), state));
                    }
                    None => continue,
                }
            }

            match state.stream.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(map_reqwest_error(e)), state));
                }
                None => {
                    // A final line may arrive without a trailing newline.
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    match parse_line(&rest) {
                        Some(item) => return Some((item, state)),
                        None => return None,
                    }
                }
            }
        }
    })
}

/// Parses one stream line. Blank lines yield `None`.
fn parse_line(line: &[u8]) -> Option<Result<Relationship, Error>> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("stream line is not UTF-8: {}", e),
            )));
        }
    };
    if text.is_empty() {
        return None;
    }

    let parsed: ReadStreamLine = match serde_json::from_str(text) {
        Ok(parsed) => parsed,
        Err(e) => return Some(Err(Error::from(e))),
    };

    if let Some(error) = parsed.error {
        return Some(Err(Error::new(
            ErrorKind::from_grpc_code_value(error.code),
            error.message,
        )));
    }

    match parsed.result {
        Some(result) => Some(Ok(result.relationship.into())),
        None => Some(Err(Error::new(
            ErrorKind::InvalidResponse,
            "stream line has neither result nor error",
        ))),
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Maps reqwest errors to crate errors.
fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("request timed out: {}", e)).with_source(e)
    } else if e.is_connect() {
        Error::connection(format!("connection failed: {}", e)).with_source(e)
    } else {
        Error::new(ErrorKind::Transport, format!("HTTP error: {}", e)).with_source(e)
    }
}

/// Maps a failed HTTP response to an error, keeping the backend message
/// verbatim.
///
/// The gateway reports `{"code": <grpc code>, "message": "..."}`; the gRPC
/// code is more precise than the HTTP status when present.
fn map_status_error(status: u16, body: &str) -> Error {
    if let Ok(gateway) = serde_json::from_str::<GatewayError>(body) {
        if !gateway.message.is_empty() {
            let kind = if gateway.code != 0 {
                ErrorKind::from_grpc_code_value(gateway.code)
            } else {
                ErrorKind::from_http_status(status)
            };
            return Error::new(kind, gateway.message);
        }
    }

    let message = if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_owned()
    };
    Error::new(ErrorKind::from_http_status(status), message)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::SubjectFilter;

    #[test]
    fn test_map_status_error_gateway_body() {
        let body = r#"{"code":9,"message":"object definition `documnt` not found","details":[]}"#;
        let err = map_status_error(400, body);
        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        assert_eq!(err.message(), "object definition `documnt` not found");
    }

    #[test]
    fn test_map_status_error_plain_body() {
        let err = map_status_error(503, "upstream connect error");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.message(), "upstream connect error");

        let err = map_status_error(401, "");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "HTTP 401");
    }

    #[test]
    fn test_parse_line() {
        let line = br#"{"result":{"readAt":{"token":"t"},"relationship":{"resource":{"objectType":"document","objectId":"doc1"},"relation":"viewer","subject":{"object":{"objectType":"user","objectId":"alice"}}}}}"#;
        let rel = parse_line(line).unwrap().unwrap();
        assert_eq!(rel.to_string(), "document:doc1#viewer@user:alice");

        assert!(parse_line(b"   \n").is_none());

        let err = parse_line(br#"{"error":{"code":16,"message":"invalid token"}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "invalid token");
    }

    #[test]
    fn test_filter_dto_direct_subject() {
        let rel: Relationship = "document:doc1#viewer@user:alice".parse().unwrap();
        let dto = RelationshipFilterDto::from(&RelationshipFilter::exact(&rel));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resourceType": "document",
                "optionalResourceId": "doc1",
                "optionalRelation": "viewer",
                "optionalSubjectFilter": {
                    "subjectType": "user",
                    "optionalSubjectId": "alice",
                    "optionalRelation": {"relation": ""}
                }
            })
        );
    }

    #[test]
    fn test_filter_dto_open_subject() {
        let filter = RelationshipFilter::new("document").with_subject_filter(SubjectFilter {
            subject_type: "group".into(),
            optional_subject_id: None,
            optional_relation: None,
        });
        let json = serde_json::to_value(RelationshipFilterDto::from(&filter)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resourceType": "document",
                "optionalSubjectFilter": {"subjectType": "group"}
            })
        );
    }

    #[test]
    fn test_consistency_dto() {
        let json = serde_json::to_value(ConsistencyDto::from(Consistency::FullyConsistent)).unwrap();
        assert_eq!(json, serde_json::json!({"fullyConsistent": true}));

        let json = serde_json::to_value(ConsistencyDto::from(Consistency::AtLeastAsFresh(
            "zed".into(),
        )))
        .unwrap();
        assert_eq!(json, serde_json::json!({"atLeastAsFresh": {"token": "zed"}}));
    }

    #[test]
    fn test_relationship_dto_subject_set() {
        let rel: Relationship = "group:eng#member@group:eng#member".parse().unwrap();
        let json = serde_json::to_value(RelationshipDto::from(&rel)).unwrap();
        assert_eq!(json["subject"]["optionalRelation"], "member");
        let back: Relationship = serde_json::from_value::<RelationshipDto>(json).unwrap().into();
        assert_eq!(back, rel);
    }
}
