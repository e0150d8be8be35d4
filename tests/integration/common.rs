//! Shared harness: configuration, schema setup and unique IDs.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use spicedb_relationship::{Client, DesiredState, ProviderConfig, RelationshipResource, Transport};
use tokio::sync::OnceCell;

/// Schema every test writes relationships against.
pub const SCHEMA: &str = r#"
definition user {
    relation self: user
}

definition group {
    relation member: user | group#member
}

definition document {
    relation viewer: user | user:* | group#member
}
"#;

static SCHEMA_WRITTEN: OnceCell<()> = OnceCell::const_new();
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Loads the client configuration from the environment.
pub fn config(transport: Transport) -> Result<ProviderConfig> {
    let mut config = ProviderConfig::from_env().context(
        "SPICEDB_ENDPOINT and SPICEDB_TOKEN must be set to run integration tests",
    )?;
    config.transport = transport;
    if transport.is_http() {
        config.endpoint = http_endpoint();
    }
    Ok(config)
}

/// Returns the HTTP gateway URL.
pub fn http_endpoint() -> String {
    std::env::var("SPICEDB_HTTP_ENDPOINT").unwrap_or_else(|_| "http://localhost:8443".to_string())
}

/// Writes [`SCHEMA`] once per test run through the HTTP gateway.
pub async fn ensure_schema() -> Result<()> {
    SCHEMA_WRITTEN
        .get_or_try_init(|| async {
            let config = config(Transport::Grpc)?;
            let response = reqwest::Client::new()
                .post(format!("{}/v1/schema/write", http_endpoint()))
                .bearer_auth(config.token.expose())
                .json(&serde_json::json!({ "schema": SCHEMA }))
                .send()
                .await
                .context("failed to reach the HTTP gateway")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("schema write failed: {} {}", status, body);
            }
            Ok(())
        })
        .await?;
    Ok(())
}

/// Builds a reconciler for `transport` against a schema-initialized store.
pub async fn resource(transport: Transport) -> Result<RelationshipResource> {
    ensure_schema().await?;
    let client = Client::from_config(&config(transport)?).await?;
    Ok(RelationshipResource::new(client))
}

/// Returns an ID unique to this test run.
pub fn unique_id(prefix: &str) -> String {
    let run = RUN_ID.get_or_init(|| format!("{:016x}", fastrand::u64(..)));
    format!("{}-{}-{:08x}", prefix, run, fastrand::u32(..))
}

/// Parses a desired state, panicking on malformed test input.
pub fn state(text: &str) -> DesiredState {
    DesiredState::new(text).expect("test relationship should be valid")
}
