//! Connection settings for the permissions database.

use std::fmt;
use std::time::Duration;

use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{RetryConfig, TlsConfig};
use crate::Error;
use crate::transport::Transport;

/// Environment variable holding the endpoint.
pub const ENV_ENDPOINT: &str = "SPICEDB_ENDPOINT";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "SPICEDB_TOKEN";
/// Environment variable enabling plaintext connections.
pub const ENV_INSECURE: &str = "SPICEDB_INSECURE";
/// Environment variable selecting the transport (`grpc` or `http`).
pub const ENV_TRANSPORT: &str = "SPICEDB_TRANSPORT";

/// A bearer token (SpiceDB preshared key).
///
/// The value is zeroized on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl From<String> for BearerToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for BearerToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

/// Everything needed to reach a SpiceDB-compatible permissions database.
///
/// ## Example
///
/// ```rust
/// use spicedb_relationship::{ProviderConfig, Transport};
/// use std::time::Duration;
///
/// let config = ProviderConfig::builder()
///     .endpoint("localhost:50051")
///     .token("somerandomkeyhere")
///     .insecure(true)
///     .timeout(Duration::from_secs(5))
///     .build();
///
/// assert_eq!(config.transport, Transport::Grpc);
/// assert_eq!(config.endpoint_url().unwrap().as_str(), "http://localhost:50051/");
/// assert!(!format!("{:?}", config).contains("somerandomkeyhere"));
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ProviderConfig {
    /// Host and port, or a full URL, of the permissions database.
    #[builder(into)]
    pub endpoint: String,

    /// Bearer token sent with every request.
    #[builder(into)]
    pub token: BearerToken,

    /// Connect without TLS.
    #[builder(default = false)]
    pub insecure: bool,

    /// Which wire protocol to use.
    #[builder(default)]
    pub transport: Transport,

    /// Per-request timeout.
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,

    /// TLS settings, ignored when `insecure` is set.
    #[builder(default)]
    pub tls: TlsConfig,

    /// Transport-level retries. Disabled unless set.
    #[builder(default)]
    pub retry: RetryConfig,
}

impl ProviderConfig {
    /// Loads configuration from `SPICEDB_*` environment variables.
    ///
    /// `SPICEDB_ENDPOINT` and `SPICEDB_TOKEN` are required.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::configuration(format!("{} is not set", ENV_ENDPOINT)))?;
        let token = lookup(ENV_TOKEN)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::configuration(format!("{} is not set", ENV_TOKEN)))?;

        let insecure = match lookup(ENV_INSECURE) {
            Some(value) => parse_bool(ENV_INSECURE, &value)?,
            None => false,
        };
        let transport = match lookup(ENV_TRANSPORT) {
            Some(value) => value.parse()?,
            None => Transport::default(),
        };

        Ok(Self::builder()
            .endpoint(endpoint)
            .token(token)
            .insecure(insecure)
            .transport(transport)
            .build())
    }

    /// Resolves the endpoint to a URL.
    ///
    /// A bare `host:port` gets `http://` when `insecure` is set and
    /// `https://` otherwise.
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        let url = if self.endpoint.contains("://") {
            Url::parse(&self.endpoint)?
        } else {
            let scheme = if self.insecure { "http" } else { "https" };
            Url::parse(&format!("{}://{}", scheme, self.endpoint))?
        };

        if url.host_str().is_none() {
            return Err(Error::configuration(format!(
                "endpoint {:?} has no host",
                self.endpoint
            )));
        }
        Ok(url)
    }

    /// Checks the settings without connecting.
    pub fn validate(&self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::configuration("token must not be empty"));
        }
        let url = self.endpoint_url()?;
        if !self.insecure && url.scheme() == "http" {
            return Err(Error::configuration(
                "plaintext endpoint requires insecure = true",
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{} must be a boolean, got {:?}",
            key, value
        ))),
    }
}
