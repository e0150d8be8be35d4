//! Client builder with typestate pattern.

use std::marker::PhantomData;
use std::time::Duration;

use crate::config::{BearerToken, ProviderConfig, RetryConfig, TlsConfig};
use crate::transport::Transport;
use crate::{Client, Error};

/// Marker type: endpoint not yet provided.
pub struct NoEndpoint;

/// Marker type: endpoint has been provided.
pub struct HasEndpoint;

/// Marker type: token not yet provided.
pub struct NoToken;

/// Marker type: token has been provided.
pub struct HasToken;

/// Builder for creating [`Client`] instances.
///
/// Uses the typestate pattern so `build()` only exists once both the
/// endpoint and the token are set.
///
/// ```compile_fail
/// use spicedb_relationship::Client;
///
/// # async fn example() {
/// // Missing token: `build` is not available.
/// let client = Client::builder().endpoint("localhost:50051").build().await;
/// # }
/// ```
pub struct ClientBuilder<EndpointState, TokenState> {
    endpoint: Option<String>,
    token: Option<BearerToken>,
    insecure: bool,
    transport: Transport,
    timeout: Option<Duration>,
    tls_config: TlsConfig,
    retry_config: RetryConfig,
    _endpoint_state: PhantomData<EndpointState>,
    _token_state: PhantomData<TokenState>,
}

impl ClientBuilder<NoEndpoint, NoToken> {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            token: None,
            insecure: false,
            transport: Transport::default(),
            timeout: None,
            tls_config: TlsConfig::default(),
            retry_config: RetryConfig::default(),
            _endpoint_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl Default for ClientBuilder<NoEndpoint, NoToken> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ClientBuilder<NoEndpoint, T> {
    /// Sets the endpoint: `host:port` or a full URL.
    pub fn endpoint(self, endpoint: impl Into<String>) -> ClientBuilder<HasEndpoint, T> {
        ClientBuilder {
            endpoint: Some(endpoint.into()),
            token: self.token,
            insecure: self.insecure,
            transport: self.transport,
            timeout: self.timeout,
            tls_config: self.tls_config,
            retry_config: self.retry_config,
            _endpoint_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl<E> ClientBuilder<E, NoToken> {
    /// Sets the bearer token.
    pub fn token(self, token: impl Into<BearerToken>) -> ClientBuilder<E, HasToken> {
        ClientBuilder {
            endpoint: self.endpoint,
            token: Some(token.into()),
            insecure: self.insecure,
            transport: self.transport,
            timeout: self.timeout,
            tls_config: self.tls_config,
            retry_config: self.retry_config,
            _endpoint_state: PhantomData,
            _token_state: PhantomData,
        }
    }
}

impl<E, T> ClientBuilder<E, T> {
    /// Connects without TLS.
    ///
    /// **WARNING**: the token travels in plaintext. Use only against local
    /// development servers.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Selects the transport (gRPC by default).
    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = config;
        self
    }

    /// Sets the transport-level retry configuration.
    #[must_use]
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

impl ClientBuilder<HasEndpoint, HasToken> {
    /// Returns the configuration this builder describes.
    pub fn into_config(self) -> Result<ProviderConfig, Error> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::configuration("endpoint is required"))?;
        let token = self
            .token
            .ok_or_else(|| Error::configuration("token is required"))?;

        let config = ProviderConfig::builder()
            .endpoint(endpoint)
            .token(token)
            .insecure(self.insecure)
            .transport(self.transport)
            .tls(self.tls_config)
            .retry(self.retry_config);

        Ok(match self.timeout {
            Some(timeout) => config.timeout(timeout).build(),
            None => config.build(),
        })
    }

    /// Builds the client.
    ///
    /// No connection is made until the first request.
    pub async fn build(self) -> Result<Client, Error> {
        let config = self.into_config()?;
        Client::from_config(&config).await
    }
}
