//! Configuration types.
//!
//! - [`ProviderConfig`]: endpoint, credentials and transport selection
//! - [`RetryConfig`]: transport-level retry behavior
//! - [`TlsConfig`]: TLS settings

mod provider;
mod retry;
mod tls;

pub use provider::{
    BearerToken, ENV_ENDPOINT, ENV_INSECURE, ENV_TOKEN, ENV_TRANSPORT, ProviderConfig,
};
pub use retry::RetryConfig;
pub use tls::TlsConfig;
