//! TLS configuration for connections to the permissions database.

use std::path::PathBuf;

use crate::Error;

/// Configuration for TLS connections.
///
/// By default the client trusts the system root certificates. Deployments
/// fronted by a private CA can supply it here.
///
/// ## Example: Custom CA
///
/// ```rust
/// use spicedb_relationship::TlsConfig;
///
/// let config = TlsConfig::builder()
///     .ca_cert_file("/etc/spicedb/ca.crt")
///     .build();
/// assert!(config.has_custom_ca());
/// ```
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct TlsConfig {
    /// Custom CA certificate file path.
    #[builder(into)]
    pub ca_cert_file: Option<PathBuf>,

    /// Custom CA certificate PEM data.
    #[builder(into)]
    pub ca_cert_pem: Option<String>,

    /// Overrides the server name used for certificate verification.
    #[builder(into)]
    pub domain_name: Option<String>,
}

impl TlsConfig {
    /// Returns `true` if a custom CA is configured.
    pub fn has_custom_ca(&self) -> bool {
        self.ca_cert_file.is_some() || self.ca_cert_pem.is_some()
    }

    /// Loads the configured CA certificate as PEM bytes.
    ///
    /// `ca_cert_pem` takes precedence over `ca_cert_file`.
    pub fn load_ca_pem(&self) -> Result<Option<Vec<u8>>, Error> {
        if let Some(ref pem) = self.ca_cert_pem {
            return Ok(Some(pem.as_bytes().to_vec()));
        }
        match self.ca_cert_file {
            Some(ref path) => std::fs::read(path).map(Some).map_err(|e| {
                Error::configuration(format!("failed to read certificate {:?}: {}", path, e))
                    .with_source(e)
            }),
            None => Ok(None),
        }
    }
}
