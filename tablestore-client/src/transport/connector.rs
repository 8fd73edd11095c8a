//! TLS setup for the HTTPS connector.
//!
//! The crypto provider and root certificates come from cargo features:
//! - `tls-ring` / `tls-aws-lc` select the provider; without either, a
//!   provider installed with `CryptoProvider::install_default()` is used;
//! - `tls-native-roots` / `tls-webpki-roots` select the roots.

use std::sync::Arc;
use std::time::Duration;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;

use crate::ClientError;

/// Returns whether a crypto provider and root certificates are compiled in.
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

fn crypto_provider() -> Result<Arc<rustls::crypto::CryptoProvider>, ClientError> {
    #[cfg(feature = "tls-ring")]
    let provider = Some(Arc::new(rustls::crypto::ring::default_provider()));

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    let provider = Some(Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    let provider = rustls::crypto::CryptoProvider::get_default().cloned();

    provider.ok_or_else(|| {
        ClientError::Config(
            "no TLS crypto provider: enable `tls-ring` or `tls-aws-lc`, \
             or install one with CryptoProvider::install_default()"
                .into(),
        )
    })
}

/// Root certificates from the enabled features. May be empty.
fn root_store() -> rustls::RootCertStore {
    #[allow(unused_mut)]
    let mut roots = rustls::RootCertStore::empty();

    #[cfg(feature = "tls-native-roots")]
    {
        let native = rustls_native_certs::load_native_certs();
        if !native.errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(errors = ?native.errors, "some native root certificates failed to load");
        }
        roots.add_parsable_certificates(native.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    roots
}

/// Build the default TLS configuration.
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let builder = ClientConfig::builder_with_provider(crypto_provider()?)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Config(format!("TLS protocol versions: {e}")))?;
    Ok(builder
        .with_root_certificates(root_store())
        .with_no_client_auth())
}

/// Build a connector that speaks both `https://` and plain `http://`.
pub fn build_https_connector(
    tls_config: ClientConfig,
    connect_timeout: Option<Duration>,
) -> HttpsConnector<HttpConnector> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(connect_timeout);

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_all_versions()
        .wrap_connector(http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    fn test_default_tls_config_builds() {
        assert!(default_tls_config().is_ok());
    }

    #[test]
    #[cfg(all(feature = "tls-ring", feature = "tls-native-roots"))]
    fn test_has_tls_support_with_defaults() {
        assert!(has_tls_support());
    }
}
