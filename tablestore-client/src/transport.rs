//! HTTP transport.
//!
//! [`HyperTransport`] sends one request per attempt over hyper-util's pooled
//! client, with rustls for `https://` endpoints.
//!
//! # Feature Flags
//!
//! - `tls` (default): `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc`: crypto providers
//! - `tls-native-roots` / `tls-webpki-roots`: root certificates

mod connector;
mod hyper;

pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use hyper::{HyperTransport, HyperTransportBuilder};

pub use rustls::ClientConfig as TlsClientConfig;
