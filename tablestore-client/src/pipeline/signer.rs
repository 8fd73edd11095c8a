//! Request signers.
//!
//! The signer is the distinguished last stage of the request pipeline. The
//! signature algorithm itself lives behind the [`Signer`] trait; this module
//! ships the anonymous signer and a credentials signer that writes the
//! identity headers and checks that responses were signed for the same key.

use std::fmt;
use std::sync::Arc;

use tablestore_core::headers;

use crate::message::{RequestMessage, ResponseMessage, TraceContext};
use crate::ClientError;

/// Signs outgoing requests and verifies response signatures.
pub trait Signer: Send + Sync {
    /// Sign the request. Runs after every request handler.
    fn sign(&self, trace: &TraceContext, request: &mut RequestMessage) -> Result<(), ClientError>;

    /// Verify the signature of a successful response.
    fn verify_response(&self, response: &ResponseMessage) -> Result<(), ClientError> {
        let _ = response;
        Ok(())
    }
}

/// A signer that leaves requests unsigned.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSigner;

impl Signer for NoSigner {
    fn sign(&self, _trace: &TraceContext, _request: &mut RequestMessage) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Computes the signature string for a signed request.
pub type SignatureFn = Arc<dyn Fn(&RequestMessage) -> Result<String, ClientError> + Send + Sync>;

/// Signer for access-key credentials.
///
/// Writes `x-ots-accesskeyid` (and `x-ots-ststoken` for temporary
/// credentials), then `authorization: OTS <access key id>:<signature>` where
/// the signature comes from the configured [`SignatureFn`].
#[derive(Clone)]
pub struct CredentialsSigner {
    access_key_id: String,
    security_token: Option<String>,
    signature: SignatureFn,
}

impl CredentialsSigner {
    /// Create a signer for the given key and signature function.
    pub fn new<F>(access_key_id: impl Into<String>, signature: F) -> Self
    where
        F: Fn(&RequestMessage) -> Result<String, ClientError> + Send + Sync + 'static,
    {
        Self {
            access_key_id: access_key_id.into(),
            security_token: None,
            signature: Arc::new(signature),
        }
    }

    /// Attach a security token for temporary credentials.
    pub fn security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    /// The access key id this signer signs for.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    fn authorization_prefix(&self) -> String {
        format!("OTS {}:", self.access_key_id)
    }
}

impl fmt::Debug for CredentialsSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsSigner")
            .field("access_key_id", &self.access_key_id)
            .field("security_token", &self.security_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Signer for CredentialsSigner {
    fn sign(&self, _trace: &TraceContext, request: &mut RequestMessage) -> Result<(), ClientError> {
        request.set_header(headers::ACCESS_KEY_ID, &self.access_key_id)?;
        if let Some(token) = &self.security_token {
            request.set_header(headers::STS_TOKEN, token)?;
        }
        let signature = (self.signature)(request)?;
        let authorization = format!("{}{}", self.authorization_prefix(), signature);
        request.set_header(headers::AUTHORIZATION, &authorization)
    }

    fn verify_response(&self, response: &ResponseMessage) -> Result<(), ClientError> {
        let authorization = response.require_header(headers::AUTHORIZATION)?;
        if authorization.starts_with(&self.authorization_prefix()) {
            Ok(())
        } else {
            Err(ClientError::SignatureMismatch(format!(
                "response signed as {:?}, expected access key {}",
                authorization, self.access_key_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    fn signer() -> CredentialsSigner {
        CredentialsSigner::new("ak-1", |req: &RequestMessage| {
            Ok(format!("sig-{}", req.action))
        })
    }

    #[test]
    fn test_credentials_signer_writes_identity_headers() {
        let mut req = RequestMessage::new("GetRow", "http://localhost/GetRow", Bytes::new());
        signer()
            .security_token("sts")
            .sign(&TraceContext::new("GetRow"), &mut req)
            .unwrap();

        assert_eq!(req.header(headers::ACCESS_KEY_ID), Some("ak-1"));
        assert_eq!(req.header(headers::STS_TOKEN), Some("sts"));
        assert_eq!(req.header(headers::AUTHORIZATION), Some("OTS ak-1:sig-GetRow"));
    }

    #[test]
    fn test_verify_response_checks_access_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("OTS ak-2:abc"));
        let resp = ResponseMessage::new(StatusCode::OK, headers, Bytes::new());

        let err = signer().verify_response(&resp).unwrap_err();
        assert!(matches!(err, ClientError::SignatureMismatch(_)));
    }

    #[test]
    fn test_verify_response_requires_authorization() {
        let resp = ResponseMessage::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        let err = signer().verify_response(&resp).unwrap_err();
        assert!(matches!(err, ClientError::MissingHeader { name } if name == "authorization"));
    }
}
