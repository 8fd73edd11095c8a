//! Content-MD5 digests.
//!
//! Every request and response body is accompanied by an `x-ots-contentmd5`
//! header holding the standard base64 encoding of the body's MD5 digest.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A digest header that does not match the body it accompanies.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("content md5 mismatch: header {expected}, body {actual}")]
pub struct DigestMismatch {
    /// Digest announced by the peer.
    pub expected: String,
    /// Digest computed from the received body.
    pub actual: String,
}

/// Compute the base64-encoded MD5 digest of `body`.
///
/// # Example
///
/// ```
/// use tablestore_core::content_md5;
///
/// assert_eq!(content_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
/// ```
pub fn content_md5(body: &[u8]) -> String {
    let digest = md5::compute(body);
    STANDARD.encode(digest.0)
}

/// Verify that `announced` is the digest of `body`.
pub fn verify_content_md5(announced: &str, body: &[u8]) -> Result<(), DigestMismatch> {
    let actual = content_md5(body);
    if actual == announced.trim() {
        Ok(())
    } else {
        Err(DigestMismatch {
            expected: announced.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // md5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(content_md5(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
    }

    #[test]
    fn test_verify_matches() {
        let digest = content_md5(b"payload");
        assert!(verify_content_md5(&digest, b"payload").is_ok());
    }

    #[test]
    fn test_verify_mismatch_reports_both_sides() {
        let digest = content_md5(b"payload");
        let err = verify_content_md5(&digest, b"tampered").unwrap_err();
        assert_eq!(err.expected, digest);
        assert_eq!(err.actual, content_md5(b"tampered"));
    }
}
