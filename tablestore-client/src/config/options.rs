//! Per-call configuration.

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use tablestore_core::headers;

use crate::ClientError;

/// Options for a single call.
///
/// # Example
///
/// ```ignore
/// use tablestore_client::CallOptions;
/// use std::time::Duration;
///
/// let options = CallOptions::new()
///     .timeout(Duration::from_secs(5))
///     .header("x-tenant", "acme")
///     .priority("low");
///
/// let rows = client.batch_get_row_with_options(request, options).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
    pub(crate) priority: Option<String>,
    pub(crate) idempotent: bool,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for each attempt of this call, overriding the
    /// client's default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Add a custom header for this call.
    ///
    /// Names starting with `x-ots-` belong to the protocol; the call fails
    /// with a configuration error if one is set here.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    /// Try to add a custom header for this call.
    ///
    /// Returns `None` if the header name or value is invalid.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers.insert(name, value);
        Some(self)
    }

    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Scheduling hint sent as `x-ots-priority`. Passed through untouched.
    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn get_priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Mark a unary call as safe to resend after an unknown outcome, so
    /// timeouts and internal server errors are retried too.
    ///
    /// Batch calls ignore this; their operation decides.
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Copy this call's headers into an outgoing header map.
    pub(crate) fn apply_headers(&self, target: &mut HeaderMap) -> Result<(), ClientError> {
        for (name, value) in &self.headers {
            if headers::is_reserved(name.as_str()) {
                return Err(ClientError::Config(format!(
                    "header {name} is reserved and cannot be set per call"
                )));
            }
            target.insert(name.clone(), value.clone());
        }
        if let Some(priority) = &self.priority {
            let value = HeaderValue::from_str(priority)
                .map_err(|_| ClientError::Config(format!("invalid priority: {priority}")))?;
            target.insert(HeaderName::from_static(headers::PRIORITY), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_options_default() {
        let options = CallOptions::new();
        assert!(options.get_timeout().is_none());
        assert!(options.get_priority().is_none());
        assert!(!options.is_idempotent());
    }

    #[test]
    fn test_call_options_combined() {
        let options = CallOptions::new()
            .timeout(Duration::from_secs(30))
            .header("x-tenant", "acme")
            .priority("low");

        assert_eq!(options.get_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(options.get_headers().get("x-tenant").unwrap(), "acme");
        assert_eq!(options.get_priority(), Some("low"));
    }

    #[test]
    fn test_try_header_invalid() {
        assert!(CallOptions::new().try_header("invalid\0name", "value").is_none());
    }

    #[test]
    fn test_apply_headers_sets_priority() {
        let options = CallOptions::new().header("x-tenant", "acme").priority("high");
        let mut target = HeaderMap::new();
        options.apply_headers(&mut target).unwrap();

        assert_eq!(target.get("x-tenant").unwrap(), "acme");
        assert_eq!(target.get(headers::PRIORITY).unwrap(), "high");
    }

    #[test]
    fn test_apply_headers_rejects_reserved_names() {
        let options = CallOptions::new().header("x-ots-instancename", "other");
        let mut target = HeaderMap::new();
        let err = options.apply_headers(&mut target).unwrap_err();
        assert!(matches!(err, ClientError::Config(msg) if msg.contains("x-ots-instancename")));
        assert!(target.is_empty());
    }
}
