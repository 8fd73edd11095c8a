//! Typed responses and the response consumer.
//!
//! [`OtsResponse`] wraps a decoded message together with the response
//! headers; [`ResponseConsumer`] turns one streaming HTTP response into such
//! a value.

mod consumer;

use std::ops::Deref;

use http::HeaderMap;
use tablestore_core::headers;

pub use consumer::{ConsumerState, DEFAULT_BODY_CAPACITY, DEFAULT_MAX_BODY_SIZE, ResponseConsumer};

/// A decoded response plus the headers it arrived with.
///
/// # Example
///
/// ```ignore
/// let response = client
///     .call_unary::<GetRowRequest, GetRowResponse>("GetRow", &req)
///     .await?;
///
/// println!("request id: {:?}", response.request_id());
/// let row = response.into_inner().row;
/// ```
#[derive(Debug, Clone)]
pub struct OtsResponse<T> {
    inner: T,
    metadata: Metadata,
}

impl<T> OtsResponse<T> {
    pub fn new(inner: T, metadata: Metadata) -> Self {
        Self { inner, metadata }
    }

    /// Extract the inner value, discarding metadata.
    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The service request id of the attempt that produced this response.
    pub fn request_id(&self) -> Option<&str> {
        self.metadata.request_id()
    }

    /// Transform the inner value, preserving metadata.
    pub fn map<U, F>(self, f: F) -> OtsResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        OtsResponse {
            inner: f(self.inner),
            metadata: self.metadata,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_parts(self) -> (T, Metadata) {
        (self.inner, self.metadata)
    }
}

impl<T> Deref for OtsResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Response headers.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    headers: HeaderMap,
}

impl Metadata {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Get a header value by name.
    ///
    /// Returns `None` if the header is absent or not valid text.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.headers.contains_key(key)
    }

    /// `x-ots-requestid`.
    pub fn request_id(&self) -> Option<&str> {
        self.get(headers::REQUEST_ID)
    }

    /// `x-ots-tracerinfo`, opaque.
    pub fn tracer_info(&self) -> Option<&str> {
        self.get(headers::TRACE_INFO)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

impl From<HeaderMap> for Metadata {
    fn from(headers: HeaderMap) -> Self {
        Self::new(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    #[test]
    fn test_response_map_keeps_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert(headers::REQUEST_ID, HeaderValue::from_static("0000-aaaa"));
        let response = OtsResponse::new(5, Metadata::new(headers));

        let mapped = response.map(|x| x * 2);
        assert_eq!(*mapped, 10);
        assert_eq!(mapped.request_id(), Some("0000-aaaa"));
    }

    #[test]
    fn test_metadata_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(headers::TRACE_INFO, HeaderValue::from_static("span=7"));
        let metadata = Metadata::from(headers);

        assert_eq!(metadata.tracer_info(), Some("span=7"));
        assert!(metadata.contains(headers::TRACE_INFO));
        assert_eq!(metadata.request_id(), None);
    }

    #[test]
    fn test_response_into_parts() {
        let response = OtsResponse::new("row".to_string(), Metadata::default());
        let (inner, metadata) = response.into_parts();
        assert_eq!(inner, "row");
        assert!(metadata.headers().is_empty());
    }
}
