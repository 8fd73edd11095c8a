//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`TablestoreClient`].

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Uri};
use tablestore_core::headers;

use crate::ClientError;
use crate::client::TablestoreClient;
use crate::config::RetryPolicy;
use crate::pipeline::{ExecutionContext, NoSigner, RequestHandler, ResponseHandler, Signer};
use crate::response::DEFAULT_MAX_BODY_SIZE;
use crate::transport::HyperTransport;

/// Default timeout for one attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`TablestoreClient`].
///
/// # Example
///
/// ```ignore
/// use tablestore_client::{ClientBuilder, CredentialsSigner, RetryPolicy};
///
/// let client = ClientBuilder::new("https://demo.cn-hangzhou.ots.aliyuncs.com", "demo")
///     .signer(CredentialsSigner::new("my-key-id", sign))
///     .retry_policy(RetryPolicy::aggressive())
///     .header("x-tenant", "acme")
///     .build()?;
/// ```
pub struct ClientBuilder {
    endpoint: String,
    instance_name: String,
    signer: Arc<dyn Signer>,
    transport: Option<HyperTransport>,
    extra_headers: HeaderMap,
    timeout: Option<Duration>,
    max_body_size: usize,
    retry_policy: RetryPolicy,
    strict_validation: bool,
    request_handlers: Vec<Arc<dyn RequestHandler>>,
    response_handlers: Vec<Arc<dyn ResponseHandler>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("instance_name", &self.instance_name)
            .field("transport", &self.transport.is_some())
            .field("extra_headers", &self.extra_headers)
            .field("timeout", &self.timeout)
            .field("max_body_size", &self.max_body_size)
            .field("retry_policy", &self.retry_policy)
            .field("strict_validation", &self.strict_validation)
            .field("request_handlers", &self.request_handlers.len())
            .field("response_handlers", &self.response_handlers.len())
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Start a builder for `endpoint` (scheme and host, no path) and the
    /// target instance.
    pub fn new(endpoint: impl Into<String>, instance_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            instance_name: instance_name.into(),
            signer: Arc::new(NoSigner),
            transport: None,
            extra_headers: HeaderMap::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            retry_policy: RetryPolicy::default(),
            strict_validation: false,
            request_handlers: Vec::new(),
            response_handlers: Vec::new(),
        }
    }

    /// Sign requests with `signer`. It runs after every request handler.
    pub fn signer<S: Signer + 'static>(mut self, signer: S) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Use a preconfigured transport, e.g. one with a custom TLS config.
    pub fn transport(mut self, transport: HyperTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Add a header sent with every request.
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
        self.extra_headers.insert(name, value);
        self
    }

    /// The headers sent with every request.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.extra_headers
    }

    /// Timeout for each attempt. Default: 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Reject response bodies larger than `max` bytes. Default: 64 MiB.
    pub fn max_body_size(mut self, max: usize) -> Self {
        self.max_body_size = max;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Require `x-ots-contentmd5`, `x-ots-contenttype` and `authorization` on
    /// successful responses, and let the signer verify them. Without it only
    /// the request id is required, and the digest is checked when present.
    pub fn strict_validation(mut self, enabled: bool) -> Self {
        self.strict_validation = enabled;
        self
    }

    /// Append a request handler. Handlers run in the order they are added,
    /// after the built-in ones and before the signer.
    pub fn request_handler(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.request_handlers.push(handler);
        self
    }

    /// Append a response handler, run after the built-in ones.
    pub fn response_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.response_handlers.push(handler);
        self
    }

    pub fn build(self) -> Result<TablestoreClient, ClientError> {
        let endpoint = self.endpoint.trim_end_matches('/').to_string();
        let uri: Uri = endpoint
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid endpoint {endpoint}: {e}")))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ClientError::Config(format!(
                "endpoint {endpoint} must include scheme and host"
            )));
        }

        if self.instance_name.is_empty() {
            return Err(ClientError::Config("instance name is empty".into()));
        }
        HeaderValue::from_str(&self.instance_name).map_err(|_| {
            ClientError::Config(format!("invalid instance name: {}", self.instance_name))
        })?;

        if let Some(name) = self
            .extra_headers
            .keys()
            .find(|name| headers::is_reserved(name.as_str()))
        {
            return Err(ClientError::Config(format!(
                "header {name} is reserved and cannot be set on the client"
            )));
        }

        self.retry_policy
            .validate()
            .map_err(|msg| ClientError::Config(msg.to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => HyperTransport::new()?,
        };

        let mut context =
            ExecutionContext::builder(self.signer).default_handlers(self.strict_validation);
        for handler in self.request_handlers {
            context = context.request_handler(handler);
        }
        for handler in self.response_handlers {
            context = context.response_handler(handler);
        }

        Ok(TablestoreClient::new(
            transport,
            endpoint,
            self.instance_name,
            Arc::new(context.build()),
            self.extra_headers,
            self.timeout,
            self.max_body_size,
            self.retry_policy,
        ))
    }
}
