//! Traced HTTP client that injects trace context into outgoing requests
//!
//! This module provides a wrapper around reqwest::Client that opens an
//! `outgoing_http` span per request and injects a `traceparent` header.

use crate::http::simple_otel;
use std::time::Duration;
use tracing::{field::Empty, Instrument, Level};

/// Options for building the underlying reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Whole-request timeout; `None` disables it.
    pub timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,
}

/// A traced HTTP client that injects trace context into every outgoing
/// request and records method, URL and status on a per-request span.
#[derive(Clone, Debug)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    /// Create a new TracedClient wrapping the provided reqwest::Client
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Build a client from options.
    pub fn with_options(options: &ClientOptions) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ua) = &options.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        Ok(Self::new(builder.build()?))
    }

    /// Execute a built reqwest::Request inside an `outgoing_http` span.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let traceparent = simple_otel::inject_trace_context(req.headers_mut());
        let trace_id = traceparent
            .as_deref()
            .and_then(simple_otel::parse_trace_id)
            .unwrap_or_default()
            .to_string();

        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = Empty,
            error = Empty,
            trace_id = %trace_id,
            otel.kind = "client",
        );

        async move {
            let response = match self.inner.execute(req).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::Span::current().record("error", true);
                    tracing::debug!(error = %e, "request failed before a response arrived");
                    return Err(e);
                }
            };

            let status = response.status();
            let current = tracing::Span::current();
            current.record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                current.record("error", true);
            }
            tracing::debug!(status = status.as_u16(), "response received");

            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Build the request from a builder and execute it.
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> reqwest::Result<reqwest::Response> {
        let req = builder.build()?;
        self.execute(req).await
    }

    /// Convenience method for GET requests
    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.get(url).build()?;
        self.execute(req).await
    }

    /// Convenience method for POST requests
    pub async fn post(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.post(url).build()?;
        self.execute(req).await
    }

    /// Create a request builder for any method
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}
