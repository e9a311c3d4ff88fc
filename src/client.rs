use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::resolver::CredentialResolver;
use crate::retry::{self, Operation, RetryPolicy};
use crate::tracker::Tracker;
use crate::{
    CallOutcome, ClientResponse, HttpClientError, HttpClientOptions, HttpMethod, Params,
    RequestInfo, Result,
};

/// Retrying, authenticated HTTP client facade.
///
/// Wraps outbound request execution with automatic `Authorization` header
/// injection through a shared single-flight [`CredentialResolver`],
/// retry with exponential backoff, and per-call lifecycle tracking.
///
/// # Example
///
/// ```no_run
/// use tenacity_http::{HttpClient, Result};
///
/// # async fn run() -> Result<()> {
/// let client = HttpClient::new("http://localhost:8080");
/// let outcome = client.get("/status", ()).await?;
/// if let Some(response) = outcome.into_response() {
///     println!("{} {}", response.status, response.data);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    transport: reqwest::Client,
    url_base: String,
    timeout: Option<Duration>,
    headers: BTreeMap<String, String>,
    retry: RetryPolicy,
    tracker: Option<Arc<dyn Tracker>>,
    resolver: Option<Arc<CredentialResolver>>,
    absorb_failures: bool,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpClient")
            .field("url_base", &self.url_base)
            .field("timeout", &self.timeout)
            .field("headers", &"<redacted>")
            .field("retry", &self.retry)
            .field("absorb_failures", &self.absorb_failures)
            .finish()
    }
}

impl HttpClient {
    /// Creates a client with default options.
    pub fn new(url_base: impl Into<String>) -> Self {
        Self::build(url_base.into(), HttpClientOptions::default())
    }

    /// Applies client options such as timeout, retry, tracker, and
    /// authorizer. The fixed headers always carry
    /// `Content-Type: application/json`.
    pub fn with_options(self, options: HttpClientOptions) -> Self {
        Self::build(self.url_base, options)
    }

    fn build(url_base: String, options: HttpClientOptions) -> Self {
        let mut headers = options.headers;
        headers.insert("Content-Type".to_owned(), "application/json".to_owned());

        let resolver = options.resolver.or_else(|| {
            options
                .authorizer
                .map(|authorizer| Arc::new(CredentialResolver::new(authorizer)))
        });

        Self {
            transport: reqwest::Client::new(),
            url_base,
            timeout: options.timeout,
            headers,
            retry: options.retry,
            tracker: options.tracker,
            resolver,
            absorb_failures: options.absorb_failures,
        }
    }

    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    /// Sets a fixed header on this client. Chainable.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Derives a child client whose base URL extends this one.
    ///
    /// The child copies the fixed headers by value but shares the retry
    /// policy, tracker, and credential resolver, so a 401 seen by any
    /// client in the family invalidates the credential for all of them.
    pub fn scope(&self, suffix: &str) -> Self {
        let mut parts = Vec::new();
        if !self.url_base.is_empty() {
            parts.push(self.url_base.as_str());
        }
        if !suffix.is_empty() {
            parts.push(suffix);
        }

        Self {
            transport: self.transport.clone(),
            url_base: parts.join("/"),
            timeout: self.timeout,
            headers: self.headers.clone(),
            retry: self.retry.clone(),
            tracker: self.tracker.clone(),
            resolver: self.resolver.clone(),
            absorb_failures: self.absorb_failures,
        }
    }

    pub async fn get(&self, url: &str, params: impl Into<Params>) -> Result<CallOutcome> {
        self.execute(HttpMethod::Get, url, params, None).await
    }

    pub async fn delete(&self, url: &str, params: impl Into<Params>) -> Result<CallOutcome> {
        self.execute(HttpMethod::Delete, url, params, None).await
    }

    pub async fn post(
        &self,
        url: &str,
        params: impl Into<Params>,
        body: Option<JsonValue>,
    ) -> Result<CallOutcome> {
        self.execute(HttpMethod::Post, url, params, body).await
    }

    pub async fn put(
        &self,
        url: &str,
        params: impl Into<Params>,
        body: Option<JsonValue>,
    ) -> Result<CallOutcome> {
        self.execute(HttpMethod::Put, url, params, body).await
    }

    pub async fn patch(
        &self,
        url: &str,
        params: impl Into<Params>,
        body: Option<JsonValue>,
    ) -> Result<CallOutcome> {
        self.execute(HttpMethod::Patch, url, params, body).await
    }

    pub async fn options(
        &self,
        url: &str,
        params: impl Into<Params>,
        body: Option<JsonValue>,
    ) -> Result<CallOutcome> {
        self.execute(HttpMethod::Options, url, params, body).await
    }

    /// Executes one logical call: builds the request descriptor, fires the
    /// tracker's `start` hook once, and drives attempts through the retry
    /// engine until a terminal state.
    ///
    /// `url` is joined to the base URL by plain concatenation; callers are
    /// responsible for well-formed fragments.
    pub async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        params: impl Into<Params>,
        body: Option<JsonValue>,
    ) -> Result<CallOutcome> {
        let mut request = RequestInfo {
            id: Uuid::new_v4(),
            method,
            url: format!("{}{}", self.url_base, url),
            params: params.into(),
            body,
            headers: self.headers.clone(),
        };

        if let Some(tracker) = &self.tracker {
            tracker.start(&request);
        }

        match retry::run(&self.retry, self, &mut request).await {
            Ok(response) => Ok(CallOutcome::Response(response)),
            Err(error) => {
                if let Some(tracker) = &self.tracker {
                    tracker.fail(&request, &error);
                }
                if self.absorb_failures {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "absorbed terminal failure of {} {}",
                        request.method,
                        request.url
                    );
                    Ok(CallOutcome::Absorbed)
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Resolves the credential, announces the attempt, and performs the
    /// wire call. Header injection completes before the attempt dispatches;
    /// an attempt whose resolution fails never reaches `try_attempt`.
    async fn dispatch(&self, request: &mut RequestInfo) -> Result<ClientResponse> {
        if let Some(resolver) = &self.resolver {
            let credential = resolver
                .resolve()
                .await
                .map_err(|failure| HttpClientError::authorizer(request, &failure))?;
            request.headers.insert("Authorization".to_owned(), credential);
        }

        if let Some(tracker) = &self.tracker {
            tracker.try_attempt(request);
        }

        self.send(request).await
    }

    async fn send(&self, request: &RequestInfo) -> Result<ClientResponse> {
        let mut builder = self.transport.request(request.method.into(), &request.url);
        if !request.params.is_empty() {
            builder = builder.query(request.params.pairs());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|source| HttpClientError::connection(request, &source))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_owned();
        let body = response
            .text()
            .await
            .map_err(|source| HttpClientError::connection(request, &source))?;

        if !status.is_success() {
            return Err(HttpClientError::http_status(
                request,
                status.as_u16(),
                status_text,
            ));
        }

        Ok(ClientResponse::from_body(status.as_u16(), status_text, body))
    }
}

#[async_trait]
impl Operation for HttpClient {
    async fn attempt(&self, request: &mut RequestInfo) -> Result<ClientResponse> {
        match self.dispatch(request).await {
            Ok(response) => {
                if let Some(tracker) = &self.tracker {
                    tracker.finish(request, &response);
                }
                Ok(response)
            }
            Err(error) => {
                if error.status == Some(401) {
                    if let Some(resolver) = &self.resolver {
                        resolver.invalidate();
                    }
                }
                if let Some(tracker) = &self.tracker {
                    tracker.failed_attempt(request, &error);
                }
                Err(error)
            }
        }
    }
}
