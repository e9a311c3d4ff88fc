use std::fmt;

use crate::resolver::AuthorizerError;
use crate::{HttpMethod, Params, RequestInfo};

/// Boxed error type accepted from pluggable callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure class of a normalized error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport could not produce any response; no status code exists.
    Connection,
    /// The transport produced a response with a non-success status code.
    HttpStatus,
    /// The credential-producing callback itself failed.
    Authorizer,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connection => "connection",
            Self::HttpStatus => "http_status",
            Self::Authorizer => "authorizer",
        };
        formatter.write_str(text)
    }
}

/// Uniform failure shape handed to trackers, continuation predicates, and
/// callers. Carries the failing request's context; never mutated after
/// construction.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct HttpClientError {
    pub kind: ErrorKind,
    pub message: String,
    pub method: HttpMethod,
    pub url: String,
    pub params: Params,
    /// Present only when the transport produced a response.
    pub status: Option<u16>,
    pub status_text: Option<String>,
}

impl HttpClientError {
    pub(crate) fn connection(request: &RequestInfo, source: &reqwest::Error) -> Self {
        Self {
            kind: ErrorKind::Connection,
            message: source.to_string(),
            method: request.method,
            url: request.url.clone(),
            params: request.params.clone(),
            status: None,
            status_text: None,
        }
    }

    pub(crate) fn http_status(request: &RequestInfo, status: u16, status_text: String) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            message: format!("request failed with status {status} {status_text}"),
            method: request.method,
            url: request.url.clone(),
            params: request.params.clone(),
            status: Some(status),
            status_text: Some(status_text),
        }
    }

    pub(crate) fn authorizer(request: &RequestInfo, failure: &AuthorizerError) -> Self {
        Self {
            kind: ErrorKind::Authorizer,
            message: format!("authorizer failed: {failure}"),
            method: request.method,
            url: request.url.clone(),
            params: request.params.clone(),
            status: None,
            status_text: None,
        }
    }
}
