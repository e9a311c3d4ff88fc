use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::Params;

/// HTTP verbs accepted by [`HttpClient::execute`](crate::HttpClient::execute).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Descriptor of one logical call, built once per call and handed to every
/// tracker hook.
///
/// The descriptor stays fixed across attempts except for `headers`, which
/// receives a fresh `Authorization` value before each attempt when an
/// authorizer is configured.
#[derive(Clone, Debug)]
pub struct RequestInfo {
    /// Unique identifier of the logical call, stable across retries.
    pub id: Uuid,
    pub method: HttpMethod,
    /// Fully base-joined request URL.
    pub url: String,
    pub params: Params,
    pub body: Option<JsonValue>,
    pub headers: BTreeMap<String, String>,
}
