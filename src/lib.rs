//! `tenacity-http` is a retrying, authenticated async HTTP client facade.
//!
//! It wraps outbound request execution with:
//! - automatic `Authorization` header injection through a single-flight
//!   [`CredentialResolver`] that is invalidated whenever a 401 comes back,
//! - configurable retry with exponential backoff and a caller-supplied
//!   [`ContinuationPolicy`] veto,
//! - optional [`Tracker`] hooks for every attempt, success, and terminal
//!   failure.
//!
//! Clients derived with [`HttpClient::scope`] extend the base URL while
//! sharing the parent's resolver and tracker, so credential invalidation is
//! visible across the whole family.

mod client;
mod error;
mod options;
mod params;
mod request;
mod resolver;
mod retry;
mod tracker;
mod types;

pub use client::HttpClient;
pub use error::{BoxError, ErrorKind, HttpClientError};
pub use options::HttpClientOptions;
pub use params::Params;
pub use request::{HttpMethod, RequestInfo};
pub use resolver::{Authorizer, AuthorizerError, CredentialResolver, StaticAuthorizer};
pub use retry::{ContinuationPolicy, RetryPolicy};
pub use tracker::Tracker;
pub use types::{CallOutcome, ClientResponse};

pub type Result<T> = std::result::Result<T, HttpClientError>;
