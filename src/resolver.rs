//! Single-flight credential resolution.
//!
//! Concurrent callers of [`CredentialResolver::resolve`] share one in-flight
//! authorizer invocation through a [`Shared`] future; the producer runs at
//! most once per unresolved window and its result (or failure) fans out to
//! every waiter.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;

use crate::error::BoxError;

/// Produces the `Authorization` header value. May suspend (network or
/// interactive authentication).
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<String, BoxError>;
}

/// Authorizer backed by a fixed credential value.
pub struct StaticAuthorizer(String);

impl StaticAuthorizer {
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self) -> Result<String, BoxError> {
        Ok(self.0.clone())
    }
}

/// Failure of the credential producer, cloned to every waiter of the
/// resolution that produced it.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct AuthorizerError {
    message: Arc<str>,
}

impl AuthorizerError {
    fn new(message: String) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type ResolveFuture = Shared<BoxFuture<'static, Result<String, AuthorizerError>>>;

enum Slot {
    InFlight(ResolveFuture),
    Ready(String),
}

struct ResolverState {
    // Identifies the current resolution window. Bumped on invalidate() and
    // on every new in-flight installation, so late waiters of an old
    // resolution cannot clobber a newer one.
    generation: u64,
    slot: Option<Slot>,
}

/// Deduplicating resolver around an [`Authorizer`].
///
/// Shared by `Arc` between a client and all clients scoped from it, so a
/// 401-triggered [`invalidate`](Self::invalidate) through any of them is
/// visible to the whole family.
pub struct CredentialResolver {
    authorizer: Arc<dyn Authorizer>,
    state: Mutex<ResolverState>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            state: Mutex::new(ResolverState {
                generation: 0,
                slot: None,
            }),
        }
    }

    /// Returns the current credential, invoking the authorizer only when no
    /// resolved or in-flight value exists.
    ///
    /// A producer failure propagates to every waiter of that resolution and
    /// resets the resolver to unresolved, so the next call retries the
    /// producer without an explicit [`invalidate`](Self::invalidate).
    pub async fn resolve(&self) -> Result<String, AuthorizerError> {
        let (generation, in_flight) = {
            let mut state = self
                .state
                .lock()
                .expect("resolver state mutex must not be poisoned");
            match &state.slot {
                Some(Slot::Ready(credential)) => return Ok(credential.clone()),
                Some(Slot::InFlight(shared)) => (state.generation, shared.clone()),
                None => {
                    let authorizer = Arc::clone(&self.authorizer);
                    let future: BoxFuture<'static, Result<String, AuthorizerError>> =
                        Box::pin(async move {
                            authorizer
                                .authorize()
                                .await
                                .map_err(|source| AuthorizerError::new(source.to_string()))
                        });
                    let shared = future.shared();
                    state.generation = state.generation.wrapping_add(1);
                    state.slot = Some(Slot::InFlight(shared.clone()));
                    (state.generation, shared)
                }
            }
        };

        let result = in_flight.await;

        let mut state = self
            .state
            .lock()
            .expect("resolver state mutex must not be poisoned");
        if state.generation == generation {
            state.slot = match &result {
                Ok(credential) => Some(Slot::Ready(credential.clone())),
                Err(_) => None,
            };
        }
        result
    }

    /// Discards any cached or in-flight credential. Idempotent.
    ///
    /// In-flight work is not cancelled: a `resolve()` that already joined it
    /// still completes with the stale value, while any call starting after
    /// this point triggers a fresh producer invocation.
    pub fn invalidate(&self) {
        let mut state = self
            .state
            .lock()
            .expect("resolver state mutex must not be poisoned");
        state.generation = state.generation.wrapping_add(1);
        state.slot = None;

        #[cfg(feature = "tracing")]
        tracing::debug!("credential invalidated; next resolve re-runs the authorizer");
    }
}
