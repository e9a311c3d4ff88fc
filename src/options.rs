use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::resolver::{Authorizer, CredentialResolver};
use crate::retry::RetryPolicy;
use crate::tracker::Tracker;

/// Construction-time settings for [`HttpClient`](crate::HttpClient).
#[derive(Clone, Default)]
pub struct HttpClientOptions {
    /// Per-attempt timeout, delegated to the transport. `None` means the
    /// transport's own default applies.
    pub timeout: Option<Duration>,
    /// Fixed headers cloned into every request descriptor.
    pub headers: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    pub tracker: Option<Arc<dyn Tracker>>,
    /// Credential producer wrapped in a fresh single-flight resolver.
    pub authorizer: Option<Arc<dyn Authorizer>>,
    /// Pre-built resolver, shared with other clients so that invalidation
    /// propagates between them. Takes precedence over `authorizer`.
    pub resolver: Option<Arc<CredentialResolver>>,
    /// Fire-and-forget mode: terminal failures are reported to the tracker
    /// and then swallowed as [`CallOutcome::Absorbed`](crate::CallOutcome).
    pub absorb_failures: bool,
}

impl fmt::Debug for HttpClientOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpClientOptions")
            .field("timeout", &self.timeout)
            .field("headers", &"<redacted>")
            .field("retry", &self.retry)
            .field("tracker", &self.tracker.is_some())
            .field("authorizer", &self.authorizer.is_some())
            .field("resolver", &self.resolver.is_some())
            .field("absorb_failures", &self.absorb_failures)
            .finish()
    }
}
