use crate::{ClientResponse, HttpClientError, RequestInfo};

/// Observer of a request's lifecycle.
///
/// Every method has a no-op default, so implementations override only the
/// hooks they care about. Hooks are synchronous side-effecting callbacks and
/// must not block.
///
/// Ordering contract for one logical call: `start` fires exactly once, then
/// each attempt fires `try_attempt` followed by either `finish` (terminal,
/// at most once) or `failed_attempt`. After retries are exhausted or vetoed,
/// `fail` fires exactly once. An attempt whose credential resolution fails
/// reports `failed_attempt` without a preceding `try_attempt`.
pub trait Tracker: Send + Sync {
    fn start(&self, _request: &RequestInfo) {}

    fn try_attempt(&self, _request: &RequestInfo) {}

    fn finish(&self, _request: &RequestInfo, _response: &ClientResponse) {}

    fn failed_attempt(&self, _request: &RequestInfo, _error: &HttpClientError) {}

    fn fail(&self, _request: &RequestInfo, _error: &HttpClientError) {}
}
