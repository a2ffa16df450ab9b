/// Classification for retry policy.
///
/// Used by the HTTP client to decide how to react to a failed attempt.
///
/// # Behavior Summary
///
/// | Class | Retried? | Sleep before next attempt |
/// |-------|----------|---------------------------|
/// | `Never` | No | - |
/// | `WithBackoff` | Yes, within the retry budget | current backoff, then doubled |
/// | `Cooldown` | Yes, within the retry budget | `Retry-After` hint (or backoff) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - malformed payload, empty result or terminal failure.
    Never,

    /// Transient failure: connection error, timeout, non-2xx status.
    WithBackoff,

    /// The exchange asked us to slow down (HTTP 429/418).
    ///
    /// The client arms its cooldown deadline so that no request leaves
    /// before the hint elapses, then retries.
    Cooldown,
}
