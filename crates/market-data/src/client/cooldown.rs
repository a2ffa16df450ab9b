//! Cooldown gate armed by exchange rate-limit responses.
//!
//! A single deadline on the monotonic clock. While it lies in the future no
//! request may leave the client. Re-arming replaces the deadline.

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use super::transport::MAX_RETRY_AFTER;

#[derive(Debug, Default)]
pub struct Cooldown {
    until: Option<Instant>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self { until: None }
    }

    /// Block further requests for `wait` from now, at most [`MAX_RETRY_AFTER`].
    pub fn arm(&mut self, wait: Duration) {
        let now = Instant::now();
        let wait = wait.min(MAX_RETRY_AFTER);
        self.until = Some(now.checked_add(wait).unwrap_or(now));
    }

    /// Time left before requests may resume.
    pub fn remaining(&self) -> Duration {
        self.until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_active(&self) -> bool {
        self.remaining() > Duration::ZERO
    }

    /// Sleep until the deadline has passed. Returns immediately when idle.
    pub async fn wait(&self) {
        let remaining = self.remaining();
        if remaining > Duration::ZERO {
            debug!("Cooldown: waiting {:?} before next request", remaining);
            tokio::time::sleep(remaining).await;
        }
    }
}
