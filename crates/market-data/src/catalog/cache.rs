use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::ExchangeInfoPayload;

/// Single-slot TTL cache for exchange info.
///
/// The payload and its fetch time are stored together and replaced together.
#[derive(Debug)]
pub struct ExchangeInfoCache {
    ttl: Duration,
    entry: Option<(Arc<ExchangeInfoPayload>, Instant)>,
}

impl ExchangeInfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached payload while `now - fetched_at < ttl`.
    pub fn get(&self) -> Option<Arc<ExchangeInfoPayload>> {
        match &self.entry {
            Some((payload, fetched_at)) if fetched_at.elapsed() < self.ttl => {
                Some(Arc::clone(payload))
            }
            _ => None,
        }
    }

    pub fn store(&mut self, payload: ExchangeInfoPayload) -> Arc<ExchangeInfoPayload> {
        let payload = Arc::new(payload);
        self.entry = Some((Arc::clone(&payload), Instant::now()));
        payload
    }

    /// Time since the last fetch, expired or not.
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|(_, fetched_at)| fetched_at.elapsed())
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
