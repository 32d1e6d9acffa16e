use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::IdProvider;

/// Offline id source: a monotonic counter.
#[derive(Debug)]
pub struct CounterIdProvider {
    next: AtomicU64,
}

impl CounterIdProvider {
    pub fn new(start: u64) -> Self {
        Self { next: AtomicU64::new(start) }
    }

    /// Start counting at the current time in seconds, so separate runs
    /// keep producing different seeds.
    pub fn from_clock() -> Self {
        Self::new(Utc::now().timestamp().max(0) as u64)
    }
}

#[async_trait]
impl IdProvider for CounterIdProvider {
    async fn request_id(&self, _destination: &str, _nonce: u64) -> Result<u64> {
        Ok(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_up_from_start() {
        let provider = CounterIdProvider::new(42);

        assert_eq!(provider.request_id("Paris", 0).await.unwrap(), 42);
        assert_eq!(provider.request_id("Rome", 0).await.unwrap(), 43);
        assert_eq!(provider.request_id("Paris", 0).await.unwrap(), 44);
    }
}
