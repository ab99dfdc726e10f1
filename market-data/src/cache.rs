//! Time-based quote cache.
//!
//! Bounds call volume to the external quote source for presentation-layer
//! consumers. Entries expire after a fixed TTL and are refreshed
//! synchronously on the next request past expiry; there is no background
//! refresh thread. The clock is injected so the expiry logic is testable.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::Quote;
use std::collections::HashMap;
use tracing::debug;

/// Clock seam for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of live quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>>;
}

/// TTL cache in front of a `QuoteSource`.
pub struct QuoteCache<S, C> {
    source: S,
    clock: C,
    ttl: Duration,
    quotes: HashMap<String, Quote>,
    last_refresh: Option<DateTime<Utc>>,
}

impl<S: QuoteSource, C: Clock> QuoteCache<S, C> {
    pub fn new(source: S, clock: C, ttl_secs: u64) -> Self {
        Self {
            source,
            clock,
            ttl: Duration::seconds(ttl_secs as i64),
            quotes: HashMap::new(),
            last_refresh: None,
        }
    }

    /// Cached quotes for the requested symbols, refreshing the whole set
    /// from the source if the cache has expired.
    pub async fn get(&mut self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        let now = self.clock.now();
        let expired = match self.last_refresh {
            Some(at) => now - at >= self.ttl,
            None => true,
        };

        if expired {
            debug!("Quote cache expired, refreshing {} symbols", symbols.len());
            self.quotes = self.source.quotes(symbols).await?;
            self.last_refresh = Some(now);
        }

        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), q.clone())))
            .collect())
    }
}
