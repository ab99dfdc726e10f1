//! Daily-bar retrieval with bounded retry.
//!
//! The provider itself is uninteresting to the pipeline; the only contract
//! that matters is: partial results are allowed (failed symbols are
//! dropped), an empty result is a failed attempt, and exhausting the retry
//! budget aborts the scan run.

use crate::cache::QuoteSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::{Bar, Quote, ScanError, ScannerConfig};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Source of daily OHLCV bars.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Bulk history for a symbol universe over a trailing period.
    /// May return partial data: symbols that error are simply absent.
    async fn history(
        &self,
        symbols: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, Vec<Bar>>>;

    /// Bars for one symbol over an explicit date range (used by the
    /// outcome aggregator to look up the next trading day).
    async fn daily_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<Bar>>;
}

/// JSON row shape served by the market-data service.
#[derive(Debug, Deserialize)]
struct BarRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<BarRow> for Bar {
    fn from(row: BarRow) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// HTTP client for the daily-bar service.
pub struct HttpBarSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBarSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_symbol(&self, url: String, symbol: &str) -> Result<Vec<Bar>> {
        let rows: Vec<BarRow> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", symbol))?
            .error_for_status()
            .with_context(|| format!("Bad status for {}", symbol))?
            .json()
            .await
            .with_context(|| format!("Invalid bar payload for {}", symbol))?;

        let mut bars: Vec<Bar> = rows.into_iter().map(Bar::from).collect();
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

#[async_trait]
impl BarSource for HttpBarSource {
    async fn history(
        &self,
        symbols: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, Vec<Bar>>> {
        let mut history = HashMap::new();
        for symbol in symbols {
            let url = format!(
                "{}/daily?symbol={}&days={}",
                self.base_url, symbol, lookback_days
            );
            match self.fetch_symbol(url, symbol).await {
                Ok(bars) if !bars.is_empty() => {
                    history.insert(symbol.clone(), bars);
                }
                Ok(_) => {
                    warn!("No bars returned for {}", symbol);
                }
                Err(e) => {
                    warn!("Dropping {} from batch: {}", symbol, e);
                }
            }
        }
        Ok(history)
    }

    async fn daily_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let url = format!(
            "{}/daily?symbol={}&start={}&end={}",
            self.base_url, symbol, start, end
        );
        self.fetch_symbol(url, symbol).await
    }
}

/// JSON quote shape served by the market-data service.
#[derive(Debug, Deserialize)]
struct QuoteRow {
    symbol: String,
    last_price: f64,
    prev_close: f64,
}

#[async_trait]
impl QuoteSource for HttpBarSource {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        let url = format!("{}/quotes?symbols={}", self.base_url, symbols.join(","));
        let rows: Vec<QuoteRow> = self
            .client
            .get(&url)
            .send()
            .await
            .context("Quote request failed")?
            .error_for_status()
            .context("Bad status for quote request")?
            .json()
            .await
            .context("Invalid quote payload")?;

        let fetched_at = Utc::now();
        Ok(rows
            .into_iter()
            .map(|row| {
                let change_pct = if row.prev_close != 0.0 {
                    (row.last_price - row.prev_close) / row.prev_close * 100.0
                } else {
                    0.0
                };
                (
                    row.symbol.clone(),
                    Quote {
                        symbol: row.symbol,
                        last_price: row.last_price,
                        prev_close: row.prev_close,
                        change_pct,
                        fetched_at,
                    },
                )
            })
            .collect())
    }
}

/// Bulk fetch with a bounded retry loop and fixed inter-attempt delay.
///
/// An empty result map counts as a failed attempt. Exhausting the budget
/// returns `ScanError::RetriesExhausted`, which aborts the scan run;
/// nothing is persisted for a broken batch.
pub async fn fetch_history_with_retry(
    source: &dyn BarSource,
    symbols: &[String],
    config: &ScannerConfig,
) -> Result<HashMap<String, Vec<Bar>>> {
    for attempt in 1..=config.max_retries {
        info!(
            "Fetching daily bars (attempt {}/{})",
            attempt, config.max_retries
        );
        match source.history(symbols, config.lookback_days).await {
            Ok(history) if !history.is_empty() => {
                info!("Fetched bars for {} symbols", history.len());
                return Ok(history);
            }
            Ok(_) => {
                warn!("Attempt {} returned no data: {}", attempt, ScanError::EmptyFetch);
            }
            Err(e) => {
                warn!("Attempt {} failed: {}", attempt, e);
            }
        }
        if attempt < config.max_retries {
            info!("Retrying in {} seconds", config.retry_delay_secs);
            sleep(Duration::from_secs(config.retry_delay_secs)).await;
        }
    }
    Err(ScanError::RetriesExhausted {
        attempts: config.max_retries,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingSource {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl BarSource for FailingSource {
        async fn history(
            &self,
            _symbols: &[String],
            _lookback_days: u32,
        ) -> Result<HashMap<String, Vec<Bar>>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("connection refused")
        }

        async fn daily_range(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Bar>> {
            anyhow::bail!("connection refused")
        }
    }

    struct EmptySource;

    #[async_trait]
    impl BarSource for EmptySource {
        async fn history(
            &self,
            _symbols: &[String],
            _lookback_days: u32,
        ) -> Result<HashMap<String, Vec<Bar>>> {
            Ok(HashMap::new())
        }

        async fn daily_range(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Bar>> {
            Ok(Vec::new())
        }
    }

    fn fast_config() -> ScannerConfig {
        let mut config = ScannerConfig::default();
        config.retry_delay_secs = 0;
        config
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_fatal() {
        let source = FailingSource {
            attempts: AtomicU32::new(0),
        };
        let config = fast_config();
        let symbols = vec!["RELIANCE".to_string()];

        let result = fetch_history_with_retry(&source, &symbols, &config).await;
        let err = result.unwrap_err();
        let scan_err = err.downcast_ref::<ScanError>().unwrap();
        assert_eq!(*scan_err, ScanError::RetriesExhausted { attempts: 3 });
        assert_eq!(source.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_result_counts_as_failure() {
        let config = fast_config();
        let symbols = vec!["RELIANCE".to_string()];

        let result = fetch_history_with_retry(&EmptySource, &symbols, &config).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_quote_row_parsing() {
        let json = r#"[{"symbol": "TCS", "last_price": 4100.5, "prev_close": 4050.0}]"#;
        let rows: Vec<QuoteRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].symbol, "TCS");
        assert_eq!(rows[0].last_price, 4100.5);
    }

    #[test]
    fn test_bar_row_parsing() {
        let json = r#"[
            {"date": "2025-01-06", "open": 100.0, "high": 104.0, "low": 99.0, "close": 103.0, "volume": 2500000},
            {"date": "2025-01-03", "open": 98.0, "high": 101.0, "low": 97.5, "close": 100.0, "volume": 1800000}
        ]"#;

        let rows: Vec<BarRow> = serde_json::from_str(json).unwrap();
        let mut bars: Vec<Bar> = rows.into_iter().map(Bar::from).collect();
        bars.sort_by_key(|b| b.date);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.0);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }
}
