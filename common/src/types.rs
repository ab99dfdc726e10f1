use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One trading day's OHLCV bar for a single symbol.
///
/// Bar sequences are chronological with missing days simply absent
/// (no interpolation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// The day's high-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// A live quote snapshot, used only by the TTL quote cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub last_price: f64,
    pub prev_close: f64,
    pub change_pct: f64,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_range() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 98.0,
            close: 105.0,
            volume: 1_500_000.0,
        };
        assert_eq!(bar.range(), 12.0);
    }
}
