// Market data access for the EOD scanner
// The data provider is a black box behind BarSource; this crate owns the
// retry contract around the bulk fetch and the TTL quote cache.

pub mod cache;
pub mod source;

pub use cache::{Clock, QuoteCache, QuoteSource, SystemClock};
pub use source::{fetch_history_with_retry, BarSource, HttpBarSource};
