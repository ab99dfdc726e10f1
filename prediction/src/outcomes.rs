//! Joins persisted scan batches with realized next-day bars to produce
//! the supervised label set. Append-only: one batch of labels per
//! elapsed trading day is the sole growth mechanism for training data.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use common::ScannerConfig;
use market_data::BarSource;
use scanner::{read_batch, ScanResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PERFORMANCE_HISTORY_FILE: &str = "performance_history.csv";

/// One labeled signal: the feature snapshot from the scan day plus the
/// realized next-day outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub signal_close: f64,

    pub score_long: i32,
    pub score_short: i32,
    pub rsi14: f64,
    pub atr14: f64,
    pub vol_ratio: f64,
    pub cpr_width_pct: f64,
    pub macd_value: f64,
    pub bb_position: f64,
    pub risk_reward_ratio: f64,
    pub ibs: f64,
    pub twenty_high_break: bool,
    pub twenty_low_break: bool,
    pub macd_bullish: bool,
    pub macd_bearish: bool,
    pub narrow_cpr: bool,
    pub bb_squeeze: bool,
    pub vol_surge: bool,
    pub trend_long: bool,
    pub trend_short: bool,

    pub next_high: f64,
    pub next_low: f64,
    pub next_close: f64,
    pub high_return_pct: f64,
    pub low_return_pct: f64,
    pub close_return_pct: f64,
    pub hit_target: bool,
    pub hit_stop: bool,
    pub profitable: bool,
}

impl OutcomeRecord {
    /// Labels one signal against the next trading day's bar.
    fn label(
        signal: &ScanResult,
        date: NaiveDate,
        next: &common::Bar,
        config: &ScannerConfig,
    ) -> OutcomeRecord {
        let entry = signal.close;
        let high_return_pct = (next.high - entry) / entry * 100.0;
        let low_return_pct = (next.low - entry) / entry * 100.0;
        let close_return_pct = (next.close - entry) / entry * 100.0;

        OutcomeRecord {
            date,
            symbol: signal.symbol.clone(),
            signal_close: entry,
            score_long: signal.score_long,
            score_short: signal.score_short,
            rsi14: signal.rsi14,
            atr14: signal.atr14,
            vol_ratio: signal.vol_ratio,
            cpr_width_pct: signal.cpr_width_pct,
            macd_value: signal.macd_value,
            bb_position: signal.bb_position,
            risk_reward_ratio: signal.risk_reward_ratio,
            ibs: signal.ibs,
            twenty_high_break: signal.twenty_high_break,
            twenty_low_break: signal.twenty_low_break,
            macd_bullish: signal.macd_bullish,
            macd_bearish: signal.macd_bearish,
            narrow_cpr: signal.narrow_cpr,
            bb_squeeze: signal.bb_squeeze,
            vol_surge: signal.vol_surge,
            trend_long: signal.trend_long,
            trend_short: signal.trend_short,
            next_high: next.high,
            next_low: next.low,
            next_close: next.close,
            high_return_pct,
            low_return_pct,
            close_return_pct,
            hit_target: high_return_pct >= config.target_return_pct,
            hit_stop: low_return_pct <= config.stop_return_pct,
            profitable: close_return_pct > 0.0,
        }
    }
}

/// Lists `all_signals_*` batch files, oldest first, capped to the most
/// recent `days_back` files.
fn batch_files(output_dir: &Path, days_back: usize) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(output_dir)
        .with_context(|| format!("reading {}", output_dir.display()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .is_some_and(|n| n.starts_with("all_signals_") && n.ends_with(".csv"))
        })
        .collect();
    files.sort();
    let skip = files.len().saturating_sub(days_back);
    Ok(files.into_iter().skip(skip).collect())
}

/// The most recent `all_signals_*` batch file, if any exist.
pub fn latest_batch_file(output_dir: &Path) -> Result<Option<PathBuf>> {
    Ok(batch_files(output_dir, usize::MAX)?.pop())
}

/// Extracts the signal date from `all_signals_YYYY-MM-DD_HHMM.csv`.
fn date_from_filename(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_string_lossy();
    let date_part = stem.strip_prefix("all_signals_")?.split('_').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Builds the labeled outcome set from persisted batches and writes it to
/// `performance_history.csv` under the models directory.
///
/// Symbol/day pairs with fewer than two subsequent bars are excluded: the
/// next trading day cannot be determined for them.
pub async fn collect_history(
    source: &dyn BarSource,
    config: &ScannerConfig,
    days_back: usize,
) -> Result<Vec<OutcomeRecord>> {
    info!("Collecting labeled history from last {} batches", days_back);
    let files = batch_files(Path::new(&config.output_dir), days_back)?;
    if files.is_empty() {
        warn!("No persisted signal batches found in {}", config.output_dir);
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for file in &files {
        let Some(signal_date) = date_from_filename(file) else {
            warn!("Skipping batch with unparseable name: {}", file.display());
            continue;
        };
        let signals = match read_batch(file) {
            Ok(signals) => signals,
            Err(e) => {
                warn!("Error reading {}: {:#}", file.display(), e);
                continue;
            }
        };

        let end = signal_date + Days::new(5);
        for signal in &signals {
            if signal.close == 0.0 {
                continue;
            }
            match source.daily_range(&signal.symbol, signal_date, end).await {
                Ok(bars) if bars.len() >= 2 => {
                    records.push(OutcomeRecord::label(signal, signal_date, &bars[1], config));
                }
                Ok(_) => {}
                Err(e) => warn!("No next-day data for {}: {:#}", signal.symbol, e),
            }
        }
    }

    info!("Collected {} labeled records", records.len());
    if !records.is_empty() {
        let path = Path::new(&config.models_dir).join(PERFORMANCE_HISTORY_FILE);
        save_history(&records, &path)?;
    }
    Ok(records)
}

pub fn save_history(records: &[OutcomeRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Saved {} outcome records to {}", records.len(), path.display());
    Ok(())
}

pub fn load_history(path: &Path) -> Result<Vec<OutcomeRecord>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: OutcomeRecord =
            row.with_context(|| format!("parsing {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::labeled_scan_result;
    use async_trait::async_trait;
    use common::Bar;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct FixedSource {
        bars: Vec<Bar>,
    }

    #[async_trait]
    impl BarSource for FixedSource {
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
            Ok(self.bars.clone())
        }
    }

    fn bar(date: NaiveDate, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date,
            open: close,
            high,
            low,
            close,
            volume: 1_000_000.0,
        }
    }

    fn write_batch(dir: &Path, name: &str, signals: &[ScanResult]) {
        let mut writer = csv::Writer::from_path(dir.join(name)).unwrap();
        for s in signals {
            writer.serialize(s).unwrap();
        }
        writer.flush().unwrap();
    }

    fn config_in(dir: &Path) -> ScannerConfig {
        let mut config = ScannerConfig::default();
        config.output_dir = dir.join("out").to_string_lossy().into_owned();
        config.models_dir = dir.join("models").to_string_lossy().into_owned();
        fs::create_dir_all(&config.output_dir).unwrap();
        config
    }

    #[tokio::test]
    async fn test_labels_from_next_day_bar() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        // signal close is 500.0 in the sample record
        write_batch(
            Path::new(&config.output_dir),
            "all_signals_2025-06-02_0930.csv",
            &[labeled_scan_result("TCS")],
        );

        let signal_day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let source = FixedSource {
            // next day: +2.4% high, -0.4% low, +1% close
            bars: vec![
                bar(signal_day, 501.0, 498.0, 500.0),
                bar(next_day, 512.0, 498.0, 505.0),
            ],
        };

        let records = collect_history(&source, &config, 60).await.unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date, signal_day);
        assert!(r.hit_target);
        assert!(!r.hit_stop);
        assert!(r.profitable);
        assert!((r.close_return_pct - 1.0).abs() < 1e-9);

        // history file written and loadable
        let path = Path::new(&config.models_dir).join(PERFORMANCE_HISTORY_FILE);
        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].symbol, "TCS");
        assert!(loaded[0].profitable);
    }

    #[tokio::test]
    async fn test_single_bar_excluded() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        write_batch(
            Path::new(&config.output_dir),
            "all_signals_2025-06-02_0930.csv",
            &[labeled_scan_result("TCS")],
        );

        let signal_day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let source = FixedSource {
            bars: vec![bar(signal_day, 501.0, 498.0, 500.0)],
        };
        let records = collect_history(&source, &config, 60).await.unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_batch_files_capped_and_sorted() {
        let dir = tempdir().unwrap();
        for name in [
            "all_signals_2025-06-04_0930.csv",
            "all_signals_2025-06-02_0930.csv",
            "all_signals_2025-06-03_0930.csv",
            "long_candidates_2025-06-03_0930.csv",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = batch_files(dir.path(), 2).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("2025-06-03"));
        assert!(files[1]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("2025-06-04"));
    }

    #[test]
    fn test_date_parsed_from_filename() {
        let date = date_from_filename(Path::new("all_signals_2025-10-30_0935.csv")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 10, 30).unwrap());
        assert!(date_from_filename(Path::new("notes.csv")).is_none());
    }
}
