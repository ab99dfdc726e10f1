//! Drives a full scan: indicators, flags, scores and sizing per symbol.

use crate::frame::{IndicatorFrame, MIN_BARS};
use crate::indicators;
use crate::result::{ResultInputs, ScanResult};
use crate::risk::{risk_reward_ratio, RiskPlan, TradeDirection};
use crate::scoring::{assess_risk_level, calculate_scores};
use crate::sector::relative_strength;
use crate::setups::SetupFlags;
use anyhow::{bail, Result};
use common::{Bar, ScanError, ScannerConfig};
use std::collections::HashMap;
use tracing::{info, warn};

pub struct ScanPipeline {
    config: ScannerConfig,
    /// Trailing 5-bar benchmark return. When absent, relative strength
    /// falls back to a proxy of the symbol's own return.
    benchmark_return_pct: Option<f64>,
}

impl ScanPipeline {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            benchmark_return_pct: None,
        }
    }

    pub fn with_benchmark(mut self, benchmark_return_pct: Option<f64>) -> Self {
        self.benchmark_return_pct = benchmark_return_pct;
        self
    }

    /// Scans every symbol in `history` and returns one record per symbol
    /// that had enough bars and processed cleanly.
    ///
    /// Symbols are processed in sorted order so repeated runs over the same
    /// bars produce identical output. An empty history aborts the scan;
    /// per-symbol failures are logged and dropped without affecting the rest
    /// of the batch.
    pub fn scan(&self, history: &HashMap<String, Vec<Bar>>) -> Result<Vec<ScanResult>> {
        if history.is_empty() {
            bail!(ScanError::EmptyFetch);
        }

        let mut symbols: Vec<&String> = history.keys().collect();
        symbols.sort();

        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.process_symbol(symbol, &history[symbol]) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => warn!("Error processing {}: {:#}", symbol, e),
            }
        }

        info!(
            "Scan complete: {} of {} symbols produced results",
            results.len(),
            history.len()
        );
        Ok(results)
    }

    fn process_symbol(&self, symbol: &str, bars: &[Bar]) -> Result<Option<ScanResult>> {
        if bars.len() < MIN_BARS {
            warn!(
                "Skipping symbol: {}",
                ScanError::InsufficientHistory {
                    symbol: symbol.to_string(),
                    rows: bars.len(),
                    required: MIN_BARS,
                }
            );
            return Ok(None);
        }

        let frame = IndicatorFrame::compute(bars.to_vec());
        let i = frame.last();
        let close = frame.bars[i].close;
        let atr = frame.atr14[i];
        if !close.is_finite() || !atr.is_finite() {
            bail!("non-finite latest row for {}", symbol);
        }

        let last_ibs = indicators::ibs(&frame.bars[i]);
        let sector = relative_strength(
            symbol,
            frame.five_day_return_pct(),
            self.benchmark_return_pct,
        );
        let flags = SetupFlags::evaluate(&frame, last_ibs, &sector, &self.config);
        let scores = calculate_scores(&frame, &flags, &self.config);
        let rr_ratio = risk_reward_ratio(close, frame.support, frame.resistance, atr);
        let risk_long = RiskPlan::build(close, atr, TradeDirection::Long, &self.config);
        let risk_short = RiskPlan::build(close, atr, TradeDirection::Short, &self.config);
        let risk_level = assess_risk_level(&frame, &flags);

        Ok(Some(ScanResult::build(ResultInputs {
            symbol,
            frame: &frame,
            ibs: last_ibs,
            rr_ratio,
            sector: &sector,
            flags: &flags,
            scores,
            risk_long: &risk_long,
            risk_short: &risk_short,
            risk_level,
        })))
    }
}
