//! Per-symbol indicator frame.
//!
//! The full bar history annotated with every derived column, built once
//! per scan and discarded after the latest row is folded into the result
//! record. No column looks ahead: row `i` depends only on rows `<= i`.

use crate::indicators;
use common::Bar;

/// Minimum bar count for the longest indicator lookback.
pub const MIN_BARS: usize = 50;

/// Bar history plus derived indicator columns, all index-aligned.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub bars: Vec<Bar>,
    pub ema20: Vec<f64>,
    pub ema50: Vec<f64>,
    pub rsi14: Vec<f64>,
    pub atr14: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_hist: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_middle: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub bb_width: Vec<f64>,
    pub bb_position: Vec<f64>,
    pub cpr_width_pct: Vec<f64>,
    pub cpr_percentile: Vec<f64>,
    pub vol_ratio: Vec<f64>,
    pub range: Vec<f64>,
    pub twenty_day_high: Vec<f64>,
    pub twenty_day_low: Vec<f64>,
    pub support: f64,
    pub resistance: f64,
}

impl IndicatorFrame {
    /// Derive every indicator column from a chronological bar history.
    pub fn compute(bars: Vec<Bar>) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let ema20 = indicators::ema(&closes, 20);
        let ema50 = indicators::ema(&closes, 50);
        let rsi14 = indicators::rsi(&closes, 14);
        let atr14 = indicators::atr(&bars, 14);

        let (macd_line, macd_signal, macd_hist) = indicators::macd(&closes, 12, 26, 9);

        let (bb_upper, bb_middle, bb_lower) = indicators::bollinger(&closes, 20, 2.0);
        let bb_width: Vec<f64> = bb_upper
            .iter()
            .zip(bb_lower.iter())
            .zip(bb_middle.iter())
            .map(|((u, l), m)| (u - l) / m * 100.0)
            .collect();
        let bb_position: Vec<f64> = closes
            .iter()
            .zip(bb_upper.iter().zip(bb_lower.iter()))
            .map(|(c, (u, l))| (c - l) / (u - l))
            .collect();

        let cpr_width_pct: Vec<f64> = bars.iter().map(|b| indicators::cpr(b).3).collect();
        let cpr_percentile = indicators::rolling_percent_rank(&cpr_width_pct, 20);

        let vol_avg20 = indicators::sma(&volumes, 20);
        let vol_ratio: Vec<f64> = volumes
            .iter()
            .zip(vol_avg20.iter())
            .map(|(v, avg)| v / (avg + 1e-9))
            .collect();

        let range: Vec<f64> = bars.iter().map(|b| b.range()).collect();
        let twenty_day_high = indicators::rolling_max(&highs, 20);
        let twenty_day_low = indicators::rolling_min(&lows, 20);

        let (support, resistance) = indicators::support_resistance(&bars, 20);

        Self {
            bars,
            ema20,
            ema50,
            rsi14,
            atr14,
            macd_line,
            macd_signal,
            macd_hist,
            bb_upper,
            bb_middle,
            bb_lower,
            bb_width,
            bb_position,
            cpr_width_pct,
            cpr_percentile,
            vol_ratio,
            range,
            twenty_day_high,
            twenty_day_low,
            support,
            resistance,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the latest row.
    pub fn last(&self) -> usize {
        self.bars.len() - 1
    }

    /// Trailing 5-bar return of the latest close, in percent.
    pub fn five_day_return_pct(&self) -> Option<f64> {
        let closes: Vec<f64> = self.bars.iter().map(|b| b.close).collect();
        indicators::trailing_return_pct(&closes, 5)
    }
}


#[cfg(test)]
mod tests {
    use super::test_data::synthetic_bars;
    use super::*;

    #[test]
    fn test_every_column_aligns_with_bars() {
        let frame = IndicatorFrame::compute(synthetic_bars(80));
        let n = frame.len();
        assert_eq!(n, 80);
        for column in [
            &frame.ema20,
            &frame.ema50,
            &frame.rsi14,
            &frame.atr14,
            &frame.macd_line,
            &frame.macd_signal,
            &frame.macd_hist,
            &frame.bb_upper,
            &frame.bb_middle,
            &frame.bb_lower,
            &frame.bb_width,
            &frame.bb_position,
            &frame.cpr_width_pct,
            &frame.cpr_percentile,
            &frame.vol_ratio,
            &frame.range,
            &frame.twenty_day_high,
            &frame.twenty_day_low,
        ] {
            assert_eq!(column.len(), n);
        }
    }

    #[test]
    fn test_latest_row_is_fully_defined_past_min_bars() {
        let frame = IndicatorFrame::compute(synthetic_bars(60));
        let last = frame.last();
        assert!(frame.ema20[last].is_finite());
        assert!(frame.rsi14[last].is_finite());
        assert!(frame.atr14[last].is_finite());
        assert!(frame.bb_width[last].is_finite());
        assert!(frame.cpr_percentile[last].is_finite());
        assert!(frame.vol_ratio[last].is_finite());
        assert!(frame.twenty_day_high[last].is_finite());
        assert!(frame.support <= frame.resistance);
    }

    #[test]
    fn test_five_day_return() {
        let frame = IndicatorFrame::compute(synthetic_bars(60));
        assert!(frame.five_day_return_pct().is_some());

        let short = IndicatorFrame::compute(synthetic_bars(5));
        assert!(short.five_day_return_pct().is_none());
    }
}
