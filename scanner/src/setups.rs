//! Boolean setup detection on the latest two rows of an indicator frame.

use crate::frame::IndicatorFrame;
use crate::indicators::{rolling_min, rolling_quantile};
use crate::sector::{RsRating, SectorStrength};
use common::ScannerConfig;
use serde::{Deserialize, Serialize};

/// Named boolean setups evaluated per symbol per scan. Immutable once built.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SetupFlags {
    /// Today's range is the narrowest of the trailing 7 sessions.
    pub nr7: bool,
    /// Today's high/low contained within yesterday's.
    pub inside_day: bool,
    /// Volume ratio above threshold and absolute volume above the liquidity floor.
    pub vol_surge: bool,
    /// Close > EMA20 > EMA50 with RSI >= 55.
    pub trend_long: bool,
    /// Close < EMA20 < EMA50 with RSI <= 45.
    pub trend_short: bool,
    /// Close above yesterday's rolling 20-day high.
    pub twenty_high_break: bool,
    /// Close below yesterday's rolling 20-day low.
    pub twenty_low_break: bool,
    /// CPR width at or below the 20-day rolling low-percentile width.
    pub narrow_cpr: bool,
    /// MACD line crossed above its signal between yesterday and today.
    pub macd_bullish: bool,
    /// MACD line crossed below its signal between yesterday and today.
    pub macd_bearish: bool,
    /// Bollinger width at or below the 20-day 20th percentile.
    pub bb_squeeze: bool,
    /// Bollinger width at or above the 20-day 80th percentile.
    pub bb_expansion: bool,
    /// Day-over-day RSI change larger than 5 points.
    pub momentum_divergence: bool,
    /// Volume ratio above 1.5.
    pub volume_confirmation: bool,
    /// Reward distance to resistance at least 1.5x risk distance to support.
    pub risk_reward_favorable: bool,
    /// CPR width in the compressed tail of its own 20-day distribution.
    pub narrow_cpr_percentile: bool,
    /// IBS at either extreme of its range.
    pub ibs_extreme: bool,
    /// Relative-strength rating is Strong.
    pub sector_outperformance: bool,
}

impl SetupFlags {
    /// Evaluates all flags against the last two rows of `frame`.
    ///
    /// The frame must hold at least two rows; callers enforce the larger
    /// minimum-history requirement before indicators are computed at all.
    pub fn evaluate(
        frame: &IndicatorFrame,
        ibs: f64,
        sector: &SectorStrength,
        config: &ScannerConfig,
    ) -> SetupFlags {
        let i = frame.last();
        let p = i - 1;
        let last = &frame.bars[i];
        let prev = &frame.bars[p];

        let range_min7 = rolling_min(&frame.range, 7)[i];
        let cpr_q = rolling_quantile(&frame.cpr_width_pct, 20, config.cpr_narrow_percentile)[i];
        let bb_q20 = rolling_quantile(&frame.bb_width, 20, 0.2)[i];
        let bb_q80 = rolling_quantile(&frame.bb_width, 20, 0.8)[i];

        let reward = (last.close - frame.resistance).abs();
        let risk = (last.close - frame.support).abs();

        SetupFlags {
            nr7: frame.range[i] == range_min7,
            inside_day: last.high <= prev.high && last.low >= prev.low,
            vol_surge: frame.vol_ratio[i] >= config.vol_surge_threshold
                && last.volume > config.min_volume,
            trend_long: last.close > frame.ema20[i]
                && frame.ema20[i] > frame.ema50[i]
                && frame.rsi14[i] >= 55.0,
            trend_short: last.close < frame.ema20[i]
                && frame.ema20[i] < frame.ema50[i]
                && frame.rsi14[i] <= 45.0,
            twenty_high_break: last.close > frame.twenty_day_high[p],
            twenty_low_break: last.close < frame.twenty_day_low[p],
            narrow_cpr: frame.cpr_width_pct[i] <= cpr_q,
            macd_bullish: frame.macd_line[i] > frame.macd_signal[i]
                && frame.macd_line[p] <= frame.macd_signal[p],
            macd_bearish: frame.macd_line[i] < frame.macd_signal[i]
                && frame.macd_line[p] >= frame.macd_signal[p],
            bb_squeeze: frame.bb_width[i] <= bb_q20,
            bb_expansion: frame.bb_width[i] >= bb_q80,
            momentum_divergence: (frame.rsi14[i] - frame.rsi14[p]).abs() > 5.0,
            volume_confirmation: frame.vol_ratio[i] > 1.5,
            risk_reward_favorable: risk > 0.0 && reward / risk >= 1.5,
            narrow_cpr_percentile: frame.cpr_percentile[i] <= config.cpr_narrow_percentile,
            ibs_extreme: ibs <= config.ibs_extreme_threshold
                || ibs >= 1.0 - config.ibs_extreme_threshold,
            sector_outperformance: sector.rs_rating == RsRating::Strong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_data::synthetic_bars;
    use crate::indicators::ibs;
    use crate::sector::relative_strength;
    use common::{Bar, ScannerConfig};
    use chrono::NaiveDate;

    fn neutral_sector() -> SectorStrength {
        relative_strength("TCS", Some(1.0), Some(1.0))
    }

    fn evaluate_default(bars: Vec<Bar>) -> SetupFlags {
        let frame = IndicatorFrame::compute(bars);
        let i = frame.last();
        let last_ibs = ibs(&frame.bars[i]);
        SetupFlags::evaluate(
            &frame,
            last_ibs,
            &neutral_sector(),
            &ScannerConfig::default(),
        )
    }

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(i as u64)
    }

    #[test]
    fn test_inside_day_and_nr7() {
        let mut bars = synthetic_bars(60);
        let n = bars.len();
        // contract today's bar inside yesterday's with the narrowest range
        let prev = bars[n - 2].clone();
        bars[n - 1] = Bar {
            date: day(n - 1),
            open: prev.close,
            high: prev.high - 0.1,
            low: prev.low + 0.1,
            close: prev.close,
            volume: prev.volume,
        };
        let flags = evaluate_default(bars);
        assert!(flags.inside_day);
        assert!(flags.nr7);
    }

    #[test]
    fn test_breakout_uses_previous_day_extreme() {
        let mut bars = synthetic_bars(60);
        let n = bars.len();
        let prior_high = bars[..n - 1]
            .iter()
            .rev()
            .take(20)
            .map(|b| b.high)
            .fold(f64::MIN, f64::max);
        // close just above the prior 20-day high
        bars[n - 1].high = prior_high + 2.0;
        bars[n - 1].close = prior_high + 1.0;
        let flags = evaluate_default(bars);
        assert!(flags.twenty_high_break);
        assert!(!flags.twenty_low_break);
    }

    #[test]
    fn test_declining_tape_flags_trend_short_only() {
        // steady decline keeps the close under EMA20 under EMA50 with weak RSI
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let close = 200.0 - i as f64;
                Bar {
                    date: day(i),
                    open: close + 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 2_000_000.0,
                }
            })
            .collect();
        let frame = IndicatorFrame::compute(bars);
        let i = frame.last();
        assert!(frame.bars[i].close < frame.ema20[i]);
        assert!(frame.ema20[i] < frame.ema50[i]);
        assert!(frame.rsi14[i] <= 45.0);

        let last_ibs = ibs(&frame.bars[i]);
        let flags = SetupFlags::evaluate(
            &frame,
            last_ibs,
            &neutral_sector(),
            &ScannerConfig::default(),
        );
        assert!(flags.trend_short);
        assert!(!flags.trend_long);
    }

    #[test]
    fn test_vol_surge_requires_liquidity_floor() {
        let mut bars = synthetic_bars(60);
        let n = bars.len();
        // quiet tape, then a surge well below the absolute volume floor
        for b in bars.iter_mut() {
            b.volume = 100_000.0;
        }
        bars[n - 1].volume = 500_000.0;
        let flags = evaluate_default(bars.clone());
        assert!(!flags.vol_surge);

        bars[n - 1].volume = 5_000_000.0;
        let flags = evaluate_default(bars);
        assert!(flags.vol_surge);
    }

    #[test]
    fn test_ibs_extreme_close_at_low() {
        let mut bars = synthetic_bars(60);
        let n = bars.len();
        bars[n - 1].high = 110.0;
        bars[n - 1].low = 100.0;
        bars[n - 1].close = 100.0;
        let frame = IndicatorFrame::compute(bars);
        let i = frame.last();
        let last_ibs = ibs(&frame.bars[i]);
        assert_eq!(last_ibs, 0.0);
        let flags = SetupFlags::evaluate(
            &frame,
            last_ibs,
            &neutral_sector(),
            &ScannerConfig::default(),
        );
        assert!(flags.ibs_extreme);
    }

    #[test]
    fn test_sector_outperformance_follows_rating() {
        let bars = synthetic_bars(60);
        let frame = IndicatorFrame::compute(bars);
        let i = frame.last();
        let last_ibs = ibs(&frame.bars[i]);
        let strong = relative_strength("TCS", Some(5.0), Some(1.0));
        let flags =
            SetupFlags::evaluate(&frame, last_ibs, &strong, &ScannerConfig::default());
        assert!(flags.sector_outperformance);
    }
}
