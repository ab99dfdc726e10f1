//! Additive long/short scoring and qualitative risk assessment.

use crate::frame::IndicatorFrame;
use crate::setups::SetupFlags;
use common::ScannerConfig;

/// Computes the long and short conviction scores from the setup flags and
/// the latest RSI/IBS readings. Both scores are independent running totals
/// clamped at a floor of zero; there is no ceiling.
pub fn calculate_scores(
    frame: &IndicatorFrame,
    flags: &SetupFlags,
    config: &ScannerConfig,
) -> (i32, i32) {
    let i = frame.last();
    let rsi = frame.rsi14[i];
    let ibs = crate::indicators::ibs(&frame.bars[i]);

    let mut score_long = 0i32;
    let mut score_short = 0i32;

    // Trend momentum
    if flags.trend_long {
        score_long += 3;
    }
    if flags.trend_short {
        score_short += 3;
    }

    // Breakouts
    if flags.twenty_high_break {
        score_long += 3;
    }
    if flags.twenty_low_break {
        score_short += 3;
    }

    // MACD crosses
    if flags.macd_bullish {
        score_long += 2;
    }
    if flags.macd_bearish {
        score_short += 2;
    }

    // Volatility compression
    if flags.nr7 {
        score_long += 1;
        score_short += 1;
    }
    if flags.narrow_cpr {
        score_long += 1;
        score_short += 1;
    }
    if flags.bb_squeeze {
        score_long += 1;
        score_short += 1;
    }

    // Volume
    if flags.vol_surge {
        score_long += 2;
        score_short += 2;
    }
    if flags.volume_confirmation {
        score_long += 1;
        score_short += 1;
    }

    // RSI positioning, with penalties at the configured extremes
    if rsi >= 60.0 {
        score_long += 1;
    }
    if rsi <= 40.0 {
        score_short += 1;
    }
    if rsi >= config.rsi_overbought {
        score_long -= 1;
    }
    if rsi <= config.rsi_oversold {
        score_short -= 1;
    }

    if flags.risk_reward_favorable {
        score_long += 1;
        score_short += 1;
    }

    if flags.narrow_cpr_percentile {
        score_long += 1;
        score_short += 1;
    }
    if flags.sector_outperformance {
        score_long += 2;
    }
    if flags.ibs_extreme {
        if ibs <= config.ibs_extreme_threshold {
            score_long += 1;
        } else if ibs >= 1.0 - config.ibs_extreme_threshold {
            score_short += 1;
        }
    }

    (score_long.max(0), score_short.max(0))
}

/// Counts risk factors on the latest row and maps them to Low/Medium/High.
pub fn assess_risk_level(frame: &IndicatorFrame, flags: &SetupFlags) -> &'static str {
    let i = frame.last();
    let close = frame.bars[i].close;
    let mut risk_factors = 0;

    // daily ATR above 3% of price
    if frame.atr14[i] / close > 0.03 {
        risk_factors += 1;
    }
    if frame.rsi14[i] > 80.0 || frame.rsi14[i] < 20.0 {
        risk_factors += 1;
    }
    if frame.vol_ratio[i] < 0.5 {
        risk_factors += 1;
    }
    if !flags.risk_reward_favorable {
        risk_factors += 1;
    }

    if risk_factors <= 1 {
        "Low"
    } else if risk_factors <= 2 {
        "Medium"
    } else {
        "High"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_data::synthetic_bars;
    use common::ScannerConfig;

    fn frame() -> IndicatorFrame {
        IndicatorFrame::compute(synthetic_bars(60))
    }

    #[test]
    fn test_scores_never_negative() {
        // no flags set, RSI penalty alone must not push a score below zero
        let mut f = frame();
        let i = f.last();
        f.rsi14[i] = 25.0;
        let flags = SetupFlags::default();
        let (long, short) = calculate_scores(&f, &flags, &ScannerConfig::default());
        assert_eq!(long, 0);
        assert_eq!(short, 0);
    }

    #[test]
    fn test_weight_table_long_side() {
        let mut f = frame();
        let i = f.last();
        f.rsi14[i] = 65.0;
        let flags = SetupFlags {
            trend_long: true,
            twenty_high_break: true,
            macd_bullish: true,
            nr7: true,
            narrow_cpr: true,
            bb_squeeze: true,
            vol_surge: true,
            volume_confirmation: true,
            risk_reward_favorable: true,
            narrow_cpr_percentile: true,
            sector_outperformance: true,
            ..Default::default()
        };
        // 3+3+2+1+1+1+2+1+1(rsi>=60)+1+1+2 = 19
        let (long, _) = calculate_scores(&f, &flags, &ScannerConfig::default());
        assert_eq!(long, 19);
    }

    #[test]
    fn test_overbought_penalty() {
        let mut f = frame();
        let i = f.last();
        f.rsi14[i] = 75.0;
        let flags = SetupFlags {
            trend_long: true,
            ..Default::default()
        };
        // +3 trend, +1 rsi>=60, -1 rsi>=70
        let (long, _) = calculate_scores(&f, &flags, &ScannerConfig::default());
        assert_eq!(long, 3);
    }

    #[test]
    fn test_trend_short_scores_at_least_three() {
        // close below both EMAs with confirming RSI
        let mut f = frame();
        let i = f.last();
        f.bars[i].close = 100.0;
        f.ema20[i] = 102.0;
        f.ema50[i] = 105.0;
        f.rsi14[i] = 40.0;
        let flags = SetupFlags {
            trend_short: true,
            ..Default::default()
        };
        let (long, short) = calculate_scores(&f, &flags, &ScannerConfig::default());
        assert!(short >= 3);
        assert_eq!(long, 0);
    }

    #[test]
    fn test_sector_outperformance_is_long_only() {
        let f = frame();
        let flags = SetupFlags {
            sector_outperformance: true,
            ..Default::default()
        };
        let (long, short) = calculate_scores(&f, &flags, &ScannerConfig::default());
        assert_eq!(long - short, 2);
    }

    #[test]
    fn test_risk_level_counts_factors() {
        let mut f = frame();
        let i = f.last();
        // favorable setup, calm tape
        f.rsi14[i] = 55.0;
        f.atr14[i] = f.bars[i].close * 0.01;
        f.vol_ratio[i] = 1.0;
        let good = SetupFlags {
            risk_reward_favorable: true,
            ..Default::default()
        };
        assert_eq!(assess_risk_level(&f, &good), "Low");

        // stretched RSI, fat ATR, dead volume, poor risk-reward
        f.rsi14[i] = 85.0;
        f.atr14[i] = f.bars[i].close * 0.05;
        f.vol_ratio[i] = 0.3;
        let bad = SetupFlags::default();
        assert_eq!(assess_risk_level(&f, &bad), "High");
    }
}
