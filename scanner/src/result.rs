//! Per-symbol scan record, serialized one row per symbol in batch CSVs.

use crate::frame::IndicatorFrame;
use crate::risk::RiskPlan;
use crate::sector::{RsRating, SectorStrength};
use crate::setups::SetupFlags;
use serde::{Deserialize, Serialize};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// One scan record per symbol per run. Created fresh each scan, immutable
/// afterwards, and written as a single flat CSV row (setup flags become
/// boolean columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub score_long: i32,
    pub score_short: i32,
    pub close: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi14: f64,
    pub atr14: f64,
    pub vol_ratio: f64,
    pub cpr_width_pct: f64,
    pub macd_value: f64,
    pub macd_signal: f64,
    pub bb_position: f64,
    pub support: f64,
    pub resistance: f64,
    pub risk_reward_ratio: f64,
    pub ibs: f64,
    pub cpr_percentile: f64,
    pub sector: String,
    pub rs_5d_pct: f64,
    pub rs_rating: RsRating,

    pub stop_loss_points_long: f64,
    pub stop_loss_price_long: f64,
    pub target_points_long: f64,
    pub target_price_long: f64,
    pub suggested_shares_long: u32,
    pub actual_risk_long: f64,

    pub stop_loss_points_short: f64,
    pub stop_loss_price_short: f64,
    pub target_points_short: f64,
    pub target_price_short: f64,
    pub suggested_shares_short: u32,
    pub actual_risk_short: f64,

    pub nr7: bool,
    pub inside_day: bool,
    pub vol_surge: bool,
    pub trend_long: bool,
    pub trend_short: bool,
    pub twenty_high_break: bool,
    pub twenty_low_break: bool,
    pub narrow_cpr: bool,
    pub macd_bullish: bool,
    pub macd_bearish: bool,
    pub bb_squeeze: bool,
    pub bb_expansion: bool,
    pub momentum_divergence: bool,
    pub volume_confirmation: bool,
    pub risk_reward_favorable: bool,
    pub narrow_cpr_percentile: bool,
    pub ibs_extreme: bool,
    pub sector_outperformance: bool,

    pub risk_level: String,
}

pub struct ResultInputs<'a> {
    pub symbol: &'a str,
    pub frame: &'a IndicatorFrame,
    pub ibs: f64,
    pub rr_ratio: f64,
    pub sector: &'a SectorStrength,
    pub flags: &'a SetupFlags,
    pub scores: (i32, i32),
    pub risk_long: &'a RiskPlan,
    pub risk_short: &'a RiskPlan,
    pub risk_level: &'a str,
}

impl ScanResult {
    pub fn build(inputs: ResultInputs<'_>) -> ScanResult {
        let ResultInputs {
            symbol,
            frame,
            ibs,
            rr_ratio,
            sector,
            flags,
            scores,
            risk_long,
            risk_short,
            risk_level,
        } = inputs;
        let i = frame.last();
        let bar = &frame.bars[i];

        ScanResult {
            symbol: symbol.to_string(),
            score_long: scores.0,
            score_short: scores.1,
            close: round2(bar.close),
            ema20: round2(frame.ema20[i]),
            ema50: round2(frame.ema50[i]),
            rsi14: round1(frame.rsi14[i]),
            atr14: round2(frame.atr14[i]),
            vol_ratio: round2(frame.vol_ratio[i]),
            cpr_width_pct: round2(frame.cpr_width_pct[i]),
            macd_value: round2(frame.macd_line[i]),
            macd_signal: round2(frame.macd_signal[i]),
            bb_position: round2(frame.bb_position[i]),
            support: round2(frame.support),
            resistance: round2(frame.resistance),
            risk_reward_ratio: round2(rr_ratio),
            ibs: round3(ibs),
            cpr_percentile: round3(frame.cpr_percentile[i]),
            sector: sector.sector.clone(),
            rs_5d_pct: sector.rs_5d_pct,
            rs_rating: sector.rs_rating,
            stop_loss_points_long: risk_long.stop_points,
            stop_loss_price_long: risk_long.stop_price,
            target_points_long: risk_long.target_points,
            target_price_long: risk_long.target_price,
            suggested_shares_long: risk_long.suggested_shares,
            actual_risk_long: risk_long.actual_risk,
            stop_loss_points_short: risk_short.stop_points,
            stop_loss_price_short: risk_short.stop_price,
            target_points_short: risk_short.target_points,
            target_price_short: risk_short.target_price,
            suggested_shares_short: risk_short.suggested_shares,
            actual_risk_short: risk_short.actual_risk,
            nr7: flags.nr7,
            inside_day: flags.inside_day,
            vol_surge: flags.vol_surge,
            trend_long: flags.trend_long,
            trend_short: flags.trend_short,
            twenty_high_break: flags.twenty_high_break,
            twenty_low_break: flags.twenty_low_break,
            narrow_cpr: flags.narrow_cpr,
            macd_bullish: flags.macd_bullish,
            macd_bearish: flags.macd_bearish,
            bb_squeeze: flags.bb_squeeze,
            bb_expansion: flags.bb_expansion,
            momentum_divergence: flags.momentum_divergence,
            volume_confirmation: flags.volume_confirmation,
            risk_reward_favorable: flags.risk_reward_favorable,
            narrow_cpr_percentile: flags.narrow_cpr_percentile,
            ibs_extreme: flags.ibs_extreme,
            sector_outperformance: flags.sector_outperformance,
            risk_level: risk_level.to_string(),
        }
    }
}
