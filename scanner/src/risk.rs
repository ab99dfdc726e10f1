//! ATR-based stop/target placement and lot-rounded position sizing.

use common::ScannerConfig;
use serde::{Deserialize, Serialize};

/// Shares per lot used when rounding position sizes.
const LOT_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Long => "LONG",
            TradeDirection::Short => "SHORT",
        }
    }
}

/// Stop, target and sizing for one direction of one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPlan {
    pub direction: TradeDirection,
    pub stop_points: f64,
    pub stop_price: f64,
    pub target_points: f64,
    pub target_price: f64,
    pub suggested_shares: u32,
    pub actual_risk: f64,
    pub risk_reward_ratio: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl RiskPlan {
    /// Builds the plan for one direction from the latest close and ATR.
    ///
    /// Sizing rounds down to the nearest lot with a floor of one lot, so
    /// actual risk never exceeds the configured risk amount by more than
    /// lot rounding. A non-positive stop distance (zero ATR) falls back to
    /// one lot risking the full configured amount.
    pub fn build(
        close: f64,
        atr: f64,
        direction: TradeDirection,
        config: &ScannerConfig,
    ) -> RiskPlan {
        let stop_points = atr * config.stop_atr_multiplier;
        let target_points = stop_points * config.target_rr_ratio;

        let (stop_price, target_price) = match direction {
            TradeDirection::Long => (close - stop_points, close + target_points),
            TradeDirection::Short => (close + stop_points, close - target_points),
        };

        let (suggested_shares, actual_risk) = if stop_points > 0.0 {
            let max_shares = (config.risk_per_trade / stop_points) as u32;
            let shares = (max_shares / LOT_SIZE).max(1) * LOT_SIZE;
            (shares, shares as f64 * stop_points)
        } else {
            (LOT_SIZE, config.risk_per_trade)
        };

        RiskPlan {
            direction,
            stop_points: round2(stop_points),
            stop_price: round2(stop_price),
            target_points: round2(target_points),
            target_price: round2(target_price),
            suggested_shares,
            actual_risk: round2(actual_risk),
            risk_reward_ratio: config.target_rr_ratio,
        }
    }
}

/// Reward-to-risk ratio from close to resistance versus close to support,
/// floored at 1.5x ATR on the risk side.
pub fn risk_reward_ratio(close: f64, support: f64, resistance: f64, atr: f64) -> f64 {
    let potential_reward = (resistance - close).abs();
    let potential_risk = (atr * 1.5).max((close - support).abs());
    if potential_risk > 0.0 {
        potential_reward / potential_risk
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScannerConfig {
        ScannerConfig::default()
    }

    #[test]
    fn test_long_sizing_reference_case() {
        // ATR=2.0, mult=0.8, RR=2.0, risk=5000, close=500
        let plan = RiskPlan::build(500.0, 2.0, TradeDirection::Long, &config());
        assert!((plan.stop_points - 1.6).abs() < 1e-9);
        assert!((plan.stop_price - 498.4).abs() < 1e-9);
        assert!((plan.target_points - 3.2).abs() < 1e-9);
        assert!((plan.target_price - 503.2).abs() < 1e-9);
        // 5000 / 1.6 = 3125, already a lot multiple
        assert_eq!(plan.suggested_shares, 3125);
        assert!((plan.actual_risk - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_and_target_straddle_close() {
        let long = RiskPlan::build(500.0, 2.0, TradeDirection::Long, &config());
        assert!(long.stop_price < 500.0 && long.target_price > 500.0);

        let short = RiskPlan::build(500.0, 2.0, TradeDirection::Short, &config());
        assert!(short.stop_price > 500.0 && short.target_price < 500.0);
    }

    #[test]
    fn test_actual_risk_bounded_by_configured_risk() {
        // stop distance that does not divide evenly into lots
        let plan = RiskPlan::build(500.0, 7.3, TradeDirection::Long, &config());
        let cfg = config();
        assert_eq!(plan.suggested_shares % 25, 0);
        assert!(plan.actual_risk <= cfg.risk_per_trade + 1e-9);
    }

    #[test]
    fn test_minimum_one_lot() {
        // huge stop distance forces the one-lot floor even above budget
        let plan = RiskPlan::build(500.0, 500.0, TradeDirection::Long, &config());
        assert_eq!(plan.suggested_shares, 25);
    }

    #[test]
    fn test_zero_atr_fallback() {
        let cfg = config();
        let plan = RiskPlan::build(500.0, 0.0, TradeDirection::Long, &cfg);
        assert_eq!(plan.suggested_shares, 25);
        assert!((plan.actual_risk - cfg.risk_per_trade).abs() < 1e-9);
        assert!((plan.stop_price - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_reward_ratio_atr_floor() {
        // support right at the close, ATR floor keeps the ratio finite
        let rr = risk_reward_ratio(100.0, 100.0, 106.0, 2.0);
        assert!((rr - 2.0).abs() < 1e-9);
        assert_eq!(risk_reward_ratio(100.0, 100.0, 106.0, 0.0), 0.0);
    }
}
