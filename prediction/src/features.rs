//! Feature extraction from scan records.
//!
//! The column order here is the implicit contract between training and
//! prediction: a persisted model only makes sense against this exact
//! ordered list, so the names are checked on load and the count on
//! every predict.

use anyhow::{bail, Result};
use common::ScanError;
use scanner::ScanResult;

/// Ordered model feature names. Booleans are cast to 0/1.
pub const FEATURE_NAMES: [&str; 19] = [
    "score_long",
    "score_short",
    "rsi14",
    "atr14",
    "vol_ratio",
    "cpr_width_pct",
    "macd_value",
    "bb_position",
    "risk_reward_ratio",
    "ibs",
    "twenty_high_break",
    "twenty_low_break",
    "macd_bullish",
    "macd_bearish",
    "narrow_cpr",
    "bb_squeeze",
    "vol_surge",
    "trend_long",
    "trend_short",
];

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Builds the feature vector for one scan record, in `FEATURE_NAMES` order.
pub fn feature_vector(r: &ScanResult) -> Vec<f64> {
    vec![
        r.score_long as f64,
        r.score_short as f64,
        finite_or_zero(r.rsi14),
        finite_or_zero(r.atr14),
        finite_or_zero(r.vol_ratio),
        finite_or_zero(r.cpr_width_pct),
        finite_or_zero(r.macd_value),
        finite_or_zero(r.bb_position),
        finite_or_zero(r.risk_reward_ratio),
        finite_or_zero(r.ibs),
        flag(r.twenty_high_break),
        flag(r.twenty_low_break),
        flag(r.macd_bullish),
        flag(r.macd_bearish),
        flag(r.narrow_cpr),
        flag(r.bb_squeeze),
        flag(r.vol_surge),
        flag(r.trend_long),
        flag(r.trend_short),
    ]
}

/// Builds the feature vector for one labeled outcome record, in the same
/// order as `feature_vector` so training and prediction agree.
pub fn outcome_feature_vector(r: &crate::outcomes::OutcomeRecord) -> Vec<f64> {
    vec![
        r.score_long as f64,
        r.score_short as f64,
        finite_or_zero(r.rsi14),
        finite_or_zero(r.atr14),
        finite_or_zero(r.vol_ratio),
        finite_or_zero(r.cpr_width_pct),
        finite_or_zero(r.macd_value),
        finite_or_zero(r.bb_position),
        finite_or_zero(r.risk_reward_ratio),
        finite_or_zero(r.ibs),
        flag(r.twenty_high_break),
        flag(r.twenty_low_break),
        flag(r.macd_bullish),
        flag(r.macd_bearish),
        flag(r.narrow_cpr),
        flag(r.bb_squeeze),
        flag(r.vol_surge),
        flag(r.trend_long),
        flag(r.trend_short),
    ]
}

/// Rejects a feature count that disagrees with the model's expectation.
/// A silent mispredict is worse than a crash, so this is a hard error.
pub fn check_shape(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        bail!(ScanError::ShapeMismatch { expected, found });
    }
    Ok(())
}

/// Rejects a persisted feature list whose names or order disagree with
/// the current contract. Count is checked first, then each column.
pub fn check_names(found: &[String]) -> Result<()> {
    check_shape(FEATURE_NAMES.len(), found.len())?;
    for (index, (expected, got)) in FEATURE_NAMES.iter().zip(found).enumerate() {
        if expected != got {
            bail!(ScanError::FeatureMismatch {
                index,
                expected: expected.to_string(),
                found: got.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_matches_name_order() {
        let mut r = test_support::labeled_scan_result("TCS");
        r.score_long = 7;
        r.trend_long = true;
        r.trend_short = false;
        let v = feature_vector(&r);
        assert_eq!(v.len(), FEATURE_NAMES.len());
        assert_eq!(v[0], 7.0);
        assert_eq!(v[17], 1.0);
        assert_eq!(v[18], 0.0);
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let mut r = test_support::labeled_scan_result("TCS");
        r.rsi14 = f64::NAN;
        let v = feature_vector(&r);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn test_shape_mismatch_is_hard_error() {
        assert!(check_shape(19, 19).is_ok());
        let err = check_shape(19, 12).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::ShapeMismatch {
                expected: 19,
                found: 12
            })
        ));
    }

    #[test]
    fn test_renamed_column_is_hard_error() {
        let exact: Vec<String> = FEATURE_NAMES.iter().map(|n| n.to_string()).collect();
        assert!(check_names(&exact).is_ok());

        let mut renamed = exact.clone();
        renamed[2] = "rsi".to_string();
        let err = check_names(&renamed).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::FeatureMismatch { index: 2, .. })
        ));

        let mut swapped = exact;
        swapped.swap(0, 1);
        assert!(check_names(&swapped).is_err());
    }
}
