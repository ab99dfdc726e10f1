//! Sector classification and short-horizon relative strength.

use common::sector_for;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative-strength rating against the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsRating {
    Strong,
    Neutral,
    Weak,
}

impl RsRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsRating::Strong => "Strong",
            RsRating::Neutral => "Neutral",
            RsRating::Weak => "Weak",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Strong" => RsRating::Strong,
            "Weak" => RsRating::Weak,
            _ => RsRating::Neutral,
        }
    }
}

/// Sector label plus relative performance for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorStrength {
    pub sector: String,
    /// Percentage outperformance over the benchmark's 5-bar return.
    pub rs_5d_pct: f64,
    pub rs_rating: RsRating,
}

/// Relative strength of a symbol's trailing 5-bar return versus a
/// benchmark return over the same horizon.
///
/// The benchmark is pluggable: pass the real index return when one is
/// available. When `benchmark_return_pct` is `None`, a proxy of 0.8x the
/// symbol's own return is used in its place; this skews the rating toward
/// the symbol's own momentum and is logged as a proxy.
pub fn relative_strength(
    symbol: &str,
    symbol_5d_return_pct: Option<f64>,
    benchmark_return_pct: Option<f64>,
) -> SectorStrength {
    let sector = sector_for(symbol).to_string();

    let Some(own) = symbol_5d_return_pct else {
        return SectorStrength {
            sector,
            rs_5d_pct: 0.0,
            rs_rating: RsRating::Neutral,
        };
    };

    let benchmark = match benchmark_return_pct {
        Some(b) => b,
        None => {
            debug!("No benchmark return for {}; using own-return proxy", symbol);
            own * 0.8
        }
    };

    if benchmark == 0.0 {
        return SectorStrength {
            sector,
            rs_5d_pct: 0.0,
            rs_rating: RsRating::Neutral,
        };
    }

    let rs_score = own / benchmark - 1.0;
    let rs_rating = if rs_score > 0.1 {
        RsRating::Strong
    } else if rs_score < -0.1 {
        RsRating::Weak
    } else {
        RsRating::Neutral
    };

    SectorStrength {
        sector,
        rs_5d_pct: (rs_score * 100.0 * 100.0).round() / 100.0,
        rs_rating,
    }
}
