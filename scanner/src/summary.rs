//! Human-readable end-of-run summary of the top candidates.

use crate::result::ScanResult;
use crate::risk::TradeDirection;

fn notes(r: &ScanResult) -> String {
    let mut notes = Vec::new();
    if r.trend_long {
        notes.push("trend+".to_string());
    }
    if r.trend_short {
        notes.push("trend-".to_string());
    }
    if r.twenty_high_break {
        notes.push("20D+".to_string());
    }
    if r.twenty_low_break {
        notes.push("20D-".to_string());
    }
    if r.macd_bullish {
        notes.push("MACD+".to_string());
    }
    if r.macd_bearish {
        notes.push("MACD-".to_string());
    }
    if r.nr7 {
        notes.push("NR7".to_string());
    }
    if r.inside_day {
        notes.push("Inside".to_string());
    }
    if r.narrow_cpr {
        notes.push("NarrowCPR".to_string());
    }
    if r.bb_squeeze {
        notes.push("BBSqueeze".to_string());
    }
    if r.vol_surge {
        notes.push("Vol+".to_string());
    }
    if r.risk_reward_favorable {
        notes.push("R:R+".to_string());
    }
    if r.narrow_cpr_percentile {
        notes.push("CPRlow".to_string());
    }
    if r.ibs_extreme {
        notes.push(format!("IBS{:.1}", r.ibs));
    }
    if r.sector_outperformance {
        notes.push("Sect+".to_string());
    }
    notes.join("/")
}

fn format_list(candidates: &[&ScanResult], direction: TradeDirection) -> String {
    let mut lines = Vec::with_capacity(candidates.len());
    for r in candidates {
        let (score, stop, target, shares, risk) = match direction {
            TradeDirection::Long => (
                r.score_long,
                r.stop_loss_price_long,
                r.target_price_long,
                r.suggested_shares_long,
                r.actual_risk_long,
            ),
            TradeDirection::Short => (
                r.score_short,
                r.stop_loss_price_short,
                r.target_price_short,
                r.suggested_shares_short,
                r.actual_risk_short,
            ),
        };
        lines.push(format!(
            "{:>12} | Score={:2} | RSI={:5.1} | IBS={:4.2} | Stop={:8.2} | Tgt={:8.2} | Shares={:5} | Risk={:7.0} | {:>8} | {}",
            r.symbol, score, r.rsi14, r.ibs, stop, target, shares, risk, r.sector, notes(r)
        ));
    }
    lines.join("\n")
}

/// Renders the top long and short candidates as a fixed-width report.
pub fn render_summary(long: &[&ScanResult], short: &[&ScanResult]) -> String {
    let rule = "=".repeat(120);
    format!(
        "{rule}\n{:^120}\n{rule}\n{}\n\n{rule}\n{:^120}\n{rule}\n{}\n{rule}",
        "LONG CANDIDATES (Top 25)",
        format_list(long, TradeDirection::Long),
        "SHORT CANDIDATES (Top 25)",
        format_list(short, TradeDirection::Short),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::test_support::sample_result;

    #[test]
    fn test_summary_lists_symbols_with_direction_prices() {
        let mut long = sample_result("TCS");
        long.trend_long = true;
        let short = sample_result("INFY");

        let text = render_summary(&[&long], &[&short]);
        assert!(text.contains("LONG CANDIDATES"));
        assert!(text.contains("SHORT CANDIDATES"));
        assert!(text.contains("TCS"));
        assert!(text.contains("INFY"));
        assert!(text.contains("trend+"));
    }

    #[test]
    fn test_empty_batch_renders_headers_only() {
        let text = render_summary(&[], &[]);
        assert!(text.contains("LONG CANDIDATES"));
    }
}
