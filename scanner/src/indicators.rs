//! Technical indicator math.
//!
//! Every function returns a series the same length as its input, aligned
//! index-for-index, with `NaN` filling the leading window where the value
//! is not yet defined. A value at row `i` depends only on rows `<= i`.

use common::Bar;

/// Exponential moving average: alpha = 2/(span+1), seeded with the first
/// value.
pub fn ema(series: &[f64], span: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len());
    let mut prev = series[0];
    out.push(prev);
    for &value in &series[1..] {
        prev = alpha * value + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Simple moving average over a trailing window.
pub fn sma(series: &[f64], window: usize) -> Vec<f64> {
    rolling(series, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sample standard deviation (ddof = 1).
pub fn rolling_std(series: &[f64], window: usize) -> Vec<f64> {
    rolling(series, window, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() as f64 - 1.0);
        var.sqrt()
    })
}

/// Rolling max over a trailing window.
pub fn rolling_max(series: &[f64], window: usize) -> Vec<f64> {
    rolling(series, window, |w| w.iter().cloned().fold(f64::MIN, f64::max))
}

/// Rolling min over a trailing window.
pub fn rolling_min(series: &[f64], window: usize) -> Vec<f64> {
    rolling(series, window, |w| w.iter().cloned().fold(f64::MAX, f64::min))
}

/// Rolling quantile with linear interpolation between order statistics.
pub fn rolling_quantile(series: &[f64], window: usize, q: f64) -> Vec<f64> {
    rolling(series, window, |w| {
        let mut sorted = w.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let pos = q * (sorted.len() as f64 - 1.0);
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        if lo == hi {
            sorted[lo]
        } else {
            let frac = pos - lo as f64;
            sorted[lo] * (1.0 - frac) + sorted[hi] * frac
        }
    })
}

/// Rolling percent rank: the fraction of the trailing window at or below
/// the current value.
pub fn rolling_percent_rank(series: &[f64], window: usize) -> Vec<f64> {
    rolling(series, window, |w| {
        let current = w[w.len() - 1];
        let at_or_below = w.iter().filter(|&&v| v <= current).count();
        at_or_below as f64 / w.len() as f64
    })
}

fn rolling<F>(series: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; series.len()];
    if window == 0 || series.len() < window {
        return out;
    }
    for i in (window - 1)..series.len() {
        let w = &series[i + 1 - window..=i];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(w);
    }
    out
}

/// Relative Strength Index over `length` periods.
///
/// Signed deltas are split into zero-floored gain and loss series, each
/// smoothed with an EMA; a 1e-9 epsilon on the loss denominator avoids
/// division by zero on monotonic input. Output is bounded in [0, 100].
pub fn rsi(series: &[f64], length: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let mut gains = vec![0.0; series.len()];
    let mut losses = vec![0.0; series.len()];
    for i in 1..series.len() {
        let delta = series[i] - series[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }
    let avg_gain = ema(&gains, length);
    let avg_loss = ema(&losses, length);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| {
            let rs = g / (l + 1e-9);
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// Average True Range: true range exponentially smoothed over `length`
/// periods. The first row's true range is simply high - low.
pub fn atr(bars: &[Bar], length: usize) -> Vec<f64> {
    if bars.is_empty() {
        return Vec::new();
    }
    let mut tr = Vec::with_capacity(bars.len());
    tr.push(bars[0].range());
    for i in 1..bars.len() {
        let prev_close = bars[i - 1].close;
        let hl = bars[i].range();
        let hc = (bars[i].high - prev_close).abs();
        let lc = (bars[i].low - prev_close).abs();
        tr.push(hl.max(hc).max(lc));
    }
    ema(&tr, length)
}

/// MACD line, signal line and histogram.
pub fn macd(series: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let ema_fast = ema(series, fast);
    let ema_slow = ema(series, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram: Vec<f64> = line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();
    (line, signal_line, histogram)
}

/// Bollinger bands: middle SMA, upper/lower at +/- k rolling std devs.
pub fn bollinger(series: &[f64], window: usize, k: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let middle = sma(series, window);
    let std = rolling_std(series, window);
    let upper: Vec<f64> = middle.iter().zip(std.iter()).map(|(m, s)| m + k * s).collect();
    let lower: Vec<f64> = middle.iter().zip(std.iter()).map(|(m, s)| m - k * s).collect();
    (upper, middle, lower)
}

/// Central Pivot Range for one bar: (pivot, bottom central, top central,
/// width as a percentage of the pivot).
pub fn cpr(bar: &Bar) -> (f64, f64, f64, f64) {
    let pivot = (bar.high + bar.low + bar.close) / 3.0;
    let bc = (bar.high + bar.low) / 2.0;
    let tc = 2.0 * pivot - bc;
    let width_pct = (tc - bc).abs() / (pivot + 1e-9) * 100.0;
    (pivot, bc, tc, width_pct)
}

/// Internal Bar Strength: where the close sits within the day's range.
/// A zero-range day is neutral (0.5).
pub fn ibs(bar: &Bar) -> f64 {
    let range = bar.range();
    if range == 0.0 {
        0.5
    } else {
        (bar.close - bar.low) / range
    }
}

/// Support and resistance as the trailing-window low and high.
pub fn support_resistance(bars: &[Bar], window: usize) -> (f64, f64) {
    let tail = &bars[bars.len().saturating_sub(window)..];
    let support = tail.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let resistance = tail.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    (support, resistance)
}

/// Trailing n-bar percentage return of the last close.
pub fn trailing_return_pct(closes: &[f64], n: usize) -> Option<f64> {
    if closes.len() < n + 1 {
        return None;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - n];
    Some((last / base - 1.0) * 100.0)
}
