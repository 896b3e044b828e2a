//! Price-series analytics: trend streaks, N-day momentum and SMA deviation.
//!
//! Every function here is pure and works on a single [`PriceSeries`]; fetching
//! and per-ticker error handling live in [`crate::scanner`].

use crate::data_structures::{
    HighLowPerformers, MomentumRecord, PriceSeries, SmaDeviation, SmaStatus, StreakDirection,
    TrendStreak,
};
use std::cmp::Ordering;

const AS_OF_FORMAT: &str = "%Y-%m-%d";
const CHART_DATE_FORMAT: &str = "%d-%b";

/// Two-decimal rounding with ties to even, so 0.125 becomes 0.12.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Fractional change between consecutive closes. Index `i` holds the change
/// from `closes[i]` to `closes[i + 1]`; a zero base yields a non-finite value.
pub fn pct_changes(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Scans day-over-day changes and stops at the first run of `min_days`
/// same-direction moves. Flat or non-computable days reset the run.
pub fn find_streak(closes: &[f64], min_days: usize) -> Option<(StreakDirection, usize)> {
    let mut streak = 0usize;
    let mut trend: Option<StreakDirection> = None;

    for change in pct_changes(closes) {
        let direction = if change < 0.0 {
            Some(StreakDirection::Fall)
        } else if change > 0.0 {
            Some(StreakDirection::Rise)
        } else {
            None
        };

        match direction {
            Some(d) => {
                streak = if trend == Some(d) { streak + 1 } else { 1 };
                trend = Some(d);
            }
            None => {
                streak = 0;
                trend = None;
            }
        }

        if streak >= min_days {
            return trend.map(|d| (d, streak));
        }
    }

    None
}

pub fn detect_trend_streak(
    series: &PriceSeries,
    min_days: usize,
    chart_window: usize,
) -> Option<TrendStreak> {
    let last = series.last()?;
    let (streak_type, days) = find_streak(&series.closes(), min_days)?;

    let recent = &series.bars[series.len().saturating_sub(chart_window)..];
    Some(TrendStreak {
        symbol: series.symbol.clone(),
        streak_type,
        days,
        last_close: last.close,
        as_of: last.date.format(AS_OF_FORMAT).to_string(),
        prices: recent.iter().map(|b| round2(b.close)).collect(),
        dates: recent
            .iter()
            .map(|b| b.date.format(CHART_DATE_FORMAT).to_string())
            .collect(),
    })
}

/// Percentage change of the last close over `period` bars, rounded to 2 dp.
/// `None` when the series is too short to look back `period` bars.
pub fn momentum(series: &PriceSeries, period: usize) -> Option<MomentumRecord> {
    if period == 0 || series.len() <= period {
        return None;
    }
    let last = series.last()?;
    let base = series.bars[series.len() - 1 - period].close;
    let change_pct = (last.close / base - 1.0) * 100.0;

    Some(MomentumRecord {
        symbol: series.symbol.clone(),
        change_pct: round2(change_pct),
        last_close: last.close,
        as_of: last.date.format(AS_OF_FORMAT).to_string(),
    })
}

/// Drops non-finite changes and sorts the rest by `change_pct`, highest first.
pub fn rank_momentum(mut records: Vec<MomentumRecord>) -> Vec<MomentumRecord> {
    records.retain(|r| r.change_pct.is_finite());
    records.sort_by(|a, b| b.change_pct.partial_cmp(&a.change_pct).unwrap_or(Ordering::Equal));
    records
}

/// Splits a ranked list into its top and bottom `top_n`. With fewer than
/// `top_n` records each side gets half of them (rounded down).
pub fn high_low_performers(ranked: &[MomentumRecord], top_n: usize, period: usize) -> HighLowPerformers {
    let n = if ranked.len() < top_n { ranked.len() / 2 } else { top_n };

    HighLowPerformers {
        high: ranked[..n].to_vec(),
        low: ranked[ranked.len() - n..].to_vec(),
        period: format!("{}-Day (1 Week)", period),
        n,
    }
}

/// Simple moving average of the trailing `period` values. `None` when there
/// are fewer than `period` values.
pub fn trailing_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

pub fn sma_deviation(series: &PriceSeries, period: usize) -> Option<SmaDeviation> {
    let last = series.last()?;
    let last_sma = trailing_sma(&series.closes(), period)?;
    let deviation_pct = (last.close - last_sma) / last_sma * 100.0;
    if !deviation_pct.is_finite() {
        return None;
    }

    let status = if last.close > last_sma { SmaStatus::Above } else { SmaStatus::Below };

    Some(SmaDeviation {
        symbol: series.symbol.clone(),
        sma_period: period,
        last_close: round2(last.close),
        last_sma: round2(last_sma),
        status,
        deviation_pct: round2(deviation_pct),
        as_of: last.date.format(AS_OF_FORMAT).to_string(),
    })
}

pub fn rank_sma_deviation(mut records: Vec<SmaDeviation>) -> Vec<SmaDeviation> {
    records.sort_by(|a, b| b.deviation_pct.partial_cmp(&a.deviation_pct).unwrap_or(Ordering::Equal));
    records
}
