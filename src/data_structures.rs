use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// --- Price Data ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars for one symbol, ascending by date with at most one bar per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        // Keep the later bar when upstream reports a date twice (live bar + settled bar)
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { symbol: symbol.into(), bars: deduped }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

// --- Analytics Results ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakDirection {
    Rise,
    Fall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStreak {
    pub symbol: String,
    pub streak_type: StreakDirection,
    pub days: usize,
    pub last_close: f64,
    pub as_of: String,
    pub prices: Vec<f64>,
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumRecord {
    pub symbol: String,
    pub change_pct: f64,
    pub last_close: f64,
    pub as_of: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighLowPerformers {
    pub high: Vec<MomentumRecord>,
    pub low: Vec<MomentumRecord>,
    pub period: String,
    #[serde(rename = "N")]
    pub n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmaStatus {
    #[serde(rename = "Above SMA")]
    Above,
    #[serde(rename = "Below SMA")]
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaDeviation {
    pub symbol: String,
    pub sma_period: usize,
    pub last_close: f64,
    pub last_sma: f64,
    pub status: SmaStatus,
    pub deviation_pct: f64,
    pub as_of: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerList {
    pub tickers: Vec<String>,
    pub count: usize,
}

// --- Type Aliases for Shared State ---

pub type SharedScanner = Arc<crate::scanner::ScannerService>;
