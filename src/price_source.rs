use crate::data_structures::PriceSeries;
use crate::error::MarketDataError;
use async_trait::async_trait;

/// Anything that can produce daily bars for a ticker.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries, MarketDataError>;
}
