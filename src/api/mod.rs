pub mod bybit;
pub mod newsapi;
pub mod twitter;

pub use bybit::BybitClient;
pub use newsapi::NewsApiClient;
pub use twitter::TwitterClient;

use crate::error::ServiceError;
use crate::models::{NewsItem, OrderIntent, OrderResult, PositionInfo, SocialPost};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Exchange operations the bot depends on
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Available quote-currency balance
    async fn get_balance(&self) -> Result<f64, ServiceError>;

    /// Last traded price for `symbol`
    async fn get_price(&self, symbol: &str) -> Result<f64, ServiceError>;

    async fn get_positions(&self, symbol: &str) -> Result<Vec<PositionInfo>, ServiceError>;

    /// Market order with attached stop-loss and take-profit
    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, ServiceError>;
}

/// Source of recent news articles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_recent(
        &self,
        query: &str,
        lookback_hours: u32,
    ) -> Result<Vec<NewsItem>, ServiceError>;
}

/// Source of recent social media posts
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SocialProvider: Send + Sync {
    async fn fetch_recent(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SocialPost>, ServiceError>;
}
