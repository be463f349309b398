use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market mood classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "BULLISH",
            SentimentLabel::Bearish => "BEARISH",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated market sentiment, replaced wholesale on every refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentReading {
    /// Weighted score in [-1, 1]
    pub score: f64,
    pub label: SentimentLabel,
    pub news_score: f64,
    pub social_score: f64,
    pub news_count: usize,
    pub social_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl SentimentReading {
    /// Reading used before the first refresh completes
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            news_score: 0.0,
            social_score: 0.0,
            news_count: 0,
            social_count: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Balance and position snapshot from the last account refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountState {
    pub balance: f64,
    pub has_open_position: bool,
    pub updated_at: DateTime<Utc>,
}

impl AccountState {
    pub fn new(balance: f64, has_open_position: bool) -> Self {
        Self {
            balance: balance.max(0.0),
            has_open_position,
            updated_at: Utc::now(),
        }
    }
}

impl Default for AccountState {
    fn default() -> Self {
        Self::new(0.0, false)
    }
}

/// Trade direction derived from sentiment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn side(&self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// Order side as the exchange spells it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated order handed to the exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

/// Exchange acknowledgement of a placed order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResult {
    pub order_id: String,
    pub order_link_id: String,
}

/// Open position reported by the exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionInfo {
    pub symbol: String,
    pub size: f64,
    pub side: Option<Side>,
}

/// News article as returned by the news feed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
}

impl NewsItem {
    /// Text fed to the scorers
    pub fn content(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Post from the social feed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialPost {
    pub text: String,
}
