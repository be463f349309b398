use crate::error::ConfigError;
use crate::risk::RiskParameters;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "SENTIBOT";

/// Raw settings as read from defaults + environment, before validation
#[derive(Debug, Clone, Deserialize)]
struct RawSettings {
    symbol: String,
    timeframe: String,
    leverage: u32,
    testnet: bool,

    max_risk_per_trade: f64,
    max_position_size: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,

    sentiment_interval_secs: u64,
    account_interval_secs: u64,
    bullish_threshold: f64,
    bearish_threshold: f64,

    news_query: String,
    news_lookback_hours: u32,
    news_max_articles: usize,
    social_query: String,
    social_max_results: u32,

    http_timeout_secs: u64,

    bybit_api_key: Option<String>,
    bybit_api_secret: Option<String>,
    news_api_key: Option<String>,
    twitter_bearer_token: Option<String>,
}

/// API credentials for the collaborator clients
#[derive(Clone)]
pub struct Credentials {
    pub bybit_api_key: String,
    pub bybit_api_secret: String,
    pub news_api_key: String,
    pub twitter_bearer_token: String,
}

// Keep secrets out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Feed queries and limits used by the sentiment refresh
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub news_query: String,
    pub news_lookback_hours: u32,
    pub news_max_articles: usize,
    pub social_query: String,
    pub social_max_results: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            news_query: "crypto Bitcoin Ethereum".to_string(),
            news_lookback_hours: 24,
            news_max_articles: 20,
            social_query: "Bitcoin OR BTC OR crypto".to_string(),
            social_max_results: 50,
        }
    }
}

/// Entry thresholds applied to the sentiment score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    /// Score must exceed this to go long
    pub bullish: f64,
    /// Score must be below the negation of this to go short
    pub bearish: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            bullish: 0.15,
            bearish: 0.15,
        }
    }
}

/// Immutable bot configuration, built once at startup and passed by reference
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub symbol: String,
    pub timeframe: String,
    pub leverage: u32,
    pub testnet: bool,
    pub risk: RiskParameters,
    pub thresholds: SignalThresholds,
    pub sentiment_interval: Duration,
    pub account_interval: Duration,
    pub feeds: FeedSettings,
    pub http_timeout: Duration,
    pub credentials: Credentials,
}

impl BotConfig {
    /// Load from `.env` and `SENTIBOT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit key/value map instead of the process environment
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: config::Environment) -> Result<Self, ConfigError> {
        let feeds = FeedSettings::default();
        let thresholds = SignalThresholds::default();
        let risk = RiskParameters::default();

        let raw: RawSettings = config::Config::builder()
            .set_default("symbol", "BTCUSDT")?
            .set_default("timeframe", "15")?
            .set_default("leverage", 10)?
            .set_default("testnet", true)?
            .set_default("max_risk_per_trade", risk.max_risk_per_trade)?
            .set_default("max_position_size", risk.max_position_size)?
            .set_default("stop_loss_pct", risk.stop_loss_pct)?
            .set_default("take_profit_pct", risk.take_profit_pct)?
            .set_default("sentiment_interval_secs", 300)?
            .set_default("account_interval_secs", 60)?
            .set_default("bullish_threshold", thresholds.bullish)?
            .set_default("bearish_threshold", thresholds.bearish)?
            .set_default("news_query", feeds.news_query)?
            .set_default("news_lookback_hours", feeds.news_lookback_hours)?
            .set_default("news_max_articles", feeds.news_max_articles as u64)?
            .set_default("social_query", feeds.social_query)?
            .set_default("social_max_results", feeds.social_max_results)?
            .set_default("http_timeout_secs", 10)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let credentials = Credentials {
            bybit_api_key: required("bybit_api_key", raw.bybit_api_key)?,
            bybit_api_secret: required("bybit_api_secret", raw.bybit_api_secret)?,
            news_api_key: required("news_api_key", raw.news_api_key)?,
            twitter_bearer_token: required("twitter_bearer_token", raw.twitter_bearer_token)?,
        };

        if raw.symbol.trim().is_empty() {
            return Err(ConfigError::Missing("symbol"));
        }

        fraction("max_risk_per_trade", raw.max_risk_per_trade)?;
        fraction("max_position_size", raw.max_position_size)?;
        non_negative("stop_loss_pct", raw.stop_loss_pct)?;
        non_negative("take_profit_pct", raw.take_profit_pct)?;
        non_negative("bullish_threshold", raw.bullish_threshold)?;
        non_negative("bearish_threshold", raw.bearish_threshold)?;
        positive("sentiment_interval_secs", raw.sentiment_interval_secs)?;
        positive("account_interval_secs", raw.account_interval_secs)?;
        positive("http_timeout_secs", raw.http_timeout_secs)?;

        Ok(Self {
            symbol: raw.symbol.trim().to_uppercase(),
            timeframe: raw.timeframe,
            leverage: raw.leverage,
            testnet: raw.testnet,
            risk: RiskParameters {
                max_risk_per_trade: raw.max_risk_per_trade,
                max_position_size: raw.max_position_size,
                stop_loss_pct: raw.stop_loss_pct,
                take_profit_pct: raw.take_profit_pct,
            },
            thresholds: SignalThresholds {
                bullish: raw.bullish_threshold,
                bearish: raw.bearish_threshold,
            },
            sentiment_interval: Duration::from_secs(raw.sentiment_interval_secs),
            account_interval: Duration::from_secs(raw.account_interval_secs),
            feeds: FeedSettings {
                news_query: raw.news_query,
                news_lookback_hours: raw.news_lookback_hours,
                news_max_articles: raw.news_max_articles,
                social_query: raw.social_query,
                social_max_results: raw.social_max_results,
            },
            http_timeout: Duration::from_secs(raw.http_timeout_secs),
            credentials,
        })
    }
}

fn required(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn fraction(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{} is outside (0, 1]", value),
        })
    }
}

fn non_negative(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{} must be a non-negative number", value),
        })
    }
}

fn positive(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        })
    }
}

#[cfg(test)]
impl BotConfig {
    /// Configuration with the default risk profile and dummy credentials
    pub fn test_config() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframe: "15".to_string(),
            leverage: 10,
            testnet: true,
            risk: RiskParameters::default(),
            thresholds: SignalThresholds::default(),
            sentiment_interval: Duration::from_secs(300),
            account_interval: Duration::from_secs(60),
            feeds: FeedSettings::default(),
            http_timeout: Duration::from_secs(10),
            credentials: Credentials {
                bybit_api_key: "key".to_string(),
                bybit_api_secret: "secret".to_string(),
                news_api_key: "news".to_string(),
                twitter_bearer_token: "bearer".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> HashMap<String, String> {
        HashMap::from([
            ("SENTIBOT_BYBIT_API_KEY".to_string(), "key".to_string()),
            ("SENTIBOT_BYBIT_API_SECRET".to_string(), "secret".to_string()),
            ("SENTIBOT_NEWS_API_KEY".to_string(), "news".to_string()),
            ("SENTIBOT_TWITTER_BEARER_TOKEN".to_string(), "bearer".to_string()),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_map(credentials()).unwrap();

        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.timeframe, "15");
        assert!(config.testnet);
        assert_eq!(config.risk, RiskParameters::default());
        assert_eq!(config.thresholds, SignalThresholds::default());
        assert_eq!(config.sentiment_interval, Duration::from_secs(300));
        assert_eq!(config.account_interval, Duration::from_secs(60));
        assert_eq!(config.feeds, FeedSettings::default());
    }

    #[test]
    fn test_overrides_from_environment() {
        let mut vars = credentials();
        vars.insert("SENTIBOT_SYMBOL".to_string(), "ethusdt".to_string());
        vars.insert("SENTIBOT_MAX_RISK_PER_TRADE".to_string(), "0.02".to_string());
        vars.insert("SENTIBOT_BULLISH_THRESHOLD".to_string(), "0.25".to_string());
        vars.insert("SENTIBOT_SENTIMENT_INTERVAL_SECS".to_string(), "120".to_string());
        vars.insert("SENTIBOT_TESTNET".to_string(), "false".to_string());

        let config = BotConfig::from_map(vars).unwrap();

        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.risk.max_risk_per_trade, 0.02);
        assert_eq!(config.thresholds.bullish, 0.25);
        assert_eq!(config.thresholds.bearish, 0.15);
        assert_eq!(config.sentiment_interval, Duration::from_secs(120));
        assert!(!config.testnet);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut vars = credentials();
        vars.remove("SENTIBOT_NEWS_API_KEY");

        let result = BotConfig::from_map(vars);
        assert!(matches!(result, Err(ConfigError::Missing("news_api_key"))));
    }

    #[test]
    fn test_blank_credentials_rejected() {
        let mut vars = credentials();
        vars.insert("SENTIBOT_BYBIT_API_SECRET".to_string(), "  ".to_string());

        let result = BotConfig::from_map(vars);
        assert!(matches!(result, Err(ConfigError::Missing("bybit_api_secret"))));
    }

    #[test]
    fn test_risk_fraction_out_of_range_rejected() {
        let mut vars = credentials();
        vars.insert("SENTIBOT_MAX_POSITION_SIZE".to_string(), "1.5".to_string());

        let result = BotConfig::from_map(vars);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "max_position_size", .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut vars = credentials();
        vars.insert("SENTIBOT_ACCOUNT_INTERVAL_SECS".to_string(), "0".to_string());

        let result = BotConfig::from_map(vars);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "account_interval_secs", .. })
        ));
    }

    #[test]
    fn test_credentials_not_printed() {
        let config = BotConfig::test_config();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret"));
    }
}
