use clap::Parser;
use sentibot::api::{BybitClient, NewsApiClient, TwitterClient};
use sentibot::execution::TradingBot;
use sentibot::sentiment::SentimentAggregator;
use sentibot::BotConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sentibot=info";

/// Sentiment-driven trading bot
#[derive(Debug, Parser)]
#[command(name = "sentibot", version)]
struct Cli {
    /// Evaluate and log orders without sending them to the exchange
    #[arg(long)]
    dry_run: bool,

    /// Log filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_filter.as_deref());

    tracing::info!("🚀 Sentibot starting");

    let config = BotConfig::from_env()?;
    log_configuration(&config, cli.dry_run);

    let exchange = BybitClient::new(&config)?;
    if !cli.dry_run {
        if let Err(e) = exchange.set_leverage(&config.symbol, config.leverage).await {
            tracing::warn!("Could not set leverage to {}x: {}", config.leverage, e);
        }
    }
    let news = NewsApiClient::new(&config)?;
    let social = TwitterClient::new(&config)?;
    let aggregator =
        SentimentAggregator::new(Box::new(news), Box::new(social), config.feeds.clone());

    let mut bot = TradingBot::new(&config, Box::new(exchange), aggregator).with_dry_run(cli.dry_run);
    let mut scheduler = TradingBot::scheduler(&config);

    // Initial updates so the first evaluation has data
    bot.warm_up().await;

    tracing::info!("\nPress Ctrl+C to stop...\n");

    scheduler
        .run(&mut bot, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("👋 Sentibot stopped by user");
    Ok(())
}

fn setup_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_configuration(config: &BotConfig, dry_run: bool) {
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {} (timeframe {})", config.symbol, config.timeframe);
    tracing::info!("  Exchange: {}", if config.testnet { "testnet" } else { "MAINNET" });
    tracing::info!("  Max Risk Per Trade: {}%", config.risk.max_risk_per_trade * 100.0);
    tracing::info!("  Max Position Size: {}%", config.risk.max_position_size * 100.0);
    tracing::info!(
        "  Stop Loss / Take Profit: {}% / {}%",
        config.risk.stop_loss_pct * 100.0,
        config.risk.take_profit_pct * 100.0
    );
    tracing::info!(
        "  Entry Thresholds: > {} long, < -{} short",
        config.thresholds.bullish,
        config.thresholds.bearish
    );
    tracing::info!(
        "  Sentiment every {:?}, account + decision every {:?}",
        config.sentiment_interval,
        config.account_interval
    );
    if dry_run {
        tracing::warn!("  DRY RUN: orders will be logged, not placed");
    }
}
