use super::engine::{Decision, DecisionAction, DecisionEngine};
use super::scheduler::{Scheduler, TaskRunner};
use crate::api::Exchange;
use crate::config::BotConfig;
use crate::models::{AccountState, OrderIntent, SentimentReading};
use crate::sentiment::SentimentAggregator;
use async_trait::async_trait;
use chrono::Utc;

/// The three periodic jobs, in the order they are registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotTask {
    RefreshSentiment,
    RefreshAccount,
    EvaluateDecision,
}

/// Owns the shared sentiment/account state and the collaborators.
///
/// Everything runs on the scheduler's loop, so state is mutated through
/// `&mut self` without locking.
pub struct TradingBot {
    symbol: String,
    exchange: Box<dyn Exchange>,
    aggregator: SentimentAggregator,
    engine: DecisionEngine,
    sentiment: SentimentReading,
    account: AccountState,
    dry_run: bool,
}

impl TradingBot {
    pub fn new(config: &BotConfig, exchange: Box<dyn Exchange>, aggregator: SentimentAggregator) -> Self {
        Self {
            symbol: config.symbol.clone(),
            exchange,
            aggregator,
            engine: DecisionEngine::from_config(config),
            sentiment: SentimentReading::neutral(),
            account: AccountState::default(),
            dry_run: false,
        }
    }

    /// Evaluate and log decisions without placing orders
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn sentiment(&self) -> &SentimentReading {
        &self.sentiment
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    /// Scheduler with the three bot tasks at their configured cadence
    pub fn scheduler(config: &BotConfig) -> Scheduler<BotTask> {
        let mut scheduler = Scheduler::new();
        scheduler.register(BotTask::RefreshSentiment, config.sentiment_interval);
        scheduler.register(BotTask::RefreshAccount, config.account_interval);
        scheduler.register(BotTask::EvaluateDecision, config.account_interval);
        scheduler
    }

    /// Refresh sentiment and account once so the first evaluation has data
    pub async fn warm_up(&mut self) {
        self.update_sentiment().await;
        self.update_account().await;
    }

    pub async fn update_sentiment(&mut self) {
        self.sentiment = self.aggregator.refresh().await;

        tracing::info!(
            label = %self.sentiment.label,
            score = self.sentiment.score,
            news_items = self.sentiment.news_count,
            social_items = self.sentiment.social_count,
            "Current sentiment: {} ({:.3})",
            self.sentiment.label,
            self.sentiment.score
        );
    }

    pub async fn update_account(&mut self) {
        let balance = match self.exchange.get_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!("Failed to fetch balance, treating as 0: {}", e);
                0.0
            }
        };

        let has_open_position = match self.exchange.get_positions(&self.symbol).await {
            Ok(positions) => positions.iter().any(|p| p.size > 0.0),
            Err(e) => {
                tracing::error!(
                    "Failed to fetch positions, keeping previous state ({}): {}",
                    self.account.has_open_position,
                    e
                );
                self.account.has_open_position
            }
        };

        self.account = AccountState::new(balance, has_open_position);

        tracing::info!(
            balance = self.account.balance,
            open_position = self.account.has_open_position,
            "Account balance: ${:.2}, open position: {}",
            self.account.balance,
            self.account.has_open_position
        );
    }

    /// Evaluate the current state and place an order if the engine produces one
    pub async fn execute_decision(&mut self) -> Decision {
        let current_price = match self.exchange.get_price(&self.symbol).await {
            Ok(price) => price,
            Err(e) => {
                tracing::error!("Failed to fetch {} price: {}", self.symbol, e);
                0.0
            }
        };

        let decision = self
            .engine
            .evaluate(&self.sentiment, &self.account, current_price);

        match &decision.action {
            DecisionAction::Hold => {
                tracing::debug!(reason = %decision.reason, "No trade");
            }
            DecisionAction::Monitor => {
                tracing::info!("Monitoring open position...");
            }
            DecisionAction::Reject(rejection) => {
                tracing::warn!(
                    reason = %rejection,
                    price = current_price,
                    "Trade rejected by risk manager: {}",
                    decision.reason
                );
            }
            DecisionAction::PlaceOrder(intent) => {
                tracing::info!(reason = %decision.reason, "Signal to enter trade");
                self.place(intent).await;
            }
        }

        decision
    }

    async fn place(&self, intent: &OrderIntent) {
        if self.dry_run {
            tracing::info!(
                symbol = %intent.symbol,
                side = %intent.side,
                quantity = intent.quantity,
                "[DRY RUN] Would place {} {:.6} {} @ ${:.2} (SL ${:.2}, TP ${:.2})",
                intent.side,
                intent.quantity,
                intent.symbol,
                intent.entry_price,
                intent.stop_loss_price,
                intent.take_profit_price
            );
            return;
        }

        match self.exchange.place_order(intent).await {
            Ok(result) => {
                tracing::info!(
                    order_id = %result.order_id,
                    symbol = %intent.symbol,
                    side = %intent.side,
                    "Order placed: {:.6} @ ${:.2}, stop loss ${:.2}, take profit ${:.2}",
                    intent.quantity,
                    intent.entry_price,
                    intent.stop_loss_price,
                    intent.take_profit_price
                );
            }
            Err(e) => {
                tracing::error!(symbol = %intent.symbol, "Failed to place order: {}", e);
            }
        }
    }
}

#[async_trait]
impl TaskRunner<BotTask> for TradingBot {
    async fn run_task(&mut self, action: BotTask) -> crate::Result<()> {
        tracing::debug!(task = ?action, at = %Utc::now().format("%H:%M:%S"), "Tick");

        match action {
            BotTask::RefreshSentiment => self.update_sentiment().await,
            BotTask::RefreshAccount => self.update_account().await,
            BotTask::EvaluateDecision => {
                self.execute_decision().await;
            }
        }

        Ok(())
    }
}
