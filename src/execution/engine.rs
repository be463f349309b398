use crate::config::{BotConfig, SignalThresholds};
use crate::models::{AccountState, Direction, OrderIntent, SentimentReading};
use crate::risk::{RiskParameters, RiskSizer};
use std::fmt;

/// Steps an evaluation passes through within one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionState {
    Idle,
    Monitoring,
    SignalDetected(Direction),
    Sizing,
    OrderReady,
    Rejected,
}

/// Why a detected signal did not become an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    NoPrice,
    DegenerateStop,
    RiskLimits,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NoPrice => f.write_str("no valid price"),
            RejectionReason::DegenerateStop => f.write_str("degenerate stop"),
            RejectionReason::RiskLimits => f.write_str("risk limits"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionAction {
    /// Nothing to do this tick
    Hold,
    /// A position is open; observe only
    Monitor,
    PlaceOrder(OrderIntent),
    Reject(RejectionReason),
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub action: DecisionAction,
    pub reason: String,
    /// States visited during this evaluation, starting at `Idle`
    pub trail: Vec<DecisionState>,
}

impl Decision {
    pub fn final_state(&self) -> DecisionState {
        self.trail.last().copied().unwrap_or(DecisionState::Idle)
    }

    pub fn order(&self) -> Option<&OrderIntent> {
        match &self.action {
            DecisionAction::PlaceOrder(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Turns sentiment and account state into an order intent or a reason not to trade.
///
/// Holds no state between evaluations; every call starts from `Idle`.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    symbol: String,
    sizer: RiskSizer,
    thresholds: SignalThresholds,
}

impl DecisionEngine {
    pub fn new(symbol: impl Into<String>, risk: RiskParameters, thresholds: SignalThresholds) -> Self {
        Self {
            symbol: symbol.into(),
            sizer: RiskSizer::new(risk),
            thresholds,
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.symbol.clone(), config.risk, config.thresholds)
    }

    pub fn sizer(&self) -> &RiskSizer {
        &self.sizer
    }

    /// Direction implied by a sentiment score, if it clears a threshold
    pub fn signal_direction(&self, score: f64) -> Option<Direction> {
        if score > self.thresholds.bullish {
            Some(Direction::Long)
        } else if score < -self.thresholds.bearish {
            Some(Direction::Short)
        } else {
            None
        }
    }

    pub fn evaluate(
        &self,
        sentiment: &SentimentReading,
        account: &AccountState,
        current_price: f64,
    ) -> Decision {
        let mut trail = vec![DecisionState::Idle];

        // Check 1: an open position is only watched
        if account.has_open_position {
            trail.push(DecisionState::Monitoring);
            return Decision {
                action: DecisionAction::Monitor,
                reason: "Position already open".to_string(),
                trail,
            };
        }

        // Check 2: nothing to size against
        if account.balance <= 0.0 {
            return Decision {
                action: DecisionAction::Hold,
                reason: "No balance available".to_string(),
                trail,
            };
        }

        // Check 3: sentiment must clear the entry threshold
        let Some(direction) = self.signal_direction(sentiment.score) else {
            return Decision {
                action: DecisionAction::Hold,
                reason: format!("Neutral sentiment ({:.3})", sentiment.score),
                trail,
            };
        };
        trail.push(DecisionState::SignalDetected(direction));

        if !(current_price.is_finite() && current_price > 0.0) {
            return self.reject(trail, RejectionReason::NoPrice, direction);
        }

        trail.push(DecisionState::Sizing);
        let (stop_loss, take_profit) = self.sizer.stop_loss_take_profit(current_price, direction);
        let (position_value, quantity) =
            self.sizer
                .size_position(current_price, account.balance, stop_loss);

        if quantity <= 0.0 {
            return self.reject(trail, RejectionReason::DegenerateStop, direction);
        }

        if !self
            .sizer
            .validate_trade(quantity, current_price, account.balance)
        {
            return self.reject(trail, RejectionReason::RiskLimits, direction);
        }

        trail.push(DecisionState::OrderReady);
        Decision {
            action: DecisionAction::PlaceOrder(OrderIntent {
                symbol: self.symbol.clone(),
                side: direction.side(),
                quantity,
                entry_price: current_price,
                stop_loss_price: stop_loss,
                take_profit_price: take_profit,
            }),
            reason: format!(
                "{} signal at sentiment {:.3}, position value ${:.2}",
                direction, sentiment.score, position_value
            ),
            trail,
        }
    }

    fn reject(
        &self,
        mut trail: Vec<DecisionState>,
        reason: RejectionReason,
        direction: Direction,
    ) -> Decision {
        trail.push(DecisionState::Rejected);
        Decision {
            action: DecisionAction::Reject(reason),
            reason: format!("{} trade rejected: {}", direction, reason),
            trail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentLabel, Side};
    use crate::sentiment::classify;

    fn engine() -> DecisionEngine {
        DecisionEngine::new("BTCUSDT", RiskParameters::default(), SignalThresholds::default())
    }

    fn sentiment(score: f64) -> SentimentReading {
        SentimentReading {
            score,
            label: classify(score),
            ..SentimentReading::neutral()
        }
    }

    #[test]
    fn test_long_order_when_bullish() {
        let decision = engine().evaluate(&sentiment(0.4), &AccountState::new(1000.0, false), 100.0);

        let intent = decision.order().expect("order expected");
        assert_eq!(intent.symbol, "BTCUSDT");
        assert_eq!(intent.side, Side::Buy);
        assert!((intent.quantity - 1.0).abs() < 1e-9);
        assert!((intent.stop_loss_price - 98.0).abs() < 1e-9);
        assert!((intent.take_profit_price - 104.0).abs() < 1e-9);
        assert_eq!(
            decision.trail,
            vec![
                DecisionState::Idle,
                DecisionState::SignalDetected(Direction::Long),
                DecisionState::Sizing,
                DecisionState::OrderReady,
            ]
        );
    }

    #[test]
    fn test_short_order_when_bearish() {
        let decision =
            engine().evaluate(&sentiment(-0.4), &AccountState::new(1000.0, false), 100.0);

        let intent = decision.order().expect("order expected");
        assert_eq!(intent.side, Side::Sell);
        assert!((intent.stop_loss_price - 102.0).abs() < 1e-9);
        assert!((intent.take_profit_price - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_position_never_orders() {
        for score in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            let decision =
                engine().evaluate(&sentiment(score), &AccountState::new(1000.0, true), 100.0);

            assert_eq!(decision.action, DecisionAction::Monitor);
            assert_eq!(decision.final_state(), DecisionState::Monitoring);
            assert!(decision.order().is_none());
        }
    }

    #[test]
    fn test_zero_balance_holds() {
        let decision = engine().evaluate(&sentiment(0.9), &AccountState::new(0.0, false), 100.0);

        assert_eq!(decision.action, DecisionAction::Hold);
        assert!(decision.reason.contains("No balance"));
        assert_eq!(decision.trail, vec![DecisionState::Idle]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let account = AccountState::new(1000.0, false);

        for score in [0.15, -0.15, 0.1, 0.0] {
            let decision = engine().evaluate(&sentiment(score), &account, 100.0);
            assert_eq!(decision.action, DecisionAction::Hold, "score {}", score);
            assert!(decision.reason.contains("Neutral"));
        }

        let decision = engine().evaluate(&sentiment(0.1500001), &account, 100.0);
        assert!(decision.order().is_some());
    }

    #[test]
    fn test_missing_price_rejected() {
        let account = AccountState::new(1000.0, false);

        for price in [0.0, -1.0, f64::NAN] {
            let decision = engine().evaluate(&sentiment(0.5), &account, price);
            assert_eq!(
                decision.action,
                DecisionAction::Reject(RejectionReason::NoPrice)
            );
            assert_eq!(decision.final_state(), DecisionState::Rejected);
        }
    }

    #[test]
    fn test_zero_stop_distance_rejected() {
        let params = RiskParameters {
            stop_loss_pct: 0.0,
            ..Default::default()
        };
        let engine = DecisionEngine::new("BTCUSDT", params, SignalThresholds::default());

        let decision = engine.evaluate(&sentiment(0.5), &AccountState::new(1000.0, false), 100.0);

        assert_eq!(
            decision.action,
            DecisionAction::Reject(RejectionReason::DegenerateStop)
        );
        assert!(decision.reason.contains("degenerate stop"));
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SignalThresholds {
            bullish: 0.5,
            bearish: 0.05,
        };
        let engine = DecisionEngine::new("BTCUSDT", RiskParameters::default(), thresholds);

        assert_eq!(engine.signal_direction(0.4), None);
        assert_eq!(engine.signal_direction(0.6), Some(Direction::Long));
        assert_eq!(engine.signal_direction(-0.06), Some(Direction::Short));
    }

    #[test]
    fn test_label_does_not_drive_decision() {
        // Score 0.12 is labeled bullish but sits below the entry threshold
        let reading = sentiment(0.12);
        assert_eq!(reading.label, SentimentLabel::Bullish);

        let decision = engine().evaluate(&reading, &AccountState::new(1000.0, false), 100.0);
        assert_eq!(decision.action, DecisionAction::Hold);
    }
}
