use crate::models::Direction;
use serde::{Deserialize, Serialize};

/// Relative slack when comparing a position value against its caps, so that
/// `quantity * price` recomputed from a sized quantity does not trip on rounding
const VALUE_TOLERANCE: f64 = 1e-9;

/// Risk limits, fixed at startup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskParameters {
    /// Fraction of balance that may be lost on one trade
    pub max_risk_per_trade: f64,
    /// Fraction of balance one position may occupy
    pub max_position_size: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_risk_per_trade: 0.05, // 5% of balance at risk
            max_position_size: 0.1,   // 10% of balance per position
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
        }
    }
}

/// Position sizing under a risk cap and a capital cap
#[derive(Debug, Clone, Copy)]
pub struct RiskSizer {
    params: RiskParameters,
}

impl RiskSizer {
    pub fn new(params: RiskParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    /// Size a position so that hitting the stop loses at most
    /// `max_risk_per_trade` of the balance, capped at `max_position_size`.
    ///
    /// Returns `(position_value, quantity)`. A stop equal to the entry price
    /// yields `(0.0, 0.0)`, which callers must treat as "no trade".
    pub fn size_position(
        &self,
        current_price: f64,
        balance: f64,
        stop_loss_price: f64,
    ) -> (f64, f64) {
        let risk_per_unit = (current_price - stop_loss_price).abs() / current_price;

        if risk_per_unit == 0.0 || !risk_per_unit.is_finite() {
            return (0.0, 0.0);
        }

        let max_risk_capital = balance * self.params.max_risk_per_trade;
        let value_by_risk = max_risk_capital / risk_per_unit;
        let value_by_cap = balance * self.params.max_position_size;

        let position_value = value_by_risk.min(value_by_cap);
        let quantity = position_value / current_price;

        (position_value, quantity)
    }

    /// Check a sized trade against both limits
    pub fn validate_trade(&self, quantity: f64, current_price: f64, balance: f64) -> bool {
        let position_value = quantity * current_price;

        let max_value = balance * self.params.max_position_size;
        if exceeds(position_value, max_value) {
            tracing::debug!(position_value, max_value, "Position value above size cap");
            return false;
        }

        // Both sides scale by the same fraction, so this only fires when the
        // position is larger than the balance.
        let potential_loss = position_value * self.params.max_risk_per_trade;
        let max_loss = balance * self.params.max_risk_per_trade;
        if exceeds(potential_loss, max_loss) {
            tracing::debug!(potential_loss, max_loss, "Potential loss above risk cap");
            return false;
        }

        true
    }

    /// Stop-loss and take-profit levels around an entry price
    pub fn stop_loss_take_profit(&self, entry_price: f64, direction: Direction) -> (f64, f64) {
        match direction {
            Direction::Long => (
                entry_price * (1.0 - self.params.stop_loss_pct),
                entry_price * (1.0 + self.params.take_profit_pct),
            ),
            Direction::Short => (
                entry_price * (1.0 + self.params.stop_loss_pct),
                entry_price * (1.0 - self.params.take_profit_pct),
            ),
        }
    }
}

fn exceeds(value: f64, limit: f64) -> bool {
    value > limit + limit.abs() * VALUE_TOLERANCE
}
