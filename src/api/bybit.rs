use super::Exchange;
use crate::config::BotConfig;
use crate::error::ServiceError;
use crate::models::{OrderIntent, OrderResult, PositionInfo, Side};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Bybit v5 unified trading API
// Docs: https://bybit-exchange.github.io/docs/v5/intro
const BYBIT_MAINNET: &str = "https://api.bybit.com";
const BYBIT_TESTNET: &str = "https://api-testnet.bybit.com";
const RECV_WINDOW: &str = "5000";
const CATEGORY: &str = "linear";
const SETTLE_COIN: &str = "USDT";
/// "leverage not modified" is not a failure
const LEVERAGE_UNCHANGED: i64 = 110043;
/// Decimal places sent for quantities and prices
const ORDER_DECIMALS: usize = 6;

type HmacSha256 = Hmac<Sha256>;

/// Client for the Bybit v5 REST API (USDT perpetuals)
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResult<T> {
    #[serde(default)]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WalletAccount {
    #[serde(default)]
    coin: Vec<CoinBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinBalance {
    coin: String,
    #[serde(default)]
    wallet_balance: String,
    #[serde(default)]
    available_to_withdraw: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    last_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    symbol: String,
    size: Option<String>,
    #[serde(default)]
    side: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest<'a> {
    category: &'a str,
    symbol: &'a str,
    side: &'a str,
    order_type: &'a str,
    qty: String,
    stop_loss: String,
    take_profit: String,
    time_in_force: &'a str,
    reduce_only: bool,
    close_on_trigger: bool,
    order_link_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderResult {
    order_id: Option<String>,
    #[serde(default)]
    order_link_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetLeverageRequest<'a> {
    category: &'a str,
    symbol: &'a str,
    buy_leverage: String,
    sell_leverage: String,
}

impl BybitClient {
    pub fn new(config: &BotConfig) -> Result<Self, ServiceError> {
        let base_url = if config.testnet {
            BYBIT_TESTNET
        } else {
            BYBIT_MAINNET
        };

        Self::with_base_url(
            base_url,
            &config.credentials.bybit_api_key,
            &config.credentials.bybit_api_secret,
            config.http_timeout,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        api_secret: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    /// Set the same leverage for both sides of `symbol`
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ServiceError> {
        let request = SetLeverageRequest {
            category: CATEGORY,
            symbol,
            buy_leverage: leverage.to_string(),
            sell_leverage: leverage.to_string(),
        };

        match self
            .post::<serde_json::Value, _>("/v5/position/set-leverage", &request)
            .await
        {
            Ok(_) => {
                tracing::info!(symbol, leverage, "Leverage set");
                Ok(())
            }
            Err(ServiceError::Api { code, .. }) if code == LEVERAGE_UNCHANGED => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn sign(&self, timestamp: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(timestamp.as_bytes());
        mac.update(self.api_key.as_bytes());
        mac.update(RECV_WINDOW.as_bytes());
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn timestamp_ms() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let query_string = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let timestamp = Self::timestamp_ms();
        let signature = self.sign(&timestamp, &query_string);

        let url = format!("{}{}?{}", self.base_url, path, query_string);
        let response = self
            .client
            .get(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", &timestamp)
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("X-BAPI-SIGN", signature)
            .send()
            .await?;

        Self::unwrap_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let payload = serde_json::to_string(body)
            .map_err(|e| ServiceError::parse("request body", e.to_string()))?;
        let timestamp = Self::timestamp_ms();
        let signature = self.sign(&timestamp, &payload);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", &timestamp)
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("X-BAPI-SIGN", signature)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;

        Self::unwrap_response(response).await
    }

    /// Check HTTP status and `retCode`, then return `result`
    async fn unwrap_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: ApiResponse<T> = response.json().await?;
        if body.ret_code != 0 {
            return Err(ServiceError::Api {
                code: body.ret_code,
                message: body.ret_msg,
            });
        }

        body.result.ok_or(ServiceError::MissingField("result"))
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ServiceError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ServiceError::parse(field, value))
}

/// Fixed-point rendering without trailing zeros, as the API expects strings
fn format_decimal(value: f64) -> String {
    let formatted = format!("{:.*}", ORDER_DECIMALS, value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[async_trait]
impl Exchange for BybitClient {
    async fn get_balance(&self) -> Result<f64, ServiceError> {
        let result: ListResult<WalletAccount> = self
            .get(
                "/v5/account/wallet-balance",
                &[("accountType", "UNIFIED"), ("coin", SETTLE_COIN)],
            )
            .await?;

        let coin = result
            .list
            .iter()
            .flat_map(|account| account.coin.iter())
            .find(|c| c.coin == SETTLE_COIN)
            .ok_or(ServiceError::MissingField("coin"))?;

        // Unified accounts may leave availableToWithdraw empty
        if coin.available_to_withdraw.trim().is_empty() {
            parse_number("walletBalance", &coin.wallet_balance)
        } else {
            parse_number("availableToWithdraw", &coin.available_to_withdraw)
        }
    }

    async fn get_price(&self, symbol: &str) -> Result<f64, ServiceError> {
        let result: ListResult<Ticker> = self
            .get(
                "/v5/market/tickers",
                &[("category", CATEGORY), ("symbol", symbol)],
            )
            .await?;

        let last_price = result
            .list
            .into_iter()
            .next()
            .and_then(|t| t.last_price)
            .ok_or(ServiceError::MissingField("lastPrice"))?;

        parse_number("lastPrice", &last_price)
    }

    async fn get_positions(&self, symbol: &str) -> Result<Vec<PositionInfo>, ServiceError> {
        let result: ListResult<RawPosition> = self
            .get(
                "/v5/position/list",
                &[("category", CATEGORY), ("symbol", symbol)],
            )
            .await?;

        result
            .list
            .into_iter()
            .map(|p| -> Result<PositionInfo, ServiceError> {
                let size = p.size.ok_or(ServiceError::MissingField("size"))?;
                Ok(PositionInfo {
                    symbol: p.symbol,
                    size: parse_number("size", &size)?,
                    side: match p.side.as_str() {
                        "Buy" => Some(Side::Buy),
                        "Sell" => Some(Side::Sell),
                        _ => None,
                    },
                })
            })
            .collect()
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, ServiceError> {
        let request = CreateOrderRequest {
            category: CATEGORY,
            symbol: &intent.symbol,
            side: intent.side.as_str(),
            order_type: "Market",
            qty: format_decimal(intent.quantity),
            stop_loss: format_decimal(intent.stop_loss_price),
            take_profit: format_decimal(intent.take_profit_price),
            time_in_force: "GTC",
            reduce_only: false,
            close_on_trigger: false,
            order_link_id: uuid::Uuid::new_v4().simple().to_string(),
        };

        tracing::debug!(?request, "Submitting order");

        let result: CreateOrderResult = self.post("/v5/order/create", &request).await?;

        Ok(OrderResult {
            order_id: result.order_id.ok_or(ServiceError::MissingField("orderId"))?,
            order_link_id: result.order_link_id,
        })
    }
}
