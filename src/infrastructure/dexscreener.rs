use crate::domain::ports::StatusProvider;
use crate::domain::tracking::{NOT_PAID_STATUS, TokenSnapshot, UNKNOWN_SYMBOL};
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com";
const CHAIN: &str = "solana";

/// Retry and timeout settings for the status API.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub request_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    status: String,
    #[serde(default)]
    payment_timestamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrdersResponse {
    Orders(Vec<OrderRecord>),
    Other(serde_json::Value),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairRecord {
    #[serde(default)]
    base_token: Option<BaseToken>,
    #[serde(default)]
    info: Option<PairInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct BaseToken {
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PairInfo {
    #[serde(default)]
    header: Option<String>,
}

/// Order status and pair metadata from the DexScreener public API.
///
/// Status comes from `/orders/v1/solana/{address}`, symbol and header image
/// from `/token-pairs/v1/solana/{address}`.
#[derive(Clone)]
pub struct DexScreenerProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl DexScreenerProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    fn orders_url(&self, address: &str) -> String {
        format!(
            "{}/orders/v1/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            CHAIN,
            address
        )
    }

    fn pairs_url(&self, address: &str) -> String {
        format!(
            "{}/token-pairs/v1/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            CHAIN,
            address
        )
    }

    async fn fetch_order(&self, address: &str) -> Result<(String, i64)> {
        let response = self.client.get(self.orders_url(address)).send().await?;
        if !response.status().is_success() {
            return Err(TrackerError::FetchError(format!(
                "orders lookup returned HTTP {}",
                response.status()
            )));
        }
        match response.json::<OrdersResponse>().await? {
            OrdersResponse::Orders(orders) => match orders.into_iter().next() {
                Some(order) => {
                    let ts = order.payment_timestamp.unwrap_or(0.0) as i64;
                    Ok((order.status, ts))
                }
                None => Ok((NOT_PAID_STATUS.to_string(), 0)),
            },
            OrdersResponse::Other(_) => Ok((NOT_PAID_STATUS.to_string(), 0)),
        }
    }

    async fn fetch_pairs(&self, address: &str) -> Result<Vec<PairRecord>> {
        let response = self.client.get(self.pairs_url(address)).send().await?;
        if !response.status().is_success() {
            return Err(TrackerError::FetchError(format!(
                "pairs lookup returned HTTP {}",
                response.status()
            )));
        }
        Ok(response.json::<Vec<PairRecord>>().await?)
    }

    async fn fetch_symbol(&self, address: &str) -> String {
        match self.fetch_pairs(address).await {
            Ok(pairs) => pairs
                .into_iter()
                .next()
                .and_then(|pair| pair.base_token)
                .and_then(|token| token.symbol)
                .filter(|symbol| !symbol.is_empty())
                .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
            Err(e) => {
                tracing::debug!(address, error = %e, "pairs lookup failed, symbol unknown");
                UNKNOWN_SYMBOL.to_string()
            }
        }
    }

    async fn fetch_once(&self, address: &str) -> Result<TokenSnapshot> {
        let (status, payment_timestamp) = self.fetch_order(address).await?;
        let symbol = self.fetch_symbol(address).await;
        Ok(TokenSnapshot {
            status,
            payment_timestamp,
            symbol,
        })
    }
}

#[async_trait]
impl StatusProvider for DexScreenerProvider {
    async fn fetch_status(&self, address: &str) -> Result<TokenSnapshot> {
        let attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(address).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if attempt < attempts => {
                    tracing::warn!(address, attempt, error = %e, "status lookup failed, retrying");
                    tokio::time::sleep(self.settings.retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(address, attempt, error = %e, "status lookup failed");
                    return Err(TrackerError::FetchError(e.to_string()));
                }
            }
        }
    }

    async fn fetch_image(&self, address: &str) -> Option<String> {
        match self.fetch_pairs(address).await {
            Ok(pairs) => pairs
                .into_iter()
                .filter_map(|pair| pair.info.and_then(|info| info.header))
                .find(|header| !header.is_empty()),
            Err(e) => {
                tracing::debug!(address, error = %e, "header lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn provider(base_url: String) -> DexScreenerProvider {
        DexScreenerProvider::new(ProviderSettings {
            base_url,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_status_and_symbol() {
        let mut server = mockito::Server::new_async().await;
        let _orders = server
            .mock("GET", format!("/orders/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body(r#"[{"type":"tokenProfile","status":"processing","paymentTimestamp":1700000000000}]"#)
            .create_async()
            .await;
        let _pairs = server
            .mock("GET", format!("/token-pairs/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body(r#"[{"baseToken":{"symbol":"USDC"},"info":{"header":"https://img/h.png"}}]"#)
            .create_async()
            .await;

        let snapshot = provider(server.url()).fetch_status(ADDR).await.unwrap();
        assert_eq!(snapshot, TokenSnapshot::new("processing", 1_700_000_000_000, "USDC"));
    }

    #[tokio::test]
    async fn test_empty_orders_means_not_paid() {
        let mut server = mockito::Server::new_async().await;
        let _orders = server
            .mock("GET", format!("/orders/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _pairs = server
            .mock("GET", format!("/token-pairs/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let snapshot = provider(server.url()).fetch_status(ADDR).await.unwrap();
        assert_eq!(snapshot, TokenSnapshot::new(NOT_PAID_STATUS, 0, UNKNOWN_SYMBOL));
    }

    #[tokio::test]
    async fn test_pairs_failure_degrades_symbol() {
        let mut server = mockito::Server::new_async().await;
        let _orders = server
            .mock("GET", format!("/orders/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body(r#"[{"status":"approved"}]"#)
            .create_async()
            .await;
        let _pairs = server
            .mock("GET", format!("/token-pairs/v1/solana/{}", ADDR).as_str())
            .with_status(500)
            .create_async()
            .await;

        let snapshot = provider(server.url()).fetch_status(ADDR).await.unwrap();
        assert_eq!(snapshot.status, "approved");
        assert_eq!(snapshot.payment_timestamp, 0);
        assert_eq!(snapshot.symbol, UNKNOWN_SYMBOL);
    }

    #[tokio::test]
    async fn test_primary_failure_is_retried_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let orders = server
            .mock("GET", format!("/orders/v1/solana/{}", ADDR).as_str())
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let result = provider(server.url()).fetch_status(ADDR).await;
        assert!(matches!(result, Err(TrackerError::FetchError(_))));
        orders.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_image_picks_first_header() {
        let mut server = mockito::Server::new_async().await;
        let _pairs = server
            .mock("GET", format!("/token-pairs/v1/solana/{}", ADDR).as_str())
            .with_status(200)
            .with_body(
                r#"[{"baseToken":{"symbol":"X"}},{"info":{"header":""}},{"info":{"header":"https://img/2.png"}}]"#,
            )
            .create_async()
            .await;

        let image = provider(server.url()).fetch_image(ADDR).await;
        assert_eq!(image.as_deref(), Some("https://img/2.png"));
    }

    #[tokio::test]
    async fn test_fetch_image_failure_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _pairs = server
            .mock("GET", format!("/token-pairs/v1/solana/{}", ADDR).as_str())
            .with_status(404)
            .create_async()
            .await;

        assert!(provider(server.url()).fetch_image(ADDR).await.is_none());
    }
}
