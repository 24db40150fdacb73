//! Financial Modeling Prep API client

use super::{Endpoint, FetchOutcome, FetchSet};
use crate::config::LensConfig;
use crate::error::Result;
use crate::ticker::Ticker;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// The exchange whose sector P/E table is used as the comparison benchmark
const SECTOR_PE_EXCHANGE: &str = "NYSE";

/// Financial Modeling Prep API client
///
/// One instance per pipeline; holds the HTTP client (with the fetch timeout
/// baked in), the API key, and a shared rate limiter so concurrent fetches
/// stay inside the upstream per-minute quota.
#[derive(Debug, Clone)]
pub struct FmpClient {
    client: Client,
    api_key: String,
    api_base: String,
    rate_limiter: SharedRateLimiter,
    max_concurrent: usize,
}

impl FmpClient {
    /// Create a new client from pipeline configuration
    pub fn new(config: &LensConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.fetch_timeout).build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            api_key: config.fmp_api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            rate_limiter,
            max_concurrent: config.max_concurrent_fetches,
        })
    }

    /// Fetch one endpoint and classify the result
    ///
    /// Never returns an error: timeouts and transport failures become
    /// `FetchOutcome::NetworkError`, so one endpoint's failure cannot abort
    /// collection of the others.
    #[instrument(skip(self), fields(endpoint = endpoint.label(), %ticker))]
    pub async fn fetch(&self, endpoint: Endpoint, ticker: &Ticker) -> FetchOutcome {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.api_base, endpoint.path(ticker));
        let mut params: Vec<(&str, String)> = match endpoint {
            Endpoint::Income | Endpoint::BalanceSheet | Endpoint::CashFlow => {
                vec![("limit", "1".to_string())]
            }
            Endpoint::Score => vec![("symbol", ticker.to_string())],
            Endpoint::SectorPe => vec![
                ("date", Utc::now().format("%Y-%m-%d").to_string()),
                ("exchange", SECTOR_PE_EXCHANGE.to_string()),
            ],
            _ => Vec::new(),
        };
        params.push(("apikey", self.api_key.clone()));

        let response = match self.client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("request failed: {e}");
                return FetchOutcome::NetworkError(e.to_string());
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("upstream error: HTTP {status}");
            return FetchOutcome::UpstreamError {
                status: status.as_u16(),
                body,
            };
        }

        match response.json::<Value>().await {
            Ok(payload) => classify_payload(payload),
            Err(e) => FetchOutcome::NetworkError(e.to_string()),
        }
    }

    /// Fetch a set of endpoints concurrently, bounded by the configured
    /// connection limit
    ///
    /// Every endpoint is attempted; each outcome lands in its own slot of the
    /// returned set regardless of how the others fared.
    pub async fn fetch_all(&self, ticker: &Ticker, endpoints: &[Endpoint]) -> FetchSet {
        let mut set = FetchSet::new(ticker.clone());

        let mut outcomes = stream::iter(endpoints.iter().copied())
            .map(|endpoint| async move { (endpoint, self.fetch(endpoint, ticker).await) })
            .buffer_unordered(self.max_concurrent);

        while let Some((endpoint, outcome)) = outcomes.next().await {
            debug!(
                endpoint = endpoint.label(),
                success = outcome.is_success(),
                "fetch complete"
            );
            set.record(endpoint, outcome);
        }

        set
    }
}

/// Classify a 200-status payload
///
/// FMP signals "no data for this ticker" with an empty array, an empty
/// object, or an "Error Message" field rather than an HTTP error; all three
/// classify as `NotFound`.
fn classify_payload(payload: Value) -> FetchOutcome {
    let absent = match &payload {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty() || map.contains_key("Error Message"),
        _ => false,
    };

    if absent {
        FetchOutcome::NotFound
    } else {
        FetchOutcome::Success(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> LensConfig {
        LensConfig::builder()
            .fmp_api_key("test_key")
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = FmpClient::new(&test_config()).unwrap();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.api_base, "https://financialmodelingprep.com/api");
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let config = LensConfig::builder()
            .fmp_api_key("test_key")
            .api_base("http://localhost:9000/api/")
            .build()
            .unwrap();

        let client = FmpClient::new(&config).unwrap();
        assert_eq!(client.api_base, "http://localhost:9000/api");
    }

    #[test]
    fn test_classify_empty_array_is_not_found() {
        assert!(matches!(classify_payload(json!([])), FetchOutcome::NotFound));
    }

    #[test]
    fn test_classify_error_message_is_not_found() {
        let payload = json!({"Error Message": "Invalid API KEY."});
        assert!(matches!(classify_payload(payload), FetchOutcome::NotFound));
    }

    #[test]
    fn test_classify_data_is_success() {
        let payload = json!([{"symbol": "AAPL", "price": 189.5}]);
        assert!(classify_payload(payload).is_success());
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_fetch_profile() {
        let config = LensConfig::from_env().unwrap();
        let client = FmpClient::new(&config).unwrap();
        let ticker = Ticker::parse("AAPL").unwrap();

        let outcome = client.fetch(Endpoint::Profile, &ticker).await;
        assert!(outcome.is_success());
    }
}
