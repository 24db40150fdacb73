//! Analysis engine - one request end to end
//!
//! Orchestrates the pipeline for a single "analyze this ticker" request:
//! parse the symbol, resolve the identity endpoint, fan out the remaining
//! fetches concurrently, assemble the snapshot, and ask the completion
//! service for a narrative. The narrative call is strictly sequential after
//! assembly (its prompt depends on the complete snapshot) and its failure
//! degrades the result to numbers-only instead of failing the request.

use crate::api::{Endpoint, FmpClient};
use crate::config::LensConfig;
use crate::error::{LensError, Result};
use crate::normalize;
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::snapshot::{self, StockSnapshot};
use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stocklens_llm::{CompletionRequest, LlmProvider, Message};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of one analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Identifier of the request that produced this result
    pub request_id: Uuid,
    /// The assembled numeric snapshot
    pub snapshot: StockSnapshot,
    /// Narrative text, when the completion call succeeded
    pub narrative: Option<String>,
    /// Warning describing why the narrative is missing, when it failed
    pub narrative_error: Option<String>,
}

/// Pipeline orchestrator for single-ticker analysis requests
pub struct AnalysisEngine {
    config: Arc<LensConfig>,
    client: FmpClient,
    provider: Arc<dyn LlmProvider>,
    prompt_builder: PromptBuilder,
}

impl AnalysisEngine {
    /// Create a new engine from validated configuration and a completion
    /// provider
    pub fn new(config: Arc<LensConfig>, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        config.validate()?;
        let client = FmpClient::new(&config)?;
        let prompt_builder = PromptBuilder::new(config.prompt_char_budget);

        Ok(Self {
            config,
            client,
            provider,
            prompt_builder,
        })
    }

    /// Run one full analysis request
    #[instrument(skip(self))]
    pub async fn analyze(&self, symbol: &str) -> Result<Analysis> {
        let ticker = Ticker::parse(symbol)?;
        let request_id = Uuid::new_v4();
        info!(%ticker, %request_id, "starting analysis");

        // Identity first: every other series is pointless for an unknown
        // ticker, so nothing else is queried until the profile resolves.
        let profile_outcome = self.client.fetch(Endpoint::Profile, &ticker).await;
        if !normalize::normalize_profile(&profile_outcome).is_resolved() {
            return Err(LensError::TickerNotFound(ticker.to_string()));
        }

        let remaining: Vec<Endpoint> = Endpoint::all()
            .into_iter()
            .filter(|endpoint| *endpoint != Endpoint::Profile)
            .collect();
        let mut fetches = self.client.fetch_all(&ticker, &remaining).await;
        fetches.record(Endpoint::Profile, profile_outcome);

        let snapshot = snapshot::assemble(&fetches)?;
        if !snapshot.is_complete() {
            warn!(
                %ticker,
                degraded = snapshot.degraded.len(),
                "snapshot assembled with partial data"
            );
        }

        let (narrative, narrative_error) = self.narrative_for(&snapshot).await;

        Ok(Analysis {
            request_id,
            snapshot,
            narrative,
            narrative_error,
        })
    }

    /// Request the narrative for an assembled snapshot
    ///
    /// A completion failure is captured as a warning string; the caller's
    /// numeric snapshot is never withheld because this step failed.
    pub async fn narrative_for(&self, snapshot: &StockSnapshot) -> (Option<String>, Option<String>) {
        let prompt = self.prompt_builder.build(snapshot);

        let request = CompletionRequest::builder(&self.config.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_completion_tokens)
            .temperature(self.config.temperature)
            .build();

        match self.provider.complete(request).await {
            Ok(response) => (Some(response.content), None),
            Err(err) => {
                warn!("narrative generation failed: {err}");
                (None, Some(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchOutcome, FetchSet};
    use mockall::mock;
    use serde_json::json;
    use stocklens_llm::{CompletionResponse, TokenUsage};

    mock! {
        Provider {}

        #[async_trait::async_trait]
        impl LlmProvider for Provider {
            async fn complete(
                &self,
                request: CompletionRequest,
            ) -> stocklens_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    fn test_config() -> Arc<LensConfig> {
        Arc::new(
            LensConfig::builder()
                .fmp_api_key("test_key")
                .build()
                .unwrap(),
        )
    }

    fn test_snapshot() -> StockSnapshot {
        let ticker = Ticker::parse("AAPL").unwrap();
        let mut set = FetchSet::new(ticker);
        set.record(
            Endpoint::Profile,
            FetchOutcome::Success(json!([{"companyName": "Apple Inc.", "price": 189.5}])),
        );
        snapshot::assemble(&set).unwrap()
    }

    #[tokio::test]
    async fn test_narrative_success() {
        let mut provider = MockProvider::new();
        provider.expect_complete().returning(|request| {
            assert_eq!(request.system.as_deref(), Some(SYSTEM_PROMPT));
            Ok(CompletionResponse {
                content: "A measured assessment.".to_string(),
                usage: TokenUsage::default(),
            })
        });

        let engine = AnalysisEngine::new(test_config(), Arc::new(provider)).unwrap();
        let (narrative, warning) = engine.narrative_for(&test_snapshot()).await;

        assert_eq!(narrative.as_deref(), Some("A measured assessment."));
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn test_narrative_failure_is_warning_not_error() {
        let mut provider = MockProvider::new();
        provider.expect_complete().returning(|_| {
            Err(stocklens_llm::LlmError::RateLimitExceeded(
                "quota exhausted".to_string(),
            ))
        });

        let engine = AnalysisEngine::new(test_config(), Arc::new(provider)).unwrap();
        let (narrative, warning) = engine.narrative_for(&test_snapshot()).await;

        assert!(narrative.is_none());
        assert!(warning.unwrap().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_invalid_symbol_rejected_before_any_fetch() {
        let engine = AnalysisEngine::new(test_config(), Arc::new(MockProvider::new())).unwrap();

        let result = engine.analyze("").await;
        assert!(matches!(result, Err(LensError::InvalidTicker(_))));
    }

    #[tokio::test]
    #[ignore] // Requires API keys and network access
    async fn test_analyze_end_to_end() {
        let config = Arc::new(LensConfig::from_env().unwrap());
        let provider =
            Arc::new(stocklens_llm::providers::OpenAiProvider::from_env().unwrap());
        let engine = AnalysisEngine::new(config, provider).unwrap();

        let analysis = engine.analyze("AAPL").await.unwrap();
        assert_eq!(analysis.snapshot.ticker.as_str(), "AAPL");
        assert!(analysis.narrative.is_some() || analysis.narrative_error.is_some());
    }
}
