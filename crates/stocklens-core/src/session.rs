//! Interactive session handling
//!
//! Wraps the engine for interactive use where a user can ask for a new
//! ticker before the previous request finished. Each request runs as its own
//! task; issuing a new one aborts the in-flight predecessor (best effort)
//! so stale fetches stop consuming the connection budget and their results
//! are discarded instead of reaching the display.

use crate::engine::{Analysis, AnalysisEngine};
use crate::error::{LensError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

struct ActiveRequest {
    id: Uuid,
    abort: AbortHandle,
}

/// One user's analysis session, at most one request in flight
pub struct AnalysisSession {
    engine: Arc<AnalysisEngine>,
    active: Mutex<Option<ActiveRequest>>,
}

impl AnalysisSession {
    /// Create a session over an engine
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        Self {
            engine,
            active: Mutex::new(None),
        }
    }

    /// Run an analysis request, superseding any in-flight one
    pub async fn analyze(&self, symbol: &str) -> Result<Analysis> {
        let engine = Arc::clone(&self.engine);
        let owned_symbol = symbol.to_string();
        let handle = tokio::spawn(async move { engine.analyze(&owned_symbol).await });

        let id = Uuid::new_v4();
        {
            let mut active = self.active.lock().await;
            if let Some(stale) = active.replace(ActiveRequest {
                id,
                abort: handle.abort_handle(),
            }) {
                debug!(request_id = %stale.id, "aborting superseded analysis request");
                stale.abort.abort();
            }
        }

        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => Err(LensError::Other(
                "analysis superseded by a newer request".to_string(),
            )),
            Err(join_err) => Err(LensError::Other(join_err.to_string())),
        };

        // Release the slot only if it is still ours; a newer request may
        // already own it.
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|current| current.id == id) {
            *active = None;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LensConfig;
    use stocklens_llm::{
        CompletionRequest, CompletionResponse, LlmError, LlmProvider,
    };

    struct NoopProvider;

    #[async_trait::async_trait]
    impl LlmProvider for NoopProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> stocklens_llm::Result<CompletionResponse> {
            Err(LlmError::RequestFailed("noop".to_string()))
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    fn test_session() -> AnalysisSession {
        let config = Arc::new(
            LensConfig::builder()
                .fmp_api_key("test_key")
                .build()
                .unwrap(),
        );
        let engine = AnalysisEngine::new(config, Arc::new(NoopProvider)).unwrap();
        AnalysisSession::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_invalid_symbol_propagates() {
        let session = test_session();
        let result = session.analyze("not a ticker").await;
        assert!(matches!(result, Err(LensError::InvalidTicker(_))));
    }

    #[tokio::test]
    async fn test_slot_released_after_completion() {
        let session = test_session();
        let _ = session.analyze("not a ticker").await;

        let active = session.active.lock().await;
        assert!(active.is_none());
    }
}
