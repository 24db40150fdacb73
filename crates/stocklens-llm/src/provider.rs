//! Completion provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for completion providers
///
/// Implementations of this trait provide access to different completion
/// services (e.g., OpenAI or any OpenAI-compatible deployment). The service
/// is non-deterministic: identical requests may return different text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from the service
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the generated text and token usage
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}
