//! Completion-service abstraction layer for stocklens
//!
//! This crate provides provider-agnostic abstractions for the external
//! text-completion service that turns a numeric stock snapshot into a
//! narrative assessment. It includes:
//!
//! - Message types for chat-style completion requests
//! - Completion request/response types
//! - Provider trait for completion implementations
//! - Concrete provider implementations (behind feature flags)
//!
//! The completion service is treated as an opaque, potentially failing,
//! non-deterministic collaborator: the same prompt may yield different text
//! on retry, and every call can fail on quota, timeout, or a malformed key.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{LlmError, Result};
pub use messages::{Message, Role};
pub use provider::LlmProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
