//! Snapshot aggregation pipeline for stock analysis
//!
//! This crate turns several independent, partially-unreliable market-data
//! responses into a single consistent snapshot used both for display and for
//! narrative prompt construction. The pipeline:
//!
//! - `api`: one classified fetch per upstream data series, issued
//!   concurrently with a bounded connection limit
//! - `normalize`: heterogeneous JSON shapes reduced to typed records where
//!   every field is optional and absence is data
//! - `metrics`: pure cross-series computations (valuation gap, sector P/E
//!   spread, margins) with defined behavior at degenerate inputs
//! - `snapshot`: one immutable `StockSnapshot` per request, assembled from
//!   partial data whenever the identity endpoint resolved
//! - `prompt`: deterministic, bounded-length narrative prompt rendering
//! - `engine` / `session`: request orchestration and stale-request
//!   cancellation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stocklens_core::{AnalysisEngine, LensConfig};
//! use stocklens_llm::providers::OpenAiProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(LensConfig::from_env()?);
//!     let provider = Arc::new(OpenAiProvider::from_env()?);
//!
//!     let engine = AnalysisEngine::new(config, provider)?;
//!     let analysis = engine.analyze("AAPL").await?;
//!
//!     println!("{:#?}", analysis.snapshot.derived);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod metrics;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod snapshot;
pub mod ticker;

// Re-export main types for convenience
pub use api::{Endpoint, FetchOutcome, FetchSet, FmpClient};
pub use config::LensConfig;
pub use engine::{Analysis, AnalysisEngine};
pub use error::{LensError, Result};
pub use metrics::DerivedMetrics;
pub use prompt::PromptBuilder;
pub use session::AnalysisSession;
pub use snapshot::{Degradation, StockSnapshot};
pub use ticker::Ticker;
