//! Snapshot assembly
//!
//! Merges one request's fetch outcomes into a single immutable
//! `StockSnapshot` - the source of truth handed to both the display layer
//! and the prompt builder. The assembler proceeds with partial data: a
//! failed non-identity endpoint degrades the snapshot instead of aborting
//! it. Only an unresolved identity (company profile) fails the request.

use crate::api::{Endpoint, FetchOutcome, FetchSet};
use crate::error::{LensError, Result};
use crate::metrics::{self, DerivedMetrics};
use crate::normalize::{
    self, BalanceRecord, CashFlowRecord, DcfRecord, IncomeRecord, ProfileRecord, RatiosRecord,
    ScoreRecord, SectorPeTable,
};
use crate::ticker::Ticker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A non-fatal gap in the snapshot: one endpoint that could not contribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub endpoint: Endpoint,
    pub reason: String,
}

/// The immutable aggregate for one ticker at one point in time
///
/// Created once per analysis request after all fetches resolve, never
/// mutated afterwards, and discarded when the request completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: Ticker,
    pub fetched_at: DateTime<Utc>,
    pub profile: ProfileRecord,
    pub income: IncomeRecord,
    pub balance: BalanceRecord,
    pub cash_flow: CashFlowRecord,
    pub ratios: RatiosRecord,
    pub dcf: DcfRecord,
    pub score: ScoreRecord,
    pub sector_pe: SectorPeTable,
    pub derived: DerivedMetrics,
    /// Endpoints that failed or were not fetched, in endpoint order
    pub degraded: Vec<Degradation>,
}

impl StockSnapshot {
    /// Whether every endpoint contributed data
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Assemble a snapshot from one request's fetch outcomes
///
/// Fails only when the identity endpoint could not resolve the ticker to a
/// known company; every other gap is recorded as a degradation.
pub fn assemble(fetches: &FetchSet) -> Result<StockSnapshot> {
    let ticker = fetches.ticker().clone();

    let profile_outcome = fetches
        .outcome(Endpoint::Profile)
        .ok_or_else(|| LensError::TickerNotFound(ticker.to_string()))?;
    let profile = normalize::normalize_profile(profile_outcome);
    if !profile.is_resolved() {
        return Err(LensError::TickerNotFound(ticker.to_string()));
    }

    let mut degraded = Vec::new();
    for endpoint in Endpoint::all() {
        let reason = match fetches.outcome(endpoint) {
            Some(outcome) => outcome.failure_reason(),
            None => Some("not fetched".to_string()),
        };
        if let Some(reason) = reason {
            debug!(endpoint = endpoint.label(), %reason, "degraded endpoint");
            degraded.push(Degradation { endpoint, reason });
        }
    }

    let income = normalized_or_default(fetches, Endpoint::Income, normalize::normalize_income);
    let balance =
        normalized_or_default(fetches, Endpoint::BalanceSheet, normalize::normalize_balance);
    let cash_flow =
        normalized_or_default(fetches, Endpoint::CashFlow, normalize::normalize_cash_flow);
    let ratios = normalized_or_default(fetches, Endpoint::Ratios, normalize::normalize_ratios);
    let dcf = normalized_or_default(fetches, Endpoint::Dcf, normalize::normalize_dcf);
    let score = normalized_or_default(fetches, Endpoint::Score, normalize::normalize_score);
    let sector_pe =
        normalized_or_default(fetches, Endpoint::SectorPe, normalize::normalize_sector_pe);

    let derived = metrics::compute(&profile, &income, &cash_flow, &ratios, &dcf, &sector_pe);

    Ok(StockSnapshot {
        ticker,
        fetched_at: Utc::now(),
        profile,
        income,
        balance,
        cash_flow,
        ratios,
        dcf,
        score,
        sector_pe,
        derived,
        degraded,
    })
}

fn normalized_or_default<T: Default>(
    fetches: &FetchSet,
    endpoint: Endpoint,
    normalize: fn(&FetchOutcome) -> T,
) -> T {
    fetches
        .outcome(endpoint)
        .map_or_else(T::default, normalize)
}
