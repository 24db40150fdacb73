//! Market-data API clients and the fetch-outcome contract

mod fmp;

pub use fmp::FmpClient;

use crate::ticker::Ticker;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Upstream data series fetched for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// Company profile - the identity endpoint; every other computation
    /// depends on this one resolving
    Profile,
    /// Latest annual income statement
    Income,
    /// Latest annual balance sheet
    BalanceSheet,
    /// Latest annual cash flow statement
    CashFlow,
    /// Trailing-twelve-month financial ratios
    Ratios,
    /// Discounted-cash-flow valuation
    Dcf,
    /// Financial health scores (Altman Z, Piotroski)
    Score,
    /// Sector average P/E table, keyed by exchange and date
    SectorPe,
}

impl Endpoint {
    /// All endpoints in fetch order
    pub fn all() -> [Endpoint; 8] {
        [
            Endpoint::Profile,
            Endpoint::Income,
            Endpoint::BalanceSheet,
            Endpoint::CashFlow,
            Endpoint::Ratios,
            Endpoint::Dcf,
            Endpoint::Score,
            Endpoint::SectorPe,
        ]
    }

    /// Short name used in logs and degradation reports
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Profile => "profile",
            Endpoint::Income => "income-statement",
            Endpoint::BalanceSheet => "balance-sheet",
            Endpoint::CashFlow => "cash-flow",
            Endpoint::Ratios => "ratios",
            Endpoint::Dcf => "dcf",
            Endpoint::Score => "score",
            Endpoint::SectorPe => "sector-pe",
        }
    }

    /// Whether a failed fetch of this endpoint fails the whole request
    pub fn is_essential(&self) -> bool {
        matches!(self, Endpoint::Profile)
    }

    /// URL path below the API base, without query parameters
    pub(crate) fn path(&self, ticker: &Ticker) -> String {
        match self {
            Endpoint::Profile => format!("v3/profile/{ticker}"),
            Endpoint::Income => format!("v3/income-statement/{ticker}"),
            Endpoint::BalanceSheet => format!("v3/balance-sheet-statement/{ticker}"),
            Endpoint::CashFlow => format!("v3/cash-flow-statement/{ticker}"),
            Endpoint::Ratios => format!("v3/ratios-ttm/{ticker}"),
            Endpoint::Dcf => format!("v3/discounted-cash-flow/{ticker}"),
            Endpoint::Score => "v4/score".to_string(),
            Endpoint::SectorPe => "v4/sector_price_earning_ratio".to_string(),
        }
    }
}

/// Classified result of fetching one endpoint
///
/// Every fetch resolves to exactly one of these; a fetch never raises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Endpoint returned usable data
    Success(Value),
    /// Endpoint resolved but had no data for the ticker (empty array, empty
    /// object, or an upstream "Error Message" payload)
    NotFound,
    /// Endpoint returned a non-success HTTP status
    UpstreamError { status: u16, body: String },
    /// Transport failure, including timeouts
    NetworkError(String),
}

impl FetchOutcome {
    /// Whether this outcome carries a payload
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// The payload, if any
    pub fn payload(&self) -> Option<&Value> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Human-readable failure description, `None` for successes
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::NotFound => Some("no data returned".to_string()),
            FetchOutcome::UpstreamError { status, .. } => Some(format!("HTTP {status}")),
            FetchOutcome::NetworkError(cause) => Some(cause.clone()),
        }
    }
}

/// The per-request collection of fetch outcomes, one slot per endpoint
///
/// Each concurrent fetch writes only its own slot, so the set needs no
/// locking; it is filled once and then read by the assembler.
#[derive(Debug, Clone)]
pub struct FetchSet {
    ticker: Ticker,
    outcomes: HashMap<Endpoint, FetchOutcome>,
}

impl FetchSet {
    /// Create an empty outcome set for one ticker
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            outcomes: HashMap::new(),
        }
    }

    /// The ticker this set was fetched for
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Record the outcome for one endpoint
    pub fn record(&mut self, endpoint: Endpoint, outcome: FetchOutcome) {
        self.outcomes.insert(endpoint, outcome);
    }

    /// The outcome recorded for an endpoint, if it was fetched
    pub fn outcome(&self, endpoint: Endpoint) -> Option<&FetchOutcome> {
        self.outcomes.get(&endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_paths() {
        let ticker = Ticker::parse("AAPL").unwrap();
        assert_eq!(Endpoint::Profile.path(&ticker), "v3/profile/AAPL");
        assert_eq!(
            Endpoint::BalanceSheet.path(&ticker),
            "v3/balance-sheet-statement/AAPL"
        );
        assert_eq!(Endpoint::SectorPe.path(&ticker), "v4/sector_price_earning_ratio");
    }

    #[test]
    fn test_only_profile_is_essential() {
        for endpoint in Endpoint::all() {
            assert_eq!(endpoint.is_essential(), endpoint == Endpoint::Profile);
        }
    }

    #[test]
    fn test_outcome_accessors() {
        let success = FetchOutcome::Success(json!([{"price": 1.0}]));
        assert!(success.is_success());
        assert!(success.payload().is_some());
        assert!(success.failure_reason().is_none());

        let timeout = FetchOutcome::NetworkError("request timed out".to_string());
        assert!(!timeout.is_success());
        assert_eq!(timeout.failure_reason().as_deref(), Some("request timed out"));
    }

    #[test]
    fn test_fetch_set_slots() {
        let ticker = Ticker::parse("AAPL").unwrap();
        let mut set = FetchSet::new(ticker);

        set.record(Endpoint::Profile, FetchOutcome::NotFound);
        assert!(set.outcome(Endpoint::Profile).is_some());
        assert!(set.outcome(Endpoint::Income).is_none());
    }
}
