//! Ticker symbol validation
//!
//! Every fetch in the pipeline is keyed by a `Ticker`; raw user input never
//! crosses the network boundary.

use crate::error::{LensError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TICKER_LEN: usize = 10;

/// A validated, normalized exchange ticker symbol
///
/// Invariant: trimmed, uppercase, non-empty, and limited to ASCII
/// alphanumerics plus `.` and `-` (class shares and foreign listings such as
/// `BRK.B` or `RDS-A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalize a raw symbol
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(LensError::InvalidTicker(
                "ticker symbol is empty".to_string(),
            ));
        }

        if normalized.len() > MAX_TICKER_LEN {
            return Err(LensError::InvalidTicker(format!(
                "{normalized} exceeds {MAX_TICKER_LEN} characters"
            )));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(LensError::InvalidTicker(normalized));
        }

        Ok(Self(normalized))
    }

    /// The normalized symbol
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
