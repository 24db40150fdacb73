//! Response normalization
//!
//! Reduces each raw upstream payload to a typed record in which every field
//! is optional. Absence is data here, not an exception path: missing keys,
//! nulls, wrong-typed values, and unparseable strings all normalize to
//! `None`, and a failed fetch normalizes to the record's empty value. Known
//! upstream aliases for the same logical field map to one canonical field,
//! so downstream components never look at raw JSON key names.

use crate::api::FetchOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized company profile (the identity record)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub company_name: Option<String>,
    pub symbol: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    /// 52-week range, split from the upstream "low-high" composite
    pub range_low: Option<f64>,
    pub range_high: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl ProfileRecord {
    /// Whether the upstream confirmed this ticker maps to a known company
    pub fn is_resolved(&self) -> bool {
        self.company_name.is_some() || self.symbol.is_some()
    }
}

/// Normalized income statement (latest period)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
}

/// Normalized balance sheet (latest period)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub shareholder_equity: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub total_debt: Option<f64>,
}

/// Normalized cash flow statement (latest period)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRecord {
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
}

/// Normalized trailing-twelve-month ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatiosRecord {
    pub pe_ratio: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Normalized DCF valuation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcfRecord {
    /// Discounted-cash-flow fair value estimate
    pub intrinsic_value: Option<f64>,
    /// Market price as reported alongside the valuation
    pub market_price: Option<f64>,
}

/// Normalized financial health scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub altman_z_score: Option<f64>,
    pub piotroski_score: Option<f64>,
}

/// One row of the sector P/E benchmark table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPeRow {
    pub sector: String,
    pub pe: f64,
}

/// Normalized sector P/E benchmark table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorPeTable {
    pub rows: Vec<SectorPeRow>,
}

impl SectorPeTable {
    /// Benchmark P/E for a sector, located by exact name match
    pub fn pe_for(&self, sector: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.sector == sector)
            .map(|row| row.pe)
    }
}

/// Normalize a profile fetch outcome
pub fn normalize_profile(outcome: &FetchOutcome) -> ProfileRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return ProfileRecord::default();
    };

    let (range_low, range_high) = obj
        .get("range")
        .and_then(Value::as_str)
        .map_or((None, None), split_range);

    ProfileRecord {
        company_name: text_field(obj, &["companyName"]),
        symbol: text_field(obj, &["symbol"]),
        price: number_field(obj, &["price"]),
        market_cap: number_field(obj, &["mktCap", "marketCap"]),
        sector: text_field(obj, &["sector"]),
        industry: text_field(obj, &["industry"]),
        exchange: text_field(obj, &["exchangeShortName", "exchange"]),
        range_low,
        range_high,
        image_url: text_field(obj, &["image"]),
        description: text_field(obj, &["description"]),
    }
}

/// Normalize an income statement fetch outcome
pub fn normalize_income(outcome: &FetchOutcome) -> IncomeRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return IncomeRecord::default();
    };

    IncomeRecord {
        revenue: number_field(obj, &["revenue"]),
        net_income: number_field(obj, &["netIncome"]),
        eps: number_field(obj, &["eps", "epsdiluted"]),
        gross_profit: number_field(obj, &["grossProfit"]),
        operating_income: number_field(obj, &["operatingIncome"]),
    }
}

/// Normalize a balance sheet fetch outcome
pub fn normalize_balance(outcome: &FetchOutcome) -> BalanceRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return BalanceRecord::default();
    };

    BalanceRecord {
        total_assets: number_field(obj, &["totalAssets"]),
        total_liabilities: number_field(obj, &["totalLiabilities"]),
        shareholder_equity: number_field(obj, &["totalStockholdersEquity", "totalEquity"]),
        cash_and_equivalents: number_field(obj, &["cashAndCashEquivalents"]),
        total_debt: number_field(obj, &["totalDebt"]),
    }
}

/// Normalize a cash flow fetch outcome
pub fn normalize_cash_flow(outcome: &FetchOutcome) -> CashFlowRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return CashFlowRecord::default();
    };

    CashFlowRecord {
        operating_cash_flow: number_field(
            obj,
            &["operatingCashFlow", "netCashProvidedByOperatingActivities"],
        ),
        free_cash_flow: number_field(obj, &["freeCashFlow"]),
        capital_expenditure: number_field(obj, &["capitalExpenditure"]),
    }
}

/// Normalize a ratios fetch outcome
pub fn normalize_ratios(outcome: &FetchOutcome) -> RatiosRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return RatiosRecord::default();
    };

    RatiosRecord {
        pe_ratio: number_field(obj, &["peRatioTTM", "priceEarningsRatioTTM"]),
        current_ratio: number_field(obj, &["currentRatioTTM"]),
        quick_ratio: number_field(obj, &["quickRatioTTM"]),
        debt_to_equity: number_field(obj, &["debtEquityRatioTTM", "debtToEquityTTM"]),
        return_on_equity: number_field(obj, &["returnOnEquityTTM"]),
        // upstream misspells this key on some plan tiers
        dividend_yield: number_field(obj, &["dividendYieldTTM", "dividendYielTTM"]),
    }
}

/// Normalize a DCF valuation fetch outcome
pub fn normalize_dcf(outcome: &FetchOutcome) -> DcfRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return DcfRecord::default();
    };

    DcfRecord {
        intrinsic_value: number_field(obj, &["dcf", "discountedCashFlow"]),
        market_price: number_field(obj, &["Stock Price", "price"]),
    }
}

/// Normalize a health score fetch outcome
pub fn normalize_score(outcome: &FetchOutcome) -> ScoreRecord {
    let Some(obj) = outcome.payload().and_then(first_object) else {
        return ScoreRecord::default();
    };

    ScoreRecord {
        altman_z_score: number_field(obj, &["altmanZScore"]),
        piotroski_score: number_field(obj, &["piotroskiScore"]),
    }
}

/// Normalize a sector P/E table fetch outcome
///
/// Rows missing a sector name or a parseable P/E are skipped rather than
/// failing the table.
pub fn normalize_sector_pe(outcome: &FetchOutcome) -> SectorPeTable {
    let Some(items) = outcome.payload().and_then(Value::as_array) else {
        return SectorPeTable::default();
    };

    let rows = items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let sector = text_field(obj, &["sector"])?;
            let pe = number_field(obj, &["pe"])?;
            Some(SectorPeRow { sector, pe })
        })
        .collect();

    SectorPeTable { rows }
}

/// Resolve the payload object for a single-record endpoint
///
/// Upstream endpoints return either a list (take element 0) or a bare
/// object; both shapes are accepted everywhere.
fn first_object(payload: &Value) -> Option<&Map<String, Value>> {
    match payload {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Look up the first present alias and coerce it to a number
fn number_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key).and_then(coerce_number))
}

/// Look up the first present alias and extract a non-empty string
fn text_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

/// Coerce a JSON value to a finite number
///
/// Accepts JSON numbers, plain numeric strings, and strings with thousands
/// separators. Anything else - null, booleans, unparseable text - is `None`.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Split a "low-high" range string into its numeric bounds
///
/// A malformed range yields `None` for both bounds.
fn split_range(raw: &str) -> (Option<f64>, Option<f64>) {
    let mut parts = raw.splitn(2, '-');
    let low = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());
    let high = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());

    match (low, high) {
        (Some(low), Some(high)) => (Some(low), Some(high)),
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_array() {
        let outcome = FetchOutcome::Success(json!([{
            "companyName": "Apple Inc.",
            "symbol": "AAPL",
            "price": 189.5,
            "mktCap": 2_950_000_000_000_u64,
            "sector": "Technology",
            "range": "164.08-199.62"
        }]));

        let record = normalize_profile(&outcome);
        assert_eq!(record.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(record.price, Some(189.5));
        assert_eq!(record.range_low, Some(164.08));
        assert_eq!(record.range_high, Some(199.62));
        assert!(record.is_resolved());
    }

    #[test]
    fn test_profile_from_bare_object() {
        let outcome = FetchOutcome::Success(json!({
            "companyName": "Apple Inc.",
            "price": 189.5
        }));

        let record = normalize_profile(&outcome);
        assert!(record.is_resolved());
        assert_eq!(record.price, Some(189.5));
    }

    #[test]
    fn test_failed_fetch_normalizes_empty() {
        let outcome = FetchOutcome::NetworkError("timed out".to_string());
        assert_eq!(normalize_profile(&outcome), ProfileRecord::default());
        assert_eq!(normalize_income(&outcome), IncomeRecord::default());
        assert_eq!(normalize_sector_pe(&outcome), SectorPeTable::default());
    }

    #[test]
    fn test_missing_and_malformed_fields_are_none() {
        let outcome = FetchOutcome::Success(json!([{
            "revenue": "not-a-number",
            "netIncome": null,
            "eps": true
        }]));

        let record = normalize_income(&outcome);
        assert_eq!(record.revenue, None);
        assert_eq!(record.net_income, None);
        assert_eq!(record.eps, None);
        assert_eq!(record.gross_profit, None);
    }

    #[test]
    fn test_string_numbers_coerced() {
        let outcome = FetchOutcome::Success(json!([{
            "revenue": "1,234,567",
            "netIncome": "250000.5"
        }]));

        let record = normalize_income(&outcome);
        assert_eq!(record.revenue, Some(1_234_567.0));
        assert_eq!(record.net_income, Some(250_000.5));
    }

    #[test]
    fn test_cash_flow_alias_mapping() {
        let outcome = FetchOutcome::Success(json!([{
            "netCashProvidedByOperatingActivities": 110_543_000_000_u64
        }]));

        let record = normalize_cash_flow(&outcome);
        assert_eq!(record.operating_cash_flow, Some(110_543_000_000.0));
    }

    #[test]
    fn test_dcf_aliases() {
        let outcome = FetchOutcome::Success(json!({
            "symbol": "AAPL",
            "dcf": 151.2,
            "Stock Price": 189.5
        }));

        let record = normalize_dcf(&outcome);
        assert_eq!(record.intrinsic_value, Some(151.2));
        assert_eq!(record.market_price, Some(189.5));
    }

    #[test]
    fn test_malformed_range_yields_neither_bound() {
        let outcome = FetchOutcome::Success(json!([{
            "companyName": "Apple Inc.",
            "range": "garbage"
        }]));

        let record = normalize_profile(&outcome);
        assert_eq!(record.range_low, None);
        assert_eq!(record.range_high, None);
    }

    #[test]
    fn test_sector_table_skips_bad_rows() {
        let outcome = FetchOutcome::Success(json!([
            {"sector": "Technology", "pe": "25.0"},
            {"sector": "Energy"},
            {"pe": 12.0}
        ]));

        let table = normalize_sector_pe(&outcome);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.pe_for("Technology"), Some(25.0));
        assert_eq!(table.pe_for("Energy"), None);
    }

    #[test]
    fn test_split_range() {
        assert_eq!(split_range("12.5-187.3"), (Some(12.5), Some(187.3)));
        assert_eq!(split_range("12.5"), (None, None));
        assert_eq!(split_range("low-high"), (None, None));
    }
}
