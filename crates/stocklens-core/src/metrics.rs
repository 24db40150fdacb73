//! Derived metrics
//!
//! Pure cross-series computations over normalized records. Every metric is
//! either a finite number or `None` - degenerate inputs (missing fields,
//! zero denominators) produce `None`, never NaN or infinity. Values keep
//! full precision here; rounding to two decimals happens at display and
//! prompt time only.

use crate::normalize::{
    CashFlowRecord, DcfRecord, IncomeRecord, ProfileRecord, RatiosRecord, SectorPeTable,
};
use serde::{Deserialize, Serialize};

/// Cross-series metrics derived from one ticker's normalized records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// (price - intrinsic value) / intrinsic value, as a percentage.
    /// Positive means the market prices the stock above the DCF model.
    pub valuation_gap_pct: Option<f64>,

    /// (stock P/E - sector P/E) / sector P/E, as a percentage, against the
    /// benchmark row matching the company's reported sector
    pub sector_pe_spread_pct: Option<f64>,

    /// Net income as a percentage of revenue
    pub net_margin_pct: Option<f64>,

    /// Free cash flow as a percentage of revenue
    pub fcf_margin_pct: Option<f64>,

    /// Position of the current price inside the 52-week range, 0-100
    pub price_vs_range_pct: Option<f64>,
}

/// Compute all derived metrics from the normalized records
///
/// Deterministic and side-effect-free: identical inputs always produce
/// identical outputs.
pub fn compute(
    profile: &ProfileRecord,
    income: &IncomeRecord,
    cash_flow: &CashFlowRecord,
    ratios: &RatiosRecord,
    dcf: &DcfRecord,
    sector_pe: &SectorPeTable,
) -> DerivedMetrics {
    let price = profile.price.or(dcf.market_price);

    let valuation_gap_pct = match (price, dcf.intrinsic_value) {
        (Some(price), Some(intrinsic)) => percent_change(price, intrinsic),
        _ => None,
    };

    let sector_benchmark = profile
        .sector
        .as_deref()
        .and_then(|sector| sector_pe.pe_for(sector));
    let sector_pe_spread_pct = match (ratios.pe_ratio, sector_benchmark) {
        (Some(stock_pe), Some(sector_pe)) => percent_change(stock_pe, sector_pe),
        _ => None,
    };

    let net_margin_pct = ratio_pct(income.net_income, income.revenue);
    let fcf_margin_pct = ratio_pct(cash_flow.free_cash_flow, income.revenue);

    let price_vs_range_pct = match (price, profile.range_low, profile.range_high) {
        (Some(price), Some(low), Some(high)) if high > low => {
            let position = (price - low) / (high - low) * 100.0;
            position.is_finite().then(|| position.clamp(0.0, 100.0))
        }
        _ => None,
    };

    DerivedMetrics {
        valuation_gap_pct,
        sector_pe_spread_pct,
        net_margin_pct,
        fcf_margin_pct,
        price_vs_range_pct,
    }
}

/// Relative difference of `value` against `reference`, as a percentage
///
/// `None` when the reference is zero or the result is non-finite.
fn percent_change(value: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 {
        return None;
    }
    let pct = (value - reference) / reference * 100.0;
    pct.is_finite().then_some(pct)
}

/// Numerator over denominator as a percentage, `None` on degenerate input
fn ratio_pct(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => {
            let pct = n / d * 100.0;
            pct.is_finite().then_some(pct)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::SectorPeRow;

    fn profile(price: Option<f64>, sector: Option<&str>) -> ProfileRecord {
        ProfileRecord {
            price,
            sector: sector.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_valuation_gap() {
        let dcf = DcfRecord {
            intrinsic_value: Some(100.0),
            market_price: None,
        };
        let metrics = compute(
            &profile(Some(120.0), None),
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &dcf,
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.valuation_gap_pct, Some(20.0));
    }

    #[test]
    fn test_valuation_gap_zero_intrinsic_is_unavailable() {
        let dcf = DcfRecord {
            intrinsic_value: Some(0.0),
            market_price: None,
        };
        let metrics = compute(
            &profile(Some(120.0), None),
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &dcf,
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.valuation_gap_pct, None);
    }

    #[test]
    fn test_valuation_gap_missing_inputs_is_unavailable() {
        let metrics = compute(
            &profile(None, None),
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &DcfRecord::default(),
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.valuation_gap_pct, None);
    }

    #[test]
    fn test_sector_spread_matching_row() {
        let table = SectorPeTable {
            rows: vec![SectorPeRow {
                sector: "Technology".to_string(),
                pe: 25.0,
            }],
        };
        let ratios = RatiosRecord {
            pe_ratio: Some(30.0),
            ..Default::default()
        };

        let metrics = compute(
            &profile(None, Some("Technology")),
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &ratios,
            &DcfRecord::default(),
            &table,
        );

        assert_eq!(metrics.sector_pe_spread_pct, Some(20.0));
    }

    #[test]
    fn test_sector_spread_no_matching_row_is_unavailable() {
        let table = SectorPeTable {
            rows: vec![SectorPeRow {
                sector: "Technology".to_string(),
                pe: 25.0,
            }],
        };
        let ratios = RatiosRecord {
            pe_ratio: Some(30.0),
            ..Default::default()
        };

        let metrics = compute(
            &profile(None, Some("Utilities")),
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &ratios,
            &DcfRecord::default(),
            &table,
        );

        assert_eq!(metrics.sector_pe_spread_pct, None);
    }

    #[test]
    fn test_margins() {
        let income = IncomeRecord {
            revenue: Some(400.0),
            net_income: Some(100.0),
            ..Default::default()
        };
        let cash_flow = CashFlowRecord {
            free_cash_flow: Some(80.0),
            ..Default::default()
        };

        let metrics = compute(
            &ProfileRecord::default(),
            &income,
            &cash_flow,
            &RatiosRecord::default(),
            &DcfRecord::default(),
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.net_margin_pct, Some(25.0));
        assert_eq!(metrics.fcf_margin_pct, Some(20.0));
    }

    #[test]
    fn test_price_vs_range() {
        let record = ProfileRecord {
            price: Some(150.0),
            range_low: Some(100.0),
            range_high: Some(200.0),
            ..Default::default()
        };

        let metrics = compute(
            &record,
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &DcfRecord::default(),
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.price_vs_range_pct, Some(50.0));
    }

    #[test]
    fn test_price_vs_range_degenerate_bounds() {
        let record = ProfileRecord {
            price: Some(150.0),
            range_low: Some(200.0),
            range_high: Some(200.0),
            ..Default::default()
        };

        let metrics = compute(
            &record,
            &IncomeRecord::default(),
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &DcfRecord::default(),
            &SectorPeTable::default(),
        );

        assert_eq!(metrics.price_vs_range_pct, None);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let record = ProfileRecord {
            price: Some(189.5),
            sector: Some("Technology".to_string()),
            range_low: Some(164.08),
            range_high: Some(199.62),
            ..Default::default()
        };
        let income = IncomeRecord {
            revenue: Some(383_285_000_000.0),
            net_income: Some(96_995_000_000.0),
            ..Default::default()
        };
        let dcf = DcfRecord {
            intrinsic_value: Some(151.2),
            market_price: Some(189.5),
        };

        let first = compute(
            &record,
            &income,
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &dcf,
            &SectorPeTable::default(),
        );
        let second = compute(
            &record,
            &income,
            &CashFlowRecord::default(),
            &RatiosRecord::default(),
            &dcf,
            &SectorPeTable::default(),
        );

        assert_eq!(first, second);
    }
}
