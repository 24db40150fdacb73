//! Snapshot and narrative rendering for the terminal

use comfy_table::{Table, presets::UTF8_FULL};
use stocklens_core::format::{format_money, format_pct, format_price, format_ratio};
use stocklens_core::{Analysis, StockSnapshot};

/// Render one full analysis: numeric snapshot first, narrative (or the
/// warning that replaced it) after. The numeric display never depends on
/// the narrative having succeeded.
pub fn format_analysis(analysis: &Analysis) -> String {
    let mut out = format_snapshot(&analysis.snapshot);

    if let Some(narrative) = &analysis.narrative {
        out.push_str("\nAI Assessment\n");
        out.push_str(narrative);
        out.push('\n');
    } else if let Some(warning) = &analysis.narrative_error {
        out.push_str(&format!("\n⚠ Narrative unavailable: {warning}\n"));
    }

    out
}

/// Render the numeric snapshot as an aligned metric table
pub fn format_snapshot(snapshot: &StockSnapshot) -> String {
    let profile = &snapshot.profile;
    let mut out = String::new();

    let name = profile
        .company_name
        .as_deref()
        .unwrap_or_else(|| snapshot.ticker.as_str());
    out.push_str(&format!("{name} ({})\n", snapshot.ticker));
    if let (Some(sector), Some(industry)) = (&profile.sector, &profile.industry) {
        out.push_str(&format!("{sector} / {industry}\n"));
    }
    out.push('\n');

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["Stock price".to_string(), num(profile.price, format_price)]);
    table.add_row(vec![
        "Market cap".to_string(),
        num(profile.market_cap, format_money),
    ]);
    table.add_row(vec![
        "52-week range".to_string(),
        match (profile.range_low, profile.range_high) {
            (Some(low), Some(high)) => {
                format!("{} - {}", format_price(low), format_price(high))
            }
            _ => "n/a".to_string(),
        },
    ]);
    table.add_row(vec![
        "DCF intrinsic value".to_string(),
        num(snapshot.dcf.intrinsic_value, format_price),
    ]);
    table.add_row(vec![
        "Valuation gap".to_string(),
        num(snapshot.derived.valuation_gap_pct, format_pct),
    ]);
    table.add_row(vec![
        "P/E (TTM)".to_string(),
        num(snapshot.ratios.pe_ratio, format_ratio),
    ]);
    table.add_row(vec![
        "P/E spread vs sector".to_string(),
        num(snapshot.derived.sector_pe_spread_pct, format_pct),
    ]);
    table.add_row(vec![
        "Revenue".to_string(),
        num(snapshot.income.revenue, format_money),
    ]);
    table.add_row(vec![
        "Net income".to_string(),
        num(snapshot.income.net_income, format_money),
    ]);
    table.add_row(vec![
        "Net margin".to_string(),
        num(snapshot.derived.net_margin_pct, format_pct),
    ]);
    table.add_row(vec![
        "Free cash flow".to_string(),
        num(snapshot.cash_flow.free_cash_flow, format_money),
    ]);
    table.add_row(vec![
        "Current ratio (TTM)".to_string(),
        num(snapshot.ratios.current_ratio, format_ratio),
    ]);
    table.add_row(vec![
        "Debt to equity (TTM)".to_string(),
        num(snapshot.ratios.debt_to_equity, format_ratio),
    ]);
    table.add_row(vec![
        "Altman Z-score".to_string(),
        num(snapshot.score.altman_z_score, format_ratio),
    ]);

    out.push_str(&table.to_string());
    out.push('\n');

    if !snapshot.degraded.is_empty() {
        out.push('\n');
        for degradation in &snapshot.degraded {
            out.push_str(&format!(
                "⚠ {} data unavailable ({})\n",
                degradation.endpoint.label(),
                degradation.reason
            ));
        }
    }

    out
}

fn num(value: Option<f64>, fmt: fn(f64) -> String) -> String {
    value.map_or_else(|| "n/a".to_string(), fmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocklens_core::{Endpoint, FetchOutcome, FetchSet, Ticker, snapshot};

    fn sample_analysis() -> Analysis {
        let ticker = Ticker::parse("AAPL").unwrap();
        let mut set = FetchSet::new(ticker);
        set.record(
            Endpoint::Profile,
            FetchOutcome::Success(serde_json::json!([{
                "companyName": "Apple Inc.",
                "symbol": "AAPL",
                "price": 189.5,
                "mktCap": 2_950_000_000_000_u64,
                "sector": "Technology",
                "industry": "Consumer Electronics"
            }])),
        );
        set.record(
            Endpoint::SectorPe,
            FetchOutcome::NetworkError("request timed out".to_string()),
        );

        Analysis {
            request_id: uuid::Uuid::nil(),
            snapshot: snapshot::assemble(&set).unwrap(),
            narrative: None,
            narrative_error: Some("Rate limit exceeded: quota exhausted".to_string()),
        }
    }

    #[test]
    fn test_snapshot_renders_with_warnings() {
        let rendered = format_analysis(&sample_analysis());

        assert!(rendered.contains("Apple Inc. (AAPL)"));
        assert!(rendered.contains("$189.50"));
        assert!(rendered.contains("n/a"));
        assert!(rendered.contains("sector-pe data unavailable (request timed out)"));
        assert!(rendered.contains("Narrative unavailable"));
    }
}
