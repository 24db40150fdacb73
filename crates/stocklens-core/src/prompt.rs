//! Narrative prompt construction
//!
//! Renders a snapshot into the bounded text prompt sent to the completion
//! service. Rendering is deterministic, and every metric a section covers is
//! listed either with its value or as the literal "not available" - silently
//! omitting a metric would invite the model to hallucinate one. When the
//! full prompt would exceed the character budget, whole sections are dropped
//! lowest-priority-first (sector comparison goes before anything else; the
//! company header, pricing, valuation, and liquidity/leverage ratios go
//! last).

use crate::format::{format_money, format_pct, format_price, format_ratio};
use crate::snapshot::StockSnapshot;

/// System role description sent alongside every narrative prompt
pub const SYSTEM_PROMPT: &str = "You are an equity research assistant. \
You are given a set of pre-computed financial metrics for a single company. \
Base your assessment strictly on the metrics provided; where a metric is \
marked not available, acknowledge the gap instead of estimating a value. \
Cover financial health, growth potential, risk factors, and investment \
outlook, and keep the tone measured and factual.";

/// Core sections: never dropped before any lower-priority section
const PRIORITY_CORE: u8 = 0;
const PRIORITY_PROFITABILITY: u8 = 1;
const PRIORITY_CASH_FLOW: u8 = 2;
const PRIORITY_SCORES: u8 = 3;
const PRIORITY_SECTOR: u8 = 4;

struct Section {
    priority: u8,
    body: String,
}

impl Section {
    fn core(body: String) -> Self {
        Self {
            priority: PRIORITY_CORE,
            body,
        }
    }

    fn new(priority: u8, body: String) -> Self {
        Self { priority, body }
    }
}

/// Deterministic renderer from snapshot to bounded prompt text
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    char_budget: usize,
}

impl PromptBuilder {
    /// Create a builder with the given character budget
    pub fn new(char_budget: usize) -> Self {
        Self { char_budget }
    }

    /// Render the prompt for one snapshot
    ///
    /// The returned string never exceeds the configured budget.
    pub fn build(&self, snapshot: &StockSnapshot) -> String {
        let mut sections = vec![
            Section::core(header(snapshot)),
            Section::core(pricing(snapshot)),
            Section::core(valuation(snapshot)),
            Section::new(PRIORITY_PROFITABILITY, profitability(snapshot)),
            Section::core(liquidity_and_leverage(snapshot)),
            Section::new(PRIORITY_CASH_FLOW, cash_flow(snapshot)),
            Section::new(PRIORITY_SCORES, health_scores(snapshot)),
            Section::new(PRIORITY_SECTOR, sector_comparison(snapshot)),
            Section::core(instructions()),
        ];

        loop {
            let rendered = render(&sections);
            if rendered.chars().count() <= self.char_budget {
                return rendered;
            }

            // Drop the least important remaining section; among equals, the
            // one rendered later goes first.
            let droppable = sections
                .iter()
                .enumerate()
                .filter(|(_, s)| s.priority > PRIORITY_CORE)
                .max_by_key(|(idx, s)| (s.priority, *idx))
                .map(|(idx, _)| idx);

            match droppable {
                Some(idx) => {
                    sections.remove(idx);
                }
                // Only core sections left: hard-truncate at a char boundary
                None => return truncate_to_budget(rendered, self.char_budget),
            }
        }
    }
}

fn render(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| s.body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_to_budget(rendered: String, budget: usize) -> String {
    rendered.chars().take(budget).collect()
}

/// A metric line: formatted value or the explicit unavailable label
fn line(label: &str, value: Option<f64>, fmt: fn(f64) -> String) -> String {
    match value {
        Some(v) => format!("- {label}: {}", fmt(v)),
        None => format!("- {label}: not available"),
    }
}

fn text_line(label: &str, value: Option<&str>) -> String {
    format!("- {label}: {}", value.unwrap_or("not available"))
}

fn header(snapshot: &StockSnapshot) -> String {
    let name = snapshot
        .profile
        .company_name
        .as_deref()
        .unwrap_or_else(|| snapshot.ticker.as_str());

    format!(
        "Analyze the stock {name} ({}) based on the following data:",
        snapshot.ticker
    )
}

fn pricing(snapshot: &StockSnapshot) -> String {
    let profile = &snapshot.profile;
    [
        "Profile:".to_string(),
        line("Stock price", profile.price, format_price),
        line("Market cap", profile.market_cap, format_money),
        text_line("Sector", profile.sector.as_deref()),
        text_line("Industry", profile.industry.as_deref()),
        line("52-week low", profile.range_low, format_price),
        line("52-week high", profile.range_high, format_price),
        line(
            "Position in 52-week range",
            snapshot.derived.price_vs_range_pct,
            format_pct,
        ),
    ]
    .join("\n")
}

fn valuation(snapshot: &StockSnapshot) -> String {
    [
        "Valuation:".to_string(),
        line(
            "DCF intrinsic value",
            snapshot.dcf.intrinsic_value,
            format_price,
        ),
        line(
            "Valuation gap (price vs intrinsic)",
            snapshot.derived.valuation_gap_pct,
            format_pct,
        ),
        line("P/E ratio (TTM)", snapshot.ratios.pe_ratio, format_ratio),
    ]
    .join("\n")
}

fn profitability(snapshot: &StockSnapshot) -> String {
    [
        "Profitability (latest year):".to_string(),
        line("Revenue", snapshot.income.revenue, format_money),
        line("Net income", snapshot.income.net_income, format_money),
        line("EPS", snapshot.income.eps, format_price),
        line("Net margin", snapshot.derived.net_margin_pct, format_pct),
        line(
            "Return on equity (TTM)",
            snapshot.ratios.return_on_equity,
            format_ratio,
        ),
    ]
    .join("\n")
}

fn liquidity_and_leverage(snapshot: &StockSnapshot) -> String {
    [
        "Balance sheet:".to_string(),
        line("Total assets", snapshot.balance.total_assets, format_money),
        line(
            "Total liabilities",
            snapshot.balance.total_liabilities,
            format_money,
        ),
        line(
            "Shareholder equity",
            snapshot.balance.shareholder_equity,
            format_money,
        ),
        line(
            "Current ratio (TTM)",
            snapshot.ratios.current_ratio,
            format_ratio,
        ),
        line(
            "Debt to equity (TTM)",
            snapshot.ratios.debt_to_equity,
            format_ratio,
        ),
    ]
    .join("\n")
}

fn cash_flow(snapshot: &StockSnapshot) -> String {
    [
        "Cash flow (latest year):".to_string(),
        line(
            "Operating cash flow",
            snapshot.cash_flow.operating_cash_flow,
            format_money,
        ),
        line(
            "Free cash flow",
            snapshot.cash_flow.free_cash_flow,
            format_money,
        ),
        line(
            "Free cash flow margin",
            snapshot.derived.fcf_margin_pct,
            format_pct,
        ),
    ]
    .join("\n")
}

fn health_scores(snapshot: &StockSnapshot) -> String {
    [
        "Financial health scores:".to_string(),
        line("Altman Z-score", snapshot.score.altman_z_score, format_ratio),
        line(
            "Piotroski score",
            snapshot.score.piotroski_score,
            format_ratio,
        ),
    ]
    .join("\n")
}

fn sector_comparison(snapshot: &StockSnapshot) -> String {
    let benchmark = snapshot
        .profile
        .sector
        .as_deref()
        .and_then(|sector| snapshot.sector_pe.pe_for(sector));

    [
        "Sector comparison:".to_string(),
        line("Sector average P/E", benchmark, format_ratio),
        line(
            "P/E spread vs sector",
            snapshot.derived.sector_pe_spread_pct,
            format_pct,
        ),
    ]
    .join("\n")
}

fn instructions() -> String {
    "Provide insights on:\n\
     - Financial health\n\
     - Growth potential\n\
     - Risk factors\n\
     - Investment outlook"
        .to_string()
}
