//! Value formatting shared by the prompt builder and display layers

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a dollar amount in human-readable form
pub fn format_money(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000_000.0 {
        format!("${:.2}T", value / 1_000_000_000_000.0)
    } else if abs >= 1_000_000_000.0 {
        format!("${:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else {
        format!("${value:.2}")
    }
}

/// Format a per-share price
pub fn format_price(value: f64) -> String {
    format!("${value:.2}")
}

/// Format a percentage at two decimals
pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", round2(value))
}

/// Format a dimensionless ratio at two decimals
pub fn format_ratio(value: f64) -> String {
    format!("{:.2}", round2(value))
}
