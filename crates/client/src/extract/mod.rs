//! Market-cap extraction from heterogeneous feed rows.
//!
//! Different endpoints name the market-cap field differently, and some
//! nest it or encode it as a string. Extraction is an ordered list of
//! named strategies, tried in declared order; the first one that
//! yields a finite numeric value wins.

/// A named probe for one feed shape.
struct Strategy {
    name: &'static str,
    /// Field path walked from the row root.
    path: &'static [&'static str],
}

/// Probe order matters: preferred shapes first, fully-diluted
/// valuations only as a last resort.
const STRATEGIES: &[Strategy] = &[
    Strategy { name: "market_cap", path: &["market_cap"] },
    Strategy { name: "market_cap_usd", path: &["market_cap_usd"] },
    Strategy { name: "marketCap", path: &["marketCap"] },
    Strategy { name: "usd_quote", path: &["quote", "USD", "market_cap"] },
    Strategy { name: "fully_diluted_valuation", path: &["fully_diluted_valuation"] },
    Strategy { name: "fdv", path: &["fdv"] },
];

/// Extract a market cap from a feed row, if any strategy matches.
pub fn extract_market_cap(row: &serde_json::Value) -> Option<f64> {
    for strategy in STRATEGIES {
        let Some(value) = walk(row, strategy.path) else {
            continue;
        };
        if let Some(cap) = as_finite_number(value) {
            tracing::trace!(strategy = strategy.name, cap, "market cap extracted");
            return Some(cap);
        }
    }
    None
}

fn walk<'a>(root: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(root, |value, field| value.get(field))
}

/// Accept JSON numbers and numeric strings; reject NaN and infinities.
fn as_finite_number(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_field() {
        let row = json!({"symbol": "BTC", "market_cap": 1.2e12});
        assert_eq!(extract_market_cap(&row), Some(1.2e12));
    }

    #[test]
    fn test_declared_order_wins() {
        // Both present: market_cap is probed before fdv.
        let row = json!({"fdv": 2.0, "market_cap": 1.0});
        assert_eq!(extract_market_cap(&row), Some(1.0));
    }

    #[test]
    fn test_nested_quote_shape() {
        let row = json!({"quote": {"USD": {"market_cap": 5.0e9}}});
        assert_eq!(extract_market_cap(&row), Some(5.0e9));
    }

    #[test]
    fn test_numeric_string() {
        let row = json!({"market_cap_usd": "123456.78"});
        assert_eq!(extract_market_cap(&row), Some(123456.78));
    }

    #[test]
    fn test_null_field_falls_through() {
        let row = json!({"market_cap": null, "fdv": 7.0});
        assert_eq!(extract_market_cap(&row), Some(7.0));
    }

    #[test]
    fn test_non_numeric_string_falls_through() {
        let row = json!({"market_cap": "n/a", "marketCap": 3.0});
        assert_eq!(extract_market_cap(&row), Some(3.0));
    }

    #[test]
    fn test_no_match() {
        let row = json!({"symbol": "BTC", "price": 1.0});
        assert_eq!(extract_market_cap(&row), None);
    }
}
