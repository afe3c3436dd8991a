use serde::Serialize;
use serde_json::{Map, Value};

/// Stat keys tried in order; the first present numeric value wins.
pub const INCOME_KEYS: &[&str] = &["Annual Income (k$)", "Income"];
pub const SPEND_KEYS: &[&str] = &["Total Spending", "Spending Score (1-100)"];
pub const FREQUENCY_KEYS: &[&str] = &["Purchase Frequency"];

/// Rounded numbers shown on an insight card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayStats {
    pub income: i64,
    pub spend: i64,
    pub freq: i64,
}

/// First numeric value among `keys`, or 0. Non-numeric values count as missing.
pub fn lookup(stats: &Map<String, Value>, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| stats.get(*key).and_then(Value::as_f64))
        .unwrap_or(0.0)
}

/// Card numbers from an insight's stats mapping.
pub fn extract_display_stats(stats: &Map<String, Value>) -> DisplayStats {
    DisplayStats {
        income: round(lookup(stats, INCOME_KEYS)),
        spend: round(lookup(stats, SPEND_KEYS)),
        freq: round(lookup(stats, FREQUENCY_KEYS)),
    }
}

// Half away from zero; NaN maps to 0 and infinities saturate.
fn round(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stats(raw: Value) -> Map<String, Value> {
        match raw {
            Value::Object(map) => map,
            other => panic!("stats must be an object, got {other}"),
        }
    }

    #[test]
    fn primary_key_wins_over_fallback() {
        let shown = extract_display_stats(&stats(json!({
            "Income": 50,
            "Annual Income (k$)": 80
        })));
        assert_eq!(shown.income, 80);
    }

    #[test]
    fn fallback_keys_are_used_when_primary_missing() {
        let shown = extract_display_stats(&stats(json!({
            "Income": 61.6,
            "Spending Score (1-100)": 48.2,
            "Purchase Frequency": 11.5
        })));
        assert_eq!(
            shown,
            DisplayStats {
                income: 62,
                spend: 48,
                freq: 12
            }
        );
    }

    #[test]
    fn zero_primary_value_is_kept() {
        let shown = extract_display_stats(&stats(json!({
            "Total Spending": 0,
            "Spending Score (1-100)": 70
        })));
        assert_eq!(shown.spend, 0);
    }

    #[test]
    fn missing_and_non_numeric_stats_default_to_zero() {
        assert_eq!(
            extract_display_stats(&stats(json!({}))),
            DisplayStats::default()
        );
        let shown = extract_display_stats(&stats(json!({
            "Annual Income (k$)": "n/a",
            "Income": 33
        })));
        assert_eq!(shown.income, 33);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(-2.5), -3);
        assert_eq!(round(f64::NAN), 0);
    }
}
