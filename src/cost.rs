use serde::{Serialize, Serializer};

use crate::catalog::ModelSpec;
use crate::gateway::TokenUsage;

/// Monetary cost of one generation in USD.
///
/// `Unknown` is distinct from `Known(0.0)`: zero is a valid outcome for a
/// free model (and for every failed task), unknown means no pricing applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cost {
    Known(f64),
    Unknown,
}

impl Cost {
    pub const ZERO: Cost = Cost::Known(0.0);

    pub fn is_unknown(&self) -> bool {
        matches!(self, Cost::Unknown)
    }

    pub fn as_usd(&self) -> Option<f64> {
        match self {
            Cost::Known(usd) => Some(*usd),
            Cost::Unknown => None,
        }
    }

    /// Storage form: NULL for unknown.
    pub fn from_column(value: Option<f64>) -> Self {
        value.map_or(Cost::Unknown, Cost::Known)
    }

    /// Display form, rounded to four decimals.
    pub fn display(&self) -> String {
        match self {
            Cost::Known(usd) => format!("${usd:.4}"),
            Cost::Unknown => "UNKNOWN".to_string(),
        }
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Cost::Known(usd) if usd.is_finite() => s.serialize_f64(*usd),
            Cost::Known(_) => s.serialize_f64(0.0),
            Cost::Unknown => s.serialize_str("unknown"),
        }
    }
}

/// `prompt_tokens * prompt_price + completion_tokens * completion_price`,
/// unrounded. Without a pricing entry the cost is unknown.
pub fn price(usage: TokenUsage, pricing: Option<&ModelSpec>) -> Cost {
    let Some(spec) = pricing else {
        return Cost::Unknown;
    };
    Cost::Known(
        usage.prompt_tokens as f64 * spec.prompt_price
            + usage.completion_tokens as f64 * spec.completion_price,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(prompt_price: f64, completion_price: f64) -> ModelSpec {
        ModelSpec {
            id: "test/model".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            prompt_price,
            completion_price,
        }
    }

    #[test]
    fn combines_prompt_and_completion_prices() {
        let cost = price(TokenUsage::new(1_000, 500), Some(&spec(0.000002, 0.00001)));
        let usd = cost.as_usd().unwrap();
        assert!((usd - 0.007).abs() < 1e-12, "got {usd}");
    }

    #[test]
    fn zero_usage_costs_exactly_zero() {
        let cost = price(TokenUsage::default(), Some(&spec(0.000002, 0.00001)));
        assert_eq!(cost, Cost::ZERO);
    }

    #[test]
    fn missing_pricing_is_unknown_not_zero() {
        let cost = price(TokenUsage::new(100, 100), None);
        assert!(cost.is_unknown());
        assert_ne!(cost, Cost::ZERO);
        assert_eq!(cost.as_usd(), None);
    }

    #[test]
    fn free_model_is_known_zero() {
        let cost = price(TokenUsage::new(10_000, 10_000), Some(&spec(0.0, 0.0)));
        assert_eq!(cost, Cost::ZERO);
        assert!(!cost.is_unknown());
    }

    #[test]
    fn more_tokens_cost_strictly_more() {
        let s = spec(0.0000004, 0.0000012);
        let base = price(TokenUsage::new(100, 100), Some(&s)).as_usd().unwrap();
        let more_prompt = price(TokenUsage::new(101, 100), Some(&s)).as_usd().unwrap();
        let more_completion = price(TokenUsage::new(100, 101), Some(&s)).as_usd().unwrap();
        assert!(more_prompt > base);
        assert!(more_completion > base);
    }

    #[test]
    fn serializes_unknown_as_string() {
        assert_eq!(serde_json::to_string(&Cost::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(serde_json::to_string(&Cost::Known(0.5)).unwrap(), "0.5");
        assert_eq!(serde_json::to_string(&Cost::ZERO).unwrap(), "0.0");
    }

    #[test]
    fn display_rounds_and_marks_unknown() {
        assert_eq!(Cost::Known(0.0071234).display(), "$0.0071");
        assert_eq!(Cost::Unknown.display(), "UNKNOWN");
    }

    #[test]
    fn column_round_trip_preserves_unknown() {
        assert_eq!(Cost::from_column(None), Cost::Unknown);
        assert_eq!(Cost::from_column(Some(0.0)), Cost::ZERO);
    }
}
