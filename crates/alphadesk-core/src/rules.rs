//! Trading and floor-price alert rules managed by the backend.
//!
//! The client only reads these records and patches individual fields through
//! [`crate::update::SwapRuleUpdate`] and [`crate::update::ProjectRuleUpdate`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::mention::Timestamp;

/// Automated token swap rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRule {
    pub id: i64,
    pub token_symbol: String,
    pub token_address: String,
    pub chain: String,
    /// Buy when the price drops to or below this value.
    #[serde(default)]
    pub buy_threshold: Option<Decimal>,
    /// Sell when the price rises to or above this value.
    #[serde(default)]
    pub sell_threshold: Option<Decimal>,
    /// Quote amount spent per buy.
    pub trade_amount: Decimal,
    #[serde(default)]
    pub slippage_bps: u32,
    pub enabled: bool,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// NFT collection floor-price alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRule {
    pub id: i64,
    pub collection_slug: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub floor_below: Option<Decimal>,
    #[serde(default)]
    pub floor_above: Option<Decimal>,
    pub enabled: bool,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl ProjectRule {
    /// Display name, falling back to the slug.
    pub fn display_name(&self) -> &str {
        self.collection_name.as_deref().unwrap_or(&self.collection_slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_swap_rule_decimals_from_strings() {
        let rule: SwapRule = serde_json::from_str(
            r#"{"id": 1, "tokenSymbol": "PENGU", "tokenAddress": "2zMM",
                "chain": "solana", "buyThreshold": "0.0125", "tradeAmount": "250",
                "slippageBps": 100, "enabled": true}"#,
        )
        .unwrap();
        assert_eq!(rule.buy_threshold, Some(dec!(0.0125)));
        assert_eq!(rule.sell_threshold, None);
        assert_eq!(rule.trade_amount, dec!(250));
    }

    #[test]
    fn test_project_rule_display_name() {
        let rule: ProjectRule = serde_json::from_str(
            r#"{"id": 2, "collectionSlug": "pudgypenguins", "floorBelow": 9.5, "enabled": false}"#,
        )
        .unwrap();
        assert_eq!(rule.display_name(), "pudgypenguins");
        assert_eq!(rule.floor_below, Some(dec!(9.5)));
    }
}
