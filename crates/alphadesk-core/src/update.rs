//! Typed partial updates sent to the backend.
//!
//! Every patch is a closed struct with optional fields; unset fields are
//! omitted from the request body. `validate()` runs before any request leaves
//! the client.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::entity::EntityId;
use crate::error::{CoreError, Result};

fn check_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidUpdate(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_url(field: &str, value: &str) -> Result<()> {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(CoreError::InvalidUpdate(format!(
            "{field} must be an http(s) URL: {value}"
        )));
    }
    Ok(())
}

fn check_positive(field: &str, value: Option<Decimal>) -> Result<()> {
    match value {
        Some(v) if v.is_sign_negative() || v.is_zero() => Err(CoreError::InvalidUpdate(format!(
            "{field} must be positive, got {v}"
        ))),
        _ => Ok(()),
    }
}

/// New entity. Exactly one of `type_id` / `new_type` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    /// Name of a type to create alongside the entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

impl EntityDraft {
    pub fn validate(&self) -> Result<()> {
        check_name("name", &self.name)?;
        match (&self.type_id, &self.new_type) {
            (Some(_), Some(_)) => {
                return Err(CoreError::InvalidUpdate(
                    "type_id and new_type are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(CoreError::InvalidUpdate(
                    "either type_id or new_type is required".to_string(),
                ))
            }
            (None, Some(new_type)) => check_name("new_type", new_type)?,
            (Some(_), None) => {}
        }
        if let Some(url) = &self.profile_url {
            check_url("profile_url", url)?;
        }
        if let Some(handle) = &self.twitter_handle {
            check_name("twitter_handle", handle)?;
        }
        Ok(())
    }
}

/// Patch for an existing entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

impl EntityUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CoreError::InvalidUpdate("entity update has no fields".to_string()));
        }
        if let Some(name) = &self.name {
            check_name("name", name)?;
        }
        if self.type_id.is_some() && self.new_type.is_some() {
            return Err(CoreError::InvalidUpdate(
                "type_id and new_type are mutually exclusive".to_string(),
            ));
        }
        if let Some(new_type) = &self.new_type {
            check_name("new_type", new_type)?;
        }
        if let Some(url) = &self.profile_url {
            check_url("profile_url", url)?;
        }
        Ok(())
    }
}

/// Patch for an alias: either toggle `ignore` or change its entity link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AliasUpdate {
    SetIgnore {
        ignore: bool,
    },
    Link {
        #[serde(rename = "entityId")]
        entity_id: Option<EntityId>,
    },
}

impl AliasUpdate {
    pub fn ignore(ignore: bool) -> Self {
        Self::SetIgnore { ignore }
    }

    pub fn link(entity_id: EntityId) -> Self {
        Self::Link {
            entity_id: Some(entity_id),
        }
    }

    pub fn unlink() -> Self {
        Self::Link { entity_id: None }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Link {
                entity_id: Some(id),
            } if id.0 <= 0 => Err(CoreError::InvalidUpdate(format!(
                "entity id must be positive, got {id}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Patch for a swap rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_threshold: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_threshold: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl SwapRuleUpdate {
    /// Upper bound for slippage (50%).
    pub const MAX_SLIPPAGE_BPS: u32 = 5_000;

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CoreError::InvalidUpdate("swap rule update has no fields".to_string()));
        }
        check_positive("buy_threshold", self.buy_threshold)?;
        check_positive("sell_threshold", self.sell_threshold)?;
        check_positive("trade_amount", self.trade_amount)?;
        if let (Some(buy), Some(sell)) = (self.buy_threshold, self.sell_threshold) {
            if buy >= sell {
                return Err(CoreError::InvalidUpdate(format!(
                    "buy_threshold {buy} must be below sell_threshold {sell}"
                )));
            }
        }
        if let Some(bps) = self.slippage_bps {
            if bps > Self::MAX_SLIPPAGE_BPS {
                return Err(CoreError::InvalidUpdate(format!(
                    "slippage_bps {bps} exceeds {}",
                    Self::MAX_SLIPPAGE_BPS
                )));
            }
        }
        Ok(())
    }
}

/// Patch for a floor-price alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_below: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_above: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ProjectRuleUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CoreError::InvalidUpdate(
                "project rule update has no fields".to_string(),
            ));
        }
        check_positive("floor_below", self.floor_below)?;
        check_positive("floor_above", self.floor_above)?;
        if let (Some(below), Some(above)) = (self.floor_below, self.floor_above) {
            if below >= above {
                return Err(CoreError::InvalidUpdate(format!(
                    "floor_below {below} must be below floor_above {above}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entity_draft_requires_one_type_source() {
        let mut draft = EntityDraft {
            name: "Pudgy Penguins".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        draft.type_id = Some(1);
        assert!(draft.validate().is_ok());

        draft.new_type = Some("Collection".to_string());
        assert!(draft.validate().is_err());

        draft.type_id = None;
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_entity_draft_rejects_bad_url() {
        let draft = EntityDraft {
            name: "x".to_string(),
            type_id: Some(1),
            profile_url: Some("javascript:alert(1)".to_string()),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_entity_update_serializes_only_set_fields() {
        let update = EntityUpdate {
            twitter_handle: Some("pudgy".to_string()),
            ..Default::default()
        };
        update.validate().unwrap();
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"twitterHandle":"pudgy"}"#
        );
        assert!(EntityUpdate::default().validate().is_err());
    }

    #[test]
    fn test_alias_update_bodies() {
        assert_eq!(
            serde_json::to_string(&AliasUpdate::ignore(true)).unwrap(),
            r#"{"ignore":true}"#
        );
        assert_eq!(
            serde_json::to_string(&AliasUpdate::link(EntityId(7))).unwrap(),
            r#"{"entityId":7}"#
        );
        assert_eq!(
            serde_json::to_string(&AliasUpdate::unlink()).unwrap(),
            r#"{"entityId":null}"#
        );
        assert!(AliasUpdate::link(EntityId(0)).validate().is_err());
    }

    #[test]
    fn test_swap_rule_update_validation() {
        let ok = SwapRuleUpdate {
            buy_threshold: Some(dec!(0.01)),
            sell_threshold: Some(dec!(0.02)),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let crossed = SwapRuleUpdate {
            buy_threshold: Some(dec!(0.03)),
            sell_threshold: Some(dec!(0.02)),
            ..Default::default()
        };
        assert!(crossed.validate().is_err());

        let negative = SwapRuleUpdate {
            trade_amount: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let slippage = SwapRuleUpdate {
            slippage_bps: Some(9_999),
            ..Default::default()
        };
        assert!(slippage.validate().is_err());

        assert!(SwapRuleUpdate::default().validate().is_err());
    }

    #[test]
    fn test_swap_rule_update_body_uses_decimal_strings() {
        let update = SwapRuleUpdate {
            enabled: Some(false),
            trade_amount: Some(dec!(100.5)),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"tradeAmount":"100.5","enabled":false}"#
        );
    }

    #[test]
    fn test_project_rule_update_validation() {
        let ok = ProjectRuleUpdate {
            floor_below: Some(dec!(8)),
            floor_above: Some(dec!(12)),
            enabled: None,
        };
        assert!(ok.validate().is_ok());

        let crossed = ProjectRuleUpdate {
            floor_below: Some(dec!(12)),
            floor_above: Some(dec!(8)),
            enabled: None,
        };
        assert!(crossed.validate().is_err());
        assert!(ProjectRuleUpdate::default().validate().is_err());
    }
}
