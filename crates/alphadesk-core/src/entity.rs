//! Tracked entities and their aliases.
//!
//! Both record kinds carry a chat and a social last-mention timestamp. The
//! derived `last_mention` is computed once at ingestion through
//! [`merge_last_mention`] and is not settable on its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mention::{merge_last_mention, Timestamp};

/// Backend identifier of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity type label (e.g. "Project", "Person").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType {
    pub id: i64,
    pub name: String,
}

impl EntityType {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Compact reference to the entity an alias is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: Option<EntityType>,
}

/// A tracked subject: project, person or topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntityWire", rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub profile_url: Option<String>,
    pub twitter_handle: Option<String>,
    pub project_id: Option<i64>,
    #[serde(rename = "lastDiscordMention")]
    pub last_chat_mention: Option<Timestamp>,
    #[serde(rename = "lastTwitterMention")]
    pub last_social_mention: Option<Timestamp>,
    last_mention: Option<Timestamp>,
    pub mention_count: u64,
}

impl Entity {
    /// Create an entity with no mentions recorded.
    pub fn new(id: EntityId, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id,
            name: name.into(),
            entity_type,
            profile_url: None,
            twitter_handle: None,
            project_id: None,
            last_chat_mention: None,
            last_social_mention: None,
            last_mention: None,
            mention_count: 0,
        }
    }

    /// Replace both source timestamps and re-derive `last_mention`.
    pub fn with_mentions(mut self, chat: Option<Timestamp>, social: Option<Timestamp>) -> Self {
        self.last_chat_mention = chat;
        self.last_social_mention = social;
        self.last_mention = merge_last_mention(chat, social);
        self
    }

    /// Most recent mention across both sources.
    pub fn last_mention(&self) -> Option<Timestamp> {
        self.last_mention
    }

    /// Type label used for grouping.
    pub fn type_label(&self) -> &str {
        &self.entity_type.name
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityWire {
    id: EntityId,
    name: String,
    #[serde(rename = "type")]
    entity_type: EntityType,
    #[serde(default)]
    profile_url: Option<String>,
    #[serde(default)]
    twitter_handle: Option<String>,
    #[serde(default)]
    project_id: Option<i64>,
    #[serde(rename = "lastDiscordMention", default)]
    last_chat_mention: Option<Timestamp>,
    #[serde(rename = "lastTwitterMention", default)]
    last_social_mention: Option<Timestamp>,
    #[serde(default)]
    mention_count: u64,
}

impl From<EntityWire> for Entity {
    fn from(wire: EntityWire) -> Self {
        let entity = Entity {
            id: wire.id,
            name: wire.name,
            entity_type: wire.entity_type,
            profile_url: wire.profile_url,
            twitter_handle: wire.twitter_handle,
            project_id: wire.project_id,
            last_chat_mention: None,
            last_social_mention: None,
            last_mention: None,
            mention_count: wire.mention_count,
        };
        entity.with_mentions(wire.last_chat_mention, wire.last_social_mention)
    }
}

/// Surface form of a mention, optionally linked to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AliasWire", rename_all = "camelCase")]
pub struct EntityAlias {
    pub id: i64,
    pub name: String,
    pub entity: Option<EntityRef>,
    pub mention_count: u64,
    pub ignore: bool,
    #[serde(rename = "lastDiscordMention")]
    pub last_chat_mention: Option<Timestamp>,
    #[serde(rename = "lastTwitterMention")]
    pub last_social_mention: Option<Timestamp>,
    last_mention: Option<Timestamp>,
}

impl EntityAlias {
    /// Create an unlinked alias with no mentions recorded.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entity: None,
            mention_count: 0,
            ignore: false,
            last_chat_mention: None,
            last_social_mention: None,
            last_mention: None,
        }
    }

    /// Replace both source timestamps and re-derive `last_mention`.
    pub fn with_mentions(mut self, chat: Option<Timestamp>, social: Option<Timestamp>) -> Self {
        self.last_chat_mention = chat;
        self.last_social_mention = social;
        self.last_mention = merge_last_mention(chat, social);
        self
    }

    /// Most recent mention across both sources.
    pub fn last_mention(&self) -> Option<Timestamp> {
        self.last_mention
    }

    /// Whether the alias still needs triage (not ignored, not linked).
    pub fn is_untriaged(&self) -> bool {
        !self.ignore && self.entity.is_none()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasWire {
    id: i64,
    name: String,
    #[serde(default)]
    entity: Option<EntityRef>,
    #[serde(default)]
    mention_count: u64,
    #[serde(default)]
    ignore: bool,
    #[serde(rename = "lastDiscordMention", default)]
    last_chat_mention: Option<Timestamp>,
    #[serde(rename = "lastTwitterMention", default)]
    last_social_mention: Option<Timestamp>,
}

impl From<AliasWire> for EntityAlias {
    fn from(wire: AliasWire) -> Self {
        let alias = EntityAlias {
            id: wire.id,
            name: wire.name,
            entity: wire.entity,
            mention_count: wire.mention_count,
            ignore: wire.ignore,
            last_chat_mention: None,
            last_social_mention: None,
            last_mention: None,
        };
        alias.with_mentions(wire.last_chat_mention, wire.last_social_mention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_entity_derives_last_mention_on_deserialize() {
        let json = r#"{
            "id": 7,
            "name": "Pudgy Penguins",
            "type": {"id": 1, "name": "Project"},
            "twitterHandle": "pudgypenguins",
            "lastDiscordMention": "2024-05-01T10:00:00.000Z",
            "lastTwitterMention": "2024-05-01T11:30:00.000Z",
            "mentionCount": 42
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id, EntityId(7));
        assert_eq!(entity.type_label(), "Project");
        assert_eq!(entity.mention_count, 42);
        assert_eq!(
            entity.last_mention(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_entity_ignores_supplied_last_mention() {
        let json = r#"{
            "id": 1,
            "name": "x",
            "type": {"id": 2, "name": "Person"},
            "lastDiscordMention": "2024-05-01T10:00:00Z",
            "lastMention": "2030-01-01T00:00:00Z"
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(
            entity.last_mention(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_alias_without_mentions() {
        let json = r#"{"id": 3, "name": "$PENGU", "ignore": false}"#;
        let alias: EntityAlias = serde_json::from_str(json).unwrap();
        assert_eq!(alias.last_mention(), None);
        assert!(alias.is_untriaged());
    }

    #[test]
    fn test_alias_linked_entity() {
        let json = r#"{
            "id": 3,
            "name": "pengu",
            "entity": {"id": 7, "name": "Pudgy Penguins", "type": {"id": 1, "name": "Project"}},
            "lastTwitterMention": "2024-05-01T09:00:00Z",
            "mentionCount": 5
        }"#;
        let alias: EntityAlias = serde_json::from_str(json).unwrap();
        assert!(!alias.is_untriaged());
        assert_eq!(alias.entity.as_ref().unwrap().id, EntityId(7));
        assert_eq!(
            alias.last_mention(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_serialized_entity_reloads_identically() {
        let chat = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let entity = Entity::new(EntityId(9), "Milady", EntityType::new(1, "Project"))
            .with_mentions(Some(chat), None);
        let json = serde_json::to_string(&entity).unwrap();
        let reloaded: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, entity);
    }
}
