//! Search query builders.
//!
//! Each query renders to camelCase URL query pairs. Id lists are comma
//! separated; time bounds are exclusive ISO-8601 timestamps.

use alphadesk_core::time_range::to_iso;
use alphadesk_core::{ChannelId, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Query pairs ready for `reqwest::RequestBuilder::query`.
pub type QueryPairs = Vec<(&'static str, String)>;

/// Pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The page following this one.
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }

    fn push(&self, pairs: &mut QueryPairs) {
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// Sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBy {
    Mentions,
    Timestamp,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mentions => "MENTIONS",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Exclusive time window: strictly after `from`, strictly before `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBounds {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TimeBounds {
    pub fn since(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn before(to: Timestamp) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    fn push(&self, pairs: &mut QueryPairs) {
        if let Some(from) = self.from {
            pairs.push(("from", to_iso(from)));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to_iso(to)));
        }
    }
}

fn push_list<T: ToString>(pairs: &mut QueryPairs, key: &'static str, values: &[T]) {
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    pairs.push((key, joined));
}

fn push_opt<T: ToString>(pairs: &mut QueryPairs, key: &'static str, value: &Option<T>) {
    if let Some(v) = value {
        pairs.push((key, v.to_string()));
    }
}

/// Entity search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    pub search: Option<String>,
    pub id: Option<EntityId>,
    pub min_mentions: Option<u64>,
    pub max_mentions: Option<u64>,
    pub bounds: TimeBounds,
    pub page: Page,
    pub order_by: Option<OrderBy>,
    pub direction: OrderDirection,
}

impl EntityQuery {
    /// Free-text search; a purely numeric term is treated as an id lookup.
    pub fn search(term: &str) -> Self {
        let term = term.trim();
        match term.parse::<i64>() {
            Ok(id) => Self {
                id: Some(EntityId(id)),
                ..Default::default()
            },
            Err(_) if term.is_empty() => Self::default(),
            Err(_) => Self {
                search: Some(term.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_opt(&mut pairs, "search", &self.search);
        push_opt(&mut pairs, "id", &self.id);
        push_opt(&mut pairs, "minMentions", &self.min_mentions);
        push_opt(&mut pairs, "maxMentions", &self.max_mentions);
        self.bounds.push(&mut pairs);
        self.page.push(&mut pairs);
        if let Some(order_by) = self.order_by {
            pairs.push(("orderBy", order_by.as_str().to_string()));
            pairs.push(("orderDirection", self.direction.as_str().to_string()));
        }
        pairs
    }
}

/// Alias search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasQuery {
    pub search: Option<String>,
    /// Only aliases linked to an entity of this type.
    pub entity_type: Option<String>,
    pub ignore: Option<bool>,
    pub min_mentions: Option<u64>,
    pub max_mentions: Option<u64>,
    pub bounds: TimeBounds,
    pub page: Page,
    pub order_by: Option<OrderBy>,
    pub direction: OrderDirection,
}

impl AliasQuery {
    /// Aliases still waiting for triage, busiest first.
    pub fn untriaged() -> Self {
        Self {
            ignore: Some(false),
            order_by: Some(OrderBy::Mentions),
            direction: OrderDirection::Desc,
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_opt(&mut pairs, "search", &self.search);
        push_opt(&mut pairs, "entityType", &self.entity_type);
        push_opt(&mut pairs, "ignore", &self.ignore);
        push_opt(&mut pairs, "minMentions", &self.min_mentions);
        push_opt(&mut pairs, "maxMentions", &self.max_mentions);
        self.bounds.push(&mut pairs);
        self.page.push(&mut pairs);
        if let Some(order_by) = self.order_by {
            pairs.push(("orderBy", order_by.as_str().to_string()));
            pairs.push(("orderDirection", self.direction.as_str().to_string()));
        }
        pairs
    }
}

/// Chat message search, always ordered by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub alias_ids: Vec<i64>,
    pub entity_ids: Vec<EntityId>,
    pub channel_ids: Vec<ChannelId>,
    pub bounds: TimeBounds,
    pub page: Page,
    pub direction: OrderDirection,
}

impl MessageQuery {
    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_list(&mut pairs, "aliasIds", &self.alias_ids);
        push_list(&mut pairs, "entityIds", &self.entity_ids);
        push_list(&mut pairs, "channelIds", &self.channel_ids);
        self.bounds.push(&mut pairs);
        self.page.push(&mut pairs);
        pairs.push(("orderBy", OrderBy::Timestamp.as_str().to_string()));
        pairs.push(("orderDirection", self.direction.as_str().to_string()));
        pairs
    }
}

/// Tweet search, always ordered by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TweetQuery {
    pub alias_ids: Vec<i64>,
    pub entity_ids: Vec<EntityId>,
    pub author_ids: Vec<String>,
    pub bounds: TimeBounds,
    pub page: Page,
    pub direction: OrderDirection,
}

impl TweetQuery {
    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_list(&mut pairs, "aliasIds", &self.alias_ids);
        push_list(&mut pairs, "entityIds", &self.entity_ids);
        push_list(&mut pairs, "authorIds", &self.author_ids);
        self.bounds.push(&mut pairs);
        self.page.push(&mut pairs);
        pairs.push(("orderBy", OrderBy::Timestamp.as_str().to_string()));
        pairs.push(("orderDirection", self.direction.as_str().to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn value<'a>(pairs: &'a QueryPairs, key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_numeric_search_becomes_id() {
        let q = EntityQuery::search(" 42 ");
        assert_eq!(q.id, Some(EntityId(42)));
        assert_eq!(q.search, None);

        let q = EntityQuery::search("pengu");
        assert_eq!(q.search.as_deref(), Some("pengu"));

        assert_eq!(EntityQuery::search("  "), EntityQuery::default());
    }

    #[test]
    fn test_entity_query_pairs() {
        let q = EntityQuery {
            search: Some("pengu".to_string()),
            min_mentions: Some(5),
            bounds: TimeBounds::since(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            order_by: Some(OrderBy::Mentions),
            direction: OrderDirection::Desc,
            ..Default::default()
        };
        let pairs = q.to_pairs();
        assert_eq!(value(&pairs, "search"), Some("pengu"));
        assert_eq!(value(&pairs, "minMentions"), Some("5"));
        assert_eq!(value(&pairs, "maxMentions"), None);
        assert_eq!(value(&pairs, "from"), Some("2024-05-01T00:00:00.000Z"));
        assert_eq!(value(&pairs, "limit"), Some("50"));
        assert_eq!(value(&pairs, "offset"), Some("0"));
        assert_eq!(value(&pairs, "orderBy"), Some("MENTIONS"));
        assert_eq!(value(&pairs, "orderDirection"), Some("DESC"));
    }

    #[test]
    fn test_message_query_lists_are_comma_joined() {
        let q = MessageQuery {
            alias_ids: vec![3, 4],
            channel_ids: vec![ChannelId::new("c1")],
            direction: OrderDirection::Asc,
            ..Default::default()
        };
        let pairs = q.to_pairs();
        assert_eq!(value(&pairs, "aliasIds"), Some("3,4"));
        assert_eq!(value(&pairs, "channelIds"), Some("c1"));
        assert_eq!(value(&pairs, "entityIds"), None);
        assert_eq!(value(&pairs, "orderBy"), Some("TIMESTAMP"));
        assert_eq!(value(&pairs, "orderDirection"), Some("ASC"));
    }

    #[test]
    fn test_untriaged_alias_query() {
        let pairs = AliasQuery::untriaged().to_pairs();
        assert_eq!(value(&pairs, "ignore"), Some("false"));
        assert_eq!(value(&pairs, "orderBy"), Some("MENTIONS"));
    }

    #[test]
    fn test_page_next() {
        let page = Page::new(20, 40);
        assert_eq!(page.next(), Page::new(20, 60));
    }

    #[test]
    fn test_page_next_saturates() {
        let page = Page::new(50, u32::MAX - 10);
        assert_eq!(page.next(), Page::new(50, u32::MAX));
    }
}
