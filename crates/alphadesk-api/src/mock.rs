//! In-memory backend for tests.
//!
//! Answers queries from seeded records with the same filtering, ordering and
//! paging rules as the real endpoints. Entity filters match records tagged
//! with any alias linked to the entity. Message fetches can be held open to
//! exercise in-flight behaviour, and the next call (or every message search
//! in a channel, or every author load) can be made to fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alphadesk_core::{
    AliasUpdate, ChannelId, Entity, EntityAlias, EntityDraft, EntityId, EntityRef, EntityType, EntityUpdate,
    Message, ProjectRule, ProjectRuleUpdate, SwapRule, SwapRuleUpdate, Tweet,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{AlphaApi, BoxFuture, RuleApi, TwitterAuthor};
use crate::error::{ApiError, ApiResult};
use crate::query::{
    AliasQuery, EntityQuery, MessageQuery, OrderDirection, Page, TimeBounds, TweetQuery,
};

#[derive(Default)]
struct Records {
    entities: Vec<Entity>,
    entity_types: Vec<EntityType>,
    aliases: Vec<EntityAlias>,
    messages: Vec<Message>,
    tweets: Vec<Tweet>,
    authors: Vec<TwitterAuthor>,
    swap_rules: Vec<SwapRule>,
    project_rules: Vec<ProjectRule>,
}

/// In-memory [`AlphaApi`] and [`RuleApi`].
#[derive(Default)]
pub struct MockAlphaApi {
    records: Mutex<Records>,
    fail_next: Mutex<Option<ApiError>>,
    failing_channels: Mutex<Vec<ChannelId>>,
    authors_down: Mutex<Option<(u16, String)>>,
    hold_messages: AtomicBool,
    started: Notify,
    release: Notify,
    message_calls: AtomicUsize,
    author_calls: AtomicUsize,
    last_message_query: Mutex<Option<MessageQuery>>,
}

fn in_bounds(ts: alphadesk_core::Timestamp, bounds: &TimeBounds) -> bool {
    bounds.from.map_or(true, |from| ts > from) && bounds.to.map_or(true, |to| ts < to)
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

fn overlaps(a: &[i64], b: &[i64]) -> bool {
    a.is_empty() || a.iter().any(|id| b.contains(id))
}

/// Ids of aliases linked to one of `entity_ids`, or `None` for no filter.
fn linked_aliases(aliases: &[EntityAlias], entity_ids: &[EntityId]) -> Option<Vec<i64>> {
    if entity_ids.is_empty() {
        return None;
    }
    Some(
        aliases
            .iter()
            .filter(|a| a.entity.as_ref().is_some_and(|e| entity_ids.contains(&e.id)))
            .map(|a| a.id)
            .collect(),
    )
}

fn mentions_entity(linked: &Option<Vec<i64>>, alias_ids: &[i64]) -> bool {
    linked
        .as_ref()
        .map_or(true, |linked| alias_ids.iter().any(|id| linked.contains(id)))
}

impl MockAlphaApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        self.records.lock().messages.extend(messages);
        self
    }

    pub fn with_tweets(self, tweets: Vec<Tweet>) -> Self {
        self.records.lock().tweets.extend(tweets);
        self
    }

    pub fn with_entities(self, entities: Vec<Entity>) -> Self {
        let mut records = self.records.lock();
        for entity in &entities {
            if !records.entity_types.contains(&entity.entity_type) {
                records.entity_types.push(entity.entity_type.clone());
            }
        }
        records.entities.extend(entities);
        drop(records);
        self
    }

    pub fn with_aliases(self, aliases: Vec<EntityAlias>) -> Self {
        self.records.lock().aliases.extend(aliases);
        self
    }

    pub fn with_authors(self, authors: Vec<TwitterAuthor>) -> Self {
        self.records.lock().authors.extend(authors);
        self
    }

    pub fn with_swap_rules(self, rules: Vec<SwapRule>) -> Self {
        self.records.lock().swap_rules.extend(rules);
        self
    }

    pub fn with_project_rules(self, rules: Vec<ProjectRule>) -> Self {
        self.records.lock().project_rules.extend(rules);
        self
    }

    /// Add messages after construction (e.g. new chat activity).
    pub fn push_messages(&self, messages: Vec<Message>) {
        self.records.lock().messages.extend(messages);
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Fail every message search restricted to `channel` with HTTP 500.
    pub fn fail_channel(&self, channel: ChannelId) {
        self.failing_channels.lock().push(channel);
    }

    /// Fail every author load with `status` and `message` until
    /// [`MockAlphaApi::restore_authors`].
    pub fn authors_down(&self, status: u16, message: &str) {
        *self.authors_down.lock() = Some((status, message.to_string()));
    }

    pub fn restore_authors(&self) {
        *self.authors_down.lock() = None;
    }

    /// Hold message searches open until [`MockAlphaApi::release`].
    pub fn hold_messages(&self) {
        self.hold_messages.store(true, Ordering::SeqCst);
    }

    /// Wait until a held message search has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let a held message search complete.
    pub fn release(&self) {
        self.hold_messages.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::SeqCst)
    }

    pub fn author_calls(&self) -> usize {
        self.author_calls.load(Ordering::SeqCst)
    }

    pub fn last_message_query(&self) -> Option<MessageQuery> {
        self.last_message_query.lock().clone()
    }

    pub fn alias(&self, id: i64) -> Option<EntityAlias> {
        self.records.lock().aliases.iter().find(|a| a.id == id).cloned()
    }

    fn take_failure(&self) -> ApiResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(what: &str, id: impl std::fmt::Display) -> ApiError {
        ApiError::Status {
            status: 404,
            message: Some(format!("{what} {id} not found")),
        }
    }

    fn channel_failure(&self, query: &MessageQuery) -> ApiResult<()> {
        let failing = self.failing_channels.lock();
        if query.channel_ids.iter().any(|c| failing.contains(c)) {
            return Err(ApiError::Status {
                status: 500,
                message: None,
            });
        }
        Ok(())
    }

    fn query_messages(&self, query: &MessageQuery) -> Vec<Message> {
        let records = self.records.lock();
        let linked = linked_aliases(&records.aliases, &query.entity_ids);
        let mut found: Vec<Message> = records
            .messages
            .iter()
            .filter(|m| query.channel_ids.is_empty() || query.channel_ids.contains(&m.channel_id))
            .filter(|m| overlaps(&query.alias_ids, &m.alias_ids))
            .filter(|m| mentions_entity(&linked, &m.alias_ids))
            .filter(|m| in_bounds(m.created_at, &query.bounds))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.sort_key());
        if query.direction == OrderDirection::Desc {
            found.reverse();
        }
        paginate(found, query.page)
    }
}

impl AlphaApi for MockAlphaApi {
    fn search_entities(&self, query: EntityQuery) -> BoxFuture<'_, ApiResult<Vec<Entity>>> {
        Box::pin(async move {
            self.take_failure()?;
            let records = self.records.lock();
            let found: Vec<Entity> = records
                .entities
                .iter()
                .filter(|e| query.id.map_or(true, |id| e.id == id))
                .filter(|e| {
                    query.search.as_ref().map_or(true, |s| {
                        e.name.to_lowercase().contains(&s.to_lowercase())
                    })
                })
                .filter(|e| query.min_mentions.map_or(true, |min| e.mention_count >= min))
                .filter(|e| query.max_mentions.map_or(true, |max| e.mention_count <= max))
                .cloned()
                .collect();
            Ok(paginate(found, query.page))
        })
    }

    fn create_entity(&self, draft: EntityDraft) -> BoxFuture<'_, ApiResult<Entity>> {
        Box::pin(async move {
            self.take_failure()?;
            draft.validate()?;
            let mut records = self.records.lock();
            let entity_type = match (draft.type_id, draft.new_type) {
                (Some(type_id), _) => records
                    .entity_types
                    .iter()
                    .find(|t| t.id == type_id)
                    .cloned()
                    .ok_or_else(|| Self::not_found("type", type_id))?,
                (None, Some(name)) => {
                    let next_id = records.entity_types.iter().map(|t| t.id).max().unwrap_or(0) + 1;
                    let created = EntityType::new(next_id, name);
                    records.entity_types.push(created.clone());
                    created
                }
                (None, None) => {
                    return Err(ApiError::Status {
                        status: 400,
                        message: Some("type is required".to_string()),
                    })
                }
            };
            let next_id = records.entities.iter().map(|e| e.id.0).max().unwrap_or(0) + 1;
            let mut entity = Entity::new(EntityId(next_id), draft.name, entity_type);
            entity.project_id = draft.project_id;
            entity.profile_url = draft.profile_url;
            entity.twitter_handle = draft.twitter_handle;
            records.entities.push(entity.clone());
            Ok(entity)
        })
    }

    fn update_entity(
        &self,
        id: EntityId,
        update: EntityUpdate,
    ) -> BoxFuture<'_, ApiResult<Entity>> {
        Box::pin(async move {
            self.take_failure()?;
            update.validate()?;
            let mut records = self.records.lock();
            let type_by_id = update
                .type_id
                .and_then(|tid| records.entity_types.iter().find(|t| t.id == tid).cloned());
            let entity = records
                .entities
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Self::not_found("entity", id))?;
            if let Some(name) = update.name {
                entity.name = name;
            }
            if let Some(t) = type_by_id {
                entity.entity_type = t;
            }
            if update.project_id.is_some() {
                entity.project_id = update.project_id;
            }
            if update.profile_url.is_some() {
                entity.profile_url = update.profile_url;
            }
            if update.twitter_handle.is_some() {
                entity.twitter_handle = update.twitter_handle;
            }
            Ok(entity.clone())
        })
    }

    fn list_entity_types(&self) -> BoxFuture<'_, ApiResult<Vec<EntityType>>> {
        Box::pin(async move {
            self.take_failure()?;
            Ok(self.records.lock().entity_types.clone())
        })
    }

    fn search_aliases(&self, query: AliasQuery) -> BoxFuture<'_, ApiResult<Vec<EntityAlias>>> {
        Box::pin(async move {
            self.take_failure()?;
            let records = self.records.lock();
            let found: Vec<EntityAlias> = records
                .aliases
                .iter()
                .filter(|a| query.ignore.map_or(true, |ignore| a.ignore == ignore))
                .filter(|a| {
                    query.search.as_ref().map_or(true, |s| {
                        a.name.to_lowercase().contains(&s.to_lowercase())
                    })
                })
                .filter(|a| {
                    query.entity_type.as_ref().map_or(true, |t| {
                        a.entity
                            .as_ref()
                            .and_then(|e| e.entity_type.as_ref())
                            .is_some_and(|et| &et.name == t)
                    })
                })
                .cloned()
                .collect();
            Ok(paginate(found, query.page))
        })
    }

    fn update_alias(
        &self,
        id: i64,
        update: AliasUpdate,
    ) -> BoxFuture<'_, ApiResult<EntityAlias>> {
        Box::pin(async move {
            self.take_failure()?;
            update.validate()?;
            let mut records = self.records.lock();
            let linked = match update {
                AliasUpdate::Link {
                    entity_id: Some(entity_id),
                } => Some(
                    records
                        .entities
                        .iter()
                        .find(|e| e.id == entity_id)
                        .map(|e| EntityRef {
                            id: e.id,
                            name: e.name.clone(),
                            entity_type: Some(e.entity_type.clone()),
                        })
                        .ok_or_else(|| Self::not_found("entity", entity_id))?,
                ),
                _ => None,
            };
            let alias = records
                .aliases
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| Self::not_found("alias", id))?;
            match update {
                AliasUpdate::SetIgnore { ignore } => alias.ignore = ignore,
                AliasUpdate::Link { .. } => alias.entity = linked,
            }
            Ok(alias.clone())
        })
    }

    fn search_messages(&self, query: MessageQuery) -> BoxFuture<'_, ApiResult<Vec<Message>>> {
        Box::pin(async move {
            self.message_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_message_query.lock() = Some(query.clone());
            if self.hold_messages.load(Ordering::SeqCst) {
                self.started.notify_one();
                self.release.notified().await;
            }
            self.take_failure()?;
            self.channel_failure(&query)?;
            Ok(self.query_messages(&query))
        })
    }

    fn search_tweets(&self, query: TweetQuery) -> BoxFuture<'_, ApiResult<Vec<Tweet>>> {
        Box::pin(async move {
            self.take_failure()?;
            let records = self.records.lock();
            let linked = linked_aliases(&records.aliases, &query.entity_ids);
            let mut found: Vec<Tweet> = records
                .tweets
                .iter()
                .filter(|t| query.author_ids.is_empty() || query.author_ids.contains(&t.author_id))
                .filter(|t| overlaps(&query.alias_ids, &t.alias_ids))
                .filter(|t| mentions_entity(&linked, &t.alias_ids))
                .filter(|t| in_bounds(t.created_at, &query.bounds))
                .cloned()
                .collect();
            found.sort_by_key(|t| t.created_at);
            if query.direction == OrderDirection::Desc {
                found.reverse();
            }
            Ok(paginate(found, query.page))
        })
    }

    fn twitter_authors(&self) -> BoxFuture<'_, ApiResult<Vec<TwitterAuthor>>> {
        Box::pin(async move {
            self.author_calls.fetch_add(1, Ordering::SeqCst);
            self.take_failure()?;
            if let Some((status, message)) = self.authors_down.lock().clone() {
                return Err(ApiError::Status {
                    status,
                    message: Some(message),
                });
            }
            Ok(self.records.lock().authors.clone())
        })
    }
}

impl RuleApi for MockAlphaApi {
    fn list_swap_rules(&self) -> BoxFuture<'_, ApiResult<Vec<SwapRule>>> {
        Box::pin(async move {
            self.take_failure()?;
            Ok(self.records.lock().swap_rules.clone())
        })
    }

    fn update_swap_rule(
        &self,
        id: i64,
        update: SwapRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<SwapRule>> {
        Box::pin(async move {
            self.take_failure()?;
            update.validate()?;
            let mut records = self.records.lock();
            let rule = records
                .swap_rules
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| Self::not_found("swap rule", id))?;
            if update.buy_threshold.is_some() {
                rule.buy_threshold = update.buy_threshold;
            }
            if update.sell_threshold.is_some() {
                rule.sell_threshold = update.sell_threshold;
            }
            if let Some(amount) = update.trade_amount {
                rule.trade_amount = amount;
            }
            if let Some(bps) = update.slippage_bps {
                rule.slippage_bps = bps;
            }
            if let Some(enabled) = update.enabled {
                rule.enabled = enabled;
            }
            Ok(rule.clone())
        })
    }

    fn list_project_rules(&self) -> BoxFuture<'_, ApiResult<Vec<ProjectRule>>> {
        Box::pin(async move {
            self.take_failure()?;
            Ok(self.records.lock().project_rules.clone())
        })
    }

    fn update_project_rule(
        &self,
        id: i64,
        update: ProjectRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<ProjectRule>> {
        Box::pin(async move {
            self.take_failure()?;
            update.validate()?;
            let mut records = self.records.lock();
            let rule = records
                .project_rules
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| Self::not_found("project rule", id))?;
            if update.floor_below.is_some() {
                rule.floor_below = update.floor_below;
            }
            if update.floor_above.is_some() {
                rule.floor_above = update.floor_above;
            }
            if let Some(enabled) = update.enabled {
                rule.enabled = enabled;
            }
            Ok(rule.clone())
        })
    }
}
