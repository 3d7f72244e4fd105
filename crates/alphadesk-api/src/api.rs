//! Backend seams.
//!
//! Object-safe async traits over the REST endpoints. [`crate::ApiClient`]
//! implements both against HTTP; tests substitute in-memory implementations.

use std::future::Future;
use std::pin::Pin;

use alphadesk_core::{
    AliasUpdate, Entity, EntityAlias, EntityDraft, EntityId, EntityType, EntityUpdate, Message,
    ProjectRule, ProjectRuleUpdate, SwapRule, SwapRuleUpdate, Tweet,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::query::{AliasQuery, EntityQuery, MessageQuery, TweetQuery};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Configured tweet author (id → handle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterAuthor {
    pub author_id: String,
    pub handle: String,
}

/// Alpha tagging endpoints.
pub trait AlphaApi: Send + Sync {
    fn search_entities(&self, query: EntityQuery) -> BoxFuture<'_, ApiResult<Vec<Entity>>>;

    fn create_entity(&self, draft: EntityDraft) -> BoxFuture<'_, ApiResult<Entity>>;

    fn update_entity(
        &self,
        id: EntityId,
        update: EntityUpdate,
    ) -> BoxFuture<'_, ApiResult<Entity>>;

    fn list_entity_types(&self) -> BoxFuture<'_, ApiResult<Vec<EntityType>>>;

    fn search_aliases(&self, query: AliasQuery) -> BoxFuture<'_, ApiResult<Vec<EntityAlias>>>;

    fn update_alias(
        &self,
        id: i64,
        update: AliasUpdate,
    ) -> BoxFuture<'_, ApiResult<EntityAlias>>;

    fn search_messages(&self, query: MessageQuery) -> BoxFuture<'_, ApiResult<Vec<Message>>>;

    fn search_tweets(&self, query: TweetQuery) -> BoxFuture<'_, ApiResult<Vec<Tweet>>>;

    fn twitter_authors(&self) -> BoxFuture<'_, ApiResult<Vec<TwitterAuthor>>>;
}

/// Trading and floor-price rule endpoints.
pub trait RuleApi: Send + Sync {
    fn list_swap_rules(&self) -> BoxFuture<'_, ApiResult<Vec<SwapRule>>>;

    fn update_swap_rule(
        &self,
        id: i64,
        update: SwapRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<SwapRule>>;

    fn list_project_rules(&self) -> BoxFuture<'_, ApiResult<Vec<ProjectRule>>>;

    fn update_project_rule(
        &self,
        id: i64,
        update: ProjectRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<ProjectRule>>;
}
