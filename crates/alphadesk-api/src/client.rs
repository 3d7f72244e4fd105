//! HTTP implementation of the backend seams.

use std::time::{Duration, Instant};

use alphadesk_core::{
    AliasUpdate, Entity, EntityAlias, EntityDraft, EntityId, EntityType, EntityUpdate, Message,
    ProjectRule, ProjectRuleUpdate, SwapRule, SwapRuleUpdate, Tweet,
};
use alphadesk_telemetry::Metrics;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{AlphaApi, BoxFuture, RuleApi, TwitterAuthor};
use crate::error::{ApiError, ApiResult};
use crate::query::{AliasQuery, EntityQuery, MessageQuery, QueryPairs, TweetQuery};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root, e.g. "https://alpha.example.com/api".
    pub base_url: String,
    /// Bearer token sent on every request.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// REST client for the alpha and rule endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::InvalidConfig("base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &QueryPairs,
    ) -> ApiResult<T> {
        let builder = self.request(Method::GET, path).query(query);
        self.execute(endpoint, builder).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(method, path).json(body);
        self.execute(endpoint, builder).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let started = Instant::now();
        let result = Self::execute_inner(builder).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => {
                debug!(endpoint, elapsed_ms, "API request succeeded");
                Metrics::api_request(endpoint, "ok", elapsed_ms);
            }
            Err(e) => {
                warn!(endpoint, elapsed_ms, error = %e, "API request failed");
                Metrics::api_request(endpoint, e.outcome_label(), elapsed_ms);
            }
        }
        result
    }

    async fn execute_inner<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message.or(b.error))
                .filter(|m| !m.is_empty());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl AlphaApi for ApiClient {
    fn search_entities(&self, query: EntityQuery) -> BoxFuture<'_, ApiResult<Vec<Entity>>> {
        Box::pin(async move {
            self.get("entities.search", "/alpha/entities", &query.to_pairs())
                .await
        })
    }

    fn create_entity(&self, draft: EntityDraft) -> BoxFuture<'_, ApiResult<Entity>> {
        Box::pin(async move {
            draft.validate()?;
            self.send_json("entities.create", Method::POST, "/alpha/entities", &draft)
                .await
        })
    }

    fn update_entity(
        &self,
        id: EntityId,
        update: EntityUpdate,
    ) -> BoxFuture<'_, ApiResult<Entity>> {
        Box::pin(async move {
            update.validate()?;
            let path = format!("/alpha/entities/{id}");
            self.send_json("entities.update", Method::PATCH, &path, &update)
                .await
        })
    }

    fn list_entity_types(&self) -> BoxFuture<'_, ApiResult<Vec<EntityType>>> {
        Box::pin(async move {
            self.get("entity_types.list", "/alpha/entity-types", &QueryPairs::new())
                .await
        })
    }

    fn search_aliases(&self, query: AliasQuery) -> BoxFuture<'_, ApiResult<Vec<EntityAlias>>> {
        Box::pin(async move {
            self.get("aliases.search", "/alpha/aliases", &query.to_pairs())
                .await
        })
    }

    fn update_alias(
        &self,
        id: i64,
        update: AliasUpdate,
    ) -> BoxFuture<'_, ApiResult<EntityAlias>> {
        Box::pin(async move {
            update.validate()?;
            let path = format!("/alpha/aliases/{id}");
            self.send_json("aliases.update", Method::PATCH, &path, &update)
                .await
        })
    }

    fn search_messages(&self, query: MessageQuery) -> BoxFuture<'_, ApiResult<Vec<Message>>> {
        Box::pin(async move {
            self.get("messages.search", "/alpha/messages", &query.to_pairs())
                .await
        })
    }

    fn search_tweets(&self, query: TweetQuery) -> BoxFuture<'_, ApiResult<Vec<Tweet>>> {
        Box::pin(async move {
            self.get("tweets.search", "/alpha/tweets", &query.to_pairs())
                .await
        })
    }

    fn twitter_authors(&self) -> BoxFuture<'_, ApiResult<Vec<TwitterAuthor>>> {
        Box::pin(async move {
            self.get(
                "twitter_authors.list",
                "/alpha/config/twitter-authors",
                &QueryPairs::new(),
            )
            .await
        })
    }
}

impl RuleApi for ApiClient {
    fn list_swap_rules(&self) -> BoxFuture<'_, ApiResult<Vec<SwapRule>>> {
        Box::pin(async move { self.get("swap_rules.list", "/rules/swap", &QueryPairs::new()).await })
    }

    fn update_swap_rule(
        &self,
        id: i64,
        update: SwapRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<SwapRule>> {
        Box::pin(async move {
            update.validate()?;
            let path = format!("/rules/swap/{id}");
            self.send_json("swap_rules.update", Method::PATCH, &path, &update)
                .await
        })
    }

    fn list_project_rules(&self) -> BoxFuture<'_, ApiResult<Vec<ProjectRule>>> {
        Box::pin(async move {
            self.get("project_rules.list", "/rules/project", &QueryPairs::new())
                .await
        })
    }

    fn update_project_rule(
        &self,
        id: i64,
        update: ProjectRuleUpdate,
    ) -> BoxFuture<'_, ApiResult<ProjectRule>> {
        Box::pin(async move {
            update.validate()?;
            let path = format!("/rules/project/{id}");
            self.send_json("project_rules.update", Method::PATCH, &path, &update)
                .await
        })
    }
}
