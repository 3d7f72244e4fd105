//! Session-scoped caches.
//!
//! Replaces the ad-hoc global store: every cached value has a typed slot
//! here and [`SessionStore::reset`] drops them all at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alphadesk_api::{AlphaApi, ApiError, ApiResult, RuleApi, TwitterAuthor};
use alphadesk_core::{ProjectRule, ProjectRuleUpdate, SwapRule, SwapRuleUpdate};
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Tweet author id to handle lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorHandles {
    by_id: HashMap<String, String>,
}

impl AuthorHandles {
    pub fn from_authors(authors: Vec<TwitterAuthor>) -> Self {
        Self {
            by_id: authors
                .into_iter()
                .map(|a| (a.author_id, a.handle))
                .collect(),
        }
    }

    pub fn handle(&self, author_id: &str) -> Option<&str> {
        self.by_id.get(author_id).map(String::as_str)
    }

    /// "@handle" when known, the raw id otherwise.
    pub fn display(&self, author_id: &str) -> String {
        match self.handle(author_id) {
            Some(handle) => format!("@{}", handle.trim_start_matches('@')),
            None => author_id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

type AuthorCell = Arc<OnceCell<Arc<AuthorHandles>>>;

/// Caches shared by every screen of one operator session.
#[derive(Default)]
pub struct SessionStore {
    authors: RwLock<AuthorCell>,
    swap_rules: DashMap<i64, SwapRule>,
    swap_loaded: AtomicBool,
    project_rules: DashMap<i64, ProjectRule>,
    project_loaded: AtomicBool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Author handles, fetched once per session.
    ///
    /// Concurrent callers share a single request. A failed load leaves the
    /// slot empty so the next call retries.
    pub async fn author_handles<A: AlphaApi + ?Sized>(
        &self,
        api: &A,
    ) -> ApiResult<Arc<AuthorHandles>> {
        let cell = self.authors.read().clone();
        let handles = cell
            .get_or_try_init(|| async {
                let authors = api.twitter_authors().await?;
                info!(count = authors.len(), "Loaded tweet author handles");
                Ok::<_, ApiError>(Arc::new(AuthorHandles::from_authors(authors)))
            })
            .await?;
        Ok(handles.clone())
    }

    /// Swap rules ordered by id; hits the backend only when not yet loaded
    /// or when `refresh` is set.
    pub async fn swap_rules<R: RuleApi + ?Sized>(
        &self,
        api: &R,
        refresh: bool,
    ) -> ApiResult<Vec<SwapRule>> {
        if refresh || !self.swap_loaded.load(Ordering::Acquire) {
            let rules = api.list_swap_rules().await?;
            debug!(count = rules.len(), "Loaded swap rules");
            self.swap_rules.clear();
            for rule in rules {
                self.swap_rules.insert(rule.id, rule);
            }
            self.swap_loaded.store(true, Ordering::Release);
        }
        Ok(sorted(&self.swap_rules))
    }

    /// Patch a swap rule and replace the cached copy with the server's.
    pub async fn update_swap_rule<R: RuleApi + ?Sized>(
        &self,
        api: &R,
        id: i64,
        update: SwapRuleUpdate,
    ) -> ApiResult<SwapRule> {
        let rule = api.update_swap_rule(id, update).await?;
        self.swap_rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    pub async fn project_rules<R: RuleApi + ?Sized>(
        &self,
        api: &R,
        refresh: bool,
    ) -> ApiResult<Vec<ProjectRule>> {
        if refresh || !self.project_loaded.load(Ordering::Acquire) {
            let rules = api.list_project_rules().await?;
            debug!(count = rules.len(), "Loaded project rules");
            self.project_rules.clear();
            for rule in rules {
                self.project_rules.insert(rule.id, rule);
            }
            self.project_loaded.store(true, Ordering::Release);
        }
        Ok(sorted(&self.project_rules))
    }

    pub async fn update_project_rule<R: RuleApi + ?Sized>(
        &self,
        api: &R,
        id: i64,
        update: ProjectRuleUpdate,
    ) -> ApiResult<ProjectRule> {
        let rule = api.update_project_rule(id, update).await?;
        self.project_rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    /// Forget everything (sign-out).
    pub fn reset(&self) {
        *self.authors.write() = AuthorCell::default();
        self.swap_rules.clear();
        self.swap_loaded.store(false, Ordering::Release);
        self.project_rules.clear();
        self.project_loaded.store(false, Ordering::Release);
        debug!("Session caches reset");
    }
}

fn sorted<T: Clone>(map: &DashMap<i64, T>) -> Vec<T> {
    let mut entries: Vec<(i64, T)> = map
        .iter()
        .map(|e| (*e.key(), e.value().clone()))
        .collect();
    entries.sort_by_key(|(id, _)| *id);
    entries.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphadesk_api::MockAlphaApi;
    use rust_decimal_macros::dec;

    fn author(id: &str, handle: &str) -> TwitterAuthor {
        TwitterAuthor {
            author_id: id.to_string(),
            handle: handle.to_string(),
        }
    }

    fn swap_rule(id: i64, symbol: &str) -> SwapRule {
        SwapRule {
            id,
            token_symbol: symbol.to_string(),
            token_address: format!("{symbol}-addr"),
            chain: "solana".to_string(),
            buy_threshold: Some(dec!(0.5)),
            sell_threshold: Some(dec!(2)),
            trade_amount: dec!(100),
            slippage_bps: 50,
            enabled: true,
            updated_at: None,
        }
    }

    fn project_rule(id: i64, slug: &str) -> ProjectRule {
        ProjectRule {
            id,
            collection_slug: slug.to_string(),
            collection_name: None,
            floor_below: Some(dec!(5)),
            floor_above: None,
            enabled: true,
            updated_at: None,
        }
    }

    #[test]
    fn test_author_display() {
        let handles = AuthorHandles::from_authors(vec![author("44", "pudgy"), author("45", "@wif")]);
        assert_eq!(handles.display("44"), "@pudgy");
        assert_eq!(handles.display("45"), "@wif");
        assert_eq!(handles.display("99"), "99");
        assert_eq!(handles.len(), 2);
    }

    #[tokio::test]
    async fn test_author_handles_loaded_once() {
        let api = MockAlphaApi::new().with_authors(vec![author("44", "pudgy")]);
        let store = SessionStore::new();

        let (a, b) = tokio::join!(store.author_handles(&api), store.author_handles(&api));
        let c = store.author_handles(&api).await.unwrap();

        assert_eq!(a.unwrap().display("44"), "@pudgy");
        assert_eq!(b.unwrap().len(), 1);
        assert_eq!(c.len(), 1);
        assert_eq!(api.author_calls(), 1);
    }

    #[tokio::test]
    async fn test_author_handles_retry_after_failure() {
        let api = MockAlphaApi::new().with_authors(vec![author("44", "pudgy")]);
        api.fail_next(ApiError::Transport("reset".to_string()));
        let store = SessionStore::new();

        tokio_test::assert_err!(store.author_handles(&api).await);
        let handles = tokio_test::assert_ok!(store.author_handles(&api).await);
        assert_eq!(handles.len(), 1);
        assert_eq!(api.author_calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_forgets_authors() {
        let api = MockAlphaApi::new().with_authors(vec![author("44", "pudgy")]);
        let store = SessionStore::new();

        store.author_handles(&api).await.unwrap();
        store.reset();
        store.author_handles(&api).await.unwrap();

        assert_eq!(api.author_calls(), 2);
    }

    #[tokio::test]
    async fn test_swap_rules_served_from_cache() {
        let api = MockAlphaApi::new().with_swap_rules(vec![swap_rule(2, "WIF"), swap_rule(1, "PENGU")]);
        let store = SessionStore::new();

        let rules = store.swap_rules(&api, false).await.unwrap();
        assert_eq!(rules.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        // Cached: the armed failure is not consumed.
        api.fail_next(ApiError::Transport("down".to_string()));
        assert_eq!(store.swap_rules(&api, false).await.unwrap().len(), 2);
        assert!(store.swap_rules(&api, true).await.is_err());
    }

    #[tokio::test]
    async fn test_update_replaces_cached_rule() {
        let api = MockAlphaApi::new().with_swap_rules(vec![swap_rule(1, "PENGU")]);
        let store = SessionStore::new();
        store.swap_rules(&api, false).await.unwrap();

        let update = SwapRuleUpdate {
            enabled: Some(false),
            ..Default::default()
        };
        let updated = store.update_swap_rule(&api, 1, update).await.unwrap();

        assert!(!updated.enabled);
        assert_eq!(store.swap_rules(&api, false).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cached_rule() {
        let api = MockAlphaApi::new().with_project_rules(vec![project_rule(3, "pudgypenguins")]);
        let store = SessionStore::new();
        let before = store.project_rules(&api, false).await.unwrap();

        let update = ProjectRuleUpdate {
            floor_below: Some(dec!(10)),
            floor_above: Some(dec!(8)),
            ..Default::default()
        };
        assert!(store.update_project_rule(&api, 3, update).await.is_err());
        assert_eq!(store.project_rules(&api, false).await.unwrap(), before);
    }
}
