//! Message branch assembly.
//!
//! Loads feed roots (messages and tweets) for a filter and lets the operator
//! pull chronological neighbours into each root's branch. State sits behind a
//! mutex that is never held across a request; each request remembers the view
//! generation it started in, and results arriving after the view was reloaded
//! or closed are dropped.

use std::sync::Arc;

use alphadesk_api::{AlphaApi, MessageQuery, OrderDirection, Page, TimeBounds, TweetQuery};
use alphadesk_core::{sort_roots_desc, EntityId, FeedItem, FeedItemKey, RelativeRange, Timestamp};
use alphadesk_telemetry::Metrics;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::branch::{Direction, ExpandOutcome, MessageBranch};
use crate::error::{ViewerError, ViewerResult};
use crate::notify::Notifier;

/// Neighbours fetched per request.
pub const PAGE_SIZE: u32 = 5;

/// Which mentions to load as roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub alias_ids: Vec<i64>,
    pub entity_ids: Vec<EntityId>,
    pub range: RelativeRange,
    /// Maximum roots per source.
    pub limit: u32,
}

impl FeedFilter {
    pub fn for_alias(alias_id: i64, range: RelativeRange) -> Self {
        Self {
            alias_ids: vec![alias_id],
            entity_ids: Vec::new(),
            range,
            limit: Page::DEFAULT_LIMIT,
        }
    }

    pub fn for_entity(entity_id: EntityId, range: RelativeRange) -> Self {
        Self {
            alias_ids: Vec::new(),
            entity_ids: vec![entity_id],
            range,
            limit: Page::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    generation: u64,
    loading: bool,
    branches: Vec<MessageBranch>,
}

impl ViewState {
    fn branch_mut(&mut self, key: &FeedItemKey) -> Option<&mut MessageBranch> {
        self.branches.iter_mut().find(|b| &b.key() == key)
    }
}

#[derive(Clone, Copy)]
enum FetchMode {
    /// Reuse an earlier fetch in the same direction if there is one.
    Expand,
    /// Always fetch the next page.
    More,
}

/// Builds and expands message branches for one view.
pub struct BranchAssembler<A: AlphaApi + ?Sized> {
    api: Arc<A>,
    notifier: Notifier,
    page_size: u32,
    state: Mutex<ViewState>,
}

impl<A: AlphaApi + ?Sized> BranchAssembler<A> {
    pub fn new(api: Arc<A>, notifier: Notifier) -> Self {
        Self::with_page_size(api, notifier, PAGE_SIZE)
    }

    pub fn with_page_size(api: Arc<A>, notifier: Notifier, page_size: u32) -> Self {
        Self {
            api,
            notifier,
            page_size: page_size.max(1),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Snapshot of every branch in display order.
    pub fn branches(&self) -> Vec<MessageBranch> {
        self.state.lock().branches.clone()
    }

    pub fn branch(&self, key: &FeedItemKey) -> Option<MessageBranch> {
        self.state
            .lock()
            .branches
            .iter()
            .find(|b| &b.key() == key)
            .cloned()
    }

    /// A root load is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Replace all branches with new roots, most recent first.
    ///
    /// In-flight fetches for the previous roots are discarded on arrival.
    pub fn replace_roots(&self, mut roots: Vec<FeedItem>) {
        sort_roots_desc(&mut roots);
        let mut state = self.state.lock();
        state.generation += 1;
        state.loading = false;
        state.branches = roots.into_iter().map(MessageBranch::new).collect();
    }

    /// Close the view: drop all branches and discard pending results.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.loading = false;
        state.branches.clear();
        debug!(generation = state.generation, "Message view closed");
    }

    /// Load roots for `filter` relative to the current time.
    pub async fn load(&self, filter: &FeedFilter) -> ViewerResult<usize> {
        self.load_at(filter, Utc::now()).await
    }

    /// Load roots for `filter` relative to `now`.
    ///
    /// Returns the number of roots, or 0 if the view changed meanwhile.
    pub async fn load_at(&self, filter: &FeedFilter, now: Timestamp) -> ViewerResult<usize> {
        let generation = {
            let mut state = self.state.lock();
            if state.loading {
                debug!("Root load already in flight, ignoring");
                return Ok(state.branches.len());
            }
            state.loading = true;
            state.generation
        };

        let bounds = TimeBounds::since(filter.range.start_from(now));
        let page = Page::new(filter.limit, 0);
        let messages = self.api.search_messages(MessageQuery {
            alias_ids: filter.alias_ids.clone(),
            entity_ids: filter.entity_ids.clone(),
            channel_ids: Vec::new(),
            bounds,
            page,
            direction: OrderDirection::Desc,
        });
        let tweets = self.api.search_tweets(TweetQuery {
            alias_ids: filter.alias_ids.clone(),
            entity_ids: filter.entity_ids.clone(),
            author_ids: Vec::new(),
            bounds,
            page,
            direction: OrderDirection::Desc,
        });
        let result = tokio::try_join!(messages, tweets);

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!("View changed during root load, dropping result");
            return Ok(0);
        }
        state.loading = false;

        match result {
            Ok((messages, tweets)) => {
                let mut roots: Vec<FeedItem> = messages
                    .into_iter()
                    .map(FeedItem::Message)
                    .chain(tweets.into_iter().map(FeedItem::Tweet))
                    .collect();
                sort_roots_desc(&mut roots);
                state.generation += 1;
                state.branches = roots.into_iter().map(MessageBranch::new).collect();
                info!(
                    roots = state.branches.len(),
                    range = %filter.range,
                    "Loaded mention roots"
                );
                Ok(state.branches.len())
            }
            Err(e) => {
                drop(state);
                self.notifier.api_failure("Load mentions", &e);
                Err(e.into())
            }
        }
    }

    /// Show neighbours in `direction`, fetching them on first use.
    pub async fn expand(
        &self,
        key: &FeedItemKey,
        direction: Direction,
    ) -> ViewerResult<ExpandOutcome> {
        let outcome = self.fetch_neighbors(key, direction, FetchMode::Expand).await;
        Self::record(direction, &outcome);
        outcome
    }

    /// Fetch the next page of neighbours in `direction`.
    pub async fn load_more(
        &self,
        key: &FeedItemKey,
        direction: Direction,
    ) -> ViewerResult<ExpandOutcome> {
        let outcome = self.fetch_neighbors(key, direction, FetchMode::More).await;
        Self::record(direction, &outcome);
        outcome
    }

    /// Hide neighbours; they stay cached for the next expand.
    pub fn collapse(&self, key: &FeedItemKey) -> ViewerResult<()> {
        let mut state = self.state.lock();
        let branch = state
            .branch_mut(key)
            .ok_or_else(|| ViewerError::BranchNotFound(key.clone()))?;
        branch.collapse();
        Ok(())
    }

    fn record(direction: Direction, outcome: &ViewerResult<ExpandOutcome>) {
        let label = match outcome {
            Ok(o) => o.as_str(),
            Err(_) => "failed",
        };
        Metrics::branch_expand(direction.as_str(), label);
    }

    async fn fetch_neighbors(
        &self,
        key: &FeedItemKey,
        direction: Direction,
        mode: FetchMode,
    ) -> ViewerResult<ExpandOutcome> {
        let (generation, query) = {
            let mut state = self.state.lock();
            let generation = state.generation;
            let branch = state
                .branch_mut(key)
                .ok_or_else(|| ViewerError::BranchNotFound(key.clone()))?;

            let Some(root) = branch.root().as_message().cloned() else {
                return Ok(ExpandOutcome::Unsupported);
            };
            if branch.is_loading() {
                debug!(branch = %key, %direction, "Fetch already in flight, ignoring");
                return Ok(ExpandOutcome::Busy);
            }
            if matches!(mode, FetchMode::Expand) && branch.has_fetched(direction) {
                branch.show();
                return Ok(ExpandOutcome::Cached);
            }

            let offset = branch.offset(direction) as u32;
            let (bounds, order) = match direction {
                Direction::Older => (TimeBounds::before(root.created_at), OrderDirection::Desc),
                Direction::Newer => (TimeBounds::since(root.created_at), OrderDirection::Asc),
            };
            let query = MessageQuery {
                alias_ids: Vec::new(),
                entity_ids: Vec::new(),
                channel_ids: vec![root.channel_id.clone()],
                bounds,
                page: Page::new(self.page_size, offset),
                direction: order,
            };
            branch.begin_fetch(direction);
            (generation, query)
        };

        debug!(branch = %key, %direction, offset = query.page.offset, "Fetching neighbours");
        let result = self.api.search_messages(query).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(branch = %key, %direction, "View changed during fetch, dropping result");
            return Ok(ExpandOutcome::Stale);
        }
        let branch = state
            .branch_mut(key)
            .ok_or_else(|| ViewerError::BranchNotFound(key.clone()))?;
        branch.end_fetch();

        match result {
            Ok(fetched) => {
                let added = branch.merge(fetched);
                branch.mark_fetched(direction);
                branch.show();
                debug!(branch = %key, %direction, added, total = branch.messages().len(), "Merged neighbours");
                Ok(ExpandOutcome::Fetched { added })
            }
            Err(e) => {
                drop(state);
                warn!(branch = %key, %direction, error = %e, "Neighbour fetch failed");
                let title = match direction {
                    Direction::Older => "Load older messages",
                    Direction::Newer => "Load newer messages",
                };
                self.notifier.api_failure(title, &e);
                Err(e.into())
            }
        }
    }
}
