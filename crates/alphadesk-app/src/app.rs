//! Application orchestration.
//!
//! Owns the backend handle, the session caches and the notifier, and runs one
//! [`Command`] at a time. Failed backend calls are published as notifications
//! before the error is returned.

use std::sync::Arc;

use alphadesk_api::{AliasQuery, AlphaApi, ApiClient, ApiResult, EntityQuery, Page, RuleApi};
use alphadesk_core::{
    group_entities, AliasUpdate, Entity, EntityAlias, EntityDraft, EntityId, EntityUpdate,
    FeedItem, ProjectRuleUpdate, SwapRuleUpdate,
};
use alphadesk_telemetry::Metrics;
use alphadesk_viewer::{
    AuthorHandles, BranchAssembler, DebouncedSearch, Direction, FeedFilter, Notifier,
    SearchOutcome, SessionStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{toggle, Command};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::render;

/// Main application.
pub struct Application<A: ?Sized> {
    config: AppConfig,
    api: Arc<A>,
    notifier: Notifier,
    session: SessionStore,
}

impl Application<ApiClient> {
    /// Create an application talking to the configured backend.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let api = ApiClient::new(config.client_config())?;
        info!(base_url = %api.base_url(), "API client ready");
        Ok(Self::with_api(config, Arc::new(api)))
    }
}

impl<A: AlphaApi + RuleApi + ?Sized + 'static> Application<A> {
    pub fn with_api(config: AppConfig, api: Arc<A>) -> Self {
        let notifier = config.notifier();
        Self {
            config,
            api,
            notifier,
            session: SessionStore::new(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Publish a failure notification for `result` and convert its error.
    fn report<T>(&self, title: &str, result: ApiResult<T>) -> AppResult<T> {
        result.map_err(|e| {
            self.notifier.api_failure(title, &e);
            AppError::Api(e)
        })
    }

    /// Run one command and return its rendered output.
    pub async fn execute(&self, command: Command) -> AppResult<String> {
        debug!(?command, "Executing command");
        match command {
            Command::Entities {
                search,
                limit,
                offset,
            } => {
                let mut query = EntityQuery::search(search.as_deref().unwrap_or_default());
                query.page = Page::new(limit, offset);
                let entities = self
                    .report("Search entities", self.api.search_entities(query).await)?;
                Ok(render::entities(&entities))
            }

            Command::Aliases {
                search,
                entity_type,
                untriaged,
                limit,
                offset,
            } => {
                let mut query = if untriaged {
                    AliasQuery::untriaged()
                } else {
                    AliasQuery::default()
                };
                query.search = search.filter(|s| !s.trim().is_empty());
                query.entity_type = entity_type;
                query.page = Page::new(limit, offset);
                let aliases = if untriaged {
                    self.untriaged_aliases(query).await?
                } else {
                    self.report("Search aliases", self.api.search_aliases(query).await)?
                };
                Ok(render::aliases(&aliases))
            }

            Command::LiveSearch => {
                self.live_entity_search(stdin_lines(), |out| print!("{out}"))
                    .await?;
                Ok(String::new())
            }

            Command::Groups { search } => {
                let query = EntityQuery::search(search.as_deref().unwrap_or_default());
                let entities = self
                    .report("Search entities", self.api.search_entities(query).await)?;
                let groups = group_entities(&entities, &self.config.pinned_entity_ids());
                Ok(render::groups(&groups))
            }

            Command::Types => {
                let types = self.report("Load entity types", self.api.list_entity_types().await)?;
                Ok(render::types(&types))
            }

            Command::AliasIgnore { id, undo } => {
                let alias = self.report(
                    "Update alias",
                    self.api.update_alias(id, AliasUpdate::ignore(!undo)).await,
                )?;
                let verb = if alias.ignore { "ignored" } else { "restored" };
                self.notifier
                    .success("Update alias", format!("Alias {} {verb}", alias.name));
                Ok(render::aliases(&[alias]))
            }

            Command::AliasLink { id, entity_id } => {
                let update = match entity_id {
                    Some(entity_id) => AliasUpdate::link(EntityId(entity_id)),
                    None => AliasUpdate::unlink(),
                };
                let alias = self.report("Update alias", self.api.update_alias(id, update).await)?;
                let message = match &alias.entity {
                    Some(entity) => format!("Alias {} linked to {}", alias.name, entity.name),
                    None => format!("Alias {} unlinked", alias.name),
                };
                self.notifier.success("Update alias", message);
                Ok(render::aliases(&[alias]))
            }

            Command::EntityCreate {
                name,
                type_id,
                new_type,
                project_id,
                profile_url,
                twitter_handle,
            } => {
                let draft = EntityDraft {
                    name,
                    type_id,
                    new_type,
                    project_id,
                    profile_url,
                    twitter_handle,
                };
                draft.validate()?;
                let entity = self.report("Create entity", self.api.create_entity(draft).await)?;
                self.notifier
                    .success("Create entity", format!("Entity {} created", entity.name));
                Ok(render::entities(&[entity]))
            }

            Command::EntityUpdate {
                id,
                name,
                type_id,
                new_type,
                project_id,
                profile_url,
                twitter_handle,
            } => {
                let update = EntityUpdate {
                    name,
                    type_id,
                    new_type,
                    project_id,
                    profile_url,
                    twitter_handle,
                };
                update.validate()?;
                let entity = self.report(
                    "Update entity",
                    self.api.update_entity(EntityId(id), update).await,
                )?;
                self.notifier
                    .success("Update entity", format!("Entity {} updated", entity.name));
                Ok(render::entities(&[entity]))
            }

            Command::Feed {
                alias,
                entity,
                range,
                older,
                newer,
            } => {
                let range = match range {
                    Some(range) => range,
                    None => self.config.default_range()?,
                };
                let filter = match (alias, entity) {
                    (Some(alias_id), _) => FeedFilter::for_alias(alias_id, range),
                    (None, Some(entity_id)) => FeedFilter::for_entity(EntityId(entity_id), range),
                    (None, None) => {
                        return Err(AppError::InvalidArgs(
                            "feed needs --alias or --entity".to_string(),
                        ))
                    }
                };
                self.feed(&filter, older, newer).await
            }

            Command::SwapRules => {
                let rules = self.report(
                    "Load swap rules",
                    self.session.swap_rules(self.api.as_ref(), false).await,
                )?;
                Ok(render::swap_rules(&rules))
            }

            Command::SwapRuleSet {
                id,
                buy,
                sell,
                amount,
                slippage_bps,
                enable,
                disable,
            } => {
                let update = SwapRuleUpdate {
                    buy_threshold: buy,
                    sell_threshold: sell,
                    trade_amount: amount,
                    slippage_bps,
                    enabled: toggle(enable, disable),
                };
                update.validate()?;
                let rule = self.report(
                    "Update swap rule",
                    self.session.update_swap_rule(self.api.as_ref(), id, update).await,
                )?;
                self.notifier
                    .success("Update swap rule", format!("Swap rule {} updated", rule.id));
                Ok(render::swap_rules(&[rule]))
            }

            Command::ProjectRules => {
                let rules = self.report(
                    "Load project rules",
                    self.session.project_rules(self.api.as_ref(), false).await,
                )?;
                Ok(render::project_rules(&rules))
            }

            Command::ProjectRuleSet {
                id,
                below,
                above,
                enable,
                disable,
            } => {
                let update = ProjectRuleUpdate {
                    floor_below: below,
                    floor_above: above,
                    enabled: toggle(enable, disable),
                };
                update.validate()?;
                let rule = self.report(
                    "Update project rule",
                    self.session
                        .update_project_rule(self.api.as_ref(), id, update)
                        .await,
                )?;
                self.notifier.success(
                    "Update project rule",
                    format!("Project rule {} updated", rule.display_name()),
                );
                Ok(render::project_rules(&[rule]))
            }

            Command::Metrics => Ok(Metrics::gather_text()?),
        }
    }

    /// Keep paging until `limit` untriaged aliases are found or the server
    /// runs out; linked aliases can only be dropped after the fetch.
    async fn untriaged_aliases(&self, mut query: AliasQuery) -> AppResult<Vec<EntityAlias>> {
        let wanted = query.page.limit as usize;
        let mut found = Vec::new();
        loop {
            let page = self
                .report("Search aliases", self.api.search_aliases(query.clone()).await)?;
            let exhausted = page.len() < wanted;
            found.extend(page.into_iter().filter(EntityAlias::is_untriaged));
            if found.len() >= wanted || exhausted {
                break;
            }
            query.page = query.page.next();
            debug!(offset = query.page.offset, found = found.len(), "Fetching next alias page");
        }
        found.truncate(wanted);
        Ok(found)
    }

    async fn feed(&self, filter: &FeedFilter, older: bool, newer: bool) -> AppResult<String> {
        let assembler = BranchAssembler::with_page_size(
            self.api.clone(),
            self.notifier.clone(),
            self.config.viewer.page_size,
        );
        let roots = assembler.load(filter).await?;
        info!(roots, range = %filter.range, "Feed loaded");

        // A failed branch is already notified and keeps its previous state.
        let directions = [(older, Direction::Older), (newer, Direction::Newer)];
        for branch in assembler.branches() {
            if !branch.can_expand() {
                continue;
            }
            let key = branch.key();
            for (_, direction) in directions.iter().filter(|(wanted, _)| *wanted) {
                if let Err(e) = assembler.expand(&key, *direction).await {
                    warn!(branch = %key, %direction, error = %e, "Branch expansion failed");
                }
            }
        }

        let branches = assembler.branches();
        let authors = if branches.iter().any(|b| matches!(b.root(), FeedItem::Tweet(_))) {
            match self.session.author_handles(self.api.as_ref()).await {
                Ok(authors) => authors,
                Err(e) => {
                    warn!(error = %e, "Author handles unavailable, showing raw ids");
                    self.notifier.api_failure("Load tweet authors", &e);
                    Arc::new(AuthorHandles::default())
                }
            }
        } else {
            Arc::new(AuthorHandles::default())
        };
        Ok(render::feed(&branches, &authors))
    }

    /// Entity search driven by live input.
    ///
    /// Every item from `input` is the full current search text. Searches are
    /// debounced by `viewer.search_debounce_ms` and only the latest text
    /// reaches `emit`. Returns once `input` closes and the last search ends.
    pub async fn live_entity_search<F>(
        &self,
        mut input: mpsc::Receiver<String>,
        mut emit: F,
    ) -> AppResult<()>
    where
        F: FnMut(String),
    {
        let (search, mut results) = DebouncedSearch::new(self.config.search_debounce());
        let mut last = None;
        loop {
            tokio::select! {
                term = input.recv() => match term {
                    Some(term) => {
                        let api = self.api.clone();
                        last = Some(search.trigger(term, move |term: String| async move {
                            api.search_entities(EntityQuery::search(&term)).await
                        }));
                    }
                    None => break,
                },
                Some(outcome) = results.recv() => self.emit_search(outcome, &mut emit),
            }
        }

        if let Some(handle) = last {
            if let Err(e) = handle.await {
                warn!(error = %e, "Search task failed");
            }
        }
        while let Ok(outcome) = results.try_recv() {
            self.emit_search(outcome, &mut emit);
        }
        Ok(())
    }

    fn emit_search<F: FnMut(String)>(
        &self,
        outcome: SearchOutcome<ApiResult<Vec<Entity>>>,
        emit: &mut F,
    ) {
        match outcome.result {
            Ok(entities) => {
                debug!(term = %outcome.term, count = entities.len(), "Search results");
                emit(format!("> {}\n{}", outcome.term, render::entities(&entities)));
            }
            Err(e) => {
                self.notifier.api_failure("Search entities", &e);
            }
        }
    }
}

/// Stdin lines, forwarded until EOF.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });
    rx
}
