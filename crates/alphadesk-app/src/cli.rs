//! Command-line surface.

use alphadesk_core::RelativeRange;
use clap::{ArgGroup, Subcommand};
use rust_decimal::Decimal;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Search entities by name (a numeric term looks up one id).
    Entities {
        search: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Search entities as you type. Each stdin line is the current input;
    /// a search runs once input pauses for `viewer.search_debounce_ms`.
    LiveSearch,

    /// Search aliases.
    Aliases {
        search: Option<String>,
        /// Only aliases linked to an entity of this type.
        #[arg(long = "type")]
        entity_type: Option<String>,
        /// Only aliases that are neither ignored nor linked, busiest first.
        /// Linked aliases are dropped locally, so `--offset` counts server
        /// rows and further pages are fetched until `--limit` are found.
        #[arg(long)]
        untriaged: bool,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Entities grouped by type, projects first.
    Groups { search: Option<String> },

    /// List entity types.
    Types,

    /// Mark an alias as ignored (or un-ignore it with --undo).
    AliasIgnore {
        id: i64,
        #[arg(long)]
        undo: bool,
    },

    /// Link an alias to an entity, or unlink it when no entity is given.
    AliasLink { id: i64, entity_id: Option<i64> },

    /// Create an entity with an existing type id or a new type name.
    #[command(group(ArgGroup::new("kind").required(true).args(["type_id", "new_type"])))]
    EntityCreate {
        name: String,
        #[arg(long)]
        type_id: Option<i64>,
        #[arg(long)]
        new_type: Option<String>,
        #[arg(long)]
        project_id: Option<i64>,
        #[arg(long)]
        profile_url: Option<String>,
        #[arg(long)]
        twitter_handle: Option<String>,
    },

    /// Edit entity fields; omitted fields are left unchanged.
    EntityUpdate {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "new_type")]
        type_id: Option<i64>,
        #[arg(long)]
        new_type: Option<String>,
        #[arg(long)]
        project_id: Option<i64>,
        #[arg(long)]
        profile_url: Option<String>,
        #[arg(long)]
        twitter_handle: Option<String>,
    },

    /// Mentions of an alias or entity, most recent first.
    #[command(group(ArgGroup::new("target").required(true).args(["alias", "entity"])))]
    Feed {
        #[arg(long)]
        alias: Option<i64>,
        #[arg(long)]
        entity: Option<i64>,
        /// e.g. "6 hours ago"; defaults to viewer.default_range.
        #[arg(long)]
        range: Option<RelativeRange>,
        /// Expand every branch with older channel messages.
        #[arg(long)]
        older: bool,
        /// Expand every branch with newer channel messages.
        #[arg(long)]
        newer: bool,
    },

    /// List swap rules.
    SwapRules,

    /// Patch a swap rule.
    SwapRuleSet {
        id: i64,
        #[arg(long)]
        buy: Option<Decimal>,
        #[arg(long)]
        sell: Option<Decimal>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        slippage_bps: Option<u32>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },

    /// List floor-price rules.
    ProjectRules,

    /// Patch a floor-price rule.
    ProjectRuleSet {
        id: i64,
        #[arg(long)]
        below: Option<Decimal>,
        #[arg(long)]
        above: Option<Decimal>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },

    /// Print Prometheus metrics gathered during this run.
    Metrics,
}

/// `--enable` / `--disable` pair to an optional flag.
pub(crate) fn toggle(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
