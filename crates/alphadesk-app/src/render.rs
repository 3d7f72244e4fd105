//! Plain-text rendering of command results.

use std::fmt::Write;

use alphadesk_core::{
    Entity, EntityAlias, EntityGroup, EntityType, FeedItem, Message, ProjectRule, SwapRule,
    Timestamp,
};
use alphadesk_viewer::{AuthorHandles, MessageBranch};
use rust_decimal::Decimal;

fn when(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn decimal(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string()).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn entities(entities: &[Entity]) -> String {
    let mut out = String::new();
    for e in entities {
        let _ = writeln!(
            out,
            "{:>6}  {:<32} {:<16} {:>6}  {}",
            e.id,
            e.name,
            e.type_label(),
            e.mention_count,
            when(e.last_mention())
        );
    }
    out
}

pub(crate) fn aliases(aliases: &[EntityAlias]) -> String {
    let mut out = String::new();
    for a in aliases {
        let linked = a.entity.as_ref().map_or("-", |e| e.name.as_str());
        let flag = if a.ignore { " (ignored)" } else { "" };
        let _ = writeln!(
            out,
            "{:>6}  {:<32} -> {:<24} {:>6}  {}{}",
            a.id,
            a.name,
            linked,
            a.mention_count,
            when(a.last_mention()),
            flag
        );
    }
    out
}

pub(crate) fn groups(groups: &[EntityGroup]) -> String {
    let mut out = String::new();
    for g in groups {
        let _ = writeln!(out, "{} ({})", g.label, g.len());
        for e in &g.entities {
            let _ = writeln!(out, "  {:>6}  {}", e.id, e.name);
        }
    }
    out
}

pub(crate) fn types(types: &[EntityType]) -> String {
    let mut out = String::new();
    for t in types {
        let _ = writeln!(out, "{:>4}  {}", t.id, t.name);
    }
    out
}

fn message_line(m: &Message) -> String {
    format!(
        "[{}] #{} {}: {}",
        when(Some(m.created_at)),
        m.channel_id,
        m.author,
        m.content
    )
}

pub(crate) fn feed(branches: &[MessageBranch], authors: &AuthorHandles) -> String {
    let mut out = String::new();
    for branch in branches {
        match branch.root() {
            FeedItem::Tweet(t) => {
                let _ = writeln!(
                    out,
                    "[{}] {}: {} ({})",
                    when(Some(t.created_at)),
                    authors.display(&t.author_id),
                    t.content,
                    t.url()
                );
            }
            FeedItem::Message(root) if branch.is_expanded() => {
                for m in branch.visible() {
                    let marker = if m.id == root.id { "*" } else { " " };
                    let _ = writeln!(out, "{marker} {}", message_line(m));
                }
            }
            FeedItem::Message(root) => {
                let _ = writeln!(out, "{}", message_line(root));
            }
        }
    }
    out
}

pub(crate) fn swap_rules(rules: &[SwapRule]) -> String {
    let mut out = String::new();
    for r in rules {
        let _ = writeln!(
            out,
            "{:>4}  {:<10} {:<8} buy<={:<10} sell>={:<10} amount={} slippage={}bps {}",
            r.id,
            r.token_symbol,
            r.chain,
            decimal(r.buy_threshold),
            decimal(r.sell_threshold),
            r.trade_amount.normalize(),
            r.slippage_bps,
            if r.enabled { "enabled" } else { "disabled" }
        );
    }
    out
}

pub(crate) fn project_rules(rules: &[ProjectRule]) -> String {
    let mut out = String::new();
    for r in rules {
        let _ = writeln!(
            out,
            "{:>4}  {:<32} below={:<10} above={:<10} {}",
            r.id,
            r.display_name(),
            decimal(r.floor_below),
            decimal(r.floor_above),
            if r.enabled { "enabled" } else { "disabled" }
        );
    }
    out
}
