//! Message branch view-model.
//!
//! A branch anchors one feed root and accumulates neighbouring messages from
//! the root's channel on request. Messages stay strictly ascending by
//! `(created_at, id)` and each id appears once.

use std::collections::HashSet;
use std::fmt;

use alphadesk_core::{FeedItem, FeedItemKey, Message, MessageId};
use serde::Serialize;

/// Paging direction relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Older,
    Newer,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Older => "older",
            Self::Newer => "newer",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an expand or load-more request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Neighbours were fetched; `added` new messages were merged.
    Fetched { added: usize },
    /// Already fetched in this direction; shown without a request.
    Cached,
    /// A fetch for this branch is already in flight; request ignored.
    Busy,
    /// Tweet roots have no channel to page through.
    Unsupported,
    /// The view changed while the fetch was in flight; result dropped.
    Stale,
}

impl ExpandOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched { .. } => "fetched",
            Self::Cached => "cached",
            Self::Busy => "busy",
            Self::Unsupported => "unsupported",
            Self::Stale => "stale",
        }
    }
}

/// Expandable thread anchored at a feed root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBranch {
    root: FeedItem,
    messages: Vec<Message>,
    expanded: bool,
    fetched_older: bool,
    fetched_newer: bool,
    #[serde(skip)]
    in_flight: Option<Direction>,
}

impl MessageBranch {
    pub fn new(root: FeedItem) -> Self {
        let messages = root.as_message().cloned().into_iter().collect();
        Self {
            root,
            messages,
            expanded: false,
            fetched_older: false,
            fetched_newer: false,
            in_flight: None,
        }
    }

    pub fn key(&self) -> FeedItemKey {
        self.root.key()
    }

    pub fn root(&self) -> &FeedItem {
        &self.root
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// A neighbour fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_expand(&self) -> bool {
        self.root.channel_id().is_some()
    }

    /// Position of the root inside `messages` (none for tweet roots).
    pub fn root_index(&self) -> Option<usize> {
        let root = self.root.as_message()?;
        self.messages.iter().position(|m| m.id == root.id)
    }

    /// Number of already-loaded messages on the `direction` side of the root.
    pub fn offset(&self, direction: Direction) -> usize {
        match (self.root_index(), direction) {
            (None, _) => 0,
            (Some(idx), Direction::Older) => idx,
            (Some(idx), Direction::Newer) => self.messages.len() - idx - 1,
        }
    }

    pub fn has_fetched(&self, direction: Direction) -> bool {
        match direction {
            Direction::Older => self.fetched_older,
            Direction::Newer => self.fetched_newer,
        }
    }

    pub(crate) fn begin_fetch(&mut self, direction: Direction) {
        self.in_flight = Some(direction);
    }

    pub(crate) fn end_fetch(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn mark_fetched(&mut self, direction: Direction) {
        match direction {
            Direction::Older => self.fetched_older = true,
            Direction::Newer => self.fetched_newer = true,
        }
    }

    /// Show previously fetched neighbours.
    pub fn show(&mut self) {
        self.expanded = true;
    }

    /// Hide neighbours without discarding them.
    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    /// Merge fetched neighbours, skipping ids already present.
    ///
    /// Returns the number of messages added.
    pub fn merge(&mut self, fetched: Vec<Message>) -> usize {
        let mut seen: HashSet<MessageId> = self.messages.iter().map(|m| m.id).collect();
        let before = self.messages.len();
        for message in fetched {
            if seen.insert(message.id) {
                self.messages.push(message);
            }
        }
        self.messages.sort_by_key(|m| m.sort_key());
        self.messages.len() - before
    }

    /// Messages to render: neighbours when expanded, the root alone otherwise.
    pub fn visible(&self) -> Vec<&Message> {
        if self.expanded {
            return self.messages.iter().collect();
        }
        match self.root_index() {
            Some(idx) => vec![&self.messages[idx]],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphadesk_core::{ChannelId, Timestamp, Tweet};
    use chrono::{Duration, TimeZone, Utc};

    fn t() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn msg(id: i64, offset_secs: i64) -> Message {
        Message {
            id: MessageId(id),
            channel_id: ChannelId::new("C"),
            author: "a".to_string(),
            content: format!("m{id}"),
            created_at: t() + Duration::seconds(offset_secs),
            reference_id: None,
            alias_ids: vec![1],
            processed: false,
        }
    }

    fn ids(branch: &MessageBranch) -> Vec<i64> {
        branch.messages().iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn test_initial_state() {
        let branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        assert_eq!(ids(&branch), vec![10]);
        assert!(!branch.is_expanded());
        assert!(!branch.is_loading());
        assert_eq!(branch.root_index(), Some(0));
        assert_eq!(branch.offset(Direction::Older), 0);
        assert_eq!(branch.offset(Direction::Newer), 0);
    }

    #[test]
    fn test_merge_older_scenario() {
        let mut branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        let added = branch.merge(vec![msg(9, -1), msg(8, -2), msg(7, -3)]);
        assert_eq!(added, 3);
        assert_eq!(ids(&branch), vec![7, 8, 9, 10]);
        assert_eq!(branch.root_index(), Some(3));
        assert_eq!(branch.offset(Direction::Older), 3);
        assert_eq!(branch.offset(Direction::Newer), 0);
    }

    #[test]
    fn test_merge_deduplicates_overlapping_fetches() {
        let mut branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        branch.merge(vec![msg(9, -1), msg(11, 1)]);
        let added = branch.merge(vec![msg(9, -1), msg(10, 0), msg(11, 1), msg(12, 2)]);
        assert_eq!(added, 1);
        assert_eq!(ids(&branch), vec![9, 10, 11, 12]);

        let strictly_ascending = branch
            .messages()
            .windows(2)
            .all(|w| w[0].sort_key() < w[1].sort_key());
        assert!(strictly_ascending);
    }

    #[test]
    fn test_duplicate_within_one_fetch() {
        let mut branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        assert_eq!(branch.merge(vec![msg(9, -1), msg(9, -1)]), 1);
        assert_eq!(ids(&branch), vec![9, 10]);
    }

    #[test]
    fn test_equal_timestamps_order_by_id() {
        let mut branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        branch.merge(vec![msg(12, 0), msg(11, 0)]);
        assert_eq!(ids(&branch), vec![10, 11, 12]);
        assert_eq!(branch.offset(Direction::Newer), 2);
    }

    #[test]
    fn test_collapse_keeps_messages() {
        let mut branch = MessageBranch::new(FeedItem::Message(msg(10, 0)));
        branch.merge(vec![msg(9, -1)]);
        branch.show();
        assert_eq!(branch.visible().len(), 2);
        let before = branch.messages().to_vec();

        branch.collapse();
        assert!(!branch.is_expanded());
        assert_eq!(branch.visible().len(), 1);
        assert_eq!(branch.messages(), before.as_slice());

        branch.show();
        assert_eq!(branch.messages(), before.as_slice());
    }

    #[test]
    fn test_tweet_root_has_no_messages() {
        let tweet = Tweet {
            id: "1".to_string(),
            author_id: "2".to_string(),
            content: "gm".to_string(),
            created_at: t(),
            like_count: 0,
            retweet_count: 0,
            reply_count: 0,
            quote_count: 0,
            alias_ids: vec![],
        };
        let branch = MessageBranch::new(FeedItem::Tweet(tweet));
        assert!(branch.messages().is_empty());
        assert!(!branch.can_expand());
        assert_eq!(branch.root_index(), None);
        assert!(branch.visible().is_empty());
    }
}
