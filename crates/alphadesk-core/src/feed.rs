//! Chat messages, tweets and the tagged feed item that unifies them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mention::Timestamp;

/// Backend identifier of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat channel identifier (Discord snowflake, kept as text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat-origin mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: String,
    pub content: String,
    pub created_at: Timestamp,
    /// Parent message in a reply chain.
    #[serde(default)]
    pub reference_id: Option<MessageId>,
    #[serde(default)]
    pub alias_ids: Vec<i64>,
    #[serde(default)]
    pub processed: bool,
}

impl Message {
    /// Ascending sort key: creation time, then id.
    pub fn sort_key(&self) -> (Timestamp, MessageId) {
        (self.created_at, self.id)
    }
}

/// Social-origin mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub alias_ids: Vec<i64>,
}

impl Tweet {
    /// Public link to the tweet.
    pub fn url(&self) -> String {
        format!("https://x.com/i/web/status/{}", self.id)
    }
}

/// Stable identity of a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FeedItemKey {
    Message(MessageId),
    Tweet(String),
}

impl fmt::Display for FeedItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(id) => write!(f, "message:{id}"),
            Self::Tweet(id) => write!(f, "tweet:{id}"),
        }
    }
}

/// A mention from either source, tagged at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedItem {
    Message(Message),
    Tweet(Tweet),
}

impl FeedItem {
    pub fn key(&self) -> FeedItemKey {
        match self {
            Self::Message(m) => FeedItemKey::Message(m.id),
            Self::Tweet(t) => FeedItemKey::Tweet(t.id.clone()),
        }
    }

    pub fn created_at(&self) -> Timestamp {
        match self {
            Self::Message(m) => m.created_at,
            Self::Tweet(t) => t.created_at,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Message(m) => &m.content,
            Self::Tweet(t) => &t.content,
        }
    }

    pub fn alias_ids(&self) -> &[i64] {
        match self {
            Self::Message(m) => &m.alias_ids,
            Self::Tweet(t) => &t.alias_ids,
        }
    }

    /// Channel to page through; tweets have none.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        match self {
            Self::Message(m) => Some(&m.channel_id),
            Self::Tweet(_) => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Tweet(_) => None,
        }
    }

    pub fn as_tweet(&self) -> Option<&Tweet> {
        match self {
            Self::Message(_) => None,
            Self::Tweet(t) => Some(t),
        }
    }
}

impl From<Message> for FeedItem {
    fn from(value: Message) -> Self {
        Self::Message(value)
    }
}

impl From<Tweet> for FeedItem {
    fn from(value: Tweet) -> Self {
        Self::Tweet(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_JSON: &str = r#"{
        "id": 10,
        "channelId": "998877",
        "author": "degen",
        "content": "pengu looks strong",
        "createdAt": "2024-05-01T10:00:00.000Z",
        "aliasIds": [3, 4]
    }"#;

    #[test]
    fn test_message_parses_backend_shape() {
        let msg: Message = serde_json::from_str(MESSAGE_JSON).unwrap();
        assert_eq!(msg.id, MessageId(10));
        assert_eq!(msg.channel_id.as_str(), "998877");
        assert_eq!(msg.reference_id, None);
        assert!(!msg.processed);
        assert_eq!(msg.alias_ids, vec![3, 4]);
    }

    #[test]
    fn test_feed_item_is_tagged() {
        let msg: Message = serde_json::from_str(MESSAGE_JSON).unwrap();
        let item = FeedItem::from(msg);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "message");
        assert_eq!(item.key(), FeedItemKey::Message(MessageId(10)));
        assert!(item.channel_id().is_some());
    }

    #[test]
    fn test_tweet_has_no_channel() {
        let tweet: Tweet = serde_json::from_str(
            r#"{"id": "1790000000000000000", "authorId": "44196397",
                "content": "gm", "createdAt": "2024-05-01T10:00:00Z", "likeCount": 12}"#,
        )
        .unwrap();
        let item = FeedItem::Tweet(tweet);
        assert!(item.channel_id().is_none());
        assert_eq!(item.key().to_string(), "tweet:1790000000000000000");
        assert_eq!(
            item.as_tweet().unwrap().url(),
            "https://x.com/i/web/status/1790000000000000000"
        );
    }
}
