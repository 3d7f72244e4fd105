//! Last-mention reconciliation across the chat and social sources.
//!
//! Entities and aliases carry one timestamp per source. The displayed
//! `last_mention` is derived from both with a single rule so the two record
//! kinds can never disagree.

use chrono::{DateTime, Utc};

/// Timestamp used throughout the domain (UTC).
pub type Timestamp = DateTime<Utc>;

/// Pick the most recent mention across the chat and social sources.
///
/// Without a chat timestamp the social one is returned as-is (possibly `None`).
/// Otherwise social wins only when it is strictly later; ties prefer chat.
#[inline]
pub fn merge_last_mention(chat: Option<Timestamp>, social: Option<Timestamp>) -> Option<Timestamp> {
    match (chat, social) {
        (None, social) => social,
        (Some(chat), Some(social)) if social > chat => Some(social),
        (Some(chat), _) => Some(chat),
    }
}
