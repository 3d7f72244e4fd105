//! Core domain types for alphadesk.
//!
//! This crate provides the types and pure logic shared by every other crate:
//! - `Entity`, `EntityAlias`: tracked subjects and their mentioned surface forms
//! - `Message`, `Tweet`, `FeedItem`: chat and social mentions
//! - `SwapRule`, `ProjectRule`: trading and floor-price alert configuration
//! - Mention merging, relative time ranges, entity grouping

pub mod entity;
pub mod error;
pub mod feed;
pub mod grouping;
pub mod mention;
pub mod ordering;
pub mod rules;
pub mod time_range;
pub mod update;

pub use entity::{Entity, EntityAlias, EntityId, EntityRef, EntityType};
pub use error::{CoreError, Result};
pub use feed::{ChannelId, FeedItem, FeedItemKey, Message, MessageId, Tweet};
pub use grouping::{group_entities, EntityGroup, LISTENING_PROJECTS_LABEL, PROJECT_LABEL};
pub use mention::{merge_last_mention, Timestamp};
pub use ordering::sort_roots_desc;
pub use rules::{ProjectRule, SwapRule};
pub use time_range::{resolve, resolve_at, InvalidRangeError, RelativeRange};
pub use update::{AliasUpdate, EntityDraft, EntityUpdate, ProjectRuleUpdate, SwapRuleUpdate};
