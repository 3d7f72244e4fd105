//! REST client for the alpha tagging and rule management backend.
//!
//! The backend owns ingestion, persistence and the trading engine. This crate
//! exposes its endpoints behind two object-safe traits so view logic can be
//! exercised against in-memory implementations:
//! - [`AlphaApi`]: entities, aliases, messages, tweets, author handles
//! - [`RuleApi`]: swap rules and floor-price project rules

pub mod api;
pub mod client;
pub mod error;
pub mod mock;
pub mod query;

pub use api::{AlphaApi, BoxFuture, RuleApi, TwitterAuthor};
pub use client::{ApiClient, ClientConfig};
pub use error::{ApiError, ApiResult};
pub use mock::MockAlphaApi;
pub use query::{
    AliasQuery, EntityQuery, MessageQuery, OrderBy, OrderDirection, Page, TimeBounds, TweetQuery,
};
