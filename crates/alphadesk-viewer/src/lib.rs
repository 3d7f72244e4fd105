//! View state for the alpha triage and rule tuning screens.
//!
//! - [`BranchAssembler`]: expandable message threads around feed roots
//! - [`SessionStore`]: session-scoped caches (author handles, rule lists)
//! - [`DebouncedSearch`]: search-as-you-type with a single request in flight
//! - [`Notifier`]: operator-facing notifications

pub mod assembler;
pub mod branch;
pub mod error;
pub mod notify;
pub mod search;
pub mod session;

pub use assembler::{BranchAssembler, FeedFilter, PAGE_SIZE};
pub use branch::{Direction, ExpandOutcome, MessageBranch};
pub use error::{ViewerError, ViewerResult};
pub use notify::{Notification, NotificationLevel, Notifier, DEFAULT_ERROR_PREFIX};
pub use search::{DebouncedSearch, SearchOutcome};
pub use session::{AuthorHandles, SessionStore};
