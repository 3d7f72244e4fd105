//! Display ordering for feed roots.

use crate::feed::FeedItem;

/// Sort roots most recent first.
///
/// The sort is stable, so items sharing a timestamp keep their incoming order.
pub fn sort_roots_desc(items: &mut [FeedItem]) {
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
