//! Diff calculation for new-post alerts.
//!
//! Cross-run change detection is link membership only: a post is new when
//! its link is absent from the previous snapshot. Title or date changes on a
//! known link are not reported.

use std::collections::HashSet;

use crate::models::Post;

/// Posts in `current` whose link is not in `seen_links`, in `current` order.
pub fn calculate_diff(current: &[Post], seen_links: &HashSet<String>) -> Vec<Post> {
    current
        .iter()
        .filter(|post| !seen_links.contains(&post.link))
        .cloned()
        .collect()
}
