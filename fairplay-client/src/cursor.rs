use std::collections::HashMap;

use crate::api::CommentId;

/// Highest reply page fetched so far, per comment. Absent means no page was fetched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyCursors(HashMap<CommentId, u32>);

impl ReplyCursors {
    pub fn new() -> ReplyCursors {
        ReplyCursors(HashMap::new())
    }

    pub fn page(&self, id: &CommentId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    pub fn next_page(&self, id: &CommentId) -> u32 {
        self.page(id) + 1
    }

    /// Records `page` as fetched. Cursors never go back.
    pub fn advance(&mut self, id: &CommentId, page: u32) {
        let cur = self.0.entry(id.clone()).or_insert(0);
        *cur = (*cur).max(page);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
