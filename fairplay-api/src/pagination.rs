/// Envelope shared by every list endpoint
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items_returned: u32,
}

impl Pagination {
    /// Builds the envelope for `page` (1-based) of a listing with `total_items` entries
    pub fn for_page(page: u32, limit: u32, total_items: u64) -> Pagination {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total_items.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        let before = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let items_returned = total_items.saturating_sub(before).min(u64::from(limit)) as u32;
        Pagination {
            page,
            limit,
            total_items,
            total_pages,
            items_returned,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}
