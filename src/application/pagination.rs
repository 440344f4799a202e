//! Offset pagination for the blog index.

use std::num::NonZeroU32;

/// Parse a `page` query value. Missing, malformed and non-positive values
/// all mean the first page.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// A one-based page over a listing of `page_size` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: NonZeroU32,
}

impl PageWindow {
    pub fn new(page: u32, page_size: NonZeroU32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn limit(&self) -> u32 {
        self.page_size.get()
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.page_size.get())
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        let pages = total.div_ceil(u64::from(self.page_size.get()));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}
