//! Offset-based pagination utilities.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: i64 = 50;

/// Upper bound on a single page.
pub const MAX_LIMIT: i64 = 500;

/// Normalised limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// Builds page parameters from optional raw values.
    ///
    /// Missing limit defaults to 50, missing offset to 0. The limit is clamped
    /// to `1..=MAX_LIMIT` and negative offsets become 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of results together with the unpaged total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    /// Create a page from already-fetched items.
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        Self {
            items,
            total,
            limit: params.limit,
            offset: params.offset,
        }
    }

    /// Whether more rows exist past this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }

    /// Transform the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::new(None, None);
        assert_eq!(params.limit, 50);
        assert_eq!(params.offset, 0);
        assert_eq!(PageParams::default(), params);
    }

    #[test]
    fn test_page_params_clamping() {
        assert_eq!(PageParams::new(Some(0), None).limit, 1);
        assert_eq!(PageParams::new(Some(10_000), None).limit, MAX_LIMIT);
        assert_eq!(PageParams::new(Some(20), Some(-5)).offset, 0);
        assert_eq!(PageParams::new(Some(20), Some(40)).offset, 40);
    }

    #[test]
    fn test_page_has_more() {
        let page = Page::new(vec![1, 2], 5, PageParams::new(Some(2), Some(0)));
        assert!(page.has_more());

        let last = Page::new(vec![5], 5, PageParams::new(Some(2), Some(4)));
        assert!(!last.has_more());
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 10, PageParams::new(Some(3), Some(3)));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.total, 10);
        assert_eq!(mapped.offset, 3);
    }

    #[test]
    fn test_page_serialization() {
        let page = Page::new(vec!["a"], 1, PageParams::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["limit"], 50);
        assert_eq!(json["items"][0], "a");
    }
}
