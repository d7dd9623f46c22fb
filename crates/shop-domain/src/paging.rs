//! Paged result sets.

use serde::{Deserialize, Serialize};

/// One page of a larger result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedList<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page_index: usize,
    /// Page size.
    pub page_size: usize,
    /// Total number of items across all pages.
    pub total_count: usize,
}

impl<T> PagedList<T> {
    /// Slice a page out of a full, already ordered list.
    pub fn from_vec(all: Vec<T>, page_index: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_count = all.len();
        let items = all
            .into_iter()
            .skip(page_index.saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            items,
            page_index,
            page_size,
            total_count,
        }
    }

    /// Number of pages.
    pub fn total_pages(&self) -> usize {
        if self.total_count == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size)
        }
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index + 1 < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items while keeping paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging() {
        let page = PagedList::from_vec((1..=25).collect::<Vec<_>>(), 1, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_previous_page());
        assert!(page.has_next_page());

        let last = PagedList::from_vec((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next_page());
    }

    #[test]
    fn test_empty_page() {
        let page: PagedList<u32> = PagedList::from_vec(Vec::new(), 0, 10);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_empty());
    }
}
