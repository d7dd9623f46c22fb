//! Pager view model.

use serde::{Deserialize, Serialize};
use shop_domain::PagedList;

/// Paging links for a list view. Page numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagerModel {
    pub page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// Page numbers to link to, at most ten around the current page.
    pub pages: Vec<usize>,
}

const INDIVIDUAL_PAGES: usize = 10;

impl PagerModel {
    pub fn from_list<T>(list: &PagedList<T>) -> Self {
        let total_pages = list.total_pages();
        let page = list.page_index + 1;
        let (first, last) = if total_pages <= INDIVIDUAL_PAGES {
            (1, total_pages)
        } else {
            let half = INDIVIDUAL_PAGES / 2;
            let first = page.saturating_sub(half).max(1);
            let last = (first + INDIVIDUAL_PAGES - 1).min(total_pages);
            (last + 1 - INDIVIDUAL_PAGES, last)
        };
        Self {
            page,
            page_size: list.page_size,
            total_records: list.total_count,
            total_pages,
            has_previous: list.has_previous_page(),
            has_next: list.has_next_page(),
            pages: if total_pages == 0 { Vec::new() } else { (first..=last).collect() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_stays_in_range() {
        let list = PagedList::from_vec((0..250).collect::<Vec<_>>(), 23, 10);
        let pager = PagerModel::from_list(&list);
        assert_eq!(pager.page, 24);
        assert_eq!(pager.total_pages, 25);
        assert_eq!(pager.pages, (16..=25).collect::<Vec<_>>());
        assert!(pager.has_previous && pager.has_next);

        let list = PagedList::from_vec((0..30).collect::<Vec<_>>(), 0, 10);
        assert_eq!(PagerModel::from_list(&list).pages, vec![1, 2, 3]);
    }
}
