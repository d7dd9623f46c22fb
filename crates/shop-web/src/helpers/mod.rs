//! Model preparation shared by several controllers.

pub mod catalog;
pub mod order;

pub use catalog::{CatalogCacheEvent, CatalogHelper};
pub use order::OrderHelper;

use chrono::{DateTime, Utc};

/// `2024-03-01 14:05` in UTC.
pub fn format_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01 00:00");
        assert_eq!(format_date(1_700_000_000), "2023-11-14 22:13");
    }
}
