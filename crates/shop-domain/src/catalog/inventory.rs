//! Stock tracking for products.

use serde::{Deserialize, Serialize};

/// What happens when stock falls to the minimum level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LowStockActivity {
    #[default]
    Nothing,
    DisableBuyButton,
    Unpublish,
}

/// Stock level for a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InventoryLevel {
    /// Quantity in stock.
    pub quantity: i64,
    /// Whether stock is tracked at all.
    pub track_inventory: bool,
    /// Whether orders are accepted when stock runs out.
    pub allow_backorder: bool,
    /// Stock level at which `low_stock_activity` applies.
    pub min_stock_quantity: i64,
    pub low_stock_activity: LowStockActivity,
}

impl InventoryLevel {
    /// Tracked inventory with the given quantity.
    pub fn new(quantity: i64) -> Self {
        Self {
            quantity,
            track_inventory: true,
            allow_backorder: false,
            min_stock_quantity: 0,
            low_stock_activity: LowStockActivity::Nothing,
        }
    }

    /// Untracked inventory (infinite stock).
    pub fn untracked() -> Self {
        Self {
            quantity: 0,
            track_inventory: false,
            allow_backorder: true,
            min_stock_quantity: 0,
            low_stock_activity: LowStockActivity::Nothing,
        }
    }

    /// Check if a specific quantity is available.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        if !self.track_inventory {
            return true;
        }
        self.quantity >= quantity || self.allow_backorder
    }

    /// Check if out of stock.
    pub fn is_out_of_stock(&self) -> bool {
        self.track_inventory && self.quantity <= 0
    }

    /// Customer-facing availability line, `None` when stock is untracked.
    pub fn availability_message(&self, display_quantity: bool) -> Option<String> {
        if !self.track_inventory {
            return None;
        }
        if self.quantity > 0 {
            if display_quantity {
                Some(format!("{} in stock", self.quantity))
            } else {
                Some("In stock".to_string())
            }
        } else if self.allow_backorder {
            Some("Out of stock - on backorder and will be dispatched once in stock.".to_string())
        } else {
            Some("Out of stock".to_string())
        }
    }

    /// Decrease stock for a sale. Returns the activity to apply when stock
    /// reaches the minimum level.
    pub fn commit(&mut self, quantity: i64) -> Option<LowStockActivity> {
        if !self.track_inventory {
            return None;
        }
        self.quantity -= quantity;
        if !self.allow_backorder {
            self.quantity = self.quantity.max(0);
        }
        if self.quantity <= self.min_stock_quantity
            && self.low_stock_activity != LowStockActivity::Nothing
        {
            Some(self.low_stock_activity)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_availability() {
        let inv = InventoryLevel::new(10);
        assert!(inv.can_fulfill(10));
        assert!(!inv.can_fulfill(11));
        assert_eq!(inv.availability_message(true).as_deref(), Some("10 in stock"));
        assert_eq!(inv.availability_message(false).as_deref(), Some("In stock"));
    }

    #[test]
    fn test_untracked_inventory() {
        let inv = InventoryLevel::untracked();
        assert!(inv.can_fulfill(1000));
        assert!(!inv.is_out_of_stock());
        assert_eq!(inv.availability_message(true), None);
    }

    #[test]
    fn test_commit_triggers_low_stock_activity() {
        let mut inv = InventoryLevel::new(3);
        inv.min_stock_quantity = 1;
        inv.low_stock_activity = LowStockActivity::DisableBuyButton;

        assert_eq!(inv.commit(1), None);
        assert_eq!(inv.commit(1), Some(LowStockActivity::DisableBuyButton));
        assert_eq!(inv.quantity, 1);
    }

    #[test]
    fn test_backorder_allows_negative_stock() {
        let mut inv = InventoryLevel::new(1);
        inv.allow_backorder = true;
        assert!(inv.can_fulfill(5));
        inv.commit(3);
        assert_eq!(inv.quantity, -2);
        assert!(inv.is_out_of_stock());
    }
}
