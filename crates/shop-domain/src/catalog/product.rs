//! Product types.

use crate::catalog::{InventoryLevel, ProductAttributeMapping};
use crate::ids::{
    AttributeMappingId, CategoryId, DiscountId, ManufacturerId, PictureId, ProductId, StoreId,
    TaxCategoryId,
};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A quantity-based price break.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierPrice {
    /// Minimum quantity for this price.
    pub quantity: i64,
    /// Unit price at this quantity.
    pub price: Money,
    /// Restrict to a customer role (system name), if any.
    pub customer_role: Option<String>,
    /// Restrict to a store, if any.
    pub store_id: Option<StoreId>,
}

/// A sellable catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub sku: Option<String>,
    pub manufacturer_part_number: Option<String>,
    pub gtin: Option<String>,

    /// Unit price in the primary store currency.
    pub price: Money,
    /// Crossed-out "was" price.
    pub old_price: Option<Money>,
    /// Hide the price and show a call-for-pricing label.
    pub call_for_price: bool,
    /// Customer types the price (donations, gift amounts).
    pub customer_enters_price: bool,
    pub minimum_customer_entered_price: Money,
    pub maximum_customer_entered_price: Money,
    pub tier_prices: Vec<TierPrice>,
    pub tax_category_id: Option<TaxCategoryId>,
    pub is_tax_exempt: bool,
    pub applied_discounts: Vec<DiscountId>,

    pub attributes: Vec<ProductAttributeMapping>,
    pub category_ids: Vec<CategoryId>,
    pub manufacturer_ids: Vec<ManufacturerId>,
    pub picture_ids: Vec<PictureId>,

    pub inventory: InventoryLevel,
    pub display_stock_availability: bool,
    pub display_stock_quantity: bool,
    pub order_minimum_quantity: i64,
    pub order_maximum_quantity: i64,
    /// Comma-separated list of the only quantities that may be ordered.
    pub allowed_quantities: Option<String>,

    pub disable_buy_button: bool,
    pub disable_wishlist_button: bool,
    pub is_shipping_enabled: bool,
    pub is_free_shipping: bool,
    pub additional_shipping_charge: Money,
    /// Weight in the store's weight unit.
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,

    pub allow_customer_reviews: bool,
    pub approved_rating_sum: i64,
    pub approved_total_reviews: i64,

    pub mark_as_new: bool,
    pub show_on_home_page: bool,
    pub published: bool,
    pub deleted: bool,
    pub visible_individually: bool,
    /// Empty means available in every store.
    pub limited_to_stores: Vec<StoreId>,
    pub display_order: i32,
    /// Unix timestamp.
    pub created_at: i64,
}

impl Product {
    /// Create a published product with sensible defaults.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            short_description: String::new(),
            full_description: String::new(),
            sku: None,
            manufacturer_part_number: None,
            gtin: None,
            price,
            old_price: None,
            call_for_price: false,
            customer_enters_price: false,
            minimum_customer_entered_price: Money::zero(price.currency),
            maximum_customer_entered_price: Money::new(100_000, price.currency),
            tier_prices: Vec::new(),
            tax_category_id: None,
            is_tax_exempt: false,
            applied_discounts: Vec::new(),
            attributes: Vec::new(),
            category_ids: Vec::new(),
            manufacturer_ids: Vec::new(),
            picture_ids: Vec::new(),
            inventory: InventoryLevel::untracked(),
            display_stock_availability: false,
            display_stock_quantity: false,
            order_minimum_quantity: 1,
            order_maximum_quantity: 10_000,
            allowed_quantities: None,
            disable_buy_button: false,
            disable_wishlist_button: false,
            is_shipping_enabled: true,
            is_free_shipping: false,
            additional_shipping_charge: Money::zero(price.currency),
            weight: 0.0,
            length: 0.0,
            width: 0.0,
            height: 0.0,
            allow_customer_reviews: true,
            approved_rating_sum: 0,
            approved_total_reviews: 0,
            mark_as_new: false,
            show_on_home_page: false,
            published: true,
            deleted: false,
            visible_individually: true,
            limited_to_stores: Vec::new(),
            display_order: 0,
            created_at: crate::current_timestamp(),
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_old_price(mut self, old_price: Money) -> Self {
        self.old_price = Some(old_price);
        self
    }

    pub fn with_categories(mut self, categories: Vec<CategoryId>) -> Self {
        self.category_ids = categories;
        self
    }

    pub fn with_manufacturers(mut self, manufacturers: Vec<ManufacturerId>) -> Self {
        self.manufacturer_ids = manufacturers;
        self
    }

    pub fn with_inventory(mut self, inventory: InventoryLevel) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_attribute(mut self, mapping: ProductAttributeMapping) -> Self {
        self.attributes.push(mapping);
        self
    }

    pub fn with_tier_price(mut self, quantity: i64, price: Money) -> Self {
        self.tier_prices.push(TierPrice {
            quantity,
            price,
            customer_role: None,
            store_id: None,
        });
        self.tier_prices.sort_by_key(|tp| tp.quantity);
        self
    }

    /// Whether the product can be shown in the given store.
    pub fn is_available_in_store(&self, store_id: StoreId) -> bool {
        self.limited_to_stores.is_empty() || self.limited_to_stores.contains(&store_id)
    }

    /// Whether the product can appear on storefront pages at all.
    pub fn is_visible(&self, store_id: StoreId) -> bool {
        self.published && !self.deleted && self.is_available_in_store(store_id)
    }

    pub fn has_tier_prices(&self) -> bool {
        !self.tier_prices.is_empty()
    }

    pub fn attribute(&self, id: AttributeMappingId) -> Option<&ProductAttributeMapping> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Average approved rating rounded down, 0 when unrated.
    pub fn rating_average(&self) -> i64 {
        if self.approved_total_reviews == 0 {
            0
        } else {
            self.approved_rating_sum / self.approved_total_reviews
        }
    }

    /// Parsed list of allowed quantities, empty when unrestricted.
    pub fn parse_allowed_quantities(&self) -> Vec<i64> {
        self.allowed_quantities
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|q| q.trim().parse::<i64>().ok())
            .filter(|q| *q > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_store_limitation() {
        let mut product = Product::new(ProductId::new(1), "Mug", Money::new(500, Currency::USD));
        assert!(product.is_available_in_store(StoreId::new(2)));

        product.limited_to_stores = vec![StoreId::new(1)];
        assert!(product.is_visible(StoreId::new(1)));
        assert!(!product.is_visible(StoreId::new(2)));
    }

    #[test]
    fn test_tier_prices_sorted() {
        let product = Product::new(ProductId::new(1), "Mug", Money::new(500, Currency::USD))
            .with_tier_price(10, Money::new(400, Currency::USD))
            .with_tier_price(5, Money::new(450, Currency::USD));
        assert_eq!(product.tier_prices[0].quantity, 5);
        assert!(product.has_tier_prices());
    }

    #[test]
    fn test_allowed_quantities() {
        let mut product = Product::new(ProductId::new(1), "Mug", Money::new(500, Currency::USD));
        assert!(product.parse_allowed_quantities().is_empty());
        product.allowed_quantities = Some("1, 5,x,10".to_string());
        assert_eq!(product.parse_allowed_quantities(), vec![1, 5, 10]);
    }

    #[test]
    fn test_rating_average() {
        let mut product = Product::new(ProductId::new(1), "Mug", Money::new(500, Currency::USD));
        assert_eq!(product.rating_average(), 0);
        product.approved_rating_sum = 9;
        product.approved_total_reviews = 2;
        assert_eq!(product.rating_average(), 4);
    }
}
