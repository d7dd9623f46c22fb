//! Shopping cart and wishlist items.

use std::collections::BTreeMap;

use crate::ids::{AttributeMappingId, AttributeValueId, CartItemId, CustomerId, ProductId, StoreId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Which list an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShoppingCartType {
    #[default]
    ShoppingCart,
    Wishlist,
}

impl ShoppingCartType {
    /// Parse the numeric form value used by add-to-cart buttons (1 cart, 2 wishlist).
    pub fn from_form_value(value: i32) -> Option<Self> {
        match value {
            1 => Some(ShoppingCartType::ShoppingCart),
            2 => Some(ShoppingCartType::Wishlist),
            _ => None,
        }
    }
}

/// A customer's attribute choices for one cart line.
///
/// Value ids are kept sorted so two selections of the same values compare
/// equal regardless of the order they were submitted in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SelectedAttributes {
    values: BTreeMap<AttributeMappingId, Vec<AttributeValueId>>,
    texts: BTreeMap<AttributeMappingId, String>,
}

impl SelectedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selected value for an attribute.
    pub fn select(&mut self, mapping: AttributeMappingId, value: AttributeValueId) {
        let entry = self.values.entry(mapping).or_default();
        if !entry.contains(&value) {
            entry.push(value);
            entry.sort();
        }
    }

    /// Set free text for a text attribute. Blank text clears it.
    pub fn set_text(&mut self, mapping: AttributeMappingId, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            self.texts.remove(&mapping);
        } else {
            self.texts.insert(mapping, text.trim().to_string());
        }
    }

    pub fn values_for(&self, mapping: AttributeMappingId) -> &[AttributeValueId] {
        self.values.get(&mapping).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn text_for(&self, mapping: AttributeMappingId) -> Option<&str> {
        self.texts.get(&mapping).map(String::as_str)
    }

    /// Whether anything at all was chosen for `mapping`.
    pub fn has_selection(&self, mapping: AttributeMappingId) -> bool {
        !self.values_for(mapping).is_empty() || self.texts.contains_key(&mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.texts.is_empty()
    }

    /// All selected `(mapping, value)` pairs.
    pub fn selected_values(&self) -> impl Iterator<Item = (AttributeMappingId, AttributeValueId)> + '_ {
        self.values
            .iter()
            .flat_map(|(mapping, values)| values.iter().map(move |v| (*mapping, *v)))
    }
}

/// A line in a customer's shopping cart or wishlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoppingCartItem {
    pub id: CartItemId,
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    pub cart_type: ShoppingCartType,
    pub product_id: ProductId,
    pub attributes: SelectedAttributes,
    /// Price typed by the customer for customer-entered-price products.
    pub customer_entered_price: Option<Money>,
    pub quantity: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ShoppingCartItem {
    /// Whether this line is the same purchase as the given selection, so
    /// adding it again should increase the quantity instead of adding a line.
    pub fn is_same_selection(
        &self,
        product_id: ProductId,
        attributes: &SelectedAttributes,
        customer_entered_price: Option<Money>,
    ) -> bool {
        self.product_id == product_id
            && &self.attributes == attributes
            && self.customer_entered_price == customer_entered_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_order_independent() {
        let mut a = SelectedAttributes::new();
        a.select(AttributeMappingId::new(1), AttributeValueId::new(3));
        a.select(AttributeMappingId::new(1), AttributeValueId::new(2));

        let mut b = SelectedAttributes::new();
        b.select(AttributeMappingId::new(1), AttributeValueId::new(2));
        b.select(AttributeMappingId::new(1), AttributeValueId::new(3));
        b.select(AttributeMappingId::new(1), AttributeValueId::new(3));

        assert_eq!(a, b);
        assert_eq!(a.selected_values().count(), 2);
    }

    #[test]
    fn test_blank_text_clears() {
        let mut a = SelectedAttributes::new();
        a.set_text(AttributeMappingId::new(4), " Happy birthday ");
        assert_eq!(a.text_for(AttributeMappingId::new(4)), Some("Happy birthday"));
        a.set_text(AttributeMappingId::new(4), "   ");
        assert!(a.is_empty());
    }

    #[test]
    fn test_cart_type_from_form_value() {
        assert_eq!(
            ShoppingCartType::from_form_value(2),
            Some(ShoppingCartType::Wishlist)
        );
        assert_eq!(ShoppingCartType::from_form_value(7), None);
    }
}
