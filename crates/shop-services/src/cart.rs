//! Shopping cart and wishlist lines.

use shop_domain::cart::{SelectedAttributes, ShoppingCartItem, ShoppingCartType};
use shop_domain::catalog::{AttributeControlType, Product};
use shop_domain::prelude::*;

use crate::customers::CustomerService;
use crate::memory::MemoryStore;
use crate::scope::StoreScope;
use crate::ServiceError;

/// A cart item together with its product.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: ShoppingCartItem,
    pub product: Product,
}

/// One purchase to add or validate.
#[derive(Debug, Clone)]
pub struct CartItemRequest<'a> {
    pub cart_type: ShoppingCartType,
    pub product: &'a Product,
    pub attributes: &'a SelectedAttributes,
    pub customer_entered_price: Option<Money>,
    pub quantity: i64,
}

pub trait ShoppingCartService: Send + Sync {
    /// Items of one cart, oldest first.
    fn get_cart(
        &self,
        customer_id: CustomerId,
        cart_type: ShoppingCartType,
        store_id: StoreId,
    ) -> Result<Vec<ShoppingCartItem>, ServiceError>;

    /// Items joined with their products; lines whose product vanished are skipped.
    fn get_cart_lines(
        &self,
        customer_id: CustomerId,
        cart_type: ShoppingCartType,
        store_id: StoreId,
    ) -> Result<Vec<CartLine>, ServiceError>;

    fn get_cart_item(&self, id: CartItemId) -> Result<Option<ShoppingCartItem>, ServiceError>;

    /// Add a product, merging into an identical line. Returns warnings;
    /// nothing is stored when there are any.
    fn add_to_cart(&self, scope: &StoreScope<'_>, request: &CartItemRequest<'_>) -> Result<Vec<String>, ServiceError>;

    /// Replace the selection and quantity of a line. Quantity 0 deletes it.
    fn update_cart_item(
        &self,
        scope: &StoreScope<'_>,
        item_id: CartItemId,
        attributes: Option<&SelectedAttributes>,
        customer_entered_price: Option<Money>,
        quantity: i64,
    ) -> Result<Vec<String>, ServiceError>;

    fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ServiceError>;

    /// Move a guest's lines to the customer they signed in as.
    fn migrate_cart(&self, from: CustomerId, to: CustomerId, store_id: StoreId) -> Result<(), ServiceError>;

    /// Problems with buying `request.quantity` of the product as selected.
    fn get_item_warnings(&self, scope: &StoreScope<'_>, request: &CartItemRequest<'_>) -> Vec<String> {
        let mut warnings = Vec::new();
        let product = request.product;

        if product.deleted {
            warnings.push("Product is deleted".to_string());
            return warnings;
        }
        if !product.published {
            warnings.push("Product is not published".to_string());
        }
        if !product.is_available_in_store(scope.store.id) {
            warnings.push("Product is not available in this store".to_string());
        }
        match request.cart_type {
            ShoppingCartType::ShoppingCart if product.disable_buy_button => {
                warnings.push("Buying is disabled for this product".to_string());
            }
            ShoppingCartType::Wishlist if product.disable_wishlist_button => {
                warnings.push("Wishlist is disabled for this product".to_string());
            }
            _ => {}
        }

        let quantity = request.quantity;
        if quantity <= 0 {
            warnings.push("Quantity should be positive".to_string());
        } else {
            if quantity < product.order_minimum_quantity {
                warnings.push(format!(
                    "The minimum quantity allowed for purchase is {}.",
                    product.order_minimum_quantity
                ));
            }
            if quantity > product.order_maximum_quantity {
                warnings.push(format!(
                    "The maximum quantity allowed for purchase is {}.",
                    product.order_maximum_quantity
                ));
            }
            let allowed = product.parse_allowed_quantities();
            if !allowed.is_empty() && !allowed.contains(&quantity) {
                let list: Vec<String> = allowed.iter().map(i64::to_string).collect();
                warnings.push(format!("Allowed quantities for this product: {}", list.join(", ")));
            }
            if request.cart_type == ShoppingCartType::ShoppingCart && !product.inventory.can_fulfill(quantity) {
                let on_hand = product.inventory.quantity;
                if on_hand > 0 {
                    warnings.push(format!(
                        "Your quantity exceeds stock on hand. The maximum quantity that can be added is {}.",
                        on_hand
                    ));
                } else {
                    warnings.push("Out of stock".to_string());
                }
            }
        }

        warnings.extend(attribute_warnings(product, request.attributes));

        if product.customer_enters_price {
            let min = &product.minimum_customer_entered_price;
            let max = &product.maximum_customer_entered_price;
            let in_range = request
                .customer_entered_price
                .is_some_and(|p| p.amount_cents >= min.amount_cents && p.amount_cents <= max.amount_cents);
            if !in_range {
                warnings.push(format!("The price must be from {} to {}", min.display(), max.display()));
            }
        }
        warnings
    }

    /// Problems with the cart as a whole.
    fn get_cart_warnings(&self, scope: &StoreScope<'_>, lines: &[CartLine]) -> Vec<String> {
        let mut warnings = Vec::new();
        let max = scope.settings.shopping_cart.maximum_shopping_cart_items;
        let cart_lines = lines
            .iter()
            .filter(|l| l.item.cart_type == ShoppingCartType::ShoppingCart)
            .count();
        if cart_lines > max {
            warnings.push(format!(
                "The maximum number of distinct products allowed in the cart is {}.",
                max
            ));
        }
        for line in lines {
            if !line.product.is_visible(scope.store.id) {
                warnings.push(format!("Product '{}' is no longer available", line.product.name));
            }
        }
        warnings
    }
}

/// Required attributes without a selection and selections the product
/// doesn't offer.
pub fn attribute_warnings(product: &Product, selected: &SelectedAttributes) -> Vec<String> {
    let mut warnings = Vec::new();
    for mapping in &product.attributes {
        if !mapping.is_required || selected.has_selection(mapping.id) {
            continue;
        }
        let prompt = mapping.text_prompt.as_deref().unwrap_or(&mapping.name);
        if mapping.control_type.has_values() {
            warnings.push(format!("Please select {}", prompt));
        } else {
            warnings.push(format!("Please enter {}", prompt));
        }
    }
    for (mapping_id, value_id) in selected.selected_values() {
        match product.attribute(mapping_id) {
            None => warnings.push("Attribute not found".to_string()),
            Some(mapping) => {
                if mapping.value(value_id).is_none() {
                    warnings.push(format!("Selected value of {} not found", mapping.name));
                }
                if !mapping.control_type.allows_multiple() && selected.values_for(mapping_id).len() > 1 {
                    warnings.push(format!("Only one value of {} can be selected", mapping.name));
                }
            }
        }
    }
    let mut seen = Vec::new();
    warnings.retain(|w| {
        if seen.contains(w) {
            false
        } else {
            seen.push(w.clone());
            true
        }
    });
    warnings
}

/// `"Color: Red"` per selected value or entered text, joined by `separator`.
pub fn describe_attributes(product: &Product, selected: &SelectedAttributes, separator: &str) -> String {
    let mut parts = Vec::new();
    for mapping in &product.attributes {
        if mapping.control_type.has_values() {
            for value_id in selected.values_for(mapping.id) {
                if let Some(value) = mapping.value(*value_id) {
                    parts.push(format!("{}: {}", mapping.name, value.name));
                }
            }
        } else if let Some(text) = selected.text_for(mapping.id) {
            parts.push(format!("{}: {}", mapping.name, text));
        }
    }
    parts.join(separator)
}

/// Attributes preselected by the merchant, used when adding from lists.
pub fn preselected_attributes(product: &Product) -> SelectedAttributes {
    let mut selected = SelectedAttributes::new();
    for mapping in &product.attributes {
        if mapping.control_type == AttributeControlType::TextBox
            || mapping.control_type == AttributeControlType::MultilineTextbox
        {
            continue;
        }
        for value in mapping.values.iter().filter(|v| v.is_preselected) {
            selected.select(mapping.id, value.id);
        }
    }
    selected
}

impl ShoppingCartService for MemoryStore {
    fn get_cart(
        &self,
        customer_id: CustomerId,
        cart_type: ShoppingCartType,
        store_id: StoreId,
    ) -> Result<Vec<ShoppingCartItem>, ServiceError> {
        Ok(self
            .read()?
            .cart_items
            .values()
            .filter(|i| i.customer_id == customer_id && i.cart_type == cart_type && i.store_id == store_id)
            .cloned()
            .collect())
    }

    fn get_cart_lines(
        &self,
        customer_id: CustomerId,
        cart_type: ShoppingCartType,
        store_id: StoreId,
    ) -> Result<Vec<CartLine>, ServiceError> {
        let tables = self.read()?;
        Ok(tables
            .cart_items
            .values()
            .filter(|i| i.customer_id == customer_id && i.cart_type == cart_type && i.store_id == store_id)
            .filter_map(|item| {
                tables.products.get(&item.product_id).map(|product| CartLine {
                    item: item.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }

    fn get_cart_item(&self, id: CartItemId) -> Result<Option<ShoppingCartItem>, ServiceError> {
        Ok(self.read()?.cart_items.get(&id).cloned())
    }

    fn add_to_cart(&self, scope: &StoreScope<'_>, request: &CartItemRequest<'_>) -> Result<Vec<String>, ServiceError> {
        let customer_id = scope.customer.id;
        let store_id = scope.store.id;
        let cart = self.get_cart(customer_id, request.cart_type, store_id)?;
        let existing = cart.iter().find(|i| {
            i.is_same_selection(request.product.id, request.attributes, request.customer_entered_price)
        });

        if let Some(existing) = existing {
            let Some(quantity) = existing.quantity.checked_add(request.quantity) else {
                return Ok(vec![format!(
                    "The maximum quantity allowed for purchase is {}.",
                    request.product.order_maximum_quantity
                )]);
            };
            let merged = CartItemRequest {
                quantity,
                ..request.clone()
            };
            let warnings = self.get_item_warnings(scope, &merged);
            if !warnings.is_empty() {
                return Ok(warnings);
            }
            let mut tables = self.write()?;
            if let Some(item) = tables.cart_items.get_mut(&existing.id) {
                item.quantity = merged.quantity;
                item.updated_at = current_timestamp();
            }
        } else {
            let mut warnings = self.get_item_warnings(scope, request);
            let max = match request.cart_type {
                ShoppingCartType::ShoppingCart => scope.settings.shopping_cart.maximum_shopping_cart_items,
                ShoppingCartType::Wishlist => scope.settings.shopping_cart.maximum_wishlist_items,
            };
            if cart.len() >= max {
                warnings.push(format!("The maximum number of distinct products allowed is {}.", max));
            }
            if !warnings.is_empty() {
                return Ok(warnings);
            }
            let mut tables = self.write()?;
            let now = current_timestamp();
            let id = CartItemId::new(tables.next_id());
            tables.cart_items.insert(
                id,
                ShoppingCartItem {
                    id,
                    store_id,
                    customer_id,
                    cart_type: request.cart_type,
                    product_id: request.product.id,
                    attributes: request.attributes.clone(),
                    customer_entered_price: request.customer_entered_price,
                    quantity: request.quantity,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        if request.cart_type == ShoppingCartType::ShoppingCart {
            self.reset_checkout_data(customer_id, store_id, false)?;
        }
        tracing::debug!(
            customer_id = %customer_id,
            product_id = %request.product.id,
            quantity = request.quantity,
            "added to {:?}",
            request.cart_type
        );
        Ok(Vec::new())
    }

    fn update_cart_item(
        &self,
        scope: &StoreScope<'_>,
        item_id: CartItemId,
        attributes: Option<&SelectedAttributes>,
        customer_entered_price: Option<Money>,
        quantity: i64,
    ) -> Result<Vec<String>, ServiceError> {
        let item = self
            .get_cart_item(item_id)?
            .filter(|i| i.customer_id == scope.customer.id)
            .ok_or_else(|| ServiceError::not_found("ShoppingCartItem", item_id))?;

        if quantity <= 0 {
            self.delete_cart_item(item_id)?;
        } else {
            let product = {
                let tables = self.read()?;
                tables
                    .products
                    .get(&item.product_id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("Product", item.product_id))?
            };
            let attributes = attributes.unwrap_or(&item.attributes);
            let entered_price = customer_entered_price.or(item.customer_entered_price);
            let warnings = self.get_item_warnings(
                scope,
                &CartItemRequest {
                    cart_type: item.cart_type,
                    product: &product,
                    attributes,
                    customer_entered_price: entered_price,
                    quantity,
                },
            );
            if !warnings.is_empty() {
                return Ok(warnings);
            }
            let mut tables = self.write()?;
            if let Some(stored) = tables.cart_items.get_mut(&item_id) {
                stored.attributes = attributes.clone();
                stored.customer_entered_price = entered_price;
                stored.quantity = quantity;
                stored.updated_at = current_timestamp();
            }
        }

        if item.cart_type == ShoppingCartType::ShoppingCart {
            self.reset_checkout_data(scope.customer.id, scope.store.id, false)?;
        }
        Ok(Vec::new())
    }

    fn delete_cart_item(&self, item_id: CartItemId) -> Result<(), ServiceError> {
        self.write()?.cart_items.remove(&item_id);
        Ok(())
    }

    fn migrate_cart(&self, from: CustomerId, to: CustomerId, store_id: StoreId) -> Result<(), ServiceError> {
        if from == to {
            return Ok(());
        }
        let mut tables = self.write()?;
        let moving: Vec<ShoppingCartItem> = tables
            .cart_items
            .values()
            .filter(|i| i.customer_id == from && i.store_id == store_id)
            .cloned()
            .collect();
        for item in moving {
            let target = tables
                .cart_items
                .values()
                .find(|t| {
                    t.customer_id == to
                        && t.store_id == store_id
                        && t.cart_type == item.cart_type
                        && t.is_same_selection(item.product_id, &item.attributes, item.customer_entered_price)
                })
                .map(|t| t.id);
            match target {
                Some(target_id) => {
                    if let Some(t) = tables.cart_items.get_mut(&target_id) {
                        t.quantity = t.quantity.saturating_add(item.quantity);
                        t.updated_at = current_timestamp();
                    }
                    tables.cart_items.remove(&item.id);
                }
                None => {
                    if let Some(moved) = tables.cart_items.get_mut(&item.id) {
                        moved.customer_id = to;
                    }
                }
            }
        }
        tracing::debug!(from = %from, to = %to, "cart migrated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain::catalog::{InventoryLevel, ProductAttributeMapping, ProductAttributeValue};
    use shop_domain::customer::Customer;
    use shop_domain::settings::StoreSettings;
    use shop_domain::store::Store;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn color_mapping() -> ProductAttributeMapping {
        ProductAttributeMapping {
            id: AttributeMappingId::new(1),
            name: "Color".into(),
            text_prompt: None,
            is_required: true,
            control_type: AttributeControlType::DropdownList,
            display_order: 0,
            values: vec![ProductAttributeValue {
                id: AttributeValueId::new(10),
                name: "Red".into(),
                price_adjustment: usd(100),
                weight_adjustment: 0.0,
                is_preselected: true,
                display_order: 0,
            }],
        }
    }

    struct Fixture {
        memory: MemoryStore,
        store: Store,
        customer: Customer,
        settings: StoreSettings,
    }

    impl Fixture {
        fn new() -> Self {
            let memory = MemoryStore::new();
            let customer = memory.insert_guest_customer().unwrap();
            Self {
                memory,
                store: Store::new(StoreId::new(1), "Demo", "http://demo.local/"),
                customer,
                settings: StoreSettings::default(),
            }
        }

        fn scope(&self) -> StoreScope<'_> {
            StoreScope::new(&self.store, &self.customer, &self.settings)
        }
    }

    fn request<'a>(product: &'a Product, attributes: &'a SelectedAttributes, quantity: i64) -> CartItemRequest<'a> {
        CartItemRequest {
            cart_type: ShoppingCartType::ShoppingCart,
            product,
            attributes,
            customer_entered_price: None,
            quantity,
        }
    }

    #[test]
    fn test_identical_items_merge() {
        let fx = Fixture::new();
        let product = Product::new(ProductId::new(5), "Mug", usd(500));
        fx.memory.add_product(product.clone()).unwrap();
        let none = SelectedAttributes::new();

        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 1)).unwrap().is_empty());
        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 2)).unwrap().is_empty());

        let cart = fx.memory.get_cart(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
    }

    #[test]
    fn test_merge_past_maximum_quantity_is_refused() {
        let fx = Fixture::new();
        let mut product = Product::new(ProductId::new(5), "Mug", usd(500));
        product.order_maximum_quantity = 5;
        fx.memory.add_product(product.clone()).unwrap();
        let none = SelectedAttributes::new();

        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 3)).unwrap().is_empty());
        let warnings = fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 3)).unwrap();
        assert_eq!(warnings, vec!["The maximum quantity allowed for purchase is 5.".to_string()]);

        let warnings = fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, i64::MAX)).unwrap();
        assert_eq!(warnings, vec!["The maximum quantity allowed for purchase is 5.".to_string()]);

        let cart = fx.memory.get_cart(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap();
        assert_eq!(cart[0].quantity, 3);
    }

    #[test]
    fn test_distinct_product_limit() {
        let mut fx = Fixture::new();
        fx.settings.shopping_cart.maximum_shopping_cart_items = 2;
        let mug = Product::new(ProductId::new(5), "Mug", usd(500));
        let lamp = Product::new(ProductId::new(6), "Lamp", usd(2500));
        let vase = Product::new(ProductId::new(7), "Vase", usd(1200));
        for product in [&mug, &lamp, &vase] {
            fx.memory.add_product(product.clone()).unwrap();
        }
        let none = SelectedAttributes::new();

        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&mug, &none, 1)).unwrap().is_empty());
        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&lamp, &none, 1)).unwrap().is_empty());
        let warnings = fx.memory.add_to_cart(&fx.scope(), &request(&vase, &none, 1)).unwrap();
        assert_eq!(
            warnings,
            vec!["The maximum number of distinct products allowed is 2.".to_string()]
        );
        // Merging into an existing line is still allowed at the limit.
        assert!(fx.memory.add_to_cart(&fx.scope(), &request(&mug, &none, 1)).unwrap().is_empty());

        let lines = fx
            .memory
            .get_cart_lines(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id)
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(fx.memory.get_cart_warnings(&fx.scope(), &lines).is_empty());

        fx.settings.shopping_cart.maximum_shopping_cart_items = 1;
        assert_eq!(
            fx.memory.get_cart_warnings(&fx.scope(), &lines),
            vec!["The maximum number of distinct products allowed in the cart is 1.".to_string()]
        );
    }

    #[test]
    fn test_required_attribute_warning() {
        let fx = Fixture::new();
        let product = Product::new(ProductId::new(5), "Shirt", usd(1500)).with_attribute(color_mapping());
        let none = SelectedAttributes::new();
        let warnings = fx.memory.get_item_warnings(&fx.scope(), &request(&product, &none, 1));
        assert_eq!(warnings, vec!["Please select Color".to_string()]);

        let preselected = preselected_attributes(&product);
        assert!(fx.memory.get_item_warnings(&fx.scope(), &request(&product, &preselected, 1)).is_empty());
    }

    #[test]
    fn test_stock_and_quantity_limits() {
        let fx = Fixture::new();
        let mut product = Product::new(ProductId::new(5), "Lamp", usd(2500)).with_inventory(InventoryLevel::new(2));
        product.order_maximum_quantity = 10;
        let none = SelectedAttributes::new();

        let warnings = fx.memory.get_item_warnings(&fx.scope(), &request(&product, &none, 3));
        assert_eq!(
            warnings,
            vec!["Your quantity exceeds stock on hand. The maximum quantity that can be added is 2.".to_string()]
        );

        let warnings = fx.memory.get_item_warnings(&fx.scope(), &request(&product, &none, 11));
        assert!(warnings.contains(&"The maximum quantity allowed for purchase is 10.".to_string()));

        product.allowed_quantities = Some("1, 2".into());
        let mut wishlist = request(&product, &none, 3);
        wishlist.cart_type = ShoppingCartType::Wishlist;
        assert_eq!(
            fx.memory.get_item_warnings(&fx.scope(), &wishlist),
            vec!["Allowed quantities for this product: 1, 2".to_string()]
        );
    }

    #[test]
    fn test_customer_entered_price_range() {
        let fx = Fixture::new();
        let mut product = Product::new(ProductId::new(5), "Donation", usd(0));
        product.customer_enters_price = true;
        product.minimum_customer_entered_price = usd(100);
        product.maximum_customer_entered_price = usd(10_000);
        let none = SelectedAttributes::new();
        let mut req = request(&product, &none, 1);
        req.customer_entered_price = Some(usd(50));
        assert_eq!(
            fx.memory.get_item_warnings(&fx.scope(), &req),
            vec!["The price must be from $1.00 to $100.00".to_string()]
        );
        req.customer_entered_price = Some(usd(2500));
        assert!(fx.memory.get_item_warnings(&fx.scope(), &req).is_empty());
    }

    #[test]
    fn test_zero_quantity_update_deletes() {
        let fx = Fixture::new();
        let product = Product::new(ProductId::new(5), "Mug", usd(500));
        fx.memory.add_product(product.clone()).unwrap();
        let none = SelectedAttributes::new();
        fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 1)).unwrap();
        let item = fx.memory.get_cart(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap()[0].clone();

        fx.memory.update_cart_item(&fx.scope(), item.id, None, None, 0).unwrap();
        assert!(fx.memory.get_cart(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap().is_empty());
    }

    #[test]
    fn test_migrate_merges_into_existing_line() {
        let fx = Fixture::new();
        let other = fx.memory.insert_guest_customer().unwrap();
        let product = Product::new(ProductId::new(5), "Mug", usd(500));
        fx.memory.add_product(product.clone()).unwrap();
        let none = SelectedAttributes::new();

        fx.memory.add_to_cart(&fx.scope(), &request(&product, &none, 1)).unwrap();
        let other_scope = fx.scope().for_customer(&other);
        fx.memory.add_to_cart(&other_scope, &request(&product, &none, 2)).unwrap();

        fx.memory.migrate_cart(fx.customer.id, other.id, fx.store.id).unwrap();
        let cart = fx.memory.get_cart(other.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
        assert!(fx.memory.get_cart(fx.customer.id, ShoppingCartType::ShoppingCart, fx.store.id).unwrap().is_empty());
    }
}
