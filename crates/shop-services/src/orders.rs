//! Orders and order placement.

use std::sync::Arc;

use shop_domain::cart::ShoppingCartType;
use shop_domain::catalog::LowStockActivity;
use shop_domain::checkout::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingStatus};
use shop_domain::discount::DiscountUsage;
use shop_domain::prelude::*;
use uuid::Uuid;

use crate::cart::{describe_attributes, CartItemRequest, CartLine, ShoppingCartService};
use crate::catalog::ProductService;
use crate::customers::CustomerService;
use crate::discounts::{DiscountService, GiftCardService};
use crate::memory::MemoryStore;
use crate::messages::WorkflowMessageService;
use crate::payments::{PaymentService, ProcessPaymentRequest, ProcessPaymentResult};
use crate::pricing::{CurrencyService, PriceCalculationService, TaxService};
use crate::scope::StoreScope;
use crate::shipping::ShippingService;
use crate::totals::{selected_shipping_option, OrderTotalCalculationService};
use crate::ServiceError;

pub trait OrderService: Send + Sync {
    fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, ServiceError>;

    fn get_order_by_guid(&self, guid: &str) -> Result<Option<Order>, ServiceError>;

    /// A customer's orders in one store, newest first.
    fn get_orders_by_customer(&self, customer_id: CustomerId, store_id: StoreId) -> Result<Vec<Order>, ServiceError>;

    /// Store a new order and return it with its id.
    fn insert_order(&self, order: Order) -> Result<Order, ServiceError>;

    fn update_order(&self, order: &Order) -> Result<(), ServiceError>;
}

impl OrderService for MemoryStore {
    fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, ServiceError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    fn get_order_by_guid(&self, guid: &str) -> Result<Option<Order>, ServiceError> {
        let Ok(guid) = Uuid::parse_str(guid.trim()) else {
            return Ok(None);
        };
        Ok(self.read()?.orders.values().find(|o| o.guid == guid).cloned())
    }

    fn get_orders_by_customer(&self, customer_id: CustomerId, store_id: StoreId) -> Result<Vec<Order>, ServiceError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id && o.store_id == store_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    fn insert_order(&self, mut order: Order) -> Result<Order, ServiceError> {
        let mut tables = self.write()?;
        order.id = OrderId::new(tables.next_id());
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn update_order(&self, order: &Order) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| ServiceError::not_found("Order", order.id))?;
        *stored = order.clone();
        Ok(())
    }
}

/// Outcome of placing an order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceOrderResult {
    pub placed_order: Option<Order>,
    pub errors: Vec<String>,
}

impl PlaceOrderResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.placed_order.is_some()
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            placed_order: None,
            errors,
        }
    }
}

pub trait OrderProcessingService: Send + Sync {
    /// Validate the cart, take payment, create the order and clear the cart.
    /// Business rule failures come back as `errors`, not as `Err`.
    fn place_order(&self, scope: &StoreScope<'_>, request: &ProcessPaymentRequest) -> Result<PlaceOrderResult, ServiceError>;

    /// Put the lines of a previous order back into the cart. Returns warnings.
    fn reorder(&self, scope: &StoreScope<'_>, order: &Order) -> Result<Vec<String>, ServiceError>;

    fn validate_min_order_subtotal_amount(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError>;

    fn validate_min_order_total_amount(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError>;

    /// Whether the customer has to pick and pay with a payment method.
    fn is_payment_workflow_required(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError>;
}

pub struct DefaultOrderProcessingService {
    pub cart: Arc<dyn ShoppingCartService>,
    pub totals: Arc<dyn OrderTotalCalculationService>,
    pub prices: Arc<dyn PriceCalculationService>,
    pub tax: Arc<dyn TaxService>,
    pub currency: Arc<dyn CurrencyService>,
    pub shipping: Arc<dyn ShippingService>,
    pub payments: Arc<dyn PaymentService>,
    pub orders: Arc<dyn OrderService>,
    pub discounts: Arc<dyn DiscountService>,
    pub gift_cards: Arc<dyn GiftCardService>,
    pub products: Arc<dyn ProductService>,
    pub customers: Arc<dyn CustomerService>,
    pub messages: Arc<dyn WorkflowMessageService>,
}

impl DefaultOrderProcessingService {
    fn validate_cart(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<Vec<String>, ServiceError> {
        let mut errors = Vec::new();
        if cart.is_empty() {
            errors.push("Cart is empty".to_string());
            return Ok(errors);
        }
        if scope.customer.is_guest() && !scope.settings.order.anonymous_checkout_allowed {
            errors.push("Anonymous checkout is not allowed".to_string());
        }
        errors.extend(self.cart.get_cart_warnings(scope, cart));
        for line in cart {
            errors.extend(self.cart.get_item_warnings(
                scope,
                &CartItemRequest {
                    cart_type: ShoppingCartType::ShoppingCart,
                    product: &line.product,
                    attributes: &line.item.attributes,
                    customer_entered_price: line.item.customer_entered_price,
                    quantity: line.item.quantity,
                },
            ));
        }
        if !self.validate_min_order_subtotal_amount(scope, cart)? {
            errors.push(format!(
                "Minimum order sub-total amount is {}",
                Money::new(scope.settings.order.min_order_subtotal_cents, scope.primary_currency()).display()
            ));
        }
        let billing_ok = scope.customer.billing_address().is_some_and(|a| a.is_complete());
        if !billing_ok {
            errors.push("Billing address is not provided".to_string());
        }
        if self.shipping.requires_shipping(cart) {
            if !scope.customer.shipping_address().is_some_and(|a| a.is_complete()) {
                errors.push("Shipping address is not provided".to_string());
            }
            if selected_shipping_option(scope).is_none() {
                errors.push("Shipping method is not selected".to_string());
            }
        }
        Ok(errors)
    }

    fn build_items(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<(Vec<OrderItem>, Vec<DiscountId>), ServiceError> {
        let tax = &scope.settings.tax;
        let mut items = Vec::with_capacity(cart.len());
        let mut discounts = Vec::new();
        for line in cart {
            let quantity = line.item.quantity;
            let unit = self.prices.unit_price(scope, line, true)?;
            let unit_taxed = self.tax.product_price(tax, &line.product, unit.price);
            let total_taxed = self.tax.product_price(tax, &line.product, unit.price.try_multiply(quantity)?);
            let discount_taxed = self
                .tax
                .product_price(tax, &line.product, unit.discount_amount.try_multiply(quantity)?);
            if let Some(id) = unit.applied_discount {
                discounts.push(id);
            }
            items.push(OrderItem {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                sku: line.product.sku.clone(),
                attributes: line.item.attributes.clone(),
                attribute_description: describe_attributes(&line.product, &line.item.attributes, "\n"),
                quantity,
                unit_price_incl_tax: unit_taxed.incl_tax,
                unit_price_excl_tax: unit_taxed.excl_tax,
                price_incl_tax: total_taxed.incl_tax,
                price_excl_tax: total_taxed.excl_tax,
                discount_incl_tax: discount_taxed.incl_tax,
                discount_excl_tax: discount_taxed.excl_tax,
            });
        }
        Ok((items, discounts))
    }

    fn commit_inventory(&self, cart: &[CartLine]) -> Result<(), ServiceError> {
        for line in cart {
            let Some(mut product) = self.products.get_product_by_id(line.product.id)? else {
                continue;
            };
            match product.inventory.commit(line.item.quantity) {
                Some(LowStockActivity::DisableBuyButton) => {
                    product.disable_buy_button = true;
                    product.disable_wishlist_button = true;
                }
                Some(LowStockActivity::Unpublish) => product.published = false,
                _ => {}
            }
            self.products.update_product(&product)?;
        }
        Ok(())
    }
}

impl OrderProcessingService for DefaultOrderProcessingService {
    fn place_order(&self, scope: &StoreScope<'_>, request: &ProcessPaymentRequest) -> Result<PlaceOrderResult, ServiceError> {
        let customer = scope.customer;
        let store = scope.store;
        let currency = scope.primary_currency();
        let cart = self
            .cart
            .get_cart_lines(customer.id, ShoppingCartType::ShoppingCart, store.id)?;

        let errors = self.validate_cart(scope, &cart)?;
        if !errors.is_empty() {
            return Ok(PlaceOrderResult::failed(errors));
        }

        let payment_method = request.payment_method_system_name.as_str();
        let subtotal_incl = self.totals.get_shopping_cart_subtotal(scope, &cart, true)?;
        let subtotal_excl = self.totals.get_shopping_cart_subtotal(scope, &cart, false)?;
        let shipping_incl = self.totals.get_shopping_cart_shipping_total(scope, &cart, true)?;
        let shipping_excl = self.totals.get_shopping_cart_shipping_total(scope, &cart, false)?;
        let (Some(shipping_incl), Some(shipping_excl)) = (shipping_incl, shipping_excl) else {
            return Ok(PlaceOrderResult::failed(vec!["Shipping total couldn't be calculated".to_string()]));
        };
        let fee = self.totals.get_payment_additional_fee(scope, payment_method);
        let fee_taxed = self.tax.payment_fee(&scope.settings.tax, fee);
        let tax = self.totals.get_tax_total(scope, &cart, Some(payment_method))?;
        let Some(order_total) = self.totals.get_shopping_cart_total(scope, &cart, Some(payment_method))? else {
            return Ok(PlaceOrderResult::failed(vec!["Order total couldn't be calculated".to_string()]));
        };
        if !self.validate_min_order_total_amount(scope, &cart)? {
            return Ok(PlaceOrderResult::failed(vec![format!(
                "Minimum order total amount is {}",
                Money::new(scope.settings.order.min_order_total_cents, currency).display()
            )]));
        }

        let payment = if order_total.total.is_positive() {
            if !self.payments.is_payment_method_active(&scope.settings.payment, payment_method) {
                return Ok(PlaceOrderResult::failed(vec!["Payment method couldn't be loaded".to_string()]));
            }
            let Some(method) = self.payments.load_payment_method_by_system_name(payment_method) else {
                return Ok(PlaceOrderResult::failed(vec!["Payment method couldn't be loaded".to_string()]));
            };
            let request = ProcessPaymentRequest {
                store_id: store.id,
                customer_id: customer.id,
                order_total: Some(order_total.total),
                ..request.clone()
            };
            let result = method.process_payment(&request);
            if !result.success() {
                tracing::warn!(customer_id = %customer.id, method = payment_method, "payment failed");
                return Ok(PlaceOrderResult::failed(result.errors));
            }
            result
        } else {
            ProcessPaymentResult {
                errors: Vec::new(),
                new_payment_status: PaymentStatus::Paid,
                authorization_transaction_id: None,
            }
        };

        let (items, item_discounts) = self.build_items(scope, &cart)?;
        let requires_shipping = self.shipping.requires_shipping(&cart);
        let shipping_option = selected_shipping_option(scope).filter(|_| requires_shipping);
        let billing_address = customer
            .billing_address()
            .cloned()
            .ok_or_else(|| ServiceError::Validation("Billing address is not provided".into()))?;
        let customer_currency = scope.customer_currency();
        let currency_rate = if customer_currency == currency {
            1.0
        } else {
            self.currency.get_rate(customer_currency)?.unwrap_or(1.0)
        };

        let mut order = Order {
            id: OrderId::default(),
            guid: request.order_guid.unwrap_or_else(Uuid::new_v4),
            store_id: store.id,
            customer_id: customer.id,
            status: if payment.new_payment_status == PaymentStatus::Paid {
                OrderStatus::Processing
            } else {
                OrderStatus::Pending
            },
            payment_status: payment.new_payment_status,
            shipping_status: if requires_shipping {
                ShippingStatus::NotYetShipped
            } else {
                ShippingStatus::ShippingNotRequired
            },
            billing_address,
            shipping_address: if requires_shipping { customer.shipping_address().cloned() } else { None },
            shipping_method: shipping_option.as_ref().map(|o| o.name.clone()),
            shipping_provider: shipping_option.as_ref().map(|o| o.provider_system_name.clone()),
            payment_method_system_name: payment_method.to_string(),
            customer_currency,
            currency_rate,
            tax_display_type: scope.tax_display_type(),
            items,
            subtotal_incl_tax: subtotal_incl.subtotal_without_discount,
            subtotal_excl_tax: subtotal_excl.subtotal_without_discount,
            subtotal_discount_incl_tax: subtotal_incl.discount_amount,
            subtotal_discount_excl_tax: subtotal_excl.discount_amount,
            shipping_incl_tax: shipping_incl.amount,
            shipping_excl_tax: shipping_excl.amount,
            payment_fee_incl_tax: fee_taxed.incl_tax,
            payment_fee_excl_tax: fee_taxed.excl_tax,
            tax: tax.total,
            tax_rates: tax.rates,
            order_discount: order_total.order_discount,
            gift_cards_used: order_total
                .applied_gift_cards
                .iter()
                .map(|g| (g.gift_card.id, g.amount_applied))
                .collect(),
            total: order_total.total,
            notes: Vec::new(),
            authorization_transaction_id: payment.authorization_transaction_id.clone(),
            created_at: current_timestamp(),
        };
        order.add_note("Order placed", false);
        let order = self.orders.insert_order(order)?;

        let mut used_discounts: Vec<DiscountId> = item_discounts;
        used_discounts.extend(subtotal_excl.applied_discount);
        used_discounts.extend(shipping_excl.applied_discount);
        used_discounts.extend(order_total.applied_discount);
        used_discounts.sort();
        used_discounts.dedup();
        for discount_id in used_discounts {
            self.discounts.insert_discount_usage(DiscountUsage {
                discount_id,
                order_id: order.id,
                customer_id: customer.id,
            })?;
        }
        for applied in &order_total.applied_gift_cards {
            self.gift_cards
                .add_gift_card_usage(applied.gift_card.id, order.id, applied.amount_applied)?;
        }

        self.commit_inventory(&cart)?;
        for line in &cart {
            self.cart.delete_cart_item(line.item.id)?;
        }
        self.customers.reset_checkout_data(customer.id, store.id, true)?;

        let email = match customer.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => order.billing_address.email.clone(),
        };
        if let Err(e) = self.messages.send_order_placed_message(store, &email, &order) {
            tracing::warn!(order_id = %order.id, error = %e, "order receipt not queued");
        }

        tracing::info!(
            order_id = %order.id,
            customer_id = %customer.id,
            total = %order.total,
            payment_status = %order.payment_status,
            "order placed"
        );
        Ok(PlaceOrderResult {
            placed_order: Some(order),
            errors: Vec::new(),
        })
    }

    fn reorder(&self, scope: &StoreScope<'_>, order: &Order) -> Result<Vec<String>, ServiceError> {
        let mut warnings = Vec::new();
        for item in &order.items {
            let Some(product) = self.products.get_product_by_id(item.product_id)? else {
                warnings.push(format!("Product '{}' no longer exists", item.product_name));
                continue;
            };
            warnings.extend(self.cart.add_to_cart(
                scope,
                &CartItemRequest {
                    cart_type: ShoppingCartType::ShoppingCart,
                    product: &product,
                    attributes: &item.attributes,
                    customer_entered_price: None,
                    quantity: item.quantity,
                },
            )?);
        }
        Ok(warnings)
    }

    fn validate_min_order_subtotal_amount(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError> {
        let min = scope.settings.order.min_order_subtotal_cents;
        if min <= 0 || cart.is_empty() {
            return Ok(true);
        }
        let subtotal = self.totals.get_shopping_cart_subtotal(scope, cart, false)?;
        Ok(subtotal.subtotal_without_discount.amount_cents >= min)
    }

    fn validate_min_order_total_amount(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError> {
        let min = scope.settings.order.min_order_total_cents;
        if min <= 0 || cart.is_empty() {
            return Ok(true);
        }
        Ok(match self.totals.get_shopping_cart_total(scope, cart, None)? {
            Some(total) => total.total.amount_cents >= min,
            None => true,
        })
    }

    fn is_payment_workflow_required(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError> {
        Ok(match self.totals.get_shopping_cart_total(scope, cart, None)? {
            Some(total) => total.total.is_positive(),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageTemplate, QueuedMessageService};
    use crate::payments::{DefaultPaymentService, CHECK_MONEY_ORDER};
    use crate::pricing::{DefaultPriceCalculationService, DefaultTaxService};
    use crate::shipping::FixedRateShippingService;
    use crate::totals::DefaultOrderTotalCalculationService;
    use shop_domain::cart::SelectedAttributes;
    use shop_domain::checkout::ShippingOption;
    use shop_domain::customer::CustomerAttribute;
    use shop_domain::settings::StoreSettings;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn processing(memory: &Arc<MemoryStore>) -> DefaultOrderProcessingService {
        let prices: Arc<dyn PriceCalculationService> = Arc::new(DefaultPriceCalculationService::new(memory.clone()));
        let tax: Arc<dyn TaxService> = Arc::new(DefaultTaxService);
        let shipping: Arc<dyn ShippingService> = Arc::new(FixedRateShippingService);
        DefaultOrderProcessingService {
            cart: memory.clone(),
            totals: Arc::new(DefaultOrderTotalCalculationService::new(
                prices.clone(),
                tax.clone(),
                memory.clone(),
                memory.clone(),
                shipping.clone(),
            )),
            prices,
            tax,
            currency: memory.clone(),
            shipping,
            payments: Arc::new(DefaultPaymentService::with_standard_methods("https://pay.example.com")),
            orders: memory.clone(),
            discounts: memory.clone(),
            gift_cards: memory.clone(),
            products: memory.clone(),
            customers: memory.clone(),
            messages: Arc::new(QueuedMessageService::new(memory.clone())),
        }
    }

    fn address() -> Address {
        Address {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            address1: "1 Engine Way".into(),
            city: "London".into(),
            country_code: "GB".into(),
            zip: "N1".into(),
            ..Default::default()
        }
    }

    /// A guest with an address book entry used for shipping and, optionally, billing.
    fn checkout_customer(memory: &MemoryStore, with_billing: bool) -> Customer {
        let customer = memory.insert_guest_customer().unwrap();
        let saved = memory.insert_address(customer.id, address()).unwrap();
        let mut customer = memory.get_customer_by_id(customer.id).unwrap().unwrap();
        if with_billing {
            customer.billing_address_id = Some(saved.id);
        }
        customer.shipping_address_id = Some(saved.id);
        memory.update_customer(&customer).unwrap();
        customer
    }

    /// Pick ground shipping. Adding to the cart resets this, so call it last.
    fn select_ground(memory: &MemoryStore, customer_id: CustomerId, store_id: StoreId) -> Customer {
        let option = ShippingOption {
            name: "Ground".into(),
            description: None,
            rate: usd(500),
            provider_system_name: "Shipping.FixedRate".into(),
        };
        memory
            .save_attribute(
                customer_id,
                store_id,
                CustomerAttribute::SelectedShippingOption,
                serde_json::to_string(&option).ok(),
            )
            .unwrap();
        memory.get_customer_by_id(customer_id).unwrap().unwrap()
    }

    fn add(memory: &MemoryStore, scope: &StoreScope<'_>, product: &Product, quantity: i64) {
        let attributes = SelectedAttributes::new();
        let warnings = memory
            .add_to_cart(
                scope,
                &CartItemRequest {
                    cart_type: ShoppingCartType::ShoppingCart,
                    product,
                    attributes: &attributes,
                    customer_entered_price: None,
                    quantity,
                },
            )
            .unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    fn check_payment() -> ProcessPaymentRequest {
        ProcessPaymentRequest {
            payment_method_system_name: CHECK_MONEY_ORDER.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_place_order_commits_stock_and_clears_cart() {
        let memory = Arc::new(MemoryStore::new());
        let service = processing(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let settings = StoreSettings::default();
        let mut inventory = InventoryLevel::new(5);
        inventory.min_stock_quantity = 3;
        inventory.low_stock_activity = LowStockActivity::DisableBuyButton;
        let product = Product::new(ProductId::default(), "Lamp", usd(1000)).with_inventory(inventory);
        let product_id = memory.add_product(product).unwrap();
        let product = memory.get_product_by_id(product_id).unwrap().unwrap();

        let customer = checkout_customer(&memory, true);
        add(&memory, &StoreScope::new(&store, &customer, &settings), &product, 2);
        let customer = select_ground(&memory, customer.id, store.id);
        let scope = StoreScope::new(&store, &customer, &settings);

        let result = service.place_order(&scope, &check_payment()).unwrap();
        assert!(result.success(), "{:?}", result.errors);
        let order = result.placed_order.unwrap();
        assert_eq!(order.total, usd(2500));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.shipping_method.as_deref(), Some("Ground"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(memory.get_order_by_guid(&order.guid.to_string()).unwrap().unwrap().id, order.id);

        let product = memory.get_product_by_id(product_id).unwrap().unwrap();
        assert_eq!(product.inventory.quantity, 3);
        assert!(product.disable_buy_button);

        assert!(memory
            .get_cart(customer.id, ShoppingCartType::ShoppingCart, store.id)
            .unwrap()
            .is_empty());
        let customer = memory.get_customer_by_id(customer.id).unwrap().unwrap();
        assert_eq!(customer.attribute(store.id, CustomerAttribute::SelectedShippingOption), None);

        let emails = memory.queued_emails().unwrap();
        assert!(emails
            .iter()
            .any(|e| matches!(e.template, MessageTemplate::OrderPlaced) && e.to == "ada@example.com"));
    }

    #[test]
    fn test_missing_billing_address_is_reported() {
        let memory = Arc::new(MemoryStore::new());
        let service = processing(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let settings = StoreSettings::default();
        let product_id = memory
            .add_product(Product::new(ProductId::default(), "Lamp", usd(1000)))
            .unwrap();
        let product = memory.get_product_by_id(product_id).unwrap().unwrap();
        let customer = checkout_customer(&memory, false);
        add(&memory, &StoreScope::new(&store, &customer, &settings), &product, 1);
        let customer = select_ground(&memory, customer.id, store.id);

        let result = service
            .place_order(&StoreScope::new(&store, &customer, &settings), &check_payment())
            .unwrap();
        assert!(!result.success());
        assert!(result.errors.contains(&"Billing address is not provided".to_string()));
        assert!(memory.get_orders_by_customer(customer.id, store.id).unwrap().is_empty());
    }

    #[test]
    fn test_minimum_subtotal_and_reorder() {
        let memory = Arc::new(MemoryStore::new());
        let service = processing(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let mut settings = StoreSettings::default();
        let product_id = memory
            .add_product(Product::new(ProductId::default(), "Mug", usd(400)))
            .unwrap();
        let product = memory.get_product_by_id(product_id).unwrap().unwrap();
        let customer = checkout_customer(&memory, true);
        add(&memory, &StoreScope::new(&store, &customer, &settings), &product, 1);
        let customer = select_ground(&memory, customer.id, store.id);

        settings.order.min_order_subtotal_cents = 1000;
        let scope = StoreScope::new(&store, &customer, &settings);
        let cart = memory
            .get_cart_lines(customer.id, ShoppingCartType::ShoppingCart, store.id)
            .unwrap();
        assert!(!service.validate_min_order_subtotal_amount(&scope, &cart).unwrap());
        let result = service.place_order(&scope, &check_payment()).unwrap();
        assert_eq!(result.errors, vec!["Minimum order sub-total amount is $10.00".to_string()]);

        settings.order.min_order_subtotal_cents = 0;
        let scope = StoreScope::new(&store, &customer, &settings);
        assert!(service.is_payment_workflow_required(&scope, &cart).unwrap());
        let order = service.place_order(&scope, &check_payment()).unwrap().placed_order.unwrap();

        let customer = memory.get_customer_by_id(customer.id).unwrap().unwrap();
        let scope = StoreScope::new(&store, &customer, &settings);
        assert!(service.reorder(&scope, &order).unwrap().is_empty());
        let cart = memory
            .get_cart(customer.id, ShoppingCartType::ShoppingCart, store.id)
            .unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 1);
    }
}
