//! Cart subtotal, shipping, tax and order total calculation.
//!
//! All amounts are in the store's primary currency; callers convert for
//! display. A subtotal discount lowers each tax rate bucket in proportion.

use std::sync::Arc;

use shop_domain::cart::ShoppingCartItem;
use shop_domain::checkout::{ShippingOption, TaxRate};
use shop_domain::customer::CustomerAttribute;
use shop_domain::discount::{DiscountType, GiftCard};
use shop_domain::prelude::*;

use crate::cart::CartLine;
use crate::discounts::{preferred_discount, DiscountCheck, DiscountService, GiftCardService};
use crate::pricing::{PriceCalculationService, TaxService, TaxedPrice};
use crate::scope::StoreScope;
use crate::shipping::ShippingService;
use crate::ServiceError;

#[derive(Debug, Clone, PartialEq)]
pub struct CartSubTotal {
    pub subtotal_without_discount: Money,
    pub discount_amount: Money,
    pub applied_discount: Option<DiscountId>,
    pub subtotal_with_discount: Money,
    /// Tax per rate after the subtotal discount.
    pub tax_rates: Vec<TaxRate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingTotal {
    pub amount: Money,
    pub rate_percent: f64,
    pub discount_amount: Money,
    pub applied_discount: Option<DiscountId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxTotal {
    pub total: Money,
    pub rates: Vec<TaxRate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedGiftCard {
    pub gift_card: GiftCard,
    pub amount_applied: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotal {
    pub total: Money,
    pub order_discount: Money,
    pub applied_discount: Option<DiscountId>,
    pub applied_gift_cards: Vec<AppliedGiftCard>,
}

pub trait OrderTotalCalculationService: Send + Sync {
    fn get_shopping_cart_subtotal(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        include_tax: bool,
    ) -> Result<CartSubTotal, ServiceError>;

    fn is_free_shipping(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError>;

    /// Add per-product surcharges to a quoted rate and take off shipping
    /// discounts. Returns the rate, the discount and its id.
    fn adjust_shipping_rate(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        rate: Money,
    ) -> Result<(Money, Money, Option<DiscountId>), ServiceError>;

    /// `None` when the cart needs shipping but no method is selected.
    fn get_shopping_cart_shipping_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        include_tax: bool,
    ) -> Result<Option<ShippingTotal>, ServiceError>;

    fn get_payment_additional_fee(&self, scope: &StoreScope<'_>, payment_method: &str) -> Money {
        let cents = scope
            .settings
            .payment
            .additional_fees_cents
            .get(payment_method)
            .copied()
            .unwrap_or(0);
        Money::new(cents, scope.primary_currency())
    }

    fn get_tax_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        payment_method: Option<&str>,
    ) -> Result<TaxTotal, ServiceError>;

    /// `None` when shipping is required but not selected.
    fn get_shopping_cart_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        payment_method: Option<&str>,
    ) -> Result<Option<OrderTotal>, ServiceError>;
}

/// The shipping option the customer picked, if it still parses.
pub fn selected_shipping_option(scope: &StoreScope<'_>) -> Option<ShippingOption> {
    let raw = scope
        .customer
        .attribute(scope.store.id, CustomerAttribute::SelectedShippingOption)?;
    match serde_json::from_str(raw) {
        Ok(option) => Some(option),
        Err(e) => {
            tracing::warn!(customer_id = %scope.customer.id, error = %e, "unreadable shipping option");
            None
        }
    }
}

fn add_rate(rates: &mut Vec<TaxRate>, rate_percent: f64, amount: Money) -> Result<(), ServiceError> {
    if rate_percent <= 0.0 {
        return Ok(());
    }
    match rates.iter_mut().find(|r| (r.rate_percent - rate_percent).abs() < 1e-9) {
        Some(existing) => existing.amount = existing.amount.try_add(&amount)?,
        None => rates.push(TaxRate { rate_percent, amount }),
    }
    Ok(())
}

pub struct DefaultOrderTotalCalculationService {
    prices: Arc<dyn PriceCalculationService>,
    tax: Arc<dyn TaxService>,
    discounts: Arc<dyn DiscountService>,
    gift_cards: Arc<dyn GiftCardService>,
    shipping: Arc<dyn ShippingService>,
}

impl DefaultOrderTotalCalculationService {
    pub fn new(
        prices: Arc<dyn PriceCalculationService>,
        tax: Arc<dyn TaxService>,
        discounts: Arc<dyn DiscountService>,
        gift_cards: Arc<dyn GiftCardService>,
        shipping: Arc<dyn ShippingService>,
    ) -> Self {
        Self {
            prices,
            tax,
            discounts,
            gift_cards,
            shipping,
        }
    }

    fn items(cart: &[CartLine]) -> Vec<ShoppingCartItem> {
        cart.iter().map(|l| l.item.clone()).collect()
    }

    /// Shipping with and without tax, `None` when required but unselected.
    fn shipping_taxed(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
    ) -> Result<Option<(TaxedPrice, Money, Option<DiscountId>)>, ServiceError> {
        let zero = Money::zero(scope.primary_currency());
        if !self.shipping.requires_shipping(cart) || self.is_free_shipping(scope, cart)? {
            let taxed = self.tax.shipping_price(&scope.settings.tax, zero);
            return Ok(Some((taxed, zero, None)));
        }
        let Some(option) = selected_shipping_option(scope) else {
            return Ok(None);
        };
        let (rate, discount, applied) = self.adjust_shipping_rate(scope, cart, option.rate)?;
        Ok(Some((self.tax.shipping_price(&scope.settings.tax, rate), discount, applied)))
    }
}

impl OrderTotalCalculationService for DefaultOrderTotalCalculationService {
    fn get_shopping_cart_subtotal(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        include_tax: bool,
    ) -> Result<CartSubTotal, ServiceError> {
        let currency = scope.primary_currency();
        let mut excl = Money::zero(currency);
        let mut incl = Money::zero(currency);
        let mut rates = Vec::new();

        for line in cart {
            let (line_total, _) = self.prices.sub_total(scope, line, true)?;
            let taxed = self.tax.product_price(&scope.settings.tax, &line.product, line_total);
            excl = excl.try_add(&taxed.excl_tax)?;
            incl = incl.try_add(&taxed.incl_tax)?;
            add_rate(&mut rates, taxed.rate_percent, taxed.tax())?;
        }

        let items = Self::items(cart);
        let check = DiscountCheck {
            customer: scope.customer,
            store_id: scope.store.id,
            cart: &items,
            subtotal: Some(&excl),
        };
        let candidates = self
            .discounts
            .get_applicable_discounts(DiscountType::AssignedToOrderSubTotal, &check)?;
        let (discount_excl, applied_discount) = match preferred_discount(&candidates, &excl)? {
            Some((discount, amount)) => (amount, Some(discount.id)),
            None => (Money::zero(currency), None),
        };

        let ratio = if excl.is_positive() {
            discount_excl.amount_cents as f64 / excl.amount_cents as f64
        } else {
            0.0
        };
        for rate in &mut rates {
            rate.amount = rate.amount.multiply_decimal(1.0 - ratio);
        }
        let discount_incl = if applied_discount.is_some() {
            incl.multiply_decimal(ratio)
        } else {
            Money::zero(currency)
        };

        let (without, discount) = if include_tax {
            (incl, discount_incl)
        } else {
            (excl, discount_excl)
        };
        Ok(CartSubTotal {
            subtotal_without_discount: without,
            discount_amount: discount,
            applied_discount,
            subtotal_with_discount: without.try_subtract(&discount)?.non_negative(),
            tax_rates: rates,
        })
    }

    fn is_free_shipping(&self, scope: &StoreScope<'_>, cart: &[CartLine]) -> Result<bool, ServiceError> {
        if !self.shipping.requires_shipping(cart) {
            return Ok(true);
        }
        if cart
            .iter()
            .filter(|l| l.product.is_shipping_enabled)
            .all(|l| l.product.is_free_shipping)
        {
            return Ok(true);
        }
        let shipping = &scope.settings.shipping;
        if shipping.free_shipping_over_x_enabled {
            let subtotal = self.get_shopping_cart_subtotal(scope, cart, shipping.free_shipping_over_x_including_tax)?;
            if subtotal.subtotal_with_discount.amount_cents > shipping.free_shipping_over_x_value_cents {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn adjust_shipping_rate(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        rate: Money,
    ) -> Result<(Money, Money, Option<DiscountId>), ServiceError> {
        let zero = Money::zero(rate.currency);
        if self.is_free_shipping(scope, cart)? {
            return Ok((zero, zero, None));
        }
        let mut adjusted = rate;
        for line in cart
            .iter()
            .filter(|l| l.product.is_shipping_enabled && !l.product.is_free_shipping)
        {
            let charge = line.product.additional_shipping_charge.try_multiply(line.item.quantity)?;
            adjusted = adjusted.try_add(&charge)?;
        }

        let items = Self::items(cart);
        let check = DiscountCheck {
            customer: scope.customer,
            store_id: scope.store.id,
            cart: &items,
            subtotal: None,
        };
        let candidates = self
            .discounts
            .get_applicable_discounts(DiscountType::AssignedToShipping, &check)?;
        Ok(match preferred_discount(&candidates, &adjusted)? {
            Some((discount, amount)) => (adjusted.try_subtract(&amount)?, amount, Some(discount.id)),
            None => (adjusted, zero, None),
        })
    }

    fn get_shopping_cart_shipping_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        include_tax: bool,
    ) -> Result<Option<ShippingTotal>, ServiceError> {
        Ok(self
            .shipping_taxed(scope, cart)?
            .map(|(taxed, discount_amount, applied_discount)| ShippingTotal {
                amount: if include_tax { taxed.incl_tax } else { taxed.excl_tax },
                rate_percent: taxed.rate_percent,
                discount_amount,
                applied_discount,
            }))
    }

    fn get_tax_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        payment_method: Option<&str>,
    ) -> Result<TaxTotal, ServiceError> {
        let currency = scope.primary_currency();
        let mut rates = self.get_shopping_cart_subtotal(scope, cart, false)?.tax_rates;

        if let Some((shipping, _, _)) = self.shipping_taxed(scope, cart)? {
            add_rate(&mut rates, shipping.rate_percent, shipping.tax())?;
        }
        if let Some(method) = payment_method {
            let fee = self.get_payment_additional_fee(scope, method);
            let taxed = self.tax.payment_fee(&scope.settings.tax, fee);
            add_rate(&mut rates, taxed.rate_percent, taxed.tax())?;
        }

        let total = Money::try_sum(rates.iter().map(|r| &r.amount), currency)?;
        Ok(TaxTotal { total, rates })
    }

    fn get_shopping_cart_total(
        &self,
        scope: &StoreScope<'_>,
        cart: &[CartLine],
        payment_method: Option<&str>,
    ) -> Result<Option<OrderTotal>, ServiceError> {
        let currency = scope.primary_currency();
        let Some((shipping, _, _)) = self.shipping_taxed(scope, cart)? else {
            return Ok(None);
        };
        let subtotal = self.get_shopping_cart_subtotal(scope, cart, false)?;
        let fee = payment_method
            .map(|m| self.tax.payment_fee(&scope.settings.tax, self.get_payment_additional_fee(scope, m)))
            .map(|taxed| taxed.excl_tax)
            .unwrap_or(Money::zero(currency));
        let tax = self.get_tax_total(scope, cart, payment_method)?;

        let before_discount = Money::try_sum(
            [&subtotal.subtotal_with_discount, &shipping.excl_tax, &fee, &tax.total],
            currency,
        )?;

        let items = Self::items(cart);
        let check = DiscountCheck {
            customer: scope.customer,
            store_id: scope.store.id,
            cart: &items,
            subtotal: Some(&subtotal.subtotal_without_discount),
        };
        let candidates = self
            .discounts
            .get_applicable_discounts(DiscountType::AssignedToOrderTotal, &check)?;
        let (order_discount, applied_discount) = match preferred_discount(&candidates, &before_discount)? {
            Some((discount, amount)) => (amount, Some(discount.id)),
            None => (Money::zero(currency), None),
        };
        let mut total = before_discount.try_subtract(&order_discount)?.non_negative();

        let mut applied_gift_cards = Vec::new();
        for card in self.gift_cards.get_active_gift_cards_applied(scope.customer, scope.store.id)? {
            if !total.is_positive() {
                break;
            }
            let remaining = Money::new(card.remaining().amount_cents, currency);
            let amount_applied = remaining.try_min(&total)?;
            total = total.try_subtract(&amount_applied)?;
            applied_gift_cards.push(AppliedGiftCard {
                gift_card: card,
                amount_applied,
            });
        }

        Ok(Some(OrderTotal {
            total,
            order_discount,
            applied_discount,
            applied_gift_cards,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::CustomerService;
    use crate::discounts::set_applied_gift_card_codes;
    use crate::memory::MemoryStore;
    use crate::pricing::{DefaultPriceCalculationService, DefaultTaxService};
    use crate::shipping::FixedRateShippingService;
    use shop_domain::cart::{SelectedAttributes, ShoppingCartType};
    use shop_domain::catalog::Product;
    use shop_domain::customer::Customer;
    use shop_domain::discount::Discount;
    use shop_domain::settings::{StoreSettings, TaxCategoryRate};
    use shop_domain::store::Store;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn service(memory: &Arc<MemoryStore>) -> DefaultOrderTotalCalculationService {
        DefaultOrderTotalCalculationService::new(
            Arc::new(DefaultPriceCalculationService::new(memory.clone())),
            Arc::new(DefaultTaxService),
            memory.clone(),
            memory.clone(),
            Arc::new(FixedRateShippingService),
        )
    }

    fn line(product: Product, quantity: i64) -> CartLine {
        CartLine {
            item: ShoppingCartItem {
                id: CartItemId::new(product.id.value()),
                store_id: StoreId::new(1),
                customer_id: CustomerId::new(1),
                cart_type: ShoppingCartType::ShoppingCart,
                product_id: product.id,
                attributes: SelectedAttributes::new(),
                customer_entered_price: None,
                quantity,
                created_at: 0,
                updated_at: 0,
            },
            product,
        }
    }

    fn select_ground(customer: &mut Customer) {
        let option = ShippingOption {
            name: "Ground".into(),
            description: None,
            rate: usd(500),
            provider_system_name: "Shipping.FixedRate".into(),
        };
        customer.set_attribute(
            StoreId::new(1),
            CustomerAttribute::SelectedShippingOption,
            Some(serde_json::to_string(&option).unwrap()),
        );
    }

    fn taxed_settings() -> StoreSettings {
        let mut settings = StoreSettings::default();
        settings.tax.category_rates = vec![TaxCategoryRate {
            tax_category_id: TaxCategoryId::new(1),
            rate_percent: 10.0,
        }];
        settings
    }

    fn taxed_product(id: u64, cents: i64) -> Product {
        let mut product = Product::new(ProductId::new(id), "Thing", usd(cents));
        product.tax_category_id = Some(TaxCategoryId::new(1));
        product
    }

    #[test]
    fn test_total_is_none_until_shipping_selected() {
        let memory = Arc::new(MemoryStore::new());
        let totals = service(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let mut customer = Customer::guest(CustomerId::new(1));
        let settings = taxed_settings();
        let cart = vec![line(taxed_product(1, 1000), 2)];

        {
            let scope = StoreScope::new(&store, &customer, &settings);
            assert!(totals.get_shopping_cart_total(&scope, &cart, None).unwrap().is_none());
            assert!(totals.get_shopping_cart_shipping_total(&scope, &cart, false).unwrap().is_none());
        }

        select_ground(&mut customer);
        let scope = StoreScope::new(&store, &customer, &settings);
        let total = totals.get_shopping_cart_total(&scope, &cart, None).unwrap().unwrap();
        // 2000 subtotal + 500 shipping + 200 tax
        assert_eq!(total.total, usd(2700));
        let tax = totals.get_tax_total(&scope, &cart, None).unwrap();
        assert_eq!(tax.rates, vec![TaxRate { rate_percent: 10.0, amount: usd(200) }]);
    }

    #[test]
    fn test_taxable_shipping_adds_its_own_rate() {
        let memory = Arc::new(MemoryStore::new());
        let totals = service(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let mut customer = Customer::guest(CustomerId::new(1));
        select_ground(&mut customer);
        let mut settings = taxed_settings();
        let cart = vec![line(taxed_product(1, 1000), 2)];

        {
            let scope = StoreScope::new(&store, &customer, &settings);
            let shipping = totals.get_shopping_cart_shipping_total(&scope, &cart, true).unwrap().unwrap();
            assert_eq!(shipping.amount, usd(500));
        }

        settings.tax.shipping_is_taxable = true;
        settings.tax.shipping_tax_category_id = Some(TaxCategoryId::new(2));
        settings.tax.category_rates.push(TaxCategoryRate {
            tax_category_id: TaxCategoryId::new(2),
            rate_percent: 20.0,
        });
        let scope = StoreScope::new(&store, &customer, &settings);

        let incl = totals.get_shopping_cart_shipping_total(&scope, &cart, true).unwrap().unwrap();
        assert_eq!(incl.amount, usd(600));
        let excl = totals.get_shopping_cart_shipping_total(&scope, &cart, false).unwrap().unwrap();
        assert_eq!(excl.amount, usd(500));

        let tax = totals.get_tax_total(&scope, &cart, None).unwrap();
        assert_eq!(
            tax.rates,
            vec![
                TaxRate { rate_percent: 10.0, amount: usd(200) },
                TaxRate { rate_percent: 20.0, amount: usd(100) },
            ]
        );
        // 2000 subtotal + 500 shipping + 300 tax
        let total = totals.get_shopping_cart_total(&scope, &cart, None).unwrap().unwrap();
        assert_eq!(total.total, usd(2800));
    }

    #[test]
    fn test_subtotal_discount_scales_tax() {
        let memory = Arc::new(MemoryStore::new());
        memory
            .add_discount(Discount::percentage(
                DiscountId::default(),
                "Quarter off",
                DiscountType::AssignedToOrderSubTotal,
                25.0,
                Currency::USD,
            ))
            .unwrap();
        let totals = service(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let customer = Customer::guest(CustomerId::new(1));
        let settings = taxed_settings();
        let scope = StoreScope::new(&store, &customer, &settings);
        let cart = vec![line(taxed_product(1, 4000), 1)];

        let excl = totals.get_shopping_cart_subtotal(&scope, &cart, false).unwrap();
        assert_eq!(excl.discount_amount, usd(1000));
        assert_eq!(excl.subtotal_with_discount, usd(3000));
        assert_eq!(excl.tax_rates[0].amount, usd(300));

        let incl = totals.get_shopping_cart_subtotal(&scope, &cart, true).unwrap();
        assert_eq!(incl.subtotal_without_discount, usd(4400));
        assert_eq!(incl.discount_amount, usd(1100));
    }

    #[test]
    fn test_free_shipping_over_threshold() {
        let memory = Arc::new(MemoryStore::new());
        let totals = service(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let customer = Customer::guest(CustomerId::new(1));
        let mut settings = StoreSettings::default();
        settings.shipping.free_shipping_over_x_enabled = true;
        settings.shipping.free_shipping_over_x_value_cents = 5000;
        let scope = StoreScope::new(&store, &customer, &settings);

        let small = vec![line(Product::new(ProductId::new(1), "a", usd(1000)), 1)];
        let large = vec![line(Product::new(ProductId::new(2), "b", usd(6000)), 1)];
        assert!(!totals.is_free_shipping(&scope, &small).unwrap());
        assert!(totals.is_free_shipping(&scope, &large).unwrap());
        let shipping = totals.get_shopping_cart_shipping_total(&scope, &large, false).unwrap().unwrap();
        assert!(shipping.amount.is_zero());
    }

    #[test]
    fn test_gift_card_reduces_total() {
        let memory = Arc::new(MemoryStore::new());
        memory
            .add_gift_card(GiftCard {
                id: GiftCardId::default(),
                coupon_code: "GC".into(),
                amount: usd(10_000),
                is_activated: true,
                usage: Vec::new(),
            })
            .unwrap();
        let totals = service(&memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let mut customer = memory.insert_guest_customer().unwrap();
        set_applied_gift_card_codes(&mut customer, store.id, &["GC".to_string()]);
        select_ground(&mut customer);
        let settings = StoreSettings::default();
        let scope = StoreScope::new(&store, &customer, &settings);
        let cart = vec![line(Product::new(ProductId::new(1), "a", usd(1500)), 1)];

        let total = totals.get_shopping_cart_total(&scope, &cart, None).unwrap().unwrap();
        assert!(total.total.is_zero());
        assert_eq!(total.applied_gift_cards[0].amount_applied, usd(2000));
    }
}
