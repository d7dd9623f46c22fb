//! Order totals and placed-order models shared by the cart, checkout and
//! account pages.

use shop_domain::cart::SelectedAttributes;
use shop_domain::catalog::Product;
use shop_domain::checkout::{Order, TaxRate};
use shop_domain::customer::CustomerAttribute;
use shop_domain::settings::{TaxDisplayType, TaxSettings};
use shop_domain::Money;
use shop_services::cart::{describe_attributes, CartLine};
use shop_services::pricing::PriceFormatter;
use shop_services::totals::selected_shipping_option;
use shop_services::ServiceRegistry;

use crate::context::WorkContext;
use crate::error::WebError;
use crate::helpers::format_date;
use crate::models::order::{
    GiftCardModel, OrderDetailsModel, OrderItemModel, OrderNoteModel, OrderTotalsModel, TaxRateModel,
};
use crate::models::AddressModel;

pub struct OrderHelper {
    services: ServiceRegistry,
}

/// Whether the tax line and the per-rate breakdown are shown.
fn tax_visibility(settings: &TaxSettings, display: TaxDisplayType, tax: &Money, rates: &[TaxRate]) -> (bool, bool) {
    if settings.hide_zero_tax && tax.is_zero() {
        return (false, false);
    }
    let display_tax_rates = settings.display_tax_rates && !rates.is_empty();
    let display_tax = !display_tax_rates
        && !(settings.hide_tax_in_order_summary && display == TaxDisplayType::IncludingTax);
    (display_tax, display_tax_rates)
}

impl OrderHelper {
    pub fn new(services: ServiceRegistry) -> Self {
        Self { services }
    }

    /// Attribute summary of a cart or order line, one attribute per line.
    pub fn format_attributes(product: &Product, selected: &SelectedAttributes) -> String {
        describe_attributes(product, selected, "<br />")
    }

    /// Totals block of the cart and checkout pages. Shipping and the order
    /// total stay empty until a shipping method is chosen.
    pub fn prepare_order_totals_model(
        &self,
        ctx: &WorkContext,
        cart: &[CartLine],
        is_editable: bool,
    ) -> Result<OrderTotalsModel, WebError> {
        let mut model = OrderTotalsModel {
            is_editable,
            ..Default::default()
        };
        if cart.is_empty() {
            return Ok(model);
        }

        let scope = ctx.scope();
        let totals = &self.services.totals;
        let include_tax = ctx.tax_display_type == TaxDisplayType::IncludingTax;
        let tax_settings = &ctx.settings.tax;

        let subtotal = totals.get_shopping_cart_subtotal(&scope, cart, include_tax)?;
        model.sub_total = ctx.format_price(&subtotal.subtotal_without_discount);
        if subtotal.discount_amount.is_positive() {
            model.sub_total_discount = Some(format!("-{}", ctx.format_price(&subtotal.discount_amount)));
            model.allow_remove_sub_total_discount = is_editable
                && subtotal.applied_discount.is_some()
                && ctx.attribute(CustomerAttribute::DiscountCouponCode).is_some();
        }

        model.required_shipping = self.services.shipping.requires_shipping(cart);
        if model.required_shipping {
            if let Some(shipping) = totals.get_shopping_cart_shipping_total(&scope, cart, include_tax)? {
                model.shipping = Some(ctx.format_price(&shipping.amount));
                model.selected_shipping_method = selected_shipping_option(&scope).map(|o| o.name);
            }
        }

        let payment_method = ctx
            .attribute(CustomerAttribute::SelectedPaymentMethod)
            .map(str::to_string);
        if let Some(method) = payment_method.as_deref() {
            let fee = totals.get_payment_additional_fee(&scope, method);
            let fee = self.services.tax.payment_fee(tax_settings, fee).for_display(ctx.tax_display_type);
            if fee.is_positive() {
                model.payment_method_additional_fee = Some(ctx.format_price(&fee));
            }
        }

        let tax = totals.get_tax_total(&scope, cart, payment_method.as_deref())?;
        let (display_tax, display_tax_rates) = tax_visibility(tax_settings, ctx.tax_display_type, &tax.total, &tax.rates);
        model.display_tax = display_tax;
        model.display_tax_rates = display_tax_rates;
        model.tax = Some(ctx.format_plain(&tax.total));
        model.tax_rates = tax
            .rates
            .iter()
            .map(|rate| TaxRateModel {
                rate: PriceFormatter::format_tax_rate(rate.rate_percent),
                value: ctx.format_plain(&rate.amount),
            })
            .collect();

        if let Some(total) = totals.get_shopping_cart_total(&scope, cart, payment_method.as_deref())? {
            if total.order_discount.is_positive() {
                model.order_total_discount = Some(format!("-{}", ctx.format_price(&total.order_discount)));
                model.allow_remove_order_total_discount = is_editable
                    && total.applied_discount.is_some()
                    && ctx.attribute(CustomerAttribute::DiscountCouponCode).is_some();
            }
            for applied in &total.applied_gift_cards {
                let remaining = applied
                    .gift_card
                    .remaining()
                    .try_subtract(&applied.amount_applied)?
                    .non_negative();
                model.gift_cards.push(GiftCardModel {
                    id: applied.gift_card.id,
                    coupon_code: applied.gift_card.coupon_code.clone(),
                    amount: format!("-{}", ctx.format_plain(&applied.amount_applied)),
                    remaining: ctx.format_plain(&remaining),
                });
            }
            model.order_total = Some(ctx.format_price(&total.total));
        }
        Ok(model)
    }

    /// A placed order as the customer sees it, in the currency and tax
    /// display type captured when it was placed.
    pub fn prepare_order_details_model(&self, ctx: &WorkContext, order: &Order) -> Result<OrderDetailsModel, WebError> {
        let formatter = PriceFormatter::new(&ctx.settings.tax, order.tax_display_type);
        let price = |amount: &Money| {
            let shown = amount.convert(order.currency_rate, order.customer_currency);
            formatter.format_price(&shown)
        };
        let plain = |amount: &Money| order.display_in_customer_currency(amount);
        let include_tax = order.tax_display_type == TaxDisplayType::IncludingTax;
        let pick = |incl: &Money, excl: &Money| if include_tax { *incl } else { *excl };

        let payment_method = self
            .services
            .payments
            .load_payment_method_by_system_name(&order.payment_method_system_name)
            .map(|m| m.friendly_name().to_string())
            .unwrap_or_else(|| order.payment_method_system_name.clone());

        let items = order
            .items
            .iter()
            .map(|item| OrderItemModel {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                sku: item.sku.clone().filter(|_| ctx.settings.catalog.show_sku),
                attribute_info: item.attribute_description.clone(),
                unit_price: price(&pick(&item.unit_price_incl_tax, &item.unit_price_excl_tax)),
                quantity: item.quantity,
                sub_total: price(&pick(&item.price_incl_tax, &item.price_excl_tax)),
            })
            .collect();

        let subtotal_discount = pick(&order.subtotal_discount_incl_tax, &order.subtotal_discount_excl_tax);
        let payment_fee = pick(&order.payment_fee_incl_tax, &order.payment_fee_excl_tax);
        let (display_tax, display_tax_rates) =
            tax_visibility(&ctx.settings.tax, order.tax_display_type, &order.tax, &order.tax_rates);

        let mut gift_cards = Vec::with_capacity(order.gift_cards_used.len());
        for (id, amount) in &order.gift_cards_used {
            let card = self.services.gift_cards.get_gift_card_by_id(*id)?;
            gift_cards.push(GiftCardModel {
                id: *id,
                coupon_code: card.as_ref().map(|c| c.coupon_code.clone()).unwrap_or_default(),
                amount: format!("-{}", plain(amount)),
                remaining: card.map(|c| plain(&c.remaining())).unwrap_or_default(),
            });
        }

        Ok(OrderDetailsModel {
            id: order.id,
            created_on: format_date(order.created_at),
            order_status: order.status.to_string(),
            is_reorder_allowed: ctx.settings.order.is_reorder_allowed,
            billing_address: AddressModel::from(&order.billing_address),
            is_shippable: order.is_shippable(),
            shipping_address: order.shipping_address.as_ref().map(AddressModel::from),
            shipping_method: order.shipping_method.clone(),
            shipping_status: order.shipping_status.to_string(),
            payment_method,
            payment_status: order.payment_status.to_string(),
            items,
            order_subtotal: price(&pick(&order.subtotal_incl_tax, &order.subtotal_excl_tax)),
            order_subtotal_discount: subtotal_discount
                .is_positive()
                .then(|| format!("-{}", price(&subtotal_discount))),
            order_shipping: order
                .is_shippable()
                .then(|| price(&pick(&order.shipping_incl_tax, &order.shipping_excl_tax))),
            payment_method_additional_fee: payment_fee.is_positive().then(|| price(&payment_fee)),
            tax: Some(plain(&order.tax)),
            tax_rates: order
                .tax_rates
                .iter()
                .map(|rate| TaxRateModel {
                    rate: PriceFormatter::format_tax_rate(rate.rate_percent),
                    value: plain(&rate.amount),
                })
                .collect(),
            display_tax,
            display_tax_rates,
            order_total_discount: order
                .order_discount
                .is_positive()
                .then(|| format!("-{}", price(&order.order_discount))),
            gift_cards,
            order_total: price(&order.total),
            order_notes: order
                .notes
                .iter()
                .filter(|n| n.display_to_customer)
                .map(|n| OrderNoteModel {
                    note: n.note.clone(),
                    created_on: format_date(n.created_at),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_domain::checkout::{Address, OrderItem, OrderNote, OrderStatus, PaymentStatus, ShippingOption, ShippingStatus};
    use shop_domain::prelude::*;
    use shop_services::cart::CartItemRequest;
    use shop_services::payments::CHECK_MONEY_ORDER;
    use shop_services::seed::{seed_demo, DemoData, DEMO_GIFT_CARD_CODE, DEMO_STORE_ID};
    use uuid::Uuid;

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn setup() -> (ServiceRegistry, DemoData, WorkContext) {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, demo, ctx)
    }

    fn add(services: &ServiceRegistry, ctx: &WorkContext, id: ProductId, attributes: SelectedAttributes) -> Vec<CartLine> {
        let product = services.products.get_product_by_id(id).unwrap().unwrap();
        let warnings = services
            .cart
            .add_to_cart(
                &ctx.scope(),
                &CartItemRequest {
                    cart_type: ShoppingCartType::ShoppingCart,
                    product: &product,
                    attributes: &attributes,
                    customer_entered_price: None,
                    quantity: 1,
                },
            )
            .unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);
        services
            .cart
            .get_cart_lines(ctx.customer.id, ShoppingCartType::ShoppingCart, ctx.store.id)
            .unwrap()
    }

    #[test]
    fn test_totals_wait_for_shipping_method() {
        let (services, demo, mut ctx) = setup();
        let helper = OrderHelper::new(services.clone());
        let mut memory = SelectedAttributes::new();
        memory.select(AttributeMappingId::new(1), AttributeValueId::new(1));
        let cart = add(&services, &ctx, demo.laptop, memory);

        let model = helper.prepare_order_totals_model(&ctx, &cart, true).unwrap();
        assert_eq!(model.sub_total, "$1299.00");
        assert!(model.required_shipping);
        assert_eq!(model.shipping, None);
        assert_eq!(model.order_total, None);

        let ground = ShippingOption {
            name: "Ground".to_string(),
            description: None,
            rate: usd(500),
            provider_system_name: "Shipping.FixedRate".to_string(),
        };
        ctx.save_attribute(
            services.customers.as_ref(),
            CustomerAttribute::SelectedShippingOption,
            serde_json::to_string(&ground).ok(),
        )
        .unwrap();
        let model = helper.prepare_order_totals_model(&ctx, &cart, true).unwrap();
        assert_eq!(model.shipping.as_deref(), Some("$5.00"));
        assert_eq!(model.selected_shipping_method.as_deref(), Some("Ground"));
        assert_eq!(model.order_total.as_deref(), Some("$1304.00"));
    }

    #[test]
    fn test_gift_card_line() {
        let (services, demo, mut ctx) = setup();
        let helper = OrderHelper::new(services.clone());
        let cart = add(&services, &ctx, demo.gift_wrap, SelectedAttributes::new());
        ctx.save_attribute(
            services.customers.as_ref(),
            CustomerAttribute::GiftCardCouponCodes,
            Some(DEMO_GIFT_CARD_CODE.to_string()),
        )
        .unwrap();

        let model = helper.prepare_order_totals_model(&ctx, &cart, false).unwrap();
        assert!(!model.required_shipping);
        assert_eq!(model.gift_cards.len(), 1);
        assert_eq!(model.gift_cards[0].amount, "-$5.00");
        assert_eq!(model.gift_cards[0].remaining, "$20.00");
        assert_eq!(model.order_total.as_deref(), Some("$0.00"));
    }

    fn placed_order(ctx: &WorkContext) -> Order {
        let address = Address {
            id: AddressId::new(1),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            company: None,
            address1: "1 Main St".to_string(),
            address2: None,
            city: "Springfield".to_string(),
            province_code: None,
            country_code: "US".to_string(),
            zip: "12345".to_string(),
            phone: None,
        };
        Order {
            id: OrderId::new(7),
            guid: Uuid::nil(),
            store_id: ctx.store.id,
            customer_id: ctx.customer.id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::NotYetShipped,
            billing_address: address.clone(),
            shipping_address: Some(address),
            shipping_method: Some("Ground".to_string()),
            shipping_provider: Some("Shipping.FixedRate".to_string()),
            payment_method_system_name: CHECK_MONEY_ORDER.to_string(),
            customer_currency: Currency::EUR,
            currency_rate: 0.5,
            tax_display_type: TaxDisplayType::ExcludingTax,
            items: vec![OrderItem {
                product_id: ProductId::new(3),
                product_name: "Linen Shirt".to_string(),
                sku: Some("LS-01".to_string()),
                attributes: SelectedAttributes::new(),
                attribute_description: "Size: M".to_string(),
                quantity: 2,
                unit_price_incl_tax: usd(4_500),
                unit_price_excl_tax: usd(4_500),
                price_incl_tax: usd(9_000),
                price_excl_tax: usd(9_000),
                discount_incl_tax: usd(0),
                discount_excl_tax: usd(0),
            }],
            subtotal_incl_tax: usd(9_000),
            subtotal_excl_tax: usd(9_000),
            subtotal_discount_incl_tax: usd(0),
            subtotal_discount_excl_tax: usd(0),
            shipping_incl_tax: usd(500),
            shipping_excl_tax: usd(500),
            payment_fee_incl_tax: usd(0),
            payment_fee_excl_tax: usd(0),
            tax: usd(0),
            tax_rates: Vec::new(),
            order_discount: usd(1_000),
            gift_cards_used: Vec::new(),
            total: usd(8_500),
            notes: vec![
                OrderNote {
                    note: "Order placed".to_string(),
                    display_to_customer: true,
                    created_at: 0,
                },
                OrderNote {
                    note: "Fraud check passed".to_string(),
                    display_to_customer: false,
                    created_at: 0,
                },
            ],
            authorization_transaction_id: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_order_details_in_customer_currency() {
        let (services, _demo, ctx) = setup();
        let helper = OrderHelper::new(services);
        let model = helper.prepare_order_details_model(&ctx, &placed_order(&ctx)).unwrap();

        assert_eq!(model.order_status, "Pending");
        assert_eq!(model.shipping_status, "Not yet shipped");
        assert_eq!(model.payment_method, "Check / Money Order");
        assert_eq!(model.items[0].unit_price, "€22.50");
        assert_eq!(model.order_subtotal, "€45.00");
        assert_eq!(model.order_shipping.as_deref(), Some("€2.50"));
        assert_eq!(model.order_total_discount.as_deref(), Some("-€5.00"));
        assert_eq!(model.order_total, "€42.50");
        assert_eq!(model.order_notes.len(), 1);
        assert_eq!(model.created_on, "1970-01-01 00:00");
    }
}
