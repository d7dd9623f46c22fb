//! Seeded storefront walk-through.
//!
//! Browses the home page, configures the first product, adds it to the
//! cart and follows the checkout redirects until an order is placed.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use shop_domain::prelude::{AttributeControlType, OrderId, ShoppingCartType};
use shop_services::payments::CHECK_MONEY_ORDER;
use shop_web::models::cart::ShoppingCartModel;
use shop_web::models::catalog::{ProductDetailsForm, ProductDetailsModel, ProductOverviewModel};
use shop_web::models::checkout::NewAddressForm;
use shop_web::models::order::OrderDetailsModel;
use shop_web::models::AddressModel;
use shop_web::prelude::*;

use super::{DemoArgs, Storefront};
use crate::context::Context;

/// Upper bound on checkout redirects followed.
const MAX_CHECKOUT_STEPS: usize = 12;

/// Everything the session looked at.
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub home_page: Vec<ProductOverviewModel>,
    pub product: ProductDetailsModel,
    pub cart: ShoppingCartModel,
    pub checkout_steps: Vec<String>,
    pub order: OrderDetailsModel,
}

/// Fill the product form the way a shopper accepting defaults would.
fn default_selection(product: &ProductDetailsModel) -> ProductDetailsForm {
    let mut form = ProductDetailsForm {
        quantity: 1,
        ..Default::default()
    };
    for attribute in &product.attributes {
        let value = match attribute.control_type {
            AttributeControlType::TextBox | AttributeControlType::MultilineTextbox => {
                match (&attribute.default_value, attribute.is_required) {
                    (Some(text), _) => text.clone(),
                    (None, true) => "Demo".to_string(),
                    (None, false) => continue,
                }
            }
            AttributeControlType::Checkboxes => attribute
                .values
                .iter()
                .filter(|v| v.is_preselected)
                .map(|v| v.id.to_string())
                .collect::<Vec<_>>()
                .join(","),
            _ => match attribute.values.iter().find(|v| v.is_preselected).or(attribute.values.first()) {
                Some(value) => value.id.to_string(),
                None => continue,
            },
        };
        form.attributes.insert(attribute.id, value);
    }
    form
}

fn demo_address() -> NewAddressForm {
    NewAddressForm {
        address: AddressModel {
            first_name: "Demo".into(),
            last_name: "Shopper".into(),
            email: "shopper@demo.local".into(),
            address1: "1 Market Street".into(),
            city: "Springfield".into(),
            country_code: "US".into(),
            zip: "12345".into(),
            ..Default::default()
        },
        ship_to_same_address: true,
    }
}

fn expect_redirect<M>(step: &str, result: &ActionResult<M>) -> Result<RedirectTarget> {
    if let Some(target) = result.redirect_target() {
        return Ok(target.clone());
    }
    let messages = result.model_state().map(ModelState::all_messages).unwrap_or_default();
    bail!("{} did not advance: {}", step, messages.join("; "))
}

/// Walk the checkout from the billing step to a placed order.
fn place_order(checkout: &CheckoutController, ctx: &mut WorkContext, steps: &mut Vec<String>) -> Result<OrderId> {
    let mut next = expect_redirect("Billing address", &checkout.new_billing_address(ctx, &demo_address())?)?;

    for _ in 0..MAX_CHECKOUT_STEPS {
        steps.push(next.path());
        next = match next {
            RedirectTarget::CheckoutShippingMethod => {
                let result = checkout.shipping_method(ctx)?;
                match result.model() {
                    Some(model) => {
                        let option = model.shipping_methods.first().context("No shipping methods offered")?;
                        tracing::debug!(method = %option.name, fee = %option.fee, "choosing shipping");
                        expect_redirect("Shipping method", &checkout.select_shipping_method(ctx, &option.form_value)?)?
                    }
                    None => expect_redirect("Shipping method", &result)?,
                }
            }
            RedirectTarget::CheckoutPaymentMethod => {
                let result = checkout.payment_method(ctx)?;
                match result.model() {
                    Some(model) => {
                        let method = model
                            .payment_methods
                            .iter()
                            .find(|m| m.system_name == CHECK_MONEY_ORDER)
                            .or(model.payment_methods.first())
                            .context("No payment methods offered")?;
                        expect_redirect("Payment method", &checkout.select_payment_method(ctx, &method.system_name)?)?
                    }
                    None => expect_redirect("Payment method", &result)?,
                }
            }
            RedirectTarget::CheckoutPaymentInfo => expect_redirect("Payment info", &checkout.payment_info(ctx)?)?,
            RedirectTarget::CheckoutConfirm => {
                let result = checkout.confirm_order(ctx)?;
                if let Some(model) = result.model() {
                    bail!("Order was not placed: {}", model.warnings.join("; "));
                }
                expect_redirect("Confirm", &result)?
            }
            RedirectTarget::CheckoutCompleted(order_id) | RedirectTarget::CustomerOrderDetails(order_id) => {
                return Ok(order_id);
            }
            other => bail!("Unexpected checkout redirect to {}", other.path()),
        };
    }
    bail!("Checkout did not finish after {} steps", MAX_CHECKOUT_STEPS)
}

/// Run one shopper session against `store_id`.
pub fn run_session(storefront: &Storefront, store_id: u64) -> Result<DemoReport> {
    let services = &storefront.services;
    let products = ProductController::new(services.clone());
    let cart = ShoppingCartController::new(services.clone());
    let checkout = CheckoutController::new(services.clone());
    let customer = CustomerController::new(services.clone());
    let mut ctx = storefront.visit(store_id)?;

    let home_page = products
        .home_page_products(&mut ctx)?
        .into_model()
        .context("Home page has no products")?;
    let first = home_page.first().context("Home page has no products")?;
    let product = products
        .product_details(&mut ctx, first.id, None)?
        .into_model()
        .with_context(|| format!("Product {} is not available", first.id))?;

    let added = cart.add_product_details(
        &mut ctx,
        product.id,
        ShoppingCartType::ShoppingCart,
        &default_selection(&product),
    )?;
    let body = added.json_body().context("Unexpected add-to-cart response")?;
    if body["success"] != true {
        bail!("Could not add {} to the cart: {}", product.name, body["message"]);
    }
    let cart_model = cart.cart(&mut ctx)?.into_model().context("Cart page redirected")?;

    let mut checkout_steps = Vec::new();
    let order_id = place_order(&checkout, &mut ctx, &mut checkout_steps)?;
    let order = customer
        .order_details(&mut ctx, order_id)?
        .into_model()
        .context("Order details are not visible to the shopper")?;

    Ok(DemoReport {
        home_page,
        product,
        cart: cart_model,
        checkout_steps,
        order,
    })
}

/// Run the demo command.
pub async fn run(args: DemoArgs, ctx: &Context) -> Result<()> {
    let storefront = Storefront::open(&ctx.config)?;
    let report = run_session(&storefront, args.store)?;

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!("Demo session on store {}", args.store));

    ctx.output.step(1, 4, "Home page");
    for product in &report.home_page {
        let price = product.price.as_ref().and_then(|p| p.price.as_deref()).unwrap_or("-");
        ctx.output.table_row(&[&product.name, price], &[28, 12]);
    }

    ctx.output.step(2, 4, &format!("Product page: {}", report.product.name));
    for attribute in &report.product.attributes {
        let values: Vec<&str> = attribute.values.iter().map(|v| v.name.as_str()).collect();
        ctx.output.kv(&attribute.name, &values.join(" / "));
    }

    ctx.output.step(3, 4, "Cart");
    for item in &report.cart.items {
        ctx.output.list_item(&format!(
            "{} x{} {} {}",
            item.product_name, item.quantity, item.sub_total, item.attribute_info
        ));
    }
    for warning in &report.cart.warnings {
        ctx.output.warn(warning);
    }

    ctx.output.step(4, 4, "Checkout");
    for step in &report.checkout_steps {
        ctx.output.list_item(step);
    }
    ctx.output.success(&format!(
        "Order #{} placed, total {}",
        report.order.id, report.order.order_total
    ));

    if args.models {
        ctx.output.header("View models");
        ctx.output.info("Product");
        ctx.output.json(&report.product);
        ctx.output.info("Order");
        ctx.output.json(&report.order);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_web::ShopConfig;

    #[test]
    fn test_demo_session_places_order() {
        let storefront = Storefront::open(&ShopConfig::default()).unwrap();
        let report = run_session(&storefront, 1).unwrap();
        assert!(!report.home_page.is_empty());
        assert_eq!(report.cart.items.len(), 1);
        assert_eq!(report.order.items.len(), 1);
        assert_eq!(report.checkout_steps.last().map(String::as_str), Some("/checkout/confirm"));
    }

    #[test]
    fn test_unknown_store_is_reported() {
        let storefront = Storefront::open(&ShopConfig::default()).unwrap();
        let err = run_session(&storefront, 42).unwrap_err();
        assert!(err.to_string().contains("Store 42"));
    }
}
