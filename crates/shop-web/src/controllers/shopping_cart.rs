//! Shopping cart, wishlist, coupons and shipping estimates.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use shop_domain::cart::SelectedAttributes;
use shop_domain::checkout::Address;
use shop_domain::prelude::*;
use shop_services::cart::{attribute_warnings, preselected_attributes, CartItemRequest, CartLine};
use shop_services::discounts::{applied_gift_card_codes, set_applied_gift_card_codes, DiscountCheck};
use shop_services::ServiceRegistry;

use crate::context::{Permission, WorkContext};
use crate::error::WebError;
use crate::helpers::{CatalogHelper, OrderHelper};
use crate::models::cart::{
    DiscountBoxModel, EstimateShippingForm, EstimateShippingModel, EstimateShippingResultModel, GiftCardBoxModel,
    MiniShoppingCartItemModel, MiniShoppingCartModel, ShippingOptionModel, ShoppingCartItemModel, ShoppingCartModel,
    UpdateCartForm, WishlistModel,
};
use crate::models::catalog::ProductDetailsForm;
use crate::models::order::OrderTotalsModel;
use crate::result::{ActionResult, RedirectTarget};
use crate::validation::is_local_url;
use crate::ActionOutcome;

/// "Minimum order sub-total amount is $X" when the cart is below the
/// configured minimum.
pub(crate) fn min_order_subtotal_warning(
    services: &ServiceRegistry,
    ctx: &WorkContext,
    cart: &[CartLine],
) -> Result<Option<String>, WebError> {
    let min_cents = ctx.settings.order.min_order_subtotal_cents;
    if min_cents <= 0 || cart.is_empty() {
        return Ok(None);
    }
    let subtotal = services
        .totals
        .get_shopping_cart_subtotal(&ctx.scope(), cart, false)?;
    if subtotal.subtotal_without_discount.amount_cents >= min_cents {
        return Ok(None);
    }
    let min = Money::new(min_cents, ctx.store.primary_currency);
    Ok(Some(format!("Minimum order sub-total amount is {}", ctx.format_plain(&min))))
}

/// Attribute selection from the raw posted values. Unknown mappings are
/// ignored; unparsable ids are dropped.
fn parse_attributes(product: &Product, raw: &BTreeMap<AttributeMappingId, String>) -> SelectedAttributes {
    let mut selected = SelectedAttributes::new();
    for mapping in &product.attributes {
        let Some(value) = raw.get(&mapping.id) else {
            continue;
        };
        if mapping.control_type.has_values() {
            for id in value.split(',').filter_map(|v| v.parse::<AttributeValueId>().ok()) {
                selected.select(mapping.id, id);
            }
        } else if !value.trim().is_empty() {
            selected.set_text(mapping.id, value.trim());
        }
    }
    selected
}

pub(crate) fn line_request(line: &CartLine) -> CartItemRequest<'_> {
    CartItemRequest {
        cart_type: line.item.cart_type,
        product: &line.product,
        attributes: &line.item.attributes,
        customer_entered_price: line.item.customer_entered_price,
        quantity: line.item.quantity,
    }
}

pub struct ShoppingCartController {
    services: ServiceRegistry,
    catalog: CatalogHelper,
    order: OrderHelper,
}

impl ShoppingCartController {
    pub fn new(services: ServiceRegistry) -> Self {
        let catalog = CatalogHelper::new(services.clone());
        let order = OrderHelper::new(services.clone());
        Self {
            services,
            catalog,
            order,
        }
    }

    pub(crate) fn lines(&self, ctx: &WorkContext, cart_type: ShoppingCartType) -> Result<Vec<CartLine>, WebError> {
        Ok(self
            .services
            .cart
            .get_cart_lines(ctx.customer.id, cart_type, ctx.store.id)?)
    }

    fn total_quantity(&self, ctx: &WorkContext, cart_type: ShoppingCartType) -> Result<i64, WebError> {
        Ok(sum_quantities(&self.lines(ctx, cart_type)?))
    }

    fn item_models(
        &self,
        ctx: &WorkContext,
        lines: &[CartLine],
        with_warnings: bool,
    ) -> Result<Vec<ShoppingCartItemModel>, WebError> {
        let scope = ctx.scope();
        let settings = &ctx.settings.shopping_cart;
        let mut models = Vec::with_capacity(lines.len());
        for line in lines {
            let product = &line.product;
            let unit = self.services.prices.unit_price(&scope, line, true)?;
            let (sub_total, discount) = self.services.prices.sub_total(&scope, line, true)?;
            let picture = if settings.show_product_images_on_shopping_cart {
                Some(self.catalog.picture_model(
                    ctx,
                    product.picture_ids.first().copied(),
                    ctx.settings.media.cart_thumb_picture_size,
                    &product.name,
                )?)
            } else {
                None
            };
            let warnings = if with_warnings {
                self.services.cart.get_item_warnings(&scope, &line_request(line))
            } else {
                Vec::new()
            };
            models.push(ShoppingCartItemModel {
                id: line.item.id,
                product_id: product.id,
                product_name: product.name.clone(),
                sku: product.sku.clone().filter(|_| ctx.settings.catalog.show_sku),
                picture,
                unit_price: self.catalog.format_product_price(ctx, product, unit.price),
                sub_total: self.catalog.format_product_price(ctx, product, sub_total),
                discount: discount
                    .is_positive()
                    .then(|| self.catalog.format_product_price(ctx, product, discount)),
                quantity: line.item.quantity,
                allowed_quantities: product.parse_allowed_quantities(),
                attribute_info: OrderHelper::format_attributes(product, &line.item.attributes),
                allow_item_editing: settings.allow_cart_item_editing && !product.attributes.is_empty(),
                warnings,
            });
        }
        Ok(models)
    }

    pub(crate) fn prepare_cart_model(
        &self,
        ctx: &WorkContext,
        lines: &[CartLine],
        is_editable: bool,
    ) -> Result<ShoppingCartModel, WebError> {
        let settings = &ctx.settings;
        let mut model = ShoppingCartModel {
            is_editable,
            show_sku: settings.catalog.show_sku,
            show_product_images: settings.shopping_cart.show_product_images_on_shopping_cart,
            terms_of_service_on_shopping_cart_page: settings.order.terms_of_service_on_shopping_cart_page,
            discount_box: DiscountBoxModel {
                display: settings.shopping_cart.show_discount_box,
                current_code: ctx.attribute(CustomerAttribute::DiscountCouponCode).map(str::to_string),
                ..Default::default()
            },
            gift_card_box: GiftCardBoxModel {
                display: settings.shopping_cart.show_gift_card_box,
                ..Default::default()
            },
            ..Default::default()
        };
        if lines.is_empty() {
            return Ok(model);
        }
        model.items = self.item_models(ctx, lines, true)?;
        model.warnings = self.services.cart.get_cart_warnings(&ctx.scope(), lines);
        model.min_order_subtotal_warning = min_order_subtotal_warning(&self.services, ctx, lines)?;
        model.estimate_shipping = EstimateShippingModel {
            enabled: settings.shipping.estimate_shipping_enabled && self.services.shipping.requires_shipping(lines),
            ..Default::default()
        };
        model.order_totals = Some(self.order.prepare_order_totals_model(ctx, lines, is_editable)?);
        Ok(model)
    }

    fn cart_view(&self, ctx: &WorkContext) -> ActionOutcome<ShoppingCartModel> {
        let lines = self.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let model = self.prepare_cart_model(ctx, &lines, true)?;
        Ok(ActionResult::view("ShoppingCart/Cart", model))
    }

    fn allowed(ctx: &WorkContext, cart_type: ShoppingCartType) -> bool {
        match cart_type {
            ShoppingCartType::ShoppingCart => ctx.authorize(Permission::EnableShoppingCart),
            ShoppingCartType::Wishlist => ctx.authorize(Permission::EnableWishlist),
        }
    }

    /// The JSON answer after a successful add.
    fn added_response(&self, ctx: &WorkContext, cart_type: ShoppingCartType) -> Result<Value, WebError> {
        let settings = &ctx.settings.shopping_cart;
        let count = self.total_quantity(ctx, cart_type)?;
        Ok(match cart_type {
            ShoppingCartType::ShoppingCart if settings.display_cart_after_adding_product => {
                json!({ "redirect": RedirectTarget::ShoppingCart.path() })
            }
            ShoppingCartType::Wishlist if settings.display_wishlist_after_adding_product => {
                json!({ "redirect": RedirectTarget::Wishlist { customer_guid: None }.path() })
            }
            ShoppingCartType::ShoppingCart => json!({
                "success": true,
                "message": "The product has been added to your shopping cart",
                "updatetopcartsectionhtml": format!("({})", count),
            }),
            ShoppingCartType::Wishlist => json!({
                "success": true,
                "message": "The product has been added to your wishlist",
                "updatetopwishlistsectionhtml": format!("({})", count),
            }),
        })
    }

    /// Add from a product list. Products that need choices on their page
    /// answer with a redirect there.
    pub fn add_product_simple(
        &self,
        ctx: &mut WorkContext,
        product_id: ProductId,
        cart_type: ShoppingCartType,
    ) -> ActionOutcome<()> {
        let Some(product) = self
            .services
            .products
            .get_product_by_id(product_id)?
            .filter(|p| p.is_visible(ctx.store.id))
        else {
            return Ok(ActionResult::json(json!({
                "success": false,
                "message": "No product found with the specified ID",
            })));
        };
        let product_page = json!({ "redirect": RedirectTarget::Product(product.id).path() });
        if !Self::allowed(ctx, cart_type) {
            return Ok(ActionResult::json(product_page));
        }
        let attributes = preselected_attributes(&product);
        if product.customer_enters_price || !attribute_warnings(&product, &attributes).is_empty() {
            return Ok(ActionResult::json(product_page));
        }

        let warnings = self.services.cart.add_to_cart(
            &ctx.scope(),
            &CartItemRequest {
                cart_type,
                product: &product,
                attributes: &attributes,
                customer_entered_price: None,
                quantity: product.order_minimum_quantity.max(1),
            },
        )?;
        if !warnings.is_empty() {
            tracing::debug!(product_id = %product.id, ?warnings, "simple add refused");
            return Ok(ActionResult::json(product_page));
        }
        ctx.reload_customer(self.services.customers.as_ref())?;
        Ok(ActionResult::json(self.added_response(ctx, cart_type)?))
    }

    /// Add from the product page, or update the cart line being edited.
    pub fn add_product_details(
        &self,
        ctx: &mut WorkContext,
        product_id: ProductId,
        cart_type: ShoppingCartType,
        form: &ProductDetailsForm,
    ) -> ActionOutcome<()> {
        let Some(product) = self
            .services
            .products
            .get_product_by_id(product_id)?
            .filter(|p| p.is_visible(ctx.store.id))
        else {
            return Ok(ActionResult::json(json!({
                "success": false,
                "message": "No product found with the specified ID",
            })));
        };
        if !Self::allowed(ctx, cart_type) {
            return Ok(ActionResult::json(json!({
                "success": false,
                "message": "You are not allowed to use this list",
            })));
        }

        let attributes = parse_attributes(&product, &form.attributes);
        let entered_price = match form.customer_entered_price.as_deref().map(str::trim) {
            Some(raw) if product.customer_enters_price => match raw.parse::<f64>() {
                Ok(amount) => Some(
                    Money::from_decimal(amount, ctx.working_currency)
                        .convert(1.0 / ctx.currency_rate, ctx.store.primary_currency),
                ),
                Err(_) => {
                    return Ok(ActionResult::json(json!({
                        "success": false,
                        "message": ["Enter a valid price"],
                    })))
                }
            },
            _ => None,
        };
        let quantity = if form.quantity > 0 { form.quantity } else { product.order_minimum_quantity };

        let updating = match form.updated_cart_item_id {
            Some(id) => self
                .services
                .cart
                .get_cart_item(id)?
                .filter(|i| i.customer_id == ctx.customer.id && i.product_id == product.id && i.cart_type == cart_type),
            None => None,
        };
        let warnings = match &updating {
            Some(item) => self.services.cart.update_cart_item(
                &ctx.scope(),
                item.id,
                Some(&attributes),
                entered_price,
                quantity,
            )?,
            None => self.services.cart.add_to_cart(
                &ctx.scope(),
                &CartItemRequest {
                    cart_type,
                    product: &product,
                    attributes: &attributes,
                    customer_entered_price: entered_price,
                    quantity,
                },
            )?,
        };
        if !warnings.is_empty() {
            return Ok(ActionResult::json(json!({ "success": false, "message": warnings })));
        }
        ctx.reload_customer(self.services.customers.as_ref())?;

        if updating.is_some() {
            let target = match cart_type {
                ShoppingCartType::ShoppingCart => RedirectTarget::ShoppingCart,
                ShoppingCartType::Wishlist => RedirectTarget::Wishlist { customer_guid: None },
            };
            return Ok(ActionResult::json(json!({ "redirect": target.path() })));
        }
        Ok(ActionResult::json(self.added_response(ctx, cart_type)?))
    }

    pub fn cart(&self, ctx: &mut WorkContext) -> ActionOutcome<ShoppingCartModel> {
        if !ctx.authorize(Permission::EnableShoppingCart) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        self.cart_view(ctx)
    }

    /// Apply quantity changes and removals to the customer's own lines.
    fn apply_updates(
        &self,
        ctx: &mut WorkContext,
        cart_type: ShoppingCartType,
        form: &UpdateCartForm,
    ) -> Result<BTreeMap<CartItemId, Vec<String>>, WebError> {
        let mut item_warnings = BTreeMap::new();
        for update in &form.items {
            let Some(item) = self
                .services
                .cart
                .get_cart_item(update.id)?
                .filter(|i| i.customer_id == ctx.customer.id && i.cart_type == cart_type)
            else {
                continue;
            };
            if update.remove || update.quantity <= 0 {
                self.services.cart.delete_cart_item(item.id)?;
                continue;
            }
            if update.quantity == item.quantity {
                continue;
            }
            let warnings = self
                .services
                .cart
                .update_cart_item(&ctx.scope(), item.id, None, None, update.quantity)?;
            if !warnings.is_empty() {
                item_warnings.insert(item.id, warnings);
            }
        }
        ctx.reload_customer(self.services.customers.as_ref())?;
        Ok(item_warnings)
    }

    pub fn update_cart(&self, ctx: &mut WorkContext, form: &UpdateCartForm) -> ActionOutcome<ShoppingCartModel> {
        if !ctx.authorize(Permission::EnableShoppingCart) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let item_warnings = self.apply_updates(ctx, ShoppingCartType::ShoppingCart, form)?;
        let lines = self.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let mut model = self.prepare_cart_model(ctx, &lines, true)?;
        for item in &mut model.items {
            if let Some(warnings) = item_warnings.get(&item.id) {
                item.warnings.extend(warnings.iter().cloned());
            }
        }
        Ok(ActionResult::view("ShoppingCart/Cart", model))
    }

    /// Back to the last catalog page the customer browsed.
    pub fn continue_shopping(&self, ctx: &mut WorkContext) -> ActionOutcome<()> {
        let target = match ctx.attribute(CustomerAttribute::LastContinueShoppingPage) {
            Some(url) if is_local_url(url) => RedirectTarget::Local(url.to_string()),
            _ => RedirectTarget::HomePage,
        };
        Ok(ActionResult::redirect(target))
    }

    pub fn apply_discount_coupon(&self, ctx: &mut WorkContext, code: &str) -> ActionOutcome<ShoppingCartModel> {
        let code = code.trim();
        let discount = if code.is_empty() {
            None
        } else {
            self.services.discounts.get_discount_by_coupon_code(code)?
        };
        let valid = match &discount {
            Some(discount) => {
                // Check as if the code was already entered.
                let mut trial = ctx.customer.clone();
                trial.set_attribute(ctx.store.id, CustomerAttribute::DiscountCouponCode, Some(code.to_string()));
                let items = self
                    .services
                    .cart
                    .get_cart(ctx.customer.id, ShoppingCartType::ShoppingCart, ctx.store.id)?;
                let check = DiscountCheck {
                    customer: &trial,
                    store_id: ctx.store.id,
                    cart: &items,
                    subtotal: None,
                };
                self.services.discounts.is_discount_valid(discount, &check)?
            }
            None => false,
        };
        if valid {
            ctx.save_attribute(
                self.services.customers.as_ref(),
                CustomerAttribute::DiscountCouponCode,
                Some(code.to_string()),
            )?;
        }

        let result = self.cart_view(ctx)?;
        Ok(result.map_model(|mut model| {
            model.discount_box.is_applied = valid;
            model.discount_box.message = Some(if valid {
                "The coupon code was applied".to_string()
            } else {
                "The coupon code you entered couldn't be applied to your order".to_string()
            });
            model
        }))
    }

    pub fn remove_discount_coupon(&self, ctx: &mut WorkContext) -> ActionOutcome<ShoppingCartModel> {
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::DiscountCouponCode, None)?;
        self.cart_view(ctx)
    }

    fn save_gift_card_codes(&self, ctx: &mut WorkContext, codes: &[String]) -> Result<(), WebError> {
        let mut updated = ctx.customer.clone();
        set_applied_gift_card_codes(&mut updated, ctx.store.id, codes);
        let value = updated
            .attribute(ctx.store.id, CustomerAttribute::GiftCardCouponCodes)
            .map(str::to_string);
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::GiftCardCouponCodes, value)?;
        Ok(())
    }

    pub fn apply_gift_card(&self, ctx: &mut WorkContext, code: &str) -> ActionOutcome<ShoppingCartModel> {
        let code = code.trim();
        let card = if code.is_empty() {
            None
        } else {
            self.services.gift_cards.get_gift_card_by_coupon_code(code)?
        };
        let valid = card.as_ref().is_some_and(|c| c.is_valid());
        if let Some(card) = card.filter(|c| c.is_valid()) {
            let mut codes = applied_gift_card_codes(&ctx.customer, ctx.store.id);
            if !codes.iter().any(|c| c.eq_ignore_ascii_case(&card.coupon_code)) {
                codes.push(card.coupon_code.clone());
                self.save_gift_card_codes(ctx, &codes)?;
            }
        }

        let result = self.cart_view(ctx)?;
        Ok(result.map_model(|mut model| {
            model.gift_card_box.is_applied = valid;
            model.gift_card_box.message = Some(if valid {
                "The gift card code was applied".to_string()
            } else {
                "The gift card code you entered couldn't be applied".to_string()
            });
            model
        }))
    }

    pub fn remove_gift_card(&self, ctx: &mut WorkContext, code: &str) -> ActionOutcome<ShoppingCartModel> {
        let codes: Vec<String> = applied_gift_card_codes(&ctx.customer, ctx.store.id)
            .into_iter()
            .filter(|c| !c.eq_ignore_ascii_case(code.trim()))
            .collect();
        self.save_gift_card_codes(ctx, &codes)?;
        self.cart_view(ctx)
    }

    pub fn estimate_shipping(
        &self,
        ctx: &mut WorkContext,
        form: &EstimateShippingForm,
    ) -> ActionOutcome<EstimateShippingResultModel> {
        let lines = self.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let mut model = EstimateShippingResultModel::default();
        if lines.is_empty() {
            model.warnings.push("Your Cart is empty".to_string());
        } else if !self.services.shipping.requires_shipping(&lines) {
            model.warnings.push("Shipping is not required".to_string());
        } else {
            let address = Address {
                country_code: form.country_code.trim().to_string(),
                province_code: form.province_code.clone(),
                zip: form.zip.trim().to_string(),
                ..Default::default()
            };
            let response = self.services.shipping.get_shipping_options(
                &ctx.settings.shipping,
                ctx.store.primary_currency,
                &lines,
                Some(&address),
            )?;
            model.warnings = response.errors;
            let scope = ctx.scope();
            for option in response.options {
                let (rate, _, _) = self.services.totals.adjust_shipping_rate(&scope, &lines, option.rate)?;
                let taxed = self.services.tax.shipping_price(&ctx.settings.tax, rate);
                model.shipping_options.push(ShippingOptionModel {
                    name: option.name,
                    description: option.description,
                    price: ctx.format_price(&taxed.for_display(ctx.tax_display_type)),
                });
            }
        }
        Ok(ActionResult::view("ShoppingCart/EstimateShipping", model))
    }

    pub fn order_totals(&self, ctx: &mut WorkContext, is_editable: bool) -> ActionOutcome<OrderTotalsModel> {
        let lines = self.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let model = self.order.prepare_order_totals_model(ctx, &lines, is_editable)?;
        Ok(ActionResult::view("ShoppingCart/OrderTotals", model))
    }

    pub fn mini_shopping_cart(&self, ctx: &mut WorkContext) -> ActionOutcome<MiniShoppingCartModel> {
        let settings = &ctx.settings.shopping_cart;
        if !settings.mini_shopping_cart_enabled || !ctx.authorize(Permission::EnableShoppingCart) {
            return Ok(ActionResult::Empty);
        }
        let lines = self.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let mut model = MiniShoppingCartModel {
            total_products: sum_quantities(&lines),
            current_customer_is_guest: ctx.is_guest(),
            anonymous_checkout_allowed: ctx.settings.order.anonymous_checkout_allowed,
            show_product_images: settings.show_product_images_on_shopping_cart,
            ..Default::default()
        };
        if lines.is_empty() {
            return Ok(ActionResult::view("ShoppingCart/MiniShoppingCart", model));
        }

        let scope = ctx.scope();
        model.display_shopping_cart_button = true;
        model.display_checkout_button = self.services.cart.get_cart_warnings(&scope, &lines).is_empty()
            && lines
                .iter()
                .all(|line| self.services.cart.get_item_warnings(&scope, &line_request(line)).is_empty());
        let subtotal = self
            .services
            .totals
            .get_shopping_cart_subtotal(&ctx.scope(), &lines, false)?;
        model.sub_total = Some(ctx.format_price(&subtotal.subtotal_without_discount));

        let shown: Vec<CartLine> = lines
            .into_iter()
            .take(settings.mini_shopping_cart_product_number)
            .collect();
        for (line, item) in shown.iter().zip(self.item_models(ctx, &shown, false)?) {
            model.items.push(MiniShoppingCartItemModel {
                id: line.item.id,
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                attribute_info: item.attribute_info,
                quantity: line.item.quantity,
                unit_price: item.unit_price,
                picture: item.picture,
            });
        }
        Ok(ActionResult::view("ShoppingCart/MiniShoppingCart", model))
    }

    fn wishlist_owner(&self, ctx: &WorkContext, customer_guid: Option<&str>) -> Result<Option<Customer>, WebError> {
        match customer_guid {
            Some(guid) => Ok(self.services.customers.get_customer_by_guid(guid)?),
            None => Ok(Some(ctx.customer.clone())),
        }
    }

    fn prepare_wishlist_model(&self, ctx: &WorkContext, owner: &Customer) -> Result<WishlistModel, WebError> {
        let is_editable = owner.id == ctx.customer.id;
        let lines = self
            .services
            .cart
            .get_cart_lines(owner.id, ShoppingCartType::Wishlist, ctx.store.id)?;
        Ok(WishlistModel {
            customer_guid: owner.guid.to_string(),
            customer_fullname: owner.display_name(ctx.store.id),
            is_editable,
            email_wishlist_enabled: ctx.settings.shopping_cart.email_wishlist_enabled,
            display_add_to_cart: ctx.authorize(Permission::EnableShoppingCart),
            items: self.item_models(ctx, &lines, is_editable)?,
            warnings: Vec::new(),
        })
    }

    /// The current customer's wishlist, or a shared one by customer guid.
    pub fn wishlist(&self, ctx: &mut WorkContext, customer_guid: Option<&str>) -> ActionOutcome<WishlistModel> {
        if !ctx.authorize(Permission::EnableWishlist) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let Some(owner) = self.wishlist_owner(ctx, customer_guid)? else {
            return Ok(ActionResult::NotFound);
        };
        let model = self.prepare_wishlist_model(ctx, &owner)?;
        Ok(ActionResult::view("ShoppingCart/Wishlist", model))
    }

    /// Quantities and removals, then move the lines flagged for the cart.
    pub fn update_wishlist(&self, ctx: &mut WorkContext, form: &UpdateCartForm) -> ActionOutcome<WishlistModel> {
        if !ctx.authorize(Permission::EnableWishlist) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let to_cart: Vec<CartItemId> = form
            .items
            .iter()
            .filter(|u| u.add_to_cart && !u.remove)
            .map(|u| u.id)
            .collect();
        let item_warnings = self.apply_updates(ctx, ShoppingCartType::Wishlist, form)?;
        if !to_cart.is_empty() {
            return self.add_items_to_cart_from_wishlist(ctx, None, &to_cart);
        }
        let owner = ctx.customer.clone();
        let mut model = self.prepare_wishlist_model(ctx, &owner)?;
        model.warnings = item_warnings.into_values().flatten().collect();
        Ok(ActionResult::view("ShoppingCart/Wishlist", model))
    }

    /// Copy wishlist lines into the current customer's cart. Lines of the
    /// customer's own wishlist are moved when the settings say so.
    pub fn add_items_to_cart_from_wishlist(
        &self,
        ctx: &mut WorkContext,
        customer_guid: Option<&str>,
        item_ids: &[CartItemId],
    ) -> ActionOutcome<WishlistModel> {
        if !ctx.authorize(Permission::EnableShoppingCart) || !ctx.authorize(Permission::EnableWishlist) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let Some(owner) = self.wishlist_owner(ctx, customer_guid)? else {
            return Ok(ActionResult::NotFound);
        };
        let own_list = owner.id == ctx.customer.id;
        let lines = self
            .services
            .cart
            .get_cart_lines(owner.id, ShoppingCartType::Wishlist, ctx.store.id)?;

        let mut warnings = Vec::new();
        let mut added = 0;
        for line in lines.iter().filter(|l| item_ids.contains(&l.item.id)) {
            let request = CartItemRequest {
                cart_type: ShoppingCartType::ShoppingCart,
                ..line_request(line)
            };
            let line_warnings = self.services.cart.add_to_cart(&ctx.scope(), &request)?;
            if line_warnings.is_empty() {
                added += 1;
                if own_list && ctx.settings.shopping_cart.move_items_from_wishlist_to_cart {
                    self.services.cart.delete_cart_item(line.item.id)?;
                }
            } else {
                warnings.extend(line_warnings.into_iter().map(|w| format!("{}: {}", line.product.name, w)));
            }
        }
        ctx.reload_customer(self.services.customers.as_ref())?;

        if added > 0 && warnings.is_empty() {
            return Ok(ActionResult::redirect(RedirectTarget::ShoppingCart));
        }
        let mut model = self.prepare_wishlist_model(ctx, &owner)?;
        model.warnings = warnings;
        Ok(ActionResult::view("ShoppingCart/Wishlist", model))
    }
}

/// Item count for headers and the mini cart, capped instead of wrapping.
fn sum_quantities(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .try_fold(0i64, |total, line| total.checked_add(line.item.quantity))
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_services::seed::{seed_demo, DemoData, DEMO_STORE_ID};

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;
    use crate::models::cart::CartItemUpdate;

    fn setup() -> (ServiceRegistry, DemoData, WorkContext) {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, demo, ctx)
    }

    fn shirt_form(size: u64, quantity: i64) -> ProductDetailsForm {
        let mut form = ProductDetailsForm {
            quantity,
            ..Default::default()
        };
        form.attributes.insert(AttributeMappingId::new(2), size.to_string());
        form
    }

    #[test]
    fn test_simple_add_redirects_when_choices_needed() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);

        let shirt = cart
            .add_product_simple(&mut ctx, demo.shirt, ShoppingCartType::ShoppingCart)
            .unwrap();
        assert_eq!(
            shirt.json_body().unwrap()["redirect"],
            RedirectTarget::Product(demo.shirt).path()
        );

        let laptop = cart
            .add_product_simple(&mut ctx, demo.laptop, ShoppingCartType::ShoppingCart)
            .unwrap();
        let body = laptop.json_body().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["updatetopcartsectionhtml"], "(1)");
    }

    #[test]
    fn test_add_details_and_edit_line() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services.clone());

        let missing = cart
            .add_product_details(&mut ctx, demo.shirt, ShoppingCartType::ShoppingCart, &ProductDetailsForm::default())
            .unwrap();
        assert_eq!(missing.json_body().unwrap()["success"], false);

        let added = cart
            .add_product_details(&mut ctx, demo.shirt, ShoppingCartType::ShoppingCart, &shirt_form(5, 2))
            .unwrap();
        assert_eq!(added.json_body().unwrap()["success"], true);

        let model = cart.cart(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].unit_price, "$48.00");
        assert_eq!(model.items[0].sub_total, "$96.00");
        assert_eq!(model.items[0].attribute_info, "Size: XL");

        let mut edit = shirt_form(3, 1);
        edit.updated_cart_item_id = Some(model.items[0].id);
        let updated = cart
            .add_product_details(&mut ctx, demo.shirt, ShoppingCartType::ShoppingCart, &edit)
            .unwrap();
        assert_eq!(updated.json_body().unwrap()["redirect"], "/cart");
        let model = cart.cart(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(model.items[0].sub_total, "$45.00");
    }

    #[test]
    fn test_huge_quantity_is_refused_not_merged() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        let one = ProductDetailsForm {
            quantity: 1,
            ..Default::default()
        };
        let added = cart
            .add_product_details(&mut ctx, demo.gift_wrap, ShoppingCartType::ShoppingCart, &one)
            .unwrap();
        assert_eq!(added.json_body().unwrap()["success"], true);

        let huge = ProductDetailsForm {
            quantity: i64::MAX,
            ..Default::default()
        };
        let refused = cart
            .add_product_details(&mut ctx, demo.gift_wrap, ShoppingCartType::ShoppingCart, &huge)
            .unwrap();
        let body = refused.json_body().unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"][0], "The maximum quantity allowed for purchase is 10000.");

        let mini = cart.mini_shopping_cart(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(mini.total_products, 1);
    }

    #[test]
    fn test_quantity_sum_saturates() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        cart.add_product_simple(&mut ctx, demo.gift_wrap, ShoppingCartType::ShoppingCart)
            .unwrap();
        let mut lines = cart.lines(&ctx, ShoppingCartType::ShoppingCart).unwrap();
        assert_eq!(sum_quantities(&lines), 1);

        let mut big = lines[0].clone();
        big.item.quantity = i64::MAX;
        lines.push(big);
        assert_eq!(sum_quantities(&lines), i64::MAX);
    }

    #[test]
    fn test_update_cart_removes_and_reports_warnings() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        cart.add_product_simple(&mut ctx, demo.laptop, ShoppingCartType::ShoppingCart)
            .unwrap();
        cart.add_product_simple(&mut ctx, demo.gift_wrap, ShoppingCartType::ShoppingCart)
            .unwrap();
        let model = cart.cart(&mut ctx).unwrap().into_model().unwrap();
        let laptop = model.items.iter().find(|i| i.product_id == demo.laptop).unwrap().id;
        let wrap = model.items.iter().find(|i| i.product_id == demo.gift_wrap).unwrap().id;

        let form = UpdateCartForm {
            items: vec![
                CartItemUpdate {
                    id: laptop,
                    quantity: 100,
                    ..Default::default()
                },
                CartItemUpdate {
                    id: wrap,
                    remove: true,
                    ..Default::default()
                },
            ],
        };
        let model = cart.update_cart(&mut ctx, &form).unwrap().into_model().unwrap();
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].quantity, 1);
        assert!(model.items[0].warnings[0].contains("exceeds stock"));
    }

    #[test]
    fn test_discount_coupon() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        cart.add_product_simple(&mut ctx, demo.laptop, ShoppingCartType::ShoppingCart)
            .unwrap();

        let wrong = cart.apply_discount_coupon(&mut ctx, "NOPE").unwrap().into_model().unwrap();
        assert!(!wrong.discount_box.is_applied);

        let applied = cart
            .apply_discount_coupon(&mut ctx, "welcome10")
            .unwrap()
            .into_model()
            .unwrap();
        assert!(applied.discount_box.is_applied);
        let totals = applied.order_totals.unwrap();
        assert_eq!(totals.sub_total_discount.as_deref(), Some("-$129.90"));

        let removed = cart.remove_discount_coupon(&mut ctx).unwrap().into_model().unwrap();
        assert!(removed.discount_box.current_code.is_none());
    }

    #[test]
    fn test_gift_card_apply_and_remove() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        cart.add_product_simple(&mut ctx, demo.gift_wrap, ShoppingCartType::ShoppingCart)
            .unwrap();

        let applied = cart.apply_gift_card(&mut ctx, "GIFT-25").unwrap().into_model().unwrap();
        assert!(applied.gift_card_box.is_applied);
        assert_eq!(ctx.attribute(CustomerAttribute::GiftCardCouponCodes), Some("GIFT-25"));

        cart.remove_gift_card(&mut ctx, "gift-25").unwrap();
        assert_eq!(ctx.attribute(CustomerAttribute::GiftCardCouponCodes), None);
    }

    #[test]
    fn test_estimate_shipping() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        let empty = cart
            .estimate_shipping(&mut ctx, &EstimateShippingForm::default())
            .unwrap()
            .into_model()
            .unwrap();
        assert_eq!(empty.warnings, ["Your Cart is empty".to_string()]);

        cart.add_product_simple(&mut ctx, demo.laptop, ShoppingCartType::ShoppingCart)
            .unwrap();
        let form = EstimateShippingForm {
            country_code: "US".into(),
            zip: "98101".into(),
            ..Default::default()
        };
        let model = cart.estimate_shipping(&mut ctx, &form).unwrap().into_model().unwrap();
        let names: Vec<_> = model.shipping_options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Ground", "Next Day Air"]);
        assert_eq!(model.shipping_options[0].price, "$5.00");
    }

    #[test]
    fn test_mini_cart() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        cart.add_product_simple(&mut ctx, demo.laptop, ShoppingCartType::ShoppingCart)
            .unwrap();
        let model = cart.mini_shopping_cart(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(model.total_products, 1);
        assert_eq!(model.sub_total.as_deref(), Some("$1299.00"));
        assert!(model.display_checkout_button);
        assert_eq!(model.items[0].product_name, "Lumen Book 14");
    }

    #[test]
    fn test_wishlist_moves_to_cart() {
        let (services, demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        let added = cart
            .add_product_simple(&mut ctx, demo.gift_wrap, ShoppingCartType::Wishlist)
            .unwrap();
        assert_eq!(added.json_body().unwrap()["updatetopwishlistsectionhtml"], "(1)");

        let wishlist = cart.wishlist(&mut ctx, None).unwrap().into_model().unwrap();
        assert!(wishlist.is_editable);
        let shared = cart
            .wishlist(&mut ctx, Some(&wishlist.customer_guid))
            .unwrap()
            .into_model()
            .unwrap();
        assert_eq!(shared.items.len(), 1);

        let ids = [wishlist.items[0].id];
        let moved = cart.add_items_to_cart_from_wishlist(&mut ctx, None, &ids).unwrap();
        assert_eq!(moved.redirect_target(), Some(&RedirectTarget::ShoppingCart));
        assert!(cart.wishlist(&mut ctx, None).unwrap().into_model().unwrap().items.is_empty());
        assert_eq!(cart.cart(&mut ctx).unwrap().into_model().unwrap().items.len(), 1);
    }

    #[test]
    fn test_unknown_shared_wishlist() {
        let (services, _demo, mut ctx) = setup();
        let cart = ShoppingCartController::new(services);
        assert!(cart.wishlist(&mut ctx, Some("missing")).unwrap().is_not_found());
    }
}
