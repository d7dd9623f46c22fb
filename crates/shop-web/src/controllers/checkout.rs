//! One-page-at-a-time checkout: addresses, shipping, payment, confirm.

use std::sync::Arc;

use shop_cache::Session;
use shop_domain::checkout::ShippingOption;
use shop_domain::prelude::*;
use shop_services::cart::CartLine;
use shop_services::payments::{PaymentInfoForm, PaymentMethod, ProcessPaymentRequest};
use shop_services::totals::selected_shipping_option;
use shop_services::ServiceRegistry;

use super::shopping_cart::{line_request, min_order_subtotal_warning, ShoppingCartController};
use super::validate_address;
use crate::context::WorkContext;
use crate::error::WebError;
use crate::helpers::{CatalogCacheEvent, CatalogHelper, OrderHelper};
use crate::models::checkout::{
    CheckoutBillingAddressModel, CheckoutCompletedModel, CheckoutConfirmModel, CheckoutPaymentInfoModel,
    CheckoutPaymentMethodModel, CheckoutPaymentSession, CheckoutProgressModel, CheckoutProgressStep,
    CheckoutShippingAddressModel, CheckoutShippingMethodModel, NewAddressForm, PaymentMethodModel, SelectAddressForm,
    ShippingMethodModel,
};
use crate::models::AddressModel;
use crate::result::{ActionResult, ModelState, RedirectTarget};
use crate::ActionOutcome;

const PAYMENT_SESSION_NAMESPACE: &str = "checkout.payment";

/// Which address a checkout step edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressKind {
    Billing,
    Shipping,
}

pub struct CheckoutController {
    services: ServiceRegistry,
    cart: ShoppingCartController,
    catalog: CatalogHelper,
    order: OrderHelper,
    payment_sessions: Session<CheckoutPaymentSession>,
}

impl CheckoutController {
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            cart: ShoppingCartController::new(services.clone()),
            catalog: CatalogHelper::new(services.clone()),
            order: OrderHelper::new(services.clone()),
            payment_sessions: Session::new(services.cache.clone(), PAYMENT_SESSION_NAMESPACE),
            services,
        }
    }

    /// Cart lines when checkout may continue, otherwise the result to
    /// answer with.
    fn checkout_lines<M>(&self, ctx: &WorkContext) -> Result<Result<Vec<CartLine>, ActionResult<M>>, WebError> {
        let lines = self.cart.lines(ctx, ShoppingCartType::ShoppingCart)?;
        if lines.is_empty() {
            return Ok(Err(ActionResult::redirect(RedirectTarget::ShoppingCart)));
        }
        if ctx.is_guest() && !ctx.settings.order.anonymous_checkout_allowed {
            return Ok(Err(ActionResult::Unauthorized));
        }
        Ok(Ok(lines))
    }

    fn existing_addresses(ctx: &WorkContext) -> Vec<AddressModel> {
        ctx.customer
            .addresses
            .iter()
            .filter(|a| a.is_complete())
            .map(AddressModel::from)
            .collect()
    }

    /// Blank form prefilled with what we know about the customer.
    fn new_address_model(ctx: &WorkContext) -> AddressModel {
        AddressModel {
            first_name: ctx.attribute(CustomerAttribute::FirstName).unwrap_or_default().to_string(),
            last_name: ctx.attribute(CustomerAttribute::LastName).unwrap_or_default().to_string(),
            email: ctx.customer.email.clone().unwrap_or_default(),
            company: ctx.attribute(CustomerAttribute::Company).map(str::to_string),
            phone: ctx.attribute(CustomerAttribute::Phone).map(str::to_string),
            ..Default::default()
        }
    }

    fn ship_to_same_address_allowed(&self, ctx: &WorkContext, lines: &[CartLine]) -> bool {
        ctx.settings.order.ship_to_same_address && self.services.shipping.requires_shipping(lines)
    }

    fn billing_model(&self, ctx: &WorkContext, lines: &[CartLine], new_address: AddressModel) -> CheckoutBillingAddressModel {
        let allowed = self.ship_to_same_address_allowed(ctx, lines);
        CheckoutBillingAddressModel {
            existing_addresses: Self::existing_addresses(ctx),
            new_address,
            ship_to_same_address_allowed: allowed,
            ship_to_same_address: allowed,
        }
    }

    /// Point the customer's billing or shipping address at `address_id`
    /// and move on to the next step.
    fn use_address(
        &self,
        ctx: &mut WorkContext,
        lines: &[CartLine],
        kind: AddressKind,
        address_id: AddressId,
        ship_to_same_address: bool,
    ) -> Result<RedirectTarget, WebError> {
        let mut customer = ctx.customer.clone();
        let next = match kind {
            AddressKind::Billing => {
                customer.billing_address_id = Some(address_id);
                if ship_to_same_address && self.ship_to_same_address_allowed(ctx, lines) {
                    customer.shipping_address_id = Some(address_id);
                    RedirectTarget::CheckoutShippingMethod
                } else {
                    RedirectTarget::CheckoutShippingAddress
                }
            }
            AddressKind::Shipping => {
                customer.shipping_address_id = Some(address_id);
                RedirectTarget::CheckoutShippingMethod
            }
        };
        self.services.customers.update_customer(&customer)?;
        ctx.switch_customer(customer);
        Ok(next)
    }

    /// Start over: forget earlier shipping and payment choices and check
    /// the cart can be bought.
    pub fn index(&self, ctx: &mut WorkContext) -> ActionOutcome<()> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        self.services
            .customers
            .reset_checkout_data(ctx.customer.id, ctx.store.id, false)?;
        ctx.reload_customer(self.services.customers.as_ref())?;
        self.payment_sessions.delete(&ctx.session_id)?;

        let scope = ctx.scope();
        let mut problems = self.services.cart.get_cart_warnings(&scope, &lines);
        for line in &lines {
            problems.extend(self.services.cart.get_item_warnings(&scope, &line_request(line)));
        }
        problems.extend(min_order_subtotal_warning(&self.services, ctx, &lines)?);
        if !problems.is_empty() {
            tracing::debug!(customer_id = %ctx.customer.id, ?problems, "checkout blocked");
            return Ok(ActionResult::redirect(RedirectTarget::ShoppingCart));
        }
        Ok(ActionResult::redirect(RedirectTarget::CheckoutBillingAddress))
    }

    pub fn billing_address(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutBillingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if ctx.settings.order.disable_billing_address_checkout_step {
            if let Some(first) = ctx.customer.addresses.iter().find(|a| a.is_complete()).map(|a| a.id) {
                let next = self.use_address(ctx, &lines, AddressKind::Billing, first, true)?;
                return Ok(ActionResult::redirect(next));
            }
        }
        let model = self.billing_model(ctx, &lines, Self::new_address_model(ctx));
        Ok(ActionResult::view("Checkout/BillingAddress", model))
    }

    pub fn select_billing_address(
        &self,
        ctx: &mut WorkContext,
        form: &SelectAddressForm,
    ) -> ActionOutcome<CheckoutBillingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if ctx.customer.address(form.address_id).is_none() {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutBillingAddress));
        }
        let next = self.use_address(ctx, &lines, AddressKind::Billing, form.address_id, form.ship_to_same_address)?;
        Ok(ActionResult::redirect(next))
    }

    /// Save a new address unless the book already has the same one.
    fn save_new_address(&self, ctx: &WorkContext, model: &AddressModel) -> Result<AddressId, WebError> {
        let mut address = model.to_address();
        if let Some(existing) = ctx.customer.addresses.iter().find(|a| a.same_as(&address)) {
            return Ok(existing.id);
        }
        address.id = AddressId::default();
        Ok(self.services.customers.insert_address(ctx.customer.id, address)?.id)
    }

    pub fn new_billing_address(
        &self,
        ctx: &mut WorkContext,
        form: &NewAddressForm,
    ) -> ActionOutcome<CheckoutBillingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        let mut state = ModelState::new();
        validate_address(&mut state, &form.address);
        if !state.is_valid() {
            let mut model = self.billing_model(ctx, &lines, form.address.clone());
            model.ship_to_same_address = form.ship_to_same_address && model.ship_to_same_address_allowed;
            return Ok(ActionResult::view_with_state("Checkout/BillingAddress", model, state));
        }
        let address_id = self.save_new_address(ctx, &form.address)?;
        ctx.reload_customer(self.services.customers.as_ref())?;
        let next = self.use_address(ctx, &lines, AddressKind::Billing, address_id, form.ship_to_same_address)?;
        Ok(ActionResult::redirect(next))
    }

    pub fn shipping_address(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutShippingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if !self.services.shipping.requires_shipping(&lines) {
            let mut customer = ctx.customer.clone();
            customer.shipping_address_id = None;
            self.services.customers.update_customer(&customer)?;
            ctx.switch_customer(customer);
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutShippingMethod));
        }
        let model = CheckoutShippingAddressModel {
            existing_addresses: Self::existing_addresses(ctx),
            new_address: Self::new_address_model(ctx),
        };
        Ok(ActionResult::view("Checkout/ShippingAddress", model))
    }

    pub fn select_shipping_address(
        &self,
        ctx: &mut WorkContext,
        form: &SelectAddressForm,
    ) -> ActionOutcome<CheckoutShippingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if ctx.customer.address(form.address_id).is_none() {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutShippingAddress));
        }
        let next = self.use_address(ctx, &lines, AddressKind::Shipping, form.address_id, false)?;
        Ok(ActionResult::redirect(next))
    }

    pub fn new_shipping_address(
        &self,
        ctx: &mut WorkContext,
        form: &NewAddressForm,
    ) -> ActionOutcome<CheckoutShippingAddressModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        let mut state = ModelState::new();
        validate_address(&mut state, &form.address);
        if !state.is_valid() {
            let model = CheckoutShippingAddressModel {
                existing_addresses: Self::existing_addresses(ctx),
                new_address: form.address.clone(),
            };
            return Ok(ActionResult::view_with_state("Checkout/ShippingAddress", model, state));
        }
        let address_id = self.save_new_address(ctx, &form.address)?;
        ctx.reload_customer(self.services.customers.as_ref())?;
        let next = self.use_address(ctx, &lines, AddressKind::Shipping, address_id, false)?;
        Ok(ActionResult::redirect(next))
    }

    fn save_shipping_option(&self, ctx: &mut WorkContext, option: Option<&ShippingOption>) -> Result<(), WebError> {
        let value = option.map(serde_json::to_string).transpose()?;
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::SelectedShippingOption, value)?;
        Ok(())
    }

    /// Quote the cart to the customer's shipping address and remember the
    /// offer so the selection can be checked against it.
    fn offer_shipping_options(
        &self,
        ctx: &mut WorkContext,
        lines: &[CartLine],
    ) -> Result<(Vec<ShippingOption>, Vec<String>), WebError> {
        let address = ctx.customer.shipping_address().cloned();
        let response = self.services.shipping.get_shipping_options(
            &ctx.settings.shipping,
            ctx.store.primary_currency,
            lines,
            address.as_ref(),
        )?;
        let offered = serde_json::to_string(&response.options)?;
        ctx.save_attribute(
            self.services.customers.as_ref(),
            CustomerAttribute::OfferedShippingOptions,
            Some(offered),
        )?;
        Ok((response.options, response.errors))
    }

    pub fn shipping_method(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutShippingMethodModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if !self.services.shipping.requires_shipping(&lines) {
            self.save_shipping_option(ctx, None)?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        }
        let (options, errors) = self.offer_shipping_options(ctx, &lines)?;
        if ctx.settings.shipping.bypass_shipping_method_selection_if_only_one && options.len() == 1 {
            self.save_shipping_option(ctx, options.first())?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        }

        let scope = ctx.scope();
        let selected = selected_shipping_option(&scope);
        let mut model = CheckoutShippingMethodModel {
            warnings: errors,
            ..Default::default()
        };
        for option in &options {
            let (rate, _, _) = self.services.totals.adjust_shipping_rate(&scope, &lines, option.rate)?;
            let taxed = self.services.tax.shipping_price(&ctx.settings.tax, rate);
            model.shipping_methods.push(ShippingMethodModel {
                name: option.name.clone(),
                description: option.description.clone(),
                fee: ctx.format_price(&taxed.for_display(ctx.tax_display_type)),
                form_value: option.form_value(),
                selected: selected.as_ref().is_some_and(|s| s.form_value() == option.form_value()),
            });
        }
        if let (false, Some(first)) = (model.shipping_methods.iter().any(|m| m.selected), model.shipping_methods.first_mut()) {
            first.selected = true;
        }
        Ok(ActionResult::view("Checkout/ShippingMethod", model))
    }

    /// `form_value` is `"{name}___{provider}"` as rendered by
    /// [`shipping_method`](Self::shipping_method).
    pub fn select_shipping_method(
        &self,
        ctx: &mut WorkContext,
        form_value: &str,
    ) -> ActionOutcome<CheckoutShippingMethodModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if !self.services.shipping.requires_shipping(&lines) {
            self.save_shipping_option(ctx, None)?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        }
        let Some((name, provider)) = ShippingOption::parse_form_value(form_value) else {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutShippingMethod));
        };

        let offered: Vec<ShippingOption> = match ctx.attribute(CustomerAttribute::OfferedShippingOptions) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_default(),
            None => Vec::new(),
        };
        let offered = if offered.is_empty() {
            self.offer_shipping_options(ctx, &lines)?.0
        } else {
            offered
        };
        let Some(option) = offered
            .into_iter()
            .find(|o| o.name == name && o.provider_system_name == provider)
        else {
            tracing::debug!(customer_id = %ctx.customer.id, form_value, "unknown shipping option");
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutShippingMethod));
        };
        self.save_shipping_option(ctx, Some(&option))?;
        Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod))
    }

    fn save_payment_method(&self, ctx: &mut WorkContext, system_name: Option<&str>) -> Result<(), WebError> {
        ctx.save_attribute(
            self.services.customers.as_ref(),
            CustomerAttribute::SelectedPaymentMethod,
            system_name.map(str::to_string),
        )?;
        Ok(())
    }

    fn selected_payment_method(&self, ctx: &WorkContext) -> Option<Arc<dyn PaymentMethod>> {
        let name = ctx.attribute(CustomerAttribute::SelectedPaymentMethod)?;
        if !self.services.payments.is_payment_method_active(&ctx.settings.payment, name) {
            return None;
        }
        self.services.payments.load_payment_method_by_system_name(name)
    }

    pub fn payment_method(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutPaymentMethodModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        if !self
            .services
            .order_processing
            .is_payment_workflow_required(&ctx.scope(), &lines)?
        {
            self.save_payment_method(ctx, None)?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutConfirm));
        }

        let methods = self.services.payments.load_active_payment_methods(&ctx.settings.payment);
        if ctx.settings.payment.bypass_payment_method_selection_if_only_one && methods.len() == 1 {
            self.save_payment_method(ctx, Some(methods[0].system_name()))?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentInfo));
        }

        let scope = ctx.scope();
        let current = ctx.attribute(CustomerAttribute::SelectedPaymentMethod);
        let mut model = CheckoutPaymentMethodModel::default();
        for method in &methods {
            let fee = self.services.totals.get_payment_additional_fee(&scope, method.system_name());
            let fee = self.services.tax.payment_fee(&ctx.settings.tax, fee);
            let fee = fee.for_display(ctx.tax_display_type);
            model.payment_methods.push(PaymentMethodModel {
                system_name: method.system_name().to_string(),
                name: method.friendly_name().to_string(),
                description: method.description().to_string(),
                fee: fee.is_positive().then(|| ctx.format_price(&fee)),
                selected: current == Some(method.system_name()),
            });
        }
        if let (false, Some(first)) = (model.payment_methods.iter().any(|m| m.selected), model.payment_methods.first_mut()) {
            first.selected = true;
        }
        Ok(ActionResult::view("Checkout/PaymentMethod", model))
    }

    pub fn select_payment_method(
        &self,
        ctx: &mut WorkContext,
        system_name: &str,
    ) -> ActionOutcome<CheckoutPaymentMethodModel> {
        if let Err(result) = self.checkout_lines(ctx)? {
            return Ok(result);
        }
        if !self
            .services
            .payments
            .is_payment_method_active(&ctx.settings.payment, system_name)
        {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        }
        self.save_payment_method(ctx, Some(system_name))?;
        Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentInfo))
    }

    fn store_payment_request(&self, ctx: &WorkContext, request: ProcessPaymentRequest) -> Result<(), WebError> {
        let session = CheckoutPaymentSession { request: Some(request) };
        self.payment_sessions.set(&ctx.session_id, &session)?;
        Ok(())
    }

    fn payment_info_model(method: &dyn PaymentMethod, form: &PaymentInfoForm, warnings: Vec<String>) -> CheckoutPaymentInfoModel {
        CheckoutPaymentInfoModel {
            payment_method_system_name: method.system_name().to_string(),
            payment_method_name: method.friendly_name().to_string(),
            form: PaymentInfoForm {
                card_number: String::new(),
                card_code: String::new(),
                ..form.clone()
            },
            warnings,
        }
    }

    pub fn payment_info(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutPaymentInfoModel> {
        if let Err(result) = self.checkout_lines(ctx)? {
            return Ok(result);
        }
        let Some(method) = self.selected_payment_method(ctx) else {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        };
        if method.skip_payment_info() {
            self.store_payment_request(ctx, method.get_payment_info(&PaymentInfoForm::default()))?;
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutConfirm));
        }
        let model = Self::payment_info_model(method.as_ref(), &PaymentInfoForm::default(), Vec::new());
        Ok(ActionResult::view("Checkout/PaymentInfo", model))
    }

    /// Validate the posted payment form and keep it in the session until
    /// the order is confirmed.
    pub fn enter_payment_info(
        &self,
        ctx: &mut WorkContext,
        form: &PaymentInfoForm,
    ) -> ActionOutcome<CheckoutPaymentInfoModel> {
        if let Err(result) = self.checkout_lines(ctx)? {
            return Ok(result);
        }
        let Some(method) = self.selected_payment_method(ctx) else {
            return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
        };
        let errors = method.validate_payment_form(form);
        if !errors.is_empty() {
            let mut state = ModelState::new();
            for error in &errors {
                state.add_summary(error.clone());
            }
            let model = Self::payment_info_model(method.as_ref(), form, errors);
            return Ok(ActionResult::view_with_state("Checkout/PaymentInfo", model, state));
        }
        self.store_payment_request(ctx, method.get_payment_info(form))?;
        Ok(ActionResult::redirect(RedirectTarget::CheckoutConfirm))
    }

    fn confirm_model(&self, ctx: &WorkContext, lines: &[CartLine]) -> Result<CheckoutConfirmModel, WebError> {
        let scope = ctx.scope();
        let min_order_total_warning = if self
            .services
            .order_processing
            .validate_min_order_total_amount(&scope, lines)?
        {
            None
        } else {
            let min = Money::new(ctx.settings.order.min_order_total_cents, ctx.store.primary_currency);
            Some(format!("Minimum order total amount is {}", ctx.format_plain(&min)))
        };
        Ok(CheckoutConfirmModel {
            terms_of_service_on_order_confirm_page: ctx.settings.order.terms_of_service_on_order_confirm_page,
            min_order_total_warning,
            warnings: Vec::new(),
            cart: self.cart.prepare_cart_model(ctx, lines, false)?,
            order_totals: Some(self.order.prepare_order_totals_model(ctx, lines, false)?),
        })
    }

    pub fn confirm(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutConfirmModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        let model = self.confirm_model(ctx, &lines)?;
        Ok(ActionResult::view("Checkout/Confirm", model))
    }

    /// Place the order. Payment problems and failed checks come back as
    /// warnings on the confirm page.
    pub fn confirm_order(&self, ctx: &mut WorkContext) -> ActionOutcome<CheckoutConfirmModel> {
        let lines = match self.checkout_lines(ctx)? {
            Ok(lines) => lines,
            Err(result) => return Ok(result),
        };
        ctx.reload_customer(self.services.customers.as_ref())?;

        let payment_required = self
            .services
            .order_processing
            .is_payment_workflow_required(&ctx.scope(), &lines)?;
        let request = if payment_required {
            let Some(method) = self.selected_payment_method(ctx) else {
                return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentMethod));
            };
            let stored = self.payment_sessions.get_or_default(&ctx.session_id)?.request;
            match stored.filter(|r| r.payment_method_system_name == method.system_name()) {
                Some(request) => request,
                None => return Ok(ActionResult::redirect(RedirectTarget::CheckoutPaymentInfo)),
            }
        } else {
            ProcessPaymentRequest::default()
        };

        let placed = self.services.order_processing.place_order(&ctx.scope(), &request);
        let errors = match placed {
            Ok(result) => match result.placed_order {
                Some(order) if result.errors.is_empty() => {
                    // Stock changes can unpublish products or hide buy buttons.
                    for item in &order.items {
                        self.catalog.invalidate(CatalogCacheEvent::ProductChanged(item.product_id))?;
                    }
                    self.payment_sessions.delete(&ctx.session_id)?;
                    ctx.reload_customer(self.services.customers.as_ref())?;
                    let redirect = self
                        .services
                        .payments
                        .load_payment_method_by_system_name(&order.payment_method_system_name)
                        .and_then(|m| m.post_process_payment(&order, &ctx.store));
                    let target = match redirect {
                        Some(url) => RedirectTarget::External(url),
                        None if ctx.settings.order.disable_order_completed_page => {
                            RedirectTarget::CustomerOrderDetails(order.id)
                        }
                        None => RedirectTarget::CheckoutCompleted(order.id),
                    };
                    return Ok(ActionResult::redirect(target));
                }
                _ => result.errors,
            },
            Err(e) => {
                tracing::warn!(customer_id = %ctx.customer.id, error = %e, "order placement failed");
                vec![e.to_string()]
            }
        };

        let lines = self.cart.lines(ctx, ShoppingCartType::ShoppingCart)?;
        let mut model = self.confirm_model(ctx, &lines)?;
        model.warnings = errors;
        Ok(ActionResult::view("Checkout/Confirm", model))
    }

    /// Thank-you page of the customer's own order.
    pub fn completed(&self, ctx: &mut WorkContext, order_id: OrderId) -> ActionOutcome<CheckoutCompletedModel> {
        let Some(order) = self
            .services
            .orders
            .get_order_by_id(order_id)?
            .filter(|o| o.customer_id == ctx.customer.id && o.store_id == ctx.store.id)
        else {
            return Ok(ActionResult::NotFound);
        };
        if ctx.settings.order.disable_order_completed_page {
            return Ok(ActionResult::redirect(RedirectTarget::CustomerOrderDetails(order.id)));
        }
        Ok(ActionResult::view(
            "Checkout/Completed",
            CheckoutCompletedModel { order_id: order.id },
        ))
    }

    pub fn progress(&self, _ctx: &mut WorkContext, step: CheckoutProgressStep) -> ActionOutcome<CheckoutProgressModel> {
        Ok(ActionResult::view("Checkout/Progress", CheckoutProgressModel { step }))
    }
}
