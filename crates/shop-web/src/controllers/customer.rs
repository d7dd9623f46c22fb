//! Sign-in, registration and the "my account" pages.

use chrono::NaiveDate;
use serde_json::json;
use shop_domain::prelude::*;
use shop_domain::settings::UserRegistrationType;
use shop_services::auth::{ChangePasswordRequest, CustomerLoginResult, CustomerRegistrationRequest};
use shop_services::tokens::new_token;
use shop_services::ServiceRegistry;
use validator::{Validate, ValidateLength};

use super::validate_address;
use crate::context::WorkContext;
use crate::error::WebError;
use crate::helpers::{format_date, OrderHelper};
use crate::models::customer::{
    AccountActivationModel, ChangePasswordForm, ChangePasswordModel, CustomerAddressEditModel,
    CustomerAddressListModel, CustomerInfoForm, CustomerInfoModel, CustomerOrderListModel, CustomerOrderSummaryModel,
    LoginForm, LoginModel, PasswordRecoveryConfirmForm, PasswordRecoveryConfirmModel, PasswordRecoveryModel,
    RegisterForm, RegisterModel, RegisterResultModel,
};
use crate::models::order::OrderDetailsModel;
use crate::models::AddressModel;
use crate::result::{ActionResult, ModelState, RedirectTarget};
use crate::validation::{self, is_local_url, non_blank};
use crate::ActionOutcome;

/// `RegisterResult` route values.
const RESULT_STANDARD: u8 = 1;
const RESULT_EMAIL_VALIDATION: u8 = 2;
const RESULT_ADMIN_APPROVAL: u8 = 3;
const RESULT_DISABLED: u8 = 4;

/// Recovery tokens are stored as `token|issued_at`.
fn recovery_token_value(token: &str, issued_at: i64) -> String {
    format!("{}|{}", token, issued_at)
}

fn recovery_token_valid(stored: Option<&str>, token: &str, now: i64, hours_valid: i64) -> bool {
    let Some((stored_token, issued_at)) = stored.and_then(|s| s.split_once('|')) else {
        return false;
    };
    let Ok(issued_at) = issued_at.parse::<i64>() else {
        return false;
    };
    !token.is_empty() && stored_token == token && now - issued_at <= hours_valid * 3600
}

fn login_failure_message(result: &CustomerLoginResult) -> &'static str {
    match result {
        CustomerLoginResult::Successful(_) => "",
        CustomerLoginResult::CustomerNotExist => "No customer account found",
        CustomerLoginResult::Deleted => "Customer is deleted",
        CustomerLoginResult::NotActive => "Account is not active",
        CustomerLoginResult::NotRegistered => "Account is not registered",
        CustomerLoginResult::WrongPassword => "The credentials provided are incorrect",
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn valid_date(value: &Option<String>) -> bool {
    match optional(value) {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok(),
        None => true,
    }
}

/// Optional profile fields shared by registration and the info page.
struct ProfileFields<'a> {
    first_name: &'a str,
    last_name: &'a str,
    gender: &'a Option<String>,
    date_of_birth: &'a Option<String>,
    company: &'a Option<String>,
    phone: &'a Option<String>,
    newsletter: bool,
}

impl<'a> From<&'a RegisterForm> for ProfileFields<'a> {
    fn from(form: &'a RegisterForm) -> Self {
        Self {
            first_name: &form.first_name,
            last_name: &form.last_name,
            gender: &form.gender,
            date_of_birth: &form.date_of_birth,
            company: &form.company,
            phone: &form.phone,
            newsletter: form.newsletter,
        }
    }
}

impl<'a> From<&'a CustomerInfoForm> for ProfileFields<'a> {
    fn from(form: &'a CustomerInfoForm) -> Self {
        Self {
            first_name: &form.first_name,
            last_name: &form.last_name,
            gender: &form.gender,
            date_of_birth: &form.date_of_birth,
            company: &form.company,
            phone: &form.phone,
            newsletter: form.newsletter,
        }
    }
}

pub struct CustomerController {
    services: ServiceRegistry,
    order: OrderHelper,
}

impl CustomerController {
    pub fn new(services: ServiceRegistry) -> Self {
        let order = OrderHelper::new(services.clone());
        Self { services, order }
    }

    fn login_redirect(return_path: &str) -> ActionResult<()> {
        ActionResult::redirect(RedirectTarget::Login {
            return_url: Some(return_path.to_string()),
        })
    }

    fn require_registered<M>(ctx: &WorkContext, return_path: &str) -> Option<ActionResult<M>> {
        if ctx.is_registered() {
            None
        } else {
            Some(ActionResult::redirect(RedirectTarget::Login {
                return_url: Some(return_path.to_string()),
            }))
        }
    }

    /// Start a fresh guest for this session.
    fn become_guest(&self, ctx: &mut WorkContext) -> Result<(), WebError> {
        let guest = self.services.customers.insert_guest_customer()?;
        self.services.authentication.set_guest_customer(&ctx.session_id, guest.id)?;
        ctx.switch_customer(guest);
        Ok(())
    }

    pub fn login_form(
        &self,
        ctx: &mut WorkContext,
        return_url: Option<&str>,
        checkout_as_guest: bool,
    ) -> ActionOutcome<LoginModel> {
        let model = LoginModel {
            usernames_enabled: ctx.settings.customer.usernames_enabled,
            username_or_email: String::new(),
            checkout_as_guest_allowed: checkout_as_guest && ctx.settings.order.anonymous_checkout_allowed,
            return_url: return_url.filter(|u| is_local_url(u)).map(str::to_string),
        };
        Ok(ActionResult::view("Customer/Login", model))
    }

    /// Sign in, move the guest's cart over and go back to a local
    /// return URL.
    pub fn login(&self, ctx: &mut WorkContext, form: &LoginForm) -> ActionOutcome<LoginModel> {
        let usernames_enabled = ctx.settings.customer.usernames_enabled;
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());

        if state.is_valid() {
            let result = self.services.registration.validate_customer(
                form.username_or_email.trim(),
                &form.password,
                usernames_enabled,
            )?;
            if let CustomerLoginResult::Successful(customer) = result {
                let guest_id = ctx.customer.id;
                if guest_id != customer.id {
                    self.services.cart.migrate_cart(guest_id, customer.id, ctx.store.id)?;
                }
                self.services.authentication.sign_in(&ctx.session_id, &customer)?;
                ctx.switch_customer(*customer);
                ctx.reload_customer(self.services.customers.as_ref())?;
                tracing::info!(customer_id = %ctx.customer.id, "customer signed in");

                let target = match form.return_url.as_deref() {
                    Some(url) if is_local_url(url) => RedirectTarget::Local(url.to_string()),
                    _ => RedirectTarget::HomePage,
                };
                return Ok(ActionResult::redirect(target));
            }
            state.add_summary("Login was unsuccessful. Please correct the errors and try again.");
            state.add_summary(login_failure_message(&result));
        }

        let model = LoginModel {
            usernames_enabled,
            username_or_email: form.username_or_email.clone(),
            checkout_as_guest_allowed: form.checkout_as_guest && ctx.settings.order.anonymous_checkout_allowed,
            return_url: form.return_url.clone().filter(|u| is_local_url(u)),
        };
        Ok(ActionResult::view_with_state("Customer/Login", model, state))
    }

    pub fn logout(&self, ctx: &mut WorkContext) -> ActionOutcome<()> {
        if ctx.is_registered() {
            tracing::info!(customer_id = %ctx.customer.id, "customer signed out");
        }
        self.services.authentication.sign_out(&ctx.session_id)?;
        self.become_guest(ctx)?;
        Ok(ActionResult::redirect(RedirectTarget::HomePage))
    }

    fn register_model(ctx: &WorkContext, form: RegisterForm) -> RegisterModel {
        let settings = &ctx.settings.customer;
        RegisterModel {
            usernames_enabled: settings.usernames_enabled,
            check_username_availability_enabled: settings.check_username_availability_enabled,
            gender_enabled: settings.gender_enabled,
            date_of_birth_enabled: settings.date_of_birth_enabled,
            company_enabled: settings.company_enabled,
            company_required: settings.company_required,
            phone_enabled: settings.phone_enabled,
            phone_required: settings.phone_required,
            newsletter_enabled: settings.newsletter_enabled,
            password_min_length: settings.password_min_length,
            form,
        }
    }

    pub fn register_form(&self, ctx: &mut WorkContext) -> ActionOutcome<RegisterModel> {
        if ctx.settings.customer.user_registration_type == UserRegistrationType::Disabled {
            return Ok(ActionResult::redirect(RedirectTarget::RegisterResult {
                result: RESULT_DISABLED,
            }));
        }
        Ok(ActionResult::view("Customer/Register", Self::register_model(ctx, RegisterForm::default())))
    }

    fn validate_register_form(ctx: &WorkContext, form: &RegisterForm) -> ModelState {
        let settings = &ctx.settings.customer;
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if settings.usernames_enabled && non_blank(&form.username).is_err() {
            state.add_error("Username", "Username is required.");
        }
        let min_length = Some(settings.password_min_length as u64);
        if !form.password.is_empty() && !form.password.validate_length(min_length, None, None) {
            state.add_error(
                "Password",
                format!("Password must have at least {} characters.", settings.password_min_length),
            );
        }
        let missing = |value: &Option<String>| non_blank(value.as_deref().unwrap_or_default()).is_err();
        if settings.company_enabled && settings.company_required && missing(&form.company) {
            state.add_error("Company", "Company is required.");
        }
        if settings.phone_enabled && settings.phone_required && missing(&form.phone) {
            state.add_error("Phone", "Phone is required.");
        }
        if settings.date_of_birth_enabled && !valid_date(&form.date_of_birth) {
            state.add_error("DateOfBirth", "Wrong date of birth.");
        }
        state
    }

    /// Store the optional profile fields the settings enable.
    fn save_profile_attributes(&self, ctx: &WorkContext, profile: ProfileFields<'_>) -> Result<(), WebError> {
        let settings = &ctx.settings.customer;
        let mut values = vec![
            (CustomerAttribute::FirstName, Some(profile.first_name.trim().to_string())),
            (CustomerAttribute::LastName, Some(profile.last_name.trim().to_string())),
        ];
        if settings.gender_enabled {
            values.push((CustomerAttribute::Gender, optional(profile.gender)));
        }
        if settings.date_of_birth_enabled {
            values.push((CustomerAttribute::DateOfBirth, optional(profile.date_of_birth)));
        }
        if settings.company_enabled {
            values.push((CustomerAttribute::Company, optional(profile.company)));
        }
        if settings.phone_enabled {
            values.push((CustomerAttribute::Phone, optional(profile.phone)));
        }
        if settings.newsletter_enabled {
            values.push((CustomerAttribute::Newsletter, profile.newsletter.then(|| "true".to_string())));
        }
        for (key, value) in values {
            self.services
                .customers
                .save_attribute(ctx.customer.id, ctx.store.id, key, value)?;
        }
        Ok(())
    }

    /// Turn the session's guest into a registered customer. What happens
    /// next depends on the store's registration type.
    pub fn register(&self, ctx: &mut WorkContext, form: &RegisterForm) -> ActionOutcome<RegisterModel> {
        let registration_type = ctx.settings.customer.user_registration_type;
        if registration_type == UserRegistrationType::Disabled {
            return Ok(ActionResult::redirect(RedirectTarget::RegisterResult {
                result: RESULT_DISABLED,
            }));
        }
        if ctx.is_registered() {
            self.services.authentication.sign_out(&ctx.session_id)?;
            self.become_guest(ctx)?;
        }

        let mut state = Self::validate_register_form(ctx, form);
        let posted = RegisterForm {
            password: String::new(),
            confirm_password: String::new(),
            ..form.clone()
        };
        if !state.is_valid() {
            return Ok(ActionResult::view_with_state(
                "Customer/Register",
                Self::register_model(ctx, posted),
                state,
            ));
        }

        let request = CustomerRegistrationRequest {
            customer_id: ctx.customer.id,
            email: form.email.trim().to_string(),
            username: Some(form.username.trim().to_string()).filter(|u| !u.is_empty()),
            password: form.password.clone(),
            is_approved: registration_type == UserRegistrationType::Standard,
        };
        let result = match self
            .services
            .registration
            .register_customer(&request, &ctx.settings.customer)
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(customer_id = %ctx.customer.id, error = %e, "registration failed");
                let mut result = shop_services::auth::ServiceResult::default();
                result.add_error(e.to_string());
                result
            }
        };
        if !result.success() {
            for error in result.errors {
                state.add_summary(error);
            }
            return Ok(ActionResult::view_with_state(
                "Customer/Register",
                Self::register_model(ctx, posted),
                state,
            ));
        }

        self.save_profile_attributes(ctx, ProfileFields::from(form))?;
        ctx.reload_customer(self.services.customers.as_ref())?;

        let result = match registration_type {
            UserRegistrationType::EmailValidation => {
                let token = new_token();
                ctx.save_attribute(
                    self.services.customers.as_ref(),
                    CustomerAttribute::AccountActivationToken,
                    Some(token.clone()),
                )?;
                self.services
                    .messages
                    .send_customer_email_validation_message(&ctx.store, &ctx.customer, &token)?;
                RESULT_EMAIL_VALIDATION
            }
            UserRegistrationType::AdminApproval => RESULT_ADMIN_APPROVAL,
            _ => {
                self.services.messages.send_customer_welcome_message(&ctx.store, &ctx.customer)?;
                self.services.authentication.sign_in(&ctx.session_id, &ctx.customer)?;
                RESULT_STANDARD
            }
        };
        Ok(ActionResult::redirect(RedirectTarget::RegisterResult { result }))
    }

    pub fn register_result(&self, _ctx: &mut WorkContext, result: u8) -> ActionOutcome<RegisterResultModel> {
        let text = match result {
            RESULT_STANDARD => "Your registration completed",
            RESULT_EMAIL_VALIDATION => {
                "Your registration has been successfully completed. You have just been sent an email containing activation instructions."
            }
            RESULT_ADMIN_APPROVAL => {
                "Your account will be activated after approving by administrator."
            }
            RESULT_DISABLED => "Registration not allowed. You can edit this in the admin area.",
            _ => return Ok(ActionResult::NotFound),
        };
        Ok(ActionResult::view(
            "Customer/RegisterResult",
            RegisterResultModel { result: text.to_string() },
        ))
    }

    /// JSON `{ "Available": bool, "Text": string }`.
    pub fn check_username_availability(&self, ctx: &mut WorkContext, username: &str) -> ActionOutcome<()> {
        let settings = &ctx.settings.customer;
        let username = username.trim();
        let (available, text) = if !settings.usernames_enabled || username.is_empty() {
            (false, "Username not available")
        } else if ctx.customer.username.as_deref() == Some(username) {
            (true, "Current username")
        } else if self.services.customers.get_customer_by_username(username)?.is_some() {
            (false, "Username not available")
        } else {
            (true, "Username available")
        };
        Ok(ActionResult::json(json!({ "Available": available, "Text": text })))
    }

    /// Follow the link from the email-validation message.
    pub fn account_activation(
        &self,
        ctx: &mut WorkContext,
        token: &str,
        customer_guid: &str,
    ) -> ActionOutcome<AccountActivationModel> {
        let Some(mut customer) = self.services.customers.get_customer_by_guid(customer_guid)? else {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        };
        let store_id = ctx.store.id;
        let stored = customer.attribute(store_id, CustomerAttribute::AccountActivationToken);
        if token.is_empty() || stored != Some(token) {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        customer.active = true;
        customer.set_attribute(store_id, CustomerAttribute::AccountActivationToken, None);
        self.services.customers.update_customer(&customer)?;
        self.services.messages.send_customer_welcome_message(&ctx.store, &customer)?;
        tracing::info!(customer_id = %customer.id, "account activated");
        Ok(ActionResult::view(
            "Customer/AccountActivation",
            AccountActivationModel {
                result: "Your account has been activated".to_string(),
            },
        ))
    }

    fn info_model(ctx: &WorkContext) -> CustomerInfoModel {
        let settings = &ctx.settings.customer;
        let attr = |key| ctx.attribute(key).map(str::to_string);
        CustomerInfoModel {
            email: ctx.customer.email.clone().unwrap_or_default(),
            username: ctx.customer.username.clone(),
            usernames_enabled: settings.usernames_enabled,
            allow_users_to_change_usernames: settings.allow_users_to_change_usernames,
            first_name: attr(CustomerAttribute::FirstName).unwrap_or_default(),
            last_name: attr(CustomerAttribute::LastName).unwrap_or_default(),
            gender_enabled: settings.gender_enabled,
            gender: attr(CustomerAttribute::Gender),
            date_of_birth_enabled: settings.date_of_birth_enabled,
            date_of_birth: attr(CustomerAttribute::DateOfBirth),
            company_enabled: settings.company_enabled,
            company: attr(CustomerAttribute::Company),
            phone_enabled: settings.phone_enabled,
            phone: attr(CustomerAttribute::Phone),
            newsletter_enabled: settings.newsletter_enabled,
            newsletter: attr(CustomerAttribute::Newsletter).is_some(),
        }
    }

    pub fn info_form(&self, ctx: &mut WorkContext) -> ActionOutcome<CustomerInfoModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/info") {
            return Ok(result);
        }
        Ok(ActionResult::view("Customer/Info", Self::info_model(ctx)))
    }

    pub fn info(&self, ctx: &mut WorkContext, form: &CustomerInfoForm) -> ActionOutcome<CustomerInfoModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/info") {
            return Ok(result);
        }
        let settings = ctx.settings.customer.clone();
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if settings.date_of_birth_enabled && !valid_date(&form.date_of_birth) {
            state.add_error("DateOfBirth", "Wrong date of birth.");
        }

        if state.is_valid() {
            let customer_id = ctx.customer.id;
            if settings.usernames_enabled && settings.allow_users_to_change_usernames {
                if let Some(username) = form.username.as_deref() {
                    let result = self.services.registration.set_username(customer_id, username)?;
                    for error in result.errors {
                        state.add_error("Username", error);
                    }
                }
            }
            let result = self.services.registration.set_email(customer_id, &form.email)?;
            for error in result.errors {
                state.add_error("Email", error);
            }
        }
        if state.is_valid() {
            self.save_profile_attributes(ctx, ProfileFields::from(form))?;
            ctx.reload_customer(self.services.customers.as_ref())?;
            return Ok(ActionResult::redirect(RedirectTarget::CustomerInfo));
        }

        ctx.reload_customer(self.services.customers.as_ref())?;
        let model = CustomerInfoModel {
            email: form.email.clone(),
            username: form.username.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            gender: form.gender.clone(),
            date_of_birth: form.date_of_birth.clone(),
            company: form.company.clone(),
            phone: form.phone.clone(),
            newsletter: form.newsletter,
            ..Self::info_model(ctx)
        };
        Ok(ActionResult::view_with_state("Customer/Info", model, state))
    }

    pub fn addresses(&self, ctx: &mut WorkContext) -> ActionOutcome<CustomerAddressListModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/addresses") {
            return Ok(result);
        }
        let model = CustomerAddressListModel {
            addresses: ctx.customer.addresses.iter().map(AddressModel::from).collect(),
        };
        Ok(ActionResult::view("Customer/Addresses", model))
    }

    pub fn address_add_form(&self, ctx: &mut WorkContext) -> ActionOutcome<CustomerAddressEditModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/addresses") {
            return Ok(result);
        }
        let address = AddressModel {
            email: ctx.customer.email.clone().unwrap_or_default(),
            ..Default::default()
        };
        Ok(ActionResult::view("Customer/AddressAdd", CustomerAddressEditModel { address }))
    }

    pub fn address_add(&self, ctx: &mut WorkContext, form: &AddressModel) -> ActionOutcome<CustomerAddressEditModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/addresses") {
            return Ok(result);
        }
        let mut state = ModelState::new();
        validate_address(&mut state, form);
        if !state.is_valid() {
            let model = CustomerAddressEditModel { address: form.clone() };
            return Ok(ActionResult::view_with_state("Customer/AddressAdd", model, state));
        }
        let mut address = form.to_address();
        address.id = AddressId::default();
        self.services.customers.insert_address(ctx.customer.id, address)?;
        ctx.reload_customer(self.services.customers.as_ref())?;
        Ok(ActionResult::redirect(RedirectTarget::CustomerAddresses))
    }

    pub fn address_edit_form(
        &self,
        ctx: &mut WorkContext,
        address_id: AddressId,
    ) -> ActionOutcome<CustomerAddressEditModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/addresses") {
            return Ok(result);
        }
        let Some(address) = ctx.customer.address(address_id) else {
            return Ok(ActionResult::redirect(RedirectTarget::CustomerAddresses));
        };
        let model = CustomerAddressEditModel {
            address: AddressModel::from(address),
        };
        Ok(ActionResult::view("Customer/AddressEdit", model))
    }

    pub fn address_edit(
        &self,
        ctx: &mut WorkContext,
        address_id: AddressId,
        form: &AddressModel,
    ) -> ActionOutcome<CustomerAddressEditModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/addresses") {
            return Ok(result);
        }
        if ctx.customer.address(address_id).is_none() {
            return Ok(ActionResult::redirect(RedirectTarget::CustomerAddresses));
        }
        let mut state = ModelState::new();
        validate_address(&mut state, form);
        if !state.is_valid() {
            let model = CustomerAddressEditModel {
                address: AddressModel {
                    id: address_id,
                    ..form.clone()
                },
            };
            return Ok(ActionResult::view_with_state("Customer/AddressEdit", model, state));
        }
        let mut address = form.to_address();
        address.id = address_id;
        self.services.customers.update_address(ctx.customer.id, &address)?;
        ctx.reload_customer(self.services.customers.as_ref())?;
        Ok(ActionResult::redirect(RedirectTarget::CustomerAddresses))
    }

    pub fn address_delete(&self, ctx: &mut WorkContext, address_id: AddressId) -> ActionOutcome<()> {
        if !ctx.is_registered() {
            return Ok(Self::login_redirect("/customer/addresses"));
        }
        if ctx.customer.address(address_id).is_some() {
            self.services.customers.delete_address(ctx.customer.id, address_id)?;
            ctx.reload_customer(self.services.customers.as_ref())?;
        }
        Ok(ActionResult::redirect(RedirectTarget::CustomerAddresses))
    }

    pub fn orders(&self, ctx: &mut WorkContext) -> ActionOutcome<CustomerOrderListModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/orders") {
            return Ok(result);
        }
        let mut orders = self
            .services
            .orders
            .get_orders_by_customer(ctx.customer.id, ctx.store.id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let model = CustomerOrderListModel {
            orders: orders
                .iter()
                .map(|order| CustomerOrderSummaryModel {
                    id: order.id,
                    order_total: ctx.format_plain(&order.total),
                    order_status: order.status.to_string(),
                    payment_status: order.payment_status.to_string(),
                    shipping_status: order.shipping_status.to_string(),
                    created_on: format_date(order.created_at),
                    is_reorder_allowed: ctx.settings.order.is_reorder_allowed,
                })
                .collect(),
        };
        Ok(ActionResult::view("Customer/Orders", model))
    }

    fn own_order(&self, ctx: &WorkContext, order_id: OrderId) -> Result<Option<Order>, WebError> {
        Ok(self
            .services
            .orders
            .get_order_by_id(order_id)?
            .filter(|o| o.customer_id == ctx.customer.id && o.store_id == ctx.store.id))
    }

    pub fn order_details(&self, ctx: &mut WorkContext, order_id: OrderId) -> ActionOutcome<OrderDetailsModel> {
        let Some(order) = self.own_order(ctx, order_id)? else {
            return Ok(ActionResult::Unauthorized);
        };
        let model = self.order.prepare_order_details_model(ctx, &order)?;
        Ok(ActionResult::view("Order/Details", model))
    }

    /// Put the lines of a past order back into the cart.
    pub fn reorder(&self, ctx: &mut WorkContext, order_id: OrderId) -> ActionOutcome<()> {
        if !ctx.settings.order.is_reorder_allowed {
            return Ok(ActionResult::redirect(RedirectTarget::CustomerOrderDetails(order_id)));
        }
        let Some(order) = self.own_order(ctx, order_id)? else {
            return Ok(ActionResult::Unauthorized);
        };
        let warnings = self.services.order_processing.reorder(&ctx.scope(), &order)?;
        if !warnings.is_empty() {
            tracing::debug!(order_id = %order.id, ?warnings, "reorder skipped lines");
        }
        ctx.reload_customer(self.services.customers.as_ref())?;
        Ok(ActionResult::redirect(RedirectTarget::ShoppingCart))
    }

    pub fn change_password_form(&self, ctx: &mut WorkContext) -> ActionOutcome<ChangePasswordModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/changepassword") {
            return Ok(result);
        }
        Ok(ActionResult::view("Customer/ChangePassword", ChangePasswordModel::default()))
    }

    pub fn change_password(&self, ctx: &mut WorkContext, form: &ChangePasswordForm) -> ActionOutcome<ChangePasswordModel> {
        if let Some(result) = Self::require_registered(ctx, "/customer/changepassword") {
            return Ok(result);
        }
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if state.is_valid() {
            let request = ChangePasswordRequest {
                email: ctx.customer.email.clone().unwrap_or_default(),
                validate_request: true,
                old_password: form.old_password.clone(),
                new_password: form.new_password.clone(),
            };
            let result = self
                .services
                .registration
                .change_password(&request, &ctx.settings.customer)?;
            if result.success() {
                let model = ChangePasswordModel {
                    result: Some("Password was changed".to_string()),
                };
                return Ok(ActionResult::view("Customer/ChangePassword", model));
            }
            for error in result.errors {
                state.add_summary(error);
            }
        }
        Ok(ActionResult::view_with_state(
            "Customer/ChangePassword",
            ChangePasswordModel::default(),
            state,
        ))
    }

    pub fn password_recovery_form(&self, _ctx: &mut WorkContext) -> ActionOutcome<PasswordRecoveryModel> {
        Ok(ActionResult::view("Customer/PasswordRecovery", PasswordRecoveryModel::default()))
    }

    /// Mail a recovery link. The answer doesn't reveal more than whether
    /// the address is known.
    pub fn password_recovery_send(
        &self,
        ctx: &mut WorkContext,
        form: &PasswordRecoveryModel,
    ) -> ActionOutcome<PasswordRecoveryModel> {
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if !state.is_valid() {
            let model = PasswordRecoveryModel {
                email: form.email.clone(),
                result: None,
            };
            return Ok(ActionResult::view_with_state("Customer/PasswordRecovery", model, state));
        }
        let result = match self
            .services
            .customers
            .get_customer_by_email(form.email.trim())?
            .filter(|c| c.is_registered())
        {
            Some(mut customer) => {
                let token = new_token();
                customer.set_attribute(
                    ctx.store.id,
                    CustomerAttribute::PasswordRecoveryToken,
                    Some(recovery_token_value(&token, current_timestamp())),
                );
                self.services.customers.update_customer(&customer)?;
                self.services
                    .messages
                    .send_customer_password_recovery_message(&ctx.store, &customer, &token)?;
                "Email with instructions has been sent to you."
            }
            None => "Email not found.",
        };
        let model = PasswordRecoveryModel {
            email: form.email.clone(),
            result: Some(result.to_string()),
        };
        Ok(ActionResult::view("Customer/PasswordRecovery", model))
    }

    fn recovering_customer(
        &self,
        ctx: &WorkContext,
        token: &str,
        customer_guid: &str,
    ) -> Result<Option<Customer>, WebError> {
        let Some(customer) = self.services.customers.get_customer_by_guid(customer_guid)? else {
            return Ok(None);
        };
        let stored = customer.attribute(ctx.store.id, CustomerAttribute::PasswordRecoveryToken);
        let hours = ctx.settings.customer.password_recovery_link_hours_valid;
        if recovery_token_valid(stored, token, current_timestamp(), hours) {
            Ok(Some(customer))
        } else {
            Ok(None)
        }
    }

    pub fn password_recovery_confirm_form(
        &self,
        ctx: &mut WorkContext,
        token: &str,
        customer_guid: &str,
    ) -> ActionOutcome<PasswordRecoveryConfirmModel> {
        if self.services.customers.get_customer_by_guid(customer_guid)?.is_none() {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let valid = self.recovering_customer(ctx, token, customer_guid)?.is_some();
        let model = PasswordRecoveryConfirmModel {
            disable_password_changing: !valid,
            result: (!valid).then(|| "Wrong password recovery token".to_string()),
        };
        Ok(ActionResult::view("Customer/PasswordRecoveryConfirm", model))
    }

    pub fn password_recovery_confirm(
        &self,
        ctx: &mut WorkContext,
        token: &str,
        customer_guid: &str,
        form: &PasswordRecoveryConfirmForm,
    ) -> ActionOutcome<PasswordRecoveryConfirmModel> {
        let Some(mut customer) = self.recovering_customer(ctx, token, customer_guid)? else {
            let model = PasswordRecoveryConfirmModel {
                disable_password_changing: true,
                result: Some("Wrong password recovery token".to_string()),
            };
            return Ok(ActionResult::view("Customer/PasswordRecoveryConfirm", model));
        };

        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if state.is_valid() {
            let request = ChangePasswordRequest {
                email: customer.email.clone().unwrap_or_default(),
                validate_request: false,
                old_password: String::new(),
                new_password: form.new_password.clone(),
            };
            let result = self
                .services
                .registration
                .change_password(&request, &ctx.settings.customer)?;
            if result.success() {
                if let Some(updated) = self.services.customers.get_customer_by_id(customer.id)? {
                    customer = updated;
                }
                customer.set_attribute(ctx.store.id, CustomerAttribute::PasswordRecoveryToken, None);
                self.services.customers.update_customer(&customer)?;
                let model = PasswordRecoveryConfirmModel {
                    disable_password_changing: true,
                    result: Some("Your password has been changed".to_string()),
                };
                return Ok(ActionResult::view("Customer/PasswordRecoveryConfirm", model));
            }
            for error in result.errors {
                state.add_summary(error);
            }
        }
        Ok(ActionResult::view_with_state(
            "Customer/PasswordRecoveryConfirm",
            PasswordRecoveryConfirmModel::default(),
            state,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_services::cart::{preselected_attributes, CartItemRequest};
    use shop_services::messages::MessageTemplate;
    use shop_services::seed::{seed_demo, DemoData, DEMO_STORE_ID};

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;

    fn setup() -> (ServiceRegistry, DemoData, ContextFactory, WorkContext) {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, demo, factory, ctx)
    }

    fn register_form(email: &str) -> RegisterForm {
        RegisterForm {
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            newsletter: true,
            ..Default::default()
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            username_or_email: email.into(),
            password: password.into(),
            return_url: Some("/cart".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_recovery_token_expiry() {
        let stored = recovery_token_value("abc", 1_000);
        assert!(recovery_token_valid(Some(&stored), "abc", 1_000 + 3600, 1));
        assert!(!recovery_token_valid(Some(&stored), "abc", 1_000 + 3601, 1));
        assert!(!recovery_token_valid(Some(&stored), "abd", 1_000, 1));
        assert!(!recovery_token_valid(None, "abc", 1_000, 1));
    }

    #[test]
    fn test_register_signs_in_and_welcomes() {
        let (services, _demo, factory, mut ctx) = setup();
        let controller = CustomerController::new(services.clone());

        let result = controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();
        assert_eq!(
            result.redirect_target(),
            Some(&RedirectTarget::RegisterResult { result: RESULT_STANDARD })
        );
        assert!(ctx.is_registered());
        assert_eq!(ctx.customer.display_name(ctx.store.id), "Ada Lovelace");
        assert_eq!(ctx.attribute(CustomerAttribute::Newsletter), Some("true"));

        let emails = services.memory.queued_emails().unwrap();
        assert_eq!(emails.last().unwrap().template, MessageTemplate::CustomerWelcome);

        let again = factory.resolve(DEMO_STORE_ID, &ctx.session_id).unwrap();
        assert_eq!(again.customer.id, ctx.customer.id);
    }

    #[test]
    fn test_register_validation() {
        let (services, _demo, _factory, mut ctx) = setup();
        let controller = CustomerController::new(services);
        let mut form = register_form("not-an-email");
        form.confirm_password = "other".into();
        let result = controller.register(&mut ctx, &form).unwrap();
        let state = result.model_state().unwrap();
        assert_eq!(state.field_errors("Email"), ["Wrong email".to_string()]);
        assert_eq!(state.field_errors("ConfirmPassword").len(), 1);
        assert!(result.model().unwrap().form.password.is_empty());
        assert!(ctx.is_guest());
    }

    #[test]
    fn test_duplicate_email_is_reported() {
        let (services, _demo, factory, mut ctx) = setup();
        let controller = CustomerController::new(services);
        controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();

        let mut other = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        let result = controller.register(&mut other, &register_form("ADA@example.com")).unwrap();
        let state = result.model_state().unwrap();
        assert_eq!(state.all_messages(), vec!["The specified email already exists"]);
    }

    #[test]
    fn test_login_migrates_guest_cart() {
        let (services, demo, factory, mut ctx) = setup();
        let controller = CustomerController::new(services.clone());
        controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();
        let registered = ctx.customer.id;
        controller.logout(&mut ctx).unwrap();
        assert!(ctx.is_guest());

        let mut guest = factory.resolve(DEMO_STORE_ID, &ctx.session_id).unwrap();
        assert_ne!(guest.customer.id, registered);
        let wrap = services.products.get_product_by_id(demo.gift_wrap).unwrap().unwrap();
        let attributes = preselected_attributes(&wrap);
        services
            .cart
            .add_to_cart(
                &guest.scope(),
                &CartItemRequest {
                    cart_type: ShoppingCartType::ShoppingCart,
                    product: &wrap,
                    attributes: &attributes,
                    customer_entered_price: None,
                    quantity: 2,
                },
            )
            .unwrap();

        let wrong = controller.login(&mut guest, &login_form("ada@example.com", "nope")).unwrap();
        let messages = wrong.model_state().unwrap().all_messages();
        assert!(messages.contains(&"The credentials provided are incorrect".to_string()));

        let ok = controller.login(&mut guest, &login_form("ada@example.com", "secret1")).unwrap();
        assert_eq!(ok.redirect_target(), Some(&RedirectTarget::Local("/cart".into())));
        assert_eq!(guest.customer.id, registered);
        let cart = services
            .cart
            .get_cart(registered, ShoppingCartType::ShoppingCart, guest.store.id)
            .unwrap();
        assert_eq!(cart[0].quantity, 2);
    }

    #[test]
    fn test_email_validation_activation() {
        let (services, _demo, _factory, mut ctx) = setup();
        ctx.settings.customer.user_registration_type = UserRegistrationType::EmailValidation;
        let controller = CustomerController::new(services.clone());
        let result = controller.register(&mut ctx, &register_form("bob@example.com")).unwrap();
        assert_eq!(
            result.redirect_target(),
            Some(&RedirectTarget::RegisterResult {
                result: RESULT_EMAIL_VALIDATION
            })
        );
        assert!(!ctx.customer.active);
        let token = ctx.attribute(CustomerAttribute::AccountActivationToken).unwrap().to_string();
        let guid = ctx.customer.guid.to_string();

        let bad = controller.account_activation(&mut ctx, "wrong", &guid).unwrap();
        assert_eq!(bad.redirect_target(), Some(&RedirectTarget::HomePage));
        let ok = controller.account_activation(&mut ctx, &token, &guid).unwrap();
        assert_eq!(ok.model().unwrap().result, "Your account has been activated");
        let customer = services.customers.get_customer_by_guid(&guid).unwrap().unwrap();
        assert!(customer.active);
    }

    #[test]
    fn test_username_availability() {
        let (services, _demo, _factory, mut ctx) = setup();
        ctx.settings.customer.usernames_enabled = true;
        let controller = CustomerController::new(services);
        let taken = controller.check_username_availability(&mut ctx, "moderator").unwrap();
        assert_eq!(taken.json_body().unwrap()["Available"], false);
        let free = controller.check_username_availability(&mut ctx, "newbie").unwrap();
        assert_eq!(free.json_body().unwrap()["Text"], "Username available");
    }

    #[test]
    fn test_account_pages_need_registration() {
        let (services, _demo, _factory, mut ctx) = setup();
        let controller = CustomerController::new(services);
        let result = controller.info_form(&mut ctx).unwrap();
        assert_eq!(result.redirect_target().unwrap().path(), "/login?returnUrl=/customer/info");
    }

    #[test]
    fn test_address_book() {
        let (services, _demo, _factory, mut ctx) = setup();
        let controller = CustomerController::new(services);
        controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();

        let mut address = AddressModel {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            address1: "1 Engine Way".into(),
            city: "London".into(),
            country_code: "gb".into(),
            zip: "N1".into(),
            ..Default::default()
        };
        let added = controller.address_add(&mut ctx, &address).unwrap();
        assert_eq!(added.redirect_target(), Some(&RedirectTarget::CustomerAddresses));
        let list = controller.addresses(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(list.addresses.len(), 1);
        assert_eq!(list.addresses[0].country_code, "GB");

        let id = list.addresses[0].id;
        address.city = "Cambridge".into();
        controller.address_edit(&mut ctx, id, &address).unwrap();
        assert_eq!(ctx.customer.address(id).unwrap().city, "Cambridge");

        address.zip.clear();
        let invalid = controller.address_edit(&mut ctx, id, &address).unwrap();
        assert_eq!(invalid.model_state().unwrap().field_errors("Address.Zip").len(), 1);

        controller.address_delete(&mut ctx, id).unwrap();
        assert!(ctx.customer.addresses.is_empty());
    }

    #[test]
    fn test_change_password() {
        let (services, _demo, _factory, mut ctx) = setup();
        let controller = CustomerController::new(services.clone());
        controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();

        let wrong = ChangePasswordForm {
            old_password: "nope".into(),
            new_password: "better1".into(),
            confirm_new_password: "better1".into(),
        };
        let result = controller.change_password(&mut ctx, &wrong).unwrap();
        assert_eq!(result.model_state().unwrap().all_messages(), vec!["Old password doesn't match"]);

        let right = ChangePasswordForm {
            old_password: "secret1".into(),
            ..wrong
        };
        let result = controller.change_password(&mut ctx, &right).unwrap();
        assert_eq!(result.model().unwrap().result.as_deref(), Some("Password was changed"));
        let login = services
            .registration
            .validate_customer("ada@example.com", "better1", false)
            .unwrap();
        assert!(matches!(login, CustomerLoginResult::Successful(_)));
    }

    #[test]
    fn test_password_recovery() {
        let (services, _demo, factory, mut ctx) = setup();
        let controller = CustomerController::new(services.clone());
        controller.register(&mut ctx, &register_form("ada@example.com")).unwrap();
        let guid = ctx.customer.guid.to_string();

        let mut visitor = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        let unknown = PasswordRecoveryModel {
            email: "nobody@example.com".into(),
            result: None,
        };
        let result = controller.password_recovery_send(&mut visitor, &unknown).unwrap();
        assert_eq!(result.model().unwrap().result.as_deref(), Some("Email not found."));

        let known = PasswordRecoveryModel {
            email: "ada@example.com".into(),
            result: None,
        };
        controller.password_recovery_send(&mut visitor, &known).unwrap();
        let email = services.memory.queued_emails().unwrap().pop().unwrap();
        assert_eq!(email.template, MessageTemplate::CustomerPasswordRecovery);
        let token = email
            .body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap()
            .to_string();

        let form = controller
            .password_recovery_confirm_form(&mut visitor, &token, &guid)
            .unwrap()
            .into_model()
            .unwrap();
        assert!(!form.disable_password_changing);

        let confirm = PasswordRecoveryConfirmForm {
            new_password: "fresh12".into(),
            confirm_new_password: "fresh12".into(),
        };
        let done = controller
            .password_recovery_confirm(&mut visitor, &token, &guid, &confirm)
            .unwrap()
            .into_model()
            .unwrap();
        assert_eq!(done.result.as_deref(), Some("Your password has been changed"));

        let reused = controller
            .password_recovery_confirm(&mut visitor, &token, &guid, &confirm)
            .unwrap()
            .into_model()
            .unwrap();
        assert!(reused.disable_password_changing);
    }
}
