//! Payment methods and the registry that loads them.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shop_domain::checkout::{Order, PaymentStatus};
use shop_domain::prelude::*;
use shop_domain::settings::PaymentSettings;
use shop_domain::store::Store;
use uuid::Uuid;

use crate::tokens::new_token;

pub const CHECK_MONEY_ORDER: &str = "Payments.CheckMoneyOrder";
pub const MANUAL_CARD: &str = "Payments.Manual";
pub const REDIRECT_GATEWAY: &str = "Payments.Redirect";

/// Payment details carried from the payment info step to order placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessPaymentRequest {
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    /// Set when a retried payment must keep the order guid.
    pub order_guid: Option<Uuid>,
    pub order_total: Option<Money>,
    pub payment_method_system_name: String,
    pub credit_card_type: String,
    pub credit_card_name: String,
    pub credit_card_number: String,
    pub credit_card_expire_month: u32,
    pub credit_card_expire_year: i32,
    pub credit_card_cvv2: String,
}

/// Posted payment info form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaymentInfoForm {
    pub credit_card_type: String,
    pub cardholder_name: String,
    pub card_number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub card_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessPaymentResult {
    pub errors: Vec<String>,
    pub new_payment_status: PaymentStatus,
    pub authorization_transaction_id: Option<String>,
}

impl ProcessPaymentResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    fn with_status(status: PaymentStatus) -> Self {
        Self {
            errors: Vec::new(),
            new_payment_status: status,
            authorization_transaction_id: None,
        }
    }
}

pub trait PaymentMethod: Send + Sync {
    fn system_name(&self) -> &str;

    fn friendly_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// No payment info step for this method.
    fn skip_payment_info(&self) -> bool {
        false
    }

    fn validate_payment_form(&self, _form: &PaymentInfoForm) -> Vec<String> {
        Vec::new()
    }

    fn get_payment_info(&self, _form: &PaymentInfoForm) -> ProcessPaymentRequest {
        ProcessPaymentRequest {
            payment_method_system_name: self.system_name().to_string(),
            ..Default::default()
        }
    }

    fn process_payment(&self, request: &ProcessPaymentRequest) -> ProcessPaymentResult;

    /// Where to send the customer after the order is placed, for methods
    /// that finish payment on an external site.
    fn post_process_payment(&self, _order: &Order, _store: &Store) -> Option<String> {
        None
    }
}

/// Pay by check or money order after the order is placed.
#[derive(Debug, Default)]
pub struct CheckMoneyOrderPayment;

impl PaymentMethod for CheckMoneyOrderPayment {
    fn system_name(&self) -> &str {
        CHECK_MONEY_ORDER
    }

    fn friendly_name(&self) -> &str {
        "Check / Money Order"
    }

    fn description(&self) -> &str {
        "Mail your payment to the store address."
    }

    fn skip_payment_info(&self) -> bool {
        true
    }

    fn process_payment(&self, _request: &ProcessPaymentRequest) -> ProcessPaymentResult {
        ProcessPaymentResult::with_status(PaymentStatus::Pending)
    }
}

/// Card details captured for manual processing.
#[derive(Debug, Default)]
pub struct ManualCardPayment;

/// Luhn checksum over the digits of `number`, ignoring spaces and dashes.
pub fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = number
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                *d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Card form checks against `today`.
pub fn validate_card_form(form: &PaymentInfoForm, today: NaiveDate) -> Vec<String> {
    let mut errors = Vec::new();
    if form.cardholder_name.trim().is_empty() {
        errors.push("Enter cardholder name".to_string());
    }
    if !luhn_valid(&form.card_number) {
        errors.push("Wrong card number".to_string());
    }
    let code = form.card_code.trim();
    if !(3..=4).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_digit()) {
        errors.push("Wrong card code".to_string());
    }
    match (form.expire_month.trim().parse::<u32>(), form.expire_year.trim().parse::<i32>()) {
        (Ok(month), Ok(year)) if (1..=12).contains(&month) => {
            if (year, month) < (today.year(), today.month()) {
                errors.push("Card is expired".to_string());
            }
        }
        _ => errors.push("Wrong expiration date".to_string()),
    }
    errors
}

impl PaymentMethod for ManualCardPayment {
    fn system_name(&self) -> &str {
        MANUAL_CARD
    }

    fn friendly_name(&self) -> &str {
        "Credit Card"
    }

    fn validate_payment_form(&self, form: &PaymentInfoForm) -> Vec<String> {
        validate_card_form(form, Utc::now().date_naive())
    }

    fn get_payment_info(&self, form: &PaymentInfoForm) -> ProcessPaymentRequest {
        ProcessPaymentRequest {
            payment_method_system_name: MANUAL_CARD.to_string(),
            credit_card_type: form.credit_card_type.clone(),
            credit_card_name: form.cardholder_name.trim().to_string(),
            credit_card_number: form.card_number.chars().filter(char::is_ascii_digit).collect(),
            credit_card_expire_month: form.expire_month.trim().parse().unwrap_or(0),
            credit_card_expire_year: form.expire_year.trim().parse().unwrap_or(0),
            credit_card_cvv2: form.card_code.trim().to_string(),
            ..Default::default()
        }
    }

    fn process_payment(&self, request: &ProcessPaymentRequest) -> ProcessPaymentResult {
        if !luhn_valid(&request.credit_card_number) {
            return ProcessPaymentResult {
                errors: vec!["Wrong card number".to_string()],
                ..ProcessPaymentResult::with_status(PaymentStatus::Pending)
            };
        }
        ProcessPaymentResult {
            authorization_transaction_id: Some(new_token()),
            ..ProcessPaymentResult::with_status(PaymentStatus::Authorized)
        }
    }
}

/// Hosted payment page the customer is sent to after placing the order.
#[derive(Debug)]
pub struct RedirectGatewayPayment {
    gateway_url: String,
}

impl RedirectGatewayPayment {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
        }
    }
}

impl PaymentMethod for RedirectGatewayPayment {
    fn system_name(&self) -> &str {
        REDIRECT_GATEWAY
    }

    fn friendly_name(&self) -> &str {
        "Pay online"
    }

    fn description(&self) -> &str {
        "You will be redirected to the payment provider to complete the order."
    }

    fn skip_payment_info(&self) -> bool {
        true
    }

    fn process_payment(&self, _request: &ProcessPaymentRequest) -> ProcessPaymentResult {
        ProcessPaymentResult::with_status(PaymentStatus::Pending)
    }

    fn post_process_payment(&self, order: &Order, store: &Store) -> Option<String> {
        Some(format!(
            "{}?order={}&amount={}&currency={}&return={}",
            self.gateway_url,
            order.guid,
            order.total.display_amount(),
            order.total.currency.code(),
            store.absolute_url(&format!("checkout/completed/{}", order.id)),
        ))
    }
}

pub trait PaymentService: Send + Sync {
    fn load_all_payment_methods(&self) -> Vec<Arc<dyn PaymentMethod>>;

    /// Enabled methods in the configured order.
    fn load_active_payment_methods(&self, settings: &PaymentSettings) -> Vec<Arc<dyn PaymentMethod>> {
        let all = self.load_all_payment_methods();
        settings
            .active_payment_method_system_names
            .iter()
            .filter_map(|name| all.iter().find(|m| m.system_name() == name).cloned())
            .collect()
    }

    fn load_payment_method_by_system_name(&self, name: &str) -> Option<Arc<dyn PaymentMethod>> {
        self.load_all_payment_methods()
            .into_iter()
            .find(|m| m.system_name() == name)
    }

    fn is_payment_method_active(&self, settings: &PaymentSettings, name: &str) -> bool {
        settings.active_payment_method_system_names.iter().any(|n| n == name)
            && self.load_payment_method_by_system_name(name).is_some()
    }
}

pub struct DefaultPaymentService {
    methods: Vec<Arc<dyn PaymentMethod>>,
}

impl DefaultPaymentService {
    pub fn new(methods: Vec<Arc<dyn PaymentMethod>>) -> Self {
        Self { methods }
    }

    /// Check/money order, manual card and a redirect gateway.
    pub fn with_standard_methods(gateway_url: &str) -> Self {
        Self::new(vec![
            Arc::new(CheckMoneyOrderPayment),
            Arc::new(ManualCardPayment),
            Arc::new(RedirectGatewayPayment::new(gateway_url)),
        ])
    }
}

impl PaymentService for DefaultPaymentService {
    fn load_all_payment_methods(&self) -> Vec<Arc<dyn PaymentMethod>> {
        self.methods.clone()
    }
}
