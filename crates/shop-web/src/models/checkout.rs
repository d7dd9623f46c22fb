use serde::{Deserialize, Serialize};
use shop_domain::{AddressId, OrderId};
use shop_services::payments::{PaymentInfoForm, ProcessPaymentRequest};

use super::cart::ShoppingCartModel;
use super::order::OrderTotalsModel;
use super::AddressModel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutBillingAddressModel {
    pub existing_addresses: Vec<AddressModel>,
    pub new_address: AddressModel,
    /// Offer "ship to the same address".
    pub ship_to_same_address_allowed: bool,
    pub ship_to_same_address: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutShippingAddressModel {
    pub existing_addresses: Vec<AddressModel>,
    pub new_address: AddressModel,
}

/// Picking an address already in the address book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectAddressForm {
    pub address_id: AddressId,
    pub ship_to_same_address: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAddressForm {
    pub address: AddressModel,
    pub ship_to_same_address: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethodModel {
    pub name: String,
    pub description: Option<String>,
    pub fee: String,
    pub form_value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutShippingMethodModel {
    pub shipping_methods: Vec<ShippingMethodModel>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodModel {
    pub system_name: String,
    pub name: String,
    pub description: String,
    pub fee: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPaymentMethodModel {
    pub payment_methods: Vec<PaymentMethodModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPaymentInfoModel {
    pub payment_method_system_name: String,
    pub payment_method_name: String,
    /// Posted values, card number and code cleared.
    pub form: PaymentInfoForm,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfirmModel {
    pub terms_of_service_on_order_confirm_page: bool,
    pub min_order_total_warning: Option<String>,
    pub warnings: Vec<String>,
    pub cart: ShoppingCartModel,
    pub order_totals: Option<OrderTotalsModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutCompletedModel {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutProgressStep {
    #[default]
    Cart,
    Address,
    Shipping,
    Payment,
    Confirm,
    Complete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutProgressModel {
    pub step: CheckoutProgressStep,
}

/// Payment details kept in the visitor's session between the payment info
/// step and order confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPaymentSession {
    pub request: Option<ProcessPaymentRequest>,
}
