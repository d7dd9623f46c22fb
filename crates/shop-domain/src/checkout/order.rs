//! Placed orders.

use crate::cart::SelectedAttributes;
use crate::checkout::Address;
use crate::ids::{CustomerId, GiftCardId, OrderId, ProductId, StoreId};
use crate::money::{Currency, Money};
use crate::settings::TaxDisplayType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Authorized,
    Paid,
    Refunded,
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShippingStatus {
    ShippingNotRequired,
    #[default]
    NotYetShipped,
    Shipped,
    Delivered,
}

macro_rules! status_display {
    ($ty:ident { $($variant:ident => $text:expr),* $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $($ty::$variant => $text,)*
                };
                write!(f, "{}", text)
            }
        }
    };
}

status_display!(OrderStatus {
    Pending => "Pending",
    Processing => "Processing",
    Complete => "Complete",
    Cancelled => "Cancelled",
});
status_display!(PaymentStatus {
    Pending => "Pending",
    Authorized => "Authorized",
    Paid => "Paid",
    Refunded => "Refunded",
    Voided => "Voided",
});
status_display!(ShippingStatus {
    ShippingNotRequired => "Shipping not required",
    NotYetShipped => "Not yet shipped",
    Shipped => "Shipped",
    Delivered => "Delivered",
});

/// One applied tax rate and the tax it produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxRate {
    pub rate_percent: f64,
    pub amount: Money,
}

/// A purchased line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub attributes: SelectedAttributes,
    /// Human-readable attribute summary captured at order time.
    pub attribute_description: String,
    pub quantity: i64,
    pub unit_price_incl_tax: Money,
    pub unit_price_excl_tax: Money,
    pub price_incl_tax: Money,
    pub price_excl_tax: Money,
    pub discount_incl_tax: Money,
    pub discount_excl_tax: Money,
}

/// A note attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderNote {
    pub note: String,
    pub display_to_customer: bool,
    pub created_at: i64,
}

/// A placed order. Amounts are in the primary store currency; the
/// customer's currency and rate at order time are kept for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub guid: Uuid,
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub billing_address: Address,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<String>,
    pub shipping_provider: Option<String>,
    pub payment_method_system_name: String,
    pub customer_currency: Currency,
    pub currency_rate: f64,
    pub tax_display_type: TaxDisplayType,
    pub items: Vec<OrderItem>,
    pub subtotal_incl_tax: Money,
    pub subtotal_excl_tax: Money,
    pub subtotal_discount_incl_tax: Money,
    pub subtotal_discount_excl_tax: Money,
    pub shipping_incl_tax: Money,
    pub shipping_excl_tax: Money,
    pub payment_fee_incl_tax: Money,
    pub payment_fee_excl_tax: Money,
    pub tax: Money,
    pub tax_rates: Vec<TaxRate>,
    pub order_discount: Money,
    pub gift_cards_used: Vec<(GiftCardId, Money)>,
    pub total: Money,
    pub notes: Vec<OrderNote>,
    /// Transaction id returned by the payment method.
    pub authorization_transaction_id: Option<String>,
    pub created_at: i64,
}

impl Order {
    pub fn is_shippable(&self) -> bool {
        self.shipping_status != ShippingStatus::ShippingNotRequired
    }

    /// Format a stored amount in the customer's currency.
    pub fn display_in_customer_currency(&self, amount: &Money) -> String {
        amount.convert(self.currency_rate, self.customer_currency).display()
    }

    pub fn add_note(&mut self, note: impl Into<String>, display_to_customer: bool) {
        self.notes.push(OrderNote {
            note: note.into(),
            display_to_customer,
            created_at: crate::current_timestamp(),
        });
    }
}
