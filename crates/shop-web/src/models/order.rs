use serde::{Deserialize, Serialize};
use shop_domain::{GiftCardId, OrderId, ProductId};

use super::AddressModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateModel {
    pub rate: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftCardModel {
    pub id: GiftCardId,
    pub coupon_code: String,
    pub amount: String,
    pub remaining: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotalsModel {
    pub is_editable: bool,
    pub sub_total: String,
    pub sub_total_discount: Option<String>,
    pub allow_remove_sub_total_discount: bool,
    /// `None` until a shipping method is chosen.
    pub shipping: Option<String>,
    pub required_shipping: bool,
    pub selected_shipping_method: Option<String>,
    pub payment_method_additional_fee: Option<String>,
    pub tax: Option<String>,
    pub tax_rates: Vec<TaxRateModel>,
    pub display_tax: bool,
    pub display_tax_rates: bool,
    pub order_total_discount: Option<String>,
    pub allow_remove_order_total_discount: bool,
    pub gift_cards: Vec<GiftCardModel>,
    pub order_total: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemModel {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub attribute_info: String,
    pub unit_price: String,
    pub quantity: i64,
    pub sub_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNoteModel {
    pub note: String,
    pub created_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailsModel {
    pub id: OrderId,
    pub created_on: String,
    pub order_status: String,
    pub is_reorder_allowed: bool,
    pub billing_address: AddressModel,
    pub is_shippable: bool,
    pub shipping_address: Option<AddressModel>,
    pub shipping_method: Option<String>,
    pub shipping_status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub items: Vec<OrderItemModel>,
    pub order_subtotal: String,
    pub order_subtotal_discount: Option<String>,
    pub order_shipping: Option<String>,
    pub payment_method_additional_fee: Option<String>,
    pub tax: Option<String>,
    pub tax_rates: Vec<TaxRateModel>,
    pub display_tax: bool,
    pub display_tax_rates: bool,
    pub order_total_discount: Option<String>,
    pub gift_cards: Vec<GiftCardModel>,
    pub order_total: String,
    pub order_notes: Vec<OrderNoteModel>,
}
