use serde::{Deserialize, Serialize};
use shop_domain::{CartItemId, ProductId};

use super::catalog::PictureModel;
use super::order::OrderTotalsModel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingCartItemModel {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub picture: Option<PictureModel>,
    pub unit_price: String,
    pub sub_total: String,
    pub discount: Option<String>,
    pub quantity: i64,
    pub allowed_quantities: Vec<i64>,
    pub attribute_info: String,
    pub allow_item_editing: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountBoxModel {
    pub display: bool,
    pub current_code: Option<String>,
    pub message: Option<String>,
    pub is_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftCardBoxModel {
    pub display: bool,
    pub message: Option<String>,
    pub is_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateShippingModel {
    pub enabled: bool,
    pub country_code: String,
    pub province_code: Option<String>,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingCartModel {
    pub is_editable: bool,
    pub show_sku: bool,
    pub show_product_images: bool,
    pub items: Vec<ShoppingCartItemModel>,
    pub warnings: Vec<String>,
    pub min_order_subtotal_warning: Option<String>,
    pub terms_of_service_on_shopping_cart_page: bool,
    pub discount_box: DiscountBoxModel,
    pub gift_card_box: GiftCardBoxModel,
    pub estimate_shipping: EstimateShippingModel,
    pub order_totals: Option<OrderTotalsModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistModel {
    pub customer_guid: String,
    pub customer_fullname: String,
    pub is_editable: bool,
    pub email_wishlist_enabled: bool,
    pub display_add_to_cart: bool,
    pub items: Vec<ShoppingCartItemModel>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniShoppingCartItemModel {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub attribute_info: String,
    pub quantity: i64,
    pub unit_price: String,
    pub picture: Option<PictureModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiniShoppingCartModel {
    pub total_products: i64,
    pub sub_total: Option<String>,
    pub display_shopping_cart_button: bool,
    pub display_checkout_button: bool,
    pub current_customer_is_guest: bool,
    pub anonymous_checkout_allowed: bool,
    pub show_product_images: bool,
    pub items: Vec<MiniShoppingCartItemModel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartItemUpdate {
    pub id: CartItemId,
    pub quantity: i64,
    pub remove: bool,
    /// Wishlist only: move this line to the cart.
    pub add_to_cart: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCartForm {
    pub items: Vec<CartItemUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateShippingForm {
    pub country_code: String,
    pub province_code: Option<String>,
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOptionModel {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateShippingResultModel {
    pub shipping_options: Vec<ShippingOptionModel>,
    pub warnings: Vec<String>,
}
