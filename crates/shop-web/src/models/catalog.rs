use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shop_domain::cart::ShoppingCartType;
use shop_domain::catalog::AttributeControlType;
use shop_domain::{
    AttributeMappingId, AttributeValueId, CartItemId, CategoryId, CustomerId, ManufacturerId, ProductId, ReviewId,
    SpecAttributeId,
};
use validator::Validate;

use crate::validation::non_blank;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictureModel {
    pub image_url: String,
    pub full_size_image_url: String,
    pub title: String,
    pub alternate_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceModel {
    pub old_price: Option<String>,
    pub price: Option<String>,
    pub price_with_discount: Option<String>,
    pub call_for_price: bool,
    pub customer_enters_price: bool,
    /// Set when the customer may not see prices.
    pub hide_prices: bool,
    pub disable_buy_button: bool,
    pub disable_wishlist_button: bool,
    /// Adding from a list has to go through the product page.
    pub force_redirection_after_adding_to_cart: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductReviewOverviewModel {
    pub product_id: ProductId,
    pub rating_sum: i64,
    pub total_reviews: i64,
    pub allow_customer_reviews: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpecificationModel {
    pub attribute_id: SpecAttributeId,
    pub attribute_name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductOverviewModel {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub sku: Option<String>,
    pub mark_as_new: bool,
    pub price: Option<ProductPriceModel>,
    pub default_picture: Option<PictureModel>,
    pub specifications: Vec<ProductSpecificationModel>,
    pub review_overview: Option<ProductReviewOverviewModel>,
}

/// Which parts of product cards to fill in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductOverviewOptions {
    pub prepare_price: bool,
    pub prepare_picture: bool,
    /// Overrides the product thumbnail size.
    pub picture_size: Option<u32>,
    pub prepare_specifications: bool,
    pub force_redirection_after_adding_to_cart: bool,
}

impl Default for ProductOverviewOptions {
    fn default() -> Self {
        Self {
            prepare_price: true,
            prepare_picture: true,
            picture_size: None,
            prepare_specifications: false,
            force_redirection_after_adding_to_cart: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySimpleModel {
    pub id: CategoryId,
    pub name: String,
    pub number_of_products: Option<usize>,
    pub sub_categories: Vec<CategorySimpleModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryNavigationModel {
    pub current_category_id: Option<CategoryId>,
    pub categories: Vec<CategorySimpleModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreadcrumbItem {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerBriefInfoModel {
    pub id: ManufacturerId,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerNavigationModel {
    pub manufacturers: Vec<ManufacturerBriefInfoModel>,
    pub total_manufacturers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPriceModel {
    pub quantity: i64,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributeValueModel {
    pub id: AttributeValueId,
    pub name: String,
    /// e.g. `[+$200.00]`
    pub price_adjustment: Option<String>,
    pub is_preselected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributeModel {
    pub id: AttributeMappingId,
    pub name: String,
    pub text_prompt: Option<String>,
    pub is_required: bool,
    pub control_type: AttributeControlType,
    /// Text already entered, for text controls.
    pub default_value: Option<String>,
    pub values: Vec<ProductAttributeValueModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddToCartModel {
    pub product_id: ProductId,
    pub entered_quantity: i64,
    pub allowed_quantities: Vec<i64>,
    pub customer_enters_price: bool,
    pub customer_entered_price: Option<String>,
    pub customer_entered_price_range: Option<String>,
    pub disable_buy_button: bool,
    pub disable_wishlist_button: bool,
    /// Set when editing an existing cart line.
    pub updated_cart_item_id: Option<CartItemId>,
    pub update_cart_item_type: Option<ShoppingCartType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailsModel {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub sku: Option<String>,
    pub manufacturer_part_number: Option<String>,
    pub gtin: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub stock_availability: Option<String>,
    pub is_free_shipping: bool,
    pub mark_as_new: bool,
    pub breadcrumb: Vec<CategoryBreadcrumbItem>,
    pub manufacturers: Vec<ManufacturerBriefInfoModel>,
    pub default_picture: PictureModel,
    pub pictures: Vec<PictureModel>,
    pub price: ProductPriceModel,
    pub add_to_cart: AddToCartModel,
    pub attributes: Vec<ProductAttributeModel>,
    pub tier_prices: Vec<TierPriceModel>,
    pub specifications: Vec<ProductSpecificationModel>,
    pub review_overview: ProductReviewOverviewModel,
    pub email_a_friend_enabled: bool,
    pub compare_products_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductReviewHelpfulnessModel {
    pub review_id: ReviewId,
    pub helpful_yes_total: usize,
    pub helpful_no_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReviewModel {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub title: String,
    pub review_text: String,
    pub rating: i32,
    pub helpfulness: ProductReviewHelpfulnessModel,
    pub written_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddProductReviewModel {
    pub title: String,
    pub review_text: String,
    pub rating: i32,
    pub can_current_customer_leave_review: bool,
    pub success_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductReviewsModel {
    pub product_id: ProductId,
    pub product_name: String,
    pub items: Vec<ProductReviewModel>,
    pub add_product_review: AddProductReviewModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProductReviewForm {
    #[validate(custom(function = "non_blank", message = "Review title is required"))]
    pub title: String,
    #[validate(custom(function = "non_blank", message = "Review text is required"))]
    pub review_text: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareProductsModel {
    pub include_short_description: bool,
    pub include_full_description: bool,
    pub products: Vec<ProductOverviewModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductEmailAFriendModel {
    pub product_id: ProductId,
    pub product_name: String,
    pub friend_email: String,
    pub your_email_address: String,
    pub personal_message: String,
    pub success_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProductEmailAFriendForm {
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub friend_email: String,
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub your_email_address: String,
    pub personal_message: String,
}

/// Posted product page form.
///
/// `attributes` holds the raw value per attribute: a value id for lists,
/// comma separated ids for checkboxes and the text for text boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDetailsForm {
    pub quantity: i64,
    pub attributes: BTreeMap<AttributeMappingId, String>,
    pub customer_entered_price: Option<String>,
    pub updated_cart_item_id: Option<CartItemId>,
}
