//! Merchant settings.
//!
//! Every section deserializes with defaults so a configuration file only
//! needs to list what differs from the stock storefront. Monetary thresholds
//! are stored in cents of the store's primary currency.

use std::collections::BTreeMap;

use crate::ids::TaxCategoryId;
use serde::{Deserialize, Serialize};

/// Whether shown prices include tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaxDisplayType {
    #[default]
    ExcludingTax,
    IncludingTax,
}

/// How new customers get an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRegistrationType {
    #[default]
    Standard,
    EmailValidation,
    AdminApproval,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSettings {
    pub show_sku: bool,
    pub show_manufacturer_part_number: bool,
    pub show_gtin: bool,
    pub show_weight: bool,
    pub show_dimensions: bool,
    pub show_category_product_number: bool,
    pub show_category_product_number_including_subcategories: bool,
    pub category_breadcrumb_enabled: bool,
    /// Manufacturers shown in the navigation block, 0 for all.
    pub manufacturers_block_items_to_display: usize,
    pub product_reviews_enabled: bool,
    pub product_reviews_must_be_approved: bool,
    pub allow_anonymous_users_to_review_product: bool,
    pub show_product_reviews_in_lists: bool,
    pub email_a_friend_enabled: bool,
    pub allow_anonymous_users_to_email_a_friend: bool,
    pub recently_viewed_products_enabled: bool,
    pub recently_viewed_products_number: usize,
    pub new_products_enabled: bool,
    pub new_products_number: usize,
    pub compare_products_enabled: bool,
    pub compare_products_number: usize,
    pub include_short_description_in_compare_products: bool,
    pub include_full_description_in_compare_products: bool,
    pub display_tier_prices_with_discounts: bool,
    pub ignore_discounts: bool,
    pub show_specifications_in_lists: bool,
    pub default_page_size: usize,
    /// Minutes cached catalog navigation stays fresh.
    pub cache_minutes: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            show_sku: true,
            show_manufacturer_part_number: false,
            show_gtin: false,
            show_weight: false,
            show_dimensions: false,
            show_category_product_number: true,
            show_category_product_number_including_subcategories: false,
            category_breadcrumb_enabled: true,
            manufacturers_block_items_to_display: 5,
            product_reviews_enabled: true,
            product_reviews_must_be_approved: false,
            allow_anonymous_users_to_review_product: false,
            show_product_reviews_in_lists: true,
            email_a_friend_enabled: true,
            allow_anonymous_users_to_email_a_friend: false,
            recently_viewed_products_enabled: true,
            recently_viewed_products_number: 3,
            new_products_enabled: true,
            new_products_number: 6,
            compare_products_enabled: true,
            compare_products_number: 4,
            include_short_description_in_compare_products: false,
            include_full_description_in_compare_products: false,
            display_tier_prices_with_discounts: true,
            ignore_discounts: false,
            show_specifications_in_lists: false,
            default_page_size: 12,
            cache_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShoppingCartSettings {
    pub display_cart_after_adding_product: bool,
    pub display_wishlist_after_adding_product: bool,
    pub maximum_shopping_cart_items: usize,
    pub maximum_wishlist_items: usize,
    pub move_items_from_wishlist_to_cart: bool,
    pub show_product_images_on_shopping_cart: bool,
    pub show_discount_box: bool,
    pub show_gift_card_box: bool,
    pub mini_shopping_cart_enabled: bool,
    pub mini_shopping_cart_product_number: usize,
    pub allow_cart_item_editing: bool,
    pub email_wishlist_enabled: bool,
}

impl Default for ShoppingCartSettings {
    fn default() -> Self {
        Self {
            display_cart_after_adding_product: false,
            display_wishlist_after_adding_product: false,
            maximum_shopping_cart_items: 1000,
            maximum_wishlist_items: 1000,
            move_items_from_wishlist_to_cart: true,
            show_product_images_on_shopping_cart: true,
            show_discount_box: true,
            show_gift_card_box: true,
            mini_shopping_cart_enabled: true,
            mini_shopping_cart_product_number: 5,
            allow_cart_item_editing: true,
            email_wishlist_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderSettings {
    pub anonymous_checkout_allowed: bool,
    pub terms_of_service_on_shopping_cart_page: bool,
    pub terms_of_service_on_order_confirm_page: bool,
    pub min_order_subtotal_cents: i64,
    pub min_order_total_cents: i64,
    pub disable_billing_address_checkout_step: bool,
    pub ship_to_same_address: bool,
    pub disable_order_completed_page: bool,
    pub is_reorder_allowed: bool,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            anonymous_checkout_allowed: true,
            terms_of_service_on_shopping_cart_page: false,
            terms_of_service_on_order_confirm_page: false,
            min_order_subtotal_cents: 0,
            min_order_total_cents: 0,
            disable_billing_address_checkout_step: false,
            ship_to_same_address: true,
            disable_order_completed_page: false,
            is_reorder_allowed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomerSettings {
    pub user_registration_type: UserRegistrationType,
    pub usernames_enabled: bool,
    pub allow_users_to_change_usernames: bool,
    pub check_username_availability_enabled: bool,
    pub password_min_length: usize,
    pub gender_enabled: bool,
    pub date_of_birth_enabled: bool,
    pub company_enabled: bool,
    pub company_required: bool,
    pub phone_enabled: bool,
    pub phone_required: bool,
    pub newsletter_enabled: bool,
    /// Hours a password recovery link stays valid.
    pub password_recovery_link_hours_valid: i64,
}

impl Default for CustomerSettings {
    fn default() -> Self {
        Self {
            user_registration_type: UserRegistrationType::Standard,
            usernames_enabled: false,
            allow_users_to_change_usernames: false,
            check_username_availability_enabled: false,
            password_min_length: 6,
            gender_enabled: true,
            date_of_birth_enabled: true,
            company_enabled: true,
            company_required: false,
            phone_enabled: false,
            phone_required: false,
            newsletter_enabled: true,
            password_recovery_link_hours_valid: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForumSettings {
    pub forums_enabled: bool,
    pub allow_guests_to_create_posts: bool,
    pub allow_guests_to_create_topics: bool,
    pub allow_customers_to_edit_posts: bool,
    pub allow_customers_to_delete_posts: bool,
    pub allow_customers_to_manage_subscriptions: bool,
    pub topics_page_size: usize,
    pub posts_page_size: usize,
    pub search_results_page_size: usize,
    pub active_discussions_page_size: usize,
    pub forum_subscriptions_page_size: usize,
    pub active_discussions_feed_enabled: bool,
    pub active_discussions_feed_count: usize,
    pub forum_feeds_enabled: bool,
    pub forum_feed_count: usize,
    pub home_page_active_discussions_topic_count: usize,
    pub topic_subject_max_length: usize,
    pub post_max_length: usize,
    pub show_customers_post_count: bool,
    pub forum_search_term_minimum_length: usize,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            forums_enabled: true,
            allow_guests_to_create_posts: false,
            allow_guests_to_create_topics: false,
            allow_customers_to_edit_posts: true,
            allow_customers_to_delete_posts: true,
            allow_customers_to_manage_subscriptions: true,
            topics_page_size: 10,
            posts_page_size: 10,
            search_results_page_size: 10,
            active_discussions_page_size: 50,
            forum_subscriptions_page_size: 10,
            active_discussions_feed_enabled: true,
            active_discussions_feed_count: 25,
            forum_feeds_enabled: true,
            forum_feed_count: 10,
            home_page_active_discussions_topic_count: 5,
            topic_subject_max_length: 450,
            post_max_length: 4000,
            show_customers_post_count: true,
            forum_search_term_minimum_length: 3,
        }
    }
}

/// Tax rate for one tax category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxCategoryRate {
    pub tax_category_id: TaxCategoryId,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxSettings {
    pub tax_display_type: TaxDisplayType,
    pub allow_customers_to_select_tax_display_type: bool,
    /// Catalog prices already contain tax.
    pub prices_include_tax: bool,
    pub display_tax_suffix: bool,
    pub display_tax_rates: bool,
    pub hide_zero_tax: bool,
    pub hide_tax_in_order_summary: bool,
    pub shipping_is_taxable: bool,
    pub shipping_tax_category_id: Option<TaxCategoryId>,
    pub payment_method_additional_fee_is_taxable: bool,
    /// Rate for products without a tax category.
    pub default_rate_percent: f64,
    pub category_rates: Vec<TaxCategoryRate>,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            tax_display_type: TaxDisplayType::ExcludingTax,
            allow_customers_to_select_tax_display_type: false,
            prices_include_tax: false,
            display_tax_suffix: false,
            display_tax_rates: false,
            hide_zero_tax: false,
            hide_tax_in_order_summary: false,
            shipping_is_taxable: false,
            shipping_tax_category_id: None,
            payment_method_additional_fee_is_taxable: false,
            default_rate_percent: 0.0,
            category_rates: Vec::new(),
        }
    }
}

impl TaxSettings {
    /// Rate for a tax category, falling back to the default rate.
    pub fn rate_for(&self, category: Option<TaxCategoryId>) -> f64 {
        category
            .and_then(|id| {
                self.category_rates
                    .iter()
                    .find(|r| r.tax_category_id == id)
                    .map(|r| r.rate_percent)
            })
            .unwrap_or(self.default_rate_percent)
    }
}

/// A flat-rate shipping method offered by the built-in rate provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingMethodSettings {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rate_cents: i64,
    /// Surcharge per unit of cart weight.
    #[serde(default)]
    pub per_weight_unit_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShippingSettings {
    pub estimate_shipping_enabled: bool,
    pub free_shipping_over_x_enabled: bool,
    pub free_shipping_over_x_value_cents: i64,
    /// Compare the free shipping threshold against the subtotal including tax.
    pub free_shipping_over_x_including_tax: bool,
    pub bypass_shipping_method_selection_if_only_one: bool,
    pub methods: Vec<ShippingMethodSettings>,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            estimate_shipping_enabled: true,
            free_shipping_over_x_enabled: false,
            free_shipping_over_x_value_cents: 0,
            free_shipping_over_x_including_tax: false,
            bypass_shipping_method_selection_if_only_one: false,
            methods: vec![
                ShippingMethodSettings {
                    name: "Ground".to_string(),
                    description: Some("Delivered in 5-7 business days".to_string()),
                    rate_cents: 500,
                    per_weight_unit_cents: 0,
                },
                ShippingMethodSettings {
                    name: "Next Day Air".to_string(),
                    description: Some("Delivered the next business day".to_string()),
                    rate_cents: 2000,
                    per_weight_unit_cents: 0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaymentSettings {
    /// System names of the enabled payment methods, in display order.
    pub active_payment_method_system_names: Vec<String>,
    pub bypass_payment_method_selection_if_only_one: bool,
    /// Additional fee per method system name, in cents.
    pub additional_fees_cents: BTreeMap<String, i64>,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            active_payment_method_system_names: vec![
                "Payments.CheckMoneyOrder".to_string(),
                "Payments.Manual".to_string(),
            ],
            bypass_payment_method_selection_if_only_one: true,
            additional_fees_cents: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediaSettings {
    pub product_thumb_picture_size: u32,
    pub product_details_picture_size: u32,
    pub category_thumb_picture_size: u32,
    pub manufacturer_thumb_picture_size: u32,
    pub cart_thumb_picture_size: u32,
    pub mini_cart_thumb_picture_size: u32,
    pub default_picture_zoom_enabled: bool,
    /// Base URL pictures are served from, ending with a slash.
    pub image_host: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            product_thumb_picture_size: 415,
            product_details_picture_size: 550,
            category_thumb_picture_size: 450,
            manufacturer_thumb_picture_size: 420,
            cart_thumb_picture_size: 80,
            mini_cart_thumb_picture_size: 70,
            default_picture_zoom_enabled: false,
            image_host: "/images/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeSettings {
    pub default_theme: String,
    pub allow_customer_to_select_theme: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            default_theme: "DefaultClean".to_string(),
            allow_customer_to_select_theme: false,
        }
    }
}

/// Role system names granted each storefront permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PermissionSettings {
    pub display_prices: Vec<String>,
    pub enable_shopping_cart: Vec<String>,
    pub enable_wishlist: Vec<String>,
    pub manage_forums: Vec<String>,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        let everyone = vec![
            "Guests".to_string(),
            "Registered".to_string(),
            "ForumModerators".to_string(),
            "Administrators".to_string(),
        ];
        Self {
            display_prices: everyone.clone(),
            enable_shopping_cart: everyone.clone(),
            enable_wishlist: everyone,
            manage_forums: vec!["ForumModerators".to_string(), "Administrators".to_string()],
        }
    }
}

/// All settings of one store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StoreSettings {
    pub catalog: CatalogSettings,
    pub shopping_cart: ShoppingCartSettings,
    pub order: OrderSettings,
    pub customer: CustomerSettings,
    pub forum: ForumSettings,
    pub tax: TaxSettings,
    pub shipping: ShippingSettings,
    pub payment: PaymentSettings,
    pub media: MediaSettings,
    pub theme: ThemeSettings,
    pub permissions: PermissionSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: StoreSettings =
            serde_json::from_str(r#"{"forum": {"forums_enabled": false}}"#).unwrap();
        assert!(!settings.forum.forums_enabled);
        assert_eq!(settings.forum.topics_page_size, 10);
        assert_eq!(settings.catalog, CatalogSettings::default());
    }

    #[test]
    fn test_tax_rate_lookup() {
        let tax = TaxSettings {
            default_rate_percent: 5.0,
            category_rates: vec![TaxCategoryRate {
                tax_category_id: TaxCategoryId::new(2),
                rate_percent: 20.0,
            }],
            ..Default::default()
        };
        assert_eq!(tax.rate_for(Some(TaxCategoryId::new(2))), 20.0);
        assert_eq!(tax.rate_for(Some(TaxCategoryId::new(3))), 5.0);
        assert_eq!(tax.rate_for(None), 5.0);
    }
}
