//! Storefront domain types.
//!
//! Entities and value types shared by the service layer and the web layer:
//!
//! - **Catalog**: products, categories, manufacturers, specifications, reviews
//! - **Cart**: shopping cart and wishlist items, discounts, gift cards
//! - **Checkout**: addresses, shipping options, orders
//! - **Customers**: roles, generic attributes
//! - **Forums**: groups, forums, topics, posts, subscriptions
//! - **Settings**: merchant configuration that drives the storefront
//!
//! Monetary values use the cents-based [`Money`] type.

pub mod error;
pub mod ids;
pub mod money;
pub mod paging;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod discount;
pub mod forum;
pub mod settings;
pub mod store;

pub use error::DomainError;
pub use ids::*;
pub use money::{Currency, Money};
pub use paging::PagedList;

/// Get the current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::current_timestamp;
    pub use crate::error::DomainError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::paging::PagedList;

    pub use crate::cart::{SelectedAttributes, ShoppingCartItem, ShoppingCartType};
    pub use crate::catalog::{
        AttributeControlType, Category, InventoryLevel, Manufacturer, Picture, Product,
        ProductAttributeMapping, ProductAttributeValue, ProductReview, ProductSpecification,
        SpecificationAttribute, TierPrice,
    };
    pub use crate::checkout::{
        Address, Order, OrderItem, OrderStatus, PaymentStatus, ShippingOption, ShippingStatus,
    };
    pub use crate::customer::{Customer, CustomerAttribute, CustomerRole};
    pub use crate::discount::{Discount, DiscountRequirement, DiscountType, GiftCard};
    pub use crate::forum::{
        Forum, ForumGroup, ForumPost, ForumSearchType, ForumSubscription, ForumTopic,
        ForumTopicType,
    };
    pub use crate::settings::StoreSettings;
    pub use crate::store::{Store, ThemeDescriptor};
}
