//! Storefront services.
//!
//! Each service is a trait so the web layer can be wired against any backing
//! store. The reference implementations keep everything in a [`MemoryStore`]:
//!
//! - **Catalog**: products, categories, manufacturers, specifications, reviews
//! - **Customers**: registration, authentication, addresses, attributes
//! - **Cart**: cart and wishlist lines with item and cart warnings
//! - **Pricing**: final prices, tax, currencies, price formatting
//! - **Checkout**: totals, shipping, payment methods, order placement
//! - **Forums**: topics, posts, subscriptions and permissions
//! - **Messages**: queued workflow emails
//!
//! # Example
//!
//! ```rust
//! use shop_services::catalog::ProductService;
//! use shop_services::seed::seed_demo;
//! use shop_services::ServiceRegistry;
//!
//! let services = ServiceRegistry::in_memory();
//! let demo = seed_demo(&services.memory).unwrap();
//! let laptop = services.products.get_product_by_id(demo.laptop).unwrap().unwrap();
//! assert_eq!(laptop.name, "Lumen Book 14");
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod customers;
pub mod discounts;
pub mod error;
pub mod forums;
pub mod memory;
pub mod messages;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod registry;
pub mod scope;
pub mod seed;
pub mod shipping;
pub mod stores;
pub mod tokens;
pub mod totals;

pub use error::ServiceError;
pub use memory::MemoryStore;
pub use registry::ServiceRegistry;
pub use scope::StoreScope;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::auth::{AuthenticationService, CustomerLoginResult, CustomerRegistrationService};
    pub use crate::cart::{CartItemRequest, CartLine, ShoppingCartService};
    pub use crate::catalog::{
        CategoryService, ManufacturerService, PictureService, ProductService, ReviewService,
        SpecificationAttributeService,
    };
    pub use crate::customers::CustomerService;
    pub use crate::discounts::{DiscountService, GiftCardService};
    pub use crate::forums::{ForumPermissions, ForumService};
    pub use crate::messages::WorkflowMessageService;
    pub use crate::orders::{OrderProcessingService, OrderService};
    pub use crate::payments::{PaymentMethod, PaymentService};
    pub use crate::pricing::{CurrencyService, PriceCalculationService, PriceFormatter, TaxService};
    pub use crate::shipping::ShippingService;
    pub use crate::stores::{StoreService, ThemeRegistry};
    pub use crate::totals::OrderTotalCalculationService;
    pub use crate::{MemoryStore, ServiceError, ServiceRegistry, StoreScope};
}
