//! Storefront presentation layer.
//!
//! Controllers take a [`WorkContext`] and a typed form, call the services in
//! [`shop_services`] and hand back an [`ActionResult`] carrying a view
//! model, a redirect or a JSON/RSS payload:
//!
//! - **Catalog**: product pages, reviews, compare list, email a friend
//! - **Cart**: cart, wishlist, coupons, gift cards, shipping estimates
//! - **Checkout**: address, shipping, payment and confirmation steps
//! - **Customer**: login, registration, account pages, password recovery
//! - **Boards**: forums, topics, posts, search and subscriptions
//! - **Theme**: theme selection
//!
//! # Example
//!
//! ```rust
//! use shop_cache::SessionId;
//! use shop_services::seed::{seed_demo, DEMO_STORE_ID};
//! use shop_services::ServiceRegistry;
//! use shop_web::config::ShopConfig;
//! use shop_web::context::ContextFactory;
//! use shop_web::controllers::ProductController;
//!
//! let services = ServiceRegistry::in_memory();
//! let demo = seed_demo(&services.memory).unwrap();
//! let factory = ContextFactory::new(services.clone(), ShopConfig::default());
//! let mut ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
//!
//! let products = ProductController::new(services);
//! let page = products.product_details(&mut ctx, demo.laptop, None).unwrap();
//! assert_eq!(page.model().unwrap().name, "Lumen Book 14");
//! ```

pub mod bbcode;
pub mod config;
pub mod context;
pub mod controllers;
pub mod error;
pub mod feed;
pub mod helpers;
pub mod models;
pub mod pager;
pub mod result;
pub mod validation;

pub use config::{ConfigError, ShopConfig};
pub use context::{ContextFactory, Permission, RequestId, WorkContext};
pub use error::WebError;
pub use result::{ActionResult, ModelState, RedirectTarget};

/// Result type of controller actions.
pub type ActionOutcome<M> = Result<ActionResult<M>, WebError>;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::controllers::{
        BoardsController, CheckoutController, CustomerController, ProductController, ShoppingCartController,
        ThemeController, ThemeContext,
    };
    pub use crate::helpers::{CatalogHelper, OrderHelper};
    pub use crate::{
        ActionOutcome, ActionResult, ContextFactory, ModelState, Permission, RedirectTarget, ShopConfig, WebError,
        WorkContext,
    };
}
