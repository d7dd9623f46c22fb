//! The set of service handles controllers are built with.

use std::sync::Arc;

use shop_cache::Cache;

use crate::auth::{
    AuthenticationService, CustomerRegistrationService, DefaultCustomerRegistrationService, PasswordHasher,
    SessionAuthenticationService,
};
use crate::cart::ShoppingCartService;
use crate::catalog::{
    CategoryService, ManufacturerService, PictureService, ProductService, ReviewService,
    SpecificationAttributeService,
};
use crate::customers::CustomerService;
use crate::discounts::{DiscountService, GiftCardService};
use crate::forums::ForumService;
use crate::memory::MemoryStore;
use crate::messages::{QueuedMessageService, WorkflowMessageService};
use crate::orders::{DefaultOrderProcessingService, OrderProcessingService, OrderService};
use crate::payments::{DefaultPaymentService, PaymentService};
use crate::pricing::{
    CurrencyService, DefaultPriceCalculationService, DefaultTaxService, PriceCalculationService, TaxService,
};
use crate::shipping::{FixedRateShippingService, ShippingService};
use crate::stores::{StoreService, ThemeRegistry};
use crate::totals::{DefaultOrderTotalCalculationService, OrderTotalCalculationService};

/// Gateway used by the redirect payment method when none is configured.
pub const DEFAULT_GATEWAY_URL: &str = "https://payments.example.com/pay";

/// Every storefront service behind a trait object.
#[derive(Clone)]
pub struct ServiceRegistry {
    /// Backing data, kept for seeding and inspection.
    pub memory: Arc<MemoryStore>,
    pub cache: Cache,
    pub stores: Arc<dyn StoreService>,
    pub themes: Arc<dyn ThemeRegistry>,
    pub products: Arc<dyn ProductService>,
    pub categories: Arc<dyn CategoryService>,
    pub manufacturers: Arc<dyn ManufacturerService>,
    pub specifications: Arc<dyn SpecificationAttributeService>,
    pub pictures: Arc<dyn PictureService>,
    pub reviews: Arc<dyn ReviewService>,
    pub customers: Arc<dyn CustomerService>,
    pub registration: Arc<dyn CustomerRegistrationService>,
    pub authentication: Arc<dyn AuthenticationService>,
    pub cart: Arc<dyn ShoppingCartService>,
    pub prices: Arc<dyn PriceCalculationService>,
    pub tax: Arc<dyn TaxService>,
    pub currency: Arc<dyn CurrencyService>,
    pub totals: Arc<dyn OrderTotalCalculationService>,
    pub shipping: Arc<dyn ShippingService>,
    pub payments: Arc<dyn PaymentService>,
    pub orders: Arc<dyn OrderService>,
    pub order_processing: Arc<dyn OrderProcessingService>,
    pub discounts: Arc<dyn DiscountService>,
    pub gift_cards: Arc<dyn GiftCardService>,
    pub forums: Arc<dyn ForumService>,
    pub messages: Arc<dyn WorkflowMessageService>,
}

impl ServiceRegistry {
    /// Empty in-memory storefront.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), Cache::in_memory())
    }

    pub fn with_store(memory: Arc<MemoryStore>, cache: Cache) -> Self {
        Self::build(memory, cache, PasswordHasher::default(), DEFAULT_GATEWAY_URL)
    }

    /// Wire every service over `memory`.
    pub fn build(memory: Arc<MemoryStore>, cache: Cache, hasher: PasswordHasher, gateway_url: &str) -> Self {
        let customers: Arc<dyn CustomerService> = memory.clone();
        let discounts: Arc<dyn DiscountService> = memory.clone();
        let gift_cards: Arc<dyn GiftCardService> = memory.clone();
        let cart: Arc<dyn ShoppingCartService> = memory.clone();
        let products: Arc<dyn ProductService> = memory.clone();
        let orders: Arc<dyn OrderService> = memory.clone();
        let currency: Arc<dyn CurrencyService> = memory.clone();

        let prices: Arc<dyn PriceCalculationService> = Arc::new(DefaultPriceCalculationService::new(discounts.clone()));
        let tax: Arc<dyn TaxService> = Arc::new(DefaultTaxService);
        let shipping: Arc<dyn ShippingService> = Arc::new(FixedRateShippingService);
        let payments: Arc<dyn PaymentService> = Arc::new(DefaultPaymentService::with_standard_methods(gateway_url));
        let messages: Arc<dyn WorkflowMessageService> = Arc::new(QueuedMessageService::new(memory.clone()));
        let totals: Arc<dyn OrderTotalCalculationService> = Arc::new(DefaultOrderTotalCalculationService::new(
            prices.clone(),
            tax.clone(),
            discounts.clone(),
            gift_cards.clone(),
            shipping.clone(),
        ));
        let order_processing: Arc<dyn OrderProcessingService> = Arc::new(DefaultOrderProcessingService {
            cart: cart.clone(),
            totals: totals.clone(),
            prices: prices.clone(),
            tax: tax.clone(),
            currency: currency.clone(),
            shipping: shipping.clone(),
            payments: payments.clone(),
            orders: orders.clone(),
            discounts: discounts.clone(),
            gift_cards: gift_cards.clone(),
            products: products.clone(),
            customers: customers.clone(),
            messages: messages.clone(),
        });

        Self {
            stores: memory.clone(),
            themes: memory.clone(),
            categories: memory.clone(),
            manufacturers: memory.clone(),
            specifications: memory.clone(),
            pictures: memory.clone(),
            reviews: memory.clone(),
            forums: memory.clone(),
            registration: Arc::new(DefaultCustomerRegistrationService::new(customers.clone(), hasher)),
            authentication: Arc::new(SessionAuthenticationService::new(cache.clone(), customers.clone())),
            products,
            customers,
            cart,
            prices,
            tax,
            currency,
            totals,
            shipping,
            payments,
            orders,
            order_processing,
            discounts,
            gift_cards,
            messages,
            memory,
            cache,
        }
    }
}
