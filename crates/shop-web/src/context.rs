//! Per-request context: store, customer, settings and currency.

use std::sync::Arc;

use rand::Rng;
use shop_cache::SessionId;
use shop_domain::customer::{Customer, CustomerAttribute};
use shop_domain::settings::{StoreSettings, TaxDisplayType};
use shop_domain::store::Store;
use shop_domain::{Currency, Money, StoreId};
use shop_services::customers::CustomerService;
use shop_services::pricing::PriceFormatter;
use shop_services::{ServiceError, ServiceRegistry, StoreScope};

use crate::config::ShopConfig;
use crate::error::WebError;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(format!("req-{:08x}{:08x}", rng.gen::<u32>(), rng.gen::<u32>()))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storefront permissions granted per customer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    DisplayPrices,
    EnableShoppingCart,
    EnableWishlist,
    ManageForums,
}

/// Everything an action needs to know about who is asking and where.
#[derive(Debug, Clone)]
pub struct WorkContext {
    pub request_id: RequestId,
    pub store: Store,
    pub customer: Customer,
    pub settings: StoreSettings,
    pub session_id: SessionId,
    /// Currency prices are shown in.
    pub working_currency: Currency,
    /// Rate from the store's primary currency to `working_currency`.
    pub currency_rate: f64,
    pub tax_display_type: TaxDisplayType,
}

impl WorkContext {
    /// Build a context without going through a [`ContextFactory`], with the
    /// store's primary currency as working currency.
    pub fn new(store: Store, customer: Customer, settings: StoreSettings, session_id: SessionId) -> Self {
        let tax_display_type = StoreScope::new(&store, &customer, &settings).tax_display_type();
        Self {
            request_id: RequestId::generate(),
            working_currency: store.primary_currency,
            currency_rate: 1.0,
            tax_display_type,
            store,
            customer,
            settings,
            session_id,
        }
    }

    pub fn scope(&self) -> StoreScope<'_> {
        StoreScope::new(&self.store, &self.customer, &self.settings)
    }

    pub fn is_guest(&self) -> bool {
        self.customer.is_guest()
    }

    pub fn is_registered(&self) -> bool {
        self.customer.is_registered()
    }

    pub fn is_forum_moderator(&self) -> bool {
        self.customer.is_forum_moderator()
    }

    /// Whether any of the customer's roles is granted `permission`.
    pub fn authorize(&self, permission: Permission) -> bool {
        let permissions = &self.settings.permissions;
        let granted = match permission {
            Permission::DisplayPrices => &permissions.display_prices,
            Permission::EnableShoppingCart => &permissions.enable_shopping_cart,
            Permission::EnableWishlist => &permissions.enable_wishlist,
            Permission::ManageForums => &permissions.manage_forums,
        };
        self.customer
            .roles
            .iter()
            .any(|role| granted.iter().any(|name| name == role.system_name()))
    }

    pub fn attribute(&self, key: CustomerAttribute) -> Option<&str> {
        self.customer.attribute(self.store.id, key)
    }

    /// Persist a customer attribute and mirror it on the context's copy.
    pub fn save_attribute(
        &mut self,
        customers: &dyn CustomerService,
        key: CustomerAttribute,
        value: Option<String>,
    ) -> Result<(), ServiceError> {
        customers.save_attribute(self.customer.id, self.store.id, key, value.clone())?;
        self.customer.set_attribute(self.store.id, key, value);
        Ok(())
    }

    /// Reload the customer after a service changed the stored record.
    pub fn reload_customer(&mut self, customers: &dyn CustomerService) -> Result<(), ServiceError> {
        let customer = customers
            .get_customer_by_id(self.customer.id)?
            .ok_or_else(|| ServiceError::not_found("Customer", self.customer.id))?;
        self.switch_customer(customer);
        Ok(())
    }

    /// Act as another customer from now on, e.g. after signing in.
    pub fn switch_customer(&mut self, customer: Customer) {
        self.customer = customer;
        self.tax_display_type = self.scope().tax_display_type();
    }

    /// Convert an amount in the primary currency to the working currency.
    pub fn to_working(&self, amount: &Money) -> Money {
        if amount.currency == self.working_currency {
            *amount
        } else {
            amount.convert(self.currency_rate, self.working_currency)
        }
    }

    pub fn formatter(&self) -> PriceFormatter {
        PriceFormatter::new(&self.settings.tax, self.tax_display_type)
    }

    /// Format a primary-currency amount in the working currency.
    pub fn format_price(&self, amount: &Money) -> String {
        self.formatter().format_price(&self.to_working(amount))
    }

    /// Same as [`format_price`](Self::format_price) without the tax suffix.
    pub fn format_plain(&self, amount: &Money) -> String {
        self.to_working(amount).display()
    }

    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            store_id = %self.store.id,
            customer_id = %self.customer.id,
        )
    }
}

/// Resolves the [`WorkContext`] of incoming requests.
#[derive(Clone)]
pub struct ContextFactory {
    pub services: ServiceRegistry,
    pub config: Arc<ShopConfig>,
}

impl ContextFactory {
    pub fn new(services: ServiceRegistry, config: ShopConfig) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }

    /// The signed-in customer of the session, else the session's guest, else
    /// a newly created guest remembered for the session.
    pub fn current_customer(&self, session_id: &SessionId) -> Result<Customer, WebError> {
        let auth = &self.services.authentication;
        if let Some(customer) = auth.get_authenticated_customer(session_id)? {
            return Ok(customer);
        }
        if let Some(guest) = auth.get_guest_customer(session_id)? {
            if !guest.deleted && guest.is_guest() {
                return Ok(guest);
            }
        }
        let guest = self.services.customers.insert_guest_customer()?;
        auth.set_guest_customer(session_id, guest.id)?;
        tracing::debug!(customer_id = %guest.id, "guest customer created");
        Ok(guest)
    }

    pub fn resolve(&self, store_id: StoreId, session_id: &SessionId) -> Result<WorkContext, WebError> {
        let store = self
            .services
            .stores
            .get_store_by_id(store_id)?
            .ok_or(WebError::StoreNotFound(store_id))?;
        let settings = self.config.settings_for(store_id)?;
        let customer = self.current_customer(session_id)?;

        let mut ctx = WorkContext::new(store, customer, settings, session_id.clone());
        let preferred = ctx.scope().customer_currency();
        if preferred != ctx.store.primary_currency {
            match self.services.currency.get_rate(preferred)? {
                Some(rate) if rate > 0.0 => {
                    ctx.working_currency = preferred;
                    ctx.currency_rate = rate;
                }
                _ => tracing::warn!(currency = preferred.code(), "no exchange rate, using primary currency"),
            }
        }
        Ok(ctx)
    }
}
