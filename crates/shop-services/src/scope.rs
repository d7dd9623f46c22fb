//! The store, customer and settings a service call runs for.

use shop_domain::customer::{Customer, CustomerAttribute};
use shop_domain::settings::{StoreSettings, TaxDisplayType};
use shop_domain::store::Store;
use shop_domain::Currency;

/// Borrowed request scope passed to services whose results depend on who is
/// shopping where.
#[derive(Clone, Copy)]
pub struct StoreScope<'a> {
    pub store: &'a Store,
    pub customer: &'a Customer,
    pub settings: &'a StoreSettings,
}

impl<'a> StoreScope<'a> {
    pub fn new(store: &'a Store, customer: &'a Customer, settings: &'a StoreSettings) -> Self {
        Self {
            store,
            customer,
            settings,
        }
    }

    /// Currency catalog amounts are stored in.
    pub fn primary_currency(&self) -> Currency {
        self.store.primary_currency
    }

    /// Tax display the customer picked, when customers may pick one.
    pub fn tax_display_type(&self) -> TaxDisplayType {
        let tax = &self.settings.tax;
        if !tax.allow_customers_to_select_tax_display_type {
            return tax.tax_display_type;
        }
        match self
            .customer
            .attribute(self.store.id, CustomerAttribute::TaxDisplayType)
        {
            Some("IncludingTax") => TaxDisplayType::IncludingTax,
            Some("ExcludingTax") => TaxDisplayType::ExcludingTax,
            _ => tax.tax_display_type,
        }
    }

    /// Currency the customer shops in, falling back to the primary one.
    pub fn customer_currency(&self) -> Currency {
        self.customer
            .attribute(self.store.id, CustomerAttribute::CurrencyCode)
            .and_then(Currency::from_code)
            .unwrap_or(self.store.primary_currency)
    }

    /// The same scope for a different customer.
    pub fn for_customer(&self, customer: &'a Customer) -> Self {
        Self { customer, ..*self }
    }
}
