//! Shipping requirement checks and rate quotes.

use shop_domain::checkout::{Address, ShippingOption};
use shop_domain::prelude::*;
use shop_domain::settings::ShippingSettings;

use crate::cart::CartLine;
use crate::ServiceError;

/// System name of the built-in flat rate provider.
pub const FIXED_RATE_PROVIDER: &str = "Shipping.FixedRate";

/// Rates offered for a destination, or why there are none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingOptionsResponse {
    pub options: Vec<ShippingOption>,
    pub errors: Vec<String>,
}

impl ShippingOptionsResponse {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub trait ShippingService: Send + Sync {
    /// Whether any line needs to be shipped.
    fn requires_shipping(&self, cart: &[CartLine]) -> bool {
        cart.iter().any(|l| l.product.is_shipping_enabled)
    }

    /// Total weight of shippable lines including attribute adjustments.
    fn cart_weight(&self, cart: &[CartLine]) -> f64 {
        cart.iter()
            .filter(|l| l.product.is_shipping_enabled)
            .map(|l| {
                let adjustment: f64 = l
                    .item
                    .attributes
                    .selected_values()
                    .filter_map(|(m, v)| l.product.attribute(m).and_then(|m| m.value(v)))
                    .map(|v| v.weight_adjustment)
                    .sum();
                (l.product.weight + adjustment) * l.item.quantity as f64
            })
            .sum()
    }

    /// Quote every configured method for `address`. Only the country is
    /// required so carts can be estimated before checkout.
    fn get_shipping_options(
        &self,
        settings: &ShippingSettings,
        currency: Currency,
        cart: &[CartLine],
        address: Option<&Address>,
    ) -> Result<ShippingOptionsResponse, ServiceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FixedRateShippingService;

impl ShippingService for FixedRateShippingService {
    fn get_shipping_options(
        &self,
        settings: &ShippingSettings,
        currency: Currency,
        cart: &[CartLine],
        address: Option<&Address>,
    ) -> Result<ShippingOptionsResponse, ServiceError> {
        let mut response = ShippingOptionsResponse::default();
        if !self.requires_shipping(cart) {
            response.errors.push("Shipping is not required".to_string());
            return Ok(response);
        }
        let Some(address) = address.filter(|a| !a.country_code.trim().is_empty()) else {
            response.errors.push("Shipping address is not set".to_string());
            return Ok(response);
        };
        if settings.methods.is_empty() {
            response.errors.push("No shipping methods are configured".to_string());
            return Ok(response);
        }

        let weight_units = self.cart_weight(cart).ceil() as i64;
        for method in &settings.methods {
            let surcharge = method.per_weight_unit_cents.saturating_mul(weight_units);
            response.options.push(ShippingOption {
                name: method.name.clone(),
                description: method.description.clone(),
                rate: Money::new(method.rate_cents.saturating_add(surcharge), currency),
                provider_system_name: FIXED_RATE_PROVIDER.to_string(),
            });
        }
        tracing::debug!(
            country = %address.country_code,
            options = response.options.len(),
            "shipping options quoted"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain::cart::{SelectedAttributes, ShoppingCartItem, ShoppingCartType};
    use shop_domain::catalog::Product;
    use shop_domain::settings::ShippingMethodSettings;

    fn line(weight: f64, quantity: i64, shippable: bool) -> CartLine {
        let mut product = Product::new(ProductId::new(1), "Box", Money::new(100, Currency::USD));
        product.weight = weight;
        product.is_shipping_enabled = shippable;
        CartLine {
            item: ShoppingCartItem {
                id: CartItemId::new(1),
                store_id: StoreId::new(1),
                customer_id: CustomerId::new(1),
                cart_type: ShoppingCartType::ShoppingCart,
                product_id: product.id,
                attributes: SelectedAttributes::new(),
                customer_entered_price: None,
                quantity,
                created_at: 0,
                updated_at: 0,
            },
            product,
        }
    }

    fn address() -> Address {
        Address {
            country_code: "US".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_weight_surcharge() {
        let settings = ShippingSettings {
            methods: vec![ShippingMethodSettings {
                name: "Ground".into(),
                description: None,
                rate_cents: 500,
                per_weight_unit_cents: 100,
            }],
            ..Default::default()
        };
        let cart = vec![line(1.5, 2, true), line(10.0, 1, false)];
        let response = FixedRateShippingService
            .get_shipping_options(&settings, Currency::USD, &cart, Some(&address()))
            .unwrap();
        assert!(response.success());
        assert_eq!(response.options[0].rate, Money::new(800, Currency::USD));
    }

    #[test]
    fn test_missing_country() {
        let cart = vec![line(1.0, 1, true)];
        let response = FixedRateShippingService
            .get_shipping_options(&ShippingSettings::default(), Currency::USD, &cart, Some(&Address::default()))
            .unwrap();
        assert_eq!(response.errors, vec!["Shipping address is not set".to_string()]);
    }

    #[test]
    fn test_requires_shipping() {
        let service = FixedRateShippingService;
        assert!(!service.requires_shipping(&[line(1.0, 1, false)]));
        assert!(service.requires_shipping(&[line(1.0, 1, false), line(1.0, 1, true)]));
    }
}
