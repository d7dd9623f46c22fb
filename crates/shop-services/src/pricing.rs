//! Price calculation, tax, currency conversion and price formatting.

use std::sync::Arc;

use shop_domain::cart::SelectedAttributes;
use shop_domain::catalog::Product;
use shop_domain::customer::Customer;
use shop_domain::discount::DiscountType;
use shop_domain::prelude::*;
use shop_domain::settings::{TaxDisplayType, TaxSettings};

use crate::cart::CartLine;
use crate::discounts::{preferred_discount, DiscountCheck, DiscountService};
use crate::memory::MemoryStore;
use crate::scope::StoreScope;
use crate::ServiceError;

/// A unit price after discounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalPrice {
    pub price: Money,
    /// Discount already taken off `price`, per unit.
    pub discount_amount: Money,
    pub applied_discount: Option<DiscountId>,
}

pub trait PriceCalculationService: Send + Sync {
    /// Unit price for buying `quantity` with the given selection.
    fn final_price(
        &self,
        scope: &StoreScope<'_>,
        product: &Product,
        attributes: &SelectedAttributes,
        customer_entered_price: Option<Money>,
        quantity: i64,
        include_discounts: bool,
    ) -> Result<FinalPrice, ServiceError>;

    fn unit_price(&self, scope: &StoreScope<'_>, line: &CartLine, include_discounts: bool) -> Result<FinalPrice, ServiceError> {
        self.final_price(
            scope,
            &line.product,
            &line.item.attributes,
            line.item.customer_entered_price,
            line.item.quantity,
            include_discounts,
        )
    }

    /// Unit price times quantity, plus the total discount of the line.
    fn sub_total(&self, scope: &StoreScope<'_>, line: &CartLine, include_discounts: bool) -> Result<(Money, Money), ServiceError> {
        let unit = self.unit_price(scope, line, include_discounts)?;
        Ok((
            unit.price.try_multiply(line.item.quantity)?,
            unit.discount_amount.try_multiply(line.item.quantity)?,
        ))
    }
}

/// Sum of the price adjustments of the selected attribute values.
pub fn attribute_price_adjustment(product: &Product, selected: &SelectedAttributes) -> Result<Money, ServiceError> {
    let mut total = Money::zero(product.price.currency);
    for (mapping_id, value_id) in selected.selected_values() {
        if let Some(value) = product.attribute(mapping_id).and_then(|m| m.value(value_id)) {
            total = total.try_add(&value.price_adjustment)?;
        }
    }
    Ok(total)
}

/// The tier price for `quantity`, if any tier is reached.
pub fn tier_price_for(product: &Product, customer: &Customer, store_id: StoreId, quantity: i64) -> Option<Money> {
    product
        .tier_prices
        .iter()
        .filter(|t| t.store_id.map_or(true, |s| s == store_id))
        .filter(|t| {
            t.customer_role.as_deref().map_or(true, |role| {
                customer.roles.iter().any(|r| r.system_name().eq_ignore_ascii_case(role))
            })
        })
        .filter(|t| t.quantity <= quantity)
        .max_by_key(|t| t.quantity)
        .map(|t| t.price)
}

pub struct DefaultPriceCalculationService {
    discounts: Arc<dyn DiscountService>,
}

impl DefaultPriceCalculationService {
    pub fn new(discounts: Arc<dyn DiscountService>) -> Self {
        Self { discounts }
    }
}

impl PriceCalculationService for DefaultPriceCalculationService {
    fn final_price(
        &self,
        scope: &StoreScope<'_>,
        product: &Product,
        attributes: &SelectedAttributes,
        customer_entered_price: Option<Money>,
        quantity: i64,
        include_discounts: bool,
    ) -> Result<FinalPrice, ServiceError> {
        let currency = product.price.currency;
        if product.customer_enters_price {
            let price = customer_entered_price.unwrap_or(product.minimum_customer_entered_price);
            return Ok(FinalPrice {
                price: price.try_add(&attribute_price_adjustment(product, attributes)?)?,
                discount_amount: Money::zero(currency),
                applied_discount: None,
            });
        }

        let base = tier_price_for(product, scope.customer, scope.store.id, quantity.max(1)).unwrap_or(product.price);
        let price = base.try_add(&attribute_price_adjustment(product, attributes)?)?;

        if !include_discounts || scope.settings.catalog.ignore_discounts || product.applied_discounts.is_empty() {
            return Ok(FinalPrice {
                price,
                discount_amount: Money::zero(currency),
                applied_discount: None,
            });
        }

        let check = DiscountCheck {
            customer: scope.customer,
            store_id: scope.store.id,
            cart: &[],
            subtotal: None,
        };
        let candidates: Vec<_> = self
            .discounts
            .get_applicable_discounts(DiscountType::AssignedToSkus, &check)?
            .into_iter()
            .filter(|d| product.applied_discounts.contains(&d.id) || d.applied_to_products.contains(&product.id))
            .collect();

        Ok(match preferred_discount(&candidates, &price)? {
            Some((discount, amount)) => FinalPrice {
                price: price.try_subtract(&amount)?,
                discount_amount: amount,
                applied_discount: Some(discount.id),
            },
            None => FinalPrice {
                price,
                discount_amount: Money::zero(currency),
                applied_discount: None,
            },
        })
    }
}

/// A price with and without tax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxedPrice {
    pub incl_tax: Money,
    pub excl_tax: Money,
    pub rate_percent: f64,
}

impl TaxedPrice {
    pub fn for_display(&self, display: TaxDisplayType) -> Money {
        match display {
            TaxDisplayType::IncludingTax => self.incl_tax,
            TaxDisplayType::ExcludingTax => self.excl_tax,
        }
    }

    pub fn tax(&self) -> Money {
        Money::new(self.incl_tax.amount_cents - self.excl_tax.amount_cents, self.incl_tax.currency)
    }
}

pub trait TaxService: Send + Sync {
    /// Rate applying to a product; 0 for tax-exempt products.
    fn tax_rate(&self, settings: &TaxSettings, product: &Product) -> f64 {
        if product.is_tax_exempt {
            0.0
        } else {
            settings.rate_for(product.tax_category_id)
        }
    }

    /// Split a catalog price into its incl/excl tax amounts.
    fn product_price(&self, settings: &TaxSettings, product: &Product, price: Money) -> TaxedPrice {
        split_price(price, self.tax_rate(settings, product), settings.prices_include_tax)
    }

    fn shipping_price(&self, settings: &TaxSettings, price: Money) -> TaxedPrice {
        let rate = if settings.shipping_is_taxable {
            settings.rate_for(settings.shipping_tax_category_id)
        } else {
            0.0
        };
        split_price(price, rate, settings.prices_include_tax)
    }

    fn payment_fee(&self, settings: &TaxSettings, fee: Money) -> TaxedPrice {
        let rate = if settings.payment_method_additional_fee_is_taxable {
            settings.default_rate_percent
        } else {
            0.0
        };
        split_price(fee, rate, settings.prices_include_tax)
    }
}

/// `price` is gross when `includes_tax`, net otherwise.
pub fn split_price(price: Money, rate_percent: f64, includes_tax: bool) -> TaxedPrice {
    if rate_percent <= 0.0 {
        return TaxedPrice {
            incl_tax: price,
            excl_tax: price,
            rate_percent: 0.0,
        };
    }
    let factor = 1.0 + rate_percent / 100.0;
    if includes_tax {
        TaxedPrice {
            incl_tax: price,
            excl_tax: price.multiply_decimal(1.0 / factor),
            rate_percent,
        }
    } else {
        TaxedPrice {
            incl_tax: price.multiply_decimal(factor),
            excl_tax: price,
            rate_percent,
        }
    }
}

/// Rates come from settings, so the reference service holds no state.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTaxService;

impl TaxService for DefaultTaxService {}

pub trait CurrencyService: Send + Sync {
    /// Currencies with a configured exchange rate.
    fn get_all_currencies(&self) -> Result<Vec<(Currency, f64)>, ServiceError>;

    fn get_rate(&self, currency: Currency) -> Result<Option<f64>, ServiceError> {
        Ok(self
            .get_all_currencies()?
            .into_iter()
            .find(|(c, _)| *c == currency)
            .map(|(_, rate)| rate))
    }

    /// Convert an amount from the primary currency into `to`.
    fn convert_from_primary(&self, amount: &Money, to: Currency) -> Result<Money, ServiceError> {
        if amount.currency == to {
            return Ok(*amount);
        }
        let rate = self.get_rate(to)?.ok_or_else(|| ServiceError::not_found("Currency", to.code()))?;
        Ok(amount.convert(rate, to))
    }

    /// Convert an amount in `from` back into the primary currency.
    fn convert_to_primary(&self, amount: &Money, primary: Currency) -> Result<Money, ServiceError> {
        if amount.currency == primary {
            return Ok(*amount);
        }
        let rate = self
            .get_rate(amount.currency)?
            .filter(|r| *r > 0.0)
            .ok_or_else(|| ServiceError::not_found("Currency", amount.currency.code()))?;
        Ok(amount.convert(1.0 / rate, primary))
    }
}

impl CurrencyService for MemoryStore {
    fn get_all_currencies(&self) -> Result<Vec<(Currency, f64)>, ServiceError> {
        Ok(self.read()?.currency_rates.clone())
    }
}

/// Formats amounts for display.
#[derive(Debug, Clone, Copy)]
pub struct PriceFormatter {
    pub show_tax_suffix: bool,
    pub tax_display_type: TaxDisplayType,
}

impl PriceFormatter {
    pub fn new(settings: &TaxSettings, tax_display_type: TaxDisplayType) -> Self {
        Self {
            show_tax_suffix: settings.display_tax_suffix,
            tax_display_type,
        }
    }

    pub fn format_price(&self, amount: &Money) -> String {
        self.format_with(amount, self.show_tax_suffix, self.tax_display_type)
    }

    /// Format with an explicit suffix choice and display type.
    pub fn format_with(&self, amount: &Money, show_tax_suffix: bool, display: TaxDisplayType) -> String {
        if !show_tax_suffix {
            return amount.display();
        }
        match display {
            TaxDisplayType::IncludingTax => format!("{} incl tax", amount.display()),
            TaxDisplayType::ExcludingTax => format!("{} excl tax", amount.display()),
        }
    }

    /// `8.25` rather than `8.2500`.
    pub fn format_tax_rate(rate: f64) -> String {
        let text = format!("{:.4}", rate);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain::discount::Discount;
    use shop_domain::settings::StoreSettings;
    use shop_domain::store::Store;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[test]
    fn test_tier_price_and_sku_discount() {
        let memory = Arc::new(MemoryStore::new());
        let discount_id = memory
            .add_discount(Discount::percentage(
                DiscountId::default(),
                "10% off",
                DiscountType::AssignedToSkus,
                10.0,
                Currency::USD,
            ))
            .unwrap();
        let mut product = Product::new(ProductId::new(1), "Pen", usd(1000)).with_tier_price(5, usd(800));
        product.applied_discounts = vec![discount_id];

        let service = DefaultPriceCalculationService::new(memory);
        let store = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let customer = Customer::guest(CustomerId::new(1));
        let settings = StoreSettings::default();
        let scope = StoreScope::new(&store, &customer, &settings);
        let none = SelectedAttributes::new();

        let one = service.final_price(&scope, &product, &none, None, 1, true).unwrap();
        assert_eq!(one.price, usd(900));
        assert_eq!(one.applied_discount, Some(discount_id));

        let five = service.final_price(&scope, &product, &none, None, 5, true).unwrap();
        assert_eq!(five.price, usd(720));

        let undiscounted = service.final_price(&scope, &product, &none, None, 5, false).unwrap();
        assert_eq!(undiscounted.price, usd(800));
    }

    #[test]
    fn test_split_price() {
        let net = split_price(usd(1000), 20.0, false);
        assert_eq!(net.incl_tax, usd(1200));
        assert_eq!(net.tax(), usd(200));

        let gross = split_price(usd(1200), 20.0, true);
        assert_eq!(gross.excl_tax, usd(1000));
    }

    #[test]
    fn test_currency_conversion() {
        let memory = MemoryStore::new();
        memory.set_currency_rate(Currency::EUR, 0.5).unwrap();
        let eur = memory.convert_from_primary(&usd(1000), Currency::EUR).unwrap();
        assert_eq!(eur, Money::new(500, Currency::EUR));
        assert_eq!(memory.convert_to_primary(&eur, Currency::USD).unwrap(), usd(1000));
        assert!(memory.convert_from_primary(&usd(1), Currency::JPY).is_err());
    }

    #[test]
    fn test_formatter() {
        let settings = TaxSettings {
            display_tax_suffix: true,
            ..Default::default()
        };
        let formatter = PriceFormatter::new(&settings, TaxDisplayType::IncludingTax);
        assert_eq!(formatter.format_price(&usd(1250)), "$12.50 incl tax");
        assert_eq!(PriceFormatter::format_tax_rate(8.25), "8.25");
        assert_eq!(PriceFormatter::format_tax_rate(20.0), "20");
    }
}
