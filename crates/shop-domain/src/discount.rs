//! Discounts and gift cards.

use crate::error::DomainError;
use crate::ids::{CustomerId, DiscountId, GiftCardId, OrderId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// What a discount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscountType {
    /// Applies to the order total.
    AssignedToOrderTotal,
    /// Applies to the unit price of specific products.
    AssignedToSkus,
    /// Applies to the cart subtotal.
    AssignedToOrderSubTotal,
    /// Applies to the shipping charge.
    AssignedToShipping,
}

/// How often a discount may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DiscountLimitation {
    #[default]
    Unlimited,
    NTimesOnly(u32),
    NTimesPerCustomer(u32),
}

/// Extra conditions a customer must meet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DiscountRequirement {
    /// Cart subtotal must reach this amount.
    MinimumSubtotal(Money),
    /// Customer must be in the role with this system name.
    CustomerRole(String),
    /// One of these products must be in the cart.
    HasOneOfProducts(Vec<ProductId>),
}

/// A store discount, optionally gated by a coupon code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub discount_type: DiscountType,
    pub use_percentage: bool,
    pub percentage: f64,
    pub amount: Money,
    /// Cap for percentage discounts.
    pub maximum_amount: Option<Money>,
    pub requires_coupon_code: bool,
    pub coupon_code: Option<String>,
    /// Unix timestamps.
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub limitation: DiscountLimitation,
    pub requirements: Vec<DiscountRequirement>,
    /// Products the discount is assigned to (AssignedToSkus).
    pub applied_to_products: Vec<ProductId>,
}

impl Discount {
    /// Percentage discount of the given type.
    pub fn percentage(
        id: DiscountId,
        name: impl Into<String>,
        discount_type: DiscountType,
        percent: f64,
        currency: crate::Currency,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            discount_type,
            use_percentage: true,
            percentage: percent,
            amount: Money::zero(currency),
            maximum_amount: None,
            requires_coupon_code: false,
            coupon_code: None,
            starts_at: None,
            ends_at: None,
            limitation: DiscountLimitation::Unlimited,
            requirements: Vec::new(),
            applied_to_products: Vec::new(),
        }
    }

    /// Fixed amount discount of the given type.
    pub fn fixed(
        id: DiscountId,
        name: impl Into<String>,
        discount_type: DiscountType,
        amount: Money,
    ) -> Self {
        Self {
            use_percentage: false,
            percentage: 0.0,
            amount,
            ..Self::percentage(id, name, discount_type, 0.0, amount.currency)
        }
    }

    pub fn with_coupon(mut self, code: impl Into<String>) -> Self {
        self.requires_coupon_code = true;
        self.coupon_code = Some(code.into());
        self
    }

    pub fn with_requirement(mut self, requirement: DiscountRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Discount amount for `base`, never more than `base`. Fixed amounts
    /// and caps must be in the currency of `base`.
    pub fn amount_for(&self, base: &Money) -> Result<Money, DomainError> {
        let raw = if self.use_percentage {
            let pct = base.percentage(self.percentage);
            match &self.maximum_amount {
                Some(max) => pct.try_min(max)?,
                None => pct,
            }
        } else {
            self.amount
        };
        Ok(raw.try_min(base)?.non_negative())
    }

    /// Whether the discount is inside its validity window at `now`.
    pub fn is_active_at(&self, now: i64) -> bool {
        self.starts_at.map_or(true, |s| now >= s) && self.ends_at.map_or(true, |e| now <= e)
    }

    /// Case-insensitive coupon match.
    pub fn matches_coupon(&self, code: &str) -> bool {
        self.coupon_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(code.trim()))
    }
}

/// Record of a discount being used by an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountUsage {
    pub discount_id: DiscountId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
}

/// A prepaid gift card redeemable by coupon code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCard {
    pub id: GiftCardId,
    pub coupon_code: String,
    pub amount: Money,
    pub is_activated: bool,
    /// Amounts already redeemed by orders.
    pub usage: Vec<(OrderId, Money)>,
}

impl GiftCard {
    /// Amount still available.
    pub fn remaining(&self) -> Money {
        let used: i64 = self.usage.iter().map(|(_, m)| m.amount_cents).sum();
        Money::new(self.amount.amount_cents - used, self.amount.currency).non_negative()
    }

    pub fn is_valid(&self) -> bool {
        self.is_activated && self.remaining().is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Currency;

    #[test]
    fn test_percentage_discount_capped() {
        let mut d = Discount::percentage(
            DiscountId::new(1),
            "10% off",
            DiscountType::AssignedToOrderSubTotal,
            10.0,
            Currency::USD,
        );
        let base = Money::new(50_000, Currency::USD);
        assert_eq!(d.amount_for(&base).unwrap().amount_cents, 5_000);

        d.maximum_amount = Some(Money::new(1_000, Currency::USD));
        assert_eq!(d.amount_for(&base).unwrap().amount_cents, 1_000);

        d.maximum_amount = Some(Money::new(1_000, Currency::EUR));
        assert!(matches!(d.amount_for(&base), Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_base() {
        let d = Discount::fixed(
            DiscountId::new(1),
            "$20 off",
            DiscountType::AssignedToOrderTotal,
            Money::new(2_000, Currency::USD),
        );
        assert_eq!(d.amount_for(&Money::new(1_500, Currency::USD)).unwrap().amount_cents, 1_500);
    }

    #[test]
    fn test_validity_window_and_coupon() {
        let mut d = Discount::percentage(
            DiscountId::new(1),
            "Spring",
            DiscountType::AssignedToOrderTotal,
            5.0,
            Currency::USD,
        )
        .with_coupon("SPRING");
        d.starts_at = Some(100);
        d.ends_at = Some(200);
        assert!(!d.is_active_at(99));
        assert!(d.is_active_at(150));
        assert!(!d.is_active_at(201));
        assert!(d.matches_coupon(" spring"));
        assert!(!d.matches_coupon("summer"));
    }

    #[test]
    fn test_gift_card_remaining() {
        let card = GiftCard {
            id: GiftCardId::new(1),
            coupon_code: "GC-1".into(),
            amount: Money::new(5_000, Currency::USD),
            is_activated: true,
            usage: vec![(OrderId::new(1), Money::new(5_000, Currency::USD))],
        };
        assert!(card.remaining().is_zero());
        assert!(!card.is_valid());
    }
}
