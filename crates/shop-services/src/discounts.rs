//! Discount validation and gift cards.

use shop_domain::cart::ShoppingCartItem;
use shop_domain::customer::{Customer, CustomerAttribute};
use shop_domain::discount::{Discount, DiscountLimitation, DiscountRequirement, DiscountType, DiscountUsage, GiftCard};
use shop_domain::prelude::*;

use crate::memory::MemoryStore;
use crate::ServiceError;

/// What a discount is checked against.
#[derive(Debug, Clone, Copy)]
pub struct DiscountCheck<'a> {
    pub customer: &'a Customer,
    pub store_id: StoreId,
    /// Cart lines, for product requirements.
    pub cart: &'a [ShoppingCartItem],
    /// Cart subtotal, for minimum subtotal requirements.
    pub subtotal: Option<&'a Money>,
}

pub trait DiscountService: Send + Sync {
    fn get_discount_by_id(&self, id: DiscountId) -> Result<Option<Discount>, ServiceError>;

    fn get_all_discounts(&self, discount_type: Option<DiscountType>) -> Result<Vec<Discount>, ServiceError>;

    fn get_discount_by_coupon_code(&self, code: &str) -> Result<Option<Discount>, ServiceError>;

    fn insert_discount_usage(&self, usage: DiscountUsage) -> Result<(), ServiceError>;

    /// Times the discount was used, optionally by one customer.
    fn get_discount_usage_count(
        &self,
        discount_id: DiscountId,
        customer_id: Option<CustomerId>,
    ) -> Result<usize, ServiceError>;

    /// Whether the discount applies right now for this customer and cart.
    fn is_discount_valid(&self, discount: &Discount, check: &DiscountCheck<'_>) -> Result<bool, ServiceError> {
        if !discount.is_active_at(current_timestamp()) {
            return Ok(false);
        }
        if discount.requires_coupon_code {
            let entered = check
                .customer
                .attribute(check.store_id, CustomerAttribute::DiscountCouponCode)
                .unwrap_or_default();
            if entered.is_empty() || !discount.matches_coupon(entered) {
                return Ok(false);
            }
        }
        match discount.limitation {
            DiscountLimitation::Unlimited => {}
            DiscountLimitation::NTimesOnly(n) => {
                if self.get_discount_usage_count(discount.id, None)? >= n as usize {
                    return Ok(false);
                }
            }
            DiscountLimitation::NTimesPerCustomer(n) => {
                if check.customer.is_guest()
                    || self.get_discount_usage_count(discount.id, Some(check.customer.id))? >= n as usize
                {
                    return Ok(false);
                }
            }
        }
        for requirement in &discount.requirements {
            let met = match requirement {
                DiscountRequirement::MinimumSubtotal(min) => check
                    .subtotal
                    .is_some_and(|subtotal| subtotal.amount_cents >= min.amount_cents),
                DiscountRequirement::CustomerRole(role) => check
                    .customer
                    .roles
                    .iter()
                    .any(|r| r.system_name().eq_ignore_ascii_case(role)),
                DiscountRequirement::HasOneOfProducts(ids) => {
                    check.cart.iter().any(|item| ids.contains(&item.product_id))
                }
            };
            if !met {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Valid discounts of a type, for choosing the best one.
    fn get_applicable_discounts(
        &self,
        discount_type: DiscountType,
        check: &DiscountCheck<'_>,
    ) -> Result<Vec<Discount>, ServiceError> {
        let mut applicable = Vec::new();
        for discount in self.get_all_discounts(Some(discount_type))? {
            if self.is_discount_valid(&discount, check)? {
                applicable.push(discount);
            }
        }
        Ok(applicable)
    }
}

/// The discount giving the largest amount off `base`; the later one wins a tie.
pub fn preferred_discount<'a>(
    discounts: impl IntoIterator<Item = &'a Discount>,
    base: &Money,
) -> Result<Option<(&'a Discount, Money)>, DomainError> {
    let mut best: Option<(&'a Discount, Money)> = None;
    for discount in discounts {
        let amount = discount.amount_for(base)?;
        if !amount.is_positive() {
            continue;
        }
        if best.as_ref().map_or(true, |(_, b)| amount.amount_cents >= b.amount_cents) {
            best = Some((discount, amount));
        }
    }
    Ok(best)
}

pub trait GiftCardService: Send + Sync {
    fn get_gift_card_by_id(&self, id: GiftCardId) -> Result<Option<GiftCard>, ServiceError>;

    fn get_gift_card_by_coupon_code(&self, code: &str) -> Result<Option<GiftCard>, ServiceError>;

    fn add_gift_card_usage(&self, id: GiftCardId, order_id: OrderId, amount: Money) -> Result<(), ServiceError>;

    /// Valid gift cards whose codes the customer entered, in entry order.
    fn get_active_gift_cards_applied(&self, customer: &Customer, store_id: StoreId) -> Result<Vec<GiftCard>, ServiceError> {
        let mut cards = Vec::new();
        for code in applied_gift_card_codes(customer, store_id) {
            if let Some(card) = self.get_gift_card_by_coupon_code(&code)? {
                if card.is_valid() && !cards.iter().any(|c: &GiftCard| c.id == card.id) {
                    cards.push(card);
                }
            }
        }
        Ok(cards)
    }
}

/// Gift card codes stored on the customer, comma separated.
pub fn applied_gift_card_codes(customer: &Customer, store_id: StoreId) -> Vec<String> {
    customer
        .attribute(store_id, CustomerAttribute::GiftCardCouponCodes)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Store the list back onto the customer.
pub fn set_applied_gift_card_codes(customer: &mut Customer, store_id: StoreId, codes: &[String]) {
    let value = (!codes.is_empty()).then(|| codes.join(","));
    customer.set_attribute(store_id, CustomerAttribute::GiftCardCouponCodes, value);
}

impl DiscountService for MemoryStore {
    fn get_discount_by_id(&self, id: DiscountId) -> Result<Option<Discount>, ServiceError> {
        Ok(self.read()?.discounts.get(&id).cloned())
    }

    fn get_all_discounts(&self, discount_type: Option<DiscountType>) -> Result<Vec<Discount>, ServiceError> {
        Ok(self
            .read()?
            .discounts
            .values()
            .filter(|d| discount_type.map_or(true, |t| d.discount_type == t))
            .cloned()
            .collect())
    }

    fn get_discount_by_coupon_code(&self, code: &str) -> Result<Option<Discount>, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self
            .read()?
            .discounts
            .values()
            .find(|d| d.matches_coupon(code))
            .cloned())
    }

    fn insert_discount_usage(&self, usage: DiscountUsage) -> Result<(), ServiceError> {
        self.write()?.discount_usage.push(usage);
        Ok(())
    }

    fn get_discount_usage_count(
        &self,
        discount_id: DiscountId,
        customer_id: Option<CustomerId>,
    ) -> Result<usize, ServiceError> {
        Ok(self
            .read()?
            .discount_usage
            .iter()
            .filter(|u| u.discount_id == discount_id)
            .filter(|u| customer_id.map_or(true, |c| u.customer_id == c))
            .count())
    }
}

impl GiftCardService for MemoryStore {
    fn get_gift_card_by_id(&self, id: GiftCardId) -> Result<Option<GiftCard>, ServiceError> {
        Ok(self.read()?.gift_cards.get(&id).cloned())
    }

    fn get_gift_card_by_coupon_code(&self, code: &str) -> Result<Option<GiftCard>, ServiceError> {
        let code = code.trim();
        Ok(self
            .read()?
            .gift_cards
            .values()
            .find(|c| c.coupon_code.eq_ignore_ascii_case(code))
            .cloned())
    }

    fn add_gift_card_usage(&self, id: GiftCardId, order_id: OrderId, amount: Money) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let card = tables
            .gift_cards
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found("GiftCard", id))?;
        card.usage.push((order_id, amount));
        Ok(())
    }
}
