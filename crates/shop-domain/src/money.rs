//! Amounts of money in a known currency.
//!
//! Amounts are integers in the currency's minor unit. Conversion and
//! percentage math round to the nearest unit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
}

/// Code, symbol and minor-unit digits per currency.
static CURRENCY_TABLE: [(Currency, &str, &str, u32); 7] = [
    (Currency::USD, "USD", "$", 2),
    (Currency::EUR, "EUR", "\u{20ac}", 2),
    (Currency::GBP, "GBP", "\u{00a3}", 2),
    (Currency::JPY, "JPY", "\u{00a5}", 0),
    (Currency::CAD, "CAD", "CA$", 2),
    (Currency::AUD, "AUD", "A$", 2),
    (Currency::CHF, "CHF", "CHF", 2),
];

impl Currency {
    fn entry(&self) -> &'static (Currency, &'static str, &'static str, u32) {
        // every variant has a row
        CURRENCY_TABLE
            .iter()
            .find(|(c, ..)| c == self)
            .unwrap_or(&CURRENCY_TABLE[0])
    }

    /// ISO 4217 code, e.g. "USD".
    pub fn code(&self) -> &'static str {
        self.entry().1
    }

    pub fn symbol(&self) -> &'static str {
        self.entry().2
    }

    /// Digits after the decimal point; JPY has none.
    pub fn decimal_places(&self) -> u32 {
        self.entry().3
    }

    /// Case-insensitive lookup by ISO code.
    pub fn from_code(code: &str) -> Option<Self> {
        CURRENCY_TABLE
            .iter()
            .find(|(_, c, ..)| c.eq_ignore_ascii_case(code))
            .map(|(currency, ..)| *currency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
///
/// Amounts are stored in the smallest unit of the currency (e.g., cents for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from cents.
    pub const fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a Money value from a decimal amount.
    ///
    /// ```
    /// use shop_domain::money::{Money, Currency};
    /// let price = Money::from_decimal(49.99, Currency::USD);
    /// assert_eq!(price.amount_cents, 4999);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        let multiplier = 10_i64.pow(currency.decimal_places());
        let amount_cents = (amount * multiplier as f64).round() as i64;
        Self::new(amount_cents, currency)
    }

    /// Create a zero amount in the given currency.
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Negative amounts clamp to zero.
    pub fn non_negative(&self) -> Self {
        Self::new(self.amount_cents.max(0), self.currency)
    }

    /// The smaller of two amounts in the same currency.
    pub fn try_min(&self, other: &Money) -> Result<Money, DomainError> {
        self.check_currency(other)?;
        Ok(if other.amount_cents < self.amount_cents { *other } else { *self })
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        let divisor = 10_i64.pow(self.currency.decimal_places());
        self.amount_cents as f64 / divisor as f64
    }

    /// Symbol-prefixed amount, "-$2.50" for negatives.
    pub fn display(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        if self.amount_cents < 0 {
            format!("-{}{:.places$}", self.currency.symbol(), -self.to_decimal())
        } else {
            format!("{}{:.places$}", self.currency.symbol(), self.to_decimal())
        }
    }

    /// Amount without the symbol, "49.99".
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.places$}", self.to_decimal())
    }

    fn check_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: other.currency.code().to_string(),
            });
        }
        Ok(())
    }

    /// Add another Money value.
    pub fn try_add(&self, other: &Money) -> Result<Money, DomainError> {
        self.check_currency(other)?;
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(DomainError::Overflow)
    }

    /// Subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Result<Money, DomainError> {
        self.check_currency(other)?;
        self.amount_cents
            .checked_sub(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(DomainError::Overflow)
    }

    /// Multiply by an integer quantity.
    pub fn try_multiply(&self, factor: i64) -> Result<Money, DomainError> {
        self.amount_cents
            .checked_mul(factor)
            .map(|cents| Money::new(cents, self.currency))
            .ok_or(DomainError::Overflow)
    }

    /// Multiply by a decimal factor (e.g., for percentages).
    pub fn multiply_decimal(&self, factor: f64) -> Money {
        let new_amount = (self.amount_cents as f64 * factor).round() as i64;
        Money::new(new_amount, self.currency)
    }

    /// Calculate a percentage of this amount.
    pub fn percentage(&self, percent: f64) -> Money {
        self.multiply_decimal(percent / 100.0)
    }

    /// Convert into another currency using `rate` units of the target per
    /// unit of this currency.
    pub fn convert(&self, rate: f64, to: Currency) -> Money {
        if to == self.currency && (rate - 1.0).abs() < f64::EPSILON {
            return *self;
        }
        Money::from_decimal(self.to_decimal() * rate, to)
    }

    /// Sum Money values, all of which must be in `currency`.
    pub fn try_sum<'a>(
        iter: impl IntoIterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, DomainError> {
        iter.into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
