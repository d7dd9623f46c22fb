//! Address types.

use crate::ids::AddressId;
use serde::{Deserialize, Serialize};

/// A postal address stored in a customer's address book or on an order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    /// Zero for unsaved addresses.
    pub id: AddressId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    /// State/province code (e.g., "CA").
    pub province_code: Option<String>,
    /// Country code (e.g., "US").
    pub country_code: String,
    pub zip: String,
    pub phone: Option<String>,
}

impl Address {
    /// Get full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address1.clone()];
        if let Some(ref addr2) = self.address2 {
            parts.push(addr2.clone());
        }
        parts.push(self.city.clone());
        if let Some(ref province) = self.province_code {
            parts.push(province.clone());
        }
        parts.push(self.zip.clone());
        parts.push(self.country_code.clone());
        parts.join(", ")
    }

    /// Check if address is complete.
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty()
            && !self.last_name.is_empty()
            && !self.email.is_empty()
            && !self.address1.is_empty()
            && !self.city.is_empty()
            && !self.country_code.is_empty()
            && !self.zip.is_empty()
    }

    /// Whether two addresses hold the same data, ignoring ids. Used to
    /// avoid duplicating an address already in the customer's book.
    pub fn same_as(&self, other: &Address) -> bool {
        fn norm(s: &str) -> String {
            s.trim().to_lowercase()
        }
        fn norm_opt(s: &Option<String>) -> String {
            s.as_deref().map(norm).unwrap_or_default()
        }
        norm(&self.first_name) == norm(&other.first_name)
            && norm(&self.last_name) == norm(&other.last_name)
            && norm(&self.email) == norm(&other.email)
            && norm_opt(&self.company) == norm_opt(&other.company)
            && norm(&self.address1) == norm(&other.address1)
            && norm_opt(&self.address2) == norm_opt(&other.address2)
            && norm(&self.city) == norm(&other.city)
            && norm_opt(&self.province_code) == norm_opt(&other.province_code)
            && norm(&self.country_code) == norm(&other.country_code)
            && norm(&self.zip) == norm(&other.zip)
            && norm_opt(&self.phone) == norm_opt(&other.phone)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.same_as(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Address {
        Address {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john@example.com".into(),
            address1: "123 Main St".into(),
            city: "San Francisco".into(),
            province_code: Some("CA".into()),
            country_code: "US".into(),
            zip: "94102".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_address_formatting() {
        let addr = sample();
        assert_eq!(addr.full_name(), "John Doe");
        assert_eq!(addr.one_line(), "123 Main St, San Francisco, CA, 94102, US");
        assert!(addr.is_complete());
        assert!(!Address::default().is_complete());
    }

    #[test]
    fn test_same_as_ignores_id_and_case() {
        let a = sample();
        let mut b = sample();
        b.id = AddressId::new(7);
        b.city = "san francisco ".into();
        assert!(a.same_as(&b));
        assert_ne!(a, b);

        b.zip = "94103".into();
        assert!(!a.same_as(&b));
    }
}
