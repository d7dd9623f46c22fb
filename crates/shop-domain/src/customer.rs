//! Customers, roles and generic attributes.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::checkout::Address;
use crate::ids::{AddressId, CustomerId, StoreId};
use crate::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Built-in customer roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerRole {
    Guests,
    Registered,
    ForumModerators,
    Administrators,
}

impl CustomerRole {
    /// System name used in settings and permission lists.
    pub fn system_name(&self) -> &'static str {
        match self {
            CustomerRole::Guests => "Guests",
            CustomerRole::Registered => "Registered",
            CustomerRole::ForumModerators => "ForumModerators",
            CustomerRole::Administrators => "Administrators",
        }
    }
}

impl FromStr for CustomerRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Guests" => Ok(CustomerRole::Guests),
            "Registered" => Ok(CustomerRole::Registered),
            "ForumModerators" => Ok(CustomerRole::ForumModerators),
            "Administrators" => Ok(CustomerRole::Administrators),
            other => Err(DomainError::UnknownValue {
                kind: "customer role",
                value: other.to_string(),
            }),
        }
    }
}

/// Keys for per-customer, per-store key/value attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerAttribute {
    FirstName,
    LastName,
    Gender,
    DateOfBirth,
    Company,
    Phone,
    Newsletter,
    /// JSON of the chosen `ShippingOption`.
    SelectedShippingOption,
    /// JSON list of the options last offered at the shipping step.
    OfferedShippingOptions,
    /// System name of the chosen payment method.
    SelectedPaymentMethod,
    DiscountCouponCode,
    /// Comma-separated gift card codes.
    GiftCardCouponCodes,
    WorkingThemeName,
    CurrencyCode,
    TaxDisplayType,
    /// Comma-separated product ids, most recent first.
    RecentlyViewedProducts,
    /// Comma-separated product ids, most recent first.
    CompareProducts,
    LastContinueShoppingPage,
    PasswordRecoveryToken,
    AccountActivationToken,
    /// Number of posts written in the forums.
    ForumPostCount,
}

/// A storefront customer, guest or registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    /// Stable public identifier (used in shared wishlist links).
    pub guid: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub roles: Vec<CustomerRole>,
    pub active: bool,
    pub deleted: bool,
    pub addresses: Vec<Address>,
    pub billing_address_id: Option<AddressId>,
    pub shipping_address_id: Option<AddressId>,
    /// Attributes keyed per store.
    pub attributes: BTreeMap<StoreId, BTreeMap<CustomerAttribute, String>>,
    pub created_at: i64,
    pub last_activity_at: i64,
}

impl Customer {
    /// A fresh guest record with a new random guid.
    pub fn guest(id: CustomerId) -> Self {
        let now = crate::current_timestamp();
        Self {
            id,
            guid: Uuid::new_v4(),
            email: None,
            username: None,
            password_hash: None,
            roles: vec![CustomerRole::Guests],
            active: true,
            deleted: false,
            addresses: Vec::new(),
            billing_address_id: None,
            shipping_address_id: None,
            attributes: BTreeMap::new(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_in_role(&self, role: CustomerRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_guest(&self) -> bool {
        self.is_in_role(CustomerRole::Guests)
    }

    pub fn is_registered(&self) -> bool {
        self.is_in_role(CustomerRole::Registered)
    }

    pub fn is_forum_moderator(&self) -> bool {
        self.is_in_role(CustomerRole::ForumModerators)
    }

    /// Swap the guest role for the registered role.
    pub fn promote_to_registered(&mut self) {
        self.roles.retain(|r| *r != CustomerRole::Guests);
        if !self.is_registered() {
            self.roles.push(CustomerRole::Registered);
        }
    }

    pub fn attribute(&self, store_id: StoreId, key: CustomerAttribute) -> Option<&str> {
        self.attributes
            .get(&store_id)
            .and_then(|attrs| attrs.get(&key))
            .map(String::as_str)
    }

    /// Set or clear (with `None` or an empty value) an attribute.
    pub fn set_attribute(&mut self, store_id: StoreId, key: CustomerAttribute, value: Option<String>) {
        match value {
            Some(v) if !v.is_empty() => {
                self.attributes.entry(store_id).or_default().insert(key, v);
            }
            _ => {
                if let Some(attrs) = self.attributes.get_mut(&store_id) {
                    attrs.remove(&key);
                }
            }
        }
    }

    pub fn address(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address_id.and_then(|id| self.address(id))
    }

    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address_id.and_then(|id| self.address(id))
    }

    /// Full name from attributes, falling back to the username or email.
    pub fn display_name(&self, store_id: StoreId) -> String {
        let first = self.attribute(store_id, CustomerAttribute::FirstName).unwrap_or_default();
        let last = self.attribute(store_id, CustomerAttribute::LastName).unwrap_or_default();
        let full = format!("{} {}", first, last).trim().to_string();
        if !full.is_empty() {
            return full;
        }
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Guest".to_string())
    }

    /// Parse a comma-separated id list attribute.
    pub fn id_list_attribute<T: FromStr>(&self, store_id: StoreId, key: CustomerAttribute) -> Vec<T> {
        self.attribute(store_id, key)
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote_to_registered() {
        let mut customer = Customer::guest(CustomerId::new(1));
        assert!(customer.is_guest());
        customer.promote_to_registered();
        assert!(!customer.is_guest());
        assert!(customer.is_registered());
        customer.promote_to_registered();
        assert_eq!(customer.roles.len(), 1);
    }

    #[test]
    fn test_attributes_are_per_store() {
        let mut customer = Customer::guest(CustomerId::new(1));
        let s1 = StoreId::new(1);
        let s2 = StoreId::new(2);
        customer.set_attribute(s1, CustomerAttribute::DiscountCouponCode, Some("SAVE".into()));
        assert_eq!(customer.attribute(s1, CustomerAttribute::DiscountCouponCode), Some("SAVE"));
        assert_eq!(customer.attribute(s2, CustomerAttribute::DiscountCouponCode), None);

        customer.set_attribute(s1, CustomerAttribute::DiscountCouponCode, Some(String::new()));
        assert_eq!(customer.attribute(s1, CustomerAttribute::DiscountCouponCode), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let store = StoreId::new(1);
        let mut customer = Customer::guest(CustomerId::new(1));
        assert_eq!(customer.display_name(store), "Guest");
        customer.email = Some("jo@example.com".into());
        assert_eq!(customer.display_name(store), "jo@example.com");
        customer.set_attribute(store, CustomerAttribute::FirstName, Some("Jo".into()));
        assert_eq!(customer.display_name(store), "Jo");
    }

    #[test]
    fn test_customer_json_roundtrip() {
        let mut customer = Customer::guest(CustomerId::new(9));
        customer.set_attribute(StoreId::new(1), CustomerAttribute::Gender, Some("F".into()));
        let json = serde_json::to_string(&customer).unwrap();
        let back: Customer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, customer);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Registered".parse::<CustomerRole>(), Ok(CustomerRole::Registered));
        assert!("Root".parse::<CustomerRole>().is_err());
    }
}
