//! View models handed to views and forms posted back by them.

pub mod boards;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod order;
pub mod theme;

use serde::{Deserialize, Serialize};
use shop_domain::checkout::Address;
use shop_domain::AddressId;
use validator::Validate;

use crate::validation::non_blank;

/// Address as shown in address books and edited in address forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AddressModel {
    pub id: AddressId,
    #[validate(custom(function = "non_blank", message = "First name is required."))]
    pub first_name: String,
    #[validate(custom(function = "non_blank", message = "Last name is required."))]
    pub last_name: String,
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub email: String,
    pub company: Option<String>,
    #[validate(custom(function = "non_blank", message = "Street address is required."))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(custom(function = "non_blank", message = "City is required."))]
    pub city: String,
    pub province_code: Option<String>,
    #[validate(custom(function = "non_blank", message = "Country is required."))]
    pub country_code: String,
    #[validate(custom(function = "non_blank", message = "Zip / postal code is required."))]
    pub zip: String,
    pub phone: Option<String>,
}

impl From<&Address> for AddressModel {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            first_name: address.first_name.clone(),
            last_name: address.last_name.clone(),
            email: address.email.clone(),
            company: address.company.clone(),
            address1: address.address1.clone(),
            address2: address.address2.clone(),
            city: address.city.clone(),
            province_code: address.province_code.clone(),
            country_code: address.country_code.clone(),
            zip: address.zip.clone(),
            phone: address.phone.clone(),
        }
    }
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl AddressModel {
    pub fn to_address(&self) -> Address {
        Address {
            id: self.id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            company: blank_to_none(&self.company),
            address1: self.address1.trim().to_string(),
            address2: blank_to_none(&self.address2),
            city: self.city.trim().to_string(),
            province_code: blank_to_none(&self.province_code),
            country_code: self.country_code.trim().to_uppercase(),
            zip: self.zip.trim().to_string(),
            phone: blank_to_none(&self.phone),
        }
    }

    /// Single-line summary for address pickers.
    pub fn summary(&self) -> String {
        let address = self.to_address();
        format!("{}, {}", address.full_name(), address.one_line())
    }
}
