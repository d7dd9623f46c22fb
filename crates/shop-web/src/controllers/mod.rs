//! Storefront controllers.
//!
//! Every action takes the request's [`WorkContext`](crate::context::WorkContext)
//! plus its route values or posted form and returns an
//! [`ActionOutcome`](crate::ActionOutcome). Errors are reserved for failures
//! of the underlying services; rejected input comes back as a view with
//! model state.

pub mod boards;
pub mod checkout;
pub mod customer;
pub mod product;
pub mod shopping_cart;
pub mod theme;

pub use boards::BoardsController;
pub use checkout::CheckoutController;
pub use customer::CustomerController;
pub use product::ProductController;
pub use shopping_cart::ShoppingCartController;
pub use theme::{ThemeContext, ThemeController};

use shop_domain::{CustomerId, StoreId};
use shop_services::customers::CustomerService;
use shop_services::ServiceError;
use validator::Validate;

use crate::models::AddressModel;
use crate::result::ModelState;
use crate::validation;

/// Name shown next to posts and reviews; guests and unknown ids read "Guest".
pub(crate) fn customer_name(
    customers: &dyn CustomerService,
    store_id: StoreId,
    customer_id: CustomerId,
) -> Result<String, ServiceError> {
    Ok(customers
        .get_customer_by_id(customer_id)?
        .filter(|c| !c.is_guest())
        .map(|c| c.display_name(store_id))
        .unwrap_or_else(|| "Guest".to_string()))
}

/// Field checks shared by checkout and the address book. Errors are keyed
/// `Address.<Field>`.
pub(crate) fn validate_address(state: &mut ModelState, address: &AddressModel) {
    validation::collect(state, "Address.", address.validate());
}

/// Cut `text` to at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        let mut state = ModelState::new();
        let address = AddressModel {
            first_name: "Ada".into(),
            email: "not-an-email".into(),
            ..Default::default()
        };
        validate_address(&mut state, &address);
        assert!(!state.is_valid());
        assert!(state.field_errors("Address.FirstName").is_empty());
        assert_eq!(state.field_errors("Address.Email").len(), 1);
        assert_eq!(state.field_errors("Address.City"), ["City is required.".to_string()]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
