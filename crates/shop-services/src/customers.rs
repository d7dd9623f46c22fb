//! Customer records, addresses and generic attributes.

use shop_domain::checkout::Address;
use shop_domain::customer::{Customer, CustomerAttribute};
use shop_domain::prelude::*;
use uuid::Uuid;

use crate::memory::MemoryStore;
use crate::ServiceError;

pub trait CustomerService: Send + Sync {
    fn get_customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError>;

    fn get_customer_by_guid(&self, guid: &str) -> Result<Option<Customer>, ServiceError>;

    /// Case-insensitive email lookup.
    fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, ServiceError>;

    /// Case-insensitive username lookup.
    fn get_customer_by_username(&self, username: &str) -> Result<Option<Customer>, ServiceError>;

    fn get_customers_by_ids(&self, ids: &[CustomerId]) -> Result<Vec<Customer>, ServiceError>;

    /// Create a new guest record.
    fn insert_guest_customer(&self) -> Result<Customer, ServiceError>;

    fn update_customer(&self, customer: &Customer) -> Result<(), ServiceError>;

    /// Add an address to a customer's address book and return it with its id.
    fn insert_address(&self, customer_id: CustomerId, address: Address) -> Result<Address, ServiceError>;

    fn update_address(&self, customer_id: CustomerId, address: &Address) -> Result<(), ServiceError>;

    /// Remove an address, clearing billing/shipping references to it.
    fn delete_address(&self, customer_id: CustomerId, address_id: AddressId) -> Result<(), ServiceError>;

    /// Set (or clear with `None`) one generic attribute.
    fn save_attribute(
        &self,
        customer_id: CustomerId,
        store_id: StoreId,
        key: CustomerAttribute,
        value: Option<String>,
    ) -> Result<(), ServiceError> {
        let mut customer = self
            .get_customer_by_id(customer_id)?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;
        customer.set_attribute(store_id, key, value);
        self.update_customer(&customer)
    }

    /// Forget choices made during checkout so it starts over.
    fn reset_checkout_data(
        &self,
        customer_id: CustomerId,
        store_id: StoreId,
        clear_coupon_codes: bool,
    ) -> Result<(), ServiceError> {
        let mut customer = self
            .get_customer_by_id(customer_id)?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;
        for key in [
            CustomerAttribute::SelectedShippingOption,
            CustomerAttribute::OfferedShippingOptions,
            CustomerAttribute::SelectedPaymentMethod,
        ] {
            customer.set_attribute(store_id, key, None);
        }
        if clear_coupon_codes {
            customer.set_attribute(store_id, CustomerAttribute::DiscountCouponCode, None);
            customer.set_attribute(store_id, CustomerAttribute::GiftCardCouponCodes, None);
        }
        self.update_customer(&customer)
    }
}

fn find_customer<'a>(
    tables: &'a mut crate::memory::Tables,
    id: CustomerId,
) -> Result<&'a mut Customer, ServiceError> {
    tables
        .customers
        .get_mut(&id)
        .ok_or_else(|| ServiceError::not_found("Customer", id))
}

impl CustomerService for MemoryStore {
    fn get_customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    fn get_customer_by_guid(&self, guid: &str) -> Result<Option<Customer>, ServiceError> {
        let Ok(guid) = Uuid::parse_str(guid.trim()) else {
            return Ok(None);
        };
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.guid == guid)
            .cloned())
    }

    fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, ServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .cloned())
    }

    fn get_customer_by_username(&self, username: &str) -> Result<Option<Customer>, ServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.username.as_deref().is_some_and(|u| u.eq_ignore_ascii_case(username)))
            .cloned())
    }

    fn get_customers_by_ids(&self, ids: &[CustomerId]) -> Result<Vec<Customer>, ServiceError> {
        let tables = self.read()?;
        Ok(ids.iter().filter_map(|id| tables.customers.get(id).cloned()).collect())
    }

    fn insert_guest_customer(&self) -> Result<Customer, ServiceError> {
        let mut tables = self.write()?;
        let id = CustomerId::new(tables.next_id());
        let customer = Customer::guest(id);
        tables.customers.insert(id, customer.clone());
        tracing::debug!(customer_id = %id, "guest customer created");
        Ok(customer)
    }

    fn update_customer(&self, customer: &Customer) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let existing = find_customer(&mut tables, customer.id)?;
        *existing = customer.clone();
        Ok(())
    }

    fn insert_address(&self, customer_id: CustomerId, mut address: Address) -> Result<Address, ServiceError> {
        let mut tables = self.write()?;
        address.id = AddressId::new(tables.next_id());
        find_customer(&mut tables, customer_id)?.addresses.push(address.clone());
        Ok(address)
    }

    fn update_address(&self, customer_id: CustomerId, address: &Address) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let customer = find_customer(&mut tables, customer_id)?;
        match customer.addresses.iter_mut().find(|a| a.id == address.id) {
            Some(existing) => {
                *existing = address.clone();
                Ok(())
            }
            None => Err(ServiceError::not_found("Address", address.id)),
        }
    }

    fn delete_address(&self, customer_id: CustomerId, address_id: AddressId) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let customer = find_customer(&mut tables, customer_id)?;
        let before = customer.addresses.len();
        customer.addresses.retain(|a| a.id != address_id);
        if customer.addresses.len() == before {
            return Err(ServiceError::not_found("Address", address_id));
        }
        if customer.billing_address_id == Some(address_id) {
            customer.billing_address_id = None;
        }
        if customer.shipping_address_id == Some(address_id) {
            customer.shipping_address_id = None;
        }
        Ok(())
    }
}
