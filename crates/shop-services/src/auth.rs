//! Customer registration, password handling and sign-in state.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use shop_cache::{Cache, Session, SessionId};
use shop_domain::customer::Customer;
use shop_domain::prelude::*;
use shop_domain::settings::CustomerSettings;
use validator::ValidateEmail;

use crate::customers::CustomerService;
use crate::ServiceError;

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerLoginResult {
    Successful(Box<Customer>),
    CustomerNotExist,
    Deleted,
    NotActive,
    NotRegistered,
    WrongPassword,
}

/// Error list returned by account operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceResult {
    pub errors: Vec<String>,
}

impl ServiceResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

/// Turns the current guest record into a registered customer.
#[derive(Debug, Clone)]
pub struct CustomerRegistrationRequest {
    pub customer_id: CustomerId,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    /// Whether the account is active right away.
    pub is_approved: bool,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub email: String,
    /// Check `old_password` before changing (false for recovery links).
    pub validate_request: bool,
    pub old_password: String,
    pub new_password: String,
}

/// Argon2 password hashing.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(params: argon2::Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::Password(e.to_string()))
    }

    /// Verify a password against a PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::Password(e.to_string()))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

pub trait CustomerRegistrationService: Send + Sync {
    /// Check credentials. `username_or_email` is a username when usernames
    /// are enabled, an email otherwise.
    fn validate_customer(
        &self,
        username_or_email: &str,
        password: &str,
        usernames_enabled: bool,
    ) -> Result<CustomerLoginResult, ServiceError>;

    fn register_customer(
        &self,
        request: &CustomerRegistrationRequest,
        settings: &CustomerSettings,
    ) -> Result<ServiceResult, ServiceError>;

    fn change_password(
        &self,
        request: &ChangePasswordRequest,
        settings: &CustomerSettings,
    ) -> Result<ServiceResult, ServiceError>;

    fn set_email(&self, customer_id: CustomerId, new_email: &str) -> Result<ServiceResult, ServiceError>;

    fn set_username(&self, customer_id: CustomerId, new_username: &str) -> Result<ServiceResult, ServiceError>;
}

pub struct DefaultCustomerRegistrationService {
    customers: Arc<dyn CustomerService>,
    hasher: PasswordHasher,
}

impl DefaultCustomerRegistrationService {
    pub fn new(customers: Arc<dyn CustomerService>, hasher: PasswordHasher) -> Self {
        Self { customers, hasher }
    }

    fn load(&self, id: CustomerId) -> Result<Customer, ServiceError> {
        self.customers
            .get_customer_by_id(id)?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }
}

impl CustomerRegistrationService for DefaultCustomerRegistrationService {
    fn validate_customer(
        &self,
        username_or_email: &str,
        password: &str,
        usernames_enabled: bool,
    ) -> Result<CustomerLoginResult, ServiceError> {
        let customer = if usernames_enabled {
            self.customers.get_customer_by_username(username_or_email)?
        } else {
            self.customers.get_customer_by_email(username_or_email)?
        };
        let Some(customer) = customer else {
            return Ok(CustomerLoginResult::CustomerNotExist);
        };
        if customer.deleted {
            return Ok(CustomerLoginResult::Deleted);
        }
        if !customer.active {
            return Ok(CustomerLoginResult::NotActive);
        }
        if !customer.is_registered() {
            return Ok(CustomerLoginResult::NotRegistered);
        }
        let matches = match customer.password_hash.as_deref() {
            Some(hash) => self.hasher.verify(password, hash)?,
            None => false,
        };
        if !matches {
            return Ok(CustomerLoginResult::WrongPassword);
        }

        let mut customer = customer;
        customer.last_activity_at = current_timestamp();
        self.customers.update_customer(&customer)?;
        Ok(CustomerLoginResult::Successful(Box::new(customer)))
    }

    fn register_customer(
        &self,
        request: &CustomerRegistrationRequest,
        settings: &CustomerSettings,
    ) -> Result<ServiceResult, ServiceError> {
        let mut result = ServiceResult::default();
        let mut customer = self.load(request.customer_id)?;

        if customer.is_registered() {
            result.add_error("Current customer is already registered");
            return Ok(result);
        }
        let email = request.email.trim();
        if email.is_empty() {
            result.add_error("Email is not provided");
        } else if !email.validate_email() {
            result.add_error("Wrong email");
        }
        if request.password.is_empty() {
            result.add_error("Password is not provided");
        } else if request.password.chars().count() < settings.password_min_length {
            result.add_error(format!(
                "Password must have at least {} characters",
                settings.password_min_length
            ));
        }
        let username = request.username.as_deref().map(str::trim).unwrap_or_default();
        if settings.usernames_enabled && username.is_empty() {
            result.add_error("Username is not provided");
        }
        if !result.success() {
            return Ok(result);
        }

        if self.customers.get_customer_by_email(email)?.is_some() {
            result.add_error("The specified email already exists");
            return Ok(result);
        }
        if settings.usernames_enabled && self.customers.get_customer_by_username(username)?.is_some() {
            result.add_error("The specified username already exists");
            return Ok(result);
        }

        customer.email = Some(email.to_string());
        if settings.usernames_enabled {
            customer.username = Some(username.to_string());
        }
        customer.password_hash = Some(self.hasher.hash(&request.password)?);
        customer.active = request.is_approved;
        customer.promote_to_registered();
        self.customers.update_customer(&customer)?;

        tracing::info!(customer_id = %customer.id, approved = request.is_approved, "customer registered");
        Ok(result)
    }

    fn change_password(
        &self,
        request: &ChangePasswordRequest,
        settings: &CustomerSettings,
    ) -> Result<ServiceResult, ServiceError> {
        let mut result = ServiceResult::default();
        if request.email.trim().is_empty() {
            result.add_error("Email is not entered");
            return Ok(result);
        }
        if request.new_password.is_empty() {
            result.add_error("Password is not entered");
            return Ok(result);
        }
        if request.new_password.chars().count() < settings.password_min_length {
            result.add_error(format!(
                "Password must have at least {} characters",
                settings.password_min_length
            ));
            return Ok(result);
        }
        let Some(mut customer) = self.customers.get_customer_by_email(&request.email)? else {
            result.add_error("The specified email could not be found");
            return Ok(result);
        };
        if request.validate_request {
            let matches = match customer.password_hash.as_deref() {
                Some(hash) => self.hasher.verify(&request.old_password, hash)?,
                None => false,
            };
            if !matches {
                result.add_error("Old password doesn't match");
                return Ok(result);
            }
        }
        customer.password_hash = Some(self.hasher.hash(&request.new_password)?);
        self.customers.update_customer(&customer)?;
        tracing::info!(customer_id = %customer.id, "password changed");
        Ok(result)
    }

    fn set_email(&self, customer_id: CustomerId, new_email: &str) -> Result<ServiceResult, ServiceError> {
        let mut result = ServiceResult::default();
        let new_email = new_email.trim();
        if !new_email.validate_email() {
            result.add_error("New email is not valid");
            return Ok(result);
        }
        let mut customer = self.load(customer_id)?;
        if customer.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(new_email)) {
            return Ok(result);
        }
        if self.customers.get_customer_by_email(new_email)?.is_some() {
            result.add_error("The e-mail address is already in use");
            return Ok(result);
        }
        customer.email = Some(new_email.to_string());
        self.customers.update_customer(&customer)?;
        Ok(result)
    }

    fn set_username(&self, customer_id: CustomerId, new_username: &str) -> Result<ServiceResult, ServiceError> {
        let mut result = ServiceResult::default();
        let new_username = new_username.trim();
        if new_username.is_empty() {
            result.add_error("Username is not provided");
            return Ok(result);
        }
        let mut customer = self.load(customer_id)?;
        if customer.username.as_deref() == Some(new_username) {
            return Ok(result);
        }
        if self.customers.get_customer_by_username(new_username)?.is_some() {
            result.add_error("The username is already in use");
            return Ok(result);
        }
        customer.username = Some(new_username.to_string());
        self.customers.update_customer(&customer)?;
        Ok(result)
    }
}

/// Who a browser session belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSession {
    pub customer_id: Option<CustomerId>,
    pub guest_customer_id: Option<CustomerId>,
}

pub trait AuthenticationService: Send + Sync {
    fn sign_in(&self, session: &SessionId, customer: &Customer) -> Result<(), ServiceError>;

    fn sign_out(&self, session: &SessionId) -> Result<(), ServiceError>;

    /// The signed-in customer, if the session has one that may still log in.
    fn get_authenticated_customer(&self, session: &SessionId) -> Result<Option<Customer>, ServiceError>;

    /// The guest record remembered for an anonymous session.
    fn get_guest_customer(&self, session: &SessionId) -> Result<Option<Customer>, ServiceError>;

    fn set_guest_customer(&self, session: &SessionId, customer_id: CustomerId) -> Result<(), ServiceError>;
}

/// Sign-in state kept in the cache-backed session store.
pub struct SessionAuthenticationService {
    sessions: Session<AuthSession>,
    customers: Arc<dyn CustomerService>,
}

impl SessionAuthenticationService {
    pub fn new(cache: Cache, customers: Arc<dyn CustomerService>) -> Self {
        Self {
            sessions: Session::new(cache, "auth").with_ttl(None),
            customers,
        }
    }
}

impl AuthenticationService for SessionAuthenticationService {
    fn sign_in(&self, session: &SessionId, customer: &Customer) -> Result<(), ServiceError> {
        let customer_id = customer.id;
        self.sessions.update(session, |s| s.customer_id = Some(customer_id))?;
        tracing::info!(customer_id = %customer_id, "customer signed in");
        Ok(())
    }

    fn sign_out(&self, session: &SessionId) -> Result<(), ServiceError> {
        self.sessions.delete(session)?;
        Ok(())
    }

    fn get_authenticated_customer(&self, session: &SessionId) -> Result<Option<Customer>, ServiceError> {
        let Some(customer_id) = self.sessions.get(session)?.and_then(|s| s.customer_id) else {
            return Ok(None);
        };
        Ok(self
            .customers
            .get_customer_by_id(customer_id)?
            .filter(|c| c.active && !c.deleted && c.is_registered()))
    }

    fn get_guest_customer(&self, session: &SessionId) -> Result<Option<Customer>, ServiceError> {
        let Some(customer_id) = self.sessions.get(session)?.and_then(|s| s.guest_customer_id) else {
            return Ok(None);
        };
        Ok(self
            .customers
            .get_customer_by_id(customer_id)?
            .filter(|c| !c.deleted && c.is_guest()))
    }

    fn set_guest_customer(&self, session: &SessionId, customer_id: CustomerId) -> Result<(), ServiceError> {
        self.sessions.update(session, |s| s.guest_customer_id = Some(customer_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(argon2::Params::new(1024, 1, 1, None).unwrap())
    }

    fn setup() -> (Arc<MemoryStore>, DefaultCustomerRegistrationService) {
        let store = Arc::new(MemoryStore::new());
        let service = DefaultCustomerRegistrationService::new(store.clone(), fast_hasher());
        (store, service)
    }

    fn register(store: &MemoryStore, service: &DefaultCustomerRegistrationService, email: &str) -> Customer {
        let guest = store.insert_guest_customer().unwrap();
        let result = service
            .register_customer(
                &CustomerRegistrationRequest {
                    customer_id: guest.id,
                    email: email.into(),
                    username: None,
                    password: "secret123".into(),
                    is_approved: true,
                },
                &CustomerSettings::default(),
            )
            .unwrap();
        assert!(result.success(), "{:?}", result.errors);
        store.get_customer_by_id(guest.id).unwrap().unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("hunter22").unwrap();
        assert!(hasher.verify("hunter22", &hash).unwrap());
        assert!(!hasher.verify("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_malformed_emails_rejected() {
        let (store, service) = setup();
        let customer = register(&store, &service, "jo@example.com");
        for bad in ["ab.com", "a b@c.com", "jo@@example.com"] {
            let result = service.set_email(customer.id, bad).unwrap();
            assert_eq!(result.errors, vec!["New email is not valid".to_string()], "{}", bad);
        }
        assert!(service.set_email(customer.id, "jo@example.org").unwrap().success());
    }

    #[test]
    fn test_register_and_login() {
        let (store, service) = setup();
        let customer = register(&store, &service, "jo@example.com");
        assert!(customer.is_registered());

        let result = service.validate_customer("jo@example.com", "secret123", false).unwrap();
        assert!(matches!(result, CustomerLoginResult::Successful(_)));
        assert_eq!(
            service.validate_customer("jo@example.com", "nope", false).unwrap(),
            CustomerLoginResult::WrongPassword
        );
        assert_eq!(
            service.validate_customer("nobody@example.com", "x", false).unwrap(),
            CustomerLoginResult::CustomerNotExist
        );
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, service) = setup();
        register(&store, &service, "jo@example.com");
        let guest = store.insert_guest_customer().unwrap();
        let result = service
            .register_customer(
                &CustomerRegistrationRequest {
                    customer_id: guest.id,
                    email: "JO@example.com".into(),
                    username: None,
                    password: "secret123".into(),
                    is_approved: true,
                },
                &CustomerSettings::default(),
            )
            .unwrap();
        assert_eq!(result.errors, vec!["The specified email already exists".to_string()]);
    }

    #[test]
    fn test_inactive_customer_cannot_log_in() {
        let (store, service) = setup();
        let guest = store.insert_guest_customer().unwrap();
        service
            .register_customer(
                &CustomerRegistrationRequest {
                    customer_id: guest.id,
                    email: "pending@example.com".into(),
                    username: None,
                    password: "secret123".into(),
                    is_approved: false,
                },
                &CustomerSettings::default(),
            )
            .unwrap();
        assert_eq!(
            service.validate_customer("pending@example.com", "secret123", false).unwrap(),
            CustomerLoginResult::NotActive
        );
    }

    #[test]
    fn test_change_password_checks_old_password() {
        let (store, service) = setup();
        register(&store, &service, "jo@example.com");
        let settings = CustomerSettings::default();

        let wrong = service
            .change_password(
                &ChangePasswordRequest {
                    email: "jo@example.com".into(),
                    validate_request: true,
                    old_password: "bad".into(),
                    new_password: "newsecret".into(),
                },
                &settings,
            )
            .unwrap();
        assert!(!wrong.success());

        let ok = service
            .change_password(
                &ChangePasswordRequest {
                    email: "jo@example.com".into(),
                    validate_request: true,
                    old_password: "secret123".into(),
                    new_password: "newsecret".into(),
                },
                &settings,
            )
            .unwrap();
        assert!(ok.success());
        assert!(matches!(
            service.validate_customer("jo@example.com", "newsecret", false).unwrap(),
            CustomerLoginResult::Successful(_)
        ));
    }

    #[test]
    fn test_session_sign_in_and_out() {
        let (store, service) = setup();
        let customer = register(&store, &service, "jo@example.com");
        let auth = SessionAuthenticationService::new(Cache::in_memory(), store.clone());
        let session = SessionId::new("s1");

        assert!(auth.get_authenticated_customer(&session).unwrap().is_none());
        auth.sign_in(&session, &customer).unwrap();
        assert_eq!(
            auth.get_authenticated_customer(&session).unwrap().map(|c| c.id),
            Some(customer.id)
        );
        auth.sign_out(&session).unwrap();
        assert!(auth.get_authenticated_customer(&session).unwrap().is_none());
    }

    #[test]
    fn test_guest_session_forgets_registered_customer() {
        let (store, service) = setup();
        let auth = SessionAuthenticationService::new(Cache::in_memory(), store.clone());
        let session = SessionId::new("s1");
        let guest = store.insert_guest_customer().unwrap();
        auth.set_guest_customer(&session, guest.id).unwrap();
        assert_eq!(auth.get_guest_customer(&session).unwrap().map(|c| c.id), Some(guest.id));

        service
            .register_customer(
                &CustomerRegistrationRequest {
                    customer_id: guest.id,
                    email: "jo@example.com".into(),
                    username: None,
                    password: "secret123".into(),
                    is_approved: true,
                },
                &CustomerSettings::default(),
            )
            .unwrap();
        assert!(auth.get_guest_customer(&session).unwrap().is_none());
    }
}
