use serde::{Deserialize, Serialize};
use shop_domain::OrderId;
use validator::Validate;

use super::AddressModel;
use crate::validation::non_blank;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginModel {
    pub usernames_enabled: bool,
    pub username_or_email: String,
    pub checkout_as_guest_allowed: bool,
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    /// Username when usernames are enabled, email otherwise.
    #[validate(custom(function = "non_blank", message = "Username or email is required."))]
    pub username_or_email: String,
    #[validate(custom(function = "non_blank", message = "Password is required."))]
    pub password: String,
    pub remember_me: bool,
    pub return_url: Option<String>,
    /// Set when signing in from checkout.
    pub checkout_as_guest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterModel {
    pub usernames_enabled: bool,
    pub check_username_availability_enabled: bool,
    pub gender_enabled: bool,
    pub date_of_birth_enabled: bool,
    pub company_enabled: bool,
    pub company_required: bool,
    pub phone_enabled: bool,
    pub phone_required: bool,
    pub newsletter_enabled: bool,
    pub password_min_length: usize,
    /// Values posted back after a failed attempt.
    pub form: RegisterForm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub email: String,
    pub username: String,
    #[validate(custom(function = "non_blank", message = "Password is required."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The password and confirmation password do not match."))]
    pub confirm_password: String,
    #[validate(custom(function = "non_blank", message = "First name is required."))]
    pub first_name: String,
    #[validate(custom(function = "non_blank", message = "Last name is required."))]
    pub last_name: String,
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub newsletter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterResultModel {
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfoModel {
    pub email: String,
    pub username: Option<String>,
    pub usernames_enabled: bool,
    pub allow_users_to_change_usernames: bool,
    pub first_name: String,
    pub last_name: String,
    pub gender_enabled: bool,
    pub gender: Option<String>,
    pub date_of_birth_enabled: bool,
    pub date_of_birth: Option<String>,
    pub company_enabled: bool,
    pub company: Option<String>,
    pub phone_enabled: bool,
    pub phone: Option<String>,
    pub newsletter_enabled: bool,
    pub newsletter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CustomerInfoForm {
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub email: String,
    pub username: Option<String>,
    #[validate(custom(function = "non_blank", message = "First name is required."))]
    pub first_name: String,
    #[validate(custom(function = "non_blank", message = "Last name is required."))]
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub newsletter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerAddressListModel {
    pub addresses: Vec<AddressModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerAddressEditModel {
    pub address: AddressModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrderSummaryModel {
    pub id: OrderId,
    pub order_total: String,
    pub order_status: String,
    pub payment_status: String,
    pub shipping_status: String,
    pub created_on: String,
    pub is_reorder_allowed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrderListModel {
    pub orders: Vec<CustomerOrderSummaryModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "non_blank", message = "Old password is required."))]
    pub old_password: String,
    #[validate(custom(function = "non_blank", message = "Password is required."))]
    pub new_password: String,
    #[validate(must_match(
        other = "new_password",
        message = "The new password and confirmation password do not match."
    ))]
    pub confirm_new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePasswordModel {
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordRecoveryModel {
    #[validate(
        custom(function = "non_blank", message = "Email is required."),
        email(message = "Wrong email")
    )]
    pub email: String,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordRecoveryConfirmForm {
    #[validate(custom(function = "non_blank", message = "Password is required."))]
    pub new_password: String,
    #[validate(must_match(
        other = "new_password",
        message = "The new password and confirmation password do not match."
    ))]
    pub confirm_new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordRecoveryConfirmModel {
    /// The link is invalid or expired.
    pub disable_password_changing: bool,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountActivationModel {
    pub result: String,
}
