//! Stores and installed themes.

use crate::ids::StoreId;
use crate::money::Currency;
use serde::{Deserialize, Serialize};

/// One storefront served by the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Base URL, ending with a slash.
    pub url: String,
    pub ssl_enabled: bool,
    /// Receives store-owner notifications.
    pub owner_email: String,
    /// Currency catalog prices are stored in.
    pub primary_currency: Currency,
}

impl Store {
    pub fn new(id: StoreId, name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self {
            id,
            name: name.into(),
            url,
            ssl_enabled: false,
            owner_email: String::new(),
            primary_currency: Currency::USD,
        }
    }

    pub fn with_owner_email(mut self, email: impl Into<String>) -> Self {
        self.owner_email = email.into();
        self
    }

    /// Absolute URL for a site-relative path.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.url, path.trim_start_matches('/'))
    }
}

/// An installed storefront theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeDescriptor {
    pub system_name: String,
    pub friendly_name: String,
    pub preview_image_url: Option<String>,
    pub supports_rtl: bool,
}
