//! Storefront configuration file.
//!
//! A `shop.toml` holds one `[defaults]` table and a `[stores.<id>]` table per
//! store. A store's effective settings are the defaults overlaid with the
//! store's own `settings` table, then deserialized into [`StoreSettings`].
//!
//! ```toml
//! [defaults.catalog]
//! show_sku = true
//!
//! [stores.1]
//! name = "Demo Store"
//! url = "http://localhost:8080/"
//!
//! [stores.1.settings.forum]
//! forums_enabled = false
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shop_domain::settings::StoreSettings;
use shop_domain::store::Store;
use shop_domain::{Currency, StoreId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One `[stores.<id>]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub ssl_enabled: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub owner_email: String,
    /// Overrides merged over `[defaults]`.
    #[serde(default)]
    pub settings: toml::Table,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Parsed configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopConfig {
    #[serde(default)]
    pub defaults: toml::Table,

    /// Keyed by store id.
    #[serde(default)]
    pub stores: BTreeMap<String, StoreEntry>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        let mut stores = BTreeMap::new();
        stores.insert(
            "1".to_string(),
            StoreEntry {
                name: "Demo Store".to_string(),
                url: "http://localhost:8080/".to_string(),
                ssl_enabled: false,
                currency: default_currency(),
                owner_email: "owner@demo.local".to_string(),
                settings: toml::Table::new(),
            },
        );
        Self {
            defaults: toml::Table::new(),
            stores,
        }
    }
}

/// Overlay `overlay` onto `base`: tables merge key by key, anything else
/// replaces the base value.
pub fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

impl ShopConfig {
    /// Load a TOML file, or JSON when the extension is `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn store_entry(&self, store_id: StoreId) -> Option<&StoreEntry> {
        self.stores
            .iter()
            .find(|(key, _)| key.trim().parse::<StoreId>().ok() == Some(store_id))
            .map(|(_, entry)| entry)
    }

    /// Effective settings of a store. Unknown stores get the defaults.
    pub fn settings_for(&self, store_id: StoreId) -> Result<StoreSettings, ConfigError> {
        let mut merged = self.defaults.clone();
        if let Some(entry) = self.store_entry(store_id) {
            merge_tables(&mut merged, &entry.settings);
        }
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(format!("store {}: {}", store_id, e)))
    }

    /// Stores described by the file, ordered by id.
    pub fn stores(&self) -> Result<Vec<Store>, ConfigError> {
        let mut stores = Vec::with_capacity(self.stores.len());
        for (key, entry) in &self.stores {
            let id: StoreId = key
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("store key '{}' is not a number", key)))?;
            let currency = Currency::from_code(&entry.currency)
                .ok_or_else(|| ConfigError::Invalid(format!("store {}: unknown currency '{}'", id, entry.currency)))?;
            let mut store = Store::new(id, entry.name.clone(), entry.url.clone()).with_owner_email(entry.owner_email.clone());
            store.ssl_enabled = entry.ssl_enabled;
            store.primary_currency = currency;
            stores.push(store);
        }
        stores.sort_by_key(|s| s.id);
        Ok(stores)
    }

    /// Problems with the configuration; empty when it is usable.
    /// `installed_themes` are the theme system names the default theme may use.
    pub fn validate(&self, installed_themes: &[String]) -> Vec<String> {
        let mut problems = Vec::new();
        let stores = match self.stores() {
            Ok(stores) => stores,
            Err(e) => {
                problems.push(e.to_string());
                return problems;
            }
        };
        if stores.is_empty() {
            problems.push("no stores configured".to_string());
        }
        for store in &stores {
            let settings = match self.settings_for(store.id) {
                Ok(settings) => settings,
                Err(e) => {
                    problems.push(e.to_string());
                    continue;
                }
            };
            let prefix = format!("store {}", store.id);
            for (name, size) in [
                ("catalog.default_page_size", settings.catalog.default_page_size),
                ("forum.topics_page_size", settings.forum.topics_page_size),
                ("forum.posts_page_size", settings.forum.posts_page_size),
                ("forum.search_results_page_size", settings.forum.search_results_page_size),
                ("forum.active_discussions_page_size", settings.forum.active_discussions_page_size),
                ("forum.forum_subscriptions_page_size", settings.forum.forum_subscriptions_page_size),
            ] {
                if size == 0 {
                    problems.push(format!("{}: {} must be positive", prefix, name));
                }
            }
            let order = &settings.order;
            if order.min_order_total_cents > 0
                && order.min_order_subtotal_cents > 0
                && order.min_order_total_cents < order.min_order_subtotal_cents
            {
                problems.push(format!(
                    "{}: order.min_order_total_cents is below order.min_order_subtotal_cents",
                    prefix
                ));
            }
            if !installed_themes.is_empty()
                && !installed_themes
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&settings.theme.default_theme))
            {
                problems.push(format!(
                    "{}: unknown default theme '{}'",
                    prefix, settings.theme.default_theme
                ));
            }
            if settings.payment.active_payment_method_system_names.is_empty() {
                problems.push(format!("{}: no active payment methods", prefix));
            }
        }
        problems
    }
}

/// Generate the `shop.toml` written by `shop config init`.
pub fn generate_default_config() -> String {
    r#"# Storefront configuration
#
# [defaults] applies to every store; [stores.<id>.settings] overrides it
# key by key for one store.

[defaults.catalog]
show_sku = true
show_category_product_number = true
default_page_size = 12

[defaults.shopping_cart]
mini_shopping_cart_enabled = true

[defaults.order]
anonymous_checkout_allowed = true
min_order_subtotal_cents = 0

[defaults.customer]
user_registration_type = "Standard"
password_min_length = 6

[defaults.forum]
forums_enabled = true
topics_page_size = 10
posts_page_size = 10

[defaults.tax]
tax_display_type = "ExcludingTax"
display_tax_suffix = false

[defaults.payment]
active_payment_method_system_names = ["Payments.CheckMoneyOrder", "Payments.Manual"]

[defaults.theme]
default_theme = "DefaultClean"
allow_customer_to_select_theme = true

[stores.1]
name = "Demo Store"
url = "http://localhost:8080/"
ssl_enabled = false
currency = "USD"
owner_email = "owner@demo.local"

[stores.1.settings.forum]
allow_guests_to_create_posts = false
"#
    .to_string()
}
