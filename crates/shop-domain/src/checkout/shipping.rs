use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A shipping rate offered for a cart and destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingOption {
    pub name: String,
    pub description: Option<String>,
    pub rate: Money,
    /// Provider that quoted the rate.
    pub provider_system_name: String,
}

impl ShippingOption {
    /// Form value identifying this option, `"{name}___{provider}"`.
    pub fn form_value(&self) -> String {
        format!("{}___{}", self.name, self.provider_system_name)
    }

    /// Split a submitted form value into `(name, provider)`.
    pub fn parse_form_value(value: &str) -> Option<(&str, &str)> {
        let (name, provider) = value.split_once("___")?;
        if name.is_empty() || provider.is_empty() {
            return None;
        }
        Some((name, provider))
    }
}
