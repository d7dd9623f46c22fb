//! Specification attributes (comparison-table facts like "Screen: 15 in").

use crate::ids::{ProductId, SpecAttributeId, SpecOptionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecificationOption {
    pub id: SpecOptionId,
    pub name: String,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecificationAttribute {
    pub id: SpecAttributeId,
    pub name: String,
    pub display_order: i32,
    pub options: Vec<SpecificationOption>,
}

impl SpecificationAttribute {
    pub fn option(&self, id: SpecOptionId) -> Option<&SpecificationOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// A product's value for a specification attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSpecification {
    pub product_id: ProductId,
    pub attribute_id: SpecAttributeId,
    pub option_id: SpecOptionId,
    /// Overrides the option name when present.
    pub custom_value: Option<String>,
    pub allow_filtering: bool,
    pub show_on_product_page: bool,
    pub display_order: i32,
}
