//! Product attributes (size, color, engraving text).

use crate::ids::{AttributeMappingId, AttributeValueId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// How an attribute is presented and what a selection looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeControlType {
    DropdownList,
    RadioList,
    Checkboxes,
    TextBox,
    MultilineTextbox,
}

impl AttributeControlType {
    /// Whether selections are value ids rather than free text.
    pub fn has_values(&self) -> bool {
        matches!(
            self,
            AttributeControlType::DropdownList
                | AttributeControlType::RadioList
                | AttributeControlType::Checkboxes
        )
    }

    /// Whether more than one value may be selected.
    pub fn allows_multiple(&self) -> bool {
        matches!(self, AttributeControlType::Checkboxes)
    }
}

/// A selectable value of a product attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAttributeValue {
    pub id: AttributeValueId,
    pub name: String,
    /// Added to the unit price when selected.
    pub price_adjustment: Money,
    /// Added to the product weight when selected.
    pub weight_adjustment: f64,
    pub is_preselected: bool,
    pub display_order: i32,
}

/// An attribute attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAttributeMapping {
    pub id: AttributeMappingId,
    pub name: String,
    pub text_prompt: Option<String>,
    pub is_required: bool,
    pub control_type: AttributeControlType,
    pub display_order: i32,
    pub values: Vec<ProductAttributeValue>,
}

impl ProductAttributeMapping {
    pub fn value(&self, id: AttributeValueId) -> Option<&ProductAttributeValue> {
        self.values.iter().find(|v| v.id == id)
    }
}
