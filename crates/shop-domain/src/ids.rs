//! Newtype IDs for type-safe identifiers.
//!
//! Entities are keyed by positive integers assigned by the store. Newtypes
//! keep a `ProductId` from being passed where a `CategoryId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A numeric identifier.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an ID from its numeric value.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the numeric value.
            pub const fn value(&self) -> u64 {
                self.0
            }

            /// Whether this ID refers to a stored entity (zero means unsaved).
            pub const fn is_set(&self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| DomainError::InvalidId(s.to_string()))
            }
        }
    };
}

define_id!(StoreId);
define_id!(ProductId);
define_id!(CategoryId);
define_id!(ManufacturerId);
define_id!(PictureId);
define_id!(ReviewId);
define_id!(SpecAttributeId);
define_id!(SpecOptionId);
define_id!(AttributeMappingId);
define_id!(AttributeValueId);
define_id!(CustomerId);
define_id!(AddressId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(DiscountId);
define_id!(GiftCardId);
define_id!(ForumGroupId);
define_id!(ForumId);
define_id!(TopicId);
define_id!(PostId);
define_id!(SubscriptionId);
define_id!(TaxCategoryId);
