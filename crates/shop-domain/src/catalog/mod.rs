//! Catalog types: products, categories, manufacturers and their satellites.

mod attribute;
mod category;
mod inventory;
mod manufacturer;
mod picture;
mod product;
mod review;
mod specification;

pub use attribute::{AttributeControlType, ProductAttributeMapping, ProductAttributeValue};
pub use category::Category;
pub use inventory::{InventoryLevel, LowStockActivity};
pub use manufacturer::Manufacturer;
pub use picture::Picture;
pub use product::{Product, TierPrice};
pub use review::{ProductReview, ReviewHelpfulness};
pub use specification::{ProductSpecification, SpecificationAttribute, SpecificationOption};
