use crate::ids::{ManufacturerId, PictureId, StoreId};
use serde::{Deserialize, Serialize};

/// A product brand or maker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub description: String,
    pub picture_id: Option<PictureId>,
    pub published: bool,
    pub deleted: bool,
    pub display_order: i32,
    pub limited_to_stores: Vec<StoreId>,
}

impl Manufacturer {
    pub fn new(id: ManufacturerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            picture_id: None,
            published: true,
            deleted: false,
            display_order: 0,
            limited_to_stores: Vec::new(),
        }
    }

    pub fn is_visible(&self, store_id: StoreId) -> bool {
        self.published
            && !self.deleted
            && (self.limited_to_stores.is_empty() || self.limited_to_stores.contains(&store_id))
    }
}
