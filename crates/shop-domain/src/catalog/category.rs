//! Category tree nodes.

use crate::ids::{CategoryId, PictureId, StoreId};
use serde::{Deserialize, Serialize};

/// A catalog category. The tree is expressed through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    pub picture_id: Option<PictureId>,
    pub page_size: usize,
    pub published: bool,
    pub deleted: bool,
    pub display_order: i32,
    pub limited_to_stores: Vec<StoreId>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            parent_id: None,
            picture_id: None,
            page_size: 12,
            published: true,
            deleted: false,
            display_order: 0,
            limited_to_stores: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }

    pub fn is_visible(&self, store_id: StoreId) -> bool {
        self.published
            && !self.deleted
            && (self.limited_to_stores.is_empty() || self.limited_to_stores.contains(&store_id))
    }
}
