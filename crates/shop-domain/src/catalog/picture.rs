use crate::ids::PictureId;
use serde::{Deserialize, Serialize};

/// Stored image metadata. Binary content lives outside the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Picture {
    pub id: PictureId,
    pub mime_type: String,
    /// File name stem used when building thumbnail URLs.
    pub seo_filename: String,
    pub alt_attribute: Option<String>,
    pub title_attribute: Option<String>,
}

impl Picture {
    /// File extension for the stored MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpeg",
        }
    }
}
