use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeModel {
    pub name: String,
    pub title: String,
    pub preview_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSelectorModel {
    pub available_themes: Vec<ThemeModel>,
    pub current_theme: Option<ThemeModel>,
}
