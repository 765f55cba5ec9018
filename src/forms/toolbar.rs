//! Forms posted by the list toolbar.

use serde::Deserialize;

use crate::forms::deserialize_checkbox;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct FavouritesForm {
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub favorites_only: bool,
}
