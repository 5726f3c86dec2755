//! Catalog (static-reports search) response model.

use serde::Deserialize;
use snafu::ResultExt;

use crate::providers::{CatalogDecodeSnafu, FetchError};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    #[serde(rename = "ResourceName")]
    pub resource_name: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogResponse {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl CatalogResponse {
    /// Decodes a catalog body. `url` is only used for the error message.
    pub fn from_slice(url: &str, body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).context(CatalogDecodeSnafu { url })
    }

    /// Published document names, skipping blank entries.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .map(|item| item.resource_name.trim())
            .filter(|name| !name.is_empty())
    }
}
