use serde::{Deserialize, Serialize};

use crate::deserialize_disallow_empty_string::disallow_empty_string;

/// A single catalog listing. Two entries with the same fields are
/// indistinguishable, the catalog does not guarantee uniqueness.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductEntry {
    pub title: String,
    pub price: String,
    #[serde(deserialize_with = "disallow_empty_string")]
    pub url: String,
}

impl ProductEntry {
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            url: url.into(),
        }
    }
}
