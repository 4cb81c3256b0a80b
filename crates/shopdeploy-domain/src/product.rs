//! Product catalog types.

use serde::{Deserialize, Serialize};

use crate::pagination::Sort;

/// Sort order for the `GET /products` listing endpoint.
///
/// Requires a custom `Deserialize` impl because the wire format is a single
/// hyphenated string (e.g. `"price-asc"`) rather than a nested enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortBy {
    CreatedAt(Sort),
    Price(Sort),
    Title(Sort),
    RatingDesc,
}

impl Default for ProductSortBy {
    fn default() -> Self {
        Self::CreatedAt(Sort::Desc)
    }
}

const SORT_VARIANTS: &[&str] = &[
    "created-at-desc",
    "created-at-asc",
    "price-asc",
    "price-desc",
    "title-asc",
    "title-desc",
    "rating-desc",
];

impl<'de> Deserialize<'de> for ProductSortBy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "created-at-desc" => Ok(Self::CreatedAt(Sort::Desc)),
            "created-at-asc" => Ok(Self::CreatedAt(Sort::Asc)),
            "price-asc" => Ok(Self::Price(Sort::Asc)),
            "price-desc" => Ok(Self::Price(Sort::Desc)),
            "title-asc" => Ok(Self::Title(Sort::Asc)),
            "title-desc" => Ok(Self::Title(Sort::Desc)),
            "rating-desc" => Ok(Self::RatingDesc),
            other => Err(serde::de::Error::unknown_variant(other, SORT_VARIANTS)),
        }
    }
}

impl Serialize for ProductSortBy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::CreatedAt(Sort::Desc) => "created-at-desc",
            Self::CreatedAt(Sort::Asc) => "created-at-asc",
            Self::Price(Sort::Asc) => "price-asc",
            Self::Price(Sort::Desc) => "price-desc",
            Self::Title(Sort::Asc) => "title-asc",
            Self::Title(Sort::Desc) => "title-desc",
            Self::RatingDesc => "rating-desc",
        };
        serializer.serialize_str(s)
    }
}

/// Image reference attached to a product. Uploading is handled elsewhere;
/// the catalog only stores the hosted URL and the storage provider's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}
