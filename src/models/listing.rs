//! Relational domain models: properties, details, and location references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Property kind as stored in the `type` column.
///
/// Only sale and rent listings come out of the crawler; land and partnership
/// rows exist for externally managed listings and carry no detail row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Sale,
    Rent,
    Land,
    Partnership,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Sale => "sale",
            PropertyType::Rent => "rent",
            PropertyType::Land => "land",
            PropertyType::Partnership => "partnership",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(PropertyType::Sale),
            "rent" => Some(PropertyType::Rent),
            "land" => Some(PropertyType::Land),
            "partnership" => Some(PropertyType::Partnership),
            _ => None,
        }
    }
}

/// A city reference row. Names are unique; rows are created lazily during
/// ingestion and never updated by the pipeline.
#[derive(Debug, Clone)]
pub struct City {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A neighborhood reference row, unique per `(name, city_id)`.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Sale-specific price fields, display-formatted.
#[derive(Debug, Clone, Default)]
pub struct SaleFields {
    pub total_price: Option<String>,
    pub price_per_meter: Option<String>,
}

/// Rent-specific price fields, display-formatted.
#[derive(Debug, Clone, Default)]
pub struct RentFields {
    pub deposit: Option<String>,
    pub rent: Option<String>,
}

/// The detail row accompanying a property, shaped by its ad type.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub build_year: Option<String>,
    pub rooms: Option<String>,
    pub elevator: bool,
    pub parking: bool,
    pub storage: bool,
    pub description: Option<String>,
    /// Original source URLs, map image included.
    pub image_links: Vec<String>,
    /// Relative paths of images downloaded to the public image root.
    pub local_images: Vec<String>,
    pub prices: DetailPrices,
}

/// Price fields split by ad type.
#[derive(Debug, Clone)]
pub enum DetailPrices {
    Sale(SaleFields),
    Rent(RentFields),
}

/// A fully assembled listing, ready for one transactional write.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub metraj: Option<String>,
    pub city: String,
    pub neighborhood: String,
    /// Street text from the parsed location; stored as the property's
    /// `location` column.
    pub street: String,
    pub property_type: PropertyType,
    pub cover_image: Option<String>,
    pub location_image: Option<String>,
    pub ad_link: Option<String>,
    pub detail: ListingDetail,
}
