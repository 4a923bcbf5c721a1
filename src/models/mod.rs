//! Data models for melkacquire.

mod ad;
mod listing;

pub use ad::{AdGroups, AdType, CrawlOutput, LocationParts, NormalizedAdRecord, RawAdRecord};
pub use listing::{
    City, DetailPrices, ListingDetail, Neighborhood, NewListing, PropertyType, RentFields,
    SaleFields,
};
