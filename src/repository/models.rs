//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.
//! Timestamps are RFC 3339 text, booleans are integers, and image lists are
//! JSON-encoded text, matching the sqlite schema.

use diesel::prelude::*;

use crate::schema;

/// City record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::cities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CityRecord {
    pub id: i32,
    pub name: String,
    pub created_at: String,
}

/// New city for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::cities)]
pub struct NewCity<'a> {
    pub name: &'a str,
    pub created_at: &'a str,
}

/// Neighborhood record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::neighborhoods)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NeighborhoodRecord {
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub created_at: String,
}

/// New neighborhood for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::neighborhoods)]
pub struct NewNeighborhood<'a> {
    pub name: &'a str,
    pub city_id: i32,
    pub created_at: &'a str,
}

/// Property record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::properties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PropertyRecord {
    pub id: i32,
    pub title: String,
    pub metraj: Option<String>,
    pub city_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
    pub location: Option<String>,
    pub property_type: String,
    pub cover_image: Option<String>,
    pub location_image: Option<String>,
    pub ad_link: Option<String>,
    pub created_at: String,
}

/// New property for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::properties)]
pub struct NewProperty<'a> {
    pub title: &'a str,
    pub metraj: Option<&'a str>,
    pub city_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
    pub location: Option<&'a str>,
    pub property_type: &'a str,
    pub cover_image: Option<&'a str>,
    pub location_image: Option<&'a str>,
    pub ad_link: Option<&'a str>,
    pub created_at: &'a str,
}

/// Sale detail record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sale_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleDetailRecord {
    pub id: i32,
    pub property_id: i32,
    pub build_year: Option<String>,
    pub rooms: Option<String>,
    pub total_price: Option<String>,
    pub price_per_meter: Option<String>,
    pub elevator: i32,
    pub parking: i32,
    pub storage: i32,
    pub description: Option<String>,
    pub image_links: String,
    pub local_images: String,
    pub created_at: String,
}

/// New sale detail for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sale_details)]
pub struct NewSaleDetail<'a> {
    pub property_id: i32,
    pub build_year: Option<&'a str>,
    pub rooms: Option<&'a str>,
    pub total_price: Option<&'a str>,
    pub price_per_meter: Option<&'a str>,
    pub elevator: i32,
    pub parking: i32,
    pub storage: i32,
    pub description: Option<&'a str>,
    pub image_links: &'a str,
    pub local_images: &'a str,
    pub created_at: &'a str,
}

/// Rent detail record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::rent_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RentDetailRecord {
    pub id: i32,
    pub property_id: i32,
    pub build_year: Option<String>,
    pub rooms: Option<String>,
    pub deposit: Option<String>,
    pub rent: Option<String>,
    pub elevator: i32,
    pub parking: i32,
    pub storage: i32,
    pub description: Option<String>,
    pub image_links: String,
    pub local_images: String,
    pub created_at: String,
}

/// New rent detail for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::rent_details)]
pub struct NewRentDetail<'a> {
    pub property_id: i32,
    pub build_year: Option<&'a str>,
    pub rooms: Option<&'a str>,
    pub deposit: Option<&'a str>,
    pub rent: Option<&'a str>,
    pub elevator: i32,
    pub parking: i32,
    pub storage: i32,
    pub description: Option<&'a str>,
    pub image_links: &'a str,
    pub local_images: &'a str,
    pub created_at: &'a str,
}
