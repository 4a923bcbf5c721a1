//! Diesel-based listing repository for SQLite.
//!
//! Owns every write the ingestion pipeline performs: lazy resolve-or-create
//! of City/Neighborhood reference rows and the transactional Property +
//! detail insert. Reads are limited to what the CLI status view and tests
//! need.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{
    CityRecord, NeighborhoodRecord, NewCity, NewNeighborhood, NewProperty, NewRentDetail,
    NewSaleDetail, PropertyRecord, RentDetailRecord, SaleDetailRecord,
};
use super::pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
use super::parse_datetime;
use crate::models::{City, DetailPrices, Neighborhood, NewListing};
use crate::schema::{cities, neighborhoods, properties, rent_details, sale_details};

diesel::define_sql_function! {
    /// SQLite rowid of the most recent INSERT on this connection.
    fn last_insert_rowid() -> diesel::sql_types::Integer;
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City {
            id: record.id,
            name: record.name,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

impl From<NeighborhoodRecord> for Neighborhood {
    fn from(record: NeighborhoodRecord) -> Self {
        Neighborhood {
            id: record.id,
            name: record.name,
            city_id: record.city_id,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Resolve a city id by exact name, creating the row on first encounter.
///
/// Empty names resolve to `None` without touching the database.
async fn resolve_city(
    conn: &mut AsyncSqliteConnection,
    name: &str,
) -> Result<Option<i32>, DieselError> {
    if name.is_empty() {
        return Ok(None);
    }

    let existing: Option<CityRecord> = cities::table
        .filter(cities::name.eq(name))
        .select(CityRecord::as_select())
        .first(conn)
        .await
        .optional()?;

    if let Some(city) = existing {
        return Ok(Some(city.id));
    }

    let created_at = Utc::now().to_rfc3339();
    diesel::insert_into(cities::table)
        .values(NewCity {
            name,
            created_at: &created_at,
        })
        .execute(conn)
        .await?;

    let id: i32 = diesel::select(last_insert_rowid()).get_result(conn).await?;
    tracing::info!("new city added: {}", name);
    Ok(Some(id))
}

/// Resolve a neighborhood id by `(name, city_id)`, creating on first
/// encounter. Requires a resolved city; returns `None` otherwise.
async fn resolve_neighborhood(
    conn: &mut AsyncSqliteConnection,
    name: &str,
    city_id: Option<i32>,
) -> Result<Option<i32>, DieselError> {
    let Some(city_id) = city_id else {
        return Ok(None);
    };
    if name.is_empty() {
        return Ok(None);
    }

    let existing: Option<NeighborhoodRecord> = neighborhoods::table
        .filter(neighborhoods::name.eq(name))
        .filter(neighborhoods::city_id.eq(city_id))
        .select(NeighborhoodRecord::as_select())
        .first(conn)
        .await
        .optional()?;

    if let Some(neighborhood) = existing {
        return Ok(Some(neighborhood.id));
    }

    let created_at = Utc::now().to_rfc3339();
    diesel::insert_into(neighborhoods::table)
        .values(NewNeighborhood {
            name,
            city_id,
            created_at: &created_at,
        })
        .execute(conn)
        .await?;

    let id: i32 = diesel::select(last_insert_rowid()).get_result(conn).await?;
    tracing::info!("new neighborhood added: {}", name);
    Ok(Some(id))
}

/// Diesel-based listing repository.
#[derive(Clone)]
pub struct ListingRepository {
    pool: AsyncSqlitePool,
}

impl ListingRepository {
    /// Create a new listing repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a city by exact name.
    pub async fn get_city_by_name(&self, name: &str) -> Result<Option<City>, DieselError> {
        let mut conn = self.pool.get().await?;

        cities::table
            .filter(cities::name.eq(name))
            .select(CityRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(City::from))
    }

    /// Resolve-or-create a city outside of a listing transaction.
    pub async fn find_or_create_city(&self, name: &str) -> Result<Option<City>, DieselError> {
        let mut conn = self.pool.get().await?;
        match resolve_city(&mut conn, name).await? {
            Some(id) => {
                let record: CityRecord = cities::table.find(id).first(&mut conn).await?;
                Ok(Some(record.into()))
            }
            None => Ok(None),
        }
    }

    /// Resolve-or-create a neighborhood outside of a listing transaction.
    pub async fn find_or_create_neighborhood(
        &self,
        name: &str,
        city_id: i32,
    ) -> Result<Option<Neighborhood>, DieselError> {
        let mut conn = self.pool.get().await?;
        match resolve_neighborhood(&mut conn, name, Some(city_id)).await? {
            Some(id) => {
                let record: NeighborhoodRecord =
                    neighborhoods::table.find(id).first(&mut conn).await?;
                Ok(Some(record.into()))
            }
            None => Ok(None),
        }
    }

    /// Persist one listing: resolve City/Neighborhood and insert the
    /// Property plus its Sale/Rent detail inside a single transaction, so a
    /// failed ad leaves no orphaned rows.
    ///
    /// Returns the new property id.
    pub async fn ingest_listing(&self, listing: &NewListing) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                let city_id = resolve_city(conn, &listing.city).await?;
                let neighborhood_id =
                    resolve_neighborhood(conn, &listing.neighborhood, city_id).await?;

                let created_at = Utc::now().to_rfc3339();
                let street = (!listing.street.is_empty()).then_some(listing.street.as_str());

                diesel::insert_into(properties::table)
                    .values(NewProperty {
                        title: &listing.title,
                        metraj: listing.metraj.as_deref(),
                        city_id,
                        neighborhood_id,
                        location: street,
                        property_type: listing.property_type.as_str(),
                        cover_image: listing.cover_image.as_deref(),
                        location_image: listing.location_image.as_deref(),
                        ad_link: listing.ad_link.as_deref(),
                        created_at: &created_at,
                    })
                    .execute(conn)
                    .await?;

                let property_id: i32 =
                    diesel::select(last_insert_rowid()).get_result(conn).await?;

                let detail = &listing.detail;
                let image_links = serde_json::to_string(&detail.image_links)
                    .unwrap_or_else(|_| "[]".to_string());
                let local_images = serde_json::to_string(&detail.local_images)
                    .unwrap_or_else(|_| "[]".to_string());

                match &detail.prices {
                    DetailPrices::Sale(prices) => {
                        diesel::insert_into(sale_details::table)
                            .values(NewSaleDetail {
                                property_id,
                                build_year: detail.build_year.as_deref(),
                                rooms: detail.rooms.as_deref(),
                                total_price: prices.total_price.as_deref(),
                                price_per_meter: prices.price_per_meter.as_deref(),
                                elevator: detail.elevator as i32,
                                parking: detail.parking as i32,
                                storage: detail.storage as i32,
                                description: detail.description.as_deref(),
                                image_links: &image_links,
                                local_images: &local_images,
                                created_at: &created_at,
                            })
                            .execute(conn)
                            .await?;
                    }
                    DetailPrices::Rent(prices) => {
                        diesel::insert_into(rent_details::table)
                            .values(NewRentDetail {
                                property_id,
                                build_year: detail.build_year.as_deref(),
                                rooms: detail.rooms.as_deref(),
                                deposit: prices.deposit.as_deref(),
                                rent: prices.rent.as_deref(),
                                elevator: detail.elevator as i32,
                                parking: detail.parking as i32,
                                storage: detail.storage as i32,
                                description: detail.description.as_deref(),
                                image_links: &image_links,
                                local_images: &local_images,
                                created_at: &created_at,
                            })
                            .execute(conn)
                            .await?;
                    }
                }

                Ok(property_id)
            })
        })
        .await
    }

    /// Get a property by id.
    pub async fn get_property(&self, id: i32) -> Result<Option<PropertyRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        properties::table
            .find(id)
            .select(PropertyRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
    }

    /// Get the sale detail for a property.
    pub async fn get_sale_detail(
        &self,
        property_id: i32,
    ) -> Result<Option<SaleDetailRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        sale_details::table
            .filter(sale_details::property_id.eq(property_id))
            .select(SaleDetailRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
    }

    /// Get the rent detail for a property.
    pub async fn get_rent_detail(
        &self,
        property_id: i32,
    ) -> Result<Option<RentDetailRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        rent_details::table
            .filter(rent_details::property_id.eq(property_id))
            .select(RentDetailRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
    }

    /// Row counts for the status view: (cities, neighborhoods, properties,
    /// sale details, rent details).
    pub async fn counts(&self) -> Result<(i64, i64, i64, i64, i64), DieselError> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;

        let cities: i64 = cities::table.select(count_star()).first(&mut conn).await?;
        let neighborhoods: i64 = neighborhoods::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        let properties: i64 = properties::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        let sale_details: i64 = sale_details::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        let rent_details: i64 = rent_details::table
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok((cities, neighborhoods, properties, sale_details, rent_details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingDetail, PropertyType, RentFields, SaleFields};
    use diesel_async::SimpleAsyncConnection;
    use tempfile::tempdir;

    const SCHEMA_SQL: &str =
        include_str!("../../migrations/sqlite/2025-08-10-000000_initial_schema/up.sql");

    async fn setup_test_db() -> (AsyncSqlitePool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = AsyncSqlitePool::from_path(&db_path);
        let mut conn = pool.get().await.unwrap();
        conn.batch_execute(SCHEMA_SQL).await.unwrap();

        (pool, dir)
    }

    fn sale_listing(title: &str, city: &str, neighborhood: &str) -> NewListing {
        NewListing {
            title: title.to_string(),
            metraj: Some("80".to_string()),
            city: city.to_string(),
            neighborhood: neighborhood.to_string(),
            street: "خیابان اول".to_string(),
            property_type: PropertyType::Sale,
            cover_image: None,
            location_image: None,
            ad_link: None,
            detail: ListingDetail {
                build_year: Some("1395".to_string()),
                rooms: Some("2".to_string()),
                elevator: true,
                parking: false,
                storage: true,
                description: Some("توضیحات".to_string()),
                image_links: vec!["https://example.com/a.jpg".to_string()],
                local_images: vec![],
                prices: DetailPrices::Sale(SaleFields {
                    total_price: Some("2500000000".to_string()),
                    price_per_meter: Some("31250000".to_string()),
                }),
            },
        }
    }

    #[tokio::test]
    async fn test_find_or_create_city_is_idempotent() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        let first = repo.find_or_create_city("تهران").await.unwrap().unwrap();
        let second = repo.find_or_create_city("تهران").await.unwrap().unwrap();
        assert_eq!(first.id, second.id);

        let (cities, ..) = repo.counts().await.unwrap();
        assert_eq!(cities, 1);
    }

    #[tokio::test]
    async fn test_find_or_create_city_skips_empty_name() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        assert!(repo.find_or_create_city("").await.unwrap().is_none());
        let (cities, ..) = repo.counts().await.unwrap();
        assert_eq!(cities, 0);
    }

    #[tokio::test]
    async fn test_neighborhood_unique_per_city() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        let tehran = repo.find_or_create_city("تهران").await.unwrap().unwrap();
        let karaj = repo.find_or_create_city("کرج").await.unwrap().unwrap();

        let a = repo
            .find_or_create_neighborhood("ونک", tehran.id)
            .await
            .unwrap()
            .unwrap();
        let b = repo
            .find_or_create_neighborhood("ونک", tehran.id)
            .await
            .unwrap()
            .unwrap();
        let c = repo
            .find_or_create_neighborhood("ونک", karaj.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);

        let (_, neighborhoods, ..) = repo.counts().await.unwrap();
        assert_eq!(neighborhoods, 2);
    }

    #[tokio::test]
    async fn test_ingest_sale_listing() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        let id = repo
            .ingest_listing(&sale_listing("آپارتمان ۸۰ متری", "تهران", "نیاوران"))
            .await
            .unwrap();

        let property = repo.get_property(id).await.unwrap().unwrap();
        assert_eq!(property.property_type, "sale");
        assert_eq!(property.metraj.as_deref(), Some("80"));
        assert_eq!(property.location.as_deref(), Some("خیابان اول"));
        assert!(property.city_id.is_some());
        assert!(property.neighborhood_id.is_some());

        let detail = repo.get_sale_detail(id).await.unwrap().unwrap();
        assert_eq!(detail.total_price.as_deref(), Some("2500000000"));
        assert_eq!(detail.elevator, 1);
        assert_eq!(detail.parking, 0);

        let links: Vec<String> = serde_json::from_str(&detail.image_links).unwrap();
        assert_eq!(links, vec!["https://example.com/a.jpg".to_string()]);

        assert!(repo.get_rent_detail(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_rent_listing() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        let mut listing = sale_listing("سوئیت اجاره‌ای", "کرج", "گوهردشت");
        listing.property_type = PropertyType::Rent;
        listing.detail.prices = DetailPrices::Rent(RentFields {
            deposit: Some("500000000".to_string()),
            rent: Some("25000000".to_string()),
        });

        let id = repo.ingest_listing(&listing).await.unwrap();

        let property = repo.get_property(id).await.unwrap().unwrap();
        assert_eq!(property.property_type, "rent");

        let detail = repo.get_rent_detail(id).await.unwrap().unwrap();
        assert_eq!(detail.deposit.as_deref(), Some("500000000"));
        assert_eq!(detail.rent.as_deref(), Some("25000000"));
        assert!(repo.get_sale_detail(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reingesting_creates_new_property_but_no_new_references() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ListingRepository::new(pool);

        let listing = sale_listing("آگهی", "تهران", "ونک");
        let first = repo.ingest_listing(&listing).await.unwrap();
        let second = repo.ingest_listing(&listing).await.unwrap();
        assert_ne!(first, second);

        let (cities, neighborhoods, properties, ..) = repo.counts().await.unwrap();
        assert_eq!(cities, 1);
        assert_eq!(neighborhoods, 1);
        assert_eq!(properties, 2);
    }
}
