//! Batch ingestion of crawl-output files.
//!
//! Walks a crawl output group by group, turning each raw ad into a stored
//! Property with its Sale/Rent detail, reference rows, and downloaded
//! images. One bad ad fails alone: its error is recorded in the batch
//! report and the run moves on. Only an unreadable or unparsable input
//! file aborts the run.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use super::images::{is_map_image, ImageStore};
use crate::models::{
    AdType, CrawlOutput, DetailPrices, ListingDetail, LocationParts, NewListing, PropertyType,
    RawAdRecord, RentFields, SaleFields,
};
use crate::normalize;
use crate::repository::{DieselError, ListingRepository};

/// Why a single ad failed to ingest.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("image store error: {0}")]
    Images(#[from] std::io::Error),
}

/// Outcome of one import run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// One message per failed ad, in processing order.
    pub errors: Vec<String>,
}

/// Prefer the parsed integer, falling back to the raw text when no number
/// was recognized.
fn int_or_text(value: Option<i64>, text: Option<&str>) -> Option<String> {
    value.map(|v| v.to_string()).or_else(|| {
        text.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Amenity rows either repeat their own label («آسانسور») or say «دارد».
fn has_amenity(value: Option<&str>, token: &str) -> bool {
    matches!(value, Some(v) if v == token || v == "دارد")
}

/// Batch import service wiring the repository and the image store together.
pub struct ImportService {
    repo: ListingRepository,
    images: ImageStore,
}

impl ImportService {
    pub fn new(repo: ListingRepository, images: ImageStore) -> Self {
        Self { repo, images }
    }

    /// Import a crawl-output JSON file.
    ///
    /// Reading or parsing the file is fatal; everything past that point is
    /// reported per ad.
    pub async fn run(&self, path: &Path) -> anyhow::Result<BatchReport> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let output: CrawlOutput = serde_json::from_str(&raw)
            .with_context(|| format!("invalid crawl output in {}", path.display()))?;

        Ok(self.import(output).await)
    }

    /// Import an already-parsed crawl output.
    pub async fn import(&self, output: CrawlOutput) -> BatchReport {
        let mut report = BatchReport::default();
        let run_stamp = Utc::now().timestamp_millis();
        let mut index = 0usize;

        for (group_type, label, ads) in output.into_groups() {
            info!(
                "Importing {} {} ads from group '{}'",
                ads.len(),
                group_type.as_str(),
                label
            );

            for ad in ads {
                report.total += 1;
                // The group decides the type; a stray per-ad tag inside a
                // grouped document does not override it. Flat legacy records
                // were already grouped by their own tag.
                let ad_type = group_type;
                let mut key = format!("{}_{}", run_stamp, index);
                if ad_type == AdType::Rent {
                    key.push_str("_rent");
                }
                index += 1;

                let title = ad.title.clone();
                match self.ingest_ad(ad, ad_type, &key).await {
                    Ok(id) => {
                        report.succeeded += 1;
                        info!("Stored property {} ({})", id, title);
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!("Failed to ingest '{}': {}", title, e);
                        report.errors.push(format!("{}: {}", title, e));
                    }
                }
            }
        }

        info!(
            "Import finished: {} succeeded, {} failed of {}",
            report.succeeded, report.failed, report.total
        );
        report
    }

    /// Ingest a single ad: normalize, split the location, download photos,
    /// then write everything inside one repository transaction.
    async fn ingest_ad(
        &self,
        ad: RawAdRecord,
        ad_type: AdType,
        key: &str,
    ) -> Result<i32, IngestError> {
        let record = normalize::enrich(ad);

        let parts = LocationParts::parse(record.raw.location.as_deref().unwrap_or(""));
        let city = if parts.city.is_empty() {
            record.raw.city.clone().unwrap_or_default()
        } else {
            parts.city
        };

        let location_image = record
            .raw
            .image_links
            .iter()
            .find(|u| is_map_image(u))
            .cloned();
        // Cover candidate before any download succeeds: the first photo URL.
        let photo_links: Vec<String> = record
            .raw
            .image_links
            .iter()
            .filter(|u| !is_map_image(u))
            .cloned()
            .collect();

        let local_images = self.images.download_all(&record.raw.image_links, key).await?;
        // A downloaded local path supersedes the remote candidate as cover.
        let cover_image = local_images
            .first()
            .cloned()
            .or_else(|| photo_links.into_iter().next());

        let prices = match ad_type {
            AdType::Sale => DetailPrices::Sale(SaleFields {
                total_price: int_or_text(record.gheymat_kol_int, record.raw.gheymat_kol.as_deref()),
                price_per_meter: int_or_text(
                    record.gheymat_har_metr_int,
                    record.raw.gheymat_har_metr.as_deref(),
                ),
            }),
            AdType::Rent => DetailPrices::Rent(RentFields {
                deposit: int_or_text(record.vadie_int, record.raw.vadie.as_deref()),
                rent: int_or_text(record.ejare_int, record.raw.ejare.as_deref()),
            }),
        };

        let listing = NewListing {
            title: record.raw.title.clone(),
            metraj: int_or_text(record.metraj_int, record.raw.metraj.as_deref()),
            city,
            neighborhood: parts.neighborhood,
            street: parts.street,
            property_type: match ad_type {
                AdType::Sale => PropertyType::Sale,
                AdType::Rent => PropertyType::Rent,
            },
            cover_image,
            location_image,
            ad_link: record.raw.url.clone(),
            detail: ListingDetail {
                build_year: int_or_text(record.sal_sakht_int, record.raw.sal_sakht.as_deref()),
                rooms: int_or_text(record.otagh_int, record.raw.otagh.as_deref()),
                elevator: has_amenity(record.raw.asansor.as_deref(), "آسانسور"),
                parking: has_amenity(record.raw.parking.as_deref(), "پارکینگ"),
                storage: has_amenity(record.raw.anbari.as_deref(), "انباری"),
                description: record
                    .raw
                    .tozihat
                    .clone()
                    .filter(|s| !s.trim().is_empty()),
                // Stored as extracted, map render included.
                image_links: record.raw.image_links.clone(),
                local_images,
                prices,
            },
        };

        Ok(self.repo.ingest_listing(&listing).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{run_migrations, AsyncSqlitePool};
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_int_or_text_prefers_parsed_value() {
        assert_eq!(int_or_text(Some(80), Some("۸۰ متر")), Some("80".to_string()));
        assert_eq!(
            int_or_text(None, Some("قابل مذاکره")),
            Some("قابل مذاکره".to_string())
        );
        assert_eq!(int_or_text(None, Some("  ")), None);
        assert_eq!(int_or_text(None, None), None);
    }

    #[test]
    fn test_has_amenity_accepts_label_or_daarad() {
        assert!(has_amenity(Some("آسانسور"), "آسانسور"));
        assert!(has_amenity(Some("دارد"), "آسانسور"));
        assert!(!has_amenity(Some("ندارد"), "آسانسور"));
        assert!(!has_amenity(None, "آسانسور"));
    }

    async fn test_service(dir: &Path) -> ImportService {
        let db_path = dir.join("test.db");
        run_migrations(&db_path.display().to_string())
            .await
            .unwrap();
        let repo = ListingRepository::new(AsyncSqlitePool::from_path(&db_path));
        let images = ImageStore::new(dir.join("images"), Duration::from_secs(1));
        ImportService::new(repo, images)
    }

    fn map_only_ad(title: &str) -> RawAdRecord {
        RawAdRecord {
            title: title.to_string(),
            location: Some("آپارتمان در تهران، ونک".to_string()),
            image_links: vec!["https://api.divar.ir/v8/mapimage?lat=1&lng=2".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_import_ad_with_only_map_image() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let output = CrawlOutput::Flat(vec![map_only_ad("آگهی")]);
        let report = service.import(output).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);

        let property = service.repo.get_property(1).await.unwrap().unwrap();
        assert!(property.cover_image.is_none());
        assert_eq!(
            property.location_image.as_deref(),
            Some("https://api.divar.ir/v8/mapimage?lat=1&lng=2")
        );
    }

    #[tokio::test]
    async fn test_one_bad_ad_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        run_migrations(&db_path.display().to_string())
            .await
            .unwrap();
        let repo = ListingRepository::new(AsyncSqlitePool::from_path(&db_path));

        // A plain file where the images root should be makes every photo
        // download fail at create_dir_all.
        let images_root = dir.path().join("images");
        std::fs::write(&images_root, b"blocked").unwrap();
        let service = ImportService::new(
            repo,
            ImageStore::new(&images_root, Duration::from_secs(1)),
        );

        let mut with_photo = map_only_ad("خراب");
        with_photo.image_links = vec!["https://s100.divarcdn.com/static/a.jpg".to_string()];

        let output = CrawlOutput::Flat(vec![with_photo, map_only_ad("سالم")]);
        let report = service.import(output).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("خراب"));
    }

    #[tokio::test]
    async fn test_run_fails_on_unparsable_file() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let bad = dir.path().join("ads.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(service.run(&bad).await.is_err());

        let missing = dir.path().join("nope.json");
        assert!(service.run(&missing).await.is_err());
    }
}
