//! Raw and normalized ad records as produced by the crawler.
//!
//! Field names mirror the crawl-output JSON, which uses Persian terms in
//! camelCase (`gheymatKol` = total price, `vadie` = deposit, and so on).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Classification of a listing, decided once during extraction and consumed
/// everywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Sale,
    Rent,
}

impl AdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdType::Sale => "sale",
            AdType::Rent => "rent",
        }
    }
}

/// One listing's raw extracted text fields.
///
/// Everything except the title is optional: listing pages routinely omit
/// rows, and the extractor records exactly what it saw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAdRecord {
    pub title: String,
    pub metraj: Option<String>,
    pub sal_sakht: Option<String>,
    pub otagh: Option<String>,
    pub tabaghe: Option<String>,
    pub vadie: Option<String>,
    pub ejare: Option<String>,
    pub gheymat_kol: Option<String>,
    pub gheymat_har_metr: Option<String>,
    pub asansor: Option<String>,
    pub parking: Option<String>,
    pub anbari: Option<String>,
    pub tozihat: Option<String>,
    pub location: Option<String>,
    pub image_links: Vec<String>,
    pub ghabele_tabdil: bool,
    pub url: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub ad_type: Option<AdType>,
}

/// Raw record plus integer siblings for its numeric fields.
///
/// Serialization flattens back into the raw shape, so a normalized file is a
/// strict superset of the raw one. Integer fields are omitted (not null)
/// when the source text was absent or carried no number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAdRecord {
    #[serde(flatten)]
    pub raw: RawAdRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vadie_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ejare_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gheymat_kol_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gheymat_har_metr_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metraj_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sal_sakht_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otagh_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabaghe_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabaghe_current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabaghe_total: Option<i64>,
}

/// City/neighborhood/street split out of a listing's free-text location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationParts {
    pub city: String,
    pub neighborhood: String,
    pub street: String,
}

impl LocationParts {
    /// Split a location string of the shape
    /// `"... در <city>، <neighborhood>، <street>"`.
    ///
    /// Malformed or short strings degrade to empty parts rather than
    /// failing; only the segment after the first « در » is inspected.
    pub fn parse(location: &str) -> Self {
        let mut segments = location.split(" در ");
        segments.next();
        let Some(rest) = segments.next() else {
            return Self::default();
        };

        let mut parts = rest.split('،').map(str::trim);
        Self {
            city: parts.next().unwrap_or("").to_string(),
            neighborhood: parts.next().unwrap_or("").to_string(),
            street: parts.next().unwrap_or("").to_string(),
        }
    }
}

/// City-labelled ad groups in the order the document lists them.
pub type AdGroups = Vec<(String, Vec<RawAdRecord>)>;

/// Deserialize a JSON map of city labels into an order-preserving Vec, so
/// groups import in file order rather than sorted by label.
fn ordered_groups<'de, D>(deserializer: D) -> Result<AdGroups, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = AdGroups;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of city labels to ad lists")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = AdGroups::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                groups.push(entry);
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_map(GroupsVisitor)
}

/// A crawl-output document: either grouped by ad type and city label, or the
/// legacy flat array of records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CrawlOutput {
    Grouped {
        #[serde(default, deserialize_with = "ordered_groups")]
        sale: AdGroups,
        #[serde(default, deserialize_with = "ordered_groups")]
        rent: AdGroups,
    },
    Flat(Vec<RawAdRecord>),
}

impl CrawlOutput {
    /// Flatten into processing order: sale groups first, then rent groups,
    /// each in the order the document lists them. Flat legacy records are
    /// grouped by their own `adType` (defaulting to sale).
    pub fn into_groups(self) -> Vec<(AdType, String, Vec<RawAdRecord>)> {
        match self {
            CrawlOutput::Grouped { sale, rent } => {
                let mut groups = Vec::with_capacity(sale.len() + rent.len());
                for (label, ads) in sale {
                    groups.push((AdType::Sale, label, ads));
                }
                for (label, ads) in rent {
                    groups.push((AdType::Rent, label, ads));
                }
                groups
            }
            CrawlOutput::Flat(ads) => {
                let mut sale = Vec::new();
                let mut rent = Vec::new();
                for ad in ads {
                    match ad.ad_type.unwrap_or(AdType::Sale) {
                        AdType::Sale => sale.push(ad),
                        AdType::Rent => rent.push(ad),
                    }
                }
                let mut groups = Vec::new();
                if !sale.is_empty() {
                    groups.push((AdType::Sale, "legacy".to_string(), sale));
                }
                if !rent.is_empty() {
                    groups.push((AdType::Rent, "legacy".to_string(), rent));
                }
                groups
            }
        }
    }

    /// Total number of ads across all groups.
    pub fn total_ads(&self) -> usize {
        match self {
            CrawlOutput::Grouped { sale, rent } => sale
                .iter()
                .chain(rent.iter())
                .map(|(_, ads)| ads.len())
                .sum(),
            CrawlOutput::Flat(ads) => ads.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_full() {
        let parts = LocationParts::parse("آپارتمان در تهران، نیاوران، خیابان فلان");
        assert_eq!(parts.city, "تهران");
        assert_eq!(parts.neighborhood, "نیاوران");
        assert_eq!(parts.street, "خیابان فلان");
    }

    #[test]
    fn test_parse_location_short() {
        let parts = LocationParts::parse("آپارتمان در کرج");
        assert_eq!(parts.city, "کرج");
        assert_eq!(parts.neighborhood, "");
        assert_eq!(parts.street, "");
    }

    #[test]
    fn test_parse_location_malformed() {
        assert_eq!(LocationParts::parse(""), LocationParts::default());
        assert_eq!(LocationParts::parse("بدون جداکننده"), LocationParts::default());
    }

    #[test]
    fn test_raw_record_json_field_names() {
        let json = r#"{
            "title": "آپارتمان",
            "metraj": "۸۰",
            "salSakht": "۱۳۹۵",
            "gheymatKol": "۲ میلیارد",
            "imageLinks": ["https://example.com/a.jpg"],
            "ghabeleTabdil": true,
            "adType": "rent"
        }"#;
        let record: RawAdRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sal_sakht.as_deref(), Some("۱۳۹۵"));
        assert_eq!(record.gheymat_kol.as_deref(), Some("۲ میلیارد"));
        assert_eq!(record.image_links.len(), 1);
        assert!(record.ghabele_tabdil);
        assert_eq!(record.ad_type, Some(AdType::Rent));
    }

    #[test]
    fn test_grouped_crawl_output() {
        let json = r#"{
            "sale": {"tehran": [{"title": "a"}]},
            "rent": {"karaj": [{"title": "b"}, {"title": "c"}]}
        }"#;
        let output: CrawlOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.total_ads(), 3);

        let groups = output.into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, AdType::Sale);
        assert_eq!(groups[0].1, "tehran");
        assert_eq!(groups[1].0, AdType::Rent);
        assert_eq!(groups[1].2.len(), 2);
    }

    #[test]
    fn test_groups_keep_document_order() {
        // "zanjan" sorts after "arak"; document order must survive anyway.
        let json = r#"{
            "sale": {
                "zanjan": [{"title": "a"}],
                "arak": [{"title": "b"}]
            }
        }"#;
        let output: CrawlOutput = serde_json::from_str(json).unwrap();
        let groups = output.into_groups();
        assert_eq!(groups[0].1, "zanjan");
        assert_eq!(groups[1].1, "arak");
    }

    #[test]
    fn test_flat_legacy_crawl_output() {
        let json = r#"[{"title": "a", "adType": "rent"}, {"title": "b"}]"#;
        let output: CrawlOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.total_ads(), 2);

        let groups = output.into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, AdType::Sale);
        assert_eq!(groups[0].2[0].title, "b");
        assert_eq!(groups[1].0, AdType::Rent);
    }
}
