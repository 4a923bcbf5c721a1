//! Extraction of a single divar.ir listing page into a raw ad record.
//!
//! The page layout is a stack of labelled rows plus two positional cell
//! groups: `td.kt-group-row-item--info-row` carries area / build year /
//! rooms in that order, and the stable value cells carry parking /
//! elevator / storage. Everything is read as displayed text; numeric
//! parsing happens later in normalization.

use std::sync::LazyLock;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

use crate::models::{AdType, RawAdRecord};
use crate::services::images::is_map_image;

static BASE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".kt-base-row").expect("valid selector"));
static ROW_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".kt-base-row__title").expect("valid selector"));
static ROW_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".kt-unexpandable-row__value").expect("valid selector"));
static INFO_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.kt-group-row-item--info-row").expect("valid selector"));
static AMENITY_CELLS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".kt-group-row-item.kt-group-row-item__value.kt-body.kt-body--stable")
        .expect("valid selector")
});
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".kt-description-row__text.kt-description-row__text--primary")
        .expect("valid selector")
});
static SUBTITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".kt-page-title__subtitle.kt-page-title__subtitle--responsive-sized")
        .expect("valid selector")
});
static GALLERY_IMAGES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".kt-image-block__image.kt-image-block__image--fading")
        .expect("valid selector")
});
static MAP_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".kt-show-map__link").expect("valid selector"));
static CONVERT_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".convert-slider table.kt-group-row").expect("valid selector")
});
static CONVERT_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr td").expect("valid selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

/// Labelled row the gallery gate hangs off: «تصویر‌ها برای همین ملک است؟».
const IMAGE_CONFIRMATION_LABEL: &str = "تصویر‌ها برای همین ملک است؟";
const IMAGE_CONFIRMATION_YES: &str = "بله";

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Value of the labelled row whose title matches `label` exactly.
fn row_value(document: &Html, label: &str) -> Option<String> {
    for row in document.select(&BASE_ROW) {
        let title = row.select(&ROW_TITLE).next().map(text_of);
        if title.as_deref() == Some(label) {
            return row.select(&ROW_VALUE).next().map(text_of).and_then(non_empty);
        }
    }
    None
}

/// Decide sale vs rent for a page.
///
/// A deposit-to-rent conversion table only appears on rental listings and
/// wins outright; otherwise the URL and the headline are checked for
/// rent markers. Sale is the fallback.
pub fn classify(url: &str, title: &str, has_convert_table: bool) -> AdType {
    if has_convert_table || url.contains("rent") || url.contains("اجاره") || title.contains("اجاره")
    {
        AdType::Rent
    } else {
        AdType::Sale
    }
}

/// Parse a rendered listing page into a raw record.
///
/// Missing rows become `None`; this never fails, a blank page just yields
/// an empty record.
pub fn parse_listing_page(html: &str, url: &str) -> RawAdRecord {
    let document = Html::parse_document(html);

    let title = document
        .select(&H1)
        .next()
        .map(text_of)
        .unwrap_or_default();

    let info: Vec<String> = document.select(&INFO_CELLS).map(text_of).collect();
    let amenities: Vec<String> = document.select(&AMENITY_CELLS).map(text_of).collect();

    let cell = |cells: &[String], i: usize| cells.get(i).cloned().and_then(non_empty);

    // The gallery is only trusted when the page says the photos belong to
    // this exact property.
    let mut image_links: Vec<String> = Vec::new();
    if row_value(&document, IMAGE_CONFIRMATION_LABEL).as_deref() == Some(IMAGE_CONFIRMATION_YES) {
        image_links.extend(
            document
                .select(&GALLERY_IMAGES)
                .filter_map(|img| img.value().attr("src"))
                .map(str::to_string),
        );
    }
    if let Some(href) = document
        .select(&MAP_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
    {
        if is_map_image(href) {
            image_links.push(href.to_string());
        }
    }

    let convert_table = document.select(&CONVERT_TABLE).next();
    let ad_type = classify(url, &title, convert_table.is_some());

    let mut record = RawAdRecord {
        title,
        metraj: cell(&info, 0),
        sal_sakht: cell(&info, 1),
        otagh: cell(&info, 2),
        tabaghe: row_value(&document, "طبقه"),
        parking: cell(&amenities, 0),
        asansor: cell(&amenities, 1),
        anbari: cell(&amenities, 2),
        tozihat: document.select(&DESCRIPTION).next().map(text_of).and_then(non_empty),
        location: document.select(&SUBTITLE).next().map(text_of).and_then(non_empty),
        image_links,
        ghabele_tabdil: convert_table.is_some(),
        url: Some(url.to_string()),
        scraped_at: Some(Utc::now()),
        city: None,
        ad_type: Some(ad_type),
        ..Default::default()
    };

    match ad_type {
        AdType::Rent => {
            if let Some(table) = convert_table {
                let cells: Vec<String> = table.select(&CONVERT_CELLS).map(text_of).collect();
                record.vadie = cell(&cells, 0);
                record.ejare = cell(&cells, 1);
            } else {
                record.vadie = row_value(&document, "ودیعه");
                record.ejare = row_value(&document, "اجارهٔ ماهانه");
            }
        }
        AdType::Sale => {
            record.gheymat_kol = row_value(&document, "قیمت کل");
            record.gheymat_har_metr = row_value(&document, "قیمت هر متر");
        }
    }

    record
}
