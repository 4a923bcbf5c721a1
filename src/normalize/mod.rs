//! Persian numeric text normalization.
//!
//! Listing pages render every numeric field as display text: Persian digits,
//! Persian group separators, currency words and magnitude keywords
//! («۲،۵۰۰ میلیون تومان»). This module converts that text into plain
//! integers without ever touching the original strings.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NormalizedAdRecord, RawAdRecord};

/// Filler tokens stripped before any digit handling, in match order.
const FILLER_TOKENS: &[&str] = &[
    "تومان",
    "تومن",
    "ریال",
    "ریل",
    "رایگان",
    "مجانی",
    "رایگان است",
    "قابل مذاکره",
    "توافقی",
    "تماس بگیرید",
    "تماس حاصل فرمایید",
];

/// Magnitude keywords; the first match in declaration order wins.
const MULTIPLIERS: &[(&str, i64)] = &[
    ("میلیارد", 1_000_000_000),
    ("billion", 1_000_000_000),
    ("میلیون", 1_000_000),
    ("million", 1_000_000),
    ("هزار", 1_000),
    ("thousand", 1_000),
];

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());
static AZ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*از\s*(\d+)").unwrap());
static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Map Persian digits (۰–۹) to their ASCII equivalents, leaving everything
/// else untouched.
fn persian_digits_to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// Extract an integer from Persian-formatted numeric/currency text.
///
/// Returns `None` when no digits survive cleaning; inputs like «رایگان»
/// deliberately normalize to "no numeric value" rather than zero. The
/// function is pure: the same input always yields the same output.
pub fn extract_number(text: &str) -> Option<i64> {
    let mut cleaned = text.trim().to_string();
    for token in FILLER_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned = persian_digits_to_ascii(&cleaned);

    let mut multiplier: i64 = 1;
    let mut multiplier_found = false;
    for (token, value) in MULTIPLIERS {
        if cleaned.contains(token) {
            multiplier = *value;
            cleaned = cleaned.replace(token, "");
            multiplier_found = true;
            break;
        }
    }

    // Decimal form like "1.450" scales by the multiplier and rounds.
    if let Some(m) = DECIMAL_RE.find(&cleaned) {
        let value: f64 = m.as_str().parse().ok()?;
        let scaled = if multiplier_found {
            value * multiplier as f64
        } else {
            value
        };
        return Some(scaled.round() as i64);
    }

    // Floor shorthand «۳ از ۴»: the current floor alone is the value.
    if let Some(caps) = AZ_RE.captures(&cleaned) {
        return caps[1].parse().ok();
    }

    cleaned.retain(|c| c.is_ascii_digit() || c == ',' || c == '.');

    // Comma-grouped digits ("2,500,000").
    if cleaned.contains(',') {
        if let Ok(n) = cleaned.replace(',', "").parse::<i64>() {
            return Some(n * multiplier);
        }
    }

    // First contiguous digit run.
    DIGIT_RUN_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|n| n * multiplier)
}

/// Parsed floor field: current floor and, when given, total floors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Floor {
    pub current: Option<i64>,
    pub total: Option<i64>,
}

/// Parse a floor field («۳ از ۴», «۲») into current/total floors.
///
/// Stricter than [`extract_number`]: no filler stripping and no multiplier
/// handling, since floor fields only ever carry plain digits.
pub fn parse_tabaghe(text: &str) -> Floor {
    let cleaned = persian_digits_to_ascii(text.trim());

    if let Some(caps) = AZ_RE.captures(&cleaned) {
        return Floor {
            current: caps[1].parse().ok(),
            total: caps[2].parse().ok(),
        };
    }

    if let Some(m) = DIGIT_RUN_RE.find(&cleaned) {
        return Floor {
            current: m.as_str().parse().ok(),
            total: None,
        };
    }

    Floor::default()
}

/// Enrich a raw record with integer siblings for its numeric fields.
///
/// Original text fields are carried through unchanged; absent fields stay
/// absent rather than becoming explicit nulls.
pub fn enrich(raw: RawAdRecord) -> NormalizedAdRecord {
    let vadie_int = raw.vadie.as_deref().and_then(extract_number);
    let ejare_int = raw.ejare.as_deref().and_then(extract_number);
    let gheymat_kol_int = raw.gheymat_kol.as_deref().and_then(extract_number);
    let gheymat_har_metr_int = raw.gheymat_har_metr.as_deref().and_then(extract_number);
    let metraj_int = raw.metraj.as_deref().and_then(extract_number);
    let sal_sakht_int = raw.sal_sakht.as_deref().and_then(extract_number);
    let otagh_int = raw.otagh.as_deref().and_then(extract_number);
    let tabaghe_int = raw.tabaghe.as_deref().and_then(extract_number);

    let floor = raw
        .tabaghe
        .as_deref()
        .map(parse_tabaghe)
        .unwrap_or_default();

    NormalizedAdRecord {
        raw,
        vadie_int,
        ejare_int,
        gheymat_kol_int,
        gheymat_har_metr_int,
        metraj_int,
        sal_sakht_int,
        otagh_int,
        tabaghe_int,
        tabaghe_current: floor.current,
        tabaghe_total: floor.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_currency() {
        assert_eq!(extract_number("۱۰۰،۰۰۰،۰۰۰ تومان"), Some(100_000_000));
        assert_eq!(extract_number("۱۲،۰۰۰،۰۰۰ تومان"), Some(12_000_000));
    }

    #[test]
    fn test_multiplier_keywords() {
        assert_eq!(extract_number("۸ میلیون"), Some(8_000_000));
        assert_eq!(extract_number("۷۵۰ میلیون"), Some(750_000_000));
        assert_eq!(extract_number("۱۰۰ هزار"), Some(100_000));
    }

    #[test]
    fn test_decimal_times_multiplier() {
        assert_eq!(extract_number("۱.۴۵۰ میلیارد"), Some(1_450_000_000));
    }

    #[test]
    fn test_decimal_without_multiplier() {
        assert_eq!(extract_number("3.7"), Some(4));
    }

    #[test]
    fn test_free_listing_is_none() {
        assert_eq!(extract_number("رایگان"), None);
        assert_eq!(extract_number("توافقی"), None);
        assert_eq!(extract_number(""), None);
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(extract_number("۸۰"), Some(80));
        assert_eq!(extract_number("۱۳۸۸"), Some(1388));
    }

    #[test]
    fn test_floor_shorthand_returns_current() {
        assert_eq!(extract_number("۳ از ۴"), Some(3));
    }

    #[test]
    fn test_determinism() {
        for input in ["۱.۴۵۰ میلیارد", "۸ میلیون", "رایگان", "۳ از ۴"] {
            assert_eq!(extract_number(input), extract_number(input));
        }
    }

    #[test]
    fn test_parse_tabaghe_current_of_total() {
        assert_eq!(
            parse_tabaghe("۳ از ۴"),
            Floor {
                current: Some(3),
                total: Some(4)
            }
        );
    }

    #[test]
    fn test_parse_tabaghe_single() {
        assert_eq!(
            parse_tabaghe("۲"),
            Floor {
                current: Some(2),
                total: None
            }
        );
    }

    #[test]
    fn test_parse_tabaghe_empty() {
        assert_eq!(parse_tabaghe(""), Floor::default());
        assert_eq!(parse_tabaghe("همکف نیست"), Floor::default());
    }

    #[test]
    fn test_enrich_adds_int_siblings_without_mutating() {
        let raw = RawAdRecord {
            title: "آپارتمان ۸۰ متری".to_string(),
            metraj: Some("۸۰".to_string()),
            gheymat_kol: Some("۲،۵۰۰،۰۰۰،۰۰۰ تومان".to_string()),
            tabaghe: Some("۳ از ۴".to_string()),
            ..Default::default()
        };

        let enriched = enrich(raw);
        assert_eq!(enriched.raw.metraj.as_deref(), Some("۸۰"));
        assert_eq!(
            enriched.raw.gheymat_kol.as_deref(),
            Some("۲،۵۰۰،۰۰۰،۰۰۰ تومان")
        );
        assert_eq!(enriched.metraj_int, Some(80));
        assert_eq!(enriched.gheymat_kol_int, Some(2_500_000_000));
        assert_eq!(enriched.tabaghe_int, Some(3));
        assert_eq!(enriched.tabaghe_current, Some(3));
        assert_eq!(enriched.tabaghe_total, Some(4));
        // Absent fields stay absent.
        assert_eq!(enriched.vadie_int, None);
    }
}
