//! Value normalization for origin fields.
//! Sanitizing runs on every extracted value; catalog-number normalization
//! only feeds the conflict check and is never stored.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{FieldKey, FieldValue};

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Separators between multiple values packed into one field: "ABC-1, ABC-2", "Label / Distributor"
pub static MULTI_VALUE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,/]").unwrap());

/// Media name origin files use for digital releases
const WEB_MEDIA: &str = "WEB";

/// Media name the host uses for the same thing
const DIGITAL_MEDIA: &str = "Digital Media";

/// Placeholder origin files write for an unknown year
const UNKNOWN_YEAR: &str = "0";

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Sanitize a raw extracted value for the given field.
/// e.g., media "WEB" → "Digital Media", catalognum "ABC-1, ABC-2" → "ABC-1", year "0" → ""
pub fn sanitize_value(key: FieldKey, value: &str) -> String {
    match key {
        FieldKey::Media if value == WEB_MEDIA => DIGITAL_MEDIA.to_string(),
        FieldKey::Catalognum | FieldKey::Label => MULTI_VALUE_SEPARATOR
            .split(value)
            .next()
            .unwrap_or("")
            .trim()
            .to_string(),
        FieldKey::Year if value == UNKNOWN_YEAR => String::new(),
        _ => value.to_string(),
    }
}

/// Normalize a catalog number for comparison.
/// e.g., "cat 001" → "CAT001", "CAT-001" → "CAT001"
pub fn normalize_catalog_number(value: &str) -> String {
    value
        .to_uppercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect()
}

/// Normalize both sides of a conflict check for the given field.
pub fn comparable_value(key: FieldKey, value: &str) -> String {
    match key {
        FieldKey::Catalognum => normalize_catalog_number(value),
        _ => value.to_string(),
    }
}

/// Value to store on a track for an origin string.
/// Years are written as numbers; a year that is not all digits clears the field (None).
pub fn item_value(key: FieldKey, origin: &str) -> Option<FieldValue> {
    match key {
        FieldKey::Year => {
            if !origin.is_empty() && origin.chars().all(|c| c.is_ascii_digit()) {
                // Digits beyond u32 range are not a year either; the field is cleared
                origin.parse::<u32>().ok().map(FieldValue::Number)
            } else {
                None
            }
        }
        _ => Some(FieldValue::Text(origin.to_string())),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_media() {
        assert_eq!(sanitize_value(FieldKey::Media, "WEB"), "Digital Media");
        assert_eq!(sanitize_value(FieldKey::Media, "CD"), "CD");
        // Only the exact marker is aliased
        assert_eq!(sanitize_value(FieldKey::Media, "web"), "web");
    }

    #[test]
    fn test_sanitize_multi_value_fields() {
        assert_eq!(sanitize_value(FieldKey::Catalognum, "ABC-1, ABC-2"), "ABC-1");
        assert_eq!(sanitize_value(FieldKey::Catalognum, " XYZ 9 / XYZ 10"), "XYZ 9");
        assert_eq!(sanitize_value(FieldKey::Label, "Warp / Sony"), "Warp");
        assert_eq!(sanitize_value(FieldKey::Label, "  Warp  "), "Warp");
        assert_eq!(sanitize_value(FieldKey::Label, ""), "");
    }

    #[test]
    fn test_sanitize_year() {
        assert_eq!(sanitize_value(FieldKey::Year, "0"), "");
        assert_eq!(sanitize_value(FieldKey::Year, "1997"), "1997");
    }

    #[test]
    fn test_sanitize_identity_fields() {
        assert_eq!(sanitize_value(FieldKey::Country, "GB, US"), "GB, US");
        assert_eq!(sanitize_value(FieldKey::Albumdisambig, " Deluxe "), " Deluxe ");
    }

    #[test]
    fn test_normalize_catalog_number() {
        assert_eq!(normalize_catalog_number("CAT-001"), "CAT001");
        assert_eq!(normalize_catalog_number("cat 001"), "CAT001");
        assert_eq!(
            normalize_catalog_number("CAT-001"),
            normalize_catalog_number("cat 001")
        );
        assert_eq!(normalize_catalog_number("abc1"), normalize_catalog_number("ABC-1"));
    }

    #[test]
    fn test_comparable_value_only_touches_catalognum() {
        assert_eq!(comparable_value(FieldKey::Catalognum, "abc-1"), "ABC1");
        assert_eq!(comparable_value(FieldKey::Media, "cd"), "cd");
    }

    #[test]
    fn test_item_value_year() {
        assert_eq!(item_value(FieldKey::Year, "2001"), Some(FieldValue::Number(2001)));
        assert_eq!(item_value(FieldKey::Year, "2001-05-01"), None);
        assert_eq!(item_value(FieldKey::Year, ""), None);
        assert_eq!(item_value(FieldKey::Year, "02004"), Some(FieldValue::Number(2004)));
        assert_eq!(item_value(FieldKey::Year, "99999999999"), None);
        assert_eq!(
            item_value(FieldKey::Label, "Warp"),
            Some(FieldValue::Text("Warp".to_string()))
        );
    }
}
