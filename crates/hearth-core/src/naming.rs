//! Name validation and normalization for albums and tags.
//!
//! Album and tag names are unique case-insensitively; comparisons go
//! through [`normalize_name`] so "Holidays" and "holidays" collide.

use crate::defaults::ALL_PHOTOS_ALBUM;

/// Normalize a name for case-insensitive comparison.
///
/// Trims surrounding whitespace and lowercases. This is the single place
/// that defines what "case-insensitively unique" means for hearth.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether the given album name refers to the protected "All Photos"
/// singleton (compared case-insensitively).
pub fn is_protected_album(name: &str) -> bool {
    normalize_name(name) == normalize_name(ALL_PHOTOS_ALBUM)
}

/// Validate an album name.
///
/// Rules:
/// - Non-empty after trimming
/// - At most 120 characters
/// - No control characters
pub fn validate_album_name(name: &str) -> std::result::Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Album name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 120 {
        return Err("Album name must be 120 characters or less".to_string());
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err("Album name contains control characters".to_string());
    }
    Ok(())
}

/// Validate a tag name.
///
/// Rules:
/// - Length between 1-64 characters
/// - Allowed characters: alphanumeric, hyphens (-), underscores (_), spaces
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 64 {
        return Err("Tag name must be 64 characters or less".to_string());
    }

    let invalid_chars: Vec<char> = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != '-' && *c != '_' && *c != ' ')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only alphanumeric characters, hyphens, underscores, and spaces are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// Generate the storage key for a photo id.
///
/// Key format: `photos/{id mod 256 as 2 hex}/{id}.bin`. Spreads objects
/// across 256 prefixes so filesystem directories and S3 listings stay
/// manageable. Keys contain only URL-safe characters.
pub fn photo_storage_key(photo_id: i64) -> String {
    format!(
        "photos/{:02x}/{}.bin",
        (photo_id.rem_euclid(256)) as u8,
        photo_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_name("  Summer 2024 "), "summer 2024");
    }

    #[test]
    fn test_protected_album_case_insensitive() {
        assert!(is_protected_album("All Photos"));
        assert!(is_protected_album("all photos"));
        assert!(is_protected_album("  ALL PHOTOS "));
        assert!(!is_protected_album("All Photos 2"));
    }

    #[test]
    fn test_album_name_empty_rejected() {
        assert!(validate_album_name("   ").is_err());
    }

    #[test]
    fn test_album_name_too_long_rejected() {
        let name = "x".repeat(121);
        assert!(validate_album_name(&name).is_err());
        let name = "x".repeat(120);
        assert!(validate_album_name(&name).is_ok());
    }

    #[test]
    fn test_album_name_length_counts_characters_not_bytes() {
        // 120 accented characters is 240 bytes of UTF-8 but within the limit.
        let name = "é".repeat(120);
        assert!(validate_album_name(&name).is_ok());
        let name = "é".repeat(121);
        assert!(validate_album_name(&name).is_err());
    }

    #[test]
    fn test_tag_name_valid() {
        assert!(validate_tag_name("birthday").is_ok());
        assert!(validate_tag_name("summer 2024").is_ok());
        assert!(validate_tag_name("black-and-white").is_ok());
    }

    #[test]
    fn test_tag_name_invalid_chars() {
        let err = validate_tag_name("tag!@#").unwrap_err();
        assert!(err.contains("invalid characters"));
    }

    #[test]
    fn test_tag_name_length_counts_characters_not_bytes() {
        let name = "ü".repeat(64);
        assert!(validate_tag_name(&name).is_ok());
        let name = "ü".repeat(65);
        assert!(validate_tag_name(&name).is_err());
    }

    #[test]
    fn test_tag_name_empty_rejected() {
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("  ").is_err());
    }

    #[test]
    fn test_photo_storage_key_shards_by_low_byte() {
        assert_eq!(photo_storage_key(1), "photos/01/1.bin");
        assert_eq!(photo_storage_key(256), "photos/00/256.bin");
        assert_eq!(photo_storage_key(511), "photos/ff/511.bin");
    }

    #[test]
    fn test_photo_storage_key_is_url_safe() {
        let key = photo_storage_key(123456789);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '.'));
    }
}
