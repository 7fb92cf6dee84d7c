//! Contract tests for the gallery listing envelope.
//!
//! The infinite-scroll client depends on the exact shape of the
//! `/api/albums/:id/photos` response; these tests pin the field names and
//! the `has_more` math without needing a running server.

use chrono::{TimeZone, Utc};
use hearth_core::{
    has_more, page_count, page_to_offset, Album, AlbumPhotosResponse, PhotoSummary,
};

fn sample_album() -> Album {
    Album {
        id: 4,
        name: "Summer 2025".to_string(),
        description: None,
        cover_photo_id: Some(17),
        photo_count: 25,
        created_at_utc: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
    }
}

fn sample_photo(id: i64) -> PhotoSummary {
    PhotoSummary {
        id,
        title: Some(format!("Photo {}", id)),
        taken_at: None,
        family_only: false,
        created_at_utc: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
    }
}

#[test]
fn envelope_has_expected_fields() {
    let response = AlbumPhotosResponse {
        photos: vec![sample_photo(1), sample_photo(2)],
        has_more: true,
        is_s3_available: true,
        total_count: 25,
        album: sample_album(),
    };

    let json = serde_json::to_value(&response).unwrap();
    let obj = json.as_object().unwrap();

    assert!(obj.contains_key("photos"));
    assert!(obj.contains_key("has_more"));
    assert!(obj.contains_key("is_s3_available"));
    assert!(obj.contains_key("total_count"));
    assert!(obj.contains_key("album"));

    assert_eq!(json["photos"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_count"], 25);
    assert_eq!(json["has_more"], true);
    assert_eq!(json["album"]["name"], "Summer 2025");
}

#[test]
fn envelope_round_trips() {
    let response = AlbumPhotosResponse {
        photos: vec![sample_photo(9)],
        has_more: false,
        is_s3_available: false,
        total_count: 1,
        album: sample_album(),
    };

    let json = serde_json::to_string(&response).unwrap();
    let parsed: AlbumPhotosResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.photos.len(), 1);
    assert_eq!(parsed.photos[0].id, 9);
    assert!(!parsed.has_more);
    assert!(!parsed.is_s3_available);
}

#[test]
fn paging_walk_covers_album_in_ceil_pages() {
    // 25 photos at page size 12 should take exactly 3 fetches, with
    // has_more true on the first two and false on the last.
    let total: u64 = 25;
    let page_size: u32 = 12;
    let expected_pages = page_count(total, page_size);
    assert_eq!(expected_pages, 3);

    let mut fetched = 0u64;
    for page in 1..=expected_pages {
        let offset = page_to_offset(page, page_size);
        let returned = (total - offset).min(page_size as u64) as usize;
        fetched += returned as u64;

        let more = has_more(offset, returned, total);
        assert_eq!(more, page < expected_pages, "page {}", page);
    }
    assert_eq!(fetched, total);
}

#[test]
fn exact_multiple_needs_no_extra_page() {
    // 24 photos at page size 12: two pages, has_more false on page 2
    // even though the page came back full.
    let total: u64 = 24;
    let page_size: u32 = 12;
    assert_eq!(page_count(total, page_size), 2);
    assert!(has_more(page_to_offset(1, page_size), 12, total));
    assert!(!has_more(page_to_offset(2, page_size), 12, total));
}

#[test]
fn page_query_accepts_partial_parameters() {
    use hearth_core::PageQuery;

    let q: PageQuery = serde_json::from_str(r#"{"page": 3}"#).unwrap();
    assert_eq!(q.page(), 3);
    assert_eq!(q.limit(), hearth_core::defaults::DEFAULT_PAGE_SIZE);

    let q: PageQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(q.page(), 1);
    assert_eq!(q.offset(), 0);
}
