//! Gallery pagination state and scroll-position restoration.
//!
//! This module is the client-side brain of the infinitely-scrolling photo
//! grid: it decides which page to fetch next, tracks whether more pages
//! remain, and resolves where to resume when the user navigates back into
//! an album with a `#photo-<id>` fragment. It performs no I/O — callers
//! run the fetches and feed results back in.
//!
//! Restoration resolves the target page in priority order:
//! 1. a cached [`PhotoPosition`] whose photo id matches the target,
//! 2. a linear scan of already-loaded pages,
//! 3. the estimate `ceil(photo_id / page_size)`.
//!
//! The third path assumes dense, sequential photo ids per album, which the
//! data model does not guarantee (ids are global). The result is therefore
//! tagged [`RestoreSource::IdHeuristic`] and clamped to the album's real
//! page count whenever the total is known, so callers can tell an exact
//! answer from a guess.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults::POSITION_CACHE_CAPACITY;
use crate::models::PhotoSummary;
use crate::pagination::page_count;

/// One fetched page of an album's gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoPage {
    /// 1-based page number.
    pub page: u32,
    pub photos: Vec<PhotoSummary>,
}

/// Last-known reading position within an album.
///
/// Ephemeral and client-side only; never persisted to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoPosition {
    pub album_id: i64,
    /// Photo nearest the viewport center when the position was recorded.
    pub photo_id: i64,
    /// Page the photo was on (1-based).
    pub page: u32,
    /// Window scroll offset in pixels.
    pub scroll_offset: f64,
    pub recorded_at: DateTime<Utc>,
}

/// LRU cache of per-album positions, keyed by album id.
pub struct PositionCache {
    entries: LruCache<i64, PhotoPosition>,
}

impl PositionCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(POSITION_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` albums.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            entries: LruCache::new(cap),
        }
    }

    /// Record a position, replacing any previous entry for the album.
    pub fn record(&mut self, position: PhotoPosition) {
        self.entries.put(position.album_id, position);
    }

    /// Look up the stored position for an album.
    pub fn get(&mut self, album_id: i64) -> Option<&PhotoPosition> {
        self.entries.get(&album_id)
    }

    /// Drop the stored position for an album.
    pub fn clear(&mut self, album_id: i64) {
        self.entries.pop(&album_id);
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// How a restore target page was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    /// A cached position matched the target photo id.
    CachedPosition,
    /// The target photo was found in already-loaded pages.
    LoadedScan,
    /// Estimated from the photo id; may be wrong for sparse ids.
    IdHeuristic,
}

/// Resolved plan for restoring scroll position to a target photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePlan {
    /// Page that must be loaded before scrolling to the target.
    pub target_page: u32,
    pub source: RestoreSource,
}

/// Pagination state for one album's gallery view.
///
/// Pages are fetched strictly sequentially (1, 2, …). A single in-flight
/// guard prevents duplicate concurrent page fetches; `has_more` comes from
/// the server envelope, or is inferred from a short page when the endpoint
/// carries no flag.
#[derive(Debug, Clone)]
pub struct GalleryState {
    album_id: i64,
    page_size: u32,
    pages: Vec<PhotoPage>,
    in_flight: bool,
    has_more: bool,
}

impl GalleryState {
    /// Create state for an album. `page_size` is clamped to at least 1.
    pub fn new(album_id: i64, page_size: u32) -> Self {
        Self {
            album_id,
            page_size: page_size.max(1),
            pages: Vec::new(),
            in_flight: false,
            has_more: true,
        }
    }

    pub fn album_id(&self) -> i64 {
        self.album_id
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Loaded pages, in order.
    pub fn pages(&self) -> &[PhotoPage] {
        &self.pages
    }

    /// Number of pages loaded so far.
    pub fn loaded_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Total photos across loaded pages.
    pub fn total_loaded(&self) -> usize {
        self.pages.iter().map(|p| p.photos.len()).sum()
    }

    /// Whether a further page may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a page fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Page to fetch when the scroll sentinel becomes visible, or `None`
    /// if a fetch is already in flight or no pages remain.
    pub fn next_page_to_fetch(&self) -> Option<u32> {
        if self.in_flight || !self.has_more {
            return None;
        }
        Some(self.loaded_pages() + 1)
    }

    /// Mark the next page fetch as started. Returns the page number, or
    /// `None` if nothing should be fetched (guard already held, or done).
    pub fn begin_fetch(&mut self) -> Option<u32> {
        let page = self.next_page_to_fetch()?;
        self.in_flight = true;
        Some(page)
    }

    /// Apply a successfully fetched page, trusting the server's `has_more`
    /// flag from the response envelope.
    pub fn apply_page(&mut self, photos: Vec<PhotoSummary>, has_more: bool) {
        let page = self.loaded_pages() + 1;
        self.has_more = has_more;
        self.in_flight = false;
        debug!(
            album_id = self.album_id,
            page,
            result_count = photos.len(),
            has_more = self.has_more,
            "gallery: page applied"
        );
        self.pages.push(PhotoPage { page, photos });
    }

    /// Apply a fetched page from an endpoint without a `has_more` flag:
    /// a short page (fewer than `page_size` photos) is the last page.
    ///
    /// A total that is an exact multiple of the page size costs one extra
    /// empty fetch before the end is proven.
    pub fn apply_page_inferred(&mut self, photos: Vec<PhotoSummary>) {
        let has_more = photos.len() as u32 >= self.page_size;
        self.apply_page(photos, has_more);
    }

    /// Record a fetch failure.
    ///
    /// Already-loaded pages are preserved; the guard is released so a
    /// later scroll can retry. Whether the failure is terminal (first
    /// page, nothing rendered yet) is the caller's presentation concern.
    pub fn fetch_failed(&mut self) {
        self.in_flight = false;
    }

    /// Linear scan of loaded pages for the page containing `photo_id`.
    pub fn photo_page(&self, photo_id: i64) -> Option<u32> {
        self.pages
            .iter()
            .find(|p| p.photos.iter().any(|photo| photo.id == photo_id))
            .map(|p| p.page)
    }

    /// Resolve where to scroll for `target_photo_id`, in priority order:
    /// cached position, loaded-page scan, id heuristic.
    ///
    /// `known_total` (when the album's total count has already been
    /// fetched) clamps the heuristic to the album's real page range.
    pub fn resolve_restore(
        &self,
        target_photo_id: i64,
        cache: &mut PositionCache,
        known_total: Option<u64>,
    ) -> RestorePlan {
        if let Some(position) = cache.get(self.album_id) {
            if position.photo_id == target_photo_id {
                return RestorePlan {
                    target_page: position.page.max(1),
                    source: RestoreSource::CachedPosition,
                };
            }
        }

        if let Some(page) = self.photo_page(target_photo_id) {
            return RestorePlan {
                target_page: page,
                source: RestoreSource::LoadedScan,
            };
        }

        // Ids are global, not per-album sequential, so this estimate can
        // overshoot badly for sparse ids. Clamp to the real page range
        // when the total is known; the source tag tells callers it is a
        // guess either way.
        let mut estimate = estimate_page_for_id(target_photo_id, self.page_size);
        if let Some(total) = known_total {
            let last = page_count(total, self.page_size).max(1);
            estimate = estimate.min(last);
        }
        RestorePlan {
            target_page: estimate,
            source: RestoreSource::IdHeuristic,
        }
    }

    /// Pages that still need fetching before `plan.target_page` is loaded,
    /// in fetch order. Empty when the page is already loaded.
    pub fn pages_to_fetch_for(&self, plan: &RestorePlan) -> Vec<u32> {
        let loaded = self.loaded_pages();
        if plan.target_page <= loaded {
            return Vec::new();
        }
        ((loaded + 1)..=plan.target_page).collect()
    }
}

/// Page guess from a photo id alone. Ids near `i64::MAX` would wrap an
/// `as` cast, so the conversion saturates instead.
fn estimate_page_for_id(photo_id: i64, page_size: u32) -> u32 {
    let pages = (photo_id.max(1) as u64).div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Bounding rect of one rendered photo, in viewport coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PhotoRect {
    pub photo_id: i64,
    /// Top edge relative to the viewport, in pixels.
    pub top: f64,
    pub height: f64,
}

/// Photo whose bounding-rect center is nearest the viewport center.
pub fn nearest_to_viewport_center(rects: &[PhotoRect], viewport_height: f64) -> Option<i64> {
    let center = viewport_height / 2.0;
    rects
        .iter()
        .map(|r| {
            let rect_center = r.top + r.height / 2.0;
            (r.photo_id, (rect_center - center).abs())
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Track the current viewport and record the centered photo's position
/// into the cache so a later return visit can restore without server
/// round-trips.
///
/// The recorded page comes from the loaded-page scan when possible and
/// falls back to the id estimate for photos rendered from a page that has
/// since been evicted by navigation.
pub fn track_viewport(
    state: &GalleryState,
    cache: &mut PositionCache,
    scroll_offset: f64,
    viewport_height: f64,
    rects: &[PhotoRect],
) {
    let Some(photo_id) = nearest_to_viewport_center(rects, viewport_height) else {
        return;
    };
    let page = state
        .photo_page(photo_id)
        .unwrap_or_else(|| estimate_page_for_id(photo_id, state.page_size()));
    cache.record(PhotoPosition {
        album_id: state.album_id(),
        photo_id,
        page,
        scroll_offset,
        recorded_at: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn photo(id: i64) -> PhotoSummary {
        PhotoSummary {
            id,
            title: None,
            taken_at: None,
            family_only: false,
            created_at_utc: Utc::now(),
        }
    }

    fn photos(ids: std::ops::RangeInclusive<i64>) -> Vec<PhotoSummary> {
        ids.map(photo).collect()
    }

    /// Drive a full infinite scroll over `total` photos with dense ids,
    /// simulating the server envelope's `has_more` flag.
    fn scroll_all(state: &mut GalleryState, total: i64) -> Vec<usize> {
        let mut fetched = Vec::new();
        while let Some(page) = state.begin_fetch() {
            let start = (page as i64 - 1) * state.page_size() as i64 + 1;
            let end = (start + state.page_size() as i64 - 1).min(total);
            let batch = if start > total {
                Vec::new()
            } else {
                photos(start..=end)
            };
            fetched.push(batch.len());
            let has_more = end < total;
            state.apply_page(batch, has_more);
        }
        fetched
    }

    #[test]
    fn test_25_photos_at_page_size_12_fetches_three_pages() {
        let mut state = GalleryState::new(1, 12);
        let fetched = scroll_all(&mut state, 25);
        assert_eq!(fetched, vec![12, 12, 1]);
        assert!(!state.has_more());
        assert_eq!(state.loaded_pages(), 3);
        assert_eq!(state.total_loaded(), 25);
    }

    #[test]
    fn test_fetched_page_count_is_ceil_of_total_over_size() {
        for (total, size, expected_pages) in
            [(25_i64, 12_u32, 3_u32), (24, 12, 2), (1, 12, 1), (100, 10, 10)]
        {
            let mut state = GalleryState::new(1, size);
            let fetched = scroll_all(&mut state, total);
            assert_eq!(fetched.len() as u32, expected_pages, "total={total} size={size}");
            assert!(!state.has_more());
        }
    }

    #[test]
    fn test_inferred_mode_needs_one_extra_empty_fetch_on_exact_multiple() {
        // Without a server flag, a full second page keeps has_more true
        // until an empty third fetch proves the end.
        let mut state = GalleryState::new(1, 12);
        state.begin_fetch();
        state.apply_page_inferred(photos(1..=12));
        assert!(state.has_more());
        state.begin_fetch();
        state.apply_page_inferred(photos(13..=24));
        assert!(state.has_more());
        state.begin_fetch();
        state.apply_page_inferred(Vec::new());
        assert!(!state.has_more());
    }

    #[test]
    fn test_in_flight_guard_prevents_duplicate_fetch() {
        let mut state = GalleryState::new(1, 12);
        assert_eq!(state.begin_fetch(), Some(1));
        // Sentinel fires again while page 1 is still in flight.
        assert_eq!(state.begin_fetch(), None);
        assert_eq!(state.next_page_to_fetch(), None);

        state.apply_page(photos(1..=12), true);
        assert_eq!(state.begin_fetch(), Some(2));
    }

    #[test]
    fn test_failed_later_page_preserves_loaded_content() {
        let mut state = GalleryState::new(1, 12);
        state.begin_fetch();
        state.apply_page(photos(1..=12), true);

        state.begin_fetch();
        state.fetch_failed();

        assert_eq!(state.loaded_pages(), 1);
        assert_eq!(state.total_loaded(), 12);
        // Re-triggering scroll retries the same page.
        assert_eq!(state.begin_fetch(), Some(2));
    }

    #[test]
    fn test_restore_prefers_cached_position() {
        let mut state = GalleryState::new(7, 12);
        let mut cache = PositionCache::new();
        cache.record(PhotoPosition {
            album_id: 7,
            photo_id: 55,
            page: 4,
            scroll_offset: 3210.0,
            recorded_at: Utc::now(),
        });

        let plan = state.resolve_restore(55, &mut cache, None);
        assert_eq!(plan.source, RestoreSource::CachedPosition);
        assert_eq!(plan.target_page, 4);
        // Restoration loads exactly the cached page count, no re-scan.
        assert_eq!(state.pages_to_fetch_for(&plan), vec![1, 2, 3, 4]);

        // A cached record for a different photo is ignored.
        let plan = state.resolve_restore(56, &mut cache, None);
        assert_ne!(plan.source, RestoreSource::CachedPosition);
    }

    #[test]
    fn test_restore_scans_loaded_pages_without_over_fetching() {
        let mut state = GalleryState::new(7, 12);
        let mut cache = PositionCache::new();
        state.begin_fetch();
        state.apply_page(photos(1..=12), true);
        state.begin_fetch();
        state.apply_page(photos(13..=24), true);

        let plan = state.resolve_restore(17, &mut cache, None);
        assert_eq!(plan.source, RestoreSource::LoadedScan);
        assert_eq!(plan.target_page, 2);
        assert!(state.pages_to_fetch_for(&plan).is_empty());
    }

    #[test]
    fn test_restore_heuristic_for_dense_ids() {
        let state = GalleryState::new(7, 12);
        let mut cache = PositionCache::new();
        let plan = state.resolve_restore(30, &mut cache, None);
        assert_eq!(plan.source, RestoreSource::IdHeuristic);
        assert_eq!(plan.target_page, 3); // ceil(30 / 12)
    }

    #[test]
    fn test_restore_heuristic_is_wrong_for_sparse_ids() {
        // Ids are global, so an album of 25 photos can contain photo 500.
        // The estimate lands far past the album's 3 real pages — this is
        // the documented limitation, not something to correct silently.
        let state = GalleryState::new(7, 12);
        let mut cache = PositionCache::new();
        let plan = state.resolve_restore(500, &mut cache, None);
        assert_eq!(plan.source, RestoreSource::IdHeuristic);
        assert_eq!(plan.target_page, 42); // ceil(500 / 12)

        // With the album total known, the guess is clamped to the last
        // real page instead of driving 39 futile fetches.
        let plan = state.resolve_restore(500, &mut cache, Some(25));
        assert_eq!(plan.source, RestoreSource::IdHeuristic);
        assert_eq!(plan.target_page, 3);
    }

    #[test]
    fn test_restore_heuristic_saturates_for_enormous_ids() {
        // ceil(i64::MAX / 12) does not fit in u32; the estimate pins to
        // u32::MAX rather than wrapping to some small page number.
        let state = GalleryState::new(7, 12);
        let mut cache = PositionCache::new();
        let plan = state.resolve_restore(i64::MAX, &mut cache, None);
        assert_eq!(plan.source, RestoreSource::IdHeuristic);
        assert_eq!(plan.target_page, u32::MAX);

        // A known total still clamps it back into the real range.
        let plan = state.resolve_restore(i64::MAX, &mut cache, Some(25));
        assert_eq!(plan.target_page, 3);
    }

    #[test]
    fn test_nearest_to_viewport_center() {
        let rects = [
            PhotoRect {
                photo_id: 1,
                top: -300.0,
                height: 200.0,
            },
            PhotoRect {
                photo_id: 2,
                top: 300.0,
                height: 200.0,
            },
            PhotoRect {
                photo_id: 3,
                top: 700.0,
                height: 200.0,
            },
        ];
        // Viewport 800px high, center at 400. Photo 2's center is 400.
        assert_eq!(nearest_to_viewport_center(&rects, 800.0), Some(2));
        assert_eq!(nearest_to_viewport_center(&[], 800.0), None);
    }

    #[test]
    fn test_track_viewport_records_position() {
        let mut state = GalleryState::new(9, 12);
        let mut cache = PositionCache::new();
        state.begin_fetch();
        state.apply_page(photos(1..=12), true);
        state.begin_fetch();
        state.apply_page(photos(13..=24), true);

        let rects = [
            PhotoRect {
                photo_id: 14,
                top: 350.0,
                height: 100.0,
            },
            PhotoRect {
                photo_id: 15,
                top: 500.0,
                height: 100.0,
            },
        ];
        track_viewport(&state, &mut cache, 2400.0, 800.0, &rects);

        let position = cache.get(9).expect("position recorded");
        assert_eq!(position.photo_id, 14);
        assert_eq!(position.page, 2);
        assert_eq!(position.scroll_offset, 2400.0);
    }

    #[test]
    fn test_position_cache_evicts_least_recently_used() {
        let mut cache = PositionCache::with_capacity(2);
        for album_id in [1, 2, 3] {
            cache.record(PhotoPosition {
                album_id,
                photo_id: album_id * 10,
                page: 1,
                scroll_offset: 0.0,
                recorded_at: Utc::now(),
            });
        }
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn test_position_cache_clear() {
        let mut cache = PositionCache::new();
        cache.record(PhotoPosition {
            album_id: 5,
            photo_id: 50,
            page: 2,
            scroll_offset: 100.0,
            recorded_at: Utc::now(),
        });
        cache.clear(5);
        assert!(cache.get(5).is_none());
    }
}
