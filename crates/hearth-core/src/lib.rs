//! # hearth-core
//!
//! Core types, traits, and abstractions for the hearth photo server.
//!
//! This crate provides the foundational data structures, repository trait
//! definitions, and the gallery pagination/scroll-restoration logic that
//! the other hearth crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod models;
pub mod naming;
pub mod pagination;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{AdminBootstrap, AppConfig, SmtpConfig, StorageConfig};
pub use error::{Error, Result};
pub use gallery::{
    GalleryState, PhotoPage, PhotoPosition, PositionCache, RestorePlan, RestoreSource,
};
pub use models::*;
pub use naming::{
    is_protected_album, normalize_name, photo_storage_key, validate_album_name, validate_tag_name,
};
pub use pagination::{has_more, page_count, page_to_offset, PageQuery};
pub use traits::*;
