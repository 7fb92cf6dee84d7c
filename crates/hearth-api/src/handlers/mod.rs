//! Request handlers, grouped by resource.

pub mod albums;
pub mod auth;
pub mod photos;
pub mod tags;
pub mod users;
