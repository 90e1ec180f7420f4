//! OTA Server - HTTP API for tauOS update distribution.
//!
//! This crate provides the public check/download surface and the
//! admin upload/list/deactivate surface over the update catalog.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
