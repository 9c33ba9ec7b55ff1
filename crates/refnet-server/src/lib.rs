//! # refnet-server
//!
//! REST API for the referral network. The binary in `main.rs` wires a
//! [`Repository`](refnet_store::Repository) backend into [`build_router`];
//! tests drive the same router in-process.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
mod extract;

pub use api::{build_router, serve, AppState};
pub use config::{ServerConfig, StorageBackend};
pub use error::ServerError;
