//! # refnet-shared
//!
//! Vocabulary shared by the store and the HTTP API: lifecycle enums,
//! request bodies with their validation rules, and constants.

pub mod constants;
pub mod error;
pub mod input;
pub mod types;

pub use error::ValidationError;
pub use input::*;
pub use types::*;
