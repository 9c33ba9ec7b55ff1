//! # refnet-store
//!
//! Persistence for the referral network: users, leads, campaigns, disputes,
//! earnings and the activity feed.
//!
//! The [`Repository`] trait is the only thing the HTTP layer depends on. Two
//! backends implement it: [`MemoryStore`] keeps everything in process and
//! [`Database`] wraps a SQLite `rusqlite::Connection`. Record defaults,
//! lifecycle timestamps and transition rules live in one place (`merge`) so
//! the backends cannot drift apart.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod seed;

mod activities;
mod campaigns;
mod disputes;
mod earnings;
mod error;
mod leads;
mod merge;
mod users;

pub use database::Database;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::*;
pub use repository::{
    ActivityStore, CampaignStore, DisputeStore, EarningStore, LeadStore, Repository, UserStore,
};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the precision both backends persist.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
