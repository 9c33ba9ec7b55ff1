//! The repository contract.
//!
//! One capability trait per entity, all unified by [`Repository`]. The HTTP
//! layer only ever sees `Arc<dyn Repository>`, so the backend is picked once
//! at startup.
//!
//! Lists are ordered newest first (`created_at` descending, ties broken by
//! descending id). Lookups and updates return `Ok(None)` when the id does not
//! exist; every other failure is a [`StoreError`](crate::StoreError).

use refnet_shared::{
    CampaignPatch, DisputePatch, DisputeStatus, EarningPatch, LeadPatch, LeadStatus, NewActivity,
    NewCampaign, NewConversion, NewDispute, NewEarning, NewLead, NewUser, UserPatch,
};

use crate::error::Result;
use crate::models::{Activity, Campaign, Dispute, Earning, Lead, User};

pub trait UserStore {
    fn list_users(&self) -> Result<Vec<User>>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn create_user(&self, input: NewUser) -> Result<User>;
    fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>>;
}

pub trait LeadStore {
    fn list_leads(&self) -> Result<Vec<Lead>>;
    fn get_lead(&self, id: i64) -> Result<Option<Lead>>;
    fn create_lead(&self, input: NewLead) -> Result<Lead>;
    fn update_lead(&self, id: i64, patch: LeadPatch) -> Result<Option<Lead>>;
    fn leads_by_referrer(&self, referrer_id: i64) -> Result<Vec<Lead>>;
    fn leads_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>>;
}

pub trait CampaignStore {
    fn list_campaigns(&self) -> Result<Vec<Campaign>>;
    fn get_campaign(&self, id: i64) -> Result<Option<Campaign>>;
    fn create_campaign(&self, input: NewCampaign) -> Result<Campaign>;
    fn update_campaign(&self, id: i64, patch: CampaignPatch) -> Result<Option<Campaign>>;
    fn campaigns_by_business(&self, business_id: i64) -> Result<Vec<Campaign>>;

    /// Atomically credit the lead's referrer with the campaign reward and
    /// move the campaign's `conversions` and `budget_used` counters.
    fn record_conversion(
        &self,
        campaign_id: i64,
        conversion: NewConversion,
    ) -> Result<Option<(Campaign, Earning)>>;
}

pub trait DisputeStore {
    fn list_disputes(&self) -> Result<Vec<Dispute>>;
    fn get_dispute(&self, id: i64) -> Result<Option<Dispute>>;
    fn create_dispute(&self, input: NewDispute) -> Result<Dispute>;
    fn update_dispute(&self, id: i64, patch: DisputePatch) -> Result<Option<Dispute>>;
    fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>>;
}

pub trait EarningStore {
    fn list_earnings(&self) -> Result<Vec<Earning>>;
    fn get_earning(&self, id: i64) -> Result<Option<Earning>>;
    fn create_earning(&self, input: NewEarning) -> Result<Earning>;
    fn update_earning(&self, id: i64, patch: EarningPatch) -> Result<Option<Earning>>;
    fn earnings_by_referrer(&self, referrer_id: i64) -> Result<Vec<Earning>>;
}

/// Append-only: there is no update or delete.
pub trait ActivityStore {
    fn list_activities(&self) -> Result<Vec<Activity>>;
    fn create_activity(&self, input: NewActivity) -> Result<Activity>;
    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>>;
}

/// Everything the API layer needs from a backend.
pub trait Repository:
    UserStore + LeadStore + CampaignStore + DisputeStore + EarningStore + ActivityStore + Send + Sync
{
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
