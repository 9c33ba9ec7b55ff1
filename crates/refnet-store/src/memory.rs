//! In-process backend.
//!
//! Every table is a `BTreeMap` keyed by id behind one `RwLock`. Writers hold
//! the write lock for the whole operation, so multi-record writes such as
//! [`CampaignStore::record_conversion`] are atomic with respect to readers.
//! Uniqueness and reference rules that SQLite enforces with constraints are
//! checked explicitly here and surface as the same [`StoreError::Conflict`].

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use refnet_shared::{
    CampaignPatch, DisputePatch, DisputeStatus, EarningPatch, LeadPatch, LeadStatus, NewActivity,
    NewCampaign, NewConversion, NewDispute, NewEarning, NewLead, NewUser, UserPatch,
};

use crate::error::{Result, StoreError};
use crate::merge;
use crate::models::{Activity, Campaign, Dispute, Earning, Lead, User};
use crate::repository::{
    ActivityStore, CampaignStore, DisputeStore, EarningStore, LeadStore, Repository, UserStore,
};

/// Ordering key shared by every list operation.
trait Record: Clone {
    fn id(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! record {
    ($($ty:ty),* $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> i64 {
                self.id
            }
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

record!(User, Lead, Campaign, Dispute, Earning, Activity);

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Record> Table<T> {
    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Store a record built with the id from [`Table::next_id`].
    fn insert(&mut self, row: T) -> T {
        self.next_id = row.id() + 1;
        self.rows.insert(row.id(), row.clone());
        row
    }

    fn replace(&mut self, row: T) {
        self.rows.insert(row.id(), row);
    }

    fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.values().any(pred)
    }

    fn newest_first(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<T> = self.rows.values().filter(|r| keep(r)).cloned().collect();
        rows.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        rows
    }
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    leads: Table<Lead>,
    campaigns: Table<Campaign>,
    disputes: Table<Dispute>,
    earnings: Table<Earning>,
    activities: Table<Activity>,
}

/// Fail with a conflict when `id` is set but absent from `table`.
fn check_ref<T: Record>(table: &Table<T>, field: &str, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) if !table.contains(id) => Err(StoreError::missing_reference(field, id)),
        _ => Ok(()),
    }
}

impl Tables {
    fn check_user(&self, user: &User) -> Result<()> {
        let taken = |other: &User| other.id != user.id;
        if self
            .users
            .rows
            .values()
            .any(|u| taken(u) && u.username == user.username)
        {
            return Err(StoreError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        if self
            .users
            .rows
            .values()
            .any(|u| taken(u) && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        Ok(())
    }

    fn check_lead(&self, lead: &Lead) -> Result<()> {
        check_ref(&self.users, "referrerId", lead.referrer_id)
    }

    fn check_campaign(&self, campaign: &Campaign) -> Result<()> {
        check_ref(&self.users, "businessId", campaign.business_id)
    }

    fn check_dispute(&self, dispute: &Dispute) -> Result<()> {
        if self
            .disputes
            .rows
            .values()
            .any(|d| d.id != dispute.id && d.case_id == dispute.case_id)
        {
            return Err(StoreError::Conflict(format!(
                "case {} already exists",
                dispute.case_id
            )));
        }
        check_ref(&self.leads, "leadId", dispute.lead_id)?;
        check_ref(&self.users, "businessId", dispute.business_id)?;
        check_ref(&self.users, "referrerId", dispute.referrer_id)?;
        check_ref(&self.users, "adminId", dispute.admin_id)
    }

    fn check_earning(&self, earning: &Earning) -> Result<()> {
        check_ref(&self.users, "referrerId", earning.referrer_id)?;
        check_ref(&self.leads, "leadId", earning.lead_id)?;
        check_ref(&self.campaigns, "campaignId", earning.campaign_id)
    }
}

/// Non-persistent [`Repository`]. Data lives as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Repository for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

impl UserStore for MemoryStore {
    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.newest_first(|_| true))
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id))
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.read()?;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.read()?;
        Ok(tables.users.rows.values().find(|u| u.email == email).cloned())
    }

    fn create_user(&self, input: NewUser) -> Result<User> {
        let mut tables = self.write()?;
        let user = merge::new_user(tables.users.next_id(), input, crate::now());
        tables.check_user(&user)?;
        Ok(tables.users.insert(user))
    }

    fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>> {
        let mut tables = self.write()?;
        let Some(mut user) = tables.users.get(id) else {
            return Ok(None);
        };
        merge::apply_user_patch(&mut user, patch);
        tables.check_user(&user)?;
        tables.users.replace(user.clone());
        Ok(Some(user))
    }
}

impl LeadStore for MemoryStore {
    fn list_leads(&self) -> Result<Vec<Lead>> {
        Ok(self.read()?.leads.newest_first(|_| true))
    }

    fn get_lead(&self, id: i64) -> Result<Option<Lead>> {
        Ok(self.read()?.leads.get(id))
    }

    fn create_lead(&self, input: NewLead) -> Result<Lead> {
        let mut tables = self.write()?;
        let lead = merge::new_lead(tables.leads.next_id(), input, crate::now());
        tables.check_lead(&lead)?;
        Ok(tables.leads.insert(lead))
    }

    fn update_lead(&self, id: i64, patch: LeadPatch) -> Result<Option<Lead>> {
        let mut tables = self.write()?;
        let Some(mut lead) = tables.leads.get(id) else {
            return Ok(None);
        };
        merge::apply_lead_patch(&mut lead, patch, crate::now());
        tables.check_lead(&lead)?;
        tables.leads.replace(lead.clone());
        Ok(Some(lead))
    }

    fn leads_by_referrer(&self, referrer_id: i64) -> Result<Vec<Lead>> {
        Ok(self
            .read()?
            .leads
            .newest_first(|l| l.referrer_id == Some(referrer_id)))
    }

    fn leads_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>> {
        Ok(self.read()?.leads.newest_first(|l| l.status == status))
    }
}

impl CampaignStore for MemoryStore {
    fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.read()?.campaigns.newest_first(|_| true))
    }

    fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        Ok(self.read()?.campaigns.get(id))
    }

    fn create_campaign(&self, input: NewCampaign) -> Result<Campaign> {
        let mut tables = self.write()?;
        let campaign = merge::new_campaign(tables.campaigns.next_id(), input, crate::now())?;
        tables.check_campaign(&campaign)?;
        Ok(tables.campaigns.insert(campaign))
    }

    fn update_campaign(&self, id: i64, patch: CampaignPatch) -> Result<Option<Campaign>> {
        let mut tables = self.write()?;
        let Some(mut campaign) = tables.campaigns.get(id) else {
            return Ok(None);
        };
        merge::apply_campaign_patch(&mut campaign, patch)?;
        tables.check_campaign(&campaign)?;
        tables.campaigns.replace(campaign.clone());
        Ok(Some(campaign))
    }

    fn campaigns_by_business(&self, business_id: i64) -> Result<Vec<Campaign>> {
        Ok(self
            .read()?
            .campaigns
            .newest_first(|c| c.business_id == Some(business_id)))
    }

    fn record_conversion(
        &self,
        campaign_id: i64,
        conversion: NewConversion,
    ) -> Result<Option<(Campaign, Earning)>> {
        let mut tables = self.write()?;
        let Some(mut campaign) = tables.campaigns.get(campaign_id) else {
            return Ok(None);
        };
        let lead = tables
            .leads
            .get(conversion.lead_id)
            .ok_or_else(|| StoreError::missing_reference("lead", conversion.lead_id))?;
        let already_credited = tables.earnings.any(|e| {
            e.campaign_id == Some(campaign.id) && e.lead_id == Some(lead.id)
        });

        // Charge a copy so a failed check leaves the stored campaign alone.
        let now = crate::now();
        let credit = merge::charge_conversion(&mut campaign, &lead, already_credited, now)?;
        let earning = merge::new_earning(tables.earnings.next_id(), credit, now);
        tables.check_earning(&earning)?;

        tables.campaigns.replace(campaign.clone());
        let earning = tables.earnings.insert(earning);
        Ok(Some((campaign, earning)))
    }
}

impl DisputeStore for MemoryStore {
    fn list_disputes(&self) -> Result<Vec<Dispute>> {
        Ok(self.read()?.disputes.newest_first(|_| true))
    }

    fn get_dispute(&self, id: i64) -> Result<Option<Dispute>> {
        Ok(self.read()?.disputes.get(id))
    }

    fn create_dispute(&self, input: NewDispute) -> Result<Dispute> {
        let mut tables = self.write()?;
        let dispute = merge::new_dispute(tables.disputes.next_id(), input, crate::now());
        tables.check_dispute(&dispute)?;
        Ok(tables.disputes.insert(dispute))
    }

    fn update_dispute(&self, id: i64, patch: DisputePatch) -> Result<Option<Dispute>> {
        let mut tables = self.write()?;
        let Some(mut dispute) = tables.disputes.get(id) else {
            return Ok(None);
        };
        merge::apply_dispute_patch(&mut dispute, patch, crate::now())?;
        tables.check_dispute(&dispute)?;
        tables.disputes.replace(dispute.clone());
        Ok(Some(dispute))
    }

    fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>> {
        Ok(self.read()?.disputes.newest_first(|d| d.status == status))
    }
}

impl EarningStore for MemoryStore {
    fn list_earnings(&self) -> Result<Vec<Earning>> {
        Ok(self.read()?.earnings.newest_first(|_| true))
    }

    fn get_earning(&self, id: i64) -> Result<Option<Earning>> {
        Ok(self.read()?.earnings.get(id))
    }

    fn create_earning(&self, input: NewEarning) -> Result<Earning> {
        let mut tables = self.write()?;
        let earning = merge::new_earning(tables.earnings.next_id(), input, crate::now());
        tables.check_earning(&earning)?;
        Ok(tables.earnings.insert(earning))
    }

    fn update_earning(&self, id: i64, patch: EarningPatch) -> Result<Option<Earning>> {
        let mut tables = self.write()?;
        let Some(mut earning) = tables.earnings.get(id) else {
            return Ok(None);
        };
        merge::apply_earning_patch(&mut earning, patch, crate::now())?;
        tables.check_earning(&earning)?;
        tables.earnings.replace(earning.clone());
        Ok(Some(earning))
    }

    fn earnings_by_referrer(&self, referrer_id: i64) -> Result<Vec<Earning>> {
        Ok(self
            .read()?
            .earnings
            .newest_first(|e| e.referrer_id == Some(referrer_id)))
    }
}

impl ActivityStore for MemoryStore {
    fn list_activities(&self) -> Result<Vec<Activity>> {
        Ok(self.read()?.activities.newest_first(|_| true))
    }

    fn create_activity(&self, input: NewActivity) -> Result<Activity> {
        let mut tables = self.write()?;
        let activity = merge::new_activity(tables.activities.next_id(), input, crate::now());
        check_ref(&tables.users, "userId", activity.user_id)?;
        Ok(tables.activities.insert(activity))
    }

    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        let mut activities = self.read()?.activities.newest_first(|_| true);
        activities.truncate(limit);
        Ok(activities)
    }
}
