//! Domain model structs persisted by both store backends.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase keys so
//! it can be handed directly to the HTTP layer as the response body.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use refnet_shared::{
    ActivityKind, CampaignStatus, DisputeStatus, EarningStatus, LeadStatus, PostcodeRange,
    UserRole, UserTier,
};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A network member. Never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Unique login handle.
    pub username: String,
    /// Unique contact address.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Avatar image URL.
    pub avatar: Option<String>,
    pub role: UserRole,
    pub tier: UserTier,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

/// A prospective customer introduced by a referrer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    /// The referring user, `None` for house leads.
    pub referrer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// The service the customer is interested in.
    pub service: String,
    /// Estimated deal value.
    pub value: Decimal,
    pub status: LeadStatus,
    pub business_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// A business-funded, budget-bounded referral offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    /// The funding business.
    pub business_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub service_area: String,
    /// Paid to the referrer for each recorded conversion.
    pub reward_per_conversion: Decimal,
    /// Spend ceiling.
    pub max_budget: Decimal,
    /// Spend so far.
    pub budget_used: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Postcodes the campaign accepts leads from.
    pub postcode: Option<PostcodeRange>,
    pub status: CampaignStatus,
    /// Leads attributed to the campaign.
    pub leads: i64,
    /// Leads that converted.
    pub conversions: i64,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Budget left before `max_budget` is reached (never negative).
    pub fn remaining_budget(&self) -> Decimal {
        (self.max_budget - self.budget_used).max(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Dispute
// ---------------------------------------------------------------------------

/// A contested lead attribution between a business and a referrer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: i64,
    /// Human-facing case reference such as `DR-7829`. Unique.
    pub case_id: String,
    pub lead_id: Option<i64>,
    pub business_id: Option<i64>,
    pub referrer_id: Option<i64>,
    pub business_claim: String,
    pub referrer_response: Option<String>,
    pub status: DisputeStatus,
    pub decision: Option<String>,
    /// The admin who ruled on the case.
    pub admin_id: Option<i64>,
    pub admin_notes: Option<String>,
    /// Supporting material (URLs, documents), free-form JSON.
    pub evidence: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// Set once, on the first move out of `pending`.
    pub resolved_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Earning
// ---------------------------------------------------------------------------

/// A monetary credit owed to a referrer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Earning {
    pub id: i64,
    pub referrer_id: Option<i64>,
    pub lead_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub amount: Decimal,
    pub status: EarningStatus,
    /// Set once, when the earning becomes `paid`.
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// An append-only feed entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
