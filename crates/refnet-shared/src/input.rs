//! Request bodies accepted by the REST API.
//!
//! `New*` types carry everything needed to create a record; the store fills
//! in ids, timestamps and defaults. `*Patch` types describe a shallow merge:
//! an absent key leaves the stored value alone, and for nullable columns an
//! explicit JSON `null` clears it (`Some(None)`).
//!
//! Decoding (serde) checks shape and required keys; `validate()` checks
//! values. Cross-field rules that depend on the stored record (such as the
//! campaign date window after a partial update) are checked by the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{MAX_COUNTER, MAX_LONG_TEXT, MAX_SHORT_TEXT, MONEY_SCALE};
use crate::error::ValidationError;
use crate::types::{
    ActivityKind, CampaignStatus, DisputeStatus, EarningStatus, LeadStatus, PostcodeRange,
    UserRole, UserTier,
};

/// Largest amount a `NUMERIC(10, 2)` column holds.
const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2); // 99_999_999.99

/// Distinguishes "key absent" (`None`) from "key present and null"
/// (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Round a monetary amount to cents and pin its scale so it always renders
/// with two fractional digits.
pub fn normalize_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(MONEY_SCALE);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn check_money(field: &'static str, value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::invalid(field, "must not be negative"));
    }
    if *value > MAX_MONEY {
        return Err(ValidationError::invalid(
            field,
            format!("must not exceed {MAX_MONEY}"),
        ));
    }
    Ok(())
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    check_length(field, value, max)
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::invalid(
            field,
            format!("longer than {max} characters"),
        ));
    }
    Ok(())
}

fn check_optional(
    field: &'static str,
    value: Option<&String>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| check_length(field, v, max))
}

fn check_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    check_required(field, value, MAX_SHORT_TEXT)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::invalid(field, "not an email address")),
    }
}

fn check_id(field: &'static str, id: Option<i64>) -> Result<(), ValidationError> {
    match id {
        Some(id) if id <= 0 => Err(ValidationError::invalid(field, "ids are positive")),
        _ => Ok(()),
    }
}

fn check_count(field: &'static str, count: i64) -> Result<(), ValidationError> {
    if count < 0 {
        return Err(ValidationError::invalid(field, "must not be negative"));
    }
    if count > MAX_COUNTER {
        return Err(ValidationError::invalid(
            field,
            format!("must not exceed {MAX_COUNTER}"),
        ));
    }
    Ok(())
}

/// The campaign date window must not end before it starts.
pub fn check_window(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::invalid(
            "endDate",
            "must not be before startDate",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub tier: UserTier,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("username", &self.username, MAX_SHORT_TEXT)?;
        check_email("email", &self.email)?;
        check_required("firstName", &self.first_name, MAX_SHORT_TEXT)?;
        check_required("lastName", &self.last_name, MAX_SHORT_TEXT)?;
        check_optional("avatar", self.avatar.as_ref(), MAX_LONG_TEXT)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub tier: Option<UserTier>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            check_required("username", username, MAX_SHORT_TEXT)?;
        }
        if let Some(email) = &self.email {
            check_email("email", email)?;
        }
        if let Some(first) = &self.first_name {
            check_required("firstName", first, MAX_SHORT_TEXT)?;
        }
        if let Some(last) = &self.last_name {
            check_required("lastName", last, MAX_SHORT_TEXT)?;
        }
        check_optional("avatar", self.avatar.as_ref().and_then(Option::as_ref), MAX_LONG_TEXT)
    }
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub referrer_id: Option<i64>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub service: String,
    pub value: Decimal,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLead {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("referrerId", self.referrer_id)?;
        check_required("customerName", &self.customer_name, MAX_SHORT_TEXT)?;
        check_optional("customerEmail", self.customer_email.as_ref(), MAX_SHORT_TEXT)?;
        check_optional("customerPhone", self.customer_phone.as_ref(), MAX_SHORT_TEXT)?;
        check_required("service", &self.service, MAX_SHORT_TEXT)?;
        check_money("value", &self.value)?;
        check_optional("businessName", self.business_name.as_ref(), MAX_SHORT_TEXT)?;
        check_optional("notes", self.notes.as_ref(), MAX_LONG_TEXT)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub referrer_id: Option<Option<i64>>,
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub customer_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub customer_phone: Option<Option<String>>,
    pub service: Option<String>,
    pub value: Option<Decimal>,
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub business_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl LeadPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("referrerId", self.referrer_id.flatten())?;
        if let Some(name) = &self.customer_name {
            check_required("customerName", name, MAX_SHORT_TEXT)?;
        }
        if let Some(service) = &self.service {
            check_required("service", service, MAX_SHORT_TEXT)?;
        }
        if let Some(value) = &self.value {
            check_money("value", value)?;
        }
        check_optional(
            "customerEmail",
            self.customer_email.as_ref().and_then(Option::as_ref),
            MAX_SHORT_TEXT,
        )?;
        check_optional(
            "customerPhone",
            self.customer_phone.as_ref().and_then(Option::as_ref),
            MAX_SHORT_TEXT,
        )?;
        check_optional(
            "businessName",
            self.business_name.as_ref().and_then(Option::as_ref),
            MAX_SHORT_TEXT,
        )?;
        check_optional("notes", self.notes.as_ref().and_then(Option::as_ref), MAX_LONG_TEXT)
    }
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    #[serde(default)]
    pub business_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub service_area: String,
    pub reward_per_conversion: Decimal,
    pub max_budget: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub postcode: Option<PostcodeRange>,
    #[serde(default)]
    pub status: CampaignStatus,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("businessId", self.business_id)?;
        check_required("name", &self.name, MAX_SHORT_TEXT)?;
        check_optional("description", self.description.as_ref(), MAX_LONG_TEXT)?;
        check_required("serviceArea", &self.service_area, MAX_SHORT_TEXT)?;
        check_money("rewardPerConversion", &self.reward_per_conversion)?;
        check_money("maxBudget", &self.max_budget)?;
        check_window(&self.start_date, &self.end_date)?;
        if let Some(postcode) = &self.postcode {
            postcode.validate()?;
        }
        Ok(())
    }
}

/// Partial campaign update. The counters are writable here: they are stored
/// fields. `record_conversion` also moves `conversions`, while `leads` only
/// ever changes through a patch.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub business_id: Option<Option<i64>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub service_area: Option<String>,
    pub reward_per_conversion: Option<Decimal>,
    pub max_budget: Option<Decimal>,
    pub budget_used: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub postcode: Option<Option<PostcodeRange>>,
    pub status: Option<CampaignStatus>,
    pub leads: Option<i64>,
    pub conversions: Option<i64>,
}

impl CampaignPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("businessId", self.business_id.flatten())?;
        if let Some(name) = &self.name {
            check_required("name", name, MAX_SHORT_TEXT)?;
        }
        check_optional(
            "description",
            self.description.as_ref().and_then(Option::as_ref),
            MAX_LONG_TEXT,
        )?;
        if let Some(area) = &self.service_area {
            check_required("serviceArea", area, MAX_SHORT_TEXT)?;
        }
        if let Some(reward) = &self.reward_per_conversion {
            check_money("rewardPerConversion", reward)?;
        }
        if let Some(max) = &self.max_budget {
            check_money("maxBudget", max)?;
        }
        if let Some(used) = &self.budget_used {
            check_money("budgetUsed", used)?;
        }
        if let Some(Some(postcode)) = &self.postcode {
            postcode.validate()?;
        }
        if let Some(leads) = self.leads {
            check_count("leads", leads)?;
        }
        if let Some(conversions) = self.conversions {
            check_count("conversions", conversions)?;
        }
        Ok(())
    }
}

/// Records one converted lead against a campaign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewConversion {
    pub lead_id: i64,
}

impl NewConversion {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("leadId", Some(self.lead_id))
    }
}

// ---------------------------------------------------------------------------
// Disputes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDispute {
    pub case_id: String,
    #[serde(default)]
    pub lead_id: Option<i64>,
    #[serde(default)]
    pub business_id: Option<i64>,
    #[serde(default)]
    pub referrer_id: Option<i64>,
    pub business_claim: String,
    #[serde(default)]
    pub referrer_response: Option<String>,
    #[serde(default)]
    pub status: DisputeStatus,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub evidence: Option<serde_json::Value>,
}

impl NewDispute {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("caseId", &self.case_id, MAX_SHORT_TEXT)?;
        check_id("leadId", self.lead_id)?;
        check_id("businessId", self.business_id)?;
        check_id("referrerId", self.referrer_id)?;
        check_id("adminId", self.admin_id)?;
        check_required("businessClaim", &self.business_claim, MAX_LONG_TEXT)?;
        check_optional("referrerResponse", self.referrer_response.as_ref(), MAX_LONG_TEXT)?;
        check_optional("decision", self.decision.as_ref(), MAX_LONG_TEXT)?;
        check_optional("adminNotes", self.admin_notes.as_ref(), MAX_LONG_TEXT)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisputePatch {
    pub case_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub lead_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub business_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub referrer_id: Option<Option<i64>>,
    pub business_claim: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub referrer_response: Option<Option<String>>,
    pub status: Option<DisputeStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub decision: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub admin_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub admin_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub evidence: Option<Option<serde_json::Value>>,
}

impl DisputePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(case_id) = &self.case_id {
            check_required("caseId", case_id, MAX_SHORT_TEXT)?;
        }
        check_id("leadId", self.lead_id.flatten())?;
        check_id("businessId", self.business_id.flatten())?;
        check_id("referrerId", self.referrer_id.flatten())?;
        check_id("adminId", self.admin_id.flatten())?;
        if let Some(claim) = &self.business_claim {
            check_required("businessClaim", claim, MAX_LONG_TEXT)?;
        }
        for (field, text) in [
            ("referrerResponse", &self.referrer_response),
            ("decision", &self.decision),
            ("adminNotes", &self.admin_notes),
        ] {
            check_optional(field, text.as_ref().and_then(Option::as_ref), MAX_LONG_TEXT)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEarning {
    #[serde(default)]
    pub referrer_id: Option<i64>,
    #[serde(default)]
    pub lead_id: Option<i64>,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    pub amount: Decimal,
    #[serde(default)]
    pub status: EarningStatus,
}

impl NewEarning {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("referrerId", self.referrer_id)?;
        check_id("leadId", self.lead_id)?;
        check_id("campaignId", self.campaign_id)?;
        check_money("amount", &self.amount)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub referrer_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub lead_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub campaign_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub status: Option<EarningStatus>,
}

impl EarningPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("referrerId", self.referrer_id.flatten())?;
        check_id("leadId", self.lead_id.flatten())?;
        check_id("campaignId", self.campaign_id.flatten())?;
        if let Some(amount) = &self.amount {
            check_money("amount", amount)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewActivity {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("userId", self.user_id)?;
        check_required("title", &self.title, MAX_SHORT_TEXT)?;
        check_optional("description", self.description.as_ref(), MAX_LONG_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn lead_body() -> serde_json::Value {
        json!({
            "referrerId": 2,
            "customerName": "Michael Thompson",
            "customerEmail": "michael.thompson@email.com",
            "service": "Home Renovation",
            "value": "2450.00",
            "businessName": "Home Pro Services"
        })
    }

    #[test]
    fn lead_status_defaults_to_pending() {
        let lead: NewLead = serde_json::from_value(lead_body()).unwrap();
        assert_eq!(lead.status, LeadStatus::Pending);
        assert!(lead.validate().is_ok());
    }

    #[test]
    fn money_accepts_strings_and_numbers() {
        let mut body = lead_body();
        body["value"] = json!(1850.5);
        let lead: NewLead = serde_json::from_value(body).unwrap();
        assert_eq!(normalize_money(lead.value).to_string(), "1850.50");
    }

    #[test]
    fn negative_money_is_invalid() {
        let mut body = lead_body();
        body["value"] = json!("-1.00");
        let lead: NewLead = serde_json::from_value(body).unwrap();
        assert_eq!(
            lead.validate().unwrap_err(),
            ValidationError::invalid("value", "must not be negative")
        );
    }

    #[test]
    fn money_ceiling_matches_column_precision() {
        assert!(check_money("value", &Decimal::from_str("99999999.99").unwrap()).is_ok());
        assert!(check_money("value", &Decimal::from_str("100000000.00").unwrap()).is_err());
    }

    #[test]
    fn blank_required_text_is_missing() {
        let mut body = lead_body();
        body["customerName"] = json!("   ");
        let lead: NewLead = serde_json::from_value(body).unwrap();
        assert_eq!(
            lead.validate().unwrap_err(),
            ValidationError::MissingField("customerName")
        );
    }

    #[test]
    fn campaign_without_reward_does_not_decode() {
        let body = json!({
            "name": "Summer Sale Referrals",
            "serviceArea": "home-services",
            "maxBudget": "5000.00",
            "startDate": "2023-06-01T00:00:00Z",
            "endDate": "2023-07-31T00:00:00Z"
        });
        let err = serde_json::from_value::<NewCampaign>(body).unwrap_err();
        assert!(err.to_string().contains("rewardPerConversion"));
    }

    #[test]
    fn campaign_window_must_be_ordered() {
        let body = json!({
            "name": "Backwards",
            "serviceArea": "technology",
            "rewardPerConversion": "40.00",
            "maxBudget": "10000.00",
            "startDate": "2023-09-15T00:00:00Z",
            "endDate": "2023-08-01T00:00:00Z"
        });
        let campaign: NewCampaign = serde_json::from_value(body).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Active);
        assert!(matches!(
            campaign.validate(),
            Err(ValidationError::InvalidValue { field: "endDate", .. })
        ));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: LeadPatch =
            serde_json::from_value(json!({ "notes": null, "status": "approved" })).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.business_name, None);
        assert_eq!(patch.status, Some(LeadStatus::Approved));
    }

    #[test]
    fn patch_rejects_unknown_status() {
        let result = serde_json::from_value::<DisputePatch>(json!({ "status": "closed" }));
        assert!(result.is_err());
    }

    #[test]
    fn user_email_needs_an_at_sign() {
        let user = NewUser {
            username: "sarah.johnson".into(),
            email: "sarah.email.com".into(),
            first_name: "Sarah".into(),
            last_name: "Johnson".into(),
            avatar: None,
            role: UserRole::Referrer,
            tier: UserTier::Premium,
        };
        assert!(matches!(
            user.validate(),
            Err(ValidationError::InvalidValue { field: "email", .. })
        ));
    }

    #[test]
    fn activity_type_uses_the_type_key() {
        let activity: NewActivity = serde_json::from_value(json!({
            "userId": 1,
            "type": "payout_processed",
            "title": "Payout processed for October earnings"
        }))
        .unwrap();
        assert_eq!(activity.kind, ActivityKind::PayoutProcessed);
        assert!(activity.validate().is_ok());
    }

    #[test]
    fn campaign_counters_are_bounded() {
        let patch: CampaignPatch =
            serde_json::from_value(json!({ "conversions": i64::MAX })).unwrap();
        assert!(matches!(
            patch.validate(),
            Err(ValidationError::InvalidValue { field: "conversions", .. })
        ));

        let patch = CampaignPatch {
            leads: Some(MAX_COUNTER),
            conversions: Some(0),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn non_positive_ids_are_invalid() {
        let earning = NewEarning {
            referrer_id: Some(0),
            lead_id: None,
            campaign_id: None,
            amount: Decimal::new(24500, 2),
            status: EarningStatus::Pending,
        };
        assert!(earning.validate().is_err());
        assert!(NewConversion { lead_id: -3 }.validate().is_err());
    }
}
