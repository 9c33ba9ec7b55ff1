//! Record construction and partial-update merging.
//!
//! Both backends go through these functions so defaults, lifecycle
//! timestamps and transition rules behave identically whether a record lives
//! in a `HashMap` or a SQLite row. Backends assign the id: callers pass `0`
//! and overwrite it after insertion when the id comes from the database.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;

use refnet_shared::input::{check_window, normalize_money};
use refnet_shared::{
    CampaignPatch, CampaignStatus, DisputePatch, DisputeStatus, EarningPatch, EarningStatus,
    LeadPatch, LeadStatus, NewActivity, NewCampaign, NewDispute, NewEarning, NewLead, NewUser,
    UserPatch,
};

use crate::error::{Result, StoreError};
use crate::models::{Activity, Campaign, Dispute, Earning, Lead, User};

/// Overwrite `slot` when the patch carries a value.
fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Stored timestamps carry microsecond precision; trim caller-supplied ones
/// so both backends hand back the same value.
fn micros(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

pub(crate) fn new_user(id: i64, input: NewUser, now: DateTime<Utc>) -> User {
    User {
        id,
        username: input.username,
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        avatar: input.avatar,
        role: input.role,
        tier: input.tier,
        created_at: now,
    }
}

pub(crate) fn new_lead(id: i64, input: NewLead, now: DateTime<Utc>) -> Lead {
    Lead {
        id,
        referrer_id: input.referrer_id,
        customer_name: input.customer_name,
        customer_email: input.customer_email,
        customer_phone: input.customer_phone,
        service: input.service,
        value: normalize_money(input.value),
        status: input.status,
        business_name: input.business_name,
        notes: input.notes,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn new_campaign(id: i64, input: NewCampaign, now: DateTime<Utc>) -> Result<Campaign> {
    check_window(&input.start_date, &input.end_date)?;
    Ok(Campaign {
        id,
        business_id: input.business_id,
        name: input.name,
        description: input.description,
        service_area: input.service_area,
        reward_per_conversion: normalize_money(input.reward_per_conversion),
        max_budget: normalize_money(input.max_budget),
        budget_used: normalize_money(Decimal::ZERO),
        start_date: micros(input.start_date),
        end_date: micros(input.end_date),
        postcode: input.postcode,
        status: input.status,
        leads: 0,
        conversions: 0,
        created_at: now,
    })
}

pub(crate) fn new_dispute(id: i64, input: NewDispute, now: DateTime<Utc>) -> Dispute {
    Dispute {
        id,
        case_id: input.case_id,
        lead_id: input.lead_id,
        business_id: input.business_id,
        referrer_id: input.referrer_id,
        business_claim: input.business_claim,
        referrer_response: input.referrer_response,
        status: input.status,
        decision: input.decision,
        admin_id: input.admin_id,
        admin_notes: input.admin_notes,
        evidence: input.evidence,
        created_at: now,
        // Filed already decided: resolved at filing time.
        resolved_at: input.status.is_resolved().then_some(now),
    }
}

pub(crate) fn new_earning(id: i64, input: NewEarning, now: DateTime<Utc>) -> Earning {
    Earning {
        id,
        referrer_id: input.referrer_id,
        lead_id: input.lead_id,
        campaign_id: input.campaign_id,
        amount: normalize_money(input.amount),
        status: input.status,
        paid_at: (input.status == EarningStatus::Paid).then_some(now),
        created_at: now,
    }
}

pub(crate) fn new_activity(id: i64, input: NewActivity, now: DateTime<Utc>) -> Activity {
    Activity {
        id,
        user_id: input.user_id,
        kind: input.kind,
        title: input.title,
        description: input.description,
        metadata: input.metadata,
        created_at: now,
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

pub(crate) fn apply_user_patch(user: &mut User, patch: UserPatch) {
    merge(&mut user.username, patch.username);
    merge(&mut user.email, patch.email);
    merge(&mut user.first_name, patch.first_name);
    merge(&mut user.last_name, patch.last_name);
    merge(&mut user.avatar, patch.avatar);
    merge(&mut user.role, patch.role);
    merge(&mut user.tier, patch.tier);
}

pub(crate) fn apply_lead_patch(lead: &mut Lead, patch: LeadPatch, now: DateTime<Utc>) {
    merge(&mut lead.referrer_id, patch.referrer_id);
    merge(&mut lead.customer_name, patch.customer_name);
    merge(&mut lead.customer_email, patch.customer_email);
    merge(&mut lead.customer_phone, patch.customer_phone);
    merge(&mut lead.service, patch.service);
    merge(&mut lead.value, patch.value.map(normalize_money));
    merge(&mut lead.status, patch.status);
    merge(&mut lead.business_name, patch.business_name);
    merge(&mut lead.notes, patch.notes);
    lead.updated_at = now;
}

pub(crate) fn apply_campaign_patch(campaign: &mut Campaign, patch: CampaignPatch) -> Result<()> {
    merge(&mut campaign.business_id, patch.business_id);
    merge(&mut campaign.name, patch.name);
    merge(&mut campaign.description, patch.description);
    merge(&mut campaign.service_area, patch.service_area);
    merge(
        &mut campaign.reward_per_conversion,
        patch.reward_per_conversion.map(normalize_money),
    );
    merge(&mut campaign.max_budget, patch.max_budget.map(normalize_money));
    merge(&mut campaign.budget_used, patch.budget_used.map(normalize_money));
    merge(&mut campaign.start_date, patch.start_date.map(micros));
    merge(&mut campaign.end_date, patch.end_date.map(micros));
    merge(&mut campaign.postcode, patch.postcode);
    merge(&mut campaign.status, patch.status);
    merge(&mut campaign.leads, patch.leads);
    merge(&mut campaign.conversions, patch.conversions);
    check_window(&campaign.start_date, &campaign.end_date)?;
    Ok(())
}

pub(crate) fn apply_dispute_patch(
    dispute: &mut Dispute,
    patch: DisputePatch,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(next) = patch.status {
        if !dispute.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                entity: "dispute",
                from: dispute.status.to_string(),
                to: next.to_string(),
            });
        }
    }

    merge(&mut dispute.case_id, patch.case_id);
    merge(&mut dispute.lead_id, patch.lead_id);
    merge(&mut dispute.business_id, patch.business_id);
    merge(&mut dispute.referrer_id, patch.referrer_id);
    merge(&mut dispute.business_claim, patch.business_claim);
    merge(&mut dispute.referrer_response, patch.referrer_response);
    merge(&mut dispute.status, patch.status);
    merge(&mut dispute.decision, patch.decision);
    merge(&mut dispute.admin_id, patch.admin_id);
    merge(&mut dispute.admin_notes, patch.admin_notes);
    merge(&mut dispute.evidence, patch.evidence);

    if dispute.status != DisputeStatus::Pending && dispute.resolved_at.is_none() {
        dispute.resolved_at = Some(now);
    }
    Ok(())
}

pub(crate) fn apply_earning_patch(
    earning: &mut Earning,
    patch: EarningPatch,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(next) = patch.status {
        if !earning.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                entity: "earning",
                from: earning.status.to_string(),
                to: next.to_string(),
            });
        }
    }

    merge(&mut earning.referrer_id, patch.referrer_id);
    merge(&mut earning.lead_id, patch.lead_id);
    merge(&mut earning.campaign_id, patch.campaign_id);
    merge(&mut earning.amount, patch.amount.map(normalize_money));
    merge(&mut earning.status, patch.status);

    if earning.status == EarningStatus::Paid && earning.paid_at.is_none() {
        earning.paid_at = Some(now);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Check that `lead` may be converted on `campaign` at `now` and, if so,
/// charge the reward and count the conversion. `already_credited` is true
/// when an earning for this campaign and lead exists. Returns the pending
/// earning to store; on error the campaign is left untouched.
///
/// `campaign.leads` counts leads the business received and is only set
/// through a patch.
pub(crate) fn charge_conversion(
    campaign: &mut Campaign,
    lead: &Lead,
    already_credited: bool,
    now: DateTime<Utc>,
) -> Result<NewEarning> {
    if campaign.status != CampaignStatus::Active {
        return Err(StoreError::CampaignInactive(campaign.id));
    }
    if now < campaign.start_date || now > campaign.end_date {
        return Err(StoreError::CampaignOutOfWindow(campaign.id));
    }
    if !matches!(lead.status, LeadStatus::Approved | LeadStatus::Completed) {
        return Err(StoreError::LeadNotConvertible {
            lead_id: lead.id,
            status: lead.status.to_string(),
        });
    }
    let referrer_id = lead.referrer_id.ok_or_else(|| {
        StoreError::Conflict(format!("lead {} has no referrer to credit", lead.id))
    })?;
    if already_credited {
        return Err(StoreError::AlreadyConverted {
            campaign_id: campaign.id,
            lead_id: lead.id,
        });
    }

    let reward = campaign.reward_per_conversion;
    let spent = campaign
        .budget_used
        .checked_add(reward)
        .filter(|spent| *spent <= campaign.max_budget)
        .ok_or_else(|| StoreError::BudgetExhausted {
            campaign_id: campaign.id,
            remaining: campaign.remaining_budget(),
            required: reward,
        })?;
    let conversions = campaign
        .conversions
        .checked_add(1)
        .ok_or(StoreError::CounterOverflow {
            campaign_id: campaign.id,
            field: "conversions",
        })?;

    campaign.budget_used = normalize_money(spent);
    campaign.conversions = conversions;
    Ok(NewEarning {
        referrer_id: Some(referrer_id),
        lead_id: Some(lead.id),
        campaign_id: Some(campaign.id),
        amount: reward,
        status: EarningStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn dispute_input(status: DisputeStatus) -> NewDispute {
        NewDispute {
            case_id: "DR-7829".into(),
            lead_id: Some(1),
            business_id: Some(7),
            referrer_id: Some(2),
            business_claim: "Client was already in our database before referral".into(),
            referrer_response: None,
            status,
            decision: None,
            admin_id: None,
            admin_notes: None,
            evidence: None,
        }
    }

    fn campaign() -> Campaign {
        new_campaign(
            1,
            NewCampaign {
                business_id: Some(7),
                name: "Summer Sale Referrals".into(),
                description: None,
                service_area: "home-services".into(),
                reward_per_conversion: Decimal::new(2500, 2),
                max_budget: Decimal::new(5000, 2),
                start_date: now(),
                end_date: now() + Duration::days(60),
                postcode: None,
                status: CampaignStatus::Active,
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn resolved_at_is_stamped_once() {
        let mut dispute = new_dispute(1, dispute_input(DisputeStatus::Pending), now());
        assert_eq!(dispute.resolved_at, None);

        let first = now() + Duration::hours(1);
        let patch = DisputePatch {
            status: Some(DisputeStatus::Escalated),
            ..Default::default()
        };
        apply_dispute_patch(&mut dispute, patch, first).unwrap();
        assert_eq!(dispute.resolved_at, Some(first));

        let patch = DisputePatch {
            status: Some(DisputeStatus::Approved),
            decision: Some(Some("Referral stands".into())),
            ..Default::default()
        };
        apply_dispute_patch(&mut dispute, patch, first + Duration::hours(1)).unwrap();
        assert_eq!(dispute.status, DisputeStatus::Approved);
        assert_eq!(dispute.resolved_at, Some(first));
    }

    #[test]
    fn resolved_dispute_cannot_reopen() {
        let mut dispute = new_dispute(1, dispute_input(DisputeStatus::Rejected), now());
        assert_eq!(dispute.resolved_at, Some(now()));

        let patch = DisputePatch {
            status: Some(DisputeStatus::Pending),
            admin_notes: Some(Some("reopen".into())),
            ..Default::default()
        };
        let err = apply_dispute_patch(&mut dispute, patch, now()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { entity: "dispute", .. }));
        // Rejected patches leave the record untouched.
        assert_eq!(dispute.admin_notes, None);
    }

    #[test]
    fn paid_at_follows_paid_status() {
        let input = NewEarning {
            referrer_id: Some(2),
            lead_id: Some(1),
            campaign_id: Some(1),
            amount: Decimal::new(245, 0),
            status: EarningStatus::Pending,
        };
        let mut earning = new_earning(1, input.clone(), now());
        assert_eq!(earning.paid_at, None);
        assert_eq!(earning.amount.to_string(), "245.00");

        let paid = now() + Duration::days(3);
        let patch = EarningPatch {
            status: Some(EarningStatus::Paid),
            ..Default::default()
        };
        apply_earning_patch(&mut earning, patch.clone(), paid).unwrap();
        assert_eq!(earning.paid_at, Some(paid));

        apply_earning_patch(&mut earning, patch, paid + Duration::days(1)).unwrap();
        assert_eq!(earning.paid_at, Some(paid));

        let created_paid = new_earning(
            2,
            NewEarning {
                status: EarningStatus::Paid,
                ..input
            },
            now(),
        );
        assert_eq!(created_paid.paid_at, Some(now()));
    }

    #[test]
    fn lead_patch_merges_and_touches_updated_at() {
        let mut lead = new_lead(
            1,
            NewLead {
                referrer_id: Some(2),
                customer_name: "Rebecca Wilson".into(),
                customer_email: Some("rebecca.wilson@email.com".into()),
                customer_phone: None,
                service: "Kitchen Remodeling".into(),
                value: Decimal::new(58, 0),
                status: LeadStatus::Pending,
                business_name: Some("Kitchen Masters".into()),
                notes: None,
            },
            now(),
        );
        let later = now() + Duration::minutes(5);
        let patch = LeadPatch {
            status: Some(LeadStatus::Approved),
            business_name: Some(None),
            ..Default::default()
        };
        apply_lead_patch(&mut lead, patch, later);

        assert_eq!(lead.status, LeadStatus::Approved);
        assert_eq!(lead.business_name, None);
        assert_eq!(lead.customer_email.as_deref(), Some("rebecca.wilson@email.com"));
        assert_eq!(lead.created_at, now());
        assert_eq!(lead.updated_at, later);
    }

    #[test]
    fn campaign_patch_rechecks_window() {
        let mut c = campaign();
        let patch = CampaignPatch {
            end_date: Some(now() - Duration::days(1)),
            ..Default::default()
        };
        assert!(matches!(
            apply_campaign_patch(&mut c, patch),
            Err(StoreError::Invalid(_))
        ));
    }

    fn referred_lead(id: i64, status: LeadStatus) -> Lead {
        new_lead(
            id,
            NewLead {
                referrer_id: Some(2),
                customer_name: format!("Customer {id}"),
                customer_email: None,
                customer_phone: None,
                service: "Home Renovation".into(),
                value: Decimal::new(2450, 0),
                status,
                business_name: None,
                notes: None,
            },
            now(),
        )
    }

    #[test]
    fn conversions_stop_at_budget() {
        let mut c = campaign();
        assert_eq!(c.budget_used.to_string(), "0.00");

        for id in 1..=2 {
            let lead = referred_lead(id, LeadStatus::Approved);
            let earning = charge_conversion(&mut c, &lead, false, now()).unwrap();
            assert_eq!(earning.amount, Decimal::new(2500, 2));
            assert_eq!(earning.referrer_id, Some(2));
            assert_eq!(earning.lead_id, Some(id));
            assert_eq!(earning.status, EarningStatus::Pending);
        }
        assert_eq!(c.conversions, 2);
        assert_eq!(c.leads, 0);
        assert_eq!(c.budget_used.to_string(), "50.00");

        let lead = referred_lead(3, LeadStatus::Approved);
        let err = charge_conversion(&mut c, &lead, false, now()).unwrap_err();
        assert!(matches!(err, StoreError::BudgetExhausted { campaign_id: 1, .. }));
        assert_eq!(c.conversions, 2);
    }

    #[test]
    fn paused_campaign_takes_no_conversions() {
        let mut c = campaign();
        c.status = CampaignStatus::Paused;
        let lead = referred_lead(1, LeadStatus::Approved);
        assert!(matches!(
            charge_conversion(&mut c, &lead, false, now()),
            Err(StoreError::CampaignInactive(1))
        ));
    }

    #[test]
    fn conversions_only_inside_the_window() {
        let mut c = campaign();
        let lead = referred_lead(1, LeadStatus::Approved);

        for at in [now() - Duration::seconds(1), c.end_date + Duration::seconds(1)] {
            let err = charge_conversion(&mut c, &lead, false, at).unwrap_err();
            assert!(matches!(err, StoreError::CampaignOutOfWindow(1)), "{err}");
        }
        let end = c.end_date;
        assert!(charge_conversion(&mut c, &lead, false, end).is_ok());
    }

    #[test]
    fn only_approved_or_completed_leads_convert() {
        let mut c = campaign();
        for status in [LeadStatus::Pending, LeadStatus::Rejected] {
            let err = charge_conversion(&mut c, &referred_lead(1, status), false, now())
                .unwrap_err();
            assert!(matches!(err, StoreError::LeadNotConvertible { lead_id: 1, .. }));
        }
        assert_eq!(c.conversions, 0);

        let completed = referred_lead(2, LeadStatus::Completed);
        assert!(charge_conversion(&mut c, &completed, false, now()).is_ok());
    }

    #[test]
    fn credited_lead_is_not_paid_twice() {
        let mut c = campaign();
        let lead = referred_lead(1, LeadStatus::Approved);
        let err = charge_conversion(&mut c, &lead, true, now()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlreadyConverted {
                campaign_id: 1,
                lead_id: 1
            }
        ));
        assert_eq!(c.budget_used.to_string(), "0.00");
    }

    #[test]
    fn saturated_counter_is_refused() {
        let mut c = campaign();
        c.conversions = i64::MAX;
        let lead = referred_lead(1, LeadStatus::Approved);
        let err = charge_conversion(&mut c, &lead, false, now()).unwrap_err();
        assert!(matches!(err, StoreError::CounterOverflow { field: "conversions", .. }));
        assert_eq!(c.conversions, i64::MAX);
        assert_eq!(c.budget_used.to_string(), "0.00");
    }
}
