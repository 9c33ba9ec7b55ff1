//! Demo data for fresh installs.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use refnet_shared::{
    ActivityKind, CampaignStatus, DisputeStatus, EarningStatus, LeadStatus, NewActivity,
    NewCampaign, NewDispute, NewEarning, NewLead, NewUser, PostcodeRange, UserRole, UserTier,
};

use crate::error::Result;
use crate::repository::Repository;

const AVATAR_BASE: &str = "https://images.unsplash.com";
const AVATAR_PARAMS: &str = "?ixlib=rb-4.0.3&auto=format&fit=crop&w=32&h=32";

fn avatar(photo: &str) -> Option<String> {
    Some(format!("{AVATAR_BASE}/{photo}{AVATAR_PARAMS}"))
}

fn user(
    username: &str,
    email: &str,
    name: (&str, &str),
    role: UserRole,
    tier: UserTier,
    photo: Option<&str>,
) -> NewUser {
    NewUser {
        username: username.into(),
        email: email.into(),
        first_name: name.0.into(),
        last_name: name.1.into(),
        avatar: photo.and_then(avatar),
        role,
        tier,
    }
}

fn date(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    let midnight = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    Utc.from_utc_datetime(&midnight)
}

/// Populate an empty store with a small, internally consistent network.
///
/// Returns `false` without writing anything when the store already has
/// users.
pub fn load_sample_data(repo: &dyn Repository) -> Result<bool> {
    if !repo.list_users()?.is_empty() {
        tracing::debug!(backend = repo.backend(), "store not empty, skipping sample data");
        return Ok(false);
    }

    let admin = repo.create_user(user(
        "alex.morgan",
        "alex@networkearnings.com",
        ("Alex", "Morgan"),
        UserRole::Admin,
        UserTier::Premium,
        Some("photo-1472099645785-5658abf4ff4e"),
    ))?;

    let referrers = [
        ("sarah.johnson", "sarah@email.com", ("Sarah", "Johnson"), UserTier::Premium, "photo-1494790108755-2616b612b47c"),
        ("david.chen", "david@email.com", ("David", "Chen"), UserTier::Standard, "photo-1507003211169-0a1dd7228f2d"),
        ("emily.rodriguez", "emily@email.com", ("Emily", "Rodriguez"), UserTier::Standard, "photo-1438761681033-6461ffad8d80"),
        ("marcus.williams", "marcus@email.com", ("Marcus", "Williams"), UserTier::Standard, "photo-1472099645785-5658abf4ff4e"),
        ("olivia.kim", "olivia@email.com", ("Olivia", "Kim"), UserTier::Premium, "photo-1544725176-7c40e5a71c5e"),
    ]
    .into_iter()
    .map(|(username, email, name, tier, photo)| {
        repo.create_user(user(username, email, name, UserRole::Referrer, tier, Some(photo)))
    })
    .collect::<Result<Vec<_>>>()?;

    let business = repo.create_user(user(
        "techsolutions.inc",
        "contact@techsolutions.com",
        ("Tech", "Solutions"),
        UserRole::Business,
        UserTier::Premium,
        None,
    ))?;

    let leads = [
        ("Michael Thompson", "Home Renovation", 245_000, LeadStatus::Pending, "Home Pro Services"),
        ("Rebecca Wilson", "Kitchen Remodeling", 580_000, LeadStatus::Approved, "Kitchen Masters"),
        ("James Parker", "Bathroom Remodel", 320_000, LeadStatus::Approved, "Bath Renovations Co"),
        ("Sophia Garcia", "Landscaping", 185_000, LeadStatus::Rejected, "Green Thumb Landscaping"),
        ("Daniel Martinez", "Roof Repair", 210_000, LeadStatus::Pending, "Roof Masters"),
    ]
    .into_iter()
    .zip(&referrers)
    .map(|((customer, service, cents, status, business_name), referrer)| {
        let email = format!("{}@email.com", customer.to_lowercase().replace(' ', "."));
        repo.create_lead(NewLead {
            referrer_id: Some(referrer.id),
            customer_name: customer.into(),
            customer_email: Some(email),
            customer_phone: None,
            service: service.into(),
            value: Decimal::new(cents, 2),
            status,
            business_name: Some(business_name.into()),
            notes: None,
        })
    })
    .collect::<Result<Vec<_>>>()?;

    let summer = repo.create_campaign(NewCampaign {
        business_id: Some(business.id),
        name: "Summer Sale Referrals".into(),
        description: Some("Promote our summer home improvement services".into()),
        service_area: "home-services".into(),
        reward_per_conversion: Decimal::new(2500, 2),
        max_budget: Decimal::new(500_000, 2),
        start_date: date(2023, 6, 1),
        end_date: date(2023, 7, 31),
        postcode: Some(PostcodeRange {
            start: "10001".into(),
            end: "10099".into(),
        }),
        status: CampaignStatus::Active,
    })?;

    let launch = repo.create_campaign(NewCampaign {
        business_id: Some(business.id),
        name: "Tech Product Launch".into(),
        description: Some("New technology services campaign".into()),
        service_area: "technology".into(),
        reward_per_conversion: Decimal::new(4000, 2),
        max_budget: Decimal::new(1_000_000, 2),
        start_date: date(2023, 8, 1),
        end_date: date(2023, 9, 15),
        postcode: Some(PostcodeRange {
            start: "20001".into(),
            end: "20099".into(),
        }),
        status: CampaignStatus::Active,
    })?;

    let disputes = [
        (
            "DR-7829",
            "Client was already in our database before referral",
            "Initial contact was made through my referral link",
        ),
        (
            "DR-7831",
            "Referral code used after direct contact was established",
            "Client confirmed they found us through my social media campaign",
        ),
    ];
    for (i, (case_id, claim, response)) in disputes.into_iter().enumerate() {
        repo.create_dispute(NewDispute {
            case_id: case_id.into(),
            lead_id: Some(leads[i].id),
            business_id: Some(business.id),
            referrer_id: Some(referrers[i].id),
            business_claim: claim.into(),
            referrer_response: Some(response.into()),
            status: DisputeStatus::Pending,
            decision: None,
            admin_id: None,
            admin_notes: None,
            evidence: None,
        })?;
    }

    let earnings = [
        (0, summer.id, 24_500, EarningStatus::Pending),
        (1, summer.id, 58_000, EarningStatus::Paid),
        (2, launch.id, 32_000, EarningStatus::Paid),
    ];
    for (i, campaign_id, cents, status) in earnings {
        repo.create_earning(NewEarning {
            referrer_id: Some(referrers[i].id),
            lead_id: Some(leads[i].id),
            campaign_id: Some(campaign_id),
            amount: Decimal::new(cents, 2),
            status,
        })?;
    }

    repo.create_activity(NewActivity {
        user_id: Some(admin.id),
        kind: ActivityKind::NewReferrer,
        title: "New referrer joined the network".into(),
        description: Some("David Smith registered through the affiliate program".into()),
        metadata: None,
    })?;
    repo.create_activity(NewActivity {
        user_id: Some(admin.id),
        kind: ActivityKind::PayoutProcessed,
        title: "Payout processed for October earnings".into(),
        description: Some("$45,230 distributed to 124 referrers".into()),
        metadata: None,
    })?;

    tracing::info!(backend = repo.backend(), "loaded sample data");
    Ok(true)
}
