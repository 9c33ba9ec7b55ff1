//! Behaviour every backend must share. Each check runs against a fresh
//! `MemoryStore` and a fresh in-memory SQLite `Database`.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use refnet_shared::{
    ActivityKind, CampaignPatch, CampaignStatus, DisputePatch, DisputeStatus, EarningPatch,
    EarningStatus, LeadPatch, LeadStatus, NewActivity, NewCampaign, NewConversion, NewDispute,
    NewEarning, NewLead, NewUser, UserRole, UserTier,
};
use refnet_store::{
    ActivityStore, CampaignStore, Database, DisputeStore, EarningStore, LeadStore, MemoryStore,
    Repository, StoreError, UserStore,
};

fn referrer(repo: &dyn Repository, handle: &str) -> i64 {
    repo.create_user(NewUser {
        username: handle.into(),
        email: format!("{handle}@email.com"),
        first_name: "Sarah".into(),
        last_name: "Johnson".into(),
        avatar: None,
        role: UserRole::Referrer,
        tier: UserTier::Standard,
    })
    .unwrap()
    .id
}

fn lead(repo: &dyn Repository, referrer_id: Option<i64>, customer: &str) -> i64 {
    lead_with_status(repo, referrer_id, customer, LeadStatus::Pending)
}

fn approved_lead(repo: &dyn Repository, referrer_id: Option<i64>, customer: &str) -> i64 {
    lead_with_status(repo, referrer_id, customer, LeadStatus::Approved)
}

fn lead_with_status(
    repo: &dyn Repository,
    referrer_id: Option<i64>,
    customer: &str,
    status: LeadStatus,
) -> i64 {
    repo.create_lead(NewLead {
        referrer_id,
        customer_name: customer.into(),
        customer_email: None,
        customer_phone: None,
        service: "Roof Repair".into(),
        value: Decimal::new(2100, 0),
        status,
        business_name: None,
        notes: None,
    })
    .unwrap()
    .id
}

fn campaign(repo: &dyn Repository, reward_cents: i64, budget_cents: i64) -> i64 {
    repo.create_campaign(NewCampaign {
        business_id: None,
        name: "Tech Product Launch".into(),
        description: None,
        service_area: "technology".into(),
        reward_per_conversion: Decimal::new(reward_cents, 2),
        max_budget: Decimal::new(budget_cents, 2),
        start_date: Utc::now() - Duration::days(1),
        end_date: Utc::now() + Duration::days(30),
        postcode: None,
        status: CampaignStatus::Active,
    })
    .unwrap()
    .id
}

fn dispute(case_id: &str, status: DisputeStatus) -> NewDispute {
    NewDispute {
        case_id: case_id.into(),
        lead_id: None,
        business_id: None,
        referrer_id: None,
        business_claim: "Client was already in our database before referral".into(),
        referrer_response: None,
        status,
        decision: None,
        admin_id: None,
        admin_notes: None,
        evidence: Some(serde_json::json!({ "urls": ["https://example.com/crm.png"] })),
    }
}

fn lists_newest_first(repo: &dyn Repository) {
    let first = referrer(repo, "first");
    let second = referrer(repo, "second");
    let ids: Vec<i64> = repo.list_users().unwrap().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![second, first]);

    let a = lead(repo, Some(first), "A");
    let b = lead(repo, Some(second), "B");
    let c = lead(repo, Some(first), "C");
    let mine: Vec<i64> = repo
        .leads_by_referrer(first)
        .unwrap()
        .iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(mine, vec![c, a]);
    assert_eq!(repo.list_leads().unwrap()[0].id, c);
    assert_eq!(repo.leads_by_status(LeadStatus::Pending).unwrap().len(), 3);
    assert!(repo.leads_by_status(LeadStatus::Approved).unwrap().is_empty());
    let _ = b;
}

fn missing_ids_are_none(repo: &dyn Repository) {
    assert_eq!(repo.get_user(99).unwrap(), None);
    assert_eq!(repo.get_lead(99).unwrap(), None);
    assert_eq!(repo.get_campaign(99).unwrap(), None);
    assert_eq!(repo.get_dispute(99).unwrap(), None);
    assert_eq!(repo.get_earning(99).unwrap(), None);
    assert_eq!(repo.update_lead(99, LeadPatch::default()).unwrap(), None);
    assert_eq!(
        repo.record_conversion(99, NewConversion { lead_id: 1 }).unwrap(),
        None
    );
}

fn stored_records_read_back_identically(repo: &dyn Repository) {
    let id = referrer(repo, "sarah");
    let created = repo.get_user(id).unwrap().unwrap();
    assert_eq!(repo.user_by_username("sarah").unwrap(), Some(created.clone()));
    assert_eq!(repo.user_by_email("sarah@email.com").unwrap(), Some(created));

    let created = repo.create_dispute(dispute("DR-1", DisputeStatus::Pending)).unwrap();
    assert_eq!(repo.get_dispute(created.id).unwrap(), Some(created));

    let id = campaign(repo, 2500, 500_000);
    let stored = repo.get_campaign(id).unwrap().unwrap();
    assert_eq!(stored.budget_used.to_string(), "0.00");
    assert_eq!(stored.max_budget.to_string(), "5000.00");
}

fn uniqueness_is_a_conflict(repo: &dyn Repository) {
    referrer(repo, "sarah");
    let err = repo
        .create_user(NewUser {
            username: "sarah".into(),
            email: "other@email.com".into(),
            first_name: "S".into(),
            last_name: "J".into(),
            avatar: None,
            role: UserRole::Referrer,
            tier: UserTier::Standard,
        })
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    repo.create_dispute(dispute("DR-7829", DisputeStatus::Pending)).unwrap();
    let err = repo
        .create_dispute(dispute("DR-7829", DisputeStatus::Pending))
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");
}

fn dangling_reference_is_a_conflict(repo: &dyn Repository) {
    let err = repo
        .create_lead(NewLead {
            referrer_id: Some(404),
            customer_name: "Nobody".into(),
            customer_email: None,
            customer_phone: None,
            service: "Landscaping".into(),
            value: Decimal::ZERO,
            status: LeadStatus::Pending,
            business_name: None,
            notes: None,
        })
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let err = repo
        .create_activity(NewActivity {
            user_id: Some(404),
            kind: ActivityKind::FraudAlert,
            title: "Suspicious referral pattern".into(),
            description: None,
            metadata: None,
        })
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");
}

fn patches_merge_and_clear(repo: &dyn Repository) {
    let owner = referrer(repo, "sarah");
    let id = lead(repo, Some(owner), "Rebecca Wilson");
    let before = repo.get_lead(id).unwrap().unwrap();

    let after = repo
        .update_lead(
            id,
            LeadPatch {
                status: Some(LeadStatus::Approved),
                referrer_id: Some(None),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(after.status, LeadStatus::Approved);
    assert_eq!(after.referrer_id, None);
    assert_eq!(after.customer_name, before.customer_name);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(repo.get_lead(id).unwrap(), Some(after));
}

fn dispute_lifecycle(repo: &dyn Repository) {
    let filed = repo.create_dispute(dispute("DR-7831", DisputeStatus::Pending)).unwrap();
    assert_eq!(filed.resolved_at, None);

    let ruled = repo
        .update_dispute(
            filed.id,
            DisputePatch {
                status: Some(DisputeStatus::Rejected),
                decision: Some(Some("Referral valid".into())),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    let resolved_at = ruled.resolved_at.expect("stamped on resolution");

    let err = repo
        .update_dispute(
            filed.id,
            DisputePatch {
                status: Some(DisputeStatus::Pending),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));

    let noted = repo
        .update_dispute(
            filed.id,
            DisputePatch {
                admin_notes: Some(Some("closed".into())),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(noted.resolved_at, Some(resolved_at));
    assert_eq!(repo.disputes_by_status(DisputeStatus::Rejected).unwrap().len(), 1);
    assert!(repo.disputes_by_status(DisputeStatus::Pending).unwrap().is_empty());
}

fn earnings_pay_once(repo: &dyn Repository) {
    let owner = referrer(repo, "david");
    let earning = repo
        .create_earning(NewEarning {
            referrer_id: Some(owner),
            lead_id: None,
            campaign_id: None,
            amount: Decimal::new(245, 0),
            status: EarningStatus::Pending,
        })
        .unwrap();
    assert_eq!(earning.amount.to_string(), "245.00");

    let paid = repo
        .update_earning(
            earning.id,
            EarningPatch {
                status: Some(EarningStatus::Paid),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert!(paid.paid_at.is_some());

    let err = repo
        .update_earning(
            earning.id,
            EarningPatch {
                status: Some(EarningStatus::Pending),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
    assert_eq!(repo.earnings_by_referrer(owner).unwrap(), vec![paid]);
}

fn conversions_charge_the_budget(repo: &dyn Repository) {
    let owner = referrer(repo, "emily");
    let campaign_id = campaign(repo, 4000, 8000);

    for expected in 1..=2 {
        let lead_id = approved_lead(repo, Some(owner), &format!("James Parker {expected}"));
        let (campaign, earning) = repo
            .record_conversion(campaign_id, NewConversion { lead_id })
            .unwrap()
            .unwrap();
        assert_eq!(campaign.conversions, expected);
        assert_eq!(earning.referrer_id, Some(owner));
        assert_eq!(earning.lead_id, Some(lead_id));
        assert_eq!(earning.campaign_id, Some(campaign_id));
        assert_eq!(earning.amount.to_string(), "40.00");
        assert_eq!(earning.status, EarningStatus::Pending);
    }

    let lead_id = approved_lead(repo, Some(owner), "Over Budget");
    let err = repo
        .record_conversion(campaign_id, NewConversion { lead_id })
        .unwrap_err();
    assert!(matches!(err, StoreError::BudgetExhausted { .. }));

    let stored = repo.get_campaign(campaign_id).unwrap().unwrap();
    assert_eq!(stored.conversions, 2);
    assert_eq!(stored.leads, 0);
    assert_eq!(stored.budget_used.to_string(), "80.00");
    assert_eq!(repo.earnings_by_referrer(owner).unwrap().len(), 2);
}

fn a_lead_converts_once_per_campaign(repo: &dyn Repository) {
    let owner = referrer(repo, "rebecca");
    let lead_id = approved_lead(repo, Some(owner), "Rebecca Wilson");
    let first = campaign(repo, 2500, 500_000);
    let second = campaign(repo, 1000, 500_000);

    repo.record_conversion(first, NewConversion { lead_id })
        .unwrap()
        .unwrap();
    let err = repo
        .record_conversion(first, NewConversion { lead_id })
        .unwrap_err();
    assert!(
        matches!(err, StoreError::AlreadyConverted { campaign_id, lead_id: l }
            if campaign_id == first && l == lead_id),
        "{err}"
    );
    let stored = repo.get_campaign(first).unwrap().unwrap();
    assert_eq!(stored.conversions, 1);
    assert_eq!(stored.budget_used.to_string(), "25.00");

    // The same lead may still earn on a different campaign.
    repo.record_conversion(second, NewConversion { lead_id })
        .unwrap()
        .unwrap();
    assert_eq!(repo.earnings_by_referrer(owner).unwrap().len(), 2);
}

fn only_approved_or_completed_leads_convert(repo: &dyn Repository) {
    let owner = referrer(repo, "michael");
    let campaign_id = campaign(repo, 2500, 500_000);

    for status in [LeadStatus::Pending, LeadStatus::Rejected] {
        let lead_id = lead_with_status(repo, Some(owner), "Not Yet", status);
        let err = repo
            .record_conversion(campaign_id, NewConversion { lead_id })
            .unwrap_err();
        assert!(matches!(err, StoreError::LeadNotConvertible { .. }), "{err}");
    }
    assert!(repo.list_earnings().unwrap().is_empty());

    let lead_id = lead_with_status(repo, Some(owner), "Done Deal", LeadStatus::Completed);
    let (campaign, _) = repo
        .record_conversion(campaign_id, NewConversion { lead_id })
        .unwrap()
        .unwrap();
    assert_eq!(campaign.conversions, 1);
}

fn conversions_outside_the_window_are_rejected(repo: &dyn Repository) {
    let owner = referrer(repo, "sophia");
    let lead_id = approved_lead(repo, Some(owner), "Sophia Garcia");
    let campaign_id = campaign(repo, 2500, 500_000);

    let windows = [
        (Utc::now() - Duration::days(60), Utc::now() - Duration::days(30)),
        (Utc::now() + Duration::days(30), Utc::now() + Duration::days(60)),
    ];
    for (start, end) in windows {
        repo.update_campaign(
            campaign_id,
            CampaignPatch {
                start_date: Some(start),
                end_date: Some(end),
                ..Default::default()
            },
        )
        .unwrap();
        let err = repo
            .record_conversion(campaign_id, NewConversion { lead_id })
            .unwrap_err();
        assert!(matches!(err, StoreError::CampaignOutOfWindow(id) if id == campaign_id));
    }
    assert!(repo.list_earnings().unwrap().is_empty());
}

fn saturated_counter_leaves_the_store_usable(repo: &dyn Repository) {
    let owner = referrer(repo, "david");
    let lead_id = approved_lead(repo, Some(owner), "David Chen");
    let campaign_id = campaign(repo, 2500, 500_000);
    repo.update_campaign(
        campaign_id,
        CampaignPatch {
            conversions: Some(i64::MAX),
            ..Default::default()
        },
    )
    .unwrap();

    let err = repo
        .record_conversion(campaign_id, NewConversion { lead_id })
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert!(matches!(err, StoreError::CounterOverflow { .. }));

    let stored = repo.get_campaign(campaign_id).unwrap().unwrap();
    assert_eq!(stored.conversions, i64::MAX);
    assert_eq!(stored.budget_used.to_string(), "0.00");
    assert!(repo.list_earnings().unwrap().is_empty());
    assert_eq!(repo.list_leads().unwrap().len(), 1);
}

fn paused_campaigns_reject_conversions(repo: &dyn Repository) {
    let owner = referrer(repo, "marcus");
    let lead_id = approved_lead(repo, Some(owner), "Sophia Garcia");
    let house_lead = approved_lead(repo, None, "Walk-in");
    let campaign_id = campaign(repo, 2500, 500_000);

    let err = repo
        .record_conversion(campaign_id, NewConversion { lead_id: house_lead })
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err}");

    repo.update_campaign(
        campaign_id,
        CampaignPatch {
            status: Some(CampaignStatus::Paused),
            ..Default::default()
        },
    )
    .unwrap();
    let err = repo
        .record_conversion(campaign_id, NewConversion { lead_id })
        .unwrap_err();
    assert!(matches!(err, StoreError::CampaignInactive(id) if id == campaign_id));
    assert!(repo.list_earnings().unwrap().is_empty());
}

fn recent_activities_are_capped(repo: &dyn Repository) {
    for n in 0..5 {
        repo.create_activity(NewActivity {
            user_id: None,
            kind: ActivityKind::CampaignMilestone,
            title: format!("Milestone {n}"),
            description: None,
            metadata: Some(serde_json::json!({ "n": n })),
        })
        .unwrap();
    }
    let recent = repo.recent_activities(3).unwrap();
    let titles: Vec<&str> = recent.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Milestone 4", "Milestone 3", "Milestone 2"]);
    assert_eq!(recent[0].metadata, Some(serde_json::json!({ "n": 4 })));
    assert_eq!(repo.list_activities().unwrap().len(), 5);
    assert!(repo.recent_activities(0).unwrap().is_empty());
}

macro_rules! backend_suite {
    ($backend:ident, $open:expr) => {
        mod $backend {
            use super::*;

            fn open() -> Box<dyn Repository> {
                Box::new($open)
            }

            #[test]
            fn lists_newest_first() {
                super::lists_newest_first(open().as_ref());
            }

            #[test]
            fn missing_ids_are_none() {
                super::missing_ids_are_none(open().as_ref());
            }

            #[test]
            fn stored_records_read_back_identically() {
                super::stored_records_read_back_identically(open().as_ref());
            }

            #[test]
            fn uniqueness_is_a_conflict() {
                super::uniqueness_is_a_conflict(open().as_ref());
            }

            #[test]
            fn dangling_reference_is_a_conflict() {
                super::dangling_reference_is_a_conflict(open().as_ref());
            }

            #[test]
            fn patches_merge_and_clear() {
                super::patches_merge_and_clear(open().as_ref());
            }

            #[test]
            fn dispute_lifecycle() {
                super::dispute_lifecycle(open().as_ref());
            }

            #[test]
            fn earnings_pay_once() {
                super::earnings_pay_once(open().as_ref());
            }

            #[test]
            fn conversions_charge_the_budget() {
                super::conversions_charge_the_budget(open().as_ref());
            }

            #[test]
            fn a_lead_converts_once_per_campaign() {
                super::a_lead_converts_once_per_campaign(open().as_ref());
            }

            #[test]
            fn only_approved_or_completed_leads_convert() {
                super::only_approved_or_completed_leads_convert(open().as_ref());
            }

            #[test]
            fn conversions_outside_the_window_are_rejected() {
                super::conversions_outside_the_window_are_rejected(open().as_ref());
            }

            #[test]
            fn saturated_counter_leaves_the_store_usable() {
                super::saturated_counter_leaves_the_store_usable(open().as_ref());
            }

            #[test]
            fn paused_campaigns_reject_conversions() {
                super::paused_campaigns_reject_conversions(open().as_ref());
            }

            #[test]
            fn recent_activities_are_capped() {
                super::recent_activities_are_capped(open().as_ref());
            }
        }
    };
}

backend_suite!(memory, MemoryStore::new());
backend_suite!(sqlite, Database::open_in_memory().expect("in-memory database"));

#[test]
fn sqlite_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refnet.db");
    {
        let db = Database::open_at(&path).unwrap();
        refnet_store::seed::load_sample_data(&db).unwrap();
    }
    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 7);
    assert!(!refnet_store::seed::load_sample_data(&db).unwrap());
    let dispute = &db.disputes_by_status(DisputeStatus::Pending).unwrap()[0];
    assert!(dispute.case_id.starts_with("DR-"));
}
