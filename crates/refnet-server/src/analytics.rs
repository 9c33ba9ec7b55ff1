//! Dashboard aggregates, recomputed from full scans on every request.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use refnet_shared::{CampaignStatus, DisputeStatus, EarningStatus, LeadStatus};
use refnet_store::{Campaign, Dispute, Earning, Lead};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_referrals: usize,
    /// Percentage of leads approved, one decimal place.
    #[serde(with = "rust_decimal::serde::float")]
    pub conversion_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payouts: Decimal,
    pub active_campaigns: usize,
    pub pending_disputes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerSummary {
    pub referrer_id: i64,
    pub total_leads: usize,
    pub approved_leads: usize,
    pub total_earnings: Decimal,
    pub pending_earnings: Decimal,
    pub paid_earnings: Decimal,
}

/// `approved / total * 100`, half-up to one decimal; zero when there are
/// no leads.
fn conversion_rate(approved: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    let rate = Decimal::from(approved) * Decimal::ONE_HUNDRED / Decimal::from(total);
    rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn sum<'a>(amounts: impl Iterator<Item = &'a Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, |acc, a| acc + a)
}

pub fn overview(
    leads: &[Lead],
    campaigns: &[Campaign],
    earnings: &[Earning],
    disputes: &[Dispute],
) -> Overview {
    let approved = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Approved)
        .count();

    Overview {
        total_referrals: leads.len(),
        conversion_rate: conversion_rate(approved, leads.len()),
        total_payouts: sum(earnings.iter().map(|e| &e.amount)),
        active_campaigns: campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .count(),
        pending_disputes: disputes
            .iter()
            .filter(|d| d.status == DisputeStatus::Pending)
            .count(),
    }
}

/// Totals for one referrer. `leads` and `earnings` must already be filtered
/// to that referrer.
pub fn referrer_summary(referrer_id: i64, leads: &[Lead], earnings: &[Earning]) -> ReferrerSummary {
    let by_status = |status: EarningStatus| {
        refnet_shared::normalize_money(sum(earnings
            .iter()
            .filter(|e| e.status == status)
            .map(|e| &e.amount)))
    };

    ReferrerSummary {
        referrer_id,
        total_leads: leads.len(),
        approved_leads: leads
            .iter()
            .filter(|l| l.status == LeadStatus::Approved)
            .count(),
        total_earnings: refnet_shared::normalize_money(sum(earnings.iter().map(|e| &e.amount))),
        pending_earnings: by_status(EarningStatus::Pending),
        paid_earnings: by_status(EarningStatus::Paid),
    }
}
