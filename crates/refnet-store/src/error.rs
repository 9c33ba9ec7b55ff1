use rust_decimal::Decimal;
use thiserror::Error;

use refnet_shared::ValidationError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// A thread panicked while holding the store lock.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// The merged record breaks a value rule (e.g. a campaign window that
    /// ends before it starts after a partial update).
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),

    /// A uniqueness or reference constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested status change is not allowed by the entity lifecycle.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Conversions can only be recorded against active campaigns.
    #[error("Campaign {0} is not active")]
    CampaignInactive(i64),

    /// The conversion falls outside the campaign's `start_date..=end_date`.
    #[error("Campaign {0} is not running at this time")]
    CampaignOutOfWindow(i64),

    /// Only approved or completed leads earn a reward.
    #[error("Lead {lead_id} is {status} and cannot be converted")]
    LeadNotConvertible { lead_id: i64, status: String },

    /// A lead is credited at most once per campaign.
    #[error("Lead {lead_id} was already converted on campaign {campaign_id}")]
    AlreadyConverted { campaign_id: i64, lead_id: i64 },

    #[error("Campaign {campaign_id} {field} counter is at its maximum")]
    CounterOverflow {
        campaign_id: i64,
        field: &'static str,
    },

    /// Recording the conversion would push spend past the campaign budget.
    #[error("Campaign {campaign_id} budget exhausted ({remaining} remaining, {required} required)")]
    BudgetExhausted {
        campaign_id: i64,
        remaining: Decimal,
        required: Decimal,
    },
}

impl StoreError {
    pub(crate) fn missing_reference(field: &str, id: i64) -> Self {
        Self::Conflict(format!("{field} {id} does not exist"))
    }

    /// True for errors caused by the request rather than the store itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_)
                | Self::InvalidTransition { .. }
                | Self::CampaignInactive(_)
                | Self::CampaignOutOfWindow(_)
                | Self::LeadNotConvertible { .. }
                | Self::AlreadyConverted { .. }
                | Self::CounterOverflow { .. }
                | Self::BudgetExhausted { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
