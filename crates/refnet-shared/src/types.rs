use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Declares a closed set of lowercase string tags that round-trip through
/// JSON, SQLite text columns and query strings with the same spelling.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $tag)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $tag ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $tag => Ok($name::$variant), )+
                    other => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// What a user does in the network.
    UserRole ("user role") {
        Referrer => "referrer",
        Admin => "admin",
        Business => "business",
    }
}

string_enum! {
    UserTier ("user tier") {
        Standard => "standard",
        Premium => "premium",
    }
}

string_enum! {
    /// Approval lifecycle of a lead: `pending -> approved | rejected`,
    /// optionally `-> completed`.
    LeadStatus ("lead status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Completed => "completed",
    }
}

string_enum! {
    CampaignStatus ("campaign status") {
        Active => "active",
        Paused => "paused",
        Completed => "completed",
    }
}

string_enum! {
    /// Resolution lifecycle of a dispute. Every status other than
    /// `Pending` counts as resolved.
    DisputeStatus ("dispute status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Escalated => "escalated",
    }
}

string_enum! {
    EarningStatus ("earning status") {
        Pending => "pending",
        Paid => "paid",
        Disputed => "disputed",
    }
}

string_enum! {
    /// Event categories shown in the activity feed.
    ActivityKind ("activity type") {
        NewReferrer => "new_referrer",
        PayoutProcessed => "payout_processed",
        FraudAlert => "fraud_alert",
        CampaignMilestone => "campaign_milestone",
        DisputeFiled => "dispute_filed",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Referrer
    }
}

impl Default for UserTier {
    fn default() -> Self {
        Self::Standard
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for CampaignStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for DisputeStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for EarningStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl DisputeStatus {
    pub fn is_resolved(&self) -> bool {
        *self != Self::Pending
    }

    /// A resolved dispute may move between resolutions (e.g. escalated ->
    /// approved) but never reopens.
    pub fn can_transition_to(&self, next: Self) -> bool {
        !self.is_resolved() || next.is_resolved()
    }
}

impl EarningStatus {
    /// `Paid` is terminal.
    pub fn can_transition_to(&self, next: Self) -> bool {
        *self != Self::Paid || next == Self::Paid
    }
}

// ---------------------------------------------------------------------------
// Postcode eligibility range
// ---------------------------------------------------------------------------

/// Inclusive postcode range a campaign accepts leads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostcodeRange {
    pub start: String,
    pub end: String,
}

impl PostcodeRange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (start, end) = (self.start.trim(), self.end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(ValidationError::invalid(
                "postcode",
                "start and end must be non-empty",
            ));
        }
        if compare_postcodes(start, end).is_gt() {
            return Err(ValidationError::invalid(
                "postcode",
                format!("start {start:?} is after end {end:?}"),
            ));
        }
        Ok(())
    }

    /// Whether `postcode` falls inside the range (inclusive on both ends).
    pub fn contains(&self, postcode: &str) -> bool {
        let code = postcode.trim();
        compare_postcodes(self.start.trim(), code).is_le()
            && compare_postcodes(code, self.end.trim()).is_le()
    }
}

// Numeric codes compare by value so "999" < "1000"; anything else falls back
// to a case-insensitive lexical order.
fn compare_postcodes(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.to_ascii_uppercase().cmp(&b.to_ascii_uppercase()),
    }
}
