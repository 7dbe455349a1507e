//! Results handed to the messaging layer.

use promo_store::PromoCode;

/// Result of a code check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user is not an active member (or the oracle could not tell).
    NotSubscribed,
    /// A code was already issued to this user.
    AlreadyRewarded,
    /// Subscribed, but no eligibility window is known for the user.
    SubscribedNoWindow,
    /// The eligibility window has passed.
    WindowExpired,
    /// A fresh code was written to the store.
    CodeIssued(PromoCode),
}

impl Outcome {
    /// Short label for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSubscribed => "not_subscribed",
            Self::AlreadyRewarded => "already_rewarded",
            Self::SubscribedNoWindow => "subscribed_no_window",
            Self::WindowExpired => "window_expired",
            Self::CodeIssued(_) => "code_issued",
        }
    }
}

/// Result of a greeting (`/start`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    /// Active member with nothing to claim.
    Subscribed,
    /// Active member inside the window; a check would issue a code.
    SubscribedEligible,
    /// Not a member and never seen before.
    NotSubscribed,
    /// Not a member now, but known to the store.
    Lapsed,
}

impl Greeting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::SubscribedEligible => "subscribed_eligible",
            Self::NotSubscribed => "not_subscribed",
            Self::Lapsed => "lapsed",
        }
    }
}
