use chrono::{DateTime, Utc};

/// Logical lifecycle state, derived from the `confirmed` flag and the
/// `unsubscribed_at` timestamp. No state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberStatus {
    Pending,
    Active,
    Inactive,
}

impl SubscriberStatus {
    /// An unsubscribed row is inactive regardless of `confirmed`.
    pub fn from_flags(confirmed: bool, unsubscribed_at: Option<DateTime<Utc>>) -> SubscriberStatus {
        match (confirmed, unsubscribed_at) {
            (_, Some(_)) => SubscriberStatus::Inactive,
            (true, None) => SubscriberStatus::Active,
            (false, None) => SubscriberStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SubscriberStatus::Pending)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriberStatus::Active)
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, SubscriberStatus::Inactive)
    }
}
