use actix_web::HttpRequest;
use chrono::{DateTime, Utc};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Data-protection audit fields captured when someone opts in. Never removed,
/// not even after unsubscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRecord {
    pub consented_at: DateTime<Utc>,
    pub consent_ip: String,
}

/// Whether re-subscribing an existing row overwrites its consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPolicy {
    PreserveOriginal,
    RefreshOnResubscribe,
}

impl ConsentRecord {
    pub fn capture(request: &HttpRequest, now: DateTime<Utc>) -> ConsentRecord {
        let forwarded_for = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok());

        ConsentRecord {
            consented_at: now,
            consent_ip: client_ip(forwarded_for),
        }
    }
}

/// Best-effort origin: first entry of a forwarded-for chain.
pub fn client_ip(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_ORIGIN)
        .to_string()
}

impl ConsentPolicy {
    pub fn from_refresh_flag(refresh_on_resubscribe: bool) -> ConsentPolicy {
        if refresh_on_resubscribe {
            ConsentPolicy::RefreshOnResubscribe
        } else {
            ConsentPolicy::PreserveOriginal
        }
    }

    pub fn refreshes_on_resubscribe(&self) -> bool {
        matches!(self, ConsentPolicy::RefreshOnResubscribe)
    }
}
