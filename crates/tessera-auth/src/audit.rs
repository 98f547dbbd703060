//! Authentication audit trail.

use tessera_core::models::security_log::CreateSecurityLog;
use tessera_core::repository::SecurityLogRepository;
use tracing::{info, warn};

pub const EVENT_LOGIN: &str = "login";
pub const EVENT_REFRESH: &str = "token_refresh";
pub const EVENT_REVOKE: &str = "token_revoke";

/// Writes security events to the append-only log and mirrors them to
/// tracing. A failure to persist an entry is logged and swallowed: it
/// must never fail the authentication operation itself.
#[derive(Clone)]
pub struct AuthAuditLogger<L: SecurityLogRepository> {
    repo: L,
}

impl<L: SecurityLogRepository> AuthAuditLogger<L> {
    pub fn new(repo: L) -> Self {
        Self { repo }
    }

    pub async fn log_event(
        &self,
        event_type: &str,
        email: &str,
        success: bool,
        details: &str,
        ip_address: Option<&str>,
    ) {
        if success {
            info!(event_type, email, details, "auth event");
        } else {
            warn!(event_type, email, details, "auth event failed");
        }

        let entry = CreateSecurityLog {
            event_type: event_type.to_string(),
            email: email.to_string(),
            success,
            details: details.to_string(),
            ip_address: ip_address.map(str::to_string),
        };

        if let Err(e) = self.repo.append(entry).await {
            warn!(error = %e, event_type, "failed to append security log entry");
        }
    }
}
