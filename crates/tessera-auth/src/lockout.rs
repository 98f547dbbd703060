//! Account lockout policy.
//!
//! The policy decides; the counters live on the user row and are
//! updated atomically by the repository so concurrent attempts cannot
//! dodge the threshold.

use chrono::{DateTime, Duration, Utc};
use tessera_core::models::user::User;

#[derive(Debug, Clone, Copy)]
pub struct LoginPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl LoginPolicy {
    pub fn new(max_failed_attempts: u32, lockout_duration_secs: u64) -> Self {
        Self {
            max_failed_attempts,
            lockout_duration: Duration::seconds(lockout_duration_secs as i64),
        }
    }

    /// A user is locked out while `lockout_end` lies in the future.
    /// An expired window needs no manual reset.
    pub fn is_locked_out(&self, user: &User) -> bool {
        user.lockout_end.is_some_and(|end| end > Utc::now())
    }

    /// The lockout end to apply if the next recorded failure crosses
    /// the threshold.
    pub fn lockout_end_on_failure(&self) -> DateTime<Utc> {
        Utc::now() + self.lockout_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_lockout(lockout_end: Option<DateTime<Utc>>) -> User {
        User {
            id: 1,
            tenant_id: 1,
            email: "a@example.com".into(),
            first_name: None,
            last_name: None,
            password_hash: String::new(),
            role_id: 1,
            is_active: true,
            access_failed_count: 0,
            lockout_end,
            last_login_date: None,
            last_successful_login: None,
            last_password_change_date: None,
            security_stamp: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn future_lockout_blocks() {
        let policy = LoginPolicy::new(5, 900);
        let user = user_with_lockout(Some(Utc::now() + Duration::minutes(10)));
        assert!(policy.is_locked_out(&user));
    }

    #[test]
    fn expired_lockout_self_heals() {
        let policy = LoginPolicy::new(5, 900);
        let user = user_with_lockout(Some(Utc::now() - Duration::seconds(1)));
        assert!(!policy.is_locked_out(&user));
    }

    #[test]
    fn no_lockout_by_default() {
        let policy = LoginPolicy::new(5, 900);
        assert!(!policy.is_locked_out(&user_with_lockout(None)));
    }

    #[test]
    fn lockout_end_uses_configured_duration() {
        let policy = LoginPolicy::new(5, 900);
        let end = policy.lockout_end_on_failure();
        let delta = end - Utc::now();
        assert!(delta > Duration::seconds(895) && delta <= Duration::seconds(900));
    }
}
