//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped lookups take an
//! explicit `tenant_id` so isolation is enforced at the query, not
//! bolted on in the caller.

use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::role::{CreateRole, Role};
use crate::models::secret::{SaveSecret, Secret};
use crate::models::security_log::{CreateSecurityLog, SecurityLog};
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Repository for tenant management.
pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = CoreResult<Tenant>> + Send;

    fn get_by_id(&self, id: i64) -> impl Future<Output = CoreResult<Tenant>> + Send;

    /// Activate or deactivate a tenant. Deactivation implicitly
    /// invalidates every user's tokens: the auth layer rejects
    /// inactive tenants on login and refresh.
    fn set_active(
        &self,
        id: i64,
        is_active: bool,
    ) -> impl Future<Output = CoreResult<Tenant>> + Send;

    /// Hard delete. Only used to roll back failed provisioning.
    fn delete(&self, id: i64) -> impl Future<Output = CoreResult<()>> + Send;
}

/// Repository for user management and login bookkeeping.
pub trait UserRepository: Send + Sync {
    /// `input.password_hash` must already be hashed by the caller.
    fn create(&self, input: CreateUser) -> impl Future<Output = CoreResult<User>> + Send;

    fn get_by_id(&self, tenant_id: i64, id: i64) -> impl Future<Output = CoreResult<User>> + Send;

    /// Global lookup: login requests carry no tenant, the user row
    /// itself locates the tenant.
    fn get_by_email(&self, email: &str) -> impl Future<Output = CoreResult<User>> + Send;

    fn email_exists(&self, email: &str) -> impl Future<Output = CoreResult<bool>> + Send;

    fn update(
        &self,
        tenant_id: i64,
        id: i64,
        input: UpdateUser,
    ) -> impl Future<Output = CoreResult<User>> + Send;

    /// Atomically increment the failed-login counter; once the
    /// counter reaches `max_attempts`, `lock_until` becomes the
    /// lockout end. Concurrent failed attempts must not lose
    /// increments. Returns the updated user.
    fn record_failed_login(
        &self,
        tenant_id: i64,
        id: i64,
        max_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> impl Future<Output = CoreResult<User>> + Send;

    /// Atomically reset lockout state after a successful login:
    /// counter to zero, lockout cleared, login timestamps refreshed,
    /// security stamp rotated to `security_stamp`.
    fn record_successful_login(
        &self,
        tenant_id: i64,
        id: i64,
        security_stamp: &str,
    ) -> impl Future<Output = CoreResult<User>> + Send;
}

/// Repository for roles.
pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = CoreResult<Role>> + Send;

    fn get_by_id(&self, id: i64) -> impl Future<Output = CoreResult<Role>> + Send;

    fn get_by_name(&self, name: &str) -> impl Future<Output = CoreResult<Role>> + Send;
}

/// Repository for encrypted secrets.
///
/// Stores and returns ciphertext only; encryption is the secret
/// service's concern.
pub trait SecretRepository: Send + Sync {
    /// Returns the matching active, unexpired secret, if any.
    /// Deactivated or expired rows are never returned even though
    /// they remain physically present.
    fn get(
        &self,
        key: &str,
        tenant_id: i64,
        user_id: Option<i64>,
    ) -> impl Future<Output = CoreResult<Option<Secret>>> + Send;

    /// Upsert keyed on `(tenant_id, key, user_id)`. An existing row
    /// gets its value, description, and expiration replaced and is
    /// reactivated.
    fn save(&self, input: SaveSecret) -> impl Future<Output = CoreResult<Secret>> + Send;

    /// Soft delete (`is_active = false`) of a tenant-wide secret.
    fn deactivate(&self, key: &str, tenant_id: i64) -> impl Future<Output = CoreResult<()>> + Send;

    fn exists(&self, key: &str, tenant_id: i64) -> impl Future<Output = CoreResult<bool>> + Send;
}

/// Repository for refresh token lifecycle.
pub trait RefreshTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRefreshToken,
    ) -> impl Future<Output = CoreResult<RefreshToken>> + Send;

    fn get_by_user_and_hash(
        &self,
        user_id: i64,
        token_hash: &str,
    ) -> impl Future<Output = CoreResult<Option<RefreshToken>>> + Send;

    /// Conditional revoke for rotation: only succeeds while the token
    /// is still unrevoked, recording `replaced_by` for the audit
    /// trail. Returns `false` when another rotation already won —
    /// callers must treat that as replay and reject.
    fn revoke_replacing(
        &self,
        user_id: i64,
        token_hash: &str,
        replaced_by: &str,
    ) -> impl Future<Output = CoreResult<bool>> + Send;

    /// Revoke every active token for a user. Returns the number of
    /// tokens revoked.
    fn revoke_all_active_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = CoreResult<u64>> + Send;
}

/// Append-only repository for the security audit trail.
pub trait SecurityLogRepository: Send + Sync {
    fn append(
        &self,
        input: CreateSecurityLog,
    ) -> impl Future<Output = CoreResult<SecurityLog>> + Send;

    fn list_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = CoreResult<Vec<SecurityLog>>> + Send;
}
