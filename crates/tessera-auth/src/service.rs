//! Authentication orchestration: login, token refresh, revocation,
//! and user registration.
//!
//! Generic over the repository traits so this crate never depends on
//! the database crate; the server wires concrete repositories in.

use chrono::{Duration, Utc};
use tessera_core::TenantContext;
use tessera_core::error::CoreError;
use tessera_core::models::refresh_token::CreateRefreshToken;
use tessera_core::models::user::{CreateUser, User};
use tessera_core::repository::{
    RefreshTokenRepository, RoleRepository, SecretRepository, SecurityLogRepository,
    TenantRepository, UserRepository,
};
use uuid::Uuid;

use crate::audit::{AuthAuditLogger, EVENT_LOGIN, EVENT_REFRESH, EVENT_REVOKE};
use crate::config::AuthConfig;
use crate::crypto::EncryptionService;
use crate::error::{AuthError, TokenError};
use crate::lockout::LoginPolicy;
use crate::password::PasswordHasher;
use crate::secrets::SecretService;
use crate::token::{self, AccessTokenClaims, TokenService};

/// Role assigned to self-registered users.
pub const DEFAULT_ROLE: &str = "User";

#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub access_token: String,
    /// Raw refresh token; only its hash is stored.
    pub refresh_token: String,
    /// Unix timestamp at which the access token expires.
    pub token_expires_at: i64,
}

#[derive(Debug)]
pub struct RefreshInput {
    /// The (typically expired) access token.
    pub token: String,
    pub refresh_token: String,
    pub ip_address: Option<String>,
}

#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: i64,
}

#[derive(Debug)]
pub struct RegisterUserInput {
    pub tenant_id: i64,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Composes the authentication use cases.
pub struct AuthService<U, T, R, F, S, L, H>
where
    U: UserRepository,
    T: TenantRepository,
    R: RoleRepository,
    F: RefreshTokenRepository,
    S: SecretRepository,
    L: SecurityLogRepository,
    H: PasswordHasher,
{
    user_repo: U,
    tenant_repo: T,
    role_repo: R,
    refresh_repo: F,
    tokens: TokenService<S>,
    audit: AuthAuditLogger<L>,
    hasher: H,
    policy: LoginPolicy,
    config: AuthConfig,
}

impl<U, T, R, F, S, L, H> AuthService<U, T, R, F, S, L, H>
where
    U: UserRepository,
    T: TenantRepository,
    R: RoleRepository,
    F: RefreshTokenRepository,
    S: SecretRepository,
    L: SecurityLogRepository,
    H: PasswordHasher,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: U,
        tenant_repo: T,
        role_repo: R,
        refresh_repo: F,
        secret_repo: S,
        log_repo: L,
        hasher: H,
        config: AuthConfig,
    ) -> Self {
        let crypto = EncryptionService::new(config.master_key.clone());
        let policy = LoginPolicy::new(config.max_failed_attempts, config.lockout_duration_secs);
        let tokens = TokenService::new(SecretService::new(secret_repo, crypto), config.clone());

        Self {
            user_repo,
            tenant_repo,
            role_repo,
            refresh_repo,
            tokens,
            audit: AuthAuditLogger::new(log_repo),
            hasher,
            policy,
            config,
        }
    }

    /// Authenticate with email and password; on success issue an
    /// access/refresh token pair.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        let ip = input.ip_address.as_deref();

        // 1. Look up the user. Unknown and inactive accounts are
        //    indistinguishable from a bad password.
        let user = match self.user_repo.get_by_email(&input.email).await {
            Ok(user) => user,
            Err(CoreError::NotFound { .. }) => {
                self.audit
                    .log_event(EVENT_LOGIN, &input.email, false, "user not found", ip)
                    .await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            self.audit
                .log_event(EVENT_LOGIN, &input.email, false, "user inactive", ip)
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        // 2. The owning tenant must be active too.
        let tenant = self.tenant_repo.get_by_id(user.tenant_id).await?;
        if !tenant.is_active {
            self.audit
                .log_event(EVENT_LOGIN, &input.email, false, "tenant inactive", ip)
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        // 3. Lockout check comes before password verification, so a
        //    locked account rejects even the correct password.
        if self.policy.is_locked_out(&user) {
            self.audit
                .log_event(EVENT_LOGIN, &input.email, false, "account locked", ip)
                .await;
            return Err(AuthError::AccountLocked);
        }

        // 4. Verify the password. A failure is recorded atomically so
        //    parallel attempts cannot dodge the counter.
        if !self.hasher.verify(&input.password, &user.password_hash)? {
            self.user_repo
                .record_failed_login(
                    user.tenant_id,
                    user.id,
                    self.policy.max_failed_attempts,
                    self.policy.lockout_end_on_failure(),
                )
                .await?;
            self.audit
                .log_event(EVENT_LOGIN, &input.email, false, "wrong password", ip)
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        // 5. Success: reset counters and rotate the security stamp.
        let stamp = Uuid::new_v4().to_string();
        let user = self
            .user_repo
            .record_successful_login(user.tenant_id, user.id, &stamp)
            .await?;

        // 6. Issue the token pair.
        let role = self.role_repo.get_by_id(user.role_id).await?;
        let expires_at = Utc::now().timestamp() + self.config.access_token_lifetime_secs as i64;
        let access_token = self.tokens.issue_access_token(&user, &tenant, &role).await?;
        let refresh_token = self.issue_refresh_token(user.id, ip).await?;

        self.audit
            .log_event(EVENT_LOGIN, &input.email, true, "login successful", ip)
            .await;

        Ok(LoginOutput {
            user,
            access_token,
            refresh_token,
            token_expires_at: expires_at,
        })
    }

    /// Rotate a refresh token and reissue the access token.
    ///
    /// The presented access token may be expired but must otherwise
    /// verify against its tenant's key. The old refresh token is
    /// revoked in the same step that records its replacement; a
    /// second presentation of it is replay and is rejected.
    pub async fn refresh(&self, input: RefreshInput) -> Result<RefreshOutput, AuthError> {
        let ip = input.ip_address.as_deref();

        let claims = self.tokens.validate_ignoring_expiry(&input.token).await?;
        let ctx = tenant_context(&claims)?;
        let user_id = subject_id(&claims)?;

        let presented_hash = token::hash_refresh_token(&input.refresh_token);
        let stored = self
            .refresh_repo
            .get_by_user_and_hash(user_id, &presented_hash)
            .await?;
        let Some(stored) = stored else {
            self.audit
                .log_event(EVENT_REFRESH, &claims.email, false, "refresh token unknown", ip)
                .await;
            return Err(AuthError::RefreshTokenInvalid);
        };

        if !stored.is_active(Utc::now()) {
            self.audit
                .log_event(
                    EVENT_REFRESH,
                    &claims.email,
                    false,
                    "refresh token expired or revoked",
                    ip,
                )
                .await;
            return Err(AuthError::RefreshTokenInvalid);
        }

        // Rotation: the conditional revoke lets at most one
        // concurrent refresh win; every loser sees a replay.
        let new_raw = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&new_raw);
        let rotated = self
            .refresh_repo
            .revoke_replacing(user_id, &stored.token_hash, &new_hash)
            .await?;
        if !rotated {
            self.audit
                .log_event(EVENT_REFRESH, &claims.email, false, "refresh token replayed", ip)
                .await;
            return Err(AuthError::RefreshTokenInvalid);
        }

        // The user and tenant must still be active and the user still
        // has to exist within the token's tenant.
        let user = match self.user_repo.get_by_id(ctx.tenant_id, user_id).await {
            Ok(user) => user,
            Err(CoreError::NotFound { .. }) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }
        let tenant = self.tenant_repo.get_by_id(ctx.tenant_id).await?;
        if !tenant.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let role = self.role_repo.get_by_id(user.role_id).await?;
        let expires_at = Utc::now().timestamp() + self.config.access_token_lifetime_secs as i64;
        let access_token = self.tokens.issue_access_token(&user, &tenant, &role).await?;

        let expiry =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);
        self.refresh_repo
            .create(CreateRefreshToken {
                user_id,
                token_hash: new_hash,
                expiry_date: expiry,
                created_by_ip: ip.map(str::to_string),
            })
            .await?;

        self.audit
            .log_event(EVENT_REFRESH, &claims.email, true, "token refreshed", ip)
            .await;

        Ok(RefreshOutput {
            access_token,
            refresh_token: new_raw,
            token_expires_at: expires_at,
        })
    }

    /// Revoke every active refresh token for the token's user
    /// (logout everywhere). Returns the number revoked.
    pub async fn revoke(&self, access_token: &str) -> Result<u64, AuthError> {
        let claims = self.tokens.validate_ignoring_expiry(access_token).await?;
        let user_id = subject_id(&claims)?;

        let revoked = self.refresh_repo.revoke_all_active_for_user(user_id).await?;
        self.audit
            .log_event(
                EVENT_REVOKE,
                &claims.email,
                true,
                &format!("{revoked} refresh tokens revoked"),
                None,
            )
            .await;
        Ok(revoked)
    }

    /// Validate a bearer token and return its verified claims plus
    /// the tenant context derived from them. This is the only way a
    /// [`TenantContext`] enters the request path.
    pub async fn validate_token(
        &self,
        token: &str,
    ) -> Result<(AccessTokenClaims, TenantContext), AuthError> {
        let claims = self.tokens.validate(token).await?;
        let ctx = tenant_context(&claims)?;
        Ok((claims, ctx))
    }

    /// Register a new user in a tenant with the default role.
    pub async fn register_user(&self, input: RegisterUserInput) -> Result<User, AuthError> {
        if self.user_repo.email_exists(&input.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let role = self.role_repo.get_by_name(DEFAULT_ROLE).await?;
        let password_hash = self.hasher.hash(&input.password)?;

        let user = self
            .user_repo
            .create(CreateUser {
                tenant_id: input.tenant_id,
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
                role_id: role.id,
            })
            .await?;
        Ok(user)
    }

    /// Direct access to the user repository, for admin flows that
    /// live outside the login path.
    pub fn users(&self) -> &U {
        &self.user_repo
    }

    async fn issue_refresh_token(&self, user_id: i64, ip: Option<&str>) -> Result<String, AuthError> {
        let raw = token::generate_refresh_token();
        let expiry =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        self.refresh_repo
            .create(CreateRefreshToken {
                user_id,
                token_hash: token::hash_refresh_token(&raw),
                expiry_date: expiry,
                created_by_ip: ip.map(str::to_string),
            })
            .await?;

        Ok(raw)
    }
}

fn tenant_context(claims: &AccessTokenClaims) -> Result<TenantContext, AuthError> {
    let tenant_id = claims
        .tenant_id
        .parse::<i64>()
        .map_err(|_| TokenError::TenantMissing)?;
    Ok(TenantContext::new(tenant_id))
}

fn subject_id(claims: &AccessTokenClaims) -> Result<i64, AuthError> {
    claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::Token(TokenError::Malformed))
}
