//! Integration tests for the authentication service against an
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tessera_auth::config::AuthConfig;
use tessera_auth::crypto::EncryptionService;
use tessera_auth::error::{AuthError, TokenError};
use tessera_auth::password::Argon2PasswordHasher;
use tessera_auth::provision::TenantProvisioning;
use tessera_auth::secrets::{JWT_SECRET_KEY, SecretService};
use tessera_auth::service::{
    AuthService, LoginInput, RefreshInput, RegisterUserInput,
};
use tessera_core::models::tenant::{CreateTenant, Tenant};
use tessera_core::models::user::{UpdateUser, User};
use tessera_core::repository::{
    RoleRepository, SecurityLogRepository, TenantRepository, UserRepository,
};
use tessera_db::repository::{
    SurrealRefreshTokenRepository, SurrealRoleRepository, SurrealSecretRepository,
    SurrealSecurityLogRepository, SurrealTenantRepository, SurrealUserRepository,
};

type Db = surrealdb::engine::local::Db;

type TestAuthService = AuthService<
    SurrealUserRepository<Db>,
    SurrealTenantRepository<Db>,
    SurrealRoleRepository<Db>,
    SurrealRefreshTokenRepository<Db>,
    SurrealSecretRepository<Db>,
    SurrealSecurityLogRepository<Db>,
    Argon2PasswordHasher,
>;

const PASSWORD: &str = "correct horse battery staple";

fn test_config() -> AuthConfig {
    AuthConfig {
        master_key: "test-master-key".into(),
        jwt_issuer: "tessera-test".into(),
        jwt_audience: "tessera-portal-test".into(),
        ..AuthConfig::default()
    }
}

fn service(db: &Surreal<Db>) -> TestAuthService {
    AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealRoleRepository::new(db.clone()),
        SurrealRefreshTokenRepository::new(db.clone()),
        SurrealSecretRepository::new(db.clone()),
        SurrealSecurityLogRepository::new(db.clone()),
        Argon2PasswordHasher::new(None),
        test_config(),
    )
}

/// Spin up in-memory DB, run migrations, provision a tenant (which
/// stores its signing secret), create the default role, and register
/// one user.
async fn setup() -> (TestAuthService, Tenant, User, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();

    let provisioning = TenantProvisioning::new(
        SurrealTenantRepository::new(db.clone()),
        SecretService::new(
            SurrealSecretRepository::new(db.clone()),
            EncryptionService::new(test_config().master_key),
        ),
    );
    let tenant = provisioning
        .register_tenant(CreateTenant {
            name: "Acme Corp".into(),
        })
        .await
        .unwrap();

    SurrealRoleRepository::new(db.clone())
        .create(tessera_core::models::role::CreateRole {
            name: "User".into(),
            description: "Default portal role".into(),
        })
        .await
        .unwrap();

    let auth = service(&db);
    let user = auth
        .register_user(RegisterUserInput {
            tenant_id: tenant.id,
            email: "alice@example.com".into(),
            password: PASSWORD.into(),
            first_name: Some("Alice".into()),
            last_name: Some("Smith".into()),
        })
        .await
        .unwrap();

    (auth, tenant, user, db)
}

fn login_input(password: &str) -> LoginInput {
    LoginInput {
        email: "alice@example.com".into(),
        password: password.into(),
        ip_address: Some("10.0.0.1".into()),
    }
}

#[tokio::test]
async fn login_happy_path_issues_a_validatable_token_pair() {
    let (auth, tenant, user, _db) = setup().await;

    let out = auth.login(login_input(PASSWORD)).await.unwrap();
    assert_eq!(out.user.id, user.id);
    assert!(out.user.last_successful_login.is_some());
    assert!(out.user.security_stamp.is_some());
    assert!(out.token_expires_at > Utc::now().timestamp());
    assert!(!out.refresh_token.is_empty());

    let (claims, ctx) = auth.validate_token(&out.access_token).await.unwrap();
    assert_eq!(ctx.tenant_id, tenant.id);
    assert_eq!(claims.tenant_id, tenant.id.to_string());
    assert_eq!(claims.tenant_name, "Acme Corp");
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, "alice@example.com");
    assert_eq!(claims.name, "Alice Smith");
    assert_eq!(claims.role, "User");
}

#[tokio::test]
async fn unknown_user_gets_the_same_error_as_a_bad_password() {
    let (auth, _tenant, _user, _db) = setup().await;

    let unknown = auth
        .login(LoginInput {
            email: "nobody@example.com".into(),
            password: PASSWORD.into(),
            ip_address: None,
        })
        .await;
    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));

    let bad_password = auth.login(login_input("wrong")).await;
    assert!(matches!(bad_password, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn failed_attempts_count_and_a_success_resets_them() {
    let (auth, tenant, user, _db) = setup().await;

    for _ in 0..3 {
        let result = auth.login(login_input("wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
    let counted = auth.users().get_by_id(tenant.id, user.id).await.unwrap();
    assert_eq!(counted.access_failed_count, 3);
    assert!(counted.lockout_end.is_none());

    auth.login(login_input(PASSWORD)).await.unwrap();
    let reset = auth.users().get_by_id(tenant.id, user.id).await.unwrap();
    assert_eq!(reset.access_failed_count, 0);
}

#[tokio::test]
async fn lockout_rejects_even_the_correct_password() {
    let (auth, _tenant, _user, db) = setup().await;

    for _ in 0..5 {
        let result = auth.login(login_input("wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    let locked = auth.login(login_input(PASSWORD)).await;
    assert!(matches!(locked, Err(AuthError::AccountLocked)));

    // The attempt shows up in the audit trail.
    let logs = SurrealSecurityLogRepository::new(db)
        .list_by_email("alice@example.com")
        .await
        .unwrap();
    assert!(logs.iter().any(|l| l.details == "account locked"));
}

#[tokio::test]
async fn an_expired_lockout_needs_no_manual_reset() {
    let (auth, tenant, user, _db) = setup().await;

    for _ in 0..5 {
        let _ = auth.login(login_input("wrong")).await;
    }
    assert!(matches!(
        auth.login(login_input(PASSWORD)).await,
        Err(AuthError::AccountLocked)
    ));

    // Rewind the lockout window into the past.
    auth.users()
        .update(
            tenant.id,
            user.id,
            UpdateUser {
                lockout_end: Some(Some(Utc::now() - Duration::seconds(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    auth.login(login_input(PASSWORD)).await.unwrap();
}

#[tokio::test]
async fn inactive_user_and_inactive_tenant_cannot_log_in() {
    let (auth, tenant, user, db) = setup().await;

    auth.users()
        .update(
            tenant.id,
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        auth.login(login_input(PASSWORD)).await,
        Err(AuthError::InvalidCredentials)
    ));

    auth.users()
        .update(
            tenant.id,
            user.id,
            UpdateUser {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    SurrealTenantRepository::new(db)
        .set_active(tenant.id, false)
        .await
        .unwrap();
    assert!(matches!(
        auth.login(login_input(PASSWORD)).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn refresh_rotates_the_token_and_replay_is_rejected() {
    let (auth, _tenant, _user, _db) = setup().await;

    let login = auth.login(login_input(PASSWORD)).await.unwrap();

    let refreshed = auth
        .refresh(RefreshInput {
            token: login.access_token.clone(),
            refresh_token: login.refresh_token.clone(),
            ip_address: None,
        })
        .await
        .unwrap();
    assert_ne!(refreshed.refresh_token, login.refresh_token);
    auth.validate_token(&refreshed.access_token).await.unwrap();

    // The old refresh token was revoked by the rotation.
    let replay = auth
        .refresh(RefreshInput {
            token: login.access_token,
            refresh_token: login.refresh_token,
            ip_address: None,
        })
        .await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenInvalid)));

    // The new one still works.
    auth.refresh(RefreshInput {
        token: refreshed.access_token,
        refresh_token: refreshed.refresh_token,
        ip_address: None,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn a_forged_refresh_token_is_rejected() {
    let (auth, _tenant, _user, _db) = setup().await;
    let login = auth.login(login_input(PASSWORD)).await.unwrap();

    let result = auth
        .refresh(RefreshInput {
            token: login.access_token,
            refresh_token: "forged-refresh-token".into(),
            ip_address: None,
        })
        .await;
    assert!(matches!(result, Err(AuthError::RefreshTokenInvalid)));
}

#[tokio::test]
async fn revoke_logs_out_everywhere() {
    let (auth, _tenant, _user, _db) = setup().await;

    let first = auth.login(login_input(PASSWORD)).await.unwrap();
    let second = auth.login(login_input(PASSWORD)).await.unwrap();

    let revoked = auth.revoke(&second.access_token).await.unwrap();
    assert_eq!(revoked, 2);

    for login in [first, second] {
        let result = auth
            .refresh(RefreshInput {
                token: login.access_token,
                refresh_token: login.refresh_token,
                ip_address: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::RefreshTokenInvalid)));
    }
}

#[tokio::test]
async fn deactivating_the_signing_secret_disables_the_tenant() {
    let (auth, tenant, _user, db) = setup().await;
    let login = auth.login(login_input(PASSWORD)).await.unwrap();

    SecretService::new(
        SurrealSecretRepository::new(db),
        EncryptionService::new(test_config().master_key),
    )
    .deactivate(JWT_SECRET_KEY, tenant.id)
    .await
    .unwrap();

    let result = auth.validate_token(&login.access_token).await;
    assert!(matches!(
        result,
        Err(AuthError::Token(TokenError::SigningKeyUnavailable))
    ));

    // Issuance is equally impossible.
    let result = auth.login(login_input(PASSWORD)).await;
    assert!(matches!(
        result,
        Err(AuthError::Token(TokenError::SigningKeyUnavailable))
    ));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (auth, tenant, _user, _db) = setup().await;

    let result = auth
        .register_user(RegisterUserInput {
            tenant_id: tenant.id,
            email: "alice@example.com".into(),
            password: "another password entirely".into(),
            first_name: None,
            last_name: None,
        })
        .await;
    assert!(matches!(result, Err(AuthError::EmailTaken)));
}
