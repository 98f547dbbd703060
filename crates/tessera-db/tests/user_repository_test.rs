//! Integration tests for the user repository, with a focus on the
//! atomic login bookkeeping.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tessera_core::error::CoreError;
use tessera_core::models::user::{CreateUser, UpdateUser};
use tessera_core::repository::UserRepository;
use tessera_db::repository::SurrealUserRepository;

async fn setup() -> SurrealUserRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    SurrealUserRepository::new(db)
}

fn alice(tenant_id: i64) -> CreateUser {
    CreateUser {
        tenant_id,
        email: "alice@example.com".into(),
        first_name: Some("Alice".into()),
        last_name: Some("Smith".into()),
        password_hash: "$argon2id$fake".into(),
        role_id: 7,
    }
}

#[tokio::test]
async fn create_and_lookup_by_email() {
    let repo = setup().await;
    let created = repo.create(alice(1)).await.unwrap();
    assert_eq!(created.access_failed_count, 0);
    assert!(created.lockout_end.is_none());
    assert!(created.is_active);

    let fetched = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.tenant_id, 1);

    assert!(repo.email_exists("alice@example.com").await.unwrap());
    assert!(!repo.email_exists("bob@example.com").await.unwrap());
}

#[tokio::test]
async fn get_by_id_enforces_tenant_scope() {
    let repo = setup().await;
    let created = repo.create(alice(1)).await.unwrap();

    assert!(repo.get_by_id(1, created.id).await.is_ok());
    let wrong_tenant = repo.get_by_id(2, created.id).await;
    assert!(matches!(wrong_tenant, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn failed_logins_arm_the_lockout_at_the_threshold() {
    let repo = setup().await;
    let user = repo.create(alice(1)).await.unwrap();
    let lock_until = Utc::now() + Duration::minutes(15);

    for expected in 1..=4u32 {
        let updated = repo
            .record_failed_login(1, user.id, 5, lock_until)
            .await
            .unwrap();
        assert_eq!(updated.access_failed_count, expected);
        assert!(updated.lockout_end.is_none(), "locked too early");
    }

    let locked = repo
        .record_failed_login(1, user.id, 5, lock_until)
        .await
        .unwrap();
    assert_eq!(locked.access_failed_count, 5);
    assert!(locked.lockout_end.is_some());
}

#[tokio::test]
async fn successful_login_resets_counters_and_rotates_stamp() {
    let repo = setup().await;
    let user = repo.create(alice(1)).await.unwrap();
    let lock_until = Utc::now() + Duration::minutes(15);

    for _ in 0..5 {
        repo.record_failed_login(1, user.id, 5, lock_until)
            .await
            .unwrap();
    }

    let reset = repo
        .record_successful_login(1, user.id, "stamp-1")
        .await
        .unwrap();
    assert_eq!(reset.access_failed_count, 0);
    assert!(reset.lockout_end.is_none());
    assert!(reset.last_successful_login.is_some());
    assert_eq!(reset.security_stamp.as_deref(), Some("stamp-1"));

    let again = repo
        .record_successful_login(1, user.id, "stamp-2")
        .await
        .unwrap();
    assert_eq!(again.security_stamp.as_deref(), Some("stamp-2"));
}

#[tokio::test]
async fn update_can_clear_the_lockout() {
    let repo = setup().await;
    let user = repo.create(alice(1)).await.unwrap();
    let lock_until = Utc::now() + Duration::minutes(15);

    for _ in 0..5 {
        repo.record_failed_login(1, user.id, 5, lock_until)
            .await
            .unwrap();
    }

    let cleared = repo
        .update(
            1,
            user.id,
            UpdateUser {
                lockout_end: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.lockout_end.is_none());

    let deactivated = repo
        .update(
            1,
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!deactivated.is_active);
}
