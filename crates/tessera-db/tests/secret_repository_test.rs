//! Integration tests for the secret repository.
//!
//! The repository stores opaque strings; encryption concerns live a
//! layer up, so these tests use plain marker values.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tessera_core::models::secret::SaveSecret;
use tessera_core::repository::SecretRepository;
use tessera_db::repository::SurrealSecretRepository;

async fn setup() -> SurrealSecretRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    SurrealSecretRepository::new(db)
}

fn jwt_secret(tenant_id: i64, value: &str) -> SaveSecret {
    SaveSecret {
        tenant_id,
        user_id: None,
        key: "JWT_SECRET".into(),
        encrypted_value: value.into(),
        is_encrypted: true,
        description: "JWT signing secret".into(),
        expiration_date: None,
    }
}

#[tokio::test]
async fn save_and_get_roundtrip() {
    let repo = setup().await;
    let saved = repo.save(jwt_secret(1, "ciphertext-a")).await.unwrap();
    assert!(saved.is_active);

    let fetched = repo.get("JWT_SECRET", 1, None).await.unwrap().unwrap();
    assert_eq!(fetched.id, saved.id);
    assert_eq!(fetched.encrypted_value, "ciphertext-a");
}

#[tokio::test]
async fn save_is_an_upsert_per_scope() {
    let repo = setup().await;
    let first = repo.save(jwt_secret(1, "ciphertext-a")).await.unwrap();
    let second = repo.save(jwt_secret(1, "ciphertext-b")).await.unwrap();

    // Same scope, same row, replaced value.
    assert_eq!(first.id, second.id);
    let fetched = repo.get("JWT_SECRET", 1, None).await.unwrap().unwrap();
    assert_eq!(fetched.encrypted_value, "ciphertext-b");
}

#[tokio::test]
async fn tenant_scopes_are_isolated() {
    let repo = setup().await;
    repo.save(jwt_secret(1, "tenant-one")).await.unwrap();
    repo.save(jwt_secret(2, "tenant-two")).await.unwrap();

    let one = repo.get("JWT_SECRET", 1, None).await.unwrap().unwrap();
    let two = repo.get("JWT_SECRET", 2, None).await.unwrap().unwrap();
    assert_eq!(one.encrypted_value, "tenant-one");
    assert_eq!(two.encrypted_value, "tenant-two");
    assert!(repo.get("JWT_SECRET", 3, None).await.unwrap().is_none());
}

#[tokio::test]
async fn user_scope_is_distinct_from_tenant_scope() {
    let repo = setup().await;
    repo.save(jwt_secret(1, "tenant-wide")).await.unwrap();
    repo.save(SaveSecret {
        user_id: Some(99),
        encrypted_value: "user-scoped".into(),
        ..jwt_secret(1, "")
    })
    .await
    .unwrap();

    let tenant_wide = repo.get("JWT_SECRET", 1, None).await.unwrap().unwrap();
    let user_scoped = repo.get("JWT_SECRET", 1, Some(99)).await.unwrap().unwrap();
    assert_eq!(tenant_wide.encrypted_value, "tenant-wide");
    assert_eq!(user_scoped.encrypted_value, "user-scoped");
}

#[tokio::test]
async fn expired_secrets_are_treated_as_absent() {
    let repo = setup().await;
    repo.save(SaveSecret {
        expiration_date: Some(Utc::now() - Duration::minutes(1)),
        ..jwt_secret(1, "stale")
    })
    .await
    .unwrap();

    assert!(repo.get("JWT_SECRET", 1, None).await.unwrap().is_none());
    assert!(!repo.exists("JWT_SECRET", 1).await.unwrap());

    // A future expiry keeps the secret visible.
    repo.save(SaveSecret {
        expiration_date: Some(Utc::now() + Duration::hours(1)),
        ..jwt_secret(1, "fresh")
    })
    .await
    .unwrap();
    assert!(repo.get("JWT_SECRET", 1, None).await.unwrap().is_some());
}

#[tokio::test]
async fn deactivate_hides_but_save_reactivates() {
    let repo = setup().await;
    repo.save(jwt_secret(1, "ciphertext-a")).await.unwrap();

    repo.deactivate("JWT_SECRET", 1).await.unwrap();
    assert!(repo.get("JWT_SECRET", 1, None).await.unwrap().is_none());
    assert!(!repo.exists("JWT_SECRET", 1).await.unwrap());

    repo.save(jwt_secret(1, "ciphertext-new")).await.unwrap();
    let fetched = repo.get("JWT_SECRET", 1, None).await.unwrap().unwrap();
    assert_eq!(fetched.encrypted_value, "ciphertext-new");
    assert!(repo.exists("JWT_SECRET", 1).await.unwrap());
}
