//! Integration tests for the refresh token repository's rotation and
//! revocation guarantees.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tessera_core::models::refresh_token::CreateRefreshToken;
use tessera_core::repository::RefreshTokenRepository;
use tessera_db::repository::SurrealRefreshTokenRepository;

async fn setup() -> SurrealRefreshTokenRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    SurrealRefreshTokenRepository::new(db)
}

fn token_for(user_id: i64, hash: &str) -> CreateRefreshToken {
    CreateRefreshToken {
        user_id,
        token_hash: hash.into(),
        expiry_date: Utc::now() + Duration::days(7),
        created_by_ip: Some("10.0.0.1".into()),
    }
}

#[tokio::test]
async fn create_and_fetch() {
    let repo = setup().await;
    let created = repo.create(token_for(1, "hash-a")).await.unwrap();
    assert!(created.revoked_at.is_none());
    assert!(created.is_active(Utc::now()));

    let fetched = repo.get_by_user_and_hash(1, "hash-a").await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);

    // The hash is scoped to its user.
    assert!(repo.get_by_user_and_hash(2, "hash-a").await.unwrap().is_none());
    assert!(repo.get_by_user_and_hash(1, "hash-b").await.unwrap().is_none());
}

#[tokio::test]
async fn revoke_replacing_succeeds_exactly_once() {
    let repo = setup().await;
    repo.create(token_for(1, "hash-a")).await.unwrap();

    let first = repo.revoke_replacing(1, "hash-a", "hash-b").await.unwrap();
    assert!(first);

    // Second presentation of the same token is replay.
    let second = repo.revoke_replacing(1, "hash-a", "hash-c").await.unwrap();
    assert!(!second);

    let row = repo.get_by_user_and_hash(1, "hash-a").await.unwrap().unwrap();
    assert!(row.revoked_at.is_some());
    assert_eq!(row.replaced_by_token.as_deref(), Some("hash-b"));
    assert!(!row.is_active(Utc::now()));
}

#[tokio::test]
async fn revoked_rows_are_kept_not_deleted() {
    let repo = setup().await;
    repo.create(token_for(1, "hash-a")).await.unwrap();
    repo.revoke_replacing(1, "hash-a", "hash-b").await.unwrap();

    // The row is still readable after revocation; that is how replay
    // is told apart from a forged token.
    assert!(repo.get_by_user_and_hash(1, "hash-a").await.unwrap().is_some());
}

#[tokio::test]
async fn revoke_all_only_touches_active_tokens_of_that_user() {
    let repo = setup().await;
    repo.create(token_for(1, "hash-a")).await.unwrap();
    repo.create(token_for(1, "hash-b")).await.unwrap();
    repo.create(token_for(2, "hash-c")).await.unwrap();
    repo.revoke_replacing(1, "hash-a", "hash-b").await.unwrap();

    let revoked = repo.revoke_all_active_for_user(1).await.unwrap();
    assert_eq!(revoked, 1);

    let other = repo.get_by_user_and_hash(2, "hash-c").await.unwrap().unwrap();
    assert!(other.revoked_at.is_none());

    // Nothing left to revoke.
    assert_eq!(repo.revoke_all_active_for_user(1).await.unwrap(), 0);
}
