//! Tessera Server — Application entry point.
//!
//! Wires the SurrealDB repositories into the authentication service.

use tessera_auth::password::Argon2PasswordHasher;
use tessera_auth::{AuthConfig, AuthService};
use tessera_db::repository::{
    SurrealRefreshTokenRepository, SurrealRoleRepository, SurrealSecretRepository,
    SurrealSecurityLogRepository, SurrealTenantRepository, SurrealUserRepository,
};
use tessera_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tessera=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Tessera server...");

    let db_config = DbConfig {
        url: env_or("TESSERA_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("TESSERA_DB_NAMESPACE", "tessera"),
        database: env_or("TESSERA_DB_DATABASE", "main"),
        username: env_or("TESSERA_DB_USERNAME", "root"),
        password: env_or("TESSERA_DB_PASSWORD", "root"),
    };

    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = tessera_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Migrations failed");
        std::process::exit(1);
    }

    let master_key = match std::env::var("TESSERA_MASTER_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            tracing::error!("TESSERA_MASTER_KEY must be set");
            std::process::exit(1);
        }
    };

    let auth_config = AuthConfig {
        master_key,
        jwt_issuer: env_or("TESSERA_JWT_ISSUER", "tessera"),
        jwt_audience: env_or("TESSERA_JWT_AUDIENCE", "tessera-portal"),
        pepper: std::env::var("TESSERA_PASSWORD_PEPPER").ok(),
        ..AuthConfig::default()
    };

    let db = manager.client().clone();
    let hasher = Argon2PasswordHasher::new(auth_config.pepper.clone());
    let _auth = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealRoleRepository::new(db.clone()),
        SurrealRefreshTokenRepository::new(db.clone()),
        SurrealSecretRepository::new(db.clone()),
        SurrealSecurityLogRepository::new(db),
        hasher,
        auth_config,
    );

    tracing::info!("Authentication service ready.");

    // TODO: Start REST API server

    tracing::info!("Tessera server stopped.");
}
