//! SurrealDB implementations of the `tessera-core` repository
//! traits.

mod refresh_token;
mod role;
mod secret;
mod security_log;
mod tenant;
mod user;

pub use refresh_token::SurrealRefreshTokenRepository;
pub use role::SurrealRoleRepository;
pub use secret::SurrealSecretRepository;
pub use security_log::SurrealSecurityLogRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;

use rand::Rng;

/// Record IDs are random positive 63-bit integers generated
/// client-side, so an insert needs no round-trip for ID allocation.
pub(crate) fn new_record_id() -> i64 {
    rand::rng().random_range(1..i64::MAX)
}
