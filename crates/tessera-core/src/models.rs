//! Domain model types.

pub mod refresh_token;
pub mod role;
pub mod secret;
pub mod security_log;
pub mod tenant;
pub mod user;
