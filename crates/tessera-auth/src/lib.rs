//! Tessera Auth — multi-tenant password authentication, per-tenant
//! JWT issuance and validation, refresh token lifecycle, and account
//! lockout.
//!
//! The central invariant: every tenant signs its tokens with its own
//! secret, stored encrypted at rest. Validation is a two-phase
//! protocol — the tenant is read from the unsigned token only to
//! select the key, then everything is verified against that key.

pub mod audit;
pub mod config;
pub mod crypto;
pub mod error;
pub mod lockout;
pub mod password;
pub mod provision;
pub mod secrets;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::{AuthError, CryptoError, TokenError};
pub use service::{
    AuthService, LoginInput, LoginOutput, RefreshInput, RefreshOutput, RegisterUserInput,
};
pub use token::AccessTokenClaims;
