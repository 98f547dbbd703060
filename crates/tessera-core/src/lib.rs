//! Tessera Core — domain models, repository contracts, and shared
//! error types for the multi-tenant portal backend.
//!
//! This crate has no I/O of its own: persistence lives behind the
//! traits in [`repository`], and the auth crate composes them into
//! use cases.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;

pub use context::TenantContext;
pub use error::{CoreError, CoreResult};
