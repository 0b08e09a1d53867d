//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Yields `None` instead of rejecting when the
//!   token is missing or invalid.

pub mod auth;
