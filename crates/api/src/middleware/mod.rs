//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated person from a JWT Bearer token.
//! - [`locale::RequestLocale`] -- the negotiated `Accept-Language` tag.

pub mod auth;
pub mod locale;
