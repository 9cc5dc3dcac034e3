//! Authentication
//!
//! - [`JwtService`]: validates (and for tests, issues) HS256 tokens
//! - [`CurrentUser`]: extractor for protected handlers

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
