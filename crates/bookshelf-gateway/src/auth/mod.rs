//! Authentication and authorization.
//!
//! This module provides:
//! - Signed session token issuance and verification
//! - The authorization gate: an extractor that resolves the bearer
//!   token on protected routes to a persisted user

mod jwt;
mod middleware;

pub use jwt::{Claims, TokenCodec};
pub use middleware::{AuthState, CurrentUser};
