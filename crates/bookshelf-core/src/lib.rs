//! # Bookshelf Core
//!
//! Domain types, validation, configuration, and storage for the
//! Bookshelf book-review backend.
//!
//! This crate provides:
//! - Configuration loading and validation (JSON5 format)
//! - User records with argon2 password hashing at write time
//! - Book records with creation-ordered listing and ownership
//! - Input validation and normalization for all external fields

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod store;
pub mod validation;

pub use config::{AuthConfig, CloudinaryConfig, Config, ConfigError};
pub use store::books::{Book, BookStore};
pub use store::users::{PublicUser, User, UserStore};
pub use store::{StoreError, open_db};
pub use validation::ValidationError;
