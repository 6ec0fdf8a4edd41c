//! Persistent storage backed by sled.
//!
//! Each store keeps its records and secondary indexes in one tree,
//! with prefixed keys for the indexes. Uniqueness and ownership are
//! enforced by read-then-write checks; concurrent writers racing on
//! the same username or book are a known, accepted gap.

use std::path::Path;

use thiserror::Error;

pub mod books;
pub mod users;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying sled error.
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Record (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An account with this email already exists.
    #[error("Email already exists")]
    EmailExists,

    /// An account with this username already exists.
    #[error("Username already exists")]
    UsernameExists,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Password(String),

    /// Supplied secret does not match the stored hash.
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Open (or create) the sled database at the given directory.
///
/// # Errors
///
/// Returns error if the database cannot be opened.
pub fn open_db(path: &Path) -> Result<sled::Db, StoreError> {
    let db = sled::open(path.join("bookshelf"))?;
    tracing::debug!(path = %path.display(), "opened database");
    Ok(db)
}

/// Generate a prefixed random record identifier, e.g. `book_<uuid>`.
#[must_use]
pub(crate) fn record_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid_v4())
}

/// Generate a simple UUID v4.
fn uuid_v4() -> String {
    use rand::RngCore;
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);

    // Set version (4) and variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
