//! User model and storage.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StoreError, record_id};

/// A registered user.
///
/// Immutable after creation; never deleted by this backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID (`user_<uuid>`).
    pub id: String,
    /// Unique username for display.
    pub username: String,
    /// Unique, normalized email used for login.
    pub email: String,
    /// Argon2 password hash (stored only, never exposed in the API).
    pub password_hash: String,
    /// Avatar URL, derived from the username at registration.
    pub profile_image: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given credentials.
    ///
    /// The password is hashed here, at write time; the plaintext is
    /// never stored.
    ///
    /// # Errors
    ///
    /// Returns error if password hashing fails.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: &str,
        profile_image: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let password_hash = hash_password(password)?;

        Ok(Self {
            id: record_id("user"),
            username: username.into(),
            email: email.into(),
            password_hash,
            profile_image: profile_image.into(),
            created_at: Utc::now(),
        })
    }

    /// Verify a password against this user's hash.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidCredentials` if it doesn't match.
    pub fn verify_password(&self, password: &str) -> Result<(), StoreError> {
        verify_password(password, &self.password_hash)
    }

    /// The publicly-viewable subset of this record (no password hash).
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// Public user representation (for API responses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    /// Unique user ID.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub profile_image: String,
}

/// Derive the default avatar URL for a username.
///
/// Deterministic: the same username always yields the same URL.
#[must_use]
pub fn default_avatar(username: &str) -> String {
    format!("https://api.dicebear.com/9.x/avataaars/svg?seed={username}")
}

/// User store backed by sled.
///
/// One tree holds user records keyed by id plus `idx:email:` and
/// `idx:username:` entries mapping each unique field to the id.
pub struct UserStore {
    tree: sled::Tree,
}

impl UserStore {
    /// Open the user store in an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if the tree cannot be opened.
    pub fn open(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("users")?;
        Ok(Self { tree })
    }

    /// Create a new user, enforcing email and username uniqueness.
    ///
    /// The email is checked before the username so a caller who
    /// collides on both always sees the email conflict.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailExists` or `StoreError::UsernameExists`
    /// on collision, or a storage error.
    pub fn create(&self, user: &User) -> Result<(), StoreError> {
        if self.get_by_email(&user.email)?.is_some() {
            return Err(StoreError::EmailExists);
        }
        if self.get_by_username(&user.username)?.is_some() {
            return Err(StoreError::UsernameExists);
        }

        let value = serde_json::to_vec(user)?;
        self.tree.insert(user.id.as_bytes(), value)?;
        self.tree
            .insert(format!("idx:email:{}", user.email).as_bytes(), user.id.as_bytes())?;
        self.tree.insert(
            format!("idx:username:{}", user.username).as_bytes(),
            user.id.as_bytes(),
        )?;
        self.tree.flush()?;

        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        match self.tree.get(id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Get a user by normalized email.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.get_by_index(&format!("idx:email:{email}"))
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.get_by_index(&format!("idx:username:{username}"))
    }

    fn get_by_index(&self, key: &str) -> Result<Option<User>, StoreError> {
        match self.tree.get(key.as_bytes())? {
            Some(id_bytes) => {
                let id = String::from_utf8_lossy(&id_bytes).into_owned();
                self.get(&id)
            }
            None => Ok(None),
        }
    }

    /// Count registered users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tree
            .iter()
            .filter(|r| {
                r.as_ref()
                    .map(|(k, _)| k.starts_with(b"user_"))
                    .unwrap_or(false)
            })
            .count()
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("user_count", &self.count())
            .finish_non_exhaustive()
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StoreError::Password(e.to_string()))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), StoreError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| StoreError::Password(format!("Invalid hash: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| StoreError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (UserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = crate::store::open_db(temp_dir.path()).unwrap();
        (UserStore::open(&db).unwrap(), temp_dir)
    }

    fn sample_user(username: &str, email: &str) -> User {
        User::new(username, email, "password123", default_avatar(username)).unwrap()
    }

    #[test]
    fn test_user_creation() {
        let user = sample_user("reader", "reader@example.com");
        assert!(user.id.starts_with("user_"));
        assert_eq!(user.username, "reader");
        assert_ne!(user.password_hash, "password123");
    }

    #[test]
    fn test_password_verification() {
        let user = sample_user("reader", "reader@example.com");
        assert!(user.verify_password("password123").is_ok());
        assert!(matches!(
            user.verify_password("wrongpassword"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_public_view_excludes_hash() {
        let user = sample_user("reader", "reader@example.com");
        let json = serde_json::to_string(&user.to_public()).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("reader@example.com"));
    }

    #[test]
    fn test_default_avatar_deterministic() {
        assert_eq!(default_avatar("ada"), default_avatar("ada"));
        assert_ne!(default_avatar("ada"), default_avatar("grace"));
    }

    #[test]
    fn test_create_and_lookup() {
        let (store, _dir) = open_store();

        let user = sample_user("reader", "reader@example.com");
        store.create(&user).unwrap();
        assert_eq!(store.count(), 1);

        let by_id = store.get(&user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "reader");

        let by_email = store.get_by_email("reader@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_name = store.get_by_username("reader").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
    }

    #[test]
    fn test_email_conflict_checked_before_username() {
        let (store, _dir) = open_store();
        store.create(&sample_user("reader", "reader@example.com")).unwrap();

        // Same email AND same username: email error wins
        let both = sample_user("reader", "reader@example.com");
        assert!(matches!(store.create(&both), Err(StoreError::EmailExists)));

        // Same email, different username
        let email_only = sample_user("other", "reader@example.com");
        assert!(matches!(store.create(&email_only), Err(StoreError::EmailExists)));

        // Same username, different email
        let name_only = sample_user("reader", "other@example.com");
        assert!(matches!(store.create(&name_only), Err(StoreError::UsernameExists)));
    }
}
