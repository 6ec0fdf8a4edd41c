//! Book model and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StoreError, record_id};

/// A book entry shared by a user.
///
/// The owner is fixed at creation and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique book ID (`book_<uuid>`).
    pub id: String,
    /// Book title.
    pub title: String,
    /// Review caption.
    pub caption: String,
    /// Rating, 1-5.
    pub rating: u8,
    /// URL of the externally hosted cover image.
    pub image: String,
    /// ID of the owning user.
    pub user: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// Insertion sequence, assigned by the store. Orders listings when
    /// creation timestamps collide.
    #[serde(default)]
    pub seq: u64,
}

impl Book {
    /// Create a new book entry owned by the given user.
    ///
    /// The insertion sequence is assigned when the entry is persisted.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        caption: impl Into<String>,
        rating: u8,
        image: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: record_id("book"),
            title: title.into(),
            caption: caption.into(),
            rating,
            image: image.into(),
            user: owner.into(),
            created_at: Utc::now(),
            seq: 0,
        }
    }
}

/// Book store backed by sled.
///
/// One tree holds book records keyed by id plus two indexes:
/// `ord:<seq>` for global creation-order listing and
/// `own:<user>:<seq>` for per-owner listing. Sequences are monotonic,
/// so reverse index scans yield newest-first with a stable tie-break.
pub struct BookStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl BookStore {
    /// Open the book store in an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if the tree cannot be opened.
    pub fn open(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("books")?;
        Ok(Self {
            db: db.clone(),
            tree,
        })
    }

    /// Persist a new book, assigning its insertion sequence.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn create(&self, book: &mut Book) -> Result<(), StoreError> {
        book.seq = self.db.generate_id()?;

        let value = serde_json::to_vec(book)?;
        self.tree.insert(book.id.as_bytes(), value)?;
        self.tree
            .insert(ord_key(book.seq).as_bytes(), book.id.as_bytes())?;
        self.tree
            .insert(own_key(&book.user, book.seq).as_bytes(), book.id.as_bytes())?;
        self.tree.flush()?;

        Ok(())
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get(&self, id: &str) -> Result<Option<Book>, StoreError> {
        match self.tree.get(id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// List books newest-first, skipping `offset` and returning at most
    /// `limit`.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list(&self, offset: u64, limit: u64) -> Result<Vec<Book>, StoreError> {
        self.resolve_index(
            self.tree
                .scan_prefix(b"ord:")
                .rev()
                .skip(offset as usize)
                .take(limit as usize),
        )
    }

    /// List all books owned by a user, newest-first.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list_by_owner(&self, user_id: &str) -> Result<Vec<Book>, StoreError> {
        self.resolve_index(
            self.tree
                .scan_prefix(format!("own:{user_id}:").as_bytes())
                .rev(),
        )
    }

    fn resolve_index(
        &self,
        entries: impl Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    ) -> Result<Vec<Book>, StoreError> {
        let mut books = Vec::new();
        for entry in entries {
            let (_, id_bytes) = entry?;
            let id = String::from_utf8_lossy(&id_bytes).into_owned();
            if let Some(book) = self.get(&id)? {
                books.push(book);
            }
        }
        Ok(books)
    }

    /// Count all books.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.tree
            .iter()
            .filter(|r| {
                r.as_ref()
                    .map(|(k, _)| k.starts_with(b"book_"))
                    .unwrap_or(false)
            })
            .count() as u64
    }

    /// Remove a book record and its index entries.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(book) = self.get(id)? else {
            return Ok(false);
        };

        self.tree.remove(ord_key(book.seq).as_bytes())?;
        self.tree.remove(own_key(&book.user, book.seq).as_bytes())?;
        let removed = self.tree.remove(id.as_bytes())?.is_some();
        self.tree.flush()?;

        Ok(removed)
    }
}

impl std::fmt::Debug for BookStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookStore")
            .field("book_count", &self.count())
            .finish_non_exhaustive()
    }
}

// Zero-padded so lexicographic key order matches numeric order.
fn ord_key(seq: u64) -> String {
    format!("ord:{seq:020}")
}

fn own_key(user_id: &str, seq: u64) -> String {
    format!("own:{user_id}:{seq:020}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn open_store() -> (BookStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = crate::store::open_db(temp_dir.path()).unwrap();
        (BookStore::open(&db).unwrap(), temp_dir)
    }

    fn create_book(store: &BookStore, title: &str, owner: &str) -> Book {
        let mut book = Book::new(title, "a caption", 4, "https://img.example/x.png", owner);
        store.create(&mut book).unwrap();
        book
    }

    #[test]
    fn test_create_and_get() {
        let (store, _dir) = open_store();
        let book = create_book(&store, "Dune", "user_1");

        let loaded = store.get(&book.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Dune");
        assert_eq!(loaded.user, "user_1");
        assert_eq!(loaded.seq, book.seq);
    }

    #[test]
    fn test_list_newest_first() {
        let (store, _dir) = open_store();
        for i in 0..3 {
            create_book(&store, &format!("Book {i}"), "user_1");
        }

        let books = store.list(0, 10).unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Book 2", "Book 1", "Book 0"]);
    }

    #[test]
    fn test_list_pagination() {
        let (store, _dir) = open_store();
        for i in 0..12 {
            create_book(&store, &format!("Book {i}"), "user_1");
        }

        // Page 1: the 5 most recently created
        let page1 = store.list(0, 5).unwrap();
        let titles: Vec<_> = page1.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Book 11", "Book 10", "Book 9", "Book 8", "Book 7"]);

        // Last page is a partial page
        let page3 = store.list(10, 5).unwrap();
        assert_eq!(page3.len(), 2);

        assert_eq!(store.count(), 12);
    }

    #[test]
    fn test_list_by_owner() {
        let (store, _dir) = open_store();
        create_book(&store, "Mine 1", "user_1");
        create_book(&store, "Theirs", "user_2");
        create_book(&store, "Mine 2", "user_1");

        let mine = store.list_by_owner("user_1").unwrap();
        let titles: Vec<_> = mine.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Mine 2", "Mine 1"]);
    }

    #[test]
    fn test_delete_removes_record_and_indexes() {
        let (store, _dir) = open_store();
        let book = create_book(&store, "Dune", "user_1");
        create_book(&store, "Emma", "user_1");

        assert!(store.delete(&book.id).unwrap());
        assert!(store.get(&book.id).unwrap().is_none());
        assert_eq!(store.count(), 1);
        assert_eq!(store.list(0, 10).unwrap().len(), 1);
        assert_eq!(store.list_by_owner("user_1").unwrap().len(), 1);

        // Deleting again is a no-op
        assert!(!store.delete(&book.id).unwrap());
    }
}
