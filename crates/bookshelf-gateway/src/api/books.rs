//! Book entry handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookshelf_core::validation::{ValidationError, validate_rating};
use bookshelf_core::{Book, User};
use bookshelf_images::ImageStore;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::server::AppState;

/// Default page size for listings.
const DEFAULT_LIMIT: u64 = 5;
/// Hard cap on requested page size.
const MAX_LIMIT: u64 = 100;

/// Book creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    /// Book title.
    pub title: Option<String>,
    /// Review caption.
    pub caption: Option<String>,
    /// Rating, 1-5.
    pub rating: Option<u8>,
    /// Image data (a data URI) to upload to the image store.
    pub image: Option<String>,
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u64>,
    /// Page size. Defaults to 5, capped at 100.
    pub limit: Option<u64>,
}

/// Owner fields joined into listed books.
#[derive(Debug, Serialize)]
pub struct OwnerView {
    /// Owner's username.
    pub username: String,
    /// Owner's avatar URL.
    pub profile_image: String,
}

impl From<&User> for OwnerView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// A book with its owner resolved to public fields.
#[derive(Debug, Serialize)]
pub struct BookView {
    /// Book ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Caption.
    pub caption: String,
    /// Rating, 1-5.
    pub rating: u8,
    /// Hosted image URL.
    pub image: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Public fields of the owner.
    pub user: OwnerView,
}

/// One page of the global book listing.
#[derive(Debug, Serialize)]
pub struct BookPage {
    /// Books on this page, newest first.
    pub books: Vec<BookView>,
    /// The requested page.
    pub current_page: u64,
    /// Total books across all users.
    pub total_books: u64,
    /// Total pages at the requested limit.
    pub total_pages: u64,
}

/// A book as returned to its owner, without joined fields.
///
/// Storage-internal fields of [`Book`] stay out of API responses.
#[derive(Debug, Serialize)]
pub struct OwnedBookView {
    /// Book ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Caption.
    pub caption: String,
    /// Rating, 1-5.
    pub rating: u8,
    /// Hosted image URL.
    pub image: String,
    /// ID of the owning user.
    pub user: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Book> for OwnedBookView {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            caption: book.caption,
            rating: book.rating,
            image: book.image,
            user: book.user,
            created_at: book.created_at,
        }
    }
}

/// Deletion confirmation body.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    /// Human-readable confirmation.
    pub message: String,
}

/// `POST /books`
///
/// Uploads the image to the external store first; the record is only
/// persisted once the upload has succeeded, so a failed upload leaves
/// no book behind.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<OwnedBookView>), ApiError> {
    let (Some(title), Some(caption), Some(rating), Some(image)) =
        (body.title, body.caption, body.rating, body.image)
    else {
        return Err(ValidationError::MissingFields.into());
    };
    if title.trim().is_empty() || caption.trim().is_empty() || image.trim().is_empty() {
        return Err(ValidationError::MissingFields.into());
    }
    validate_rating(rating)?;

    let uploaded = state.images.upload(&image).await.map_err(|e| {
        tracing::error!(error = %e, "image upload failed");
        ApiError::Upstream("Image upload failed".to_string())
    })?;

    let mut book = Book::new(title, caption, rating, uploaded.url, &user.id);
    state.books.create(&mut book)?;
    tracing::info!(book_id = %book.id, owner = %user.id, "created book entry");

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// `GET /books?page&limit`
///
/// Global listing, newest first, with each book's owner joined as
/// public fields only. Totals cover all users' books.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookPage>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    // Saturates rather than overflowing on absurd page numbers; a
    // page past the end is simply empty
    let offset = page.saturating_sub(1).saturating_mul(limit);

    let books = state.books.list(offset, limit)?;
    let mut views = Vec::with_capacity(books.len());
    for book in books {
        let owner = state
            .auth
            .users
            .get(&book.user)?
            .ok_or_else(|| ApiError::Internal(format!("owner missing for book {}", book.id)))?;
        views.push(BookView {
            id: book.id,
            title: book.title,
            caption: book.caption,
            rating: book.rating,
            image: book.image,
            created_at: book.created_at,
            user: OwnerView::from(&owner),
        });
    }

    let total_books = state.books.count();
    Ok(Json(BookPage {
        books: views,
        current_page: page,
        total_books,
        total_pages: total_books.div_ceil(limit),
    }))
}

/// `GET /books/user`
///
/// All of the caller's books, newest first, unpaginated.
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OwnedBookView>>, ApiError> {
    let books = state.books.list_by_owner(&user.id)?;
    Ok(Json(books.into_iter().map(OwnedBookView::from).collect()))
}

/// `DELETE /books/{id}`
///
/// Only the owner may delete. When the stored image lives on the
/// configured provider it is deleted there first; if that fails the
/// record is kept so the deletion can be retried.
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(book_id): Path<String>,
) -> Result<Json<Confirmation>, ApiError> {
    let book = state
        .books
        .get(&book_id)?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    if book.user != user.id {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this book".to_string(),
        ));
    }

    if state.images.hosts(&book.image) {
        state.images.delete(&book.image).await.map_err(|e| {
            tracing::error!(error = %e, book_id = %book.id, "image deletion failed");
            ApiError::Upstream("Image deletion failed".to_string())
        })?;
    }

    state.books.delete(&book.id)?;
    tracing::info!(book_id = %book.id, owner = %user.id, "deleted book entry");

    Ok(Json(Confirmation {
        message: "Book deleted successfully".to_string(),
    }))
}
