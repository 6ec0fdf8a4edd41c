//! # Bookshelf Images
//!
//! Image hosting providers for Bookshelf.
//!
//! Book cover images live on an external hosting service. This crate
//! defines the [`ImageStore`] capability trait and two providers: a
//! Cloudinary client and an in-process store for tests and local
//! development. Whether a URL belongs to a provider is decided by the
//! provider itself via [`ImageStore::hosts`], not by string checks
//! scattered through callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cloudinary;
mod memory;
mod traits;

pub use cloudinary::CloudinaryStore;
pub use memory::MemoryStore;
pub use traits::{ImageStore, ImageStoreError, UploadedImage};
