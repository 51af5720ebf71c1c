//! Data models for Bookshelf

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, BookView, StatusKind};
pub use user::{User, UserClaims, UserProfile, UserRole};
