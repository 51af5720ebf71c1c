//! Repository layer for book and user persistence

pub mod books;
pub mod memory;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookFilter, NewBook},
        user::{NewUser, User},
    },
};

/// Book persistence.
///
/// `update` is a conditional write: it only applies when the stored row still
/// has the `version` the caller read, bumps the version, and returns `None`
/// otherwise (or when the row is gone). Callers rely on it to make
/// read-modify-write cycles atomic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Option<Book>>;

    /// Books matching the filter, ordered by id
    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>>;

    async fn insert(&self, book: NewBook) -> AppResult<Book>;

    async fn update(&self, book: &Book) -> AppResult<Option<Book>>;

    /// Returns true if the book existed and was deleted
    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// Connectivity check for the readiness endpoint
    async fn ping(&self) -> AppResult<()>;
}

/// User account persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// All accounts, ordered by id
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Fails with a conflict when the email is taken
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    /// Overwrite name, email, password hash and role; `None` if the account is gone.
    /// Fails with a conflict when the new email belongs to another account.
    async fn update(&self, user: &User) -> AppResult<Option<User>>;

    /// Returns true if the account existed and was deleted
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    /// Create a process-local repository; contents are lost on exit
    pub fn in_memory() -> Self {
        Self {
            books: Arc::new(memory::MemoryBookStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
        }
    }
}
