//! In-memory stores, used by tests and the `memory` storage backend

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFilter, NewBook},
        user::{NewUser, User},
    },
};

use super::{BookStore, UserStore};

#[derive(Default)]
struct Books {
    last_id: i32,
    rows: BTreeMap<i32, Book>,
}

impl Books {
    fn isbn_taken(&self, isbn: Option<&str>, except: Option<i32>) -> bool {
        let Some(isbn) = isbn else {
            return false;
        };
        self.rows
            .values()
            .any(|b| Some(b.id) != except && b.isbn.as_deref() == Some(isbn))
    }
}

fn duplicate_isbn(isbn: Option<&str>) -> AppError {
    AppError::Conflict(format!(
        "A book with ISBN {} already exists",
        isbn.unwrap_or("?")
    ))
}

#[derive(Clone, Default)]
pub struct MemoryBookStore {
    inner: Arc<RwLock<Books>>,
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let books = self.inner.read().await;
        Ok(books
            .rows
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn insert(&self, book: NewBook) -> AppResult<Book> {
        let mut books = self.inner.write().await;
        if books.isbn_taken(book.isbn.as_deref(), None) {
            return Err(duplicate_isbn(book.isbn.as_deref()));
        }

        books.last_id += 1;
        let book = book.into_book(books.last_id, Utc::now());
        books.rows.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, book: &Book) -> AppResult<Option<Book>> {
        // Check and write under one write guard
        let mut books = self.inner.write().await;
        if books.isbn_taken(book.isbn.as_deref(), Some(book.id)) {
            return Err(duplicate_isbn(book.isbn.as_deref()));
        }

        let Some(stored) = books.rows.get_mut(&book.id) else {
            return Ok(None);
        };
        if stored.version != book.version {
            return Ok(None);
        }

        *stored = Book {
            version: stored.version + 1,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..book.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Users {
    last_id: i32,
    rows: BTreeMap<i32, User>,
}

impl Users {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

fn duplicate_email() -> AppError {
    AppError::Conflict("Email already registered".to_string())
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Users>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.inner.read().await;
        Ok(users
            .rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.inner.write().await;
        if users.email_taken(&user.email, None) {
            return Err(duplicate_email());
        }

        users.last_id += 1;
        let user = User {
            id: users.last_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> AppResult<Option<User>> {
        let mut users = self.inner.write().await;
        if users.email_taken(&user.email, Some(user.id)) {
            return Err(duplicate_email());
        }

        let Some(stored) = users.rows.get_mut(&user.id) else {
            return Ok(None);
        };
        *stored = User {
            created_at: stored.created_at,
            ..user.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}
