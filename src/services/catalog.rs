//! Catalog service: book listing and administration

use std::sync::Arc;
use validator::Validate;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    lifecycle,
    models::book::{Book, BookFilter, BookStatus, BookView, CreateBook, NewBook, StatusKind, UpdateBook},
    repository::{BookStore, Repository},
};

/// Trimmed copy of a required text field
fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Blank optional strings are stored as absent
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: repository.books,
            clock,
        }
    }

    /// List books matching the filter
    pub async fn list_books(&self, filter: &BookFilter) -> AppResult<Vec<BookView>> {
        let today = self.clock.today();
        let books = self.books.list(filter).await?;
        Ok(books
            .into_iter()
            .map(|b| lifecycle::project(b, today))
            .collect())
    }

    /// Borrowed books, soonest due first
    pub async fn list_borrowed(&self) -> AppResult<Vec<BookView>> {
        let filter = BookFilter {
            status: Some(StatusKind::Borrowed),
            q: None,
        };
        let mut books = self.list_books(&filter).await?;
        books.sort_by_key(|b| (b.due_date, b.id));
        Ok(books)
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<BookView> {
        let book = self.load(id).await?;
        Ok(lifecycle::project(book, self.clock.today()))
    }

    /// Create a new book
    pub async fn create_book(&self, input: CreateBook) -> AppResult<BookView> {
        input.validate()?;

        let status = match input.status.unwrap_or(StatusKind::Available) {
            StatusKind::Borrowed => {
                return Err(AppError::Validation(
                    "A new book cannot start out borrowed".to_string(),
                ))
            }
            StatusKind::Reading => BookStatus::Reading {
                progress: input.progress.unwrap_or(0) as u8,
            },
            _ if input.progress.is_some() => {
                return Err(AppError::Validation(
                    "Progress can only be set on a book being read".to_string(),
                ))
            }
            StatusKind::Available => BookStatus::Available,
            StatusKind::Completed => BookStatus::Completed,
            StatusKind::Wishlist => BookStatus::Wishlist,
        };

        let new_book = NewBook {
            title: required(&input.title, "Title")?,
            author: required(&input.author, "Author")?,
            status,
            cover_img: optional(input.cover_img),
            description: optional(input.description),
            isbn: optional(input.isbn),
            genre: optional(input.genre),
            publisher: optional(input.publisher),
            published_year: optional(input.published_year),
            pages: input.pages,
        };

        let book = self.books.insert(new_book).await?;
        tracing::info!(book_id = book.id, status = %book.status.kind(), "Book created");
        Ok(lifecycle::project(book, self.clock.today()))
    }

    /// Update book metadata and manual status
    pub async fn update_book(&self, id: i32, input: UpdateBook) -> AppResult<BookView> {
        input.validate()?;

        let current = self.load(id).await?;
        let status = lifecycle::set_manual_status(
            &current,
            input.status,
            input.progress.map(|p| p as u8),
        )?;

        let mut updated = current.clone();
        updated.status = status;
        if let Some(title) = input.title {
            updated.title = required(&title, "Title")?;
        }
        if let Some(author) = input.author {
            updated.author = required(&author, "Author")?;
        }
        if input.cover_img.is_some() {
            updated.cover_img = optional(input.cover_img);
        }
        if input.description.is_some() {
            updated.description = optional(input.description);
        }
        if input.isbn.is_some() {
            updated.isbn = optional(input.isbn);
        }
        if input.genre.is_some() {
            updated.genre = optional(input.genre);
        }
        if input.publisher.is_some() {
            updated.publisher = optional(input.publisher);
        }
        if input.published_year.is_some() {
            updated.published_year = optional(input.published_year);
        }
        if input.pages.is_some() {
            updated.pages = input.pages;
        }

        let saved = match self.books.update(&updated).await? {
            Some(saved) => saved,
            None => {
                // Gone, or written since we read it (usually a borrow or return)
                self.load(id).await?;
                return Err(AppError::Conflict(format!(
                    "Book {} was modified concurrently, retry",
                    id
                )));
            }
        };

        tracing::info!(book_id = id, status = %saved.status.kind(), "Book updated");
        Ok(lifecycle::project(saved, self.clock.today()))
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        if !self.books.delete(id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Check storage connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.books.ping().await
    }

    async fn load(&self, id: i32) -> AppResult<Book> {
        self.books
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}
