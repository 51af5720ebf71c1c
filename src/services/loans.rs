//! Loan (circulation) service: borrowing and returning books

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    lifecycle::{self, LifecycleError},
    models::book::{Book, BookStatus, BookView},
    repository::{BookStore, Repository},
};

/// Read-modify-write attempts before giving up on a contended book
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct LoansService {
    books: Arc<dyn BookStore>,
    clock: Arc<dyn Clock>,
}

impl LoansService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: repository.books,
            clock,
        }
    }

    /// Borrow an available book for the loan period
    pub async fn borrow(&self, id: i32) -> AppResult<BookView> {
        let today = self.clock.today();
        let saved = self
            .transition(id, |book| lifecycle::borrow(book, today))
            .await?;

        tracing::info!(book_id = id, due_date = ?saved.status.columns().due_date, "Book borrowed");
        Ok(lifecycle::project(saved, today))
    }

    /// Return a borrowed book
    pub async fn return_book(&self, id: i32) -> AppResult<BookView> {
        let saved = self.transition(id, lifecycle::return_book).await?;

        tracing::info!(book_id = id, "Book returned");
        Ok(lifecycle::project(saved, self.clock.today()))
    }

    /// Read the book, apply the transition and write it back if nobody
    /// changed the row in between.
    ///
    /// A lost race starts over from a fresh read, so the transition is
    /// always judged against the state that won and concurrent edits to
    /// other fields are kept.
    async fn transition<F>(&self, id: i32, apply: F) -> AppResult<Book>
    where
        F: Fn(&Book) -> Result<BookStatus, LifecycleError> + Send + Sync,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let book = self.load(id).await?;
            let status = apply(&book)?;

            if let Some(saved) = self.books.update(&Book { status, ..book }).await? {
                return Ok(saved);
            }
            tracing::debug!(book_id = id, attempt, "Conditional update lost a race");
        }

        Err(AppError::Conflict(format!(
            "Book {} is being modified concurrently, retry",
            id
        )))
    }

    async fn load(&self, id: i32) -> AppResult<Book> {
        self.books.get(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}
