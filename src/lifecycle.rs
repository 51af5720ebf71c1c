//! Book lifecycle rules
//!
//! Circulation moves a book between `available` and `borrowed`:
//!
//! ```text
//! available --borrow--> borrowed --return--> available
//! ```
//!
//! A borrowed book becomes overdue once the calendar passes its due date. The
//! flag is never stored: every read path goes through [`project`] so the value
//! always reflects the day it is read. `reading`, `completed` and `wishlist`
//! are set by hand through [`set_manual_status`] and sit outside the loan cycle.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::book::{Book, BookStatus, BookView, StatusKind};

/// Loan period in whole days
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Illegal transition for the book's current status
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Book {id} is not available (currently {status})")]
    NotAvailable { id: i32, status: StatusKind },

    #[error("Book {id} is not borrowed (currently {status})")]
    NotBorrowed { id: i32, status: StatusKind },

    #[error("Book {id} can only become borrowed through a borrow")]
    BorrowedByEdit { id: i32 },

    #[error("Book {id} is on loan and must be returned first")]
    OnLoan { id: i32 },

    #[error("Progress can only be set on a book being read")]
    ProgressWithoutReading,
}

pub fn due_date_for(borrowed_date: NaiveDate) -> NaiveDate {
    borrowed_date + Duration::days(LOAN_PERIOD_DAYS)
}

/// Check out an available book on `today`
pub fn borrow(book: &Book, today: NaiveDate) -> Result<BookStatus, LifecycleError> {
    match book.status {
        BookStatus::Available => Ok(BookStatus::Borrowed {
            borrowed_date: today,
            due_date: due_date_for(today),
        }),
        other => Err(LifecycleError::NotAvailable {
            id: book.id,
            status: other.kind(),
        }),
    }
}

/// Bring a borrowed book back into circulation
pub fn return_book(book: &Book) -> Result<BookStatus, LifecycleError> {
    match book.status {
        BookStatus::Borrowed { .. } => Ok(BookStatus::Available),
        other => Err(LifecycleError::NotBorrowed {
            id: book.id,
            status: other.kind(),
        }),
    }
}

/// True when the book is borrowed and `today` is strictly after its due date.
pub fn is_overdue(status: &BookStatus, today: NaiveDate) -> bool {
    match status {
        BookStatus::Borrowed { due_date, .. } => today > *due_date,
        _ => false,
    }
}

/// Resolve a manual edit of the status field.
///
/// `progress` only applies to `reading`; when switching to `reading` without
/// one, the current progress is kept (or starts at zero).
pub fn set_manual_status(
    book: &Book,
    target: Option<StatusKind>,
    progress: Option<u8>,
) -> Result<BookStatus, LifecycleError> {
    let current = book.status;
    let target = target.unwrap_or_else(|| current.kind());

    match (current, target) {
        (BookStatus::Borrowed { .. }, StatusKind::Borrowed) if progress.is_none() => Ok(current),
        (BookStatus::Borrowed { .. }, StatusKind::Borrowed) => {
            Err(LifecycleError::ProgressWithoutReading)
        }
        (BookStatus::Borrowed { .. }, _) => Err(LifecycleError::OnLoan { id: book.id }),
        (_, StatusKind::Borrowed) => Err(LifecycleError::BorrowedByEdit { id: book.id }),
        (_, StatusKind::Reading) => {
            let kept = match current {
                BookStatus::Reading { progress } => progress,
                _ => 0,
            };
            Ok(BookStatus::Reading {
                progress: progress.unwrap_or(kept),
            })
        }
        (_, _) if progress.is_some() => Err(LifecycleError::ProgressWithoutReading),
        (_, StatusKind::Available) => Ok(BookStatus::Available),
        (_, StatusKind::Completed) => Ok(BookStatus::Completed),
        (_, StatusKind::Wishlist) => Ok(BookStatus::Wishlist),
    }
}

/// The read-side view of a book on `today`. Every read path uses this.
pub fn project(book: Book, today: NaiveDate) -> BookView {
    let columns = book.status.columns();
    let (progress, is_overdue) = match book.status {
        BookStatus::Reading { progress } => (Some(progress), None),
        BookStatus::Borrowed { .. } => (None, Some(is_overdue(&book.status, today))),
        _ => (None, None),
    };

    BookView {
        id: book.id,
        title: book.title,
        author: book.author,
        status: book.status.kind(),
        progress,
        borrowed_date: columns.borrowed_date,
        due_date: columns.due_date,
        is_overdue,
        cover_img: book.cover_img,
        description: book.description,
        isbn: book.isbn,
        genre: book.genre,
        publisher: book.publisher,
        published_year: book.published_year,
        pages: book.pages,
        created_at: book.created_at,
        updated_at: book.updated_at,
    }
}

/// Per-status counts over a set of books
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookStatistics {
    pub total_books: u64,
    pub available: u64,
    pub borrowed: u64,
    /// Subset of `borrowed`
    pub overdue: u64,
    pub reading: u64,
    pub completed: u64,
    pub wishlist: u64,
}

pub fn statistics<'a, I>(books: I, today: NaiveDate) -> BookStatistics
where
    I: IntoIterator<Item = &'a Book>,
{
    books
        .into_iter()
        .fold(BookStatistics::default(), |mut stats, book| {
            stats.total_books += 1;
            match book.status {
                BookStatus::Available => stats.available += 1,
                BookStatus::Borrowed { .. } => {
                    stats.borrowed += 1;
                    if is_overdue(&book.status, today) {
                        stats.overdue += 1;
                    }
                }
                BookStatus::Reading { .. } => stats.reading += 1,
                BookStatus::Completed => stats.completed += 1,
                BookStatus::Wishlist => stats.wishlist += 1,
            }
            stats
        })
}
