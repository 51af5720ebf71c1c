//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Status label as exposed on the wire and stored in the `status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Available,
    Borrowed,
    Reading,
    Completed,
    Wishlist,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Available => "available",
            StatusKind::Borrowed => "borrowed",
            StatusKind::Reading => "reading",
            StatusKind::Completed => "completed",
            StatusKind::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(StatusKind::Available),
            "borrowed" => Ok(StatusKind::Borrowed),
            "reading" => Ok(StatusKind::Reading),
            "completed" => Ok(StatusKind::Completed),
            "wishlist" => Ok(StatusKind::Wishlist),
            other => Err(AppError::Validation(format!("Unknown book status '{}'", other))),
        }
    }
}

/// Book status together with the data that only exists in that status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    Available,
    Borrowed {
        borrowed_date: NaiveDate,
        due_date: NaiveDate,
    },
    Reading {
        /// Percentage read, 0-100
        progress: u8,
    },
    Completed,
    Wishlist,
}

impl BookStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            BookStatus::Available => StatusKind::Available,
            BookStatus::Borrowed { .. } => StatusKind::Borrowed,
            BookStatus::Reading { .. } => StatusKind::Reading,
            BookStatus::Completed => StatusKind::Completed,
            BookStatus::Wishlist => StatusKind::Wishlist,
        }
    }

    /// Flatten into the nullable columns of the `books` table
    pub fn columns(&self) -> StatusColumns {
        let mut columns = StatusColumns {
            status: self.kind().as_str(),
            progress: None,
            borrowed_date: None,
            due_date: None,
        };
        match *self {
            BookStatus::Borrowed {
                borrowed_date,
                due_date,
            } => {
                columns.borrowed_date = Some(borrowed_date);
                columns.due_date = Some(due_date);
            }
            BookStatus::Reading { progress } => columns.progress = Some(progress as i16),
            _ => {}
        }
        columns
    }
}

/// Persisted shape of a [`BookStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColumns {
    pub status: &'static str,
    pub progress: Option<i16>,
    pub borrowed_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Book entity
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub cover_img: Option<String>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    pub pages: Option<i32>,
    /// Bumped by the store on every write; conditional updates compare it
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated book ready to be inserted; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub cover_img: Option<String>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    pub pages: Option<i32>,
}

impl NewBook {
    /// Materialize with store-assigned fields
    pub fn into_book(self, id: i32, now: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            status: self.status,
            cover_img: self.cover_img,
            description: self.description,
            isbn: self.isbn,
            genre: self.genre,
            publisher: self.publisher,
            published_year: self.published_year,
            pages: self.pages,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Row of the `books` table
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover_img: Option<String>,
    pub status: String,
    pub progress: Option<i16>,
    pub borrowed_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    pub pages: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let kind = StatusKind::from_str(&row.status).map_err(|_| {
            AppError::Internal(format!("Book {} has unknown status '{}'", row.id, row.status))
        })?;

        let status = match kind {
            StatusKind::Available => BookStatus::Available,
            StatusKind::Borrowed => match (row.borrowed_date, row.due_date) {
                (Some(borrowed_date), Some(due_date)) => BookStatus::Borrowed {
                    borrowed_date,
                    due_date,
                },
                _ => {
                    return Err(AppError::Internal(format!(
                        "Borrowed book {} is missing its loan dates",
                        row.id
                    )))
                }
            },
            StatusKind::Reading => {
                let progress = row.progress.unwrap_or(0);
                if !(0..=100).contains(&progress) {
                    return Err(AppError::Internal(format!(
                        "Book {} has out of range progress {}",
                        row.id, progress
                    )));
                }
                BookStatus::Reading {
                    progress: progress as u8,
                }
            }
            StatusKind::Completed => BookStatus::Completed,
            StatusKind::Wishlist => BookStatus::Wishlist,
        };

        if kind != StatusKind::Borrowed && (row.borrowed_date.is_some() || row.due_date.is_some()) {
            tracing::warn!(book_id = row.id, status = %kind, "Ignoring stale loan dates");
        }

        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            status,
            cover_img: row.cover_img,
            description: row.description,
            isbn: row.isbn,
            genre: row.genre,
            publisher: row.publisher,
            published_year: row.published_year,
            pages: row.pages,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Book as returned by the API, with the overdue flag computed for the current day
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrowed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_overdue: Option<bool>,
    pub cover_img: Option<String>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    pub pages: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookFilter {
    /// Only books in this status
    pub status: Option<StatusKind>,
    /// Case-insensitive search in title and author
    pub q: Option<String>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(status) = self.status {
            if book.status.kind() != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    /// Lowercased, trimmed search term; blank terms are ignored
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 500, message = "Author is required"))]
    pub author: String,
    /// Initial status, `available` when omitted; `borrowed` is not accepted
    pub status: Option<StatusKind>,
    /// Reading progress (0-100), only with status `reading`
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,
    pub cover_img: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 32, message = "ISBN must be at most 32 characters"))]
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    #[validate(range(min = 1, message = "Pages must be positive"))]
    pub pages: Option<i32>,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500, message = "Author must not be empty"))]
    pub author: Option<String>,
    /// Manual status change; borrowing and returning have their own endpoints
    pub status: Option<StatusKind>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,
    pub cover_img: Option<String>,
    pub description: Option<String>,
    /// Blank clears the stored ISBN
    #[validate(length(max = 32, message = "ISBN must be at most 32 characters"))]
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<String>,
    #[validate(range(min = 1, message = "Pages must be positive"))]
    pub pages: Option<i32>,
}
