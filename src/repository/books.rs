//! Books repository for PostgreSQL

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, BookRow, NewBook},
};

use super::BookStore;

const BOOK_COLUMNS: &str = r#"
    id, title, author, cover_img, status, progress, borrowed_date, due_date,
    description, isbn, genre, publisher, published_year, pages,
    version, created_at, updated_at
"#;

/// Map unique violations on `isbn` to a conflict
fn map_write_error(e: sqlx::Error, isbn: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                isbn.unwrap_or("?")
            ));
        }
    }
    AppError::Database(e)
}

/// Escape LIKE wildcards so the search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT {}
            FROM books
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR author ILIKE $2)
            ORDER BY id
            "#,
            BOOK_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search_term().map(|term| like_pattern(&term)))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn insert(&self, book: NewBook) -> AppResult<Book> {
        let columns = book.status.columns();

        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO books (
                title, author, cover_img, status, progress, borrowed_date, due_date,
                description, isbn, genre, publisher, published_year, pages
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover_img)
        .bind(columns.status)
        .bind(columns.progress)
        .bind(columns.borrowed_date)
        .bind(columns.due_date)
        .bind(&book.description)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(&book.published_year)
        .bind(book.pages)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, book.isbn.as_deref()))?;

        Book::try_from(row)
    }

    async fn update(&self, book: &Book) -> AppResult<Option<Book>> {
        let columns = book.status.columns();

        // The version predicate makes check-and-set a single statement
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, cover_img = $4, status = $5, progress = $6,
                borrowed_date = $7, due_date = $8, description = $9, isbn = $10,
                genre = $11, publisher = $12, published_year = $13, pages = $14,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $15
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover_img)
        .bind(columns.status)
        .bind(columns.progress)
        .bind(columns.borrowed_date)
        .bind(columns.due_date)
        .bind(&book.description)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(&book.published_year)
        .bind(book.pages)
        .bind(book.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, book.isbn.as_deref()))?;

        row.map(Book::try_from).transpose()
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
