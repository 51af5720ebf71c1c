//! Statistics service

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    lifecycle::{self, BookStatistics},
    models::book::BookFilter,
    repository::{BookStore, Repository},
};

#[derive(Clone)]
pub struct StatsService {
    books: Arc<dyn BookStore>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: repository.books,
            clock,
        }
    }

    /// Per-status counts over the whole catalog
    pub async fn get_stats(&self) -> AppResult<BookStatistics> {
        let books = self.books.list(&BookFilter::default()).await?;
        let stats = lifecycle::statistics(&books, self.clock.today());
        tracing::debug!(total = stats.total_books, overdue = stats.overdue, "Computed book statistics");
        Ok(stats)
    }
}
