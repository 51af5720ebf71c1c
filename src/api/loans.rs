//! Borrow and return endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::book::BookView, AppState};

use super::{extract::ApiPath, AuthenticatedUser};

/// Borrow a book for 14 days
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book borrowed", body = BookView),
        (status = 400, description = "Book is not available"),
        (status = 404, description = "Book not found"),
        (status = 503, description = "Storage unavailable, retry later")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<BookView>> {
    tracing::debug!(user_id = claims.user_id, book_id = id, "Borrow requested");

    let book = state.services.loans.borrow(id).await?;
    Ok(Json(book))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BookView),
        (status = 400, description = "Book is not borrowed"),
        (status = 404, description = "Book not found"),
        (status = 503, description = "Storage unavailable, retry later")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<BookView>> {
    tracing::debug!(user_id = claims.user_id, book_id = id, "Return requested");

    let book = state.services.loans.return_book(id).await?;
    Ok(Json(book))
}
