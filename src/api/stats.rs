//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, lifecycle::BookStatistics, AppState};

use super::AuthenticatedUser;

/// Book counts per status
#[utoipa::path(
    get,
    path = "/books/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book statistics", body = BookStatistics),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<BookStatistics>> {
    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
