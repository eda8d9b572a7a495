use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::pagination::{Paginated, PaginationParams};
use elroi_shared::types::ApiResponse;

use crate::models::PublicProfile;
use crate::services::user_directory::{self, SearchFilters};
use crate::AppState;

/// GET /search?q=&gender=&location=&page=1&per_page=20
pub async fn search_users(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(filters): Query<SearchFilters>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<PublicProfile>>>> {
    let mut conn = get_conn(&state.db)?;

    let (users, total) = user_directory::search(&mut conn, user.id, &filters, &page)?;
    let items = users.into_iter().map(PublicProfile::from).collect();

    Ok(Json(ApiResponse::ok(Paginated::new(items, total, &page))))
}
