use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::models::{PublicProfile, User};
use crate::services::user_directory;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: User,
    pub suggestions: Vec<PublicProfile>,
}

/// GET /dashboard - the signed-in user and suggested profiles of the opposite gender
pub async fn dashboard(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DashboardResponse>>> {
    let mut conn = get_conn(&state.db)?;

    let user = user_directory::find(&mut conn, auth.id)?;
    let suggestions = user_directory::candidates(&mut conn, &user, state.config.dashboard_limit)?
        .into_iter()
        .map(PublicProfile::from)
        .collect();

    Ok(Json(ApiResponse::ok(DashboardResponse { user, suggestions })))
}
