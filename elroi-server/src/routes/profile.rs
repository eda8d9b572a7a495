use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::models::{PublicProfile, User};
use crate::services::user_directory::{self, ProfileChanges};
use crate::services::like_ledger;
use crate::AppState;

// --- GET /profile ---

pub async fn get_own_profile(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = get_conn(&state.db)?;
    let user = user_directory::find(&mut conn, auth.id)?;

    Ok(Json(ApiResponse::ok(user)))
}

// --- PATCH /profile ---

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(changes): Json<ProfileChanges>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = get_conn(&state.db)?;
    let user = user_directory::update_profile(&mut conn, auth.id, &changes)?;

    Ok(Json(ApiResponse::ok_with_message(user, "Profile updated successfully!")))
}

// --- PUT /profile/active ---

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn set_active(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = get_conn(&state.db)?;
    let user = user_directory::set_active(&mut conn, auth.id, req.is_active)?;

    Ok(Json(ApiResponse::ok(user)))
}

// --- GET /profile/:id ---

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: PublicProfile,
    pub already_liked: bool,
}

pub async fn view_profile(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = get_conn(&state.db)?;

    let user = user_directory::find(&mut conn, user_id)?;
    let already_liked = like_ledger::has_liked(&mut conn, auth.id, user_id)?;

    Ok(Json(ApiResponse::ok(ProfileView {
        profile: PublicProfile::from(user),
        already_liked,
    })))
}
