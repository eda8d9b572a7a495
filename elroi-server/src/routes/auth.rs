use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::{AccessToken, AuthUser};
use elroi_shared::types::ApiResponse;

use crate::models::User;
use crate::services::user_directory::{self, Registration};
use crate::services::token_service;
use crate::AppState;

// --- GET /intro-videos ---

#[derive(Debug, Serialize)]
pub struct IntroVideosResponse {
    pub required_to_register: i32,
}

pub async fn intro_videos(State(state): State<Arc<AppState>>) -> Json<ApiResponse<IntroVideosResponse>> {
    Json(ApiResponse::ok(IntroVideosResponse {
        required_to_register: state.config.required_intro_videos,
    }))
}

// --- POST /register ---

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Registration>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = get_conn(&state.db)?;
    let user = user_directory::register(&mut conn, &req, state.config.required_intro_videos)?;

    Ok(Json(ApiResponse::ok_with_message(user, "Registration successful! Please log in.")))
}

// --- POST /login ---

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: AccessToken,
    pub user: User,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let mut conn = get_conn(&state.db)?;
    let user = user_directory::authenticate(&mut conn, &req.email, &req.password)?;

    let token = token_service::create_access_token(user.id, &state.config.jwt_secret, state.config.jwt_access_ttl)?;

    tracing::info!(user_id = user.id, "user logged in");

    let message = format!("Welcome back, {}!", user.first_name);
    Ok(Json(ApiResponse::ok_with_message(LoginResponse { token, user }, message)))
}

// --- POST /logout ---

pub async fn logout(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = get_conn(&state.db)?;
    token_service::revoke(&mut conn, &user)?;

    Ok(Json(ApiResponse::ok_with_message("logged out", "You have been logged out.")))
}
