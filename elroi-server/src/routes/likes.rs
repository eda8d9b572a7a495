use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::services::match_detector::{self, LikeOutcome};
use crate::services::like_ledger;
use crate::AppState;

/// Flat body the front end polls after pressing "like".
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub is_match: bool,
    pub already_liked: bool,
    pub message: &'static str,
}

impl From<&LikeOutcome> for LikeResponse {
    fn from(outcome: &LikeOutcome) -> Self {
        Self {
            success: outcome.success(),
            is_match: outcome.is_match(),
            already_liked: matches!(outcome, LikeOutcome::AlreadyLiked),
            message: outcome.message(),
        }
    }
}

/// POST /like/:id
pub async fn like_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<i32>,
) -> AppResult<Json<LikeResponse>> {
    let mut conn = get_conn(&state.db)?;
    let outcome = match_detector::process_like(&mut conn, user.id, target_id)?;

    Ok(Json(LikeResponse::from(&outcome)))
}

/// DELETE /like/:id
pub async fn unlike_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<i32>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = get_conn(&state.db)?;
    like_ledger::remove_like(&mut conn, user.id, target_id)?;

    Ok(Json(ApiResponse::ok_with_message((), "Like removed")))
}
