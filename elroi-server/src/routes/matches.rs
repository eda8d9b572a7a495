use axum::extract::State;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::models::PublicProfile;
use crate::services::{match_detector, user_directory};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MatchEntry {
    pub match_id: i32,
    pub status: String,
    pub matched_at: NaiveDateTime,
    pub partner: PublicProfile,
}

/// GET /matches - newest first, each with the other person's public profile
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MatchEntry>>>> {
    let mut conn = get_conn(&state.db)?;

    let records = match_detector::matches_for(&mut conn, user.id)?;
    let partner_ids: Vec<i32> = records.iter().map(|m| m.partner_of(user.id)).collect();
    let mut partners: HashMap<i32, PublicProfile> = user_directory::find_many(&mut conn, &partner_ids)?
        .into_iter()
        .map(|u| (u.id, PublicProfile::from(u)))
        .collect();

    let entries = records
        .into_iter()
        .filter_map(|m| {
            let partner = partners.remove(&m.partner_of(user.id))?;
            Some(MatchEntry {
                match_id: m.id,
                status: m.status,
                matched_at: m.created_at,
                partner,
            })
        })
        .collect();

    Ok(Json(ApiResponse::ok(entries)))
}
