use axum::Json;
use serde::Serialize;

use elroi_shared::middleware::OptionalAuthUser;
use elroi_shared::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub signed_in: bool,
    /// Where a client should go next: the dashboard when signed in, the intro videos otherwise.
    pub next: &'static str,
}

pub async fn index(OptionalAuthUser(user): OptionalAuthUser) -> Json<ApiResponse<IndexResponse>> {
    let signed_in = user.is_some();
    Json(ApiResponse::ok(IndexResponse {
        service: "ElroiConnect",
        signed_in,
        next: if signed_in { "/dashboard" } else { "/intro-videos" },
    }))
}
