use axum::extract::State;
use axum::Json;
use diesel::connection::SimpleConnection;
use std::sync::Arc;

use elroi_shared::types::api::{HealthCheck, HealthResponse};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.db.get() {
        Ok(mut conn) => match conn.batch_execute("SELECT 1;") {
            Ok(()) => HealthCheck::passed("database"),
            Err(e) => HealthCheck::failed("database", e.to_string()),
        },
        Err(e) => HealthCheck::failed("database", e.to_string()),
    };

    Json(HealthResponse::healthy("elroi-server", env!("CARGO_PKG_VERSION")).with_checks(vec![database]))
}
